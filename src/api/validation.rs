//! Form field validation for the settings and onboarding pages.

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::FieldError;

static HEX_24: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").unwrap());
static UUID_LIKE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .unwrap()
});
static VAT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^GB(?:[0-9]{9}|[0-9]{12}|GD[0-9]{3}|HA[0-9]{3})$").unwrap()
});
static COMPANY_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9]{8}|[A-Z]{2}[0-9]{6})$").unwrap());
static POSTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2}$").unwrap());

const MAX_TEXT_LENGTH: usize = 255;

/// Collects field errors; `finish` turns them into a result.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required<'a>(&mut self, field: &'static str, value: &'a str, label: &str) -> &'a str {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.errors.push(FieldError::new(field, format!("Enter {}", label)));
        } else if trimmed.chars().count() > MAX_TEXT_LENGTH {
            self.errors.push(FieldError::new(
                field,
                format!("{} must be {} characters or fewer", capitalise(label), MAX_TEXT_LENGTH),
            ));
        }
        trimmed
    }

    pub fn check(&mut self, field: &'static str, ok: bool, message: &str) {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

fn capitalise(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn digits_only(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// UK sort code with spaces and dashes removed, if valid.
pub fn sort_code(value: &str) -> Option<String> {
    let digits = digits_only(value);
    (digits.len() == 6 && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}

pub fn account_number(value: &str) -> Option<String> {
    let digits = digits_only(value);
    ((6..=8).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()))
        .then_some(digits)
}

/// Normalised (upper case, no spaces) VAT number, if valid.
pub fn vat_number(value: &str) -> Option<String> {
    let normalised: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    VAT_NUMBER.is_match(&normalised).then_some(normalised)
}

pub fn company_number(value: &str) -> Option<String> {
    let normalised = value.trim().replace(' ', "").to_uppercase();
    COMPANY_NUMBER.is_match(&normalised).then_some(normalised)
}

pub fn postcode(value: &str) -> bool {
    POSTCODE.is_match(value.trim().to_uppercase().as_str())
}

pub fn flex_identifier(value: &str) -> bool {
    HEX_24.is_match(value.trim())
}

pub fn jwt_mac_key(value: &str) -> bool {
    UUID_LIKE.is_match(value.trim())
}

/// A date of birth that exists, is in the past and is not absurdly old.
pub fn date_of_birth(day: &str, month: &str, year: &str, today: NaiveDate) -> Option<NaiveDate> {
    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    (date < today && today.year() - year <= 120).then_some(date)
}
