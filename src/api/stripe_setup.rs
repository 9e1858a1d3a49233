//! Stripe onboarding (KYC) steps.
//!
//! Each step is submitted once: the details go to Stripe, then connector's
//! matching setup flag is set. A step whose flag is already set renders the
//! "already submitted" page instead of the form.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Extension, Form,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::json;

use super::link_style;
use super::validation::{self, Validator};
use crate::clients::stripe::{BankAccount, Person, PersonRelationship, UploadedDocument};
use crate::credentials::{self, LinkStyle};
use crate::errors::{AppError, DomainError, FieldError};
use crate::middleware::auth::AuthContext;
use crate::models::gateway_account::GatewayAccount;
use crate::models::stripe_setup::{StripeAccountSetup, StripeSetupStep};
use crate::views::View;
use crate::AppState;

fn permission(step: StripeSetupStep) -> &'static str {
    match step {
        StripeSetupStep::BankAccount => "stripe-bank-details:update",
        StripeSetupStep::VatNumber | StripeSetupStep::CompanyNumber => {
            "stripe-vat-number-company-number:update"
        }
        StripeSetupStep::ResponsiblePerson => "stripe-responsible-person:update",
        StripeSetupStep::Director => "stripe-director:update",
        StripeSetupStep::GovernmentEntityDocument => "stripe-government-entity-document:update",
        StripeSetupStep::OrganisationDetails => "stripe-organisation-details:update",
    }
}

fn template(step: StripeSetupStep) -> &'static str {
    match step {
        StripeSetupStep::BankAccount => "stripe-setup/bank-details/index",
        StripeSetupStep::VatNumber => "stripe-setup/vat-number/index",
        StripeSetupStep::CompanyNumber => "stripe-setup/company-number/index",
        StripeSetupStep::ResponsiblePerson => "stripe-setup/responsible-person/index",
        StripeSetupStep::Director => "stripe-setup/director/index",
        StripeSetupStep::GovernmentEntityDocument => "stripe-setup/government-entity-document/index",
        StripeSetupStep::OrganisationDetails => "stripe-setup/check-org-details/index",
    }
}

/// Everything a step handler needs once the step is known to be open.
struct OpenStep<'a> {
    account: &'a GatewayAccount,
    stripe_account_id: String,
    style: LinkStyle<'a>,
}

/// Resolve the Stripe credential and refuse steps already submitted.
/// `Err` carries the "already submitted" page.
async fn open_step<'a>(
    state: &AppState,
    auth: &'a AuthContext,
    step: StripeSetupStep,
) -> Result<Result<OpenStep<'a>, View>, AppError> {
    auth.require_permission(permission(step))?;
    let account = auth.account()?;
    let credential = credentials::get_stripe_credential(account)?;
    let style = link_style(&state.config, auth)?;

    let setup = state
        .connector
        .get_stripe_account_setup(account.gateway_account_id)
        .await?;
    if setup.is_submitted(step) {
        tracing::info!(
            gateway_account_id = account.gateway_account_id,
            step = step.flag_name(),
            "stripe setup step already submitted"
        );
        return Ok(Err(View::already_submitted(
            step.already_submitted_message(),
            &credentials::dashboard_url(account, style),
        )));
    }

    Ok(Ok(OpenStep {
        account,
        stripe_account_id: credentials::stripe_account_id(credential)?.to_string(),
        style,
    }))
}

/// Mark `step` done at connector and pick where to go next.
async fn complete_step(
    state: &AppState,
    open: &OpenStep<'_>,
    step: StripeSetupStep,
) -> Result<View, AppError> {
    state
        .connector
        .set_stripe_account_setup_flag(open.account.gateway_account_id, step)
        .await?;
    tracing::info!(
        gateway_account_id = open.account.gateway_account_id,
        step = step.flag_name(),
        "stripe setup step submitted"
    );

    let base = credentials::settings_base_url(open.account, open.style);
    let to = if state.config.features.stripe_onboarding_task_list {
        format!("{}/stripe-setup", base)
    } else if credentials::is_switching_credentials(open.account)? {
        format!("{}/switch-psp", base)
    } else {
        credentials::dashboard_url(open.account, open.style)
    };
    Ok(View::redirect(to))
}

async fn show_step(
    state: &AppState,
    auth: &AuthContext,
    step: StripeSetupStep,
) -> Result<View, AppError> {
    match open_step(state, auth, step).await? {
        Ok(open) => Ok(View::render(
            template(step),
            json!({
                "back_href": credentials::dashboard_url(open.account, open.style),
            }),
        )),
        Err(already) => Ok(already),
    }
}

// ── Task list ────────────────────────────────────────────────

/// GET {account}/stripe-setup: only with `ENABLE_STRIPE_ONBOARDING_TASK_LIST`.
pub async fn task_list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    if !state.config.features.stripe_onboarding_task_list {
        return Err(DomainError::NotFound("Stripe onboarding task list is not enabled".into()).into());
    }
    auth.require_permission("stripe-account-details:update")?;
    let account = auth.account()?;
    credentials::get_stripe_credential(account)?;
    let setup: StripeAccountSetup = state
        .connector
        .get_stripe_account_setup(account.gateway_account_id)
        .await?;

    let tasks: Vec<_> = StripeSetupStep::ALL
        .iter()
        .map(|step| json!({ "step": step, "complete": setup.is_submitted(*step) }))
        .collect();
    Ok(View::render(
        "stripe-setup/index",
        json!({
            "tasks": tasks,
            "all_complete": setup.all_submitted(),
        }),
    ))
}

// ── Bank details ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct BankDetailsForm {
    #[serde(default)]
    pub sort_code: String,
    #[serde(default)]
    pub account_number: String,
}

pub async fn show_bank_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    show_step(&state, &auth, StripeSetupStep::BankAccount).await
}

pub async fn submit_bank_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<BankDetailsForm>,
) -> Result<View, AppError> {
    let step = StripeSetupStep::BankAccount;
    let open = match open_step(&state, &auth, step).await? {
        Ok(open) => open,
        Err(already) => return Ok(already),
    };

    let mut v = Validator::new();
    let sort_code = v.required("sort_code", &form.sort_code, "a sort code");
    let account_number = v.required("account_number", &form.account_number, "an account number");
    let sort_code = validation::sort_code(sort_code);
    let account_number = validation::account_number(account_number);
    if !v.has_error("sort_code") {
        v.check("sort_code", sort_code.is_some(), "Enter a valid sort code like 309430");
    }
    if !v.has_error("account_number") {
        v.check(
            "account_number",
            account_number.is_some(),
            "Enter a valid account number like 00733445",
        );
    }
    v.finish().map_err(AppError::Validation)?;

    if let (Some(sort_code), Some(account_number)) = (sort_code, account_number) {
        state
            .stripe
            .update_bank_account(
                &open.stripe_account_id,
                &BankAccount {
                    sort_code,
                    account_number,
                },
            )
            .await?;
    }
    complete_step(&state, &open, step).await
}

// ── VAT number ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VatNumberForm {
    #[serde(default)]
    pub vat_number: String,
}

pub async fn show_vat_number(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    show_step(&state, &auth, StripeSetupStep::VatNumber).await
}

pub async fn submit_vat_number(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<VatNumberForm>,
) -> Result<View, AppError> {
    let step = StripeSetupStep::VatNumber;
    let open = match open_step(&state, &auth, step).await? {
        Ok(open) => open,
        Err(already) => return Ok(already),
    };

    let mut v = Validator::new();
    let raw = v.required("vat_number", &form.vat_number, "a VAT registration number");
    let vat_number = validation::vat_number(raw);
    if !v.has_error("vat_number") {
        v.check(
            "vat_number",
            vat_number.is_some(),
            "Enter a valid VAT registration number",
        );
    }
    v.finish().map_err(AppError::Validation)?;

    if let Some(vat_number) = vat_number {
        state
            .stripe
            .update_vat_number(&open.stripe_account_id, &vat_number)
            .await?;
    }
    complete_step(&state, &open, step).await
}

// ── Company number ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct CompanyNumberForm {
    /// "yes" when the organisation is registered with Companies House.
    #[serde(default)]
    pub company_number_declaration: String,
    #[serde(default)]
    pub company_number: String,
}

pub async fn show_company_number(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    show_step(&state, &auth, StripeSetupStep::CompanyNumber).await
}

pub async fn submit_company_number(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<CompanyNumberForm>,
) -> Result<View, AppError> {
    let step = StripeSetupStep::CompanyNumber;
    let open = match open_step(&state, &auth, step).await? {
        Ok(open) => open,
        Err(already) => return Ok(already),
    };

    let mut v = Validator::new();
    let declaration = form.company_number_declaration.trim();
    v.check(
        "company_number_declaration",
        matches!(declaration, "yes" | "no"),
        "Select yes if your organisation is registered with Companies House",
    );
    let mut company_number = None;
    if declaration == "yes" {
        let raw = v.required("company_number", &form.company_number, "a company registration number");
        company_number = validation::company_number(raw);
        if !v.has_error("company_number") {
            v.check(
                "company_number",
                company_number.is_some(),
                "Enter a valid company registration number",
            );
        }
    }
    v.finish().map_err(AppError::Validation)?;

    // Unregistered organisations only need the flag set.
    if let Some(company_number) = company_number {
        state
            .stripe
            .update_company_number(&open.stripe_account_id, &company_number)
            .await?;
    }
    complete_step(&state, &open, step).await
}

// ── People ───────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PersonForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub dob_day: String,
    #[serde(default)]
    pub dob_month: String,
    #[serde(default)]
    pub dob_year: String,
}

fn validate_person(form: &PersonForm, relationship: PersonRelationship) -> Result<Person, AppError> {
    let mut v = Validator::new();
    let first_name = v.required("first_name", &form.first_name, "a first name");
    let last_name = v.required("last_name", &form.last_name, "a last name");
    let dob = validation::date_of_birth(
        &form.dob_day,
        &form.dob_month,
        &form.dob_year,
        Utc::now().date_naive(),
    );
    v.check("dob", dob.is_some(), "Enter a real date of birth in the past");
    v.finish().map_err(AppError::Validation)?;

    let dob = dob.ok_or_else(|| anyhow::anyhow!("date of birth missing after validation"))?;
    Ok(Person {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        dob_day: dob.day(),
        dob_month: dob.month(),
        dob_year: dob.year(),
        relationship,
    })
}

async fn submit_person(
    state: &AppState,
    auth: &AuthContext,
    step: StripeSetupStep,
    form: &PersonForm,
    relationship: PersonRelationship,
) -> Result<View, AppError> {
    let open = match open_step(state, auth, step).await? {
        Ok(open) => open,
        Err(already) => return Ok(already),
    };
    let person = validate_person(form, relationship)?;
    state
        .stripe
        .create_person(&open.stripe_account_id, &person)
        .await?;
    complete_step(state, &open, step).await
}

pub async fn show_responsible_person(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    show_step(&state, &auth, StripeSetupStep::ResponsiblePerson).await
}

pub async fn submit_responsible_person(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<PersonForm>,
) -> Result<View, AppError> {
    submit_person(
        &state,
        &auth,
        StripeSetupStep::ResponsiblePerson,
        &form,
        PersonRelationship::Representative,
    )
    .await
}

pub async fn show_director(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    show_step(&state, &auth, StripeSetupStep::Director).await
}

pub async fn submit_director(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<PersonForm>,
) -> Result<View, AppError> {
    submit_person(
        &state,
        &auth,
        StripeSetupStep::Director,
        &form,
        PersonRelationship::Director,
    )
    .await
}

// ── Government entity document ───────────────────────────────

const DOCUMENT_FIELD: &str = "government-entity-document";
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;
const DOCUMENT_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];

fn unreadable_upload(e: MultipartError) -> AppError {
    tracing::info!("unreadable document upload: {}", e);
    AppError::Validation(vec![FieldError::new(
        DOCUMENT_FIELD,
        "The selected file could not be uploaded. Try again",
    )])
}

/// First non-empty file in the document field, if any.
async fn read_document(multipart: &mut Multipart) -> Result<Option<UploadedDocument>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(unreadable_upload)? {
        if field.name() != Some(DOCUMENT_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(unreadable_upload)?;
        if data.is_empty() {
            return Ok(None);
        }
        return Ok(Some(UploadedDocument {
            file_name,
            content_type,
            data: data.to_vec(),
        }));
    }
    Ok(None)
}

fn validate_document(document: Option<&UploadedDocument>) -> Result<(), AppError> {
    let mut v = Validator::new();
    match document {
        None => v.check(DOCUMENT_FIELD, false, "Select a file to upload"),
        Some(doc) => {
            v.check(
                DOCUMENT_FIELD,
                DOCUMENT_TYPES.contains(&doc.content_type.as_str()),
                "The selected file must be a PDF, JPG or PNG",
            );
            if !v.has_error(DOCUMENT_FIELD) {
                v.check(
                    DOCUMENT_FIELD,
                    doc.data.len() <= MAX_DOCUMENT_BYTES,
                    "The selected file must be smaller than 10MB",
                );
            }
        }
    }
    v.finish().map_err(AppError::Validation)
}

pub async fn show_government_entity_document(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    show_step(&state, &auth, StripeSetupStep::GovernmentEntityDocument).await
}

pub async fn submit_government_entity_document(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> Result<View, AppError> {
    let step = StripeSetupStep::GovernmentEntityDocument;
    let open = match open_step(&state, &auth, step).await? {
        Ok(open) => open,
        Err(already) => return Ok(already),
    };

    let document = read_document(&mut multipart).await?;
    validate_document(document.as_ref())?;
    if let Some(document) = document {
        state
            .stripe
            .upload_government_entity_document(&open.stripe_account_id, document)
            .await?;
    }
    complete_step(&state, &open, step).await
}

// ── Organisation details ─────────────────────────────────────

#[derive(Deserialize)]
pub struct OrganisationDetailsForm {
    #[serde(default)]
    pub confirm_org_details: String,
}

pub async fn show_organisation_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    show_step(&state, &auth, StripeSetupStep::OrganisationDetails).await
}

pub async fn submit_organisation_details(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<OrganisationDetailsForm>,
) -> Result<View, AppError> {
    let step = StripeSetupStep::OrganisationDetails;
    let open = match open_step(&state, &auth, step).await? {
        Ok(open) => open,
        Err(already) => return Ok(already),
    };

    let mut v = Validator::new();
    v.check(
        "confirm_org_details",
        form.confirm_org_details.trim() == "yes",
        "Confirm your organisation details are correct",
    );
    v.finish().map_err(AppError::Validation)?;

    complete_step(&state, &open, step).await
}
