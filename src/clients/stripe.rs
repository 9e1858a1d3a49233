use super::base::RestClient;
use crate::errors::RestClientError;

/// Bank account to pay out to, UK domestic format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankAccount {
    pub sort_code: String,
    pub account_number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonRelationship {
    Representative,
    Director,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub first_name: String,
    pub last_name: String,
    pub dob_day: u32,
    pub dob_month: u32,
    pub dob_year: i32,
    pub relationship: PersonRelationship,
}

/// A file the user uploaded, ready to hand to Stripe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedDocument {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, serde::Deserialize)]
struct StripeObject {
    id: String,
}

/// Minimal Stripe Connect client for the KYC steps.
///
/// Stripe takes form-encoded bodies with bracketed keys and a secret-key
/// bearer token. Without a key every call is refused.
#[derive(Clone)]
pub struct StripeClient {
    rest: RestClient,
    files: RestClient,
    secret_key: Option<String>,
}

impl StripeClient {
    pub fn new(base_url: &str, secret_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            rest: RestClient::new("stripe", base_url)?,
            files: RestClient::new("stripe", base_url)?,
            secret_key,
        })
    }

    /// Send file uploads to `files_url` instead of the API host.
    pub fn with_files_url(mut self, files_url: &str) -> anyhow::Result<Self> {
        self.files = RestClient::new("stripe", files_url)?;
        Ok(self)
    }

    fn error(&self, message: impl Into<String>) -> RestClientError {
        RestClientError {
            message: message.into(),
            service: self.rest.service().to_string(),
            status: None,
            error_identifier: None,
        }
    }

    fn key(&self) -> Result<&str, RestClientError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| self.error("STRIPE_SECRET_KEY is not configured"))
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<StripeObject, RestClientError> {
        let req = self
            .rest
            .request(reqwest::Method::POST, path)
            .bearer_auth(self.key()?)
            .form(form);
        self.rest.send_json(reqwest::Method::POST, path, req).await
    }

    pub async fn update_bank_account(
        &self,
        stripe_account_id: &str,
        bank: &BankAccount,
    ) -> Result<(), RestClientError> {
        let form = [
            ("external_account[object]", "bank_account".to_string()),
            ("external_account[country]", "GB".to_string()),
            ("external_account[currency]", "GBP".to_string()),
            ("external_account[routing_number]", bank.sort_code.clone()),
            ("external_account[account_number]", bank.account_number.clone()),
        ];
        self.post_form(&account_path(stripe_account_id), &form).await?;
        Ok(())
    }

    pub async fn update_vat_number(
        &self,
        stripe_account_id: &str,
        vat_number: &str,
    ) -> Result<(), RestClientError> {
        let form = [("company[vat_id]", vat_number.to_string())];
        self.post_form(&account_path(stripe_account_id), &form).await?;
        Ok(())
    }

    pub async fn update_company_number(
        &self,
        stripe_account_id: &str,
        company_number: &str,
    ) -> Result<(), RestClientError> {
        let form = [("company[tax_id]", company_number.to_string())];
        self.post_form(&account_path(stripe_account_id), &form).await?;
        Ok(())
    }

    /// Create a person on the connected account. Returns the Stripe person id.
    pub async fn create_person(
        &self,
        stripe_account_id: &str,
        person: &Person,
    ) -> Result<String, RestClientError> {
        let relationship = match person.relationship {
            PersonRelationship::Representative => "relationship[representative]",
            PersonRelationship::Director => "relationship[director]",
        };
        let form = [
            ("first_name", person.first_name.clone()),
            ("last_name", person.last_name.clone()),
            ("dob[day]", person.dob_day.to_string()),
            ("dob[month]", person.dob_month.to_string()),
            ("dob[year]", person.dob_year.to_string()),
            (relationship, "true".to_string()),
        ];
        let created = self
            .post_form(&format!("{}/persons", account_path(stripe_account_id)), &form)
            .await?;
        tracing::info!(stripe_account_id, person_id = %created.id, "created stripe person");
        Ok(created.id)
    }

    /// Upload the document to Stripe's file store, then attach it to the
    /// company's verification. Returns the Stripe file id.
    pub async fn upload_government_entity_document(
        &self,
        stripe_account_id: &str,
        document: UploadedDocument,
    ) -> Result<String, RestClientError> {
        let part = reqwest::multipart::Part::bytes(document.data)
            .file_name(document.file_name)
            .mime_str(&document.content_type)
            .map_err(|e| self.error(format!("invalid document content type: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "account_requirement")
            .part("file", part);

        let path = "/v1/files";
        let req = self
            .files
            .request(reqwest::Method::POST, path)
            .bearer_auth(self.key()?)
            .multipart(form);
        let file: StripeObject = self.files.send_json(reqwest::Method::POST, path, req).await?;

        let form = [("company[verification][document][front]", file.id.clone())];
        self.post_form(&account_path(stripe_account_id), &form).await?;
        tracing::info!(stripe_account_id, file_id = %file.id, "attached government entity document");
        Ok(file.id)
    }
}

fn account_path(stripe_account_id: &str) -> String {
    format!("/v1/accounts/{}", urlencoding::encode(stripe_account_id))
}
