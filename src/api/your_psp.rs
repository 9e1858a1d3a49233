use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Form,
};
use serde::Deserialize;
use serde_json::json;

use super::link_style;
use super::validation::{self, Validator};
use crate::clients::connector::FlexCredentials;
use crate::credentials::{self, LinkStyle};
use crate::errors::{AppError, DomainError};
use crate::middleware::auth::AuthContext;
use crate::models::credential::{CredentialState, GatewayAccountCredential, PaymentProvider};
use crate::models::gateway_account::GatewayAccount;
use crate::views::View;
use crate::AppState;

const READ: &str = "gateway-credentials:read";
const UPDATE: &str = "gateway-credentials:update";

#[derive(Deserialize)]
pub struct CredentialPath {
    pub credential_external_id: String,
}

#[derive(Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub merchant_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct FlexForm {
    #[serde(default)]
    pub organisational_unit_id: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub jwt_mac_key: String,
}

/// A credential that has a "Your PSP" page, or `NotFoundError`.
fn psp_page_credential<'a>(
    account: &'a GatewayAccount,
    credential_external_id: &str,
) -> Result<&'a GatewayAccountCredential, DomainError> {
    credentials::get_credential_by_external_id(account, credential_external_id)
        .filter(|c| c.payment_provider.takes_entered_credentials())
        .ok_or_else(|| {
            DomainError::NotFound(format!(
                "No PSP page for credential {} on gateway account {}",
                credential_external_id, account.external_id
            ))
        })
}

/// Where to send the user after editing a credential: back to the switch
/// task list while switching to it, otherwise to its own page.
fn after_update_url(
    account: &GatewayAccount,
    credential: &GatewayAccountCredential,
    style: LinkStyle<'_>,
) -> Result<String, DomainError> {
    let switching_to_this = credentials::is_switching_credentials(account)?
        && credential.state.is_pending();
    if switching_to_this {
        Ok(format!("{}/switch-psp", credentials::settings_base_url(account, style)))
    } else {
        Ok(credentials::your_psp_url(account, &credential.external_id, style))
    }
}

/// GET {account}/your-psp: credential pages linked from settings.
pub async fn list_psp_links(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    auth.require_permission(READ)?;
    let account = auth.account()?;
    let style = link_style(&state.config, &auth)?;

    let current = credentials::get_current_credential(account)?;
    Ok(View::render(
        "settings/your-psp-links",
        json!({
            "links": credentials::get_psp_page_links(account, style),
            "current_credential": current.map(|c| &c.external_id),
            "has_switched_provider": credentials::has_switched_provider(account),
            "is_switching": credentials::is_switching_credentials(account)?,
        }),
    ))
}

/// GET {account}/your-psp/{credential}
pub async fn show_credential(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(path): Path<CredentialPath>,
) -> Result<View, AppError> {
    auth.require_permission(READ)?;
    let account = auth.account()?;
    let credential = psp_page_credential(account, &path.credential_external_id)?;
    let style = link_style(&state.config, &auth)?;

    Ok(View::render(
        "your-psp/index",
        json!({
            "credential": {
                "external_id": credential.external_id,
                "payment_provider": credential.payment_provider,
                "state": credential.state,
                "merchant_id": credential.merchant_id(),
                "username": credential.credentials.get("username"),
                "has_credentials": credential.has_credentials(),
            },
            "requires3ds": account.requires3ds,
            "integration_version_3ds": account.integration_version_3ds,
            "is_worldpay": credential.payment_provider == PaymentProvider::Worldpay,
            "flex_configured": account.has_flex_credentials(),
            "psp_links": credentials::get_psp_page_links(account, style),
        }),
    ))
}

/// POST {account}/your-psp/{credential}: enter or replace PSP credentials.
pub async fn update_credentials(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(path): Path<CredentialPath>,
    Form(form): Form<CredentialsForm>,
) -> Result<View, AppError> {
    auth.require_permission(UPDATE)?;
    let account = auth.account()?;
    let credential = psp_page_credential(account, &path.credential_external_id)?;

    let next_state = match credential.state {
        CredentialState::Created | CredentialState::Entered => {
            credentials::apply_transition(credential, CredentialState::Entered)?
        }
        // Rotating the password of the live credential keeps it live.
        CredentialState::Active => CredentialState::Active,
        CredentialState::VerifiedWithLivePayment | CredentialState::Retired => {
            return Err(DomainError::NotFound(format!(
                "Credential {} can no longer be updated",
                credential.external_id
            ))
            .into());
        }
    };

    let mut v = Validator::new();
    let merchant_id = v.required("merchant_id", &form.merchant_id, "a merchant code");
    let username = v.required("username", &form.username, "a username");
    v.check("password", !form.password.is_empty(), "Enter a password");
    v.finish().map_err(AppError::Validation)?;

    state
        .connector
        .update_credentials(
            account.gateway_account_id,
            credential.gateway_account_credential_id,
            json!({
                "merchant_id": merchant_id,
                "username": username,
                "password": form.password,
            }),
            next_state,
            &auth.user.external_id,
        )
        .await?;

    tracing::info!(
        gateway_account_id = account.gateway_account_id,
        credential_external_id = %credential.external_id,
        provider = %credential.payment_provider,
        state = %next_state,
        "updated gateway account credentials"
    );

    let style = link_style(&state.config, &auth)?;
    Ok(View::redirect(after_update_url(account, credential, style)?))
}

/// POST {account}/your-psp/{credential}/flex: Worldpay 3DS Flex settings.
pub async fn update_flex_credentials(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(path): Path<CredentialPath>,
    Form(form): Form<FlexForm>,
) -> Result<View, AppError> {
    auth.require_permission(UPDATE)?;
    let account = auth.account()?;
    let credential = psp_page_credential(account, &path.credential_external_id)?;
    if credential.payment_provider != PaymentProvider::Worldpay
        || credential.state == CredentialState::Retired
    {
        return Err(DomainError::NotFound(format!(
            "3DS Flex is not available for credential {}",
            credential.external_id
        ))
        .into());
    }

    let mut v = Validator::new();
    let org_unit = v.required("organisational_unit_id", &form.organisational_unit_id, "your organisational unit ID");
    let issuer = v.required("issuer", &form.issuer, "your issuer");
    let jwt_mac_key = v.required("jwt_mac_key", &form.jwt_mac_key, "your JWT MAC key");
    if !v.has_error("organisational_unit_id") {
        v.check(
            "organisational_unit_id",
            validation::flex_identifier(org_unit),
            "Enter your organisational unit ID in the format you received it",
        );
    }
    if !v.has_error("issuer") {
        v.check(
            "issuer",
            validation::flex_identifier(issuer),
            "Enter your issuer in the format you received it",
        );
    }
    if !v.has_error("jwt_mac_key") {
        v.check(
            "jwt_mac_key",
            validation::jwt_mac_key(jwt_mac_key),
            "Enter your JWT MAC key in the format you received it",
        );
    }
    v.finish().map_err(AppError::Validation)?;

    state
        .connector
        .update_flex_credentials(
            account.gateway_account_id,
            &FlexCredentials {
                organisational_unit_id: org_unit,
                issuer,
                jwt_mac_key,
            },
        )
        .await?;

    tracing::info!(
        gateway_account_id = account.gateway_account_id,
        "updated worldpay 3ds flex credentials"
    );

    let style = link_style(&state.config, &auth)?;
    Ok(View::redirect(after_update_url(account, credential, style)?))
}
