//! Request-to-go-live pages. Every page re-reads the service so the stage
//! gate works on the stage adminusers holds right now.

use std::sync::Arc;

use axum::{extract::State, Extension, Form};
use serde::Deserialize;
use serde_json::json;

use super::validation::{self, Validator};
use crate::clients::adminusers::OrganisationAddress;
use crate::errors::{AppError, DomainError};
use crate::go_live::{self, GateOutcome, GoLiveFlow};
use crate::middleware::auth::AuthContext;
use crate::models::go_live_stage::{ChosenPsp, GoLiveStage};
use crate::models::service::Service;
use crate::views::View;
use crate::AppState;

const READ: &str = "go-live-stage:read";
const UPDATE: &str = "go-live-stage:update";

#[derive(Deserialize)]
pub struct OrganisationNameForm {
    #[serde(default)]
    pub organisation_name: String,
}

#[derive(Deserialize)]
pub struct OrganisationAddressForm {
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    #[serde(default)]
    pub address_city: String,
    #[serde(default)]
    pub address_postcode: String,
    #[serde(default)]
    pub address_country: String,
}

#[derive(Deserialize)]
pub struct ChoosePspForm {
    #[serde(rename = "choose-how-to-process-payments-mode", default)]
    pub psp: String,
}

#[derive(Deserialize)]
pub struct AgreementForm {
    #[serde(default)]
    pub agreement: String,
}

async fn current_service(state: &AppState, auth: &AuthContext) -> Result<Service, AppError> {
    let service_external_id = &auth.service_role()?.service.external_id;
    Ok(state.adminusers.get_service(service_external_id).await?)
}

/// Load the service and apply the stage gate for `flow`. `Err` carries the
/// redirect to send instead of the page.
async fn gate(
    state: &AppState,
    auth: &AuthContext,
    flow: GoLiveFlow,
) -> Result<Result<Service, View>, AppError> {
    auth.require_permission(UPDATE)?;
    let service = current_service(state, auth).await?;
    match go_live::check_stage(flow, service.current_go_live_stage, &service.external_id) {
        GateOutcome::Allowed => Ok(Ok(service)),
        GateOutcome::RedirectToIndex(to) => Ok(Err(View::redirect(to))),
    }
}

async fn advance_stage(
    state: &AppState,
    service: &Service,
    next: GoLiveStage,
) -> Result<(), AppError> {
    let from = service.current_go_live_stage;
    if !from.can_advance_to(next) {
        return Err(DomainError::InvalidConfiguration(format!(
            "Service {} cannot move from go-live stage {} to {}",
            service.external_id, from, next
        ))
        .into());
    }
    state
        .adminusers
        .update_current_go_live_stage(&service.external_id, next)
        .await?;
    tracing::info!(
        service_external_id = %service.external_id,
        from = %from,
        to = %next,
        "go-live stage updated"
    );
    Ok(())
}

/// GET /service/{service}/request-to-go-live
pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    auth.require_permission(READ)?;
    let service = current_service(&state, &auth).await?;
    let stage = service.current_go_live_stage;

    Ok(View::render(
        "request-to-go-live/index",
        json!({
            "service_name": service.name,
            "current_go_live_stage": stage,
            "chosen_psp": stage.chosen_psp(),
            "next_href": go_live::next_flow(stage).map(|f| f.url(&service.external_id)),
            "terms_agreed": stage.is_terms_agreed(),
            "denied": stage == GoLiveStage::Denied,
            "live": stage == GoLiveStage::Live,
        }),
    ))
}

pub async fn show_organisation_name(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    let service = match gate(&state, &auth, GoLiveFlow::OrganisationName).await? {
        Ok(service) => service,
        Err(redirect) => return Ok(redirect),
    };
    Ok(View::render(
        "request-to-go-live/organisation-name",
        json!({ "organisation_name": service.name }),
    ))
}

pub async fn submit_organisation_name(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<OrganisationNameForm>,
) -> Result<View, AppError> {
    let service = match gate(&state, &auth, GoLiveFlow::OrganisationName).await? {
        Ok(service) => service,
        Err(redirect) => return Ok(redirect),
    };

    let mut v = Validator::new();
    let name = v.required("organisation_name", &form.organisation_name, "the name of your organisation");
    v.finish().map_err(AppError::Validation)?;

    state
        .adminusers
        .update_organisation_name(&service.external_id, name)
        .await?;
    advance_stage(&state, &service, GoLiveStage::EnteredOrganisationName).await?;
    Ok(View::redirect(GoLiveFlow::OrganisationAddress.url(&service.external_id)))
}

pub async fn show_organisation_address(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    let service = match gate(&state, &auth, GoLiveFlow::OrganisationAddress).await? {
        Ok(service) => service,
        Err(redirect) => return Ok(redirect),
    };
    Ok(View::render(
        "request-to-go-live/organisation-address",
        json!({ "service_name": service.name }),
    ))
}

pub async fn submit_organisation_address(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<OrganisationAddressForm>,
) -> Result<View, AppError> {
    let service = match gate(&state, &auth, GoLiveFlow::OrganisationAddress).await? {
        Ok(service) => service,
        Err(redirect) => return Ok(redirect),
    };

    let mut v = Validator::new();
    let line1 = v.required("address_line1", &form.address_line1, "a building and street");
    let city = v.required("address_city", &form.address_city, "a town or city");
    let country = v.required("address_country", &form.address_country, "a country");
    let postcode = v.required("address_postcode", &form.address_postcode, "a postcode");
    if country == "GB" && !v.has_error("address_postcode") {
        v.check(
            "address_postcode",
            validation::postcode(postcode),
            "Enter a real postcode",
        );
    }
    v.finish().map_err(AppError::Validation)?;

    let address = OrganisationAddress {
        address_line1: line1.to_string(),
        address_line2: form.address_line2.trim().to_string(),
        address_city: city.to_string(),
        address_postcode: postcode.to_uppercase(),
        address_country: country.to_string(),
    };
    state
        .adminusers
        .update_organisation_address(&service.external_id, &address)
        .await?;
    advance_stage(&state, &service, GoLiveStage::EnteredOrganisationAddress).await?;
    Ok(View::redirect(
        GoLiveFlow::ChooseHowToProcessPayments.url(&service.external_id),
    ))
}

pub async fn show_choose_psp(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    let service = match gate(&state, &auth, GoLiveFlow::ChooseHowToProcessPayments).await? {
        Ok(service) => service,
        Err(redirect) => return Ok(redirect),
    };
    Ok(View::render(
        "request-to-go-live/choose-how-to-process-payments",
        json!({ "service_name": service.name }),
    ))
}

fn parse_chosen_psp(value: &str) -> Option<ChosenPsp> {
    serde_json::from_value(json!(value.trim())).ok()
}

pub async fn submit_choose_psp(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<ChoosePspForm>,
) -> Result<View, AppError> {
    let service = match gate(&state, &auth, GoLiveFlow::ChooseHowToProcessPayments).await? {
        Ok(service) => service,
        Err(redirect) => return Ok(redirect),
    };

    let mut v = Validator::new();
    let psp = parse_chosen_psp(&form.psp);
    v.check(
        "choose-how-to-process-payments-mode",
        psp.is_some(),
        "Select how you want to process payments",
    );
    v.finish().map_err(AppError::Validation)?;

    if let Some(psp) = psp {
        advance_stage(&state, &service, GoLiveStage::chosen(psp)).await?;
    }
    Ok(View::redirect(GoLiveFlow::Agreement.url(&service.external_id)))
}

pub async fn show_agreement(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    let service = match gate(&state, &auth, GoLiveFlow::Agreement).await? {
        Ok(service) => service,
        Err(redirect) => return Ok(redirect),
    };
    Ok(View::render(
        "request-to-go-live/agreement",
        json!({
            "service_name": service.name,
            "chosen_psp": service.current_go_live_stage.chosen_psp(),
        }),
    ))
}

pub async fn submit_agreement(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<AgreementForm>,
) -> Result<View, AppError> {
    let service = match gate(&state, &auth, GoLiveFlow::Agreement).await? {
        Ok(service) => service,
        Err(redirect) => return Ok(redirect),
    };

    let mut v = Validator::new();
    v.check(
        "agreement",
        !form.agreement.trim().is_empty(),
        "You must confirm that you have read and accept the terms",
    );
    v.finish().map_err(AppError::Validation)?;

    // The gate only lets CHOSEN_PSP_* stages through.
    let psp = service.current_go_live_stage.chosen_psp().ok_or_else(|| {
        DomainError::InvalidConfiguration(format!(
            "Service {} has not chosen a PSP",
            service.external_id
        ))
    })?;
    advance_stage(&state, &service, GoLiveStage::terms_agreed(psp)).await?;
    Ok(View::redirect(go_live::index_url(&service.external_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chosen_psp() {
        assert_eq!(parse_chosen_psp("stripe"), Some(ChosenPsp::Stripe));
        assert_eq!(
            parse_chosen_psp(" gov_banking_worldpay "),
            Some(ChosenPsp::GovBankingWorldpay)
        );
        assert_eq!(parse_chosen_psp("sandbox"), None);
        assert_eq!(parse_chosen_psp(""), None);
    }
}
