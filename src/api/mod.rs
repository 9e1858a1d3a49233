use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::credentials::LinkStyle;
use crate::errors::DomainError;
use crate::middleware::auth::{user_is_authorised, AuthContext};
use crate::middleware::session::load_session;
use crate::AppState;

pub mod go_live;
pub mod settings;
pub mod stripe_setup;
pub mod switch_psp;
pub mod validation;
pub mod your_psp;

/// Per-account pages. Mounted under the legacy account prefix and, behind
/// `DEGATEWAY_FLAG`, under the service-scoped prefix as well.
fn account_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/your-psp", get(your_psp::list_psp_links))
        .route(
            "/your-psp/:credential_external_id",
            get(your_psp::show_credential).post(your_psp::update_credentials),
        )
        .route(
            "/your-psp/:credential_external_id/flex",
            axum::routing::post(your_psp::update_flex_credentials),
        )
        .route(
            "/switch-psp",
            get(switch_psp::show_task_list).post(switch_psp::switch),
        )
        .route(
            "/switch-psp/verify-psp-integration",
            axum::routing::post(switch_psp::verify_psp_integration),
        )
        .route(
            "/toggle-3ds",
            get(settings::show_3ds).post(settings::update_3ds),
        )
        .route("/stripe-setup", get(stripe_setup::task_list))
        .route(
            "/bank-details",
            get(stripe_setup::show_bank_details).post(stripe_setup::submit_bank_details),
        )
        .route(
            "/vat-number",
            get(stripe_setup::show_vat_number).post(stripe_setup::submit_vat_number),
        )
        .route(
            "/company-number",
            get(stripe_setup::show_company_number).post(stripe_setup::submit_company_number),
        )
        .route(
            "/responsible-person",
            get(stripe_setup::show_responsible_person)
                .post(stripe_setup::submit_responsible_person),
        )
        .route(
            "/director",
            get(stripe_setup::show_director).post(stripe_setup::submit_director),
        )
        .route(
            "/government-entity-document",
            get(stripe_setup::show_government_entity_document)
                .post(stripe_setup::submit_government_entity_document)
                // Room for the multipart framing around a maximum-size file.
                .layer(DefaultBodyLimit::max(stripe_setup::MAX_DOCUMENT_BYTES + 64 * 1024)),
        )
        .route(
            "/check-organisation-details",
            get(stripe_setup::show_organisation_details)
                .post(stripe_setup::submit_organisation_details),
        )
}

fn go_live_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(go_live::index))
        .route(
            "/organisation-name",
            get(go_live::show_organisation_name).post(go_live::submit_organisation_name),
        )
        .route(
            "/organisation-address",
            get(go_live::show_organisation_address).post(go_live::submit_organisation_address),
        )
        .route(
            "/choose-how-to-process-payments",
            get(go_live::show_choose_psp).post(go_live::submit_choose_psp),
        )
        .route(
            "/agreement",
            get(go_live::show_agreement).post(go_live::submit_agreement),
        )
}

/// Build the signed-in page router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut pages = Router::new()
        .nest("/account/:account_external_id", account_router())
        .nest(
            "/service/:service_external_id/request-to-go-live",
            go_live_router(),
        );
    if state.config.features.degateway {
        pages = pages.nest(
            "/service/:service_external_id/account/:account_type/settings",
            account_router(),
        );
    }

    let pages = pages
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_is_authorised,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), load_session));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .merge(pages)
        .fallback(fallback_404)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// URL scheme for links rendered into account pages.
pub(crate) fn link_style<'a>(config: &Config, auth: &'a AuthContext) -> Result<LinkStyle<'a>, DomainError> {
    if config.features.degateway {
        Ok(LinkStyle::Degateway {
            service_external_id: &auth.service_role()?.service.external_id,
        })
    } else {
        Ok(LinkStyle::Legacy)
    }
}
