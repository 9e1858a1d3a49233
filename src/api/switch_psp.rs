use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension};
use serde_json::json;

use super::link_style;
use crate::credentials;
use crate::errors::{AppError, DomainError};
use crate::middleware::auth::AuthContext;
use crate::models::credential::{CredentialState, GatewayAccountCredential, PaymentProvider};
use crate::models::gateway_account::GatewayAccount;
use crate::switch_psp::{self as tasks, SwitchTaskList};
use crate::views::View;
use crate::AppState;

const PERMISSION: &str = "gateway-credentials:update";

/// Switching credential plus its computed task list. Switch pages only exist
/// while a switch is under way.
async fn load_task_list<'a>(
    state: &AppState,
    account: &'a GatewayAccount,
) -> Result<(&'a GatewayAccountCredential, SwitchTaskList), AppError> {
    if !credentials::is_switching_credentials(account)? {
        return Err(DomainError::NotFound(format!(
            "Gateway account {} is not switching PSP",
            account.external_id
        ))
        .into());
    }
    let switching = credentials::get_switching_credential(account)?;

    let stripe_setup = if switching.payment_provider == PaymentProvider::Stripe {
        Some(
            state
                .connector
                .get_stripe_account_setup(account.gateway_account_id)
                .await?,
        )
    } else {
        None
    };
    let list = tasks::build_task_list(account, switching, stripe_setup.as_ref())?;
    Ok((switching, list))
}

fn task_list_view(
    account: &GatewayAccount,
    switching: &GatewayAccountCredential,
    list: &SwitchTaskList,
    your_psp_href: String,
    error: Option<&str>,
) -> Result<View, DomainError> {
    let current = credentials::get_current_credential(account)?;
    Ok(View::render(
        "switch-psp/index",
        json!({
            "current_provider": current.map(|c| c.payment_provider),
            "target_provider": list.target_provider,
            "switching_credential": switching.external_id,
            "your_psp_href": your_psp_href,
            "tasks": list.tasks,
            "ready_to_switch": list.is_complete(),
            "error": error,
        }),
    ))
}

/// GET {account}/switch-psp
pub async fn show_task_list(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    auth.require_permission(PERMISSION)?;
    let account = auth.account()?;
    let (switching, list) = load_task_list(&state, account).await?;
    let style = link_style(&state.config, &auth)?;
    let href = credentials::your_psp_url(account, &switching.external_id, style);
    Ok(task_list_view(account, switching, &list, href, None)?)
}

/// POST {account}/switch-psp: make the switching credential the live one.
pub async fn switch(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    auth.require_permission(PERMISSION)?;
    let account = auth.account()?;
    let (switching, list) = load_task_list(&state, account).await?;
    let style = link_style(&state.config, &auth)?;

    if !list.is_complete() {
        tracing::info!(
            gateway_account_id = account.gateway_account_id,
            target = %switching.payment_provider,
            "switch attempted before all tasks complete"
        );
        let href = credentials::your_psp_url(account, &switching.external_id, style);
        let view = task_list_view(
            account,
            switching,
            &list,
            href,
            Some("You must complete all the tasks before you can switch"),
        )?;
        return Ok(view.with_status(StatusCode::BAD_REQUEST));
    }

    // Validate locally first; connector applies both moves atomically.
    let updates = credentials::plan_activation(account, &switching.external_id)?;
    state
        .connector
        .switch_psp(
            account.gateway_account_id,
            &switching.external_id,
            &auth.user.external_id,
        )
        .await?;

    for update in &updates {
        tracing::info!(
            gateway_account_id = account.gateway_account_id,
            credential_external_id = %update.credential_external_id,
            state = %update.state,
            "switched psp"
        );
    }

    // Stripe has no credentials page to land on.
    let to = if switching.payment_provider.takes_entered_credentials() {
        credentials::your_psp_url(account, &switching.external_id, style)
    } else {
        credentials::dashboard_url(account, style)
    };
    Ok(View::redirect(to))
}

/// POST {account}/switch-psp/verify-psp-integration
pub async fn verify_psp_integration(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    auth.require_permission(PERMISSION)?;
    let account = auth.account()?;
    let (switching, list) = load_task_list(&state, account).await?;
    let style = link_style(&state.config, &auth)?;

    if let Err(message) = tasks::check_can_verify(switching, &list) {
        tracing::info!(
            gateway_account_id = account.gateway_account_id,
            credential_external_id = %switching.external_id,
            state = %switching.state,
            "verify attempted out of order"
        );
        let href = credentials::your_psp_url(account, &switching.external_id, style);
        let view = task_list_view(account, switching, &list, href, Some(message))?;
        return Ok(view.with_status(StatusCode::BAD_REQUEST));
    }

    let next = credentials::apply_transition(switching, CredentialState::VerifiedWithLivePayment)?;
    state
        .connector
        .update_credential_state(
            account.gateway_account_id,
            switching.gateway_account_credential_id,
            next,
            &auth.user.external_id,
        )
        .await?;
    tracing::info!(
        gateway_account_id = account.gateway_account_id,
        credential_external_id = %switching.external_id,
        "verified psp integration with a live payment"
    );

    Ok(View::redirect(format!(
        "{}/switch-psp",
        credentials::settings_base_url(account, style)
    )))
}
