//! 3D Secure toggle for a gateway account.

use std::sync::Arc;

use axum::{extract::State, Extension, Form};
use serde::Deserialize;
use serde_json::json;

use super::link_style;
use crate::credentials;
use crate::errors::{AppError, DomainError, FieldError};
use crate::middleware::auth::AuthContext;
use crate::models::credential::PaymentProvider;
use crate::models::gateway_account::GatewayAccount;
use crate::views::View;
use crate::AppState;

#[derive(Deserialize)]
pub struct Toggle3dsForm {
    #[serde(rename = "three-dee-secure", default)]
    pub three_dee_secure: String,
}

fn supports_3ds(provider: PaymentProvider) -> bool {
    matches!(
        provider,
        PaymentProvider::Worldpay
            | PaymentProvider::Stripe
            | PaymentProvider::Epdq
            | PaymentProvider::Smartpay
    )
}

/// 3DS cannot be turned off for Stripe, nor for Worldpay once Flex is live
/// on 3DS2.
fn toggle_locked(account: &GatewayAccount) -> bool {
    match account.payment_provider {
        PaymentProvider::Stripe => true,
        PaymentProvider::Worldpay => {
            account.has_flex_credentials() && account.integration_version_3ds == 2
        }
        _ => false,
    }
}

/// GET {account}/toggle-3ds
pub async fn show_3ds(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<View, AppError> {
    auth.require_permission("toggle-3ds:read")?;
    let account = auth.account()?;
    let style = link_style(&state.config, &auth)?;

    Ok(View::render(
        "3d-secure/index",
        json!({
            "requires3ds": account.requires3ds,
            "supports3ds": supports_3ds(account.payment_provider),
            "disable_toggle": toggle_locked(account),
            "payment_provider": account.payment_provider,
            "dashboard_href": credentials::dashboard_url(account, style),
        }),
    ))
}

/// POST {account}/toggle-3ds
pub async fn update_3ds(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Form(form): Form<Toggle3dsForm>,
) -> Result<View, AppError> {
    auth.require_permission("toggle-3ds:update")?;
    let account = auth.account()?;

    if !supports_3ds(account.payment_provider) {
        return Err(DomainError::NotFound(format!(
            "3DS is not supported for gateway account {}",
            account.external_id
        ))
        .into());
    }

    let requires3ds = match form.three_dee_secure.as_str() {
        "on" => true,
        "off" => false,
        _ => {
            return Err(AppError::Validation(vec![FieldError::new(
                "three-dee-secure",
                "Select whether 3D Secure should be on or off",
            )]))
        }
    };
    if !requires3ds && toggle_locked(account) {
        tracing::info!(
            gateway_account_id = account.gateway_account_id,
            provider = %account.payment_provider,
            "refused to turn off locked 3ds"
        );
        return Err(AppError::Validation(vec![FieldError::new(
            "three-dee-secure",
            "3D Secure cannot be turned off for this account",
        )]));
    }

    state
        .connector
        .update_requires_3ds(account.gateway_account_id, requires3ds)
        .await?;
    tracing::info!(
        gateway_account_id = account.gateway_account_id,
        requires3ds,
        "updated 3ds setting"
    );

    let style = link_style(&state.config, &auth)?;
    Ok(View::redirect(format!(
        "{}/toggle-3ds",
        credentials::settings_base_url(account, style)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gateway_account::{AccountType, Worldpay3dsFlex};

    fn account(provider: PaymentProvider, flex: bool, version: u8) -> GatewayAccount {
        GatewayAccount {
            gateway_account_id: 1,
            external_id: "a".into(),
            payment_provider: provider,
            account_type: AccountType::Test,
            service_name: None,
            requires3ds: true,
            integration_version_3ds: version,
            worldpay_3ds_flex: flex.then(|| Worldpay3dsFlex {
                organisational_unit_id: "5bd9b55e4444761ac0af1c80".into(),
                issuer: "5bd9e0e4444dce153428c940".into(),
                exemption_engine_enabled: false,
            }),
            gateway_account_credentials: vec![],
        }
    }

    #[test]
    fn test_toggle_locked() {
        assert!(toggle_locked(&account(PaymentProvider::Stripe, false, 1)));
        assert!(toggle_locked(&account(PaymentProvider::Worldpay, true, 2)));
        assert!(!toggle_locked(&account(PaymentProvider::Worldpay, true, 1)));
        assert!(!toggle_locked(&account(PaymentProvider::Worldpay, false, 2)));
        assert!(!toggle_locked(&account(PaymentProvider::Epdq, false, 2)));
    }

    #[test]
    fn test_sandbox_has_no_3ds() {
        assert!(!supports_3ds(PaymentProvider::Sandbox));
        assert!(supports_3ds(PaymentProvider::Smartpay));
    }
}
