//! PSP credential resolution for a gateway account.
//!
//! An account carries every credential set it has ever had. At most one is
//! `ACTIVE` (the one taking payments) and at most one is pending (the one
//! being switched to). Anything else is an ambiguous configuration and is
//! reported as `InvalidConfigurationError` rather than guessed at.

use serde::Serialize;

use crate::errors::DomainError;
use crate::models::credential::{CredentialState, GatewayAccountCredential, PaymentProvider};
use crate::models::gateway_account::GatewayAccount;

/// Providers that get a "Your PSP" settings page.
const PSP_PAGE_PROVIDERS: [PaymentProvider; 3] = [
    PaymentProvider::Worldpay,
    PaymentProvider::Smartpay,
    PaymentProvider::Epdq,
];

/// The credential currently taking payments, if any.
pub fn get_current_credential(
    account: &GatewayAccount,
) -> Result<Option<&GatewayAccountCredential>, DomainError> {
    let mut active = account
        .gateway_account_credentials
        .iter()
        .filter(|c| c.state == CredentialState::Active);

    let current = active.next();
    if active.next().is_some() {
        return Err(DomainError::InvalidConfiguration(format!(
            "Multiple active credentials found for gateway account {}",
            account.external_id
        )));
    }
    Ok(current)
}

/// The single pending credential being switched to, or `None` when there is no switch.
pub fn get_switching_credential_if_exists(
    account: &GatewayAccount,
) -> Result<Option<&GatewayAccountCredential>, DomainError> {
    let mut pending = account
        .gateway_account_credentials
        .iter()
        .filter(|c| c.state.is_pending());

    let switching = pending.next();
    if pending.next().is_some() {
        return Err(DomainError::InvalidConfiguration(format!(
            "Unable to determine which credentials are being switched to for gateway account {}",
            account.external_id
        )));
    }
    Ok(switching)
}

/// The single pending credential being switched to.
pub fn get_switching_credential(
    account: &GatewayAccount,
) -> Result<&GatewayAccountCredential, DomainError> {
    get_switching_credential_if_exists(account)?.ok_or_else(|| {
        DomainError::InvalidConfiguration(format!(
            "No credentials being switched to found for gateway account {}",
            account.external_id
        ))
    })
}

pub fn get_credential_by_external_id<'a>(
    account: &'a GatewayAccount,
    credential_external_id: &str,
) -> Option<&'a GatewayAccountCredential> {
    account
        .gateway_account_credentials
        .iter()
        .find(|c| c.external_id == credential_external_id)
}

/// True once any credential on the account has been superseded.
pub fn has_switched_provider(account: &GatewayAccount) -> bool {
    account
        .gateway_account_credentials
        .iter()
        .any(|c| c.state == CredentialState::Retired)
}

/// True while an active credential is being replaced by a pending one.
pub fn is_switching_credentials(account: &GatewayAccount) -> Result<bool, DomainError> {
    Ok(get_current_credential(account)?.is_some()
        && get_switching_credential_if_exists(account)?.is_some())
}

// ── PSP page links ───────────────────────────────────────────

/// How settings URLs are built. `Degateway` is the service-scoped URL scheme
/// behind the `DEGATEWAY_FLAG` feature flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStyle<'a> {
    Legacy,
    Degateway { service_external_id: &'a str },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PspPageLink {
    pub credential_external_id: String,
    pub payment_provider: PaymentProvider,
    pub state: CredentialState,
    pub label: String,
    pub href: String,
}

/// Credential pages to list on the settings screen, in account order.
pub fn get_psp_page_links(account: &GatewayAccount, style: LinkStyle<'_>) -> Vec<PspPageLink> {
    account
        .gateway_account_credentials
        .iter()
        .filter(|c| PSP_PAGE_PROVIDERS.contains(&c.payment_provider))
        .filter(|c| c.state != CredentialState::Retired)
        .map(|c| PspPageLink {
            credential_external_id: c.external_id.clone(),
            payment_provider: c.payment_provider,
            state: c.state,
            label: format!("Your PSP - {}", c.payment_provider.display_name()),
            href: your_psp_url(account, &c.external_id, style),
        })
        .collect()
}

/// Root of the per-account settings pages.
pub fn settings_base_url(account: &GatewayAccount, style: LinkStyle<'_>) -> String {
    match style {
        LinkStyle::Legacy => format!("/account/{}", account.external_id),
        LinkStyle::Degateway { service_external_id } => format!(
            "/service/{}/account/{}/settings",
            service_external_id,
            account.account_type.as_str()
        ),
    }
}

pub fn your_psp_url(account: &GatewayAccount, credential_external_id: &str, style: LinkStyle<'_>) -> String {
    format!(
        "{}/your-psp/{}",
        settings_base_url(account, style),
        credential_external_id
    )
}

pub fn dashboard_url(account: &GatewayAccount, style: LinkStyle<'_>) -> String {
    match style {
        LinkStyle::Legacy => format!("/account/{}/dashboard", account.external_id),
        LinkStyle::Degateway { service_external_id } => format!(
            "/service/{}/account/{}/dashboard",
            service_external_id,
            account.account_type.as_str()
        ),
    }
}

/// The Stripe credential KYC steps apply to: the one being switched to if
/// it is Stripe, otherwise the current one if it is Stripe. A new Stripe
/// account's only credential is still `CREATED`, so it counts as switching.
pub fn get_stripe_credential(
    account: &GatewayAccount,
) -> Result<&GatewayAccountCredential, DomainError> {
    let is_stripe = |c: &&GatewayAccountCredential| c.payment_provider == PaymentProvider::Stripe;
    let credential = match get_switching_credential_if_exists(account)?.filter(is_stripe) {
        Some(c) => Some(c),
        None => get_current_credential(account)?.filter(is_stripe),
    };
    credential.ok_or_else(|| {
        DomainError::NotFound(format!(
            "Gateway account {} has no Stripe credential",
            account.external_id
        ))
    })
}

pub fn stripe_account_id(credential: &GatewayAccountCredential) -> Result<&str, DomainError> {
    credential
        .credentials
        .get("stripe_account_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            DomainError::InvalidConfiguration(format!(
                "Credential {} has no Stripe account id",
                credential.external_id
            ))
        })
}

// ── Transitions ──────────────────────────────────────────────

/// Validate a single lifecycle move for `credential`.
pub fn apply_transition(
    credential: &GatewayAccountCredential,
    next: CredentialState,
) -> Result<CredentialState, DomainError> {
    if credential.state.can_transition_to(next) {
        Ok(next)
    } else {
        Err(DomainError::InvalidConfiguration(format!(
            "Credential {} cannot move from {} to {}",
            credential.external_id, credential.state, next
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateUpdate {
    pub credential_external_id: String,
    pub state: CredentialState,
}

/// State updates implied by activating `credential_external_id`: the target
/// becomes `ACTIVE` and the credential it replaces becomes `RETIRED`.
pub fn plan_activation(
    account: &GatewayAccount,
    credential_external_id: &str,
) -> Result<Vec<StateUpdate>, DomainError> {
    let target = get_credential_by_external_id(account, credential_external_id).ok_or_else(|| {
        DomainError::NotFound(format!(
            "Credential {} not found on gateway account {}",
            credential_external_id, account.external_id
        ))
    })?;
    let current = get_current_credential(account)?;

    let mut updates = vec![StateUpdate {
        credential_external_id: target.external_id.clone(),
        state: apply_transition(target, CredentialState::Active)?,
    }];
    if let Some(current) = current {
        updates.push(StateUpdate {
            credential_external_id: current.external_id.clone(),
            state: apply_transition(current, CredentialState::Retired)?,
        });
    }
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gateway_account::AccountType;

    fn credential(id: i64, provider: PaymentProvider, state: CredentialState) -> GatewayAccountCredential {
        GatewayAccountCredential {
            gateway_account_credential_id: id,
            external_id: format!("cred-{}", id),
            payment_provider: provider,
            state,
            credentials: Default::default(),
            created_date: None,
            active_start_date: None,
            active_end_date: None,
        }
    }

    fn account(credentials: Vec<GatewayAccountCredential>) -> GatewayAccount {
        GatewayAccount {
            gateway_account_id: 1,
            external_id: "acct-ext".into(),
            payment_provider: PaymentProvider::Worldpay,
            account_type: AccountType::Live,
            service_name: Some("My service".into()),
            requires3ds: false,
            integration_version_3ds: 2,
            worldpay_3ds_flex: None,
            gateway_account_credentials: credentials,
        }
    }

    #[test]
    fn test_current_is_the_active_credential() {
        let acct = account(vec![
            credential(1, PaymentProvider::Worldpay, CredentialState::Retired),
            credential(2, PaymentProvider::Worldpay, CredentialState::Active),
        ]);
        let current = get_current_credential(&acct).unwrap().unwrap();
        assert_eq!(current.gateway_account_credential_id, 2);
    }

    #[test]
    fn test_current_is_none_without_active() {
        let acct = account(vec![credential(1, PaymentProvider::Stripe, CredentialState::Created)]);
        assert!(get_current_credential(&acct).unwrap().is_none());
        assert!(get_current_credential(&account(vec![])).unwrap().is_none());
    }

    #[test]
    fn test_two_active_credentials_is_a_configuration_error() {
        let acct = account(vec![
            credential(1, PaymentProvider::Worldpay, CredentialState::Active),
            credential(2, PaymentProvider::Stripe, CredentialState::Active),
        ]);
        let err = get_current_credential(&acct).unwrap_err();
        assert_eq!(err.kind(), "InvalidConfigurationError");
    }

    #[test]
    fn test_switching_credential_if_exists() {
        let acct = account(vec![credential(1, PaymentProvider::Worldpay, CredentialState::Active)]);
        assert!(get_switching_credential_if_exists(&acct).unwrap().is_none());

        let acct = account(vec![
            credential(1, PaymentProvider::Worldpay, CredentialState::Active),
            credential(2, PaymentProvider::Stripe, CredentialState::VerifiedWithLivePayment),
        ]);
        let switching = get_switching_credential_if_exists(&acct).unwrap().unwrap();
        assert_eq!(switching.gateway_account_credential_id, 2);
        assert!(is_switching_credentials(&acct).unwrap());
    }

    #[test]
    fn test_switching_if_exists_still_rejects_ambiguity() {
        let acct = account(vec![
            credential(1, PaymentProvider::Worldpay, CredentialState::Created),
            credential(2, PaymentProvider::Stripe, CredentialState::Entered),
        ]);
        assert!(matches!(
            get_switching_credential_if_exists(&acct),
            Err(DomainError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_psp_links_degateway_style() {
        let acct = account(vec![credential(7, PaymentProvider::Epdq, CredentialState::Entered)]);
        let links = get_psp_page_links(
            &acct,
            LinkStyle::Degateway {
                service_external_id: "svc-1",
            },
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "Your PSP - ePDQ");
        assert_eq!(links[0].href, "/service/svc-1/account/live/settings/your-psp/cred-7");
    }

    #[test]
    fn test_apply_transition_rejects_retired() {
        let cred = credential(1, PaymentProvider::Worldpay, CredentialState::Retired);
        assert!(apply_transition(&cred, CredentialState::Active).is_err());
        let cred = credential(1, PaymentProvider::Worldpay, CredentialState::Created);
        assert_eq!(
            apply_transition(&cred, CredentialState::Entered).unwrap(),
            CredentialState::Entered
        );
    }

    #[test]
    fn test_plan_activation_retires_current() {
        let acct = account(vec![
            credential(1, PaymentProvider::Worldpay, CredentialState::Active),
            credential(2, PaymentProvider::Stripe, CredentialState::VerifiedWithLivePayment),
        ]);
        let updates = plan_activation(&acct, "cred-2").unwrap();
        assert_eq!(
            updates,
            vec![
                StateUpdate {
                    credential_external_id: "cred-2".into(),
                    state: CredentialState::Active
                },
                StateUpdate {
                    credential_external_id: "cred-1".into(),
                    state: CredentialState::Retired
                },
            ]
        );
    }

    #[test]
    fn test_plan_activation_unknown_credential() {
        let acct = account(vec![credential(1, PaymentProvider::Worldpay, CredentialState::Active)]);
        assert!(matches!(
            plan_activation(&acct, "nope"),
            Err(DomainError::NotFound(_))
        ));
        // Re-activating the active credential is not a legal move.
        assert!(plan_activation(&acct, "cred-1").is_err());
    }
}
