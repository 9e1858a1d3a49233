use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Payment provider ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Worldpay,
    Stripe,
    Smartpay,
    Epdq,
    Sandbox,
}

impl PaymentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Worldpay => "worldpay",
            PaymentProvider::Stripe => "stripe",
            PaymentProvider::Smartpay => "smartpay",
            PaymentProvider::Epdq => "epdq",
            PaymentProvider::Sandbox => "sandbox",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentProvider::Worldpay => "Worldpay",
            PaymentProvider::Stripe => "Stripe",
            PaymentProvider::Smartpay => "Smartpay",
            PaymentProvider::Epdq => "ePDQ",
            PaymentProvider::Sandbox => "Sandbox",
        }
    }

    /// Providers whose credentials are typed in by the service team
    /// (merchant code / username / password).
    pub fn takes_entered_credentials(&self) -> bool {
        matches!(
            self,
            PaymentProvider::Worldpay | PaymentProvider::Smartpay | PaymentProvider::Epdq
        )
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Credential state ─────────────────────────────────────────

/// Lifecycle of a single set of PSP credentials on a gateway account.
///
/// ```text
/// CREATED → ENTERED → VERIFIED_WITH_LIVE_PAYMENT → ACTIVE → RETIRED
/// ```
///
/// Any pending state may be activated directly (accounts provisioned with
/// known-good credentials skip verification).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CredentialState {
    Created,
    Entered,
    VerifiedWithLivePayment,
    Active,
    Retired,
}

impl CredentialState {
    /// A credential in one of these states is the one being switched to.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            CredentialState::Created
                | CredentialState::Entered
                | CredentialState::VerifiedWithLivePayment
        )
    }

    pub fn can_transition_to(&self, next: CredentialState) -> bool {
        use CredentialState::*;
        match (*self, next) {
            (Created, Entered) => true,
            (Entered, Entered) => true,
            (Entered, VerifiedWithLivePayment) => true,
            // Stripe credentials are provisioned, never entered by hand.
            (Created, VerifiedWithLivePayment) => true,
            (Created | Entered | VerifiedWithLivePayment, Active) => true,
            (Active, Retired) => true,
            (Created, _) | (Entered, _) | (VerifiedWithLivePayment, _) => false,
            (Active, _) => false,
            (Retired, _) => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialState::Created => "CREATED",
            CredentialState::Entered => "ENTERED",
            CredentialState::VerifiedWithLivePayment => "VERIFIED_WITH_LIVE_PAYMENT",
            CredentialState::Active => "ACTIVE",
            CredentialState::Retired => "RETIRED",
        }
    }
}

impl fmt::Display for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Credential record ────────────────────────────────────────

/// One provider's credential set on a gateway account, as returned by connector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayAccountCredential {
    pub gateway_account_credential_id: i64,
    pub external_id: String,
    pub payment_provider: PaymentProvider,
    pub state: CredentialState,
    /// Provider payload. Passwords are write-only and never come back.
    #[serde(default)]
    pub credentials: serde_json::Map<String, serde_json::Value>,
    pub created_date: Option<DateTime<Utc>>,
    pub active_start_date: Option<DateTime<Utc>>,
    pub active_end_date: Option<DateTime<Utc>>,
}

impl GatewayAccountCredential {
    pub fn has_credentials(&self) -> bool {
        match self.payment_provider {
            PaymentProvider::Stripe => self.credentials.contains_key("stripe_account_id"),
            _ => self
                .credentials
                .get("username")
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.is_empty()),
        }
    }

    pub fn merchant_id(&self) -> Option<&str> {
        self.credentials
            .get("merchant_id")
            .or_else(|| self.credentials.get("merchant_code"))
            .and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CredentialState::*;

    #[test]
    fn test_pending_states() {
        assert!(Created.is_pending());
        assert!(Entered.is_pending());
        assert!(VerifiedWithLivePayment.is_pending());
        assert!(!Active.is_pending());
        assert!(!Retired.is_pending());
    }

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(Created.can_transition_to(Entered));
        assert!(Entered.can_transition_to(Entered));
        assert!(Entered.can_transition_to(VerifiedWithLivePayment));
        assert!(VerifiedWithLivePayment.can_transition_to(Active));
        assert!(Created.can_transition_to(Active));
        assert!(Active.can_transition_to(Retired));
    }

    #[test]
    fn test_backward_and_terminal_transitions_rejected() {
        assert!(!Entered.can_transition_to(Created));
        assert!(!Active.can_transition_to(Entered));
        assert!(!Created.can_transition_to(Retired));
        assert!(!VerifiedWithLivePayment.can_transition_to(Entered));
        for next in [Created, Entered, VerifiedWithLivePayment, Active, Retired] {
            assert!(!Retired.can_transition_to(next));
        }
    }

    #[test]
    fn test_state_wire_format() {
        assert_eq!(
            serde_json::to_value(VerifiedWithLivePayment).unwrap(),
            "VERIFIED_WITH_LIVE_PAYMENT"
        );
        let s: CredentialState = serde_json::from_value("RETIRED".into()).unwrap();
        assert_eq!(s, Retired);
        let p: PaymentProvider = serde_json::from_value("epdq".into()).unwrap();
        assert_eq!(p, PaymentProvider::Epdq);
    }

    #[test]
    fn test_has_credentials() {
        let mut cred: GatewayAccountCredential = serde_json::from_value(serde_json::json!({
            "gateway_account_credential_id": 1,
            "external_id": "cred-1",
            "payment_provider": "worldpay",
            "state": "CREATED",
            "credentials": {}
        }))
        .unwrap();
        assert!(!cred.has_credentials());
        cred.credentials
            .insert("username".into(), serde_json::json!("a-user"));
        cred.credentials
            .insert("merchant_id".into(), serde_json::json!("MERCHANT"));
        assert!(cred.has_credentials());
        assert_eq!(cred.merchant_id(), Some("MERCHANT"));
    }
}
