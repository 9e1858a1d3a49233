use std::fmt;

use serde::{Deserialize, Serialize};

use super::credential::PaymentProvider;

/// Onboarding milestone of a service on its way to a live account.
///
/// Declaration order is the progression order; `DENIED` and `LIVE` are
/// the two terminal outcomes.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoLiveStage {
    #[default]
    NotStarted,
    EnteredOrganisationName,
    EnteredOrganisationAddress,
    ChosenPspStripe,
    ChosenPspWorldpay,
    ChosenPspSmartpay,
    ChosenPspEpdq,
    ChosenPspGovBankingWorldpay,
    TermsAgreedStripe,
    TermsAgreedWorldpay,
    TermsAgreedSmartpay,
    TermsAgreedEpdq,
    TermsAgreedGovBankingWorldpay,
    Denied,
    Live,
}

/// The PSP a service picks on the "choose how to process payments" page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChosenPsp {
    Stripe,
    Worldpay,
    Smartpay,
    Epdq,
    GovBankingWorldpay,
}

impl ChosenPsp {
    pub fn provider(&self) -> PaymentProvider {
        match self {
            ChosenPsp::Stripe => PaymentProvider::Stripe,
            ChosenPsp::Worldpay | ChosenPsp::GovBankingWorldpay => PaymentProvider::Worldpay,
            ChosenPsp::Smartpay => PaymentProvider::Smartpay,
            ChosenPsp::Epdq => PaymentProvider::Epdq,
        }
    }
}

impl GoLiveStage {
    pub fn chosen(psp: ChosenPsp) -> Self {
        match psp {
            ChosenPsp::Stripe => GoLiveStage::ChosenPspStripe,
            ChosenPsp::Worldpay => GoLiveStage::ChosenPspWorldpay,
            ChosenPsp::Smartpay => GoLiveStage::ChosenPspSmartpay,
            ChosenPsp::Epdq => GoLiveStage::ChosenPspEpdq,
            ChosenPsp::GovBankingWorldpay => GoLiveStage::ChosenPspGovBankingWorldpay,
        }
    }

    /// The PSP recorded by a `CHOSEN_PSP_*` stage.
    pub fn chosen_psp(&self) -> Option<ChosenPsp> {
        match self {
            GoLiveStage::ChosenPspStripe => Some(ChosenPsp::Stripe),
            GoLiveStage::ChosenPspWorldpay => Some(ChosenPsp::Worldpay),
            GoLiveStage::ChosenPspSmartpay => Some(ChosenPsp::Smartpay),
            GoLiveStage::ChosenPspEpdq => Some(ChosenPsp::Epdq),
            GoLiveStage::ChosenPspGovBankingWorldpay => Some(ChosenPsp::GovBankingWorldpay),
            _ => None,
        }
    }

    pub fn terms_agreed(psp: ChosenPsp) -> Self {
        match psp {
            ChosenPsp::Stripe => GoLiveStage::TermsAgreedStripe,
            ChosenPsp::Worldpay => GoLiveStage::TermsAgreedWorldpay,
            ChosenPsp::Smartpay => GoLiveStage::TermsAgreedSmartpay,
            ChosenPsp::Epdq => GoLiveStage::TermsAgreedEpdq,
            ChosenPsp::GovBankingWorldpay => GoLiveStage::TermsAgreedGovBankingWorldpay,
        }
    }

    pub fn is_terms_agreed(&self) -> bool {
        matches!(
            self,
            GoLiveStage::TermsAgreedStripe
                | GoLiveStage::TermsAgreedWorldpay
                | GoLiveStage::TermsAgreedSmartpay
                | GoLiveStage::TermsAgreedEpdq
                | GoLiveStage::TermsAgreedGovBankingWorldpay
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GoLiveStage::Denied | GoLiveStage::Live)
    }

    /// Whether the stage may move from `self` to `next`. Stages only move
    /// forward; a service can be denied at any point before going live.
    pub fn can_advance_to(&self, next: GoLiveStage) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == GoLiveStage::Denied {
            return true;
        }
        // Re-submitting the name or address page keeps the stage where it is.
        if next == *self
            && matches!(
                self,
                GoLiveStage::EnteredOrganisationName | GoLiveStage::EnteredOrganisationAddress
            )
        {
            return true;
        }
        next > *self
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GoLiveStage::NotStarted => "NOT_STARTED",
            GoLiveStage::EnteredOrganisationName => "ENTERED_ORGANISATION_NAME",
            GoLiveStage::EnteredOrganisationAddress => "ENTERED_ORGANISATION_ADDRESS",
            GoLiveStage::ChosenPspStripe => "CHOSEN_PSP_STRIPE",
            GoLiveStage::ChosenPspWorldpay => "CHOSEN_PSP_WORLDPAY",
            GoLiveStage::ChosenPspSmartpay => "CHOSEN_PSP_SMARTPAY",
            GoLiveStage::ChosenPspEpdq => "CHOSEN_PSP_EPDQ",
            GoLiveStage::ChosenPspGovBankingWorldpay => "CHOSEN_PSP_GOV_BANKING_WORLDPAY",
            GoLiveStage::TermsAgreedStripe => "TERMS_AGREED_STRIPE",
            GoLiveStage::TermsAgreedWorldpay => "TERMS_AGREED_WORLDPAY",
            GoLiveStage::TermsAgreedSmartpay => "TERMS_AGREED_SMARTPAY",
            GoLiveStage::TermsAgreedEpdq => "TERMS_AGREED_EPDQ",
            GoLiveStage::TermsAgreedGovBankingWorldpay => "TERMS_AGREED_GOV_BANKING_WORLDPAY",
            GoLiveStage::Denied => "DENIED",
            GoLiveStage::Live => "LIVE",
        }
    }
}

impl fmt::Display for GoLiveStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
