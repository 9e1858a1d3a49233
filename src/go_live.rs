//! Request-to-go-live stage gate.
//!
//! Each page of the go-live flow is only reachable from a fixed set of
//! stages. Landing on a page from any other stage sends the user back to the
//! flow index, which works out where they should be.

use serde::Serialize;

use crate::models::go_live_stage::GoLiveStage;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoLiveFlow {
    OrganisationName,
    OrganisationAddress,
    ChooseHowToProcessPayments,
    Agreement,
}

impl GoLiveFlow {
    pub fn allows(&self, stage: GoLiveStage) -> bool {
        use GoLiveStage::*;
        match self {
            GoLiveFlow::OrganisationName => {
                matches!(stage, NotStarted | EnteredOrganisationName)
            }
            GoLiveFlow::OrganisationAddress => {
                matches!(stage, EnteredOrganisationName | EnteredOrganisationAddress)
            }
            GoLiveFlow::ChooseHowToProcessPayments => matches!(stage, EnteredOrganisationAddress),
            GoLiveFlow::Agreement => stage.chosen_psp().is_some(),
        }
    }

    pub fn path_segment(&self) -> &'static str {
        match self {
            GoLiveFlow::OrganisationName => "organisation-name",
            GoLiveFlow::OrganisationAddress => "organisation-address",
            GoLiveFlow::ChooseHowToProcessPayments => "choose-how-to-process-payments",
            GoLiveFlow::Agreement => "agreement",
        }
    }

    pub fn url(&self, service_external_id: &str) -> String {
        format!("{}/{}", index_url(service_external_id), self.path_segment())
    }
}

pub fn index_url(service_external_id: &str) -> String {
    format!("/service/{}/request-to-go-live", service_external_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Allowed,
    RedirectToIndex(String),
}

pub fn check_stage(flow: GoLiveFlow, stage: GoLiveStage, service_external_id: &str) -> GateOutcome {
    if flow.allows(stage) {
        GateOutcome::Allowed
    } else {
        tracing::info!(
            service_external_id,
            stage = %stage,
            flow = ?flow,
            "go-live page not available at this stage, redirecting to index"
        );
        GateOutcome::RedirectToIndex(index_url(service_external_id))
    }
}

/// The page a service at `stage` should continue from, if any.
pub fn next_flow(stage: GoLiveStage) -> Option<GoLiveFlow> {
    [
        GoLiveFlow::OrganisationName,
        GoLiveFlow::OrganisationAddress,
        GoLiveFlow::ChooseHowToProcessPayments,
        GoLiveFlow::Agreement,
    ]
    .into_iter()
    .find(|f| f.allows(stage))
    // The name page also accepts ENTERED_ORGANISATION_NAME; prefer moving on.
    .map(|f| match (f, stage) {
        (GoLiveFlow::OrganisationName, GoLiveStage::EnteredOrganisationName) => {
            GoLiveFlow::OrganisationAddress
        }
        (GoLiveFlow::OrganisationAddress, GoLiveStage::EnteredOrganisationAddress) => {
            GoLiveFlow::ChooseHowToProcessPayments
        }
        (f, _) => f,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_page_allowed_before_address() {
        assert_eq!(
            check_stage(GoLiveFlow::OrganisationName, GoLiveStage::NotStarted, "svc"),
            GateOutcome::Allowed
        );
        assert_eq!(
            check_stage(GoLiveFlow::OrganisationName, GoLiveStage::ChosenPspStripe, "svc"),
            GateOutcome::RedirectToIndex("/service/svc/request-to-go-live".into())
        );
    }

    #[test]
    fn test_agreement_needs_chosen_psp() {
        assert!(GoLiveFlow::Agreement.allows(GoLiveStage::ChosenPspWorldpay));
        assert!(GoLiveFlow::Agreement.allows(GoLiveStage::ChosenPspGovBankingWorldpay));
        assert!(!GoLiveFlow::Agreement.allows(GoLiveStage::TermsAgreedWorldpay));
        assert!(!GoLiveFlow::Agreement.allows(GoLiveStage::EnteredOrganisationAddress));
    }

    #[test]
    fn test_next_flow() {
        assert_eq!(next_flow(GoLiveStage::NotStarted), Some(GoLiveFlow::OrganisationName));
        assert_eq!(
            next_flow(GoLiveStage::EnteredOrganisationName),
            Some(GoLiveFlow::OrganisationAddress)
        );
        assert_eq!(
            next_flow(GoLiveStage::EnteredOrganisationAddress),
            Some(GoLiveFlow::ChooseHowToProcessPayments)
        );
        assert_eq!(next_flow(GoLiveStage::ChosenPspSmartpay), Some(GoLiveFlow::Agreement));
        assert_eq!(next_flow(GoLiveStage::TermsAgreedStripe), None);
        assert_eq!(next_flow(GoLiveStage::Live), None);
    }

    #[test]
    fn test_flow_url() {
        assert_eq!(
            GoLiveFlow::ChooseHowToProcessPayments.url("abc"),
            "/service/abc/request-to-go-live/choose-how-to-process-payments"
        );
    }
}
