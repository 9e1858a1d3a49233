use serde::Serialize;
use serde_json::json;

use super::base::RestClient;
use crate::errors::RestClientError;
use crate::models::credential::{CredentialState, GatewayAccountCredential};
use crate::models::gateway_account::{AccountType, GatewayAccount};
use crate::models::stripe_setup::{StripeAccountSetup, StripeSetupStep};

/// Client for connector: gateway accounts, their credentials and Stripe setup flags.
#[derive(Clone)]
pub struct ConnectorClient {
    rest: RestClient,
}

/// One JSON-patch style operation as connector expects it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PatchOp {
    pub op: &'static str,
    pub path: String,
    pub value: serde_json::Value,
}

impl PatchOp {
    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            op: "replace",
            path: path.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FlexCredentials<'a> {
    pub organisational_unit_id: &'a str,
    pub issuer: &'a str,
    pub jwt_mac_key: &'a str,
}

impl ConnectorClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            rest: RestClient::new("connector", base_url)?,
        })
    }

    pub async fn get_account_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<GatewayAccount, RestClientError> {
        self.rest
            .get_json(&format!(
                "/v1/frontend/accounts/external-id/{}",
                urlencoding::encode(external_id)
            ))
            .await
    }

    pub async fn get_account_by_service_and_type(
        &self,
        service_external_id: &str,
        account_type: AccountType,
    ) -> Result<GatewayAccount, RestClientError> {
        self.rest
            .get_json(&format!(
                "/v1/api/service/{}/account/{}",
                urlencoding::encode(service_external_id),
                account_type.as_str()
            ))
            .await
    }

    /// Replace the credential payload and move the credential to `state`.
    pub async fn update_credentials(
        &self,
        gateway_account_id: i64,
        credential_id: i64,
        credentials: serde_json::Value,
        state: CredentialState,
        user_external_id: &str,
    ) -> Result<GatewayAccountCredential, RestClientError> {
        let ops = vec![
            PatchOp::replace("credentials", credentials),
            PatchOp::replace("state", json!(state)),
            PatchOp::replace("last_updated_by_user_external_id", json!(user_external_id)),
        ];
        self.rest
            .patch_json(&credential_path(gateway_account_id, credential_id), &ops)
            .await
    }

    pub async fn update_credential_state(
        &self,
        gateway_account_id: i64,
        credential_id: i64,
        state: CredentialState,
        user_external_id: &str,
    ) -> Result<GatewayAccountCredential, RestClientError> {
        let ops = vec![
            PatchOp::replace("state", json!(state)),
            PatchOp::replace("last_updated_by_user_external_id", json!(user_external_id)),
        ];
        self.rest
            .patch_json(&credential_path(gateway_account_id, credential_id), &ops)
            .await
    }

    /// Activate the switching credential; connector retires the old one.
    pub async fn switch_psp(
        &self,
        gateway_account_id: i64,
        credential_external_id: &str,
        user_external_id: &str,
    ) -> Result<(), RestClientError> {
        self.rest
            .post_no_content(
                &format!("/v1/api/accounts/{}/switch-psp", gateway_account_id),
                &json!({
                    "user_external_id": user_external_id,
                    "gateway_account_credential_external_id": credential_external_id,
                }),
            )
            .await
    }

    pub async fn update_flex_credentials(
        &self,
        gateway_account_id: i64,
        flex: &FlexCredentials<'_>,
    ) -> Result<(), RestClientError> {
        self.rest
            .post_no_content(
                &format!("/v1/api/accounts/{}/3ds-flex-credentials", gateway_account_id),
                flex,
            )
            .await
    }

    pub async fn update_requires_3ds(
        &self,
        gateway_account_id: i64,
        requires3ds: bool,
    ) -> Result<(), RestClientError> {
        self.rest
            .patch_no_content(
                &format!("/v1/api/accounts/{}", gateway_account_id),
                &PatchOp::replace("requires3ds", json!(requires3ds)),
            )
            .await
    }

    pub async fn get_stripe_account_setup(
        &self,
        gateway_account_id: i64,
    ) -> Result<StripeAccountSetup, RestClientError> {
        self.rest
            .get_json(&format!("/v1/api/accounts/{}/stripe-setup", gateway_account_id))
            .await
    }

    pub async fn set_stripe_account_setup_flag(
        &self,
        gateway_account_id: i64,
        step: StripeSetupStep,
    ) -> Result<(), RestClientError> {
        self.rest
            .patch_no_content(
                &format!("/v1/api/accounts/{}/stripe-setup", gateway_account_id),
                &vec![PatchOp::replace(step.flag_name(), json!(true))],
            )
            .await
    }
}

fn credential_path(gateway_account_id: i64, credential_id: i64) -> String {
    format!(
        "/v1/api/accounts/{}/credentials/{}",
        gateway_account_id, credential_id
    )
}
