use serde_json::json;

use super::base::RestClient;
use super::connector::PatchOp;
use crate::errors::RestClientError;
use crate::models::go_live_stage::GoLiveStage;
use crate::models::service::Service;
use crate::models::user::User;

/// Organisation address as captured by the go-live flow.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct OrganisationAddress {
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub address_city: String,
    pub address_postcode: String,
    pub address_country: String,
}

/// Client for adminusers: users, services and their go-live stage.
#[derive(Clone)]
pub struct AdminusersClient {
    rest: RestClient,
}

impl AdminusersClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Ok(Self {
            rest: RestClient::new("adminusers", base_url)?,
        })
    }

    pub async fn get_user_by_external_id(&self, external_id: &str) -> Result<User, RestClientError> {
        self.rest
            .get_json(&format!("/v1/api/users/{}", urlencoding::encode(external_id)))
            .await
    }

    pub async fn get_service(&self, external_id: &str) -> Result<Service, RestClientError> {
        self.rest.get_json(&service_path(external_id)).await
    }

    pub async fn update_current_go_live_stage(
        &self,
        service_external_id: &str,
        stage: GoLiveStage,
    ) -> Result<Service, RestClientError> {
        self.rest
            .patch_json(
                &service_path(service_external_id),
                &vec![PatchOp::replace("current_go_live_stage", json!(stage))],
            )
            .await
    }

    pub async fn update_organisation_name(
        &self,
        service_external_id: &str,
        name: &str,
    ) -> Result<Service, RestClientError> {
        self.rest
            .patch_json(
                &service_path(service_external_id),
                &vec![PatchOp::replace("merchant_details/name", json!(name))],
            )
            .await
    }

    pub async fn update_organisation_address(
        &self,
        service_external_id: &str,
        address: &OrganisationAddress,
    ) -> Result<Service, RestClientError> {
        let ops = vec![
            PatchOp::replace("merchant_details/address_line1", json!(address.address_line1)),
            PatchOp::replace("merchant_details/address_line2", json!(address.address_line2)),
            PatchOp::replace("merchant_details/address_city", json!(address.address_city)),
            PatchOp::replace(
                "merchant_details/address_postcode",
                json!(address.address_postcode),
            ),
            PatchOp::replace(
                "merchant_details/address_country",
                json!(address.address_country),
            ),
        ];
        self.rest
            .patch_json(&service_path(service_external_id), &ops)
            .await
    }
}

fn service_path(external_id: &str) -> String {
    format!("/v1/api/services/{}", urlencoding::encode(external_id))
}
