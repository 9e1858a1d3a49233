use serde::{Deserialize, Serialize};

use super::service::ServiceRole;

/// A user as returned by adminusers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub external_id: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub session_version: u32,
    #[serde(default)]
    pub service_roles: Vec<ServiceRole>,
}

impl User {
    pub fn service_role_for(&self, service_external_id: &str) -> Option<&ServiceRole> {
        self.service_roles
            .iter()
            .find(|sr| sr.service.external_id == service_external_id)
    }

    pub fn service_role_for_gateway_account(&self, gateway_account_id: i64) -> Option<&ServiceRole> {
        self.service_roles
            .iter()
            .find(|sr| sr.service.owns_gateway_account(gateway_account_id))
    }

    pub fn has_permission(&self, service_external_id: &str, permission: &str) -> bool {
        self.service_role_for(service_external_id)
            .is_some_and(|sr| sr.role.has_permission(permission))
    }
}
