use serde::{Deserialize, Serialize};

use super::go_live_stage::GoLiveStage;

/// A service registered with adminusers. Owns one or more gateway accounts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub external_id: String,
    pub name: String,
    /// Connector gateway account ids, as strings (adminusers stores them that way).
    #[serde(default)]
    pub gateway_account_ids: Vec<String>,
    #[serde(default)]
    pub current_go_live_stage: GoLiveStage,
}

impl Service {
    pub fn owns_gateway_account(&self, gateway_account_id: i64) -> bool {
        let id = gateway_account_id.to_string();
        self.gateway_account_ids.iter().any(|g| *g == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Role {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p.name == permission)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceRole {
    pub service: Service,
    pub role: Role,
}
