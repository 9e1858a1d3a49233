use serde::{Deserialize, Serialize};

use super::credential::{GatewayAccountCredential, PaymentProvider};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Test,
    Live,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Test => "test",
            AccountType::Live => "live",
        }
    }
}

/// Worldpay 3DS Flex settings held on the account (not on the credential).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Worldpay3dsFlex {
    pub organisational_unit_id: String,
    pub issuer: String,
    #[serde(default)]
    pub exemption_engine_enabled: bool,
}

/// A gateway account as returned by connector's frontend API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewayAccount {
    pub gateway_account_id: i64,
    pub external_id: String,
    pub payment_provider: PaymentProvider,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub requires3ds: bool,
    #[serde(default = "default_integration_version_3ds")]
    pub integration_version_3ds: u8,
    #[serde(default)]
    pub worldpay_3ds_flex: Option<Worldpay3dsFlex>,
    #[serde(default)]
    pub gateway_account_credentials: Vec<GatewayAccountCredential>,
}

fn default_integration_version_3ds() -> u8 {
    1
}

impl GatewayAccount {
    pub fn is_live(&self) -> bool {
        self.account_type == AccountType::Live
    }

    pub fn has_flex_credentials(&self) -> bool {
        self.worldpay_3ds_flex
            .as_ref()
            .is_some_and(|f| !f.organisational_unit_id.is_empty() && !f.issuer.is_empty())
    }
}
