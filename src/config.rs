use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub connector_url: String,
    pub adminusers_url: String,
    pub stripe_api_url: String,
    /// Stripe serves file uploads from a separate host.
    pub stripe_files_url: String,
    /// Stripe secret key. Without it the Stripe KYC steps cannot be submitted.
    pub stripe_secret_key: Option<String>,
    pub features: FeatureFlags,
}

/// Process-wide feature toggles, read once from the environment.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct FeatureFlags {
    /// ENABLE_STRIPE_ONBOARDING_TASK_LIST: return to the Stripe task list
    /// after each KYC step instead of the dashboard.
    pub stripe_onboarding_task_list: bool,
    /// DEGATEWAY_FLAG: serve account settings under service-scoped URLs.
    pub degateway: bool,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let stripe_secret_key = std::env::var("STRIPE_SECRET_KEY")
        .ok()
        .filter(|k| !k.is_empty());
    if stripe_secret_key.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY is not set; Stripe setup steps will fail");
    }

    Ok(Config {
        port: std::env::var("SELFSERVICE_PORT")
            .unwrap_or_else(|_| "9200".into())
            .parse()
            .unwrap_or(9200),
        connector_url: base_url("CONNECTOR_URL", "http://localhost:9300")?,
        adminusers_url: base_url("ADMINUSERS_URL", "http://localhost:9700")?,
        stripe_api_url: base_url("STRIPE_API_URL", "https://api.stripe.com")?,
        stripe_files_url: base_url("STRIPE_FILES_URL", "https://files.stripe.com")?,
        stripe_secret_key,
        features: FeatureFlags {
            stripe_onboarding_task_list: flag("ENABLE_STRIPE_ONBOARDING_TASK_LIST"),
            degateway: flag("DEGATEWAY_FLAG"),
        },
    })
}

/// Upstream base URL from `name`; rejected at startup if it does not parse.
fn base_url(name: &str, default: &str) -> anyhow::Result<String> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    parse_base_url(&raw).with_context(|| format!("{} is not a valid URL: {}", name, raw))
}

fn parse_base_url(raw: &str) -> anyhow::Result<String> {
    let url = url::Url::parse(raw.trim())?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("unsupported scheme {}", url.scheme());
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| parse_flag(&v))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}
