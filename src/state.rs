use crate::clients::adminusers::AdminusersClient;
use crate::clients::connector::ConnectorClient;
use crate::clients::stripe::StripeClient;
use crate::config::Config;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub config: Config,
    pub connector: ConnectorClient,
    pub adminusers: AdminusersClient,
    pub stripe: StripeClient,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            connector: ConnectorClient::new(&config.connector_url)?,
            adminusers: AdminusersClient::new(&config.adminusers_url)?,
            stripe: StripeClient::new(&config.stripe_api_url, config.stripe_secret_key.clone())?
                .with_files_url(&config.stripe_files_url)?,
            config,
        })
    }
}
