use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use selfservice::credentials::{self, LinkStyle};
use selfservice::middleware::headers;
use selfservice::{api, config, go_live, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // LOG_FORMAT=json for log shipping; plain text otherwise.
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v == "json");
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "selfservice=debug,tower_http=debug".into()),
        ))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Credentials { command }) => {
            let state = AppState::new(cfg)?;
            handle_credentials_command(&state, command).await
        }
        Some(cli::Commands::GoLive { command }) => {
            let state = AppState::new(cfg)?;
            handle_go_live_command(&state, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!(
        connector = %cfg.connector_url,
        adminusers = %cfg.adminusers_url,
        degateway = cfg.features.degateway,
        stripe_onboarding_task_list = cfg.features.stripe_onboarding_task_list,
        "starting selfservice"
    );
    let state = Arc::new(AppState::new(cfg)?);

    let app = api::router(state)
        .layer(axum::middleware::from_fn(headers::request_id))
        .layer(axum::middleware::from_fn(headers::security_headers));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("selfservice listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_credentials_command(
    state: &AppState,
    cmd: cli::CredentialsCommands,
) -> anyhow::Result<()> {
    match cmd {
        cli::CredentialsCommands::Show { account } => {
            let account = state
                .connector
                .get_account_by_external_id(&account)
                .await
                .context("Failed to load gateway account")?;

            println!(
                "Gateway account {} ({}, {})",
                account.external_id,
                account.gateway_account_id,
                account.account_type.as_str()
            );
            println!("{:<34} {:<10} {:<28}", "CREDENTIAL", "PROVIDER", "STATE");
            for c in &account.gateway_account_credentials {
                println!(
                    "{:<34} {:<10} {:<28}",
                    c.external_id, c.payment_provider, c.state
                );
            }

            match credentials::get_current_credential(&account) {
                Ok(Some(c)) => println!("Current:   {}", c.external_id),
                Ok(None) => println!("Current:   none"),
                Err(e) => println!("Current:   {}: {}", e.kind(), e),
            }
            match credentials::get_switching_credential_if_exists(&account) {
                Ok(Some(c)) => println!("Switching: {} ({})", c.external_id, c.payment_provider),
                Ok(None) => println!("Switching: none"),
                Err(e) => println!("Switching: {}: {}", e.kind(), e),
            }
            println!(
                "Switched provider before: {}",
                credentials::has_switched_provider(&account)
            );
            for link in credentials::get_psp_page_links(&account, LinkStyle::Legacy) {
                println!("  {} -> {}", link.label, link.href);
            }
        }
    }
    Ok(())
}

async fn handle_go_live_command(state: &AppState, cmd: cli::GoLiveCommands) -> anyhow::Result<()> {
    match cmd {
        cli::GoLiveCommands::Stage { service } => {
            let service = state
                .adminusers
                .get_service(&service)
                .await
                .context("Failed to load service")?;
            let stage = service.current_go_live_stage;
            println!("Service:  {} ({})", service.name, service.external_id);
            println!("Stage:    {}", stage);
            match go_live::next_flow(stage) {
                Some(flow) => println!("Next:     {}", flow.url(&service.external_id)),
                None => println!("Next:     nothing left to do"),
            }
        }
    }
    Ok(())
}
