use clap::{Parser, Subcommand};

/// Pay self-service: PSP credentials, switching and go-live
#[derive(Parser)]
#[command(name = "selfservice", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to bind (defaults to SELFSERVICE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Inspect a gateway account's PSP credentials
    Credentials {
        #[command(subcommand)]
        command: CredentialsCommands,
    },

    /// Inspect a service's request-to-go-live progress
    GoLive {
        #[command(subcommand)]
        command: GoLiveCommands,
    },
}

#[derive(Subcommand)]
pub enum CredentialsCommands {
    /// Show current, switching and linkable credentials
    Show {
        /// Gateway account external id
        #[arg(long)]
        account: String,
    },
}

#[derive(Subcommand)]
pub enum GoLiveCommands {
    /// Show the current go-live stage and the next page
    Stage {
        /// Service external id
        #[arg(long)]
        service: String,
    },
}
