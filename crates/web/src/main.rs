//! plataforma - entry point
//!
//! Loads settings, sets up logging and dispatches to the chosen command.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::Settings;
use web_lib::{
    cli::{Cli, Commands},
    commands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(cli.verbose || settings.debug);
    tracing::debug!(settings = ?settings, "Settings loaded");
    if settings.uses_insecure_secret_key() {
        tracing::warn!("SECRET_KEY not set, using insecure default for development");
    }

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::execute(args, settings).await,
        Commands::Migrate(args) => commands::migrate::execute(args, settings).await,
        Commands::Check(args) => commands::check::execute(args, settings).await,
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {:?}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing subscriber
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
