//! intervue - command-line front-end for the intervue API.
//!
//! Signs in (password or one-time passcode), shows the profile and
//! interviews, starts payments and checks the voice-assistant connection.
//! The token is persisted between runs according to the config.

mod commands;
mod output;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use intervue_core::{AuthContext, Config, QueryClient, TokenStore};

use commands::Command;
use output::ConsoleNotifier;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}\n\n{}", e, commands::USAGE);
            std::process::exit(2);
        }
    };
    if let Command::Help = command {
        println!("{}", commands::USAGE);
        return Ok(());
    }

    let mut config = Config::load()?;

    let tokens = TokenStore::new(config.token_storage()?);
    let auth = AuthContext::new(tokens);
    let client = QueryClient::from_config(&config, auth)?
        .with_notifier(std::sync::Arc::new(ConsoleNotifier));
    info!(base_url = %client.api().base_url(), backend = ?config.token_backend, "intervue starting");

    commands::run(&client, &mut config, command).await
}
