//! BaasBeer - crowdfunded brewery shares and voting
//!
//! Command-line front end over the BaasBeer core library.

use std::io;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod state;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    // Initialize logging; --log-level wins over RUST_LOG
    let filter = match cli.log_level.as_deref() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    let app_state = match state::AppState::new(cli.config.as_deref(), cli.db, cli.acting_as) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to initialize application: {}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = commands::run(&app_state, cli.command, &mut stdout) {
        tracing::error!(error = %e, "Command failed");
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
