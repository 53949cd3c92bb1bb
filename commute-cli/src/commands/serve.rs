//! HTTP server command
//!
//! Runs the API with the full middleware stack and disposes the database
//! pools once the server has stopped.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use commute_core::Settings;
use commute_server::{run_server, AppState, Database, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: HOST:PORT from settings)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run_serve(args: ServeArgs, settings: Arc<Settings>) -> Result<()> {
    let config = match args.bind {
        Some(bind_addr) => ServerConfig { bind_addr },
        None => ServerConfig::from_settings(&settings).await?,
    };

    tracing::info!("Starting commute server on {}", config.bind_addr);

    let db = Database::connect_lazy(&settings).context("Failed to configure database pools")?;
    let state = AppState::new(settings, db.clone());

    // Dispose pools whether or not the server stopped cleanly
    let result = run_server(state, config).await;
    db.close().await;

    result.context("Server error")
}
