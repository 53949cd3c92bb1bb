//! Settings inspection

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commute_core::{redact_url, Settings};
use serde_json::json;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Load and validate settings, then print a redacted summary
    Check,
}

pub fn run_config(args: ConfigArgs, settings: Arc<Settings>) -> Result<()> {
    match args.command {
        ConfigCommands::Check => run_check(&settings),
    }
}

fn run_check(settings: &Settings) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&summary(settings))?);
    eprintln!("Configuration is valid");
    Ok(())
}

/// Everything worth eyeballing, with secrets reduced to presence flags
fn summary(settings: &Settings) -> serde_json::Value {
    json!({
        "project_name": settings.project_name,
        "version": settings.version,
        "environment": settings.environment,
        "debug": settings.debug,
        "api_v1_str": settings.api_v1_str,
        "bind_address": settings.bind_address(),
        "database_url": redact_url(&settings.database_url),
        "redis_url": redact_url(&settings.redis_url),
        "secret_key": "***",
        "google_maps_api_key_configured": settings.google_maps_api_key.is_some(),
        "backend_cors_origins": settings.backend_cors_origins,
        "allowed_hosts": settings.allowed_hosts,
        "log_level": settings.log_level,
        "default_page_size": settings.default_page_size,
        "max_page_size": settings.max_page_size,
        "rate_limit_per_minute": settings.rate_limit_per_minute,
    })
}
