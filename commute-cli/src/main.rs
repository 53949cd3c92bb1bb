//! commute CLI - run and administer the commute tracker API
//!
//! Subcommands:
//! - `serve`: run the HTTP API
//! - `db`: create/drop tables, probe health, show pool state
//! - `config check`: validate settings and print a redacted summary

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commute_core::{get_settings, Profile, Settings};

mod commands;
mod tracing_setup;

use commands::config::ConfigArgs;
use commands::db::DbArgs;
use commands::serve::ServeArgs;
use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "commute",
    author,
    version,
    about = "Commute tracker API server and maintenance tool"
)]
struct Cli {
    /// Read settings from this env file instead of the profile default
    #[arg(long, global = true, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Settings profile: development or production; other names use the base
    /// profile. `ENVIRONMENT` itself still comes from the environment.
    #[arg(long, global = true, value_name = "NAME")]
    environment: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Database maintenance
    Db(DbArgs),
    /// Inspect configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(&cli).context("Invalid configuration")?;
    // The log level is itself a setting, so nothing can be logged before here
    init_tracing(&TracingConfig::from_settings(&settings)).ok();
    tracing::debug!(
        environment = %settings.environment,
        debug = settings.debug,
        profile = ?profile(&cli),
        env_file = %env_file(&cli).display(),
        "Settings loaded"
    );

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, settings).await?,
        Commands::Db(args) => commands::run_db(args, settings).await?,
        Commands::Config(args) => commands::run_config(args, settings)?,
    }
    Ok(())
}

/// Explicit flags build fresh settings; otherwise use the process-wide instance
fn load_settings(cli: &Cli) -> Result<Arc<Settings>> {
    let profile = profile(cli);
    let settings = match (&cli.env_file, &cli.environment) {
        (Some(path), _) => Arc::new(Settings::from_env_file(profile, path)?),
        (None, Some(name)) => Arc::new(Settings::for_environment(name)?),
        (None, None) => get_settings()?,
    };
    Ok(settings)
}

fn profile(cli: &Cli) -> Profile {
    cli.environment
        .as_deref()
        .map(Profile::for_environment)
        .unwrap_or_default()
}

/// Env file the settings were read from (it may not exist)
fn env_file(cli: &Cli) -> PathBuf {
    cli.env_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(profile(cli).env_file()))
}
