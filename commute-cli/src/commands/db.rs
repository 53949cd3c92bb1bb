//! Database maintenance commands
//!
//! Everything here runs on the admin pool, apart from `health`, which probes
//! the request pool the way the API does.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use commute_core::Settings;
use commute_server::{Database, Schema};

#[derive(Parser, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommands,
}

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Create all declared tables (idempotent)
    CreateTables,
    /// Drop all declared tables
    DropTables(DropTablesArgs),
    /// Probe the database and print a health report
    Health,
    /// Print connection pool configuration and occupancy
    Info,
}

#[derive(Parser, Debug)]
pub struct DropTablesArgs {
    /// Required outside the development environment
    #[arg(long)]
    pub yes: bool,
}

pub async fn run_db(args: DbArgs, settings: Arc<Settings>) -> Result<()> {
    let db = Database::connect_lazy(&settings).context("Failed to configure database pools")?;

    let result = match args.command {
        DbCommands::CreateTables => create_tables(&db).await,
        DbCommands::DropTables(args) => drop_tables(&db, &settings, args).await,
        DbCommands::Health => health(&db).await,
        DbCommands::Info => info(&db),
    };

    db.close().await;
    result
}

async fn create_tables(db: &Database) -> Result<()> {
    let schema = Schema::declared();
    db.create_all(&schema)
        .await
        .context("Failed to create tables")?;
    eprintln!("Created {} table(s)", schema.tables().len());
    Ok(())
}

async fn drop_tables(db: &Database, settings: &Settings, args: DropTablesArgs) -> Result<()> {
    if !settings.is_development() && !args.yes {
        bail!(
            "Refusing to drop tables in the {} environment without --yes",
            settings.environment
        );
    }

    let schema = Schema::declared();
    db.drop_all(&schema).await.context("Failed to drop tables")?;
    eprintln!("Dropped {} table(s)", schema.tables().len());
    Ok(())
}

async fn health(db: &Database) -> Result<()> {
    let report = db.health_check().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_healthy() {
        bail!("Database is unhealthy");
    }
    Ok(())
}

fn info(db: &Database) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&db.connection_info())?);
    Ok(())
}
