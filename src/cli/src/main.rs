//! Rolegate CLI
//!
//! Reconciles the RBAC tables of a PostgreSQL database against a
//! configuration file:
//! - `permissions:seed` / `permissions:sync`
//! - `roles:seed` / `roles:sync`

use anyhow::{Context, Result};
use clap::Parser;
use rolegate_rbac::{PostgresStore, Rbac};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

mod commands;

use commands::Command;

/// Rolegate RBAC reconciliation
#[derive(Parser)]
#[command(name = "rolegate")]
#[command(about = "Seed or sync roles and permissions from configuration")]
#[command(version)]
struct Cli {
    /// Path to configuration file (.toml or .json)
    #[arg(short, long, default_value = "rolegate.toml", env = "ROLEGATE_CONFIG")]
    config: PathBuf,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: Option<String>,

    /// Create the tables before running the command
    #[arg(long)]
    migrate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command;
    if let Err(e) = run(cli).await {
        error!(command = command.name(), error = %e, "Command failed");
        return Err(e);
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    info!("Rolegate v{}", env!("CARGO_PKG_VERSION"));

    let config = commands::load_config(&cli.config)?;
    let database_url = cli
        .database_url
        .context("No database configured: pass --database-url or set DATABASE_URL")?;

    let store = PostgresStore::connect(&database_url, config.tables.clone())
        .await
        .context("Failed to connect to PostgreSQL")?;

    if cli.migrate {
        store.run_migrations().await.context("Failed to create tables")?;
    }

    let rbac = Rbac::from_arc(Arc::new(store));
    let report = commands::execute(cli.command, &rbac.reconciler(), &config)
        .await
        .with_context(|| format!("{} failed", cli.command.name()))?;

    println!("{}", report);
    Ok(())
}
