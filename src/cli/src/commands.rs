//! Reconciliation subcommands

use anyhow::{Context, Result};
use clap::Subcommand;
use rolegate_rbac::{RbacConfig, Reconciler};
use std::path::Path;
use tracing::info;

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Create configured permissions that do not exist yet
    #[command(name = "permissions:seed")]
    PermissionsSeed,

    /// Delete all permissions and recreate them from configuration
    #[command(name = "permissions:sync")]
    PermissionsSync,

    /// Create configured roles and their permissions without deleting anything
    #[command(name = "roles:seed")]
    RolesSeed,

    /// Delete all roles and recreate them from configuration
    #[command(name = "roles:sync")]
    RolesSync,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::PermissionsSeed => "permissions:seed",
            Command::PermissionsSync => "permissions:sync",
            Command::RolesSeed => "roles:seed",
            Command::RolesSync => "roles:sync",
        }
    }
}

/// Load and validate the configuration file
pub fn load_config(path: &Path) -> Result<RbacConfig> {
    let config = RbacConfig::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    info!(
        path = %path.display(),
        permissions = config.permissions.len(),
        roles = config.roles.len(),
        "Loaded configuration"
    );
    Ok(config)
}

/// Run one command and render its report
pub async fn execute(command: Command, reconciler: &Reconciler, config: &RbacConfig) -> Result<String> {
    let report = match command {
        Command::PermissionsSeed => reconciler.seed_permissions(config).await?.to_string(),
        Command::PermissionsSync => reconciler.sync_permissions(config).await?.to_string(),
        Command::RolesSeed => reconciler.seed_roles(config).await?.to_string(),
        Command::RolesSync => reconciler.sync_roles(config).await?.to_string(),
    };
    Ok(report)
}
