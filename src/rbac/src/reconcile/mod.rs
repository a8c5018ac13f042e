//! Reconciliation of stored roles and permissions against configuration
//!
//! Two policies are offered:
//!
//! - **seed**: additive, creates what is missing and never deletes
//! - **sync**: destructive, deletes the whole table then recreates it
//!
//! Runs are not transactional. A storage failure aborts the run and leaves
//! whatever was already applied in place.

pub mod report;

pub use report::{PermissionSeedReport, PermissionSyncReport, RoleSeedReport, RoleSyncReport, Tally};

use crate::config::{RbacConfig, RoleDefinition, RolePermissionRef};
use crate::derive::{self, DerivedPermission};
use crate::error::{RbacError, Result};
use crate::store::RbacStore;
use crate::types::{PermissionId, Role};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Derived triples of the flat permission catalog, in declaration order
pub fn catalog_permissions(config: &RbacConfig) -> Vec<DerivedPermission> {
    config.permissions.iter().map(|p| p.derive()).collect()
}

/// Permissions implicitly declared by role definitions
///
/// Entries are de-duplicated by derived *name*; the first occurrence across
/// roles wins. Two references that differ in name but share a slug both
/// survive.
pub fn implicit_permissions(roles: &[RoleDefinition]) -> Vec<DerivedPermission> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for reference in roles.iter().flat_map(|r| r.permissions.iter()) {
        let derived = reference.derive();
        if seen.insert(derived.name.clone()) {
            out.push(derived);
        }
    }

    out
}

/// Applies seed and sync policies to a store
#[derive(Clone)]
pub struct Reconciler {
    store: Arc<dyn RbacStore>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    /// Create catalog permissions whose slug is not stored yet
    pub async fn seed_permissions(&self, config: &RbacConfig) -> Result<PermissionSeedReport> {
        let catalog = require_permissions(config)?;
        let mut report = PermissionSeedReport::default();

        for permission in catalog {
            if self.store.find_permission(&permission.slug).await?.is_some() {
                report.found += 1;
                continue;
            }

            self.store
                .insert_permission(permission.to_new_permission())
                .await?;
            debug!(slug = %permission.slug, "Seeded permission");
            report.added += 1;
        }

        info!(
            backend = self.store.backend_name(),
            added = report.added,
            found = report.found,
            "Permissions seeded"
        );
        Ok(report)
    }

    /// Delete every permission, then recreate the catalog
    pub async fn sync_permissions(&self, config: &RbacConfig) -> Result<PermissionSyncReport> {
        let catalog = require_permissions(config)?;
        let mut report = PermissionSyncReport {
            deleted: self.store.delete_all_permissions().await?,
            ..Default::default()
        };

        for permission in catalog {
            self.store
                .insert_permission(permission.to_new_permission())
                .await?;
            report.created += 1;
        }

        info!(
            backend = self.store.backend_name(),
            deleted = report.deleted,
            created = report.created,
            "Permissions synchronized"
        );
        Ok(report)
    }

    /// Create missing roles and permissions and attach missing grants
    pub async fn seed_roles(&self, config: &RbacConfig) -> Result<RoleSeedReport> {
        require_roles(config)?;
        let mut report = RoleSeedReport::default();

        // Snapshot taken once; see `implicit_permissions` for the dedup key.
        let existing: HashSet<String> = self
            .store
            .list_permissions()
            .await?
            .into_iter()
            .map(|p| p.slug)
            .collect();
        report.permissions.existing = existing.len() as u64;

        for permission in implicit_permissions(&config.roles) {
            if existing.contains(&permission.slug) {
                continue;
            }
            self.store
                .insert_permission(permission.to_new_permission())
                .await?;
            report.permissions.added += 1;
        }

        for definition in &config.roles {
            let upserted = self
                .store
                .upsert_role(derive::new_role(
                    &definition.slug,
                    definition.name.as_deref(),
                    definition.description.as_deref(),
                ))
                .await?;

            if upserted.created {
                report.roles.added += 1;
            } else {
                report.roles.existing += 1;
            }

            let role = upserted.into_inner();
            for id in self.resolve(&definition.permissions, &role).await? {
                self.store.attach_permission(role.id, id).await?;
            }
        }

        info!(
            backend = self.store.backend_name(),
            roles_added = report.roles.added,
            roles_existing = report.roles.existing,
            permissions_added = report.permissions.added,
            "Roles seeded"
        );
        Ok(report)
    }

    /// Delete every role, then recreate roles and their grants
    pub async fn sync_roles(&self, config: &RbacConfig) -> Result<RoleSyncReport> {
        require_roles(config)?;
        let mut report = RoleSyncReport {
            roles_deleted: self.store.delete_all_roles().await?,
            ..Default::default()
        };
        debug!(deleted = report.roles_deleted, "Deleted existing roles");

        report.permissions.existing = self.store.count_permissions().await?;
        for permission in implicit_permissions(&config.roles) {
            let upserted = self
                .store
                .upsert_permission(permission.to_new_permission())
                .await?;
            if upserted.created {
                report.permissions.added += 1;
            }
        }

        for definition in &config.roles {
            let role = self
                .store
                .insert_role(derive::new_role(
                    &definition.slug,
                    definition.name.as_deref(),
                    definition.description.as_deref(),
                ))
                .await?;
            report.roles_added += 1;

            for id in self.resolve(&definition.permissions, &role).await? {
                self.store.attach_permission(role.id, id).await?;
            }
        }

        info!(
            backend = self.store.backend_name(),
            roles_deleted = report.roles_deleted,
            roles_added = report.roles_added,
            permissions_added = report.permissions.added,
            "Roles synchronized"
        );
        Ok(report)
    }

    /// Look up referenced permissions by slug; unknown slugs are skipped
    async fn resolve(&self, references: &[RolePermissionRef], role: &Role) -> Result<Vec<PermissionId>> {
        let mut ids = Vec::with_capacity(references.len());
        for reference in references {
            let slug = reference.derive().slug;
            match self.store.find_permission(&slug).await? {
                Some(permission) => ids.push(permission.id),
                None => debug!(role = %role.slug, permission = %slug, "Skipping unknown permission"),
            }
        }
        Ok(ids)
    }
}

fn require_permissions(config: &RbacConfig) -> Result<Vec<DerivedPermission>> {
    if config.permissions.is_empty() {
        return Err(RbacError::ConfigurationMissing(
            "no permissions found in configuration".to_string(),
        ));
    }
    Ok(catalog_permissions(config))
}

fn require_roles(config: &RbacConfig) -> Result<()> {
    if config.roles.is_empty() {
        return Err(RbacError::ConfigurationMissing(
            "no roles found in configuration".to_string(),
        ));
    }
    Ok(())
}
