//! Permission catalog

use crate::error::{RbacError, Result};
use crate::store::RbacStore;
use crate::types::{NewPermission, Permission, Role};
use std::sync::Arc;
use tracing::debug;

/// Catalog of permissions keyed by slug
#[derive(Clone)]
pub struct PermissionRegistry {
    store: Arc<dyn RbacStore>,
}

impl PermissionRegistry {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Permission>> {
        self.store.find_permission(slug).await
    }

    /// Create a permission, failing with `DuplicateSlug` if the slug exists
    pub async fn create(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Permission> {
        let permission = self
            .store
            .insert_permission(NewPermission::new(slug, name).with_description_opt(description))
            .await?;
        debug!(slug = %permission.slug, id = permission.id, "Permission created");
        Ok(permission)
    }

    /// Return the permission with this slug, creating it if absent
    pub async fn create_or_get(
        &self,
        slug: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Permission> {
        let upserted = self
            .store
            .upsert_permission(NewPermission::new(slug, name).with_description_opt(description))
            .await?;
        if upserted.created {
            debug!(slug, "Permission created on demand");
        }
        Ok(upserted.into_inner())
    }

    pub async fn list(&self) -> Result<Vec<Permission>> {
        self.store.list_permissions().await
    }

    pub async fn count(&self) -> Result<u64> {
        self.store.count_permissions().await
    }

    /// Roles currently holding the permission
    pub async fn roles_with(&self, slug: &str) -> Result<Vec<Role>> {
        let permission = self
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| RbacError::NotFound(format!("permission '{}'", slug)))?;
        self.store.permission_roles(permission.id).await
    }

    /// Delete one permission and its role grants
    pub async fn delete(&self, slug: &str) -> Result<bool> {
        let deleted = self.store.delete_permission(slug).await?;
        if deleted {
            debug!(slug, "Permission deleted");
        }
        Ok(deleted)
    }

    /// Delete every permission; returns the number of rows removed
    pub async fn delete_all(&self) -> Result<u64> {
        self.store.delete_all_permissions().await
    }
}
