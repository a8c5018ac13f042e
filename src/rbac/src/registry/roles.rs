//! Role catalog and role-permission grants

use crate::derive::humanize;
use crate::error::Result;
use crate::registry::PermissionRegistry;
use crate::store::RbacStore;
use crate::types::{NewRole, Permission, PermissionId, Role, UserId};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Catalog of roles keyed by slug
///
/// Mutations that reference a permission slug create the permission on demand,
/// named after its slug.
#[derive(Clone)]
pub struct RoleRegistry {
    store: Arc<dyn RbacStore>,
    permissions: PermissionRegistry,
}

impl RoleRegistry {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        let permissions = PermissionRegistry::new(store.clone());
        Self { store, permissions }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Role>> {
        self.store.find_role(slug).await
    }

    /// Create a role, failing with `DuplicateSlug` if the slug exists
    pub async fn create(&self, name: &str, slug: &str, description: Option<&str>) -> Result<Role> {
        let role = self
            .store
            .insert_role(NewRole::new(slug, name).with_description_opt(description))
            .await?;
        debug!(slug = %role.slug, id = role.id, "Role created");
        Ok(role)
    }

    /// Return the role with this slug, creating it if absent
    pub async fn create_or_get(
        &self,
        slug: &str,
        name: &str,
        description: Option<&str>,
    ) -> Result<Role> {
        let upserted = self
            .store
            .upsert_role(NewRole::new(slug, name).with_description_opt(description))
            .await?;
        Ok(upserted.into_inner())
    }

    pub async fn list(&self) -> Result<Vec<Role>> {
        self.store.list_roles().await
    }

    pub async fn count(&self) -> Result<u64> {
        self.store.count_roles().await
    }

    /// Delete one role together with its permission and user grants
    pub async fn delete(&self, slug: &str) -> Result<bool> {
        self.store.delete_role(slug).await
    }

    /// Delete every role; returns the number of rows removed
    pub async fn delete_all(&self) -> Result<u64> {
        self.store.delete_all_roles().await
    }

    /// Permissions attached to the role
    pub async fn permissions(&self, role: &Role) -> Result<Vec<Permission>> {
        self.store.role_permissions(role.id).await
    }

    /// Users holding the role
    pub async fn users(&self, role: &Role) -> Result<Vec<UserId>> {
        self.store.role_users(role.id).await
    }

    async fn permission_for(&self, slug: &str) -> Result<Permission> {
        self.permissions
            .create_or_get(slug, &humanize(slug), None)
            .await
    }

    /// Grant one permission; false if it was already attached
    pub async fn attach_permission(&self, role: &Role, permission_slug: &str) -> Result<bool> {
        let permission = self.permission_for(permission_slug).await?;
        let attached = self.store.attach_permission(role.id, permission.id).await?;
        if attached {
            debug!(role = %role.slug, permission = permission_slug, "Permission attached");
        }
        Ok(attached)
    }

    /// Grant several permissions; true if at least one was newly attached
    pub async fn attach_permissions<S: AsRef<str>>(
        &self,
        role: &Role,
        permission_slugs: &[S],
    ) -> Result<bool> {
        let mut changed = false;
        for slug in permission_slugs {
            changed |= self.attach_permission(role, slug.as_ref()).await?;
        }
        Ok(changed)
    }

    /// Make the role's permission set exactly `permission_slugs`
    ///
    /// An empty list is a no-op and leaves the current grants untouched.
    /// Returns true if anything was attached or detached.
    pub async fn sync_permissions<S: AsRef<str>>(
        &self,
        role: &Role,
        permission_slugs: &[S],
    ) -> Result<bool> {
        if permission_slugs.is_empty() {
            return Ok(false);
        }

        let mut target: BTreeSet<PermissionId> = BTreeSet::new();
        for slug in permission_slugs {
            target.insert(self.permission_for(slug.as_ref()).await?.id);
        }

        let current: BTreeSet<PermissionId> = self
            .store
            .role_permissions(role.id)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

        let mut attached = 0usize;
        for id in target.difference(&current) {
            if self.store.attach_permission(role.id, *id).await? {
                attached += 1;
            }
        }

        let mut detached = 0usize;
        for id in current.difference(&target) {
            if self.store.detach_permission(role.id, *id).await? {
                detached += 1;
            }
        }

        debug!(role = %role.slug, attached, detached, "Permissions synced");
        Ok(attached + detached > 0)
    }

    pub async fn has_permission(&self, role: &Role, permission_slug: &str) -> Result<bool> {
        self.store
            .role_has_any_permission(role.id, &[permission_slug.to_string()])
            .await
    }

    /// True if the role holds any of the permissions; false for an empty list
    pub async fn has_any_permission<S: AsRef<str>>(
        &self,
        role: &Role,
        permission_slugs: &[S],
    ) -> Result<bool> {
        let slugs = to_owned(permission_slugs);
        self.store.role_has_any_permission(role.id, &slugs).await
    }

    /// Revoke one permission; false if it was not attached
    pub async fn detach_permission(&self, role: &Role, permission_slug: &str) -> Result<bool> {
        match self.store.find_permission(permission_slug).await? {
            Some(permission) => self.store.detach_permission(role.id, permission.id).await,
            None => Ok(false),
        }
    }

    /// Revoke several permissions; returns how many were attached
    pub async fn detach_permissions<S: AsRef<str>>(
        &self,
        role: &Role,
        permission_slugs: &[S],
    ) -> Result<u64> {
        let slugs = to_owned(permission_slugs);
        let mut count = 0;
        for permission in self.store.find_permissions(&slugs).await? {
            if self.store.detach_permission(role.id, permission.id).await? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Revoke every permission; returns the prior count
    pub async fn detach_all_permissions(&self, role: &Role) -> Result<u64> {
        self.store.detach_all_permissions(role.id).await
    }
}

fn to_owned<S: AsRef<str>>(slugs: &[S]) -> Vec<String> {
    slugs.iter().map(|s| s.as_ref().to_string()).collect()
}
