//! Authorization queries on a principal

use crate::error::{RbacError, Result};
use crate::store::RbacStore;
use crate::types::{Permission, PermissionId, Role, RoleId, UserId};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// Entry point for principal checks
#[derive(Clone)]
pub struct Authorizer {
    store: Arc<dyn RbacStore>,
}

impl Authorizer {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    /// Handle for one user
    pub fn user(&self, user_id: UserId) -> UserAccess {
        UserAccess {
            store: self.store.clone(),
            user_id,
        }
    }
}

/// Role and permission checks for a single user
///
/// Permissions are only ever held through roles.
#[derive(Clone)]
pub struct UserAccess {
    store: Arc<dyn RbacStore>,
    user_id: UserId,
}

impl UserAccess {
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub async fn has_role(&self, slug: &str) -> Result<bool> {
        self.store
            .user_has_any_role(self.user_id, &[slug.to_string()])
            .await
    }

    /// False for an empty list
    pub async fn has_any_role<S: AsRef<str>>(&self, slugs: &[S]) -> Result<bool> {
        self.store
            .user_has_any_role(self.user_id, &to_owned(slugs))
            .await
    }

    /// True if any held role has the permission attached
    pub async fn has_permission(&self, slug: &str) -> Result<bool> {
        self.store
            .user_has_any_permission(self.user_id, &[slug.to_string()])
            .await
    }

    /// False for an empty list
    pub async fn has_any_permission<S: AsRef<str>>(&self, slugs: &[S]) -> Result<bool> {
        self.store
            .user_has_any_permission(self.user_id, &to_owned(slugs))
            .await
    }

    /// Grant a role; false if the user already held it
    pub async fn assign_role(&self, slug: &str) -> Result<bool> {
        let role = self.require_role(slug).await?;
        let assigned = self.store.assign_role(self.user_id, role.id).await?;
        if assigned {
            debug!(user_id = self.user_id, role = slug, "Role assigned");
        }
        Ok(assigned)
    }

    /// Revoke a role; false if the user did not hold it or it does not exist
    pub async fn remove_role(&self, slug: &str) -> Result<bool> {
        match self.store.find_role(slug).await? {
            Some(role) => self.store.revoke_role(self.user_id, role.id).await,
            None => Ok(false),
        }
    }

    /// Make the user's roles exactly `slugs`
    ///
    /// Every slug must name an existing role. An empty list removes all roles.
    pub async fn sync_roles<S: AsRef<str>>(&self, slugs: &[S]) -> Result<bool> {
        let mut target: BTreeSet<RoleId> = BTreeSet::new();
        for slug in slugs {
            target.insert(self.require_role(slug.as_ref()).await?.id);
        }

        let current: BTreeSet<RoleId> = self
            .store
            .user_roles(self.user_id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let mut changed = false;
        for id in target.difference(&current) {
            changed |= self.store.assign_role(self.user_id, *id).await?;
        }
        for id in current.difference(&target) {
            changed |= self.store.revoke_role(self.user_id, *id).await?;
        }

        debug!(user_id = self.user_id, changed, "Roles synced");
        Ok(changed)
    }

    pub async fn roles(&self) -> Result<Vec<Role>> {
        self.store.user_roles(self.user_id).await
    }

    /// Permissions held through any role, each listed once
    pub async fn permissions(&self) -> Result<Vec<Permission>> {
        let mut seen: BTreeSet<PermissionId> = BTreeSet::new();
        let mut out = Vec::new();
        for role in self.roles().await? {
            for permission in self.store.role_permissions(role.id).await? {
                if seen.insert(permission.id) {
                    out.push(permission);
                }
            }
        }
        Ok(out)
    }

    async fn require_role(&self, slug: &str) -> Result<Role> {
        self.store
            .find_role(slug)
            .await?
            .ok_or_else(|| RbacError::NotFound(format!("role '{}'", slug)))
    }
}

fn to_owned<S: AsRef<str>>(slugs: &[S]) -> Vec<String> {
    slugs.iter().map(|s| s.as_ref().to_string()).collect()
}
