//! Persistence for roles, permissions and their associations

use crate::error::Result;
use crate::types::{
    NewPermission, NewRole, Permission, PermissionId, Role, RoleId, Upserted, UserId,
};
use async_trait::async_trait;

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

/// Storage backend for the RBAC tables
///
/// Each method is a single storage operation. Deleting a role or permission
/// must remove its association rows and nothing else.
#[async_trait]
pub trait RbacStore: Send + Sync {
    // Permissions

    async fn find_permission(&self, slug: &str) -> Result<Option<Permission>>;

    async fn find_permissions(&self, slugs: &[String]) -> Result<Vec<Permission>>;

    /// Insert a permission; `DuplicateSlug` if the slug is taken
    async fn insert_permission(&self, permission: NewPermission) -> Result<Permission>;

    /// Return the row for the slug, creating it if absent
    async fn upsert_permission(&self, permission: NewPermission) -> Result<Upserted<Permission>>;

    async fn list_permissions(&self) -> Result<Vec<Permission>>;

    async fn count_permissions(&self) -> Result<u64>;

    async fn delete_permission(&self, slug: &str) -> Result<bool>;

    async fn delete_all_permissions(&self) -> Result<u64>;

    // Roles

    async fn find_role(&self, slug: &str) -> Result<Option<Role>>;

    /// Insert a role; `DuplicateSlug` if the slug is taken
    async fn insert_role(&self, role: NewRole) -> Result<Role>;

    /// Return the row for the slug, creating it if absent
    async fn upsert_role(&self, role: NewRole) -> Result<Upserted<Role>>;

    async fn list_roles(&self) -> Result<Vec<Role>>;

    async fn count_roles(&self) -> Result<u64>;

    async fn delete_role(&self, slug: &str) -> Result<bool>;

    async fn delete_all_roles(&self) -> Result<u64>;

    // Role <-> Permission

    async fn role_permissions(&self, role_id: RoleId) -> Result<Vec<Permission>>;

    async fn permission_roles(&self, permission_id: PermissionId) -> Result<Vec<Role>>;

    /// Returns false if the pair was already attached
    async fn attach_permission(&self, role_id: RoleId, permission_id: PermissionId)
        -> Result<bool>;

    /// Returns false if the pair was not attached
    async fn detach_permission(&self, role_id: RoleId, permission_id: PermissionId)
        -> Result<bool>;

    async fn detach_all_permissions(&self, role_id: RoleId) -> Result<u64>;

    async fn role_has_any_permission(&self, role_id: RoleId, slugs: &[String]) -> Result<bool> {
        if slugs.is_empty() {
            return Ok(false);
        }
        let attached = self.role_permissions(role_id).await?;
        Ok(attached.iter().any(|p| slugs.contains(&p.slug)))
    }

    // User <-> Role

    /// Returns false if the user already held the role
    async fn assign_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool>;

    /// Returns false if the user did not hold the role
    async fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool>;

    async fn user_roles(&self, user_id: UserId) -> Result<Vec<Role>>;

    async fn role_users(&self, role_id: RoleId) -> Result<Vec<UserId>>;

    async fn user_has_any_role(&self, user_id: UserId, slugs: &[String]) -> Result<bool> {
        if slugs.is_empty() {
            return Ok(false);
        }
        let roles = self.user_roles(user_id).await?;
        Ok(roles.iter().any(|r| slugs.contains(&r.slug)))
    }

    async fn user_has_any_permission(&self, user_id: UserId, slugs: &[String]) -> Result<bool> {
        if slugs.is_empty() {
            return Ok(false);
        }
        for role in self.user_roles(user_id).await? {
            if self.role_has_any_permission(role.id, slugs).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Short backend label for logs
    fn backend_name(&self) -> &'static str;
}
