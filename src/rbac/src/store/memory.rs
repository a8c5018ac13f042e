//! In-memory store implementation

use super::RbacStore;
use crate::error::{RbacError, Result};
use crate::types::{
    NewPermission, NewRole, Permission, PermissionId, Role, RoleId, Upserted, UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    permissions: BTreeMap<PermissionId, Permission>,
    roles: BTreeMap<RoleId, Role>,
    /// (permission_id, role_id)
    permission_role: BTreeSet<(PermissionId, RoleId)>,
    /// (role_id, user_id)
    role_user: BTreeSet<(RoleId, UserId)>,
    next_permission_id: PermissionId,
    next_role_id: RoleId,
}

impl State {
    fn permission_by_slug(&self, slug: &str) -> Option<&Permission> {
        self.permissions.values().find(|p| p.slug == slug)
    }

    fn role_by_slug(&self, slug: &str) -> Option<&Role> {
        self.roles.values().find(|r| r.slug == slug)
    }

    fn create_permission(&mut self, new: NewPermission) -> Permission {
        self.next_permission_id += 1;
        let now = Utc::now();
        let permission = Permission {
            id: self.next_permission_id,
            slug: new.slug,
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        self.permissions.insert(permission.id, permission.clone());
        permission
    }

    fn create_role(&mut self, new: NewRole) -> Role {
        self.next_role_id += 1;
        let now = Utc::now();
        let role = Role {
            id: self.next_role_id,
            slug: new.slug,
            name: new.name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        self.roles.insert(role.id, role.clone());
        role
    }

    fn remove_permission(&mut self, id: PermissionId) {
        self.permissions.remove(&id);
        self.permission_role.retain(|(p, _)| *p != id);
    }

    fn remove_role(&mut self, id: RoleId) {
        self.roles.remove(&id);
        self.permission_role.retain(|(_, r)| *r != id);
        self.role_user.retain(|(r, _)| *r != id);
    }
}

/// Store that keeps every table in process memory
///
/// Ids are assigned from per-table counters that are never reused, matching
/// the behaviour of a serial primary key.
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RbacStore for InMemoryStore {
    async fn find_permission(&self, slug: &str) -> Result<Option<Permission>> {
        let state = self.state.read().await;
        Ok(state.permission_by_slug(slug).cloned())
    }

    async fn find_permissions(&self, slugs: &[String]) -> Result<Vec<Permission>> {
        let state = self.state.read().await;
        Ok(state
            .permissions
            .values()
            .filter(|p| slugs.contains(&p.slug))
            .cloned()
            .collect())
    }

    async fn insert_permission(&self, permission: NewPermission) -> Result<Permission> {
        let mut state = self.state.write().await;
        if state.permission_by_slug(&permission.slug).is_some() {
            return Err(RbacError::DuplicateSlug(permission.slug));
        }
        Ok(state.create_permission(permission))
    }

    async fn upsert_permission(&self, permission: NewPermission) -> Result<Upserted<Permission>> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.permission_by_slug(&permission.slug) {
            return Ok(Upserted::existing(existing.clone()));
        }
        Ok(Upserted::created(state.create_permission(permission)))
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        let state = self.state.read().await;
        Ok(state.permissions.values().cloned().collect())
    }

    async fn count_permissions(&self) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.permissions.len() as u64)
    }

    async fn delete_permission(&self, slug: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.permission_by_slug(slug).map(|p| p.id) {
            Some(id) => {
                state.remove_permission(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all_permissions(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let count = state.permissions.len() as u64;
        state.permissions.clear();
        state.permission_role.clear();
        Ok(count)
    }

    async fn find_role(&self, slug: &str) -> Result<Option<Role>> {
        let state = self.state.read().await;
        Ok(state.role_by_slug(slug).cloned())
    }

    async fn insert_role(&self, role: NewRole) -> Result<Role> {
        let mut state = self.state.write().await;
        if state.role_by_slug(&role.slug).is_some() {
            return Err(RbacError::DuplicateSlug(role.slug));
        }
        Ok(state.create_role(role))
    }

    async fn upsert_role(&self, role: NewRole) -> Result<Upserted<Role>> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.role_by_slug(&role.slug) {
            return Ok(Upserted::existing(existing.clone()));
        }
        Ok(Upserted::created(state.create_role(role)))
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.values().cloned().collect())
    }

    async fn count_roles(&self) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.roles.len() as u64)
    }

    async fn delete_role(&self, slug: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.role_by_slug(slug).map(|r| r.id) {
            Some(id) => {
                state.remove_role(id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all_roles(&self) -> Result<u64> {
        let mut state = self.state.write().await;
        let count = state.roles.len() as u64;
        state.roles.clear();
        state.permission_role.clear();
        state.role_user.clear();
        Ok(count)
    }

    async fn role_permissions(&self, role_id: RoleId) -> Result<Vec<Permission>> {
        let state = self.state.read().await;
        Ok(state
            .permission_role
            .iter()
            .filter(|(_, r)| *r == role_id)
            .filter_map(|(p, _)| state.permissions.get(p).cloned())
            .collect())
    }

    async fn permission_roles(&self, permission_id: PermissionId) -> Result<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state
            .permission_role
            .range((permission_id, RoleId::MIN)..=(permission_id, RoleId::MAX))
            .filter_map(|(_, r)| state.roles.get(r).cloned())
            .collect())
    }

    async fn attach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(RbacError::NotFound(format!("role id {}", role_id)));
        }
        if !state.permissions.contains_key(&permission_id) {
            return Err(RbacError::NotFound(format!("permission id {}", permission_id)));
        }
        Ok(state.permission_role.insert((permission_id, role_id)))
    }

    async fn detach_permission(
        &self,
        role_id: RoleId,
        permission_id: PermissionId,
    ) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.permission_role.remove(&(permission_id, role_id)))
    }

    async fn detach_all_permissions(&self, role_id: RoleId) -> Result<u64> {
        let mut state = self.state.write().await;
        let before = state.permission_role.len();
        state.permission_role.retain(|(_, r)| *r != role_id);
        Ok((before - state.permission_role.len()) as u64)
    }

    async fn assign_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(RbacError::NotFound(format!("role id {}", role_id)));
        }
        Ok(state.role_user.insert((role_id, user_id)))
    }

    async fn revoke_role(&self, user_id: UserId, role_id: RoleId) -> Result<bool> {
        let mut state = self.state.write().await;
        Ok(state.role_user.remove(&(role_id, user_id)))
    }

    async fn user_roles(&self, user_id: UserId) -> Result<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state
            .role_user
            .iter()
            .filter(|(_, u)| *u == user_id)
            .filter_map(|(r, _)| state.roles.get(r).cloned())
            .collect())
    }

    async fn role_users(&self, role_id: RoleId) -> Result<Vec<UserId>> {
        let state = self.state.read().await;
        Ok(state
            .role_user
            .range((role_id, UserId::MIN)..=(role_id, UserId::MAX))
            .map(|(_, u)| *u)
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
