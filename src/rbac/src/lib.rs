//! # Rolegate RBAC
//!
//! Role-based access control for web applications: users hold roles, roles
//! hold permissions, and axum gates check both before a request is handled.
//!
//! ## Features
//!
//! - **Declarative configuration** of permissions and roles in TOML or JSON
//! - **Seed and sync** reconciliation of the stored tables against that configuration
//! - **Async-first design** using Tokio, with pluggable storage (in-memory, PostgreSQL)
//! - **axum middleware** gating routes on roles, permissions, or either
//!
//! ## Example
//!
//! ```rust
//! use rolegate_rbac::{InMemoryStore, PermissionEntry, Rbac, RbacConfig, RoleDefinition};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let rbac = Rbac::new(InMemoryStore::new());
//!
//!     let config = RbacConfig::default()
//!         .with_permission(PermissionEntry::bare("read user"))
//!         .with_role(RoleDefinition::new("admin").with_permissions(["read user"]));
//!
//!     rbac.reconciler().seed_permissions(&config).await?;
//!     rbac.reconciler().seed_roles(&config).await?;
//!
//!     let alice = rbac.authorizer().user(1);
//!     alice.assign_role("admin").await?;
//!
//!     if alice.has_permission("read-user").await? {
//!         println!("Access granted!");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod derive;
pub mod error;
pub mod gate;
pub mod query;
pub mod reconcile;
pub mod registry;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{PermissionEntry, RbacConfig, RoleDefinition, RolePermissionRef, TableNames};
pub use error::{RbacError, Result};
pub use gate::{CurrentUser, Gate, GateError, GateKind};
pub use query::{Authorizer, UserAccess};
pub use reconcile::{
    PermissionSeedReport, PermissionSyncReport, Reconciler, RoleSeedReport, RoleSyncReport,
};
pub use registry::{PermissionRegistry, RoleRegistry};
pub use store::{InMemoryStore, RbacStore};
#[cfg(feature = "postgres")]
pub use store::PostgresStore;
pub use types::{Permission, PermissionId, Role, RoleId, UserId};

use std::sync::Arc;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Bundles one store with the components built on it
#[derive(Clone)]
pub struct Rbac {
    store: Arc<dyn RbacStore>,
}

impl Rbac {
    pub fn new(store: impl RbacStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_arc(store: Arc<dyn RbacStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn RbacStore> {
        self.store.clone()
    }

    pub fn permissions(&self) -> PermissionRegistry {
        PermissionRegistry::new(self.store.clone())
    }

    pub fn roles(&self) -> RoleRegistry {
        RoleRegistry::new(self.store.clone())
    }

    pub fn authorizer(&self) -> Authorizer {
        Authorizer::new(self.store.clone())
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.store.clone())
    }
}
