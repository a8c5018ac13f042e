//! Permission and role registries

pub mod permissions;
pub mod roles;

pub use permissions::PermissionRegistry;
pub use roles::RoleRegistry;
