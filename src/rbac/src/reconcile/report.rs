//! Counts reported by reconciliation runs

use serde::Serialize;
use std::fmt;

/// Result of `permissions:seed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSeedReport {
    pub added: u64,
    pub found: u64,
}

/// Result of `permissions:sync`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PermissionSyncReport {
    pub deleted: u64,
    pub created: u64,
}

/// Existing/added pair for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub existing: u64,
    pub added: u64,
}

/// Result of `roles:seed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleSeedReport {
    pub roles: Tally,
    pub permissions: Tally,
}

/// Result of `roles:sync`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleSyncReport {
    pub roles_deleted: u64,
    pub roles_added: u64,
    pub permissions: Tally,
}

impl fmt::Display for PermissionSeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Permissions seeding completed")?;
        writeln!(f, "  - Added: {} new permissions", self.added)?;
        write!(f, "  - Found: {} existing permissions", self.found)
    }
}

impl fmt::Display for PermissionSyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Permissions synchronization completed")?;
        writeln!(f, "  - Deleted: {} permissions", self.deleted)?;
        write!(f, "  - Total: {} permissions", self.created)
    }
}

impl fmt::Display for RoleSeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Roles and permissions seeding completed")?;
        writeln!(f, "  - Roles:")?;
        writeln!(f, "    * Existing: {}", self.roles.existing)?;
        writeln!(f, "    * Added: {}", self.roles.added)?;
        writeln!(f, "  - Permissions:")?;
        writeln!(f, "    * Existing: {}", self.permissions.existing)?;
        write!(f, "    * Added: {}", self.permissions.added)
    }
}

impl fmt::Display for RoleSyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Roles sync completed")?;
        writeln!(f, "  - Roles:")?;
        writeln!(f, "    * Deleted: {}", self.roles_deleted)?;
        writeln!(f, "    * Added: {}", self.roles_added)?;
        writeln!(f, "  - Permissions:")?;
        writeln!(f, "    * Existing: {}", self.permissions.existing)?;
        write!(f, "    * Added: {}", self.permissions.added)
    }
}
