//! Core RBAC entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Surrogate key of a permission row
pub type PermissionId = i64;

/// Surrogate key of a role row
pub type RoleId = i64;

/// Identifier of the host application's user entity
pub type UserId = i64;

/// A named capability that can be granted to roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Permission {
    /// Surrogate key
    pub id: PermissionId,

    /// Unique, stable identifier (e.g., "read-user")
    pub slug: String,

    /// Display label (e.g., "Read User")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named group of permissions that can be assigned to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Role {
    /// Surrogate key
    pub id: RoleId,

    /// Unique, stable identifier (e.g., "admin")
    pub slug: String,

    /// Display label (e.g., "Administrator")
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes of a permission that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPermission {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewPermission {
    /// Create permission attributes
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the description when one is given, leave it unset otherwise
    pub fn with_description_opt(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = description.map(Into::into);
        self
    }
}

/// Attributes of a role that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRole {
    /// Create role attributes
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the description when one is given, leave it unset otherwise
    pub fn with_description_opt(mut self, description: Option<impl Into<String>>) -> Self {
        self.description = description.map(Into::into);
        self
    }
}

/// Result of a create-or-get operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upserted<T> {
    /// The stored row (freshly created or pre-existing)
    pub record: T,

    /// Whether the row was created by this call
    pub created: bool,
}

impl<T> Upserted<T> {
    pub fn created(record: T) -> Self {
        Self { record, created: true }
    }

    pub fn existing(record: T) -> Self {
        Self { record, created: false }
    }

    pub fn into_inner(self) -> T {
        self.record
    }
}
