//! Declarative RBAC configuration
//!
//! The configuration is read once into an immutable [`RbacConfig`] and handed
//! to the reconciliation engine explicitly.

use crate::derive::DerivedPermission;
use crate::error::{RbacError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete RBAC configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RbacConfig {
    /// Name of the host entity that plays the principal
    #[serde(default = "default_user_model")]
    pub user_model: String,

    /// Flat permission catalog, in declaration order
    #[serde(default)]
    pub permissions: Vec<PermissionEntry>,

    /// Role definitions, in declaration order
    #[serde(default)]
    pub roles: Vec<RoleDefinition>,

    /// Persisted table names
    #[serde(default)]
    pub tables: TableNames,
}

fn default_user_model() -> String {
    "users".to_string()
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            user_model: default_user_model(),
            permissions: Vec::new(),
            roles: Vec::new(),
            tables: TableNames::default(),
        }
    }
}

/// Permission catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawPermissionEntry", into = "RawPermissionEntry")]
pub enum PermissionEntry {
    /// The value is the identifier, e.g. `"read user"`
    Bare(String),

    /// Identifier with slug/description overrides
    Keyed {
        key: String,
        overrides: PermissionOverrides,
    },
}

/// Optional overrides on a keyed permission entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Wire shape: a string or a `{ name, slug?, description? }` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawPermissionEntry {
    Bare(String),
    Keyed(KeyedPermission),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct KeyedPermission {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl From<RawPermissionEntry> for PermissionEntry {
    fn from(raw: RawPermissionEntry) -> Self {
        match raw {
            RawPermissionEntry::Bare(value) => PermissionEntry::Bare(value),
            RawPermissionEntry::Keyed(keyed) => PermissionEntry::Keyed {
                key: keyed.name,
                overrides: PermissionOverrides {
                    slug: keyed.slug,
                    description: keyed.description,
                },
            },
        }
    }
}

impl From<PermissionEntry> for RawPermissionEntry {
    fn from(entry: PermissionEntry) -> Self {
        match entry {
            PermissionEntry::Bare(value) => RawPermissionEntry::Bare(value),
            PermissionEntry::Keyed { key, overrides } => RawPermissionEntry::Keyed(KeyedPermission {
                name: key,
                slug: overrides.slug,
                description: overrides.description,
            }),
        }
    }
}

impl PermissionEntry {
    /// Bare entry
    pub fn bare(value: impl Into<String>) -> Self {
        PermissionEntry::Bare(value.into())
    }

    /// Keyed entry without overrides
    pub fn keyed(key: impl Into<String>) -> Self {
        PermissionEntry::Keyed {
            key: key.into(),
            overrides: PermissionOverrides::default(),
        }
    }

    /// Set the slug override (turns a bare entry into a keyed one)
    pub fn with_slug(self, slug: impl Into<String>) -> Self {
        let (key, mut overrides) = self.into_parts();
        overrides.slug = Some(slug.into());
        PermissionEntry::Keyed { key, overrides }
    }

    /// Set the description override (turns a bare entry into a keyed one)
    pub fn with_description(self, description: impl Into<String>) -> Self {
        let (key, mut overrides) = self.into_parts();
        overrides.description = Some(description.into());
        PermissionEntry::Keyed { key, overrides }
    }

    fn into_parts(self) -> (String, PermissionOverrides) {
        match self {
            PermissionEntry::Bare(value) => (value, PermissionOverrides::default()),
            PermissionEntry::Keyed { key, overrides } => (key, overrides),
        }
    }

    /// Resolve into the canonical (name, slug, description) triple
    pub fn derive(&self) -> DerivedPermission {
        match self {
            PermissionEntry::Bare(value) => DerivedPermission::from_identifier(value, None, None),
            PermissionEntry::Keyed { key, overrides } => DerivedPermission::from_identifier(
                key,
                overrides.slug.as_deref(),
                overrides.description.as_deref(),
            ),
        }
    }
}

/// A role and the permissions it references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleDefinition {
    /// Unique role slug
    pub slug: String,

    /// Display name; derived from the slug when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub permissions: Vec<RolePermissionRef>,
}

impl RoleDefinition {
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: None,
            description: None,
            permissions: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append bare permission references
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions
            .extend(permissions.into_iter().map(|p| RolePermissionRef::Bare(p.into())));
        self
    }
}

/// Permission reference inside a role definition
///
/// References carry no slug override; the slug always derives from the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRolePermissionRef", into = "RawRolePermissionRef")]
pub enum RolePermissionRef {
    Bare(String),
    Detailed {
        name: String,
        description: Option<String>,
    },
}

/// Wire shape: a string or a `{ name, description? }` table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRolePermissionRef {
    Bare(String),
    Detailed(DetailedRef),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedRef {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl From<RawRolePermissionRef> for RolePermissionRef {
    fn from(raw: RawRolePermissionRef) -> Self {
        match raw {
            RawRolePermissionRef::Bare(value) => RolePermissionRef::Bare(value),
            RawRolePermissionRef::Detailed(DetailedRef { name, description }) => {
                RolePermissionRef::Detailed { name, description }
            }
        }
    }
}

impl From<RolePermissionRef> for RawRolePermissionRef {
    fn from(reference: RolePermissionRef) -> Self {
        match reference {
            RolePermissionRef::Bare(value) => RawRolePermissionRef::Bare(value),
            RolePermissionRef::Detailed { name, description } => {
                RawRolePermissionRef::Detailed(DetailedRef { name, description })
            }
        }
    }
}

impl RolePermissionRef {
    pub fn derive(&self) -> DerivedPermission {
        match self {
            RolePermissionRef::Bare(value) => DerivedPermission::from_identifier(value, None, None),
            RolePermissionRef::Detailed { name, description } => {
                DerivedPermission::from_identifier(name, None, description.as_deref())
            }
        }
    }
}

/// Names of the four persisted tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableNames {
    #[serde(default = "default_roles_table")]
    pub roles: String,
    #[serde(default = "default_permissions_table")]
    pub permissions: String,
    #[serde(default = "default_role_user_table")]
    pub role_user: String,
    #[serde(default = "default_permission_role_table")]
    pub permission_role: String,
}

fn default_roles_table() -> String {
    "roles".to_string()
}

fn default_permissions_table() -> String {
    "permissions".to_string()
}

fn default_role_user_table() -> String {
    "role_user".to_string()
}

fn default_permission_role_table() -> String {
    "permission_role".to_string()
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            roles: default_roles_table(),
            permissions: default_permissions_table(),
            role_user: default_role_user_table(),
            permission_role: default_permission_role_table(),
        }
    }
}

impl TableNames {
    /// Table names are interpolated into SQL, so only plain identifiers pass
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("roles", &self.roles),
            ("permissions", &self.permissions),
            ("role_user", &self.role_user),
            ("permission_role", &self.permission_role),
        ];

        for (field, name) in names {
            if !is_sql_identifier(name) {
                return Err(RbacError::InvalidConfig(format!(
                    "tables.{} = '{}' is not a valid table name",
                    field, name
                )));
            }
        }

        let mut unique: Vec<&String> = names.iter().map(|(_, n)| *n).collect();
        unique.sort();
        unique.dedup();
        if unique.len() != names.len() {
            return Err(RbacError::InvalidConfig(
                "table names must be distinct".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl RbacConfig {
    /// Parse a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| RbacError::InvalidConfig(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(source)
            .map_err(|e| RbacError::InvalidConfig(format!("Failed to parse JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as TOML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&source),
            _ => Self::from_toml_str(&source),
        }
    }

    /// Structural validation; emptiness is checked per operation
    pub fn validate(&self) -> Result<()> {
        self.tables.validate()?;

        for role in &self.roles {
            if role.slug.trim().is_empty() {
                return Err(RbacError::InvalidConfig("role slug cannot be empty".to_string()));
            }
        }

        for (i, role) in self.roles.iter().enumerate() {
            if self.roles[..i].iter().any(|r| r.slug == role.slug) {
                return Err(RbacError::InvalidConfig(format!(
                    "role '{}' is declared more than once",
                    role.slug
                )));
            }
        }

        Ok(())
    }

    pub fn with_permission(mut self, entry: PermissionEntry) -> Self {
        self.permissions.push(entry);
        self
    }

    pub fn with_role(mut self, role: RoleDefinition) -> Self {
        self.roles.push(role);
        self
    }
}
