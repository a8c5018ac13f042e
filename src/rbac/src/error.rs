//! Error types for the RBAC library

use thiserror::Error;

/// RBAC errors
#[derive(Debug, Error)]
pub enum RbacError {
    /// No permissions or roles declared in configuration
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    /// Configuration could not be parsed or failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A role or permission with this slug already exists
    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),

    /// Role or permission not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage failure
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for RBAC operations
pub type Result<T> = std::result::Result<T, RbacError>;
