//! Request gates
//!
//! A [`Gate`] checks the current user against a set of roles and/or
//! permissions before a request reaches its handler. The host's
//! authentication layer is expected to insert [`CurrentUser`] into the request
//! extensions; requests without it are rejected as unauthenticated.
//!
//! ```ignore
//! let admin_only = Gate::role(rbac.authorizer(), "admin|super-admin");
//! let app = Router::new()
//!     .route("/admin", get(handler))
//!     .route_layer(middleware::from_fn_with_state(admin_only, gate::enforce));
//! ```

use crate::error::RbacError;
use crate::query::Authorizer;
use crate::types::UserId;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Authenticated user, inserted into request extensions by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub UserId);

/// What a gate checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateKind {
    Role,
    Permission,
    RoleOrPermission,
}

/// Slugs a gate requires, any one of which is enough
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirements(Vec<String>);

impl Requirements {
    /// Parse a pipe-delimited list such as `"admin|editor"`
    pub fn parse(value: &str) -> Self {
        Self(
            value
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Requirements {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for Requirements {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl<S: Into<String>> From<Vec<S>> for Requirements {
    fn from(values: Vec<S>) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Requirements {
    fn from(values: [S; N]) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }
}

/// Gate rejection
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("Unauthorized action.")]
    Unauthorized,

    #[error("Storage error: {0}")]
    Storage(#[from] RbacError),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            GateError::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            GateError::Unauthorized => (StatusCode::FORBIDDEN, self.to_string()),
            GateError::Storage(e) => {
                error!(error = %e, "Authorization check failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

/// Role/permission guard for a group of routes
#[derive(Clone)]
pub struct Gate {
    kind: GateKind,
    required: Arc<[String]>,
    authorizer: Authorizer,
}

impl Gate {
    fn new(kind: GateKind, authorizer: Authorizer, required: Requirements) -> Self {
        Self {
            kind,
            required: required.0.into(),
            authorizer,
        }
    }

    /// Allow users holding any of the roles
    pub fn role(authorizer: Authorizer, roles: impl Into<Requirements>) -> Self {
        Self::new(GateKind::Role, authorizer, roles.into())
    }

    /// Allow users holding any of the permissions
    pub fn permission(authorizer: Authorizer, permissions: impl Into<Requirements>) -> Self {
        Self::new(GateKind::Permission, authorizer, permissions.into())
    }

    /// Allow users holding any of the slugs, either as a role or a permission
    pub fn role_or_permission(authorizer: Authorizer, slugs: impl Into<Requirements>) -> Self {
        Self::new(GateKind::RoleOrPermission, authorizer, slugs.into())
    }

    pub fn kind(&self) -> GateKind {
        self.kind
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Decide for an optional principal
    pub async fn check(&self, user: Option<UserId>) -> Result<(), GateError> {
        let user_id = user.ok_or(GateError::Unauthenticated)?;
        let access = self.authorizer.user(user_id);

        let allowed = match self.kind {
            GateKind::Role => access.has_any_role(&self.required[..]).await?,
            GateKind::Permission => access.has_any_permission(&self.required[..]).await?,
            GateKind::RoleOrPermission => {
                access.has_any_role(&self.required[..]).await?
                    || access.has_any_permission(&self.required[..]).await?
            }
        };

        if allowed {
            debug!(user_id, kind = ?self.kind, "Gate passed");
            return Ok(());
        }

        Err(GateError::Unauthorized)
    }
}

/// Gate middleware for `axum::middleware::from_fn_with_state`
pub async fn enforce(State(gate): State<Gate>, request: Request, next: Next) -> Response {
    let user = request.extensions().get::<CurrentUser>().map(|u| u.0);

    match gate.check(user).await {
        Ok(()) => next.run(request).await,
        Err(e) => {
            warn!(
                uri = %request.uri(),
                kind = ?gate.kind,
                required = ?gate.required,
                error = %e,
                "Request rejected"
            );
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RoleRegistry;
    use crate::store::{InMemoryStore, RbacStore};

    async fn authorizer() -> Authorizer {
        let store: Arc<dyn RbacStore> = Arc::new(InMemoryStore::new());
        let roles = RoleRegistry::new(store.clone());
        let editor = roles.create("Editor", "editor", None).await.unwrap();
        roles.attach_permission(&editor, "publish").await.unwrap();

        let authz = Authorizer::new(store);
        authz.user(1).assign_role("editor").await.unwrap();
        authz
    }

    #[test]
    fn test_requirements_parse() {
        assert_eq!(
            Requirements::parse("admin| editor ||viewer").as_slice(),
            ["admin", "editor", "viewer"]
        );
        assert!(Requirements::parse("").as_slice().is_empty());
        assert_eq!(Requirements::from(["a", "b"]).as_slice(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_missing_user_is_unauthenticated() {
        let gate = Gate::role(authorizer().await, "editor");
        assert!(matches!(
            gate.check(None).await,
            Err(GateError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_role_gate() {
        let authz = authorizer().await;

        assert!(Gate::role(authz.clone(), "admin|editor").check(Some(1)).await.is_ok());
        assert!(matches!(
            Gate::role(authz.clone(), "admin").check(Some(1)).await,
            Err(GateError::Unauthorized)
        ));
        assert!(Gate::role(authz, "editor").check(Some(2)).await.is_err());
    }

    #[tokio::test]
    async fn test_permission_gate() {
        let authz = authorizer().await;

        assert!(Gate::permission(authz.clone(), "publish").check(Some(1)).await.is_ok());
        assert!(Gate::permission(authz, "delete").check(Some(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_role_or_permission_gate() {
        let authz = authorizer().await;

        // role check fails, permission check passes
        let gate = Gate::role_or_permission(authz.clone(), ["admin", "publish"]);
        assert!(gate.check(Some(1)).await.is_ok());

        let gate = Gate::role_or_permission(authz, vec!["admin", "delete"]);
        assert!(gate.check(Some(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_requirements_deny() {
        let gate = Gate::role(authorizer().await, "");
        assert!(gate.check(Some(1)).await.is_err());
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(GateError::Unauthenticated.to_string(), "Unauthenticated.");
        assert_eq!(GateError::Unauthorized.to_string(), "Unauthorized action.");
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            GateError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            GateError::Unauthorized.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GateError::Storage(RbacError::DatabaseError("down".into()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
