//! Reconciliation of configuration against an in-memory store

use rolegate_rbac::{
    InMemoryStore, PermissionEntry, Rbac, RbacConfig, RbacError, RoleDefinition,
};
use std::collections::BTreeMap;
use tokio_test::{assert_err, assert_ok};

const CONFIG: &str = r#"
permissions = [
    "read user",
    { name = "create user", slug = "create-user", description = "Ability to create new user" },
    { name = "export reports" },
]

[[roles]]
slug = "admin"
permissions = ["create", "read", "update", "delete"]

[[roles]]
slug = "viewer"
permissions = ["read"]
"#;

fn config() -> RbacConfig {
    RbacConfig::from_toml_str(CONFIG).unwrap()
}

fn rbac() -> Rbac {
    Rbac::new(InMemoryStore::new())
}

async fn permission_slugs(rbac: &Rbac) -> Vec<String> {
    let mut slugs: Vec<String> = rbac
        .permissions()
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.slug)
        .collect();
    slugs.sort();
    slugs
}

/// role slug -> sorted permission slugs
async fn grants(rbac: &Rbac) -> BTreeMap<String, Vec<String>> {
    let roles = rbac.roles();
    let mut out = BTreeMap::new();
    for role in roles.list().await.unwrap() {
        let mut slugs: Vec<String> = roles
            .permissions(&role)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.slug)
            .collect();
        slugs.sort();
        out.insert(role.slug, slugs);
    }
    out
}

// ============================================================================
// PERMISSIONS
// ============================================================================

#[tokio::test]
async fn test_seed_permissions_derives_catalog() {
    let rbac = rbac();
    let report = rbac.reconciler().seed_permissions(&config()).await.unwrap();

    assert_eq!(report.added, 3);
    assert_eq!(report.found, 0);

    let read = rbac.permissions().find_by_slug("read-user").await.unwrap().unwrap();
    assert_eq!(read.name, "Read User");
    assert_eq!(read.description.as_deref(), Some("Ability to Read User permission."));

    let create = rbac.permissions().find_by_slug("create-user").await.unwrap().unwrap();
    assert_eq!(create.name, "Create User");
    assert_eq!(create.description.as_deref(), Some("Ability to create new user"));

    let export = rbac.permissions().find_by_slug("export-reports").await.unwrap().unwrap();
    assert_eq!(export.name, "Export Reports");
}

#[tokio::test]
async fn test_seed_permissions_twice_adds_nothing() {
    let rbac = rbac();
    let config = config();

    rbac.reconciler().seed_permissions(&config).await.unwrap();
    let before = permission_slugs(&rbac).await;

    let report = rbac.reconciler().seed_permissions(&config).await.unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.found, 3);
    assert_eq!(permission_slugs(&rbac).await, before);
}

#[tokio::test]
async fn test_seed_permissions_leaves_existing_rows_untouched() {
    let rbac = rbac();
    rbac.permissions()
        .create("Custom Name", "read-user", None)
        .await
        .unwrap();

    let report = rbac.reconciler().seed_permissions(&config()).await.unwrap();
    assert_eq!(report.found, 1);

    let read = rbac.permissions().find_by_slug("read-user").await.unwrap().unwrap();
    assert_eq!(read.name, "Custom Name");
}

#[tokio::test]
async fn test_sync_permissions_replaces_table() {
    let rbac = rbac();
    rbac.permissions().create("Legacy", "legacy", None).await.unwrap();
    let role = rbac.roles().create("Ops", "ops", None).await.unwrap();
    rbac.roles().attach_permission(&role, "legacy").await.unwrap();

    let report = rbac.reconciler().sync_permissions(&config()).await.unwrap();
    assert_eq!(report.deleted, 1);
    assert_eq!(report.created, 3);

    assert_eq!(
        permission_slugs(&rbac).await,
        vec!["create-user", "export-reports", "read-user"]
    );
    // grant went with the permission, role stays
    assert!(rbac.roles().permissions(&role).await.unwrap().is_empty());
    assert!(rbac.roles().find_by_slug("ops").await.unwrap().is_some());
}

#[tokio::test]
async fn test_sync_permissions_twice_same_slugs() {
    let rbac = rbac();
    let config = config();

    rbac.reconciler().sync_permissions(&config).await.unwrap();
    let first = permission_slugs(&rbac).await;

    let report = rbac.reconciler().sync_permissions(&config).await.unwrap();
    assert_eq!(report.deleted, 3);
    assert_eq!(permission_slugs(&rbac).await, first);
}

#[tokio::test]
async fn test_empty_catalog_aborts_before_storage() {
    let rbac = rbac();
    rbac.permissions().create("Keep", "keep", None).await.unwrap();

    let empty = RbacConfig::default();
    let err = rbac.reconciler().sync_permissions(&empty).await.unwrap_err();
    assert!(matches!(err, RbacError::ConfigurationMissing(_)));

    let err = rbac.reconciler().seed_permissions(&empty).await.unwrap_err();
    assert!(matches!(err, RbacError::ConfigurationMissing(_)));

    assert_eq!(permission_slugs(&rbac).await, vec!["keep"]);
}

// ============================================================================
// ROLES
// ============================================================================

#[tokio::test]
async fn test_seed_roles_admin_viewer_scenario() {
    let rbac = rbac();
    let report = rbac.reconciler().seed_roles(&config()).await.unwrap();

    assert_eq!(report.roles.added, 2);
    assert_eq!(report.roles.existing, 0);
    assert_eq!(report.permissions.added, 4);
    assert_eq!(report.permissions.existing, 0);

    assert_eq!(rbac.roles().count().await.unwrap(), 2);
    assert_eq!(rbac.permissions().count().await.unwrap(), 4);

    let grants = grants(&rbac).await;
    assert_eq!(grants["admin"], vec!["create", "delete", "read", "update"]);
    assert_eq!(grants["viewer"], vec!["read"]);

    let admin = rbac.roles().find_by_slug("admin").await.unwrap().unwrap();
    assert_eq!(admin.name, "Admin");
}

#[tokio::test]
async fn test_seed_roles_twice_counts_existing() {
    let rbac = rbac();
    let config = config();

    rbac.reconciler().seed_roles(&config).await.unwrap();
    let before = grants(&rbac).await;

    let report = rbac.reconciler().seed_roles(&config).await.unwrap();
    assert_eq!(report.roles.existing, 2);
    assert_eq!(report.roles.added, 0);
    assert_eq!(report.permissions.existing, 4);
    assert_eq!(report.permissions.added, 0);
    assert_eq!(grants(&rbac).await, before);
}

#[tokio::test]
async fn test_seed_roles_never_detaches() {
    let rbac = rbac();
    let config = config();
    rbac.reconciler().seed_roles(&config).await.unwrap();

    let viewer = rbac.roles().find_by_slug("viewer").await.unwrap().unwrap();
    rbac.roles().attach_permission(&viewer, "export").await.unwrap();

    rbac.reconciler().seed_roles(&config).await.unwrap();
    assert_eq!(grants(&rbac).await["viewer"], vec!["export", "read"]);
}

#[tokio::test]
async fn test_seed_roles_uses_configured_name() {
    let rbac = rbac();
    let config = RbacConfig::default()
        .with_role(RoleDefinition::new("super_admin").with_permissions(["all"]))
        .with_role(
            RoleDefinition::new("ops")
                .with_name("Operations")
                .with_description("Runs things"),
        );

    rbac.reconciler().seed_roles(&config).await.unwrap();

    let super_admin = rbac.roles().find_by_slug("super_admin").await.unwrap().unwrap();
    assert_eq!(super_admin.name, "Super Admin");

    let ops = rbac.roles().find_by_slug("ops").await.unwrap().unwrap();
    assert_eq!(ops.name, "Operations");
    assert_eq!(ops.description.as_deref(), Some("Runs things"));
}

#[tokio::test]
async fn test_sync_roles_is_idempotent_in_final_state() {
    let rbac = rbac();
    let config = config();

    let first = rbac.reconciler().sync_roles(&config).await.unwrap();
    assert_eq!(first.roles_deleted, 0);
    assert_eq!(first.roles_added, 2);
    assert_eq!(first.permissions.added, 4);
    let state = (grants(&rbac).await, permission_slugs(&rbac).await);

    let second = rbac.reconciler().sync_roles(&config).await.unwrap();
    assert_eq!(second.roles_deleted, 2);
    assert_eq!(second.roles_added, 2);
    assert_eq!(second.permissions.existing, 4);
    assert_eq!(second.permissions.added, 0);
    assert_eq!((grants(&rbac).await, permission_slugs(&rbac).await), state);
}

#[tokio::test]
async fn test_sync_roles_drops_undeclared_roles_and_user_grants() {
    let rbac = rbac();
    let legacy = rbac.roles().create("Legacy", "legacy", None).await.unwrap();
    rbac.roles().attach_permission(&legacy, "old").await.unwrap();
    rbac.authorizer().user(1).assign_role("legacy").await.unwrap();

    rbac.reconciler().sync_roles(&config()).await.unwrap();

    assert!(rbac.roles().find_by_slug("legacy").await.unwrap().is_none());
    // orphaned permission survives
    assert!(rbac.permissions().find_by_slug("old").await.unwrap().is_some());
    assert!(rbac.authorizer().user(1).roles().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_roles_abort() {
    let rbac = rbac();
    let config = RbacConfig::default().with_permission(PermissionEntry::bare("read"));

    let err = assert_err!(rbac.reconciler().seed_roles(&config).await);
    assert!(matches!(err, RbacError::ConfigurationMissing(_)));
    let err = assert_err!(rbac.reconciler().sync_roles(&config).await);
    assert!(matches!(err, RbacError::ConfigurationMissing(_)));

    // the catalog alone is still valid input for the permission commands
    assert_ok!(rbac.reconciler().seed_permissions(&config).await);
}

#[tokio::test]
async fn test_deleting_permission_keeps_roles() {
    let rbac = rbac();
    rbac.reconciler().seed_roles(&config()).await.unwrap();

    assert!(rbac.permissions().delete("read").await.unwrap());

    let grants = grants(&rbac).await;
    assert_eq!(grants["admin"], vec!["create", "delete", "update"]);
    assert!(grants["viewer"].is_empty());
    assert_eq!(rbac.roles().count().await.unwrap(), 2);
}

// ============================================================================
// KNOWN EDGE CASE: implicit permissions are de-duplicated by name, not slug
// ============================================================================

fn colliding_config() -> RbacConfig {
    // "read user" and "read-user" derive different names but the same slug
    RbacConfig::default()
        .with_role(RoleDefinition::new("admin").with_permissions(["read user"]))
        .with_role(RoleDefinition::new("viewer").with_permissions(["read-user"]))
}

#[tokio::test]
async fn test_name_dedup_collision_fails_seed() {
    let rbac = rbac();

    let err = rbac.reconciler().seed_roles(&colliding_config()).await.unwrap_err();
    assert!(matches!(err, RbacError::DuplicateSlug(_)));

    // first insert was applied before the failure
    assert_eq!(permission_slugs(&rbac).await, vec!["read-user"]);
    assert_eq!(rbac.roles().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_name_dedup_collision_passes_sync() {
    let rbac = rbac();

    let report = rbac.reconciler().sync_roles(&colliding_config()).await.unwrap();
    assert_eq!(report.permissions.added, 1);

    let grants = grants(&rbac).await;
    assert_eq!(grants["admin"], vec!["read-user"]);
    assert_eq!(grants["viewer"], vec!["read-user"]);
}
