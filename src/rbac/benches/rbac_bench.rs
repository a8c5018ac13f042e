//! RBAC benchmarks: derivation, permission checks and reconciliation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rolegate_rbac::derive::{slugify, DerivedPermission};
use rolegate_rbac::{InMemoryStore, Rbac, RbacConfig, RoleDefinition};
use tokio::runtime::Runtime;

fn create_test_config(role_count: usize, permissions_per_role: usize) -> RbacConfig {
    (0..role_count).fold(RbacConfig::default(), |config, r| {
        let permissions = (0..permissions_per_role).map(|p| format!("action {} on resource {}", p, r));
        config.with_role(RoleDefinition::new(format!("role-{}", r)).with_permissions(permissions))
    })
}

fn bench_derivation(c: &mut Criterion) {
    c.bench_function("slugify", |b| {
        b.iter(|| slugify(black_box("Manage @Billing Accounts_for-Team users")))
    });

    c.bench_function("derive_permission", |b| {
        b.iter(|| DerivedPermission::from_identifier(black_box("create user"), None, None))
    });
}

fn bench_permission_check(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("permission_check");

    for role_count in [1usize, 10, 50] {
        group.bench_with_input(
            BenchmarkId::new("roles", role_count),
            &role_count,
            |b, &count| {
                let rbac = rt.block_on(async {
                    let rbac = Rbac::new(InMemoryStore::new());
                    let config = create_test_config(count, 10);
                    rbac.reconciler().seed_roles(&config).await.unwrap();

                    let slugs: Vec<String> = (0..count).map(|r| format!("role-{}", r)).collect();
                    rbac.authorizer().user(1).sync_roles(&slugs[..]).await.unwrap();
                    rbac
                });

                let user = rbac.authorizer().user(1);
                // last permission of the last role: worst case for a scan
                let target = slugify(&format!("action 9 on resource {}", count - 1));

                b.to_async(&rt).iter(|| async {
                    let allowed = user.has_permission(black_box(&target)).await.unwrap();
                    black_box(allowed);
                });
            },
        );
    }

    group.finish();
}

fn bench_reconcile(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("reconcile");
    group.sample_size(20);

    for role_count in [5usize, 25] {
        let config = create_test_config(role_count, 8);

        group.bench_with_input(
            BenchmarkId::new("sync_roles", role_count),
            &config,
            |b, config| {
                let rbac = Rbac::new(InMemoryStore::new());
                b.to_async(&rt).iter(|| async {
                    let report = rbac.reconciler().sync_roles(config).await.unwrap();
                    black_box(report);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_derivation, bench_permission_check, bench_reconcile);
criterion_main!(benches);
