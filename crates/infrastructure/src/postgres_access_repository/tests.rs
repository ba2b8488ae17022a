use fleetgrid_application::{
    AccessRepository, HierarchyRepository, Role, RoleProvision, RoleRepository,
};
use fleetgrid_core::{DomainId, EntityId};
use fleetgrid_domain::{Action, EntityKind};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::postgres_hierarchy_repository::PostgresHierarchyRepository;
use crate::postgres_role_repository::PostgresRoleRepository;

use super::PostgresAccessRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres access tests: {error}");
    }

    Some(pool)
}

fn actions(tokens: &[&str]) -> Vec<Action> {
    tokens
        .iter()
        .map(|token| Action::new(*token).unwrap_or_else(|_| unreachable!()))
        .collect()
}

async fn seed_role(
    repository: &PostgresRoleRepository,
    entity_id: EntityId,
    name: &str,
    tokens: &[&str],
    member: &str,
) {
    let added = repository
        .add_roles(&[RoleProvision {
            role: Role::new(entity_id, name, "tester"),
            optional_actions: actions(tokens),
            optional_members: vec![member.to_owned()],
        }])
        .await;
    assert!(added.is_ok());
}

#[tokio::test]
async fn direct_roles_fold_actions_per_role() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let roles = PostgresRoleRepository::new(pool.clone(), EntityKind::Channel);
    let access = PostgresAccessRepository::new(pool, EntityKind::Channel);
    let entity_id = EntityId::new();

    seed_role(&roles, entity_id, "operator", &["read", "publish"], "alice").await;
    seed_role(&roles, entity_id, "viewer", &["read"], "bob").await;

    let grants = access.member_roles_on_entity(entity_id, "alice").await;
    assert!(grants.is_ok_and(|grants| {
        grants.len() == 1
            && grants[0].role_name == "operator"
            && grants[0].actions == actions(&["publish", "read"])
    }));
}

#[tokio::test]
async fn cascading_roles_carry_the_group_path() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let hierarchy = PostgresHierarchyRepository::new(pool.clone());
    let roles = PostgresRoleRepository::new(pool.clone(), EntityKind::Group);
    let access = PostgresAccessRepository::new(pool, EntityKind::Group);

    let domain_id = DomainId::new();
    let parent = EntityId::new();
    let child = EntityId::new();
    for id in [parent, child] {
        let created = hierarchy.create_root(id, domain_id).await;
        assert!(created.is_ok());
    }
    let assigned = hierarchy.assign_parent(parent, &[child]).await;
    assert!(assigned.is_ok());

    seed_role(
        &roles,
        parent,
        "overseer",
        &["read", "subgroup_read"],
        "alice",
    )
    .await;
    // a role without cascading actions must not surface
    seed_role(&roles, child, "local", &["read"], "alice").await;

    let grants = access.member_cascading_roles(domain_id, "alice").await;
    assert!(grants.is_ok_and(|grants| {
        grants.len() == 1
            && grants[0].entity_path == parent.to_string()
            && grants[0].grant.role_name == "overseer"
    }));
}

#[tokio::test]
async fn domain_roles_resolve_against_the_domain_entity() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let roles = PostgresRoleRepository::new(pool.clone(), EntityKind::Domain);
    let access = PostgresAccessRepository::new(pool, EntityKind::Group);

    let domain_id = DomainId::new();
    let domain_entity = EntityId::from_uuid(domain_id.as_uuid());
    seed_role(
        &roles,
        domain_entity,
        "admin",
        &["group_read", "channel_read"],
        "alice",
    )
    .await;

    let grants = access.member_domain_roles(domain_id, "alice").await;
    assert!(grants.is_ok_and(|grants| {
        grants.len() == 1 && grants[0].actions == actions(&["channel_read", "group_read"])
    }));

    let stranger = access.member_domain_roles(domain_id, "mallory").await;
    assert!(stranger.is_ok_and(|grants| grants.is_empty()));
}
