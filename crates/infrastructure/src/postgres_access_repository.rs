use async_trait::async_trait;
use fleetgrid_application::{AccessRepository, CascadingRoleGrant, RoleGrant};
use fleetgrid_core::{AppError, AppResult, DomainId, EntityId};
use fleetgrid_domain::{Action, EntityKind};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[cfg(test)]
mod tests;

/// PostgreSQL-backed read model for effective-access resolution.
///
/// Direct grants come from the target kind's role tables; cascading grants
/// always come from the group tables joined against the hierarchy; domain
/// grants come from the domain role tables.
#[derive(Clone)]
pub struct PostgresAccessRepository {
    pool: PgPool,
    kind: EntityKind,
}

#[derive(Debug, FromRow)]
struct GrantRow {
    entity_id: Uuid,
    role_id: Uuid,
    role_name: String,
    action: Option<String>,
}

#[derive(Debug, FromRow)]
struct CascadingGrantRow {
    entity_path: String,
    entity_id: Uuid,
    role_id: Uuid,
    role_name: String,
    action: Option<String>,
}

fn fold_grants(rows: Vec<GrantRow>) -> AppResult<Vec<RoleGrant>> {
    let mut grants: Vec<RoleGrant> = Vec::new();

    for row in rows {
        let action = row.action.map(Action::new).transpose()?;
        match grants.iter_mut().find(|grant| grant.role_id == row.role_id) {
            Some(grant) => {
                if let Some(action) = action {
                    grant.actions.push(action);
                }
            }
            None => grants.push(RoleGrant {
                entity_id: EntityId::from_uuid(row.entity_id),
                role_id: row.role_id,
                role_name: row.role_name,
                actions: action.into_iter().collect(),
            }),
        }
    }

    Ok(grants)
}

impl PostgresAccessRepository {
    /// Creates a repository for one target entity kind.
    #[must_use]
    pub fn new(pool: PgPool, kind: EntityKind) -> Self {
        Self { pool, kind }
    }
}

#[async_trait]
impl AccessRepository for PostgresAccessRepository {
    async fn member_roles_on_entity(
        &self,
        entity_id: EntityId,
        member_id: &str,
    ) -> AppResult<Vec<RoleGrant>> {
        let prefix = self.kind.table_prefix();
        let rows = sqlx::query_as::<_, GrantRow>(
            format!(
                r#"
                SELECT
                    roles.entity_id,
                    roles.id AS role_id,
                    roles.name AS role_name,
                    role_actions.action
                FROM {prefix}roles AS roles
                JOIN {prefix}role_members AS role_members
                    ON role_members.role_id = roles.id
                LEFT JOIN {prefix}role_actions AS role_actions
                    ON role_actions.role_id = roles.id
                WHERE roles.entity_id = $1 AND role_members.member_id = $2
                ORDER BY roles.name, role_actions.action
                "#
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve direct roles: {error}")))?;

        fold_grants(rows)
    }

    async fn member_cascading_roles(
        &self,
        domain_id: DomainId,
        member_id: &str,
    ) -> AppResult<Vec<CascadingRoleGrant>> {
        let rows = sqlx::query_as::<_, CascadingGrantRow>(
            r#"
            SELECT
                groups.path AS entity_path,
                roles.entity_id,
                roles.id AS role_id,
                roles.name AS role_name,
                role_actions.action
            FROM groups_roles AS roles
            JOIN groups_role_members AS role_members
                ON role_members.role_id = roles.id
            JOIN groups
                ON groups.id = roles.entity_id
            LEFT JOIN groups_role_actions AS role_actions
                ON role_actions.role_id = roles.id
            WHERE groups.domain_id = $1 AND role_members.member_id = $2
            ORDER BY groups.path, roles.name, role_actions.action
            "#,
        )
        .bind(domain_id.as_uuid())
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve cascading roles: {error}"))
        })?;

        let mut grants: Vec<CascadingRoleGrant> = Vec::new();
        for row in rows {
            let action = row.action.map(Action::new).transpose()?;
            match grants
                .iter_mut()
                .find(|cascading| cascading.grant.role_id == row.role_id)
            {
                Some(cascading) => {
                    if let Some(action) = action {
                        cascading.grant.actions.push(action);
                    }
                }
                None => grants.push(CascadingRoleGrant {
                    entity_path: row.entity_path,
                    grant: RoleGrant {
                        entity_id: EntityId::from_uuid(row.entity_id),
                        role_id: row.role_id,
                        role_name: row.role_name,
                        actions: action.into_iter().collect(),
                    },
                }),
            }
        }

        grants.retain(|cascading| {
            cascading
                .grant
                .actions
                .iter()
                .any(Action::is_cascading)
        });

        Ok(grants)
    }

    async fn member_domain_roles(
        &self,
        domain_id: DomainId,
        member_id: &str,
    ) -> AppResult<Vec<RoleGrant>> {
        let rows = sqlx::query_as::<_, GrantRow>(
            r#"
            SELECT
                roles.entity_id,
                roles.id AS role_id,
                roles.name AS role_name,
                role_actions.action
            FROM domains_roles AS roles
            JOIN domains_role_members AS role_members
                ON role_members.role_id = roles.id
            LEFT JOIN domains_role_actions AS role_actions
                ON role_actions.role_id = roles.id
            WHERE roles.entity_id = $1 AND role_members.member_id = $2
            ORDER BY roles.name, role_actions.action
            "#,
        )
        .bind(domain_id.as_uuid())
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve domain roles: {error}")))?;

        fold_grants(rows)
    }
}
