use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetgrid_application::{
    MemberPage, Role, RolePage, RoleProvision, RoleRepository,
};
use fleetgrid_core::{AppError, AppResult, EntityId};
use fleetgrid_domain::{Action, EntityKind};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

mod actions;
mod members;

/// PostgreSQL-backed role repository scoped to one entity kind.
///
/// The kind selects the table prefix; kinds form a closed set, so the
/// interpolated table names never carry user input.
#[derive(Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
    kind: EntityKind,
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    entity_id: Uuid,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_by: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            entity_id: EntityId::from_uuid(row.entity_id),
            created_by: row.created_by,
            created_at: row.created_at,
            updated_by: row.updated_by,
            updated_at: row.updated_at,
        }
    }
}

impl PostgresRoleRepository {
    /// Creates a repository over the provided pool for one entity kind.
    #[must_use]
    pub fn new(pool: PgPool, kind: EntityKind) -> Self {
        Self { pool, kind }
    }

    fn roles_table(&self) -> String {
        format!("{}roles", self.kind.table_prefix())
    }

    fn actions_table(&self) -> String {
        format!("{}role_actions", self.kind.table_prefix())
    }

    fn members_table(&self) -> String {
        format!("{}role_members", self.kind.table_prefix())
    }

    pub(crate) async fn require_role(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            format!(
                r#"
                SELECT EXISTS (
                    SELECT 1
                    FROM {roles}
                    WHERE id = $1 AND entity_id = $2
                )
                "#,
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .bind(entity_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?;

        if !exists {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found on {} '{entity_id}'",
                self.kind
            )));
        }

        Ok(())
    }

    fn map_name_conflict(&self, error: sqlx::Error, name: &str, entity_id: EntityId) -> AppError {
        if let sqlx::Error::Database(database_error) = &error
            && database_error.code().as_deref() == Some("23505")
        {
            return AppError::Conflict(format!(
                "role '{name}' already exists on {} '{entity_id}'",
                self.kind
            ));
        }

        AppError::Internal(format!("failed to persist role: {error}"))
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn add_roles(&self, provisions: &[RoleProvision]) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        for provision in provisions {
            let role = &provision.role;
            sqlx::query(
                format!(
                    r#"
                    INSERT INTO {roles} (id, name, entity_id, created_by, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                    roles = self.roles_table()
                )
                .as_str(),
            )
            .bind(role.id)
            .bind(role.name.as_str())
            .bind(role.entity_id.as_uuid())
            .bind(role.created_by.as_str())
            .bind(role.created_at)
            .execute(&mut *transaction)
            .await
            .map_err(|error| self.map_name_conflict(error, role.name.as_str(), role.entity_id))?;

            for action in &provision.optional_actions {
                sqlx::query(
                    format!(
                        r#"
                        INSERT INTO {actions} (role_id, action)
                        VALUES ($1, $2)
                        ON CONFLICT (role_id, action) DO NOTHING
                        "#,
                        actions = self.actions_table()
                    )
                    .as_str(),
                )
                .bind(role.id)
                .bind(action.as_str())
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to persist role actions: {error}"))
                })?;
            }

            for member in &provision.optional_members {
                sqlx::query(
                    format!(
                        r#"
                        INSERT INTO {members} (role_id, member_id)
                        VALUES ($1, $2)
                        ON CONFLICT (role_id, member_id) DO NOTHING
                        "#,
                        members = self.members_table()
                    )
                    .as_str(),
                )
                .bind(role.id)
                .bind(member.as_str())
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to persist role members: {error}"))
                })?;
            }
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn remove_roles_for_entities(&self, entity_ids: &[EntityId]) -> AppResult<()> {
        let ids: Vec<Uuid> = entity_ids.iter().map(EntityId::as_uuid).collect();

        sqlx::query(
            format!(
                r#"
                DELETE FROM {roles}
                WHERE entity_id = ANY($1)
                "#,
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(ids)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete entity roles: {error}")))?;

        Ok(())
    }

    async fn retrieve_role(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            format!(
                r#"
                SELECT id, name, entity_id, created_by, created_at, updated_by, updated_at
                FROM {roles}
                WHERE entity_id = $1 AND id = $2
                "#,
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .bind(role_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "role '{role_id}' was not found on {} '{entity_id}'",
                self.kind
            ))
        })?;

        Ok(row.into())
    }

    async fn retrieve_entity_roles(
        &self,
        entity_id: EntityId,
        limit: u64,
        offset: u64,
    ) -> AppResult<RolePage> {
        let total = sqlx::query_scalar::<_, i64>(
            format!(
                r#"
                SELECT COUNT(*)
                FROM {roles}
                WHERE entity_id = $1
                "#,
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count entity roles: {error}")))?;

        let rows = sqlx::query_as::<_, RoleRow>(
            format!(
                r#"
                SELECT id, name, entity_id, created_by, created_at, updated_by, updated_at
                FROM {roles}
                WHERE entity_id = $1
                ORDER BY name
                LIMIT $2 OFFSET $3
                "#,
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list entity roles: {error}")))?;

        Ok(RolePage {
            roles: rows.into_iter().map(Role::from).collect(),
            total: u64::try_from(total).unwrap_or_default(),
            limit,
            offset,
        })
    }

    async fn update_role_name(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        updated_by: &str,
        new_name: &str,
    ) -> AppResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            format!(
                r#"
                UPDATE {roles}
                SET name = $3, updated_by = $4, updated_at = now()
                WHERE entity_id = $1 AND id = $2
                RETURNING id, name, entity_id, created_by, created_at, updated_by, updated_at
                "#,
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .bind(role_id)
        .bind(new_name)
        .bind(updated_by)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| self.map_name_conflict(error, new_name, entity_id))?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "role '{role_id}' was not found on {} '{entity_id}'",
                self.kind
            ))
        })?;

        Ok(row.into())
    }

    async fn remove_role(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<()> {
        let deleted = sqlx::query(
            format!(
                r#"
                DELETE FROM {roles}
                WHERE entity_id = $1 AND id = $2
                "#,
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' was not found on {} '{entity_id}'",
                self.kind
            )));
        }

        Ok(())
    }

    async fn add_role_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<Vec<Action>> {
        self.add_role_actions_impl(entity_id, role_id, actions).await
    }

    async fn list_role_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
    ) -> AppResult<Vec<Action>> {
        self.list_role_actions_impl(entity_id, role_id).await
    }

    async fn role_actions_exist(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<bool> {
        self.role_actions_exist_impl(entity_id, role_id, actions).await
    }

    async fn remove_role_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<()> {
        self.remove_role_actions_impl(entity_id, role_id, actions).await
    }

    async fn remove_all_role_actions(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<()> {
        self.remove_all_role_actions_impl(entity_id, role_id).await
    }

    async fn add_role_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<Vec<String>> {
        self.add_role_members_impl(entity_id, role_id, members).await
    }

    async fn list_role_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<MemberPage> {
        self.list_role_members_impl(entity_id, role_id, limit, offset)
            .await
    }

    async fn role_members_exist(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<bool> {
        self.role_members_exist_impl(entity_id, role_id, members).await
    }

    async fn remove_role_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<()> {
        self.remove_role_members_impl(entity_id, role_id, members).await
    }

    async fn remove_all_role_members(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<()> {
        self.remove_all_role_members_impl(entity_id, role_id).await
    }

    async fn list_entity_members(
        &self,
        entity_id: EntityId,
        limit: u64,
        offset: u64,
    ) -> AppResult<MemberPage> {
        self.list_entity_members_impl(entity_id, limit, offset).await
    }

    async fn remove_entity_members(
        &self,
        entity_id: EntityId,
        members: &[String],
    ) -> AppResult<()> {
        self.remove_entity_members_impl(entity_id, members).await
    }

    async fn remove_member_from_all_roles(&self, member_id: &str) -> AppResult<()> {
        self.remove_member_from_all_roles_impl(member_id).await
    }
}
