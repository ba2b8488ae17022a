use super::*;

impl PostgresRoleRepository {
    pub(super) async fn add_role_members_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<Vec<String>> {
        self.require_role(entity_id, role_id).await?;

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        for member in members {
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
            .bind(role_id)
            .bind(member.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role members: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        sqlx::query_scalar::<_, String>(
            format!(
                r#"
                SELECT member_id
                FROM {members}
                WHERE role_id = $1
                ORDER BY member_id
                "#,
                members = self.members_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role members: {error}")))
    }

    pub(super) async fn list_role_members_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<MemberPage> {
        self.require_role(entity_id, role_id).await?;

        let total = sqlx::query_scalar::<_, i64>(
            format!(
                r#"
                SELECT COUNT(*)
                FROM {members}
                WHERE role_id = $1
                "#,
                members = self.members_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count role members: {error}")))?;

        let rows = sqlx::query_scalar::<_, String>(
            format!(
                r#"
                SELECT member_id
                FROM {members}
                WHERE role_id = $1
                ORDER BY member_id
                LIMIT $2 OFFSET $3
                "#,
                members = self.members_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role members: {error}")))?;

        Ok(MemberPage {
            members: rows,
            total: u64::try_from(total).unwrap_or_default(),
            limit,
            offset,
        })
    }

    pub(super) async fn role_members_exist_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<bool> {
        self.require_role(entity_id, role_id).await?;

        let found = sqlx::query_scalar::<_, i64>(
            format!(
                r#"
                SELECT COUNT(DISTINCT member_id)
                FROM {members}
                WHERE role_id = $1 AND member_id = ANY($2)
                "#,
                members = self.members_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .bind(members.to_vec())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check role members: {error}")))?;

        Ok(u64::try_from(found).unwrap_or_default() == members.len() as u64)
    }

    pub(super) async fn remove_role_members_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<()> {
        self.require_role(entity_id, role_id).await?;

        sqlx::query(
            format!(
                r#"
                DELETE FROM {members}
                WHERE role_id = $1 AND member_id = ANY($2)
                "#,
                members = self.members_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .bind(members.to_vec())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role members: {error}")))?;

        Ok(())
    }

    pub(super) async fn remove_all_role_members_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
    ) -> AppResult<()> {
        self.require_role(entity_id, role_id).await?;

        sqlx::query(
            format!(
                r#"
                DELETE FROM {members}
                WHERE role_id = $1
                "#,
                members = self.members_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role members: {error}")))?;

        Ok(())
    }

    pub(super) async fn list_entity_members_impl(
        &self,
        entity_id: EntityId,
        limit: u64,
        offset: u64,
    ) -> AppResult<MemberPage> {
        let total = sqlx::query_scalar::<_, i64>(
            format!(
                r#"
                SELECT COUNT(DISTINCT role_members.member_id)
                FROM {members} AS role_members
                JOIN {roles} AS roles ON roles.id = role_members.role_id
                WHERE roles.entity_id = $1
                "#,
                members = self.members_table(),
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count entity members: {error}")))?;

        let rows = sqlx::query_scalar::<_, String>(
            format!(
                r#"
                SELECT DISTINCT role_members.member_id
                FROM {members} AS role_members
                JOIN {roles} AS roles ON roles.id = role_members.role_id
                WHERE roles.entity_id = $1
                ORDER BY role_members.member_id
                LIMIT $2 OFFSET $3
                "#,
                members = self.members_table(),
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list entity members: {error}")))?;

        Ok(MemberPage {
            members: rows,
            total: u64::try_from(total).unwrap_or_default(),
            limit,
            offset,
        })
    }

    pub(super) async fn remove_entity_members_impl(
        &self,
        entity_id: EntityId,
        members: &[String],
    ) -> AppResult<()> {
        sqlx::query(
            format!(
                r#"
                DELETE FROM {members} AS role_members
                USING {roles} AS roles
                WHERE role_members.role_id = roles.id
                    AND roles.entity_id = $1
                    AND role_members.member_id = ANY($2)
                "#,
                members = self.members_table(),
                roles = self.roles_table()
            )
            .as_str(),
        )
        .bind(entity_id.as_uuid())
        .bind(members.to_vec())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete entity members: {error}")))?;

        Ok(())
    }

    pub(super) async fn remove_member_from_all_roles_impl(&self, member_id: &str) -> AppResult<()> {
        sqlx::query(
            format!(
                r#"
                DELETE FROM {members}
                WHERE member_id = $1
                "#,
                members = self.members_table()
            )
            .as_str(),
        )
        .bind(member_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete member roles: {error}")))?;

        Ok(())
    }
}
