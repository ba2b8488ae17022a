use super::*;

impl PostgresRoleRepository {
    pub(super) async fn add_role_actions_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<Vec<Action>> {
        self.require_role(entity_id, role_id).await?;

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        for action in actions {
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
            .bind(role_id)
            .bind(action.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to persist role actions: {error}"))
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.list_role_actions_impl(entity_id, role_id).await
    }

    pub(super) async fn list_role_actions_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
    ) -> AppResult<Vec<Action>> {
        self.require_role(entity_id, role_id).await?;

        let stored = sqlx::query_scalar::<_, String>(
            format!(
                r#"
                SELECT action
                FROM {actions}
                WHERE role_id = $1
                ORDER BY action
                "#,
                actions = self.actions_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list role actions: {error}")))?;

        stored.into_iter().map(Action::new).collect()
    }

    pub(super) async fn role_actions_exist_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<bool> {
        self.require_role(entity_id, role_id).await?;

        let tokens: Vec<String> = actions
            .iter()
            .map(|action| action.as_str().to_owned())
            .collect();

        let found = sqlx::query_scalar::<_, i64>(
            format!(
                r#"
                SELECT COUNT(DISTINCT action)
                FROM {actions}
                WHERE role_id = $1 AND action = ANY($2)
                "#,
                actions = self.actions_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .bind(tokens)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to check role actions: {error}")))?;

        Ok(u64::try_from(found).unwrap_or_default() == actions.len() as u64)
    }

    pub(super) async fn remove_role_actions_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<()> {
        self.require_role(entity_id, role_id).await?;

        let tokens: Vec<String> = actions
            .iter()
            .map(|action| action.as_str().to_owned())
            .collect();

        sqlx::query(
            format!(
                r#"
                DELETE FROM {actions}
                WHERE role_id = $1 AND action = ANY($2)
                "#,
                actions = self.actions_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .bind(tokens)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role actions: {error}")))?;

        Ok(())
    }

    pub(super) async fn remove_all_role_actions_impl(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
    ) -> AppResult<()> {
        self.require_role(entity_id, role_id).await?;

        sqlx::query(
            format!(
                r#"
                DELETE FROM {actions}
                WHERE role_id = $1
                "#,
                actions = self.actions_table()
            )
            .as_str(),
        )
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role actions: {error}")))?;

        Ok(())
    }
}
