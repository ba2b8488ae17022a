use async_trait::async_trait;
use fleetgrid_application::HierarchyRepository;
use fleetgrid_core::{AppError, AppResult, DomainId, EntityId};
use fleetgrid_domain::{
    path_ancestors, path_contains, validate_node_path, GroupNode, HierarchyDirection,
    HierarchyQuery, MAX_PATH_DEPTH,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;


/// PostgreSQL-backed store for the materialized-path group hierarchy.
///
/// Relocations run inside one transaction and rewrite a whole subtree with a
/// single range update over the path prefix, so concurrent readers never see
/// a half-moved subtree.
#[derive(Clone)]
pub struct PostgresHierarchyRepository {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct NodeRow {
    id: Uuid,
    domain_id: Uuid,
    parent_id: Option<Uuid>,
    path: String,
    level: i32,
}

impl From<NodeRow> for GroupNode {
    fn from(row: NodeRow) -> Self {
        Self {
            id: EntityId::from_uuid(row.id),
            parent_id: row.parent_id.map(EntityId::from_uuid),
            domain_id: DomainId::from_uuid(row.domain_id),
            path: row.path,
            level: row.level,
        }
    }
}

impl PostgresHierarchyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new root node; called when a group entity is created.
    pub async fn create_root(&self, id: EntityId, domain_id: DomainId) -> AppResult<GroupNode> {
        let node = GroupNode::root(id, domain_id);

        sqlx::query(
            r#"
            INSERT INTO groups (id, domain_id, parent_id, path, level)
            VALUES ($1, $2, NULL, $3, 0)
            "#,
        )
        .bind(node.id.as_uuid())
        .bind(node.domain_id.as_uuid())
        .bind(node.path.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!("group '{id}' already exists"));
            }

            AppError::Internal(format!("failed to create group node: {error}"))
        })?;

        Ok(node)
    }

    /// Deletes a node; its children become roots of their own subtrees via
    /// the foreign key, but their paths must be detached first.
    pub async fn remove_node(&self, id: EntityId) -> AppResult<()> {
        let deleted = sqlx::query(
            r#"
            DELETE FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete group node: {error}")))?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("group '{id}' was not found")));
        }

        Ok(())
    }

    async fn lock_node(
        transaction: &mut Transaction<'_, Postgres>,
        id: EntityId,
    ) -> AppResult<GroupNode> {
        let row = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT id, domain_id, parent_id, path, level
            FROM groups
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load group node: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("group '{id}' was not found")))?;

        Ok(row.into())
    }

    async fn subtree_max_level(
        transaction: &mut Transaction<'_, Postgres>,
        root_path: &str,
    ) -> AppResult<i32> {
        let max_level = sqlx::query_scalar::<_, Option<i32>>(
            r#"
            SELECT MAX(level)
            FROM groups
            WHERE path = $1 OR path LIKE $1 || '.%'
            "#,
        )
        .bind(root_path)
        .fetch_one(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to measure subtree: {error}")))?;

        Ok(max_level.unwrap_or_default())
    }

    async fn validate_child(
        transaction: &mut Transaction<'_, Postgres>,
        parent: &GroupNode,
        child_id: EntityId,
    ) -> AppResult<GroupNode> {
        let child = Self::lock_node(transaction, child_id).await?;

        if child.parent_id.is_some() {
            return Err(AppError::Conflict(format!(
                "group '{child_id}' already has a parent"
            )));
        }
        if child.domain_id != parent.domain_id {
            return Err(AppError::Conflict(format!(
                "group '{child_id}' belongs to a different domain than '{}'",
                parent.id
            )));
        }
        if path_contains(parent.path.as_str(), child_id) {
            return Err(AppError::Conflict(format!(
                "assigning group '{child_id}' under '{}' would create a cycle",
                parent.id
            )));
        }
        validate_node_path(child_id, child.path.as_str())
            .map_err(|error| AppError::MalformedEntity(error.to_string()))?;

        let subtree_depth = Self::subtree_max_level(transaction, child.path.as_str()).await?;
        let deepest = parent.level + 1 + subtree_depth;
        if deepest as usize >= MAX_PATH_DEPTH {
            return Err(AppError::Validation(format!(
                "relocation would exceed the maximum hierarchy depth of {MAX_PATH_DEPTH}"
            )));
        }

        Ok(child)
    }

    async fn relocate_subtree(
        transaction: &mut Transaction<'_, Postgres>,
        parent: &GroupNode,
        child: &GroupNode,
    ) -> AppResult<()> {
        // single range update relocates the whole subtree
        sqlx::query(
            r#"
            UPDATE groups
            SET path = $1 || '.' || path,
                level = level + $2
            WHERE path = $3 OR path LIKE $3 || '.%'
            "#,
        )
        .bind(parent.path.as_str())
        .bind(parent.level + 1)
        .bind(child.path.as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to relocate subtree: {error}")))?;

        Ok(())
    }

    async fn detach_child(
        transaction: &mut Transaction<'_, Postgres>,
        parent: &GroupNode,
        child_id: EntityId,
    ) -> AppResult<()> {
        let child = Self::lock_node(transaction, child_id).await?;

        // a concurrent re-parenting already moved this child elsewhere
        if child.parent_id != Some(parent.id) {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE groups
            SET parent_id = NULL
            WHERE id = $1
            "#,
        )
        .bind(child_id.as_uuid())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to clear parent: {error}")))?;

        sqlx::query(
            r#"
            UPDATE groups
            SET path = substr(path, length($1) + 2),
                level = level - $2
            WHERE path = $3 OR path LIKE $3 || '.%'
            "#,
        )
        .bind(parent.path.as_str())
        .bind(parent.level + 1)
        .bind(child.path.as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to relocate subtree: {error}")))?;

        Ok(())
    }
}

#[async_trait]
impl HierarchyRepository for PostgresHierarchyRepository {
    async fn retrieve_node(&self, id: EntityId) -> AppResult<GroupNode> {
        let row = sqlx::query_as::<_, NodeRow>(
            r#"
            SELECT id, domain_id, parent_id, path, level
            FROM groups
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load group node: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("group '{id}' was not found")))?;

        let node = GroupNode::from(row);
        validate_node_path(node.id, node.path.as_str())?;
        Ok(node)
    }

    async fn assign_parent(&self, parent_id: EntityId, child_ids: &[EntityId]) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let parent = Self::lock_node(&mut transaction, parent_id).await?;
        validate_node_path(parent.id, parent.path.as_str())
            .map_err(|error| AppError::MalformedEntity(error.to_string()))?;

        let mut children: Vec<GroupNode> = Vec::with_capacity(child_ids.len());
        for child_id in child_ids {
            if children.iter().any(|child| child.id == *child_id) {
                return Err(AppError::Conflict(format!(
                    "group '{child_id}' is listed more than once"
                )));
            }
            children.push(Self::validate_child(&mut transaction, &parent, *child_id).await?);
        }

        let child_uuids: Vec<Uuid> = children.iter().map(|child| child.id.as_uuid()).collect();
        sqlx::query(
            r#"
            UPDATE groups
            SET parent_id = $1
            WHERE id = ANY($2)
            "#,
        )
        .bind(parent.id.as_uuid())
        .bind(child_uuids.as_slice())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to set parents: {error}")))?;

        for child in &children {
            Self::relocate_subtree(&mut transaction, &parent, child).await?;
        }

        tracing::debug!(
            parent = %parent_id,
            children = child_ids.len(),
            "relocated subtrees under parent group"
        );

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn unassign_parent(&self, parent_id: EntityId, child_ids: &[EntityId]) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let parent = Self::lock_node(&mut transaction, parent_id).await?;
        validate_node_path(parent.id, parent.path.as_str())
            .map_err(|error| AppError::MalformedEntity(error.to_string()))?;

        for child_id in child_ids {
            Self::detach_child(&mut transaction, &parent, *child_id).await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn unassign_all_children(&self, parent_id: EntityId) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let parent = Self::lock_node(&mut transaction, parent_id).await?;
        validate_node_path(parent.id, parent.path.as_str())
            .map_err(|error| AppError::MalformedEntity(error.to_string()))?;

        let child_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM groups
            WHERE parent_id = $1
            FOR UPDATE
            "#,
        )
        .bind(parent_id.as_uuid())
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list children: {error}")))?;

        if child_ids.is_empty() {
            return Err(AppError::NotFound(format!(
                "group '{parent_id}' has no children"
            )));
        }

        for child_id in child_ids {
            Self::detach_child(&mut transaction, &parent, EntityId::from_uuid(child_id)).await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn retrieve_hierarchy(
        &self,
        id: EntityId,
        query: &HierarchyQuery,
    ) -> AppResult<Vec<GroupNode>> {
        let target = self.retrieve_node(id).await?;

        let rows = match query.direction {
            HierarchyDirection::Ancestors => {
                let chain = path_ancestors(target.path.as_str());
                sqlx::query_as::<_, NodeRow>(
                    r#"
                    SELECT id, domain_id, parent_id, path, level
                    FROM groups
                    WHERE path = ANY($1)
                        AND ($2 OR (($3 = 0 OR $5 - level >= $3) AND ($4 = 0 OR $5 - level < $4)))
                    ORDER BY level
                    "#,
                )
                .bind(chain)
                .bind(query.tree)
                .bind(query.start_level)
                .bind(query.end_level)
                .bind(target.level)
                .fetch_all(&self.pool)
                .await
            }
            HierarchyDirection::Descendants => {
                sqlx::query_as::<_, NodeRow>(
                    r#"
                    SELECT id, domain_id, parent_id, path, level
                    FROM groups
                    WHERE (path = $1 OR path LIKE $1 || '.%')
                        AND ($2 OR (($3 = 0 OR level - $5 >= $3) AND ($4 = 0 OR level - $5 < $4)))
                    ORDER BY level, path
                    "#,
                )
                .bind(target.path.as_str())
                .bind(query.tree)
                .bind(query.start_level)
                .bind(query.end_level)
                .bind(target.level)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|error| AppError::Internal(format!("failed to traverse hierarchy: {error}")))?;

        Ok(rows.into_iter().map(GroupNode::from).collect())
    }
}
