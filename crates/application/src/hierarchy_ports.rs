use async_trait::async_trait;
use fleetgrid_core::{AppResult, EntityId};
use fleetgrid_domain::{GroupNode, HierarchyQuery};

/// Relational persistence port for the group hierarchy.
///
/// Mutations are transactional: a reader never observes a half-relocated
/// subtree, and any step failure rolls the whole operation back.
#[async_trait]
pub trait HierarchyRepository: Send + Sync {
    /// Loads one hierarchy node.
    async fn retrieve_node(&self, id: EntityId) -> AppResult<GroupNode>;

    /// Makes `parent_id` the parent of every listed child, relocating each
    /// child's subtree under the parent's path.
    ///
    /// Fails with a conflict when a child already has a parent or when the
    /// assignment would close a cycle.
    async fn assign_parent(&self, parent_id: EntityId, child_ids: &[EntityId]) -> AppResult<()>;

    /// Detaches the listed children from `parent_id`, restoring each child's
    /// subtree to a root position. Children whose parent changed
    /// concurrently are left untouched.
    async fn unassign_parent(&self, parent_id: EntityId, child_ids: &[EntityId]) -> AppResult<()>;

    /// Detaches every direct child of `parent_id`; fails with not-found when
    /// the parent has no children.
    async fn unassign_all_children(&self, parent_id: EntityId) -> AppResult<()>;

    /// Returns ancestors or descendants of a node per the query.
    async fn retrieve_hierarchy(
        &self,
        id: EntityId,
        query: &HierarchyQuery,
    ) -> AppResult<Vec<GroupNode>>;
}
