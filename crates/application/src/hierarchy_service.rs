use std::sync::Arc;

use fleetgrid_core::{AppError, AppResult, DomainId, EntityId};
use fleetgrid_domain::{GroupNode, HierarchyQuery, Policy};

use crate::hierarchy_ports::HierarchyRepository;
use crate::policy_ports::PolicyStore;

/// Coordinates hierarchy edges between the relational store and the policy
/// store.
///
/// Assignments mirror each parent/child edge as a `parent_group` tuple so
/// that cascading grants can be resolved by the policy backend as well. Like
/// role provisioning, edge creation writes tuples first and compensates on
/// relational failure.
#[derive(Clone)]
pub struct HierarchyService {
    repository: Arc<dyn HierarchyRepository>,
    policy_store: Arc<dyn PolicyStore>,
}

impl HierarchyService {
    /// Creates the service over its two ports.
    #[must_use]
    pub fn new(
        repository: Arc<dyn HierarchyRepository>,
        policy_store: Arc<dyn PolicyStore>,
    ) -> Self {
        Self {
            repository,
            policy_store,
        }
    }

    /// Loads one hierarchy node.
    pub async fn retrieve_node(&self, id: EntityId) -> AppResult<GroupNode> {
        require_id(id, "group")?;
        self.repository.retrieve_node(id).await
    }

    /// Makes `parent_id` the parent of every listed child group.
    ///
    /// Each child must currently be a root; re-parenting requires an explicit
    /// unassign first. The relocation is rejected when it would close a cycle
    /// or exceed the depth bound.
    pub async fn assign_parent_group(
        &self,
        domain_id: DomainId,
        parent_id: EntityId,
        child_ids: &[EntityId],
    ) -> AppResult<()> {
        require_id(parent_id, "parent group")?;
        require_children(parent_id, child_ids)?;

        let policies: Vec<Policy> = child_ids
            .iter()
            .map(|child_id| Policy::group_parent(domain_id, parent_id, *child_id))
            .collect();

        self.policy_store
            .add_policies(policies.as_slice())
            .await
            .map_err(|error| AppError::AddPolicies(error.to_string()))?;

        if let Err(original) = self.repository.assign_parent(parent_id, child_ids).await {
            if let Err(rollback) = self.policy_store.delete_policies(policies.as_slice()).await {
                tracing::warn!(
                    %domain_id,
                    parent = %parent_id,
                    error = %rollback,
                    "failed to roll back parent-group tuples after relational failure"
                );
                return Err(AppError::rollback_failed(original, rollback));
            }

            return Err(original);
        }

        Ok(())
    }

    /// Detaches the listed children from `parent_id` and retracts the
    /// mirrored tuples.
    ///
    /// The relational detach commits first; tuple retraction failures surface
    /// as delete-policies errors without undoing the detach.
    pub async fn unassign_parent_group(
        &self,
        domain_id: DomainId,
        parent_id: EntityId,
        child_ids: &[EntityId],
    ) -> AppResult<()> {
        require_id(parent_id, "parent group")?;
        require_children(parent_id, child_ids)?;

        self.repository.unassign_parent(parent_id, child_ids).await?;

        let policies: Vec<Policy> = child_ids
            .iter()
            .map(|child_id| Policy::group_parent(domain_id, parent_id, *child_id))
            .collect();

        self.policy_store
            .delete_policies(policies.as_slice())
            .await
            .map_err(|error| AppError::DeletePolicies(error.to_string()))
    }

    /// Detaches every direct child of `parent_id` and retracts all of the
    /// parent's `parent_group` tuples in one filtered deletion.
    pub async fn unassign_all_children(
        &self,
        domain_id: DomainId,
        parent_id: EntityId,
    ) -> AppResult<()> {
        require_id(parent_id, "parent group")?;

        self.repository.unassign_all_children(parent_id).await?;

        let filter = Policy::group_parent_filter(domain_id, parent_id);
        self.policy_store
            .delete_policy_filter(&filter)
            .await
            .map_err(|error| AppError::DeletePolicies(error.to_string()))
    }

    /// Returns ancestors or descendants of a node per the query.
    pub async fn retrieve_hierarchy(
        &self,
        id: EntityId,
        query: &HierarchyQuery,
    ) -> AppResult<Vec<GroupNode>> {
        require_id(id, "group")?;
        query.validate()?;
        self.repository.retrieve_hierarchy(id, query).await
    }
}

fn require_id(id: EntityId, what: &str) -> AppResult<()> {
    if id.is_nil() {
        return Err(AppError::Validation(format!("missing or empty {what} id")));
    }

    Ok(())
}

fn require_children(parent_id: EntityId, child_ids: &[EntityId]) -> AppResult<()> {
    if child_ids.is_empty() {
        return Err(AppError::Validation(
            "at least one child group id is required".to_owned(),
        ));
    }

    for child_id in child_ids {
        require_id(*child_id, "child group")?;
        if *child_id == parent_id {
            return Err(AppError::Conflict(format!(
                "group '{parent_id}' cannot be its own parent"
            )));
        }
    }

    Ok(())
}
