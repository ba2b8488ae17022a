use std::collections::HashSet;
use std::sync::Arc;

use fleetgrid_core::{AppError, AppResult, DomainId, EntityId};
use fleetgrid_domain::{is_descendant_path, AccessType, Action, EntityKind, GroupNode};

use crate::access_ports::{AccessRepository, RoleGrant};
use crate::hierarchy_ports::HierarchyRepository;

/// One effective grant a principal holds on an entity, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityAccess {
    /// Entity owning the granting role.
    pub entity_id: EntityId,
    /// Granting role.
    pub role_id: uuid::Uuid,
    /// Granting role's name.
    pub role_name: String,
    /// Actions conveyed onto the target entity.
    pub actions: Vec<Action>,
    /// How the grant reaches the target.
    pub access_type: AccessType,
}

/// Read-time resolver of a principal's effective access on one entity.
///
/// Effective access is the union of three sources: roles directly on the
/// entity, cascading roles on hierarchy ancestors, and domain roles whose
/// actions are prefixed with the target's kind. Each (entity, role) pair
/// appears at most once, with direct grants winning over inherited ones and
/// inherited over domain-wide.
#[derive(Clone)]
pub struct AccessResolver {
    target_kind: EntityKind,
    access_repository: Arc<dyn AccessRepository>,
    hierarchy_repository: Arc<dyn HierarchyRepository>,
}

impl AccessResolver {
    /// Creates a resolver for one target entity kind.
    #[must_use]
    pub fn new(
        target_kind: EntityKind,
        access_repository: Arc<dyn AccessRepository>,
        hierarchy_repository: Arc<dyn HierarchyRepository>,
    ) -> Self {
        Self {
            target_kind,
            access_repository,
            hierarchy_repository,
        }
    }

    /// Resolves every role through which `member_id` can act on `entity_id`.
    pub async fn effective_entity_access(
        &self,
        domain_id: DomainId,
        member_id: &str,
        entity_id: EntityId,
    ) -> AppResult<Vec<EntityAccess>> {
        if member_id.trim().is_empty() {
            return Err(AppError::Validation("missing member id".to_owned()));
        }
        if entity_id.is_nil() {
            return Err(AppError::Validation(format!(
                "missing or empty {} entity id",
                self.target_kind
            )));
        }

        let mut seen: HashSet<(EntityId, uuid::Uuid)> = HashSet::new();
        let mut accesses = Vec::new();

        let direct = self
            .access_repository
            .member_roles_on_entity(entity_id, member_id)
            .await?;
        for grant in direct {
            if seen.insert((grant.entity_id, grant.role_id)) {
                accesses.push(EntityAccess {
                    entity_id: grant.entity_id,
                    role_id: grant.role_id,
                    role_name: grant.role_name,
                    actions: grant.actions,
                    access_type: AccessType::Direct,
                });
            }
        }

        self.collect_inherited(domain_id, member_id, entity_id, &mut seen, &mut accesses)
            .await?;

        let domain_grants = self
            .access_repository
            .member_domain_roles(domain_id, member_id)
            .await?;
        let kind_prefix = self.target_kind.action_prefix();
        for grant in domain_grants {
            let scoped: Vec<Action> = grant
                .actions
                .into_iter()
                .filter(|action| action.as_str().starts_with(kind_prefix))
                .collect();
            if scoped.is_empty() {
                continue;
            }
            if seen.insert((grant.entity_id, grant.role_id)) {
                accesses.push(EntityAccess {
                    entity_id: grant.entity_id,
                    role_id: grant.role_id,
                    role_name: grant.role_name,
                    actions: scoped,
                    access_type: AccessType::Domain,
                });
            }
        }

        Ok(accesses)
    }

    /// Adds grants inherited from hierarchy ancestors via cascading actions.
    ///
    /// Entities outside the hierarchy inherit nothing, so a missing node is
    /// not an error here.
    async fn collect_inherited(
        &self,
        domain_id: DomainId,
        member_id: &str,
        entity_id: EntityId,
        seen: &mut HashSet<(EntityId, uuid::Uuid)>,
        accesses: &mut Vec<EntityAccess>,
    ) -> AppResult<()> {
        let node = match self.hierarchy_repository.retrieve_node(entity_id).await {
            Ok(node) => node,
            Err(AppError::NotFound(_)) => return Ok(()),
            Err(error) => return Err(error),
        };

        let cascading = self
            .access_repository
            .member_cascading_roles(domain_id, member_id)
            .await?;

        for cascading_grant in cascading {
            if !is_descendant_path(node.path.as_str(), cascading_grant.entity_path.as_str()) {
                continue;
            }

            let RoleGrant {
                entity_id,
                role_id,
                role_name,
                actions,
            } = cascading_grant.grant;
            let actions: Vec<Action> = actions.into_iter().filter(Action::is_cascading).collect();
            if actions.is_empty() {
                continue;
            }

            if seen.insert((entity_id, role_id)) {
                let access_type = if node.parent_id == Some(entity_id) {
                    AccessType::DirectGroup
                } else {
                    AccessType::IndirectGroup
                };
                accesses.push(EntityAccess {
                    entity_id,
                    role_id,
                    role_name,
                    actions,
                    access_type,
                });
            }
        }

        Ok(())
    }
}

/// Masks identifying fields of hierarchy nodes the caller cannot view.
///
/// Listings keep their shape: every row survives with its path and level so
/// the tree renders intact, but a masked row carries a nil id and no parent.
#[must_use]
pub fn mask_inaccessible(nodes: Vec<GroupNode>, accessible: &HashSet<EntityId>) -> Vec<GroupNode> {
    nodes
        .into_iter()
        .map(|mut node| {
            if !accessible.contains(&node.id) {
                node.id = EntityId::nil();
                node.parent_id = None;
            }
            node
        })
        .collect()
}
