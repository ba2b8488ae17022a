use std::sync::Arc;

use fleetgrid_core::{AppError, AppResult, EntityId};
use fleetgrid_domain::{Action, EntityKind};
use uuid::Uuid;

use crate::role_ports::{Role, RolePage, RoleProvision, RoleRepository};

mod actions;
mod members;

/// Per-entity-kind façade over role persistence.
///
/// Entity services hold one configured instance per kind and delegate all
/// role mutations to it. Side effects are confined to the role repository;
/// action and member changes never touch the policy store because only role
/// existence and ownership edges are mirrored there.
#[derive(Clone)]
pub struct RoleManager {
    kind: EntityKind,
    available_actions: Vec<Action>,
    repository: Arc<dyn RoleRepository>,
}

impl RoleManager {
    /// Creates a manager for one entity kind with its closed action catalog.
    #[must_use]
    pub fn new(
        kind: EntityKind,
        available_actions: Vec<Action>,
        repository: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            kind,
            available_actions,
            repository,
        }
    }

    /// Creates a manager using the kind's default action catalog.
    #[must_use]
    pub fn for_kind(kind: EntityKind, repository: Arc<dyn RoleRepository>) -> Self {
        Self::new(kind, kind.available_actions(), repository)
    }

    /// Returns the entity kind this manager serves.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Returns the closed set of actions valid for this entity kind.
    #[must_use]
    pub fn list_available_actions(&self) -> &[Action] {
        self.available_actions.as_slice()
    }

    /// Creates one role with its initial actions and members.
    pub async fn add_role(
        &self,
        entity_id: EntityId,
        actor_id: &str,
        name: &str,
        actions: Vec<Action>,
        members: Vec<String>,
    ) -> AppResult<Role> {
        self.require_entity_id(entity_id)?;
        if name.trim().is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }
        self.require_known_actions(actions.as_slice())?;

        let role = Role::new(entity_id, name, actor_id);
        let provision = RoleProvision {
            role: role.clone(),
            optional_actions: actions,
            optional_members: members,
        };

        self.repository.add_roles(&[provision]).await?;
        Ok(role)
    }

    /// Deletes one role and everything attached to it.
    pub async fn remove_role(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<()> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository.remove_role(entity_id, role_id).await
    }

    /// Renames a role; the new name must stay unique on the entity.
    pub async fn update_role_name(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actor_id: &str,
        new_name: &str,
    ) -> AppResult<Role> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        if new_name.trim().is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }

        self.repository
            .update_role_name(entity_id, role_id, actor_id, new_name)
            .await
    }

    /// Loads one role.
    pub async fn retrieve_role(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<Role> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository.retrieve_role(entity_id, role_id).await
    }

    /// Lists roles on an entity with offset pagination.
    pub async fn retrieve_all_roles(
        &self,
        entity_id: EntityId,
        limit: u64,
        offset: u64,
    ) -> AppResult<RolePage> {
        self.require_entity_id(entity_id)?;
        self.repository
            .retrieve_entity_roles(entity_id, limit, offset)
            .await
    }

    fn require_entity_id(&self, entity_id: EntityId) -> AppResult<()> {
        if entity_id.is_nil() {
            return Err(AppError::Validation(format!(
                "missing or empty {} entity id",
                self.kind
            )));
        }

        Ok(())
    }

    fn require_role_id(&self, role_id: Uuid) -> AppResult<()> {
        if role_id.is_nil() {
            return Err(AppError::Validation("missing or empty role id".to_owned()));
        }

        Ok(())
    }

    fn require_known_actions(&self, actions: &[Action]) -> AppResult<()> {
        for action in actions {
            if !self.available_actions.contains(action) {
                return Err(AppError::Validation(format!(
                    "action '{action}' is not available for kind '{}'",
                    self.kind
                )));
            }
        }

        Ok(())
    }
}
