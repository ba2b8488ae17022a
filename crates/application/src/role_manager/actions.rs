use super::*;

impl RoleManager {
    /// Adds actions to a role after validating them against the catalog.
    pub async fn role_add_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: Vec<Action>,
    ) -> AppResult<Vec<Action>> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.require_known_actions(actions.as_slice())?;

        self.repository
            .add_role_actions(entity_id, role_id, actions.as_slice())
            .await
    }

    /// Lists the actions a role currently holds.
    pub async fn role_list_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
    ) -> AppResult<Vec<Action>> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository.list_role_actions(entity_id, role_id).await
    }

    /// Returns whether the role holds every listed action.
    pub async fn role_check_actions_exist(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<bool> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository
            .role_actions_exist(entity_id, role_id, actions)
            .await
    }

    /// Removes the listed actions from a role.
    pub async fn role_remove_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<()> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository
            .remove_role_actions(entity_id, role_id, actions)
            .await
    }

    /// Removes every action from a role.
    pub async fn role_remove_all_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
    ) -> AppResult<()> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository
            .remove_all_role_actions(entity_id, role_id)
            .await
    }
}
