use super::*;

use crate::role_ports::MemberPage;

impl RoleManager {
    /// Adds members to a role.
    pub async fn role_add_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: Vec<String>,
    ) -> AppResult<Vec<String>> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        if members.iter().any(|member| member.trim().is_empty()) {
            return Err(AppError::Validation(
                "member id must not be empty".to_owned(),
            ));
        }

        self.repository
            .add_role_members(entity_id, role_id, members.as_slice())
            .await
    }

    /// Lists the members of a role with offset pagination.
    pub async fn role_list_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<MemberPage> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository
            .list_role_members(entity_id, role_id, limit, offset)
            .await
    }

    /// Returns whether every listed member belongs to the role.
    pub async fn role_check_members_exist(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<bool> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository
            .role_members_exist(entity_id, role_id, members)
            .await
    }

    /// Removes the listed members from a role.
    pub async fn role_remove_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<()> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository
            .remove_role_members(entity_id, role_id, members)
            .await
    }

    /// Removes every member from a role.
    pub async fn role_remove_all_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
    ) -> AppResult<()> {
        self.require_entity_id(entity_id)?;
        self.require_role_id(role_id)?;
        self.repository
            .remove_all_role_members(entity_id, role_id)
            .await
    }

    /// Lists the distinct members across every role on an entity.
    pub async fn list_entity_members(
        &self,
        entity_id: EntityId,
        limit: u64,
        offset: u64,
    ) -> AppResult<MemberPage> {
        self.require_entity_id(entity_id)?;
        self.repository
            .list_entity_members(entity_id, limit, offset)
            .await
    }

    /// Removes the listed members from every role on an entity.
    pub async fn remove_entity_members(
        &self,
        entity_id: EntityId,
        members: &[String],
    ) -> AppResult<()> {
        self.require_entity_id(entity_id)?;
        self.repository
            .remove_entity_members(entity_id, members)
            .await
    }

    /// Strips a principal from every role of this entity kind; used when
    /// the principal itself is deleted.
    pub async fn remove_member_from_all_roles(&self, member_id: &str) -> AppResult<()> {
        if member_id.trim().is_empty() {
            return Err(AppError::Validation(
                "member id must not be empty".to_owned(),
            ));
        }

        self.repository.remove_member_from_all_roles(member_id).await
    }
}
