use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetgrid_core::{AppResult, EntityId};
use fleetgrid_domain::Action;
use uuid::Uuid;

/// A named, entity-scoped bundle of actions and members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    /// Stable role identifier.
    pub id: Uuid,
    /// Role name, unique within the owning entity.
    pub name: String,
    /// Entity the role is attached to.
    pub entity_id: EntityId,
    /// Principal that created the role.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Principal of the last rename, if any.
    pub updated_by: Option<String>,
    /// Timestamp of the last rename, if any.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Role {
    /// Synthesizes a new role with a generated id and a fresh timestamp.
    #[must_use]
    pub fn new(entity_id: EntityId, name: &str, created_by: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            entity_id,
            created_by: created_by.to_owned(),
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        }
    }
}

/// The unit of work for atomic provisioning: a role plus the actions and
/// members supplied at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleProvision {
    /// The role to persist.
    pub role: Role,
    /// Actions attached at creation time.
    pub optional_actions: Vec<Action>,
    /// Members attached at creation time.
    pub optional_members: Vec<String>,
}

/// One page of roles on an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePage {
    /// Roles in the page.
    pub roles: Vec<Role>,
    /// Total matching roles.
    pub total: u64,
    /// Page size requested.
    pub limit: u64,
    /// Page offset requested.
    pub offset: u64,
}

/// One page of member identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberPage {
    /// Members in the page.
    pub members: Vec<String>,
    /// Total matching members.
    pub total: u64,
    /// Page size requested.
    pub limit: u64,
    /// Page offset requested.
    pub offset: u64,
}

/// Relational persistence port for roles, actions, and members.
///
/// An implementation is scoped to one entity kind; the kind selects the
/// table prefix at construction time.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Persists a batch of role provisions atomically.
    async fn add_roles(&self, provisions: &[RoleProvision]) -> AppResult<()>;

    /// Deletes all roles, actions, and members for the given entities.
    async fn remove_roles_for_entities(&self, entity_ids: &[EntityId]) -> AppResult<()>;

    /// Loads one role on an entity.
    async fn retrieve_role(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<Role>;

    /// Lists roles on an entity with offset pagination.
    async fn retrieve_entity_roles(
        &self,
        entity_id: EntityId,
        limit: u64,
        offset: u64,
    ) -> AppResult<RolePage>;

    /// Renames a role, recording the acting principal.
    async fn update_role_name(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        updated_by: &str,
        new_name: &str,
    ) -> AppResult<Role>;

    /// Deletes one role and its actions and members.
    async fn remove_role(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<()>;

    /// Adds actions to a role, ignoring duplicates.
    async fn add_role_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<Vec<Action>>;

    /// Lists the actions held by a role.
    async fn list_role_actions(&self, entity_id: EntityId, role_id: Uuid)
        -> AppResult<Vec<Action>>;

    /// Returns whether the role holds every listed action.
    async fn role_actions_exist(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<bool>;

    /// Removes the listed actions from a role.
    async fn remove_role_actions(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        actions: &[Action],
    ) -> AppResult<()>;

    /// Removes every action from a role.
    async fn remove_all_role_actions(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<()>;

    /// Adds members to a role, ignoring duplicates.
    async fn add_role_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<Vec<String>>;

    /// Lists the members of a role with offset pagination.
    async fn list_role_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        limit: u64,
        offset: u64,
    ) -> AppResult<MemberPage>;

    /// Returns whether every listed member belongs to the role.
    async fn role_members_exist(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<bool>;

    /// Removes the listed members from a role.
    async fn remove_role_members(
        &self,
        entity_id: EntityId,
        role_id: Uuid,
        members: &[String],
    ) -> AppResult<()>;

    /// Removes every member from a role.
    async fn remove_all_role_members(&self, entity_id: EntityId, role_id: Uuid) -> AppResult<()>;

    /// Lists the distinct members across every role on an entity.
    async fn list_entity_members(
        &self,
        entity_id: EntityId,
        limit: u64,
        offset: u64,
    ) -> AppResult<MemberPage>;

    /// Removes the listed members from every role on an entity.
    async fn remove_entity_members(
        &self,
        entity_id: EntityId,
        members: &[String],
    ) -> AppResult<()>;

    /// Strips a principal from every role of this entity kind.
    async fn remove_member_from_all_roles(&self, member_id: &str) -> AppResult<()>;
}
