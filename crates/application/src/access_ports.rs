use async_trait::async_trait;
use fleetgrid_core::{AppResult, DomainId, EntityId};
use fleetgrid_domain::Action;
use uuid::Uuid;

/// A role a principal holds, with the entity that owns the role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGrant {
    /// Entity the role is attached to.
    pub entity_id: EntityId,
    /// Role identifier.
    pub role_id: Uuid,
    /// Role name.
    pub role_name: String,
    /// Full action set of the role.
    pub actions: Vec<Action>,
}

/// A cascading role grant, paired with the owning entity's materialized
/// path so descendants can be matched by prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadingRoleGrant {
    /// Materialized path of the role's owning entity.
    pub entity_path: String,
    /// The grant itself.
    pub grant: RoleGrant,
}

/// Read-only port for the bulk role/action/member joins the access
/// resolver runs.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// Roles on one entity where the principal is a member.
    async fn member_roles_on_entity(
        &self,
        entity_id: EntityId,
        member_id: &str,
    ) -> AppResult<Vec<RoleGrant>>;

    /// The principal's roles anywhere in the domain whose action set holds
    /// at least one cascading action.
    async fn member_cascading_roles(
        &self,
        domain_id: DomainId,
        member_id: &str,
    ) -> AppResult<Vec<CascadingRoleGrant>>;

    /// Roles on the domain entity itself where the principal is a member.
    async fn member_domain_roles(
        &self,
        domain_id: DomainId,
        member_id: &str,
    ) -> AppResult<Vec<RoleGrant>>;
}
