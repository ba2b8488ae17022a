use std::fmt::{Display, Formatter};
use std::str::FromStr;

use fleetgrid_core::AppError;
use serde::{Deserialize, Serialize};

use crate::action::{Action, BuiltInRole, BUILT_IN_ROLE_ADMIN};

/// Entity kinds the role engine serves.
///
/// Every kind owns its own role tables through a fixed table prefix; the
/// closed action catalog and built-in roles are also keyed by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Tenant-level domain entity.
    Domain,
    /// Group-like entity participating in the hierarchy.
    Group,
    /// Messaging channel entity.
    Channel,
    /// Connected device or application client.
    Client,
    /// Platform user; appears only as a policy subject.
    User,
}

impl EntityKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Group => "group",
            Self::Channel => "channel",
            Self::Client => "client",
            Self::User => "user",
        }
    }

    /// Returns the role-table prefix for this kind.
    #[must_use]
    pub fn table_prefix(&self) -> &'static str {
        match self {
            Self::Domain => "domains_",
            Self::Group => "groups_",
            Self::Channel => "channels_",
            Self::Client => "clients_",
            Self::User => "users_",
        }
    }

    /// Returns the prefix marking domain-scoped actions that target this kind.
    #[must_use]
    pub fn action_prefix(&self) -> &'static str {
        match self {
            Self::Domain => "domain_",
            Self::Group => "group_",
            Self::Channel => "channel_",
            Self::Client => "client_",
            Self::User => "user_",
        }
    }

    /// Returns the closed set of actions valid for roles on this kind.
    #[must_use]
    pub fn available_actions(&self) -> Vec<Action> {
        let names: &[&str] = match self {
            Self::Domain => &[
                "read",
                "update",
                "delete",
                "enable",
                "disable",
                "manage_role",
                "add_role_users",
                "remove_role_users",
                "view_role_users",
                "group_create",
                "group_read",
                "group_update",
                "group_delete",
                "group_membership",
                "channel_create",
                "channel_read",
                "channel_update",
                "channel_delete",
                "channel_publish",
                "channel_subscribe",
                "client_create",
                "client_read",
                "client_update",
                "client_delete",
                "client_connect",
            ],
            Self::Group => &[
                "read",
                "update",
                "delete",
                "membership",
                "manage_role",
                "add_role_users",
                "remove_role_users",
                "view_role_users",
                "subgroup_create",
                "subgroup_read",
                "subgroup_update",
                "subgroup_delete",
                "subgroup_membership",
            ],
            Self::Channel => &[
                "read",
                "update",
                "delete",
                "publish",
                "subscribe",
                "manage_role",
                "add_role_users",
                "remove_role_users",
                "view_role_users",
            ],
            Self::Client => &[
                "read",
                "update",
                "delete",
                "connect",
                "manage_role",
                "add_role_users",
                "remove_role_users",
                "view_role_users",
            ],
            Self::User => &[],
        };

        names.iter().map(|name| Action::unchecked(*name)).collect()
    }

    /// Returns the built-in roles auto-created for every new entity of this
    /// kind. The administrator role holds the full action catalog.
    #[must_use]
    pub fn built_in_roles(&self) -> Vec<BuiltInRole> {
        if matches!(self, Self::User) {
            return Vec::new();
        }

        vec![BuiltInRole {
            name: BUILT_IN_ROLE_ADMIN.to_owned(),
            actions: self.available_actions(),
        }]
    }
}

impl Display for EntityKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "domain" => Ok(Self::Domain),
            "group" => Ok(Self::Group),
            "channel" => Ok(Self::Channel),
            "client" => Ok(Self::Client),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown entity kind '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::EntityKind;

    #[test]
    fn kind_round_trips_storage_value() {
        for kind in [
            EntityKind::Domain,
            EntityKind::Group,
            EntityKind::Channel,
            EntityKind::Client,
            EntityKind::User,
        ] {
            let restored = EntityKind::from_str(kind.as_str());
            assert_eq!(restored.ok(), Some(kind));
        }
    }

    #[test]
    fn group_catalog_contains_cascading_actions() {
        let actions = EntityKind::Group.available_actions();
        assert!(actions.iter().any(|action| action.is_cascading()));
    }

    #[test]
    fn domain_catalog_contains_group_scoped_actions() {
        let actions = EntityKind::Domain.available_actions();
        assert!(actions
            .iter()
            .any(|action| action.applies_to(EntityKind::Group)));
    }

    #[test]
    fn admin_role_holds_full_catalog() {
        let roles = EntityKind::Channel.built_in_roles();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].name, "admin");
        assert_eq!(
            roles[0].actions,
            EntityKind::Channel.available_actions()
        );
    }

    #[test]
    fn user_kind_has_no_built_in_roles() {
        assert!(EntityKind::User.built_in_roles().is_empty());
    }
}
