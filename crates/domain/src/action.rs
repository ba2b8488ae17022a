use std::fmt::{Display, Formatter};

use fleetgrid_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;

/// Prefix marking actions that cascade to descendant entities.
pub const CASCADE_ACTION_PREFIX: &str = "subgroup_";

/// Name of the administrator role auto-created for every new entity.
pub const BUILT_IN_ROLE_ADMIN: &str = "admin";

/// An opaque permission token held by a role.
///
/// Tokens follow two naming conventions the engine relies on: a
/// `subgroup_`-prefixed action also grants itself on every descendant of the
/// role's entity, and an action prefixed with an entity kind (for example
/// `group_read` on a domain role) applies to entities of that kind across
/// the whole domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    /// Creates a validated action token.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "action must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Creates an action from a catalog constant known to be non-empty.
    #[must_use]
    pub(crate) fn unchecked(value: &str) -> Self {
        Self(value.to_owned())
    }

    /// Returns the underlying token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether this action cascades to descendant entities.
    #[must_use]
    pub fn is_cascading(&self) -> bool {
        self.0.starts_with(CASCADE_ACTION_PREFIX)
    }

    /// Returns whether this domain-scoped action targets entities of `kind`.
    #[must_use]
    pub fn applies_to(&self, kind: EntityKind) -> bool {
        self.0.starts_with(kind.action_prefix())
    }
}

impl Display for Action {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<Action> for String {
    fn from(value: Action) -> Self {
        value.0
    }
}

/// A role name and action set auto-provisioned alongside every new entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltInRole {
    /// Reserved role name.
    pub name: String,
    /// Fixed action set granted to the role.
    pub actions: Vec<Action>,
}

#[cfg(test)]
mod tests {
    use super::Action;
    use crate::entity::EntityKind;

    #[test]
    fn empty_action_is_rejected() {
        assert!(Action::new("  ").is_err());
    }

    #[test]
    fn subgroup_prefix_marks_cascading() {
        let action = Action::new("subgroup_read").unwrap_or_else(|_| unreachable!());
        assert!(action.is_cascading());

        let plain = Action::new("read").unwrap_or_else(|_| unreachable!());
        assert!(!plain.is_cascading());
    }

    #[test]
    fn kind_prefix_scopes_domain_actions() {
        let action = Action::new("group_update").unwrap_or_else(|_| unreachable!());
        assert!(action.applies_to(EntityKind::Group));
        assert!(!action.applies_to(EntityKind::Channel));
    }
}
