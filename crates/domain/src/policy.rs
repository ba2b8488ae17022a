use fleetgrid_core::{DomainId, EntityId};
use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;

/// Subject type for user principals.
pub const SUBJECT_TYPE_USER: &str = "user";
/// Subject type for role-scoped grants.
pub const SUBJECT_TYPE_ROLE: &str = "role";
/// Subject type for group entities acting as parents.
pub const SUBJECT_TYPE_GROUP: &str = "group";

/// Relation linking a member to a role.
pub const RELATION_MEMBER: &str = "member";
/// Relation linking a parent group to a child entity.
pub const RELATION_PARENT_GROUP: &str = "parent_group";
/// Relation linking a domain to an entity it owns.
pub const RELATION_DOMAIN: &str = "domain";

/// Object type for domain entities.
pub const OBJECT_TYPE_DOMAIN: &str = "domain";
/// Object type for group entities.
pub const OBJECT_TYPE_GROUP: &str = "group";
/// Object type for channel entities.
pub const OBJECT_TYPE_CHANNEL: &str = "channel";
/// Object type for client entities.
pub const OBJECT_TYPE_CLIENT: &str = "client";

/// A relationship tuple mirrored into the external policy store.
///
/// Empty string fields act as wildcards when the tuple is used as a filter
/// for pattern-match deletion or object listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Domain scoping the fact; empty for unscoped tuples.
    #[serde(default)]
    pub domain: String,
    /// Type of the subject (`user`, `role`, `group`).
    #[serde(default)]
    pub subject_type: String,
    /// Subject identifier.
    #[serde(default)]
    pub subject: String,
    /// Relation between subject and object.
    #[serde(default)]
    pub relation: String,
    /// Type of the object.
    #[serde(default)]
    pub object_type: String,
    /// Optional refinement of the object type (for example a group kind).
    #[serde(default)]
    pub object_kind: String,
    /// Object identifier.
    #[serde(default)]
    pub object: String,
}

impl Policy {
    /// Builds the tuple granting `member_id` membership of a role on an entity.
    #[must_use]
    pub fn role_member(
        domain_id: DomainId,
        role_id: &str,
        member_id: &str,
        kind: EntityKind,
        entity_id: EntityId,
    ) -> Self {
        Self {
            domain: domain_id.to_string(),
            subject_type: SUBJECT_TYPE_USER.to_owned(),
            subject: member_id.to_owned(),
            relation: RELATION_MEMBER.to_owned(),
            object_type: SUBJECT_TYPE_ROLE.to_owned(),
            object_kind: kind.as_str().to_owned(),
            object: format!("{entity_id}_{role_id}"),
        }
    }

    /// Builds the tuple recording that a domain owns an entity.
    #[must_use]
    pub fn domain_owns(domain_id: DomainId, kind: EntityKind, entity_id: EntityId) -> Self {
        Self {
            domain: domain_id.to_string(),
            subject_type: OBJECT_TYPE_DOMAIN.to_owned(),
            subject: domain_id.to_string(),
            relation: RELATION_DOMAIN.to_owned(),
            object_type: kind.as_str().to_owned(),
            object_kind: String::new(),
            object: entity_id.to_string(),
        }
    }

    /// Builds the tuple recording a parent/child hierarchy edge.
    #[must_use]
    pub fn group_parent(domain_id: DomainId, parent_id: EntityId, child_id: EntityId) -> Self {
        Self {
            domain: domain_id.to_string(),
            subject_type: SUBJECT_TYPE_GROUP.to_owned(),
            subject: parent_id.to_string(),
            relation: RELATION_PARENT_GROUP.to_owned(),
            object_type: OBJECT_TYPE_GROUP.to_owned(),
            object_kind: String::new(),
            object: child_id.to_string(),
        }
    }

    /// Builds a filter matching every `parent_group` edge below a parent.
    #[must_use]
    pub fn group_parent_filter(domain_id: DomainId, parent_id: EntityId) -> Self {
        Self {
            domain: domain_id.to_string(),
            subject_type: SUBJECT_TYPE_GROUP.to_owned(),
            subject: parent_id.to_string(),
            relation: RELATION_PARENT_GROUP.to_owned(),
            object_type: OBJECT_TYPE_GROUP.to_owned(),
            object_kind: String::new(),
            object: String::new(),
        }
    }

    /// Builds a filter matching every tuple where the entity is the subject.
    #[must_use]
    pub fn subject_filter(kind: EntityKind, entity_id: EntityId) -> Self {
        Self {
            subject_type: kind.as_str().to_owned(),
            subject: entity_id.to_string(),
            ..Self::default()
        }
    }

    /// Builds a filter matching every tuple where the entity is the object.
    #[must_use]
    pub fn object_filter(kind: EntityKind, entity_id: EntityId) -> Self {
        Self {
            object_type: kind.as_str().to_owned(),
            object: entity_id.to_string(),
            ..Self::default()
        }
    }

    /// Returns whether `other` matches this tuple treated as a filter, with
    /// empty fields acting as wildcards.
    #[must_use]
    pub fn matches(&self, other: &Policy) -> bool {
        fn field_matches(filter: &str, value: &str) -> bool {
            filter.is_empty() || filter == value
        }

        field_matches(&self.domain, &other.domain)
            && field_matches(&self.subject_type, &other.subject_type)
            && field_matches(&self.subject, &other.subject)
            && field_matches(&self.relation, &other.relation)
            && field_matches(&self.object_type, &other.object_type)
            && field_matches(&self.object_kind, &other.object_kind)
            && field_matches(&self.object, &other.object)
    }
}

#[cfg(test)]
mod tests {
    use fleetgrid_core::{DomainId, EntityId};

    use super::Policy;
    use crate::entity::EntityKind;

    #[test]
    fn empty_filter_fields_act_as_wildcards() {
        let domain_id = DomainId::new();
        let parent = EntityId::new();
        let child = EntityId::new();

        let edge = Policy::group_parent(domain_id, parent, child);
        let filter = Policy::group_parent_filter(domain_id, parent);

        assert!(filter.matches(&edge));
    }

    #[test]
    fn filter_rejects_other_subjects() {
        let domain_id = DomainId::new();
        let edge = Policy::group_parent(domain_id, EntityId::new(), EntityId::new());
        let filter = Policy::group_parent_filter(domain_id, EntityId::new());

        assert!(!filter.matches(&edge));
    }

    #[test]
    fn role_member_tuple_names_entity_and_role() {
        let entity_id = EntityId::new();
        let tuple = Policy::role_member(
            DomainId::new(),
            "11111111-1111-1111-1111-111111111111",
            "alice",
            EntityKind::Group,
            entity_id,
        );

        assert_eq!(tuple.subject, "alice");
        assert!(tuple.object.starts_with(&entity_id.to_string()));
        assert_eq!(tuple.object_kind, "group");
    }
}
