//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod action;
mod entity;
mod hierarchy;
mod policy;

pub use access::AccessType;
pub use action::{Action, BuiltInRole, BUILT_IN_ROLE_ADMIN, CASCADE_ACTION_PREFIX};
pub use entity::EntityKind;
pub use hierarchy::{
    child_path, is_descendant_path, path_ancestors, path_contains, path_level, path_segments,
    strip_path_prefix, validate_node_path, GroupNode, HierarchyDirection, HierarchyQuery,
    MAX_PATH_DEPTH, PATH_SEPARATOR,
};
pub use policy::{
    Policy, OBJECT_TYPE_CHANNEL, OBJECT_TYPE_CLIENT, OBJECT_TYPE_DOMAIN, OBJECT_TYPE_GROUP,
    RELATION_DOMAIN, RELATION_MEMBER, RELATION_PARENT_GROUP, SUBJECT_TYPE_GROUP,
    SUBJECT_TYPE_ROLE, SUBJECT_TYPE_USER,
};
