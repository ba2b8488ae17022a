use fleetgrid_core::{AppError, AppResult, DomainId, EntityId};
use serde::{Deserialize, Serialize};

/// Separator between ancestor ids in a materialized path.
pub const PATH_SEPARATOR: char = '.';

/// Maximum number of path segments (nesting depth bound).
pub const MAX_PATH_DEPTH: usize = 10;

/// A node of the group hierarchy.
///
/// `path` is the dot-joined sequence of ancestor ids ending in the node's
/// own id; `level` is the segment count minus one; a root's path is its own
/// id. No id may appear twice in a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNode {
    /// Node identifier.
    pub id: EntityId,
    /// Direct parent, if any. A node has at most one parent at a time.
    pub parent_id: Option<EntityId>,
    /// Domain owning the node.
    pub domain_id: DomainId,
    /// Materialized ancestor path.
    pub path: String,
    /// Depth of the node; roots are level zero.
    pub level: i32,
}

impl GroupNode {
    /// Creates a root node with a fresh single-segment path.
    #[must_use]
    pub fn root(id: EntityId, domain_id: DomainId) -> Self {
        Self {
            id,
            parent_id: None,
            domain_id,
            path: id.to_string(),
            level: 0,
        }
    }
}

/// Splits a materialized path into its id segments.
#[must_use]
pub fn path_segments(path: &str) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }

    path.split(PATH_SEPARATOR).collect()
}

/// Returns the level a path encodes (segment count minus one).
#[must_use]
pub fn path_level(path: &str) -> i32 {
    let segments = path_segments(path).len();
    i32::try_from(segments.saturating_sub(1)).unwrap_or(i32::MAX)
}

/// Returns whether `id` appears among the path's segments.
#[must_use]
pub fn path_contains(path: &str, id: EntityId) -> bool {
    let needle = id.to_string();
    path_segments(path)
        .iter()
        .any(|segment| *segment == needle)
}

/// Joins a parent path and a relocated subtree path.
#[must_use]
pub fn child_path(parent_path: &str, sub_path: &str) -> String {
    format!("{parent_path}{PATH_SEPARATOR}{sub_path}")
}

/// Strips a parent path prefix, returning the relocated remainder.
///
/// Returns `None` when `path` does not live under `parent_path`.
#[must_use]
pub fn strip_path_prefix(path: &str, parent_path: &str) -> Option<String> {
    let prefix = format!("{parent_path}{PATH_SEPARATOR}");
    path.strip_prefix(prefix.as_str()).map(str::to_owned)
}

/// Returns every prefix path of `path`, shortest first, including `path`.
#[must_use]
pub fn path_ancestors(path: &str) -> Vec<String> {
    let segments = path_segments(path);
    let mut ancestors = Vec::with_capacity(segments.len());
    let mut current = String::new();

    for segment in segments {
        if current.is_empty() {
            current.push_str(segment);
        } else {
            current.push(PATH_SEPARATOR);
            current.push_str(segment);
        }
        ancestors.push(current.clone());
    }

    ancestors
}

/// Returns whether `candidate` lies strictly below `ancestor_path`.
#[must_use]
pub fn is_descendant_path(candidate: &str, ancestor_path: &str) -> bool {
    candidate != ancestor_path
        && candidate.starts_with(format!("{ancestor_path}{PATH_SEPARATOR}").as_str())
}

/// Integrity guard: a stored path must be non-empty and end in the node's
/// own id.
pub fn validate_node_path(id: EntityId, path: &str) -> AppResult<()> {
    let own_id = id.to_string();
    let last_segment = path_segments(path).last().map(|segment| (*segment).to_owned());

    if last_segment.as_deref() != Some(own_id.as_str()) {
        return Err(AppError::ViewEntity(format!(
            "node '{id}' has corrupt path '{path}'"
        )));
    }

    Ok(())
}

/// Traversal direction of a hierarchy query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyDirection {
    /// Nodes whose path is a prefix of the target's path.
    Ancestors,
    /// Nodes whose path has the target's path as a prefix.
    Descendants,
}

impl HierarchyDirection {
    /// Maps a signed direction value: non-negative walks up, negative down.
    #[must_use]
    pub fn from_direction(direction: i64) -> Self {
        if direction >= 0 {
            Self::Ancestors
        } else {
            Self::Descendants
        }
    }
}

/// Parameters of a hierarchy retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyQuery {
    /// Traversal direction.
    pub direction: HierarchyDirection,
    /// Relative depth lower bound; zero disables the bound.
    pub start_level: i32,
    /// Relative depth upper bound; zero disables the bound.
    pub end_level: i32,
    /// When set, the full connected chain is returned and the level band is
    /// ignored.
    pub tree: bool,
}

impl HierarchyQuery {
    /// Builds a query over the whole subtree or ancestor chain.
    #[must_use]
    pub fn tree(direction: HierarchyDirection) -> Self {
        Self {
            direction,
            start_level: 0,
            end_level: 0,
            tree: true,
        }
    }

    /// Builds a query bounded to a relative depth band.
    #[must_use]
    pub fn banded(direction: HierarchyDirection, start_level: i32, end_level: i32) -> Self {
        Self {
            direction,
            start_level,
            end_level,
            tree: false,
        }
    }

    /// Validates the relative level band.
    pub fn validate(&self) -> AppResult<()> {
        if self.start_level < 0 || self.end_level < 0 {
            return Err(AppError::InvalidRange(format!(
                "levels must be non-negative, got start={} end={}",
                self.start_level, self.end_level
            )));
        }

        if self.start_level > 0 && self.end_level > 0 && self.start_level >= self.end_level {
            return Err(AppError::InvalidRange(format!(
                "start level {} must be below end level {}",
                self.start_level, self.end_level
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fleetgrid_core::{AppError, DomainId, EntityId};
    use proptest::prelude::*;

    use super::{
        child_path, is_descendant_path, path_ancestors, path_contains, path_level, path_segments,
        strip_path_prefix, validate_node_path, GroupNode, HierarchyDirection, HierarchyQuery,
    };

    #[test]
    fn root_path_is_own_id() {
        let id = EntityId::new();
        let node = GroupNode::root(id, DomainId::new());
        assert_eq!(node.path, id.to_string());
        assert_eq!(node.level, 0);
        assert!(validate_node_path(id, node.path.as_str()).is_ok());
    }

    #[test]
    fn corrupt_path_trips_view_guard() {
        let id = EntityId::new();
        let other = EntityId::new();
        let result = validate_node_path(id, other.to_string().as_str());
        assert!(matches!(result, Err(AppError::ViewEntity(_))));

        let empty = validate_node_path(id, "");
        assert!(matches!(empty, Err(AppError::ViewEntity(_))));
    }

    #[test]
    fn ancestors_are_all_prefix_paths() {
        let a = EntityId::new().to_string();
        let b = EntityId::new().to_string();
        let c = EntityId::new().to_string();
        let path = format!("{a}.{b}.{c}");

        let ancestors = path_ancestors(path.as_str());
        assert_eq!(
            ancestors,
            vec![a.clone(), format!("{a}.{b}"), path.clone()]
        );
        assert!(is_descendant_path(path.as_str(), a.as_str()));
        assert!(!is_descendant_path(a.as_str(), path.as_str()));
    }

    #[test]
    fn direction_sign_maps_to_traversal() {
        assert_eq!(
            HierarchyDirection::from_direction(0),
            HierarchyDirection::Ancestors
        );
        assert_eq!(
            HierarchyDirection::from_direction(-1),
            HierarchyDirection::Descendants
        );
    }

    #[test]
    fn inverted_level_band_is_rejected() {
        let query = HierarchyQuery::banded(HierarchyDirection::Descendants, 3, 2);
        assert!(matches!(
            query.validate(),
            Err(AppError::InvalidRange(_))
        ));

        let open_ended = HierarchyQuery::banded(HierarchyDirection::Descendants, 2, 0);
        assert!(open_ended.validate().is_ok());
    }

    fn id_chain() -> impl Strategy<Value = Vec<EntityId>> {
        prop::collection::vec(any::<u128>().prop_map(|raw| {
            EntityId::from_uuid(uuid_from_u128(raw))
        }), 1..6)
    }

    fn uuid_from_u128(raw: u128) -> uuid::Uuid {
        uuid::Uuid::from_u128(raw)
    }

    fn join_chain(ids: &[EntityId]) -> String {
        ids.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    proptest! {
        #[test]
        fn level_is_segment_count_minus_one(ids in id_chain()) {
            let path = join_chain(&ids);
            prop_assert_eq!(path_level(path.as_str()) as usize, ids.len() - 1);
            prop_assert_eq!(path_segments(path.as_str()).len(), ids.len());
        }

        #[test]
        fn join_then_strip_restores_sub_path(parents in id_chain(), children in id_chain()) {
            let parent_path = join_chain(&parents);
            let sub_path = join_chain(&children);

            let joined = child_path(parent_path.as_str(), sub_path.as_str());
            prop_assert_eq!(
                strip_path_prefix(joined.as_str(), parent_path.as_str()),
                Some(sub_path)
            );
        }

        #[test]
        fn every_chain_member_is_contained(ids in id_chain()) {
            let path = join_chain(&ids);
            for id in &ids {
                prop_assert!(path_contains(path.as_str(), *id));
            }
        }
    }
}
