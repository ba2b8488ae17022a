use serde::{Deserialize, Serialize};

/// Source of an effective grant on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    /// A role on the entity itself.
    Direct,
    /// A cascading role on the entity's immediate parent.
    DirectGroup,
    /// A cascading role on a more distant ancestor.
    IndirectGroup,
    /// A domain-wide role filtered to the entity's kind.
    Domain,
}

impl AccessType {
    /// Returns a stable storage value for this access type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::DirectGroup => "direct_group",
            Self::IndirectGroup => "indirect_group",
            Self::Domain => "domain",
        }
    }
}
