//! Shared primitives for all Fleetgrid crates.

#![forbid(unsafe_code)]

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type used across Fleetgrid crates.
pub type AppResult<T> = Result<T, AppError>;

/// Domain identifier scoping every entity and policy tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainId(Uuid);

impl DomainId {
    /// Creates a random domain identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a domain identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns whether this is the nil placeholder.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for DomainId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for DomainId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Identifier of a provisioned entity (domain, group, channel, or client).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Creates a random entity identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an entity identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the nil placeholder identifier used for masked rows.
    #[must_use]
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Returns whether this is the nil placeholder.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for EntityId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested entity, role, or hierarchy node does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored hierarchy state failed an integrity check during a write.
    #[error("malformed entity: {0}")]
    MalformedEntity(String),

    /// Stored hierarchy state failed an integrity check during a read.
    #[error("view entity: {0}")]
    ViewEntity(String),

    /// Policy store rejected a tuple registration.
    #[error("failed to add policies: {0}")]
    AddPolicies(String),

    /// Policy store rejected a tuple deletion.
    #[error("failed to delete policies: {0}")]
    DeletePolicies(String),

    /// Compensation failed after a partial write; both causes are retained.
    #[error("rollback failed: {rollback} (original failure: {original})")]
    RollbackFailed {
        /// The failure that triggered compensation.
        original: Box<AppError>,
        /// The failure of the compensating action itself.
        rollback: Box<AppError>,
    },

    /// Invalid hierarchy level range.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Principal is blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps an original failure and a failed compensation together.
    #[must_use]
    pub fn rollback_failed(original: AppError, rollback: AppError) -> Self {
        Self::RollbackFailed {
            original: Box::new(original),
            rollback: Box::new(rollback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, DomainId, EntityId};

    #[test]
    fn entity_id_formats_as_uuid() {
        let entity_id = EntityId::new();
        assert_eq!(entity_id.to_string().len(), 36);
    }

    #[test]
    fn nil_entity_id_is_the_placeholder() {
        assert!(EntityId::nil().is_nil());
        assert!(!EntityId::new().is_nil());
    }

    #[test]
    fn domain_id_round_trips_through_uuid() {
        let domain_id = DomainId::new();
        assert_eq!(DomainId::from_uuid(domain_id.as_uuid()), domain_id);
    }

    #[test]
    fn rollback_failed_retains_both_causes() {
        let error = AppError::rollback_failed(
            AppError::Internal("insert failed".to_owned()),
            AppError::DeletePolicies("store unreachable".to_owned()),
        );

        let message = error.to_string();
        assert!(message.contains("insert failed"));
        assert!(message.contains("store unreachable"));
    }
}
