use async_trait::async_trait;
use fleetgrid_core::AppResult;
use fleetgrid_domain::Policy;

/// Port over the external relationship-tuple authorization backend.
///
/// The relational store is the source of truth; the policy store is a
/// secondary index kept consistent through the compensating-action protocol
/// in `ProvisionService` and `HierarchyService`.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Registers a batch of relationship tuples.
    async fn add_policies(&self, policies: &[Policy]) -> AppResult<()>;

    /// Deletes a batch of exact relationship tuples.
    async fn delete_policies(&self, policies: &[Policy]) -> AppResult<()>;

    /// Deletes every tuple matching the filter; empty fields are wildcards.
    async fn delete_policy_filter(&self, filter: &Policy) -> AppResult<()>;

    /// Checks one tuple; `Ok` means the relationship holds.
    async fn check_policy(&self, policy: &Policy) -> AppResult<()>;

    /// Lists the object ids of every tuple matching the filter.
    async fn list_all_objects(&self, filter: &Policy) -> AppResult<Vec<String>>;
}
