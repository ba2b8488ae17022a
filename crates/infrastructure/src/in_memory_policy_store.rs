use async_trait::async_trait;
use fleetgrid_application::PolicyStore;
use fleetgrid_core::{AppError, AppResult};
use fleetgrid_domain::Policy;
use tokio::sync::RwLock;

/// In-memory policy store for development setups and tests that do not run
/// a real tuple backend.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    policies: RwLock<Vec<Policy>>,
}

impl InMemoryPolicyStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored tuple.
    pub async fn snapshot(&self) -> Vec<Policy> {
        self.policies.read().await.clone()
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn add_policies(&self, policies: &[Policy]) -> AppResult<()> {
        let mut stored = self.policies.write().await;
        for policy in policies {
            if !stored.contains(policy) {
                stored.push(policy.clone());
            }
        }
        Ok(())
    }

    async fn delete_policies(&self, policies: &[Policy]) -> AppResult<()> {
        self.policies
            .write()
            .await
            .retain(|stored| !policies.contains(stored));
        Ok(())
    }

    async fn delete_policy_filter(&self, filter: &Policy) -> AppResult<()> {
        self.policies
            .write()
            .await
            .retain(|stored| !filter.matches(stored));
        Ok(())
    }

    async fn check_policy(&self, policy: &Policy) -> AppResult<()> {
        let stored = self.policies.read().await;
        if stored.iter().any(|candidate| policy.matches(candidate)) {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "relationship does not hold".to_owned(),
            ))
        }
    }

    async fn list_all_objects(&self, filter: &Policy) -> AppResult<Vec<String>> {
        let stored = self.policies.read().await;
        let mut objects: Vec<String> = stored
            .iter()
            .filter(|candidate| filter.matches(candidate))
            .map(|candidate| candidate.object.clone())
            .collect();
        objects.sort_unstable();
        objects.dedup();
        Ok(objects)
    }
}
