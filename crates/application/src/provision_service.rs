use std::collections::HashMap;
use std::sync::Arc;

use fleetgrid_core::{AppError, AppResult, DomainId, EntityId};
use fleetgrid_domain::{EntityKind, Policy};

use crate::policy_ports::PolicyStore;
use crate::role_ports::{Role, RoleProvision, RoleRepository};

/// Orchestrates role provisioning across the relational store and the
/// external policy store.
///
/// There is no two-phase commit across the two stores: tuples are written
/// first, roles second, and the tuples are deleted again when the relational
/// write fails. Entity services hold one instance per entity kind next to
/// their `RoleManager`.
#[derive(Clone)]
pub struct ProvisionService {
    kind: EntityKind,
    policy_store: Arc<dyn PolicyStore>,
    repository: Arc<dyn RoleRepository>,
}

impl ProvisionService {
    /// Creates a provisioning service for one entity kind.
    #[must_use]
    pub fn new(
        kind: EntityKind,
        policy_store: Arc<dyn PolicyStore>,
        repository: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            kind,
            policy_store,
            repository,
        }
    }

    /// Provisions the built-in roles of newly created entities together with
    /// the caller-supplied relationship tuples.
    ///
    /// Ordering: tuples are registered first, roles persisted second; a
    /// relational failure triggers a compensating tuple deletion so the
    /// policy store returns to its pre-call state. When the compensation
    /// itself fails the returned error carries both causes.
    pub async fn add_new_entities_roles(
        &self,
        domain_id: DomainId,
        actor_id: &str,
        entity_ids: &[EntityId],
        optional_policies: Vec<Policy>,
        built_in_role_members: &HashMap<String, Vec<String>>,
    ) -> AppResult<Vec<RoleProvision>> {
        if actor_id.trim().is_empty() {
            return Err(AppError::Validation("missing actor id".to_owned()));
        }

        let mut provisions = Vec::new();
        let mut policies = optional_policies;

        for entity_id in entity_ids {
            if entity_id.is_nil() {
                return Err(AppError::Validation(format!(
                    "missing or empty {} entity id",
                    self.kind
                )));
            }

            for built_in in self.kind.built_in_roles() {
                let members = built_in_role_members
                    .get(built_in.name.as_str())
                    .cloned()
                    .unwrap_or_else(|| vec![actor_id.to_owned()]);

                let role = Role::new(*entity_id, built_in.name.as_str(), actor_id);
                for member in &members {
                    policies.push(Policy::role_member(
                        domain_id,
                        role.id.to_string().as_str(),
                        member,
                        self.kind,
                        *entity_id,
                    ));
                }

                provisions.push(RoleProvision {
                    role,
                    optional_actions: built_in.actions,
                    optional_members: members,
                });
            }
        }

        self.policy_store
            .add_policies(policies.as_slice())
            .await
            .map_err(|error| AppError::AddPolicies(error.to_string()))?;

        if let Err(original) = self.repository.add_roles(provisions.as_slice()).await {
            if let Err(rollback) = self.policy_store.delete_policies(policies.as_slice()).await {
                tracing::warn!(
                    kind = self.kind.as_str(),
                    %domain_id,
                    error = %rollback,
                    "failed to roll back policy tuples after role persistence failure"
                );
                return Err(AppError::rollback_failed(original, rollback));
            }

            return Err(original);
        }

        Ok(provisions)
    }

    /// Tears down the roles and relationship tuples of deleted entities.
    ///
    /// The entities' primary deletion has already been committed upstream,
    /// so this path is best-effort cleanup without compensation; policy
    /// store failures surface as delete-policies errors.
    pub async fn remove_entities_roles(
        &self,
        domain_id: DomainId,
        actor_id: &str,
        entity_ids: &[EntityId],
        filter_delete_policies: Vec<Policy>,
        delete_policies: Vec<Policy>,
    ) -> AppResult<()> {
        for filter in &filter_delete_policies {
            self.policy_store
                .delete_policy_filter(filter)
                .await
                .map_err(|error| AppError::DeletePolicies(error.to_string()))?;
        }

        if !delete_policies.is_empty() {
            self.policy_store
                .delete_policies(delete_policies.as_slice())
                .await
                .map_err(|error| AppError::DeletePolicies(error.to_string()))?;
        }

        self.repository
            .remove_roles_for_entities(entity_ids)
            .await?;

        tracing::debug!(
            kind = self.kind.as_str(),
            %domain_id,
            actor = actor_id,
            entities = entity_ids.len(),
            "removed entity roles"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use fleetgrid_core::{AppError, AppResult, DomainId, EntityId};
    use fleetgrid_domain::{EntityKind, Policy};
    use uuid::Uuid;

    use crate::policy_ports::PolicyStore;
    use crate::role_ports::{MemberPage, Role, RolePage, RoleProvision, RoleRepository};

    use super::ProvisionService;

    #[derive(Default)]
    struct FakePolicyStore {
        policies: Mutex<Vec<Policy>>,
        fail_add: bool,
        fail_delete: bool,
    }

    #[async_trait]
    impl PolicyStore for FakePolicyStore {
        async fn add_policies(&self, policies: &[Policy]) -> AppResult<()> {
            if self.fail_add {
                return Err(AppError::Internal("policy backend unavailable".to_owned()));
            }
            self.policies.lock().await.extend_from_slice(policies);
            Ok(())
        }

        async fn delete_policies(&self, policies: &[Policy]) -> AppResult<()> {
            if self.fail_delete {
                return Err(AppError::Internal("policy backend unavailable".to_owned()));
            }
            self.policies
                .lock()
                .await
                .retain(|stored| !policies.contains(stored));
            Ok(())
        }

        async fn delete_policy_filter(&self, filter: &Policy) -> AppResult<()> {
            if self.fail_delete {
                return Err(AppError::Internal("policy backend unavailable".to_owned()));
            }
            self.policies
                .lock()
                .await
                .retain(|stored| !filter.matches(stored));
            Ok(())
        }

        async fn check_policy(&self, policy: &Policy) -> AppResult<()> {
            if self.policies.lock().await.iter().any(|stored| stored == policy) {
                Ok(())
            } else {
                Err(AppError::Forbidden("relationship does not hold".to_owned()))
            }
        }

        async fn list_all_objects(&self, filter: &Policy) -> AppResult<Vec<String>> {
            Ok(self
                .policies
                .lock()
                .await
                .iter()
                .filter(|stored| filter.matches(stored))
                .map(|stored| stored.object.clone())
                .collect())
        }
    }

    #[derive(Default)]
    struct FakeRoleRepository {
        provisions: Mutex<Vec<RoleProvision>>,
        fail_add: bool,
    }

    #[async_trait]
    impl RoleRepository for FakeRoleRepository {
        async fn add_roles(&self, provisions: &[RoleProvision]) -> AppResult<()> {
            if self.fail_add {
                return Err(AppError::Internal("relational insert failed".to_owned()));
            }
            self.provisions.lock().await.extend_from_slice(provisions);
            Ok(())
        }

        async fn remove_roles_for_entities(&self, entity_ids: &[EntityId]) -> AppResult<()> {
            self.provisions
                .lock()
                .await
                .retain(|provision| !entity_ids.contains(&provision.role.entity_id));
            Ok(())
        }

        async fn retrieve_role(&self, _entity_id: EntityId, role_id: Uuid) -> AppResult<Role> {
            Err(AppError::NotFound(format!("role '{role_id}' was not found")))
        }

        async fn retrieve_entity_roles(
            &self,
            _entity_id: EntityId,
            limit: u64,
            offset: u64,
        ) -> AppResult<RolePage> {
            Ok(RolePage {
                roles: Vec::new(),
                total: 0,
                limit,
                offset,
            })
        }

        async fn update_role_name(
            &self,
            _entity_id: EntityId,
            role_id: Uuid,
            _updated_by: &str,
            _new_name: &str,
        ) -> AppResult<Role> {
            Err(AppError::NotFound(format!("role '{role_id}' was not found")))
        }

        async fn remove_role(&self, _entity_id: EntityId, _role_id: Uuid) -> AppResult<()> {
            Ok(())
        }

        async fn add_role_actions(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
            actions: &[fleetgrid_domain::Action],
        ) -> AppResult<Vec<fleetgrid_domain::Action>> {
            Ok(actions.to_vec())
        }

        async fn list_role_actions(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
        ) -> AppResult<Vec<fleetgrid_domain::Action>> {
            Ok(Vec::new())
        }

        async fn role_actions_exist(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
            _actions: &[fleetgrid_domain::Action],
        ) -> AppResult<bool> {
            Ok(false)
        }

        async fn remove_role_actions(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
            _actions: &[fleetgrid_domain::Action],
        ) -> AppResult<()> {
            Ok(())
        }

        async fn remove_all_role_actions(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn add_role_members(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
            members: &[String],
        ) -> AppResult<Vec<String>> {
            Ok(members.to_vec())
        }

        async fn list_role_members(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
            limit: u64,
            offset: u64,
        ) -> AppResult<MemberPage> {
            Ok(MemberPage {
                members: Vec::new(),
                total: 0,
                limit,
                offset,
            })
        }

        async fn role_members_exist(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
            _members: &[String],
        ) -> AppResult<bool> {
            Ok(false)
        }

        async fn remove_role_members(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
            _members: &[String],
        ) -> AppResult<()> {
            Ok(())
        }

        async fn remove_all_role_members(
            &self,
            _entity_id: EntityId,
            _role_id: Uuid,
        ) -> AppResult<()> {
            Ok(())
        }

        async fn list_entity_members(
            &self,
            _entity_id: EntityId,
            limit: u64,
            offset: u64,
        ) -> AppResult<MemberPage> {
            Ok(MemberPage {
                members: Vec::new(),
                total: 0,
                limit,
                offset,
            })
        }

        async fn remove_entity_members(
            &self,
            _entity_id: EntityId,
            _members: &[String],
        ) -> AppResult<()> {
            Ok(())
        }

        async fn remove_member_from_all_roles(&self, _member_id: &str) -> AppResult<()> {
            Ok(())
        }
    }

    fn service(
        store: Arc<FakePolicyStore>,
        repository: Arc<FakeRoleRepository>,
    ) -> ProvisionService {
        ProvisionService::new(EntityKind::Group, store, repository)
    }

    #[tokio::test]
    async fn provisioning_records_roles_and_tuples() {
        let store = Arc::new(FakePolicyStore::default());
        let repository = Arc::new(FakeRoleRepository::default());
        let service = service(store.clone(), repository.clone());

        let domain_id = DomainId::new();
        let entity_id = EntityId::new();
        let ownership = Policy::domain_owns(domain_id, EntityKind::Group, entity_id);

        let result = service
            .add_new_entities_roles(
                domain_id,
                "alice",
                &[entity_id],
                vec![ownership.clone()],
                &HashMap::from([("admin".to_owned(), vec!["alice".to_owned()])]),
            )
            .await;

        assert!(result.is_ok());
        let provisions = result.unwrap_or_default();
        assert_eq!(provisions.len(), 1);
        assert_eq!(provisions[0].role.name, "admin");
        assert_eq!(provisions[0].optional_members, vec!["alice".to_owned()]);
        assert!(!provisions[0].optional_actions.is_empty());

        let stored_policies = store.policies.lock().await;
        assert!(stored_policies.contains(&ownership));
        // one role-member tuple in addition to the ownership tuple
        assert_eq!(stored_policies.len(), 2);
        assert_eq!(repository.provisions.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn creator_becomes_first_member_by_default() {
        let store = Arc::new(FakePolicyStore::default());
        let repository = Arc::new(FakeRoleRepository::default());
        let service = service(store, repository);

        let result = service
            .add_new_entities_roles(
                DomainId::new(),
                "alice",
                &[EntityId::new()],
                Vec::new(),
                &HashMap::new(),
            )
            .await;

        assert!(result.is_ok());
        let provisions = result.unwrap_or_default();
        assert_eq!(provisions[0].optional_members, vec!["alice".to_owned()]);
    }

    #[tokio::test]
    async fn relational_failure_rolls_back_policy_tuples() {
        let store = Arc::new(FakePolicyStore::default());
        let repository = Arc::new(FakeRoleRepository {
            fail_add: true,
            ..FakeRoleRepository::default()
        });
        let service = service(store.clone(), repository);

        let domain_id = DomainId::new();
        let entity_id = EntityId::new();
        let ownership = Policy::domain_owns(domain_id, EntityKind::Group, entity_id);

        let result = service
            .add_new_entities_roles(
                domain_id,
                "alice",
                &[entity_id],
                vec![ownership],
                &HashMap::from([("admin".to_owned(), vec!["u1".to_owned()])]),
            )
            .await;

        assert!(result.is_err());
        assert!(store.policies.lock().await.is_empty());
    }

    #[tokio::test]
    async fn policy_store_failure_aborts_before_persistence() {
        let store = Arc::new(FakePolicyStore {
            fail_add: true,
            ..FakePolicyStore::default()
        });
        let repository = Arc::new(FakeRoleRepository::default());
        let service = service(store, repository.clone());

        let result = service
            .add_new_entities_roles(
                DomainId::new(),
                "alice",
                &[EntityId::new()],
                Vec::new(),
                &HashMap::new(),
            )
            .await;

        assert!(matches!(result, Err(AppError::AddPolicies(_))));
        assert!(repository.provisions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn failed_compensation_wraps_both_causes() {
        let store = Arc::new(FakePolicyStore {
            fail_delete: true,
            ..FakePolicyStore::default()
        });
        let repository = Arc::new(FakeRoleRepository {
            fail_add: true,
            ..FakeRoleRepository::default()
        });
        let service = service(store, repository);

        let result = service
            .add_new_entities_roles(
                DomainId::new(),
                "alice",
                &[EntityId::new()],
                Vec::new(),
                &HashMap::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::RollbackFailed { .. })
        ));
    }

    #[tokio::test]
    async fn removal_deletes_filters_tuples_and_roles() {
        let store = Arc::new(FakePolicyStore::default());
        let repository = Arc::new(FakeRoleRepository::default());
        let service = service(store.clone(), repository.clone());

        let domain_id = DomainId::new();
        let entity_id = EntityId::new();

        let provisioned = service
            .add_new_entities_roles(
                domain_id,
                "alice",
                &[entity_id],
                vec![Policy::domain_owns(domain_id, EntityKind::Group, entity_id)],
                &HashMap::new(),
            )
            .await;
        assert!(provisioned.is_ok());

        let removed = service
            .remove_entities_roles(
                domain_id,
                "alice",
                &[entity_id],
                vec![Policy::object_filter(EntityKind::Group, entity_id)],
                Vec::new(),
            )
            .await;
        assert!(removed.is_ok());

        assert!(repository.provisions.lock().await.is_empty());
        let remaining = store.policies.lock().await;
        assert!(remaining
            .iter()
            .all(|policy| policy.object != entity_id.to_string()));
    }
}
