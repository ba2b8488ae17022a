//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod database;
mod engine_config;
mod http_policy_store;
mod in_memory_policy_store;
mod postgres_access_repository;
mod postgres_hierarchy_repository;
mod postgres_role_repository;

pub use database::connect_and_migrate;
pub use engine_config::EngineConfig;
pub use http_policy_store::HttpPolicyStore;
pub use in_memory_policy_store::InMemoryPolicyStore;
pub use postgres_access_repository::PostgresAccessRepository;
pub use postgres_hierarchy_repository::PostgresHierarchyRepository;
pub use postgres_role_repository::PostgresRoleRepository;
