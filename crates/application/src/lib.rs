//! Application services and ports for role provisioning, hierarchy
//! management, and effective-access resolution.

#![forbid(unsafe_code)]

mod access_ports;
mod access_resolver;
mod hierarchy_ports;
mod hierarchy_service;
mod policy_ports;
mod provision_service;
mod role_manager;
mod role_ports;

pub use access_ports::{AccessRepository, CascadingRoleGrant, RoleGrant};
pub use access_resolver::{mask_inaccessible, AccessResolver, EntityAccess};
pub use hierarchy_ports::HierarchyRepository;
pub use hierarchy_service::HierarchyService;
pub use policy_ports::PolicyStore;
pub use provision_service::ProvisionService;
pub use role_manager::RoleManager;
pub use role_ports::{MemberPage, Role, RolePage, RoleProvision, RoleRepository};
