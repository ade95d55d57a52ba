//! Domain stores over a shared `KeyValueStore`.
//!
//! Each store is cache-aside only: reads return hits plus what was not found,
//! and loading misses from the source of truth is left to the caller.

mod acl_resources;
mod acls;
mod ancestors;
mod groups;

pub use acl_resources::{AclResourcesStore, ACL_RESOURCES_VERSION};
pub use acls::{AclsStore, CachedResourceAcls, ACLS_VERSION};
pub use ancestors::{AncestorsStore, CachedAncestors, ANCESTORS_VERSION};
pub use groups::{GroupsStore, USERGROUPS_VERSION};
