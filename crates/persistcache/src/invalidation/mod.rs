//! Cache invalidation driven by domain lifecycle events.
//!
//! Write paths call [`InvalidatorManager::on_create`], `on_update` or
//! `on_delete` after their write commits, and must treat an error as "caches
//! may be stale".

mod invalidator;
mod invalidators;
mod manager;

pub use invalidator::Invalidator;
pub use invalidators::{
    AclResourcesAccountInvalidator, AclResourcesAclInvalidator, AclsAclInvalidator,
    AncestorsCollectionInvalidator, AncestorsDocumentInvalidator, GroupsUserInvalidator,
    GroupsUsergroupInvalidator,
};
pub use manager::{InvalidatorManager, InvalidatorRegistry};
