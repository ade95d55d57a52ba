//! Authorization lookups served through the domain stores.

mod acls_cache;
mod verification;

pub use acls_cache::{AclsCache, AuthorizationBackend};
pub use verification::{CacheMode, VerifiedRunner};
