//! Pure building blocks of the persistent cache: error taxonomy, backend
//! traits, key and payload encoding, the authorization domain model and the
//! invalidation event model.

pub mod authorization;
pub mod cache;
pub mod invalidation;
