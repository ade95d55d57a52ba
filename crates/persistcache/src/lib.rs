//! Persistent caching and event-driven invalidation for authorization data.
//!
//! - [`cache`]: namespaced memoization over a `GetSet` backend, and typed
//!   key/value caches over a `KeyValueStore`.
//! - [`stores`]: the domain caches (ACLs, acl-resources, ancestors, usergroups).
//! - [`invalidation`]: lifecycle events fanned out to per-store invalidators.
//! - [`authorization`]: cache-aside ACL lookups and cached/live verification.
//! - [`backend`]: in-memory and Redis implementations of the backing traits.

pub mod authorization;
pub mod backend;
pub mod cache;
pub mod config;
pub mod invalidation;
pub mod stores;

pub use config::Config;
