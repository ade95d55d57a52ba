//! Backing store implementations.
//!
//! This module provides concrete implementations of the backend traits
//! defined in `persistcache_core::cache`.
//!
//! # Feature Flags
//!
//! - always: in-memory `GetSet` and `KeyValueStore` using tokio synchronization primitives
//! - `redis` (default): Redis store using the redis crate, implementing both traits

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::{MemoryGetSet, MemoryStore};

#[cfg(feature = "redis")]
pub use redis_impl::RedisStore;
