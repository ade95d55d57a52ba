//! Redis backend implementation.
//!
//! One connection manager serves both the `GetSet` and the `KeyValueStore`
//! side, so every cache and store built from the same `RedisStore` shares it.

mod error;
mod store;

pub use store::RedisStore;
