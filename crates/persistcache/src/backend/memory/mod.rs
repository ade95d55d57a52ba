//! In-memory backend implementation.
//!
//! Used by tests and single-process deployments.

mod getset;
mod store;

pub use getset::MemoryGetSet;
pub use store::MemoryStore;
