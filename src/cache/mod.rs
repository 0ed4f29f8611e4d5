//! Local read-through cache for catalog lists.
//!
//! This module provides:
//! - Whole-list entries per resource, served only while younger than the TTL
//! - Explicit invalidation after every mutation
//! - Pluggable storage (SQLite file, memory, or nothing)

mod resource;
mod store;
mod traits;

pub use resource::{ResourceCache, ResourceKey};
pub use store::{KeyValueStore, MemoryStore, NoopStore, SqliteStore};
pub use traits::{CacheResult, CachedResource};
