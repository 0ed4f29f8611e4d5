//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use super::resource::ResourceKey;

/// Trait for list resources that can be cached.
///
/// A resource is always cached as its whole list under `KEY`.
pub trait CachedResource: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  const KEY: ResourceKey;
}

/// Result from a cache-aware read.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// When the cached copy was fetched; `None` when it came straight from
  /// the backend
  pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      fetched_at: None,
    }
  }

  pub fn from_cache(data: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      data,
      fetched_at: Some(fetched_at),
    }
  }

  pub fn is_cached(&self) -> bool {
    self.fetched_at.is_some()
  }
}
