//! Time-boxed cache of whole resource lists.

use chrono::{DateTime, TimeZone, Utc};
use color_eyre::{eyre::eyre, Result};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use super::store::KeyValueStore;
use super::traits::CachedResource;

/// Entries older than this are never served.
pub const CACHE_TTL_MS: i64 = 300_000;

/// Cached resource lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
  Categories,
  Viruses,
  Products,
}

impl ResourceKey {
  pub const ALL: [ResourceKey; 3] = [
    ResourceKey::Categories,
    ResourceKey::Viruses,
    ResourceKey::Products,
  ];

  /// Field name of the list inside a stored entry.
  pub fn name(&self) -> &'static str {
    match self {
      ResourceKey::Categories => "categories",
      ResourceKey::Viruses => "viruses",
      ResourceKey::Products => "products",
    }
  }

  pub fn storage_key(&self) -> String {
    format!("{}DataCache", self.name())
  }
}

impl fmt::Display for ResourceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// Outcome of a cache lookup.
///
/// `payload` is whatever could be read; callers serve it only when
/// `is_fresh` is set.
#[derive(Debug, Clone)]
pub struct CacheRead<T> {
  pub payload: Option<Vec<T>>,
  pub fetched_at: Option<DateTime<Utc>>,
  pub is_fresh: bool,
}

impl<T> CacheRead<T> {
  fn miss() -> Self {
    Self {
      payload: None,
      fetched_at: None,
      is_fresh: false,
    }
  }

  /// The payload, if it may be served.
  pub fn fresh(self) -> Option<(Vec<T>, DateTime<Utc>)> {
    match (self.is_fresh, self.payload, self.fetched_at) {
      (true, Some(payload), Some(fetched_at)) => Some((payload, fetched_at)),
      _ => None,
    }
  }
}

/// Resource cache over an injected key-value store.
///
/// Each resource is stored as one entry `{"<name>": [...], "timestamp": ms}`.
/// There is no locking across processes; the last write wins.
#[derive(Clone)]
pub struct ResourceCache {
  store: Arc<dyn KeyValueStore>,
  ttl_ms: i64,
}

impl ResourceCache {
  pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
    Self {
      store,
      ttl_ms: CACHE_TTL_MS,
    }
  }

  pub fn read<T: CachedResource>(&self) -> CacheRead<T> {
    self.read_at(Utc::now().timestamp_millis())
  }

  /// Look up `T`'s entry as of `now_ms`. Unreadable entries are misses.
  pub fn read_at<T: CachedResource>(&self, now_ms: i64) -> CacheRead<T> {
    let key = T::KEY;
    let raw = match self.store.get(&key.storage_key()) {
      Ok(Some(raw)) => raw,
      Ok(None) => {
        debug!(resource = %key, "Cache miss");
        return CacheRead::miss();
      }
      Err(e) => {
        warn!(resource = %key, "Cache read failed: {}", e);
        return CacheRead::miss();
      }
    };

    let (payload, timestamp) = match decode_entry::<T>(key, &raw) {
      Ok(entry) => entry,
      Err(e) => {
        warn!(resource = %key, "Ignoring corrupt cache entry: {}", e);
        return CacheRead::miss();
      }
    };

    let age = now_ms - timestamp;
    // A timestamp in the future means a skewed clock, not a fresh entry
    let is_fresh = (0..=self.ttl_ms).contains(&age);
    debug!(resource = %key, age_ms = age, is_fresh, "Cache hit");

    CacheRead {
      payload: Some(payload),
      fetched_at: Utc.timestamp_millis_opt(timestamp).single(),
      is_fresh,
    }
  }

  pub fn write<T: CachedResource>(&self, payload: &[T]) {
    self.write_at(payload, Utc::now().timestamp_millis())
  }

  /// Replace `T`'s entry. A failed write only costs a later refetch, so it
  /// is logged and swallowed.
  pub fn write_at<T: CachedResource>(&self, payload: &[T], now_ms: i64) {
    let key = T::KEY;
    let result = encode_entry(key, payload, now_ms)
      .and_then(|raw| self.store.set(&key.storage_key(), &raw));
    match result {
      Ok(()) => debug!(resource = %key, count = payload.len(), "Cache write"),
      Err(e) => warn!(resource = %key, "Cache write failed: {}", e),
    }
  }

  pub fn invalidate(&self, key: ResourceKey) -> Result<()> {
    debug!(resource = %key, "Cache invalidate");
    self.store.delete(&key.storage_key())
  }

  pub fn invalidate_all(&self) -> Result<()> {
    for key in ResourceKey::ALL {
      self.invalidate(key)?;
    }
    Ok(())
  }
}

fn encode_entry<T: CachedResource>(key: ResourceKey, payload: &[T], now_ms: i64) -> Result<String> {
  let list =
    serde_json::to_value(payload).map_err(|e| eyre!("Failed to serialize {}: {}", key, e))?;
  let mut entry = Map::new();
  entry.insert(key.name().to_string(), list);
  entry.insert("timestamp".to_string(), Value::from(now_ms));
  serde_json::to_string(&Value::Object(entry))
    .map_err(|e| eyre!("Failed to serialize {} entry: {}", key, e))
}

fn decode_entry<T: CachedResource>(key: ResourceKey, raw: &str) -> Result<(Vec<T>, i64)> {
  let mut entry: Value = serde_json::from_str(raw).map_err(|e| eyre!("invalid JSON: {}", e))?;
  let timestamp = entry
    .get("timestamp")
    .and_then(Value::as_i64)
    .ok_or_else(|| eyre!("missing timestamp"))?;
  let list = entry
    .get_mut(key.name())
    .map(Value::take)
    .ok_or_else(|| eyre!("missing '{}' list", key.name()))?;
  let payload = serde_json::from_value(list).map_err(|e| eyre!("invalid payload: {}", e))?;
  Ok((payload, timestamp))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::store::{KeyValueStore, MemoryStore};
  use crate::catalog::types::{Category, Product};
  use crate::test_support::{category, product};

  const NOW: i64 = 1_700_000_000_000;

  fn cache() -> (ResourceCache, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (ResourceCache::new(store.clone()), store)
  }

  #[test]
  fn test_fresh_entry_is_served() {
    let (cache, _) = cache();
    cache.write_at(&[category(1, "Herbicide")], NOW);

    let read = cache.read_at::<Category>(NOW + 1_000);
    assert!(read.is_fresh);
    assert_eq!(read.payload.unwrap()[0].name_en, "Herbicide");
  }

  #[test]
  fn test_ttl_boundary() {
    let (cache, _) = cache();
    cache.write_at(&[category(1, "Herbicide")], NOW);

    assert!(cache.read_at::<Category>(NOW + CACHE_TTL_MS).is_fresh);
    let stale = cache.read_at::<Category>(NOW + CACHE_TTL_MS + 1);
    assert!(!stale.is_fresh);
    assert!(stale.fresh().is_none());
  }

  #[test]
  fn test_future_timestamp_is_stale() {
    let (cache, _) = cache();
    cache.write_at(&[category(1, "Herbicide")], NOW + 60_000);
    assert!(!cache.read_at::<Category>(NOW).is_fresh);
  }

  #[test]
  fn test_missing_entry() {
    let (cache, _) = cache();
    let read = cache.read_at::<Product>(NOW);
    assert!(!read.is_fresh);
    assert!(read.payload.is_none());
  }

  #[test]
  fn test_corrupt_entry_is_a_miss() {
    let (cache, store) = cache();
    store.set("categoriesDataCache", "{not json").unwrap();
    assert!(!cache.read_at::<Category>(NOW).is_fresh);

    store
      .set("categoriesDataCache", r#"{"categories": [], "timestamp": "soon"}"#)
      .unwrap();
    assert!(cache.read_at::<Category>(NOW).payload.is_none());

    store.set("productsDataCache", "products: [oops").unwrap();
    let read = cache.read_at::<Product>(NOW);
    assert!(!read.is_fresh);
    assert!(read.payload.is_none());

    // well-formed entry whose list does not decode as products
    store
      .set("productsDataCache", &format!(r#"{{"products": [{{"id": "x"}}], "timestamp": {}}}"#, NOW))
      .unwrap();
    assert!(cache.read_at::<Product>(NOW).fresh().is_none());
  }

  #[test]
  fn test_entry_layout() {
    let (cache, store) = cache();
    cache.write_at(&[category(1, "Herbicide")], NOW);

    let raw = store.get("categoriesDataCache").unwrap().unwrap();
    let value: Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["timestamp"], Value::from(NOW));
    assert_eq!(value["categories"][0]["id"], Value::from(1));
  }

  #[test]
  fn test_write_replaces_and_invalidate_removes() {
    let (cache, _) = cache();
    cache.write_at(&[product(10, "WeedOut", "", &[1], &[], None)], NOW);
    cache.write_at(&[product(11, "FungAway", "", &[2], &[], None)], NOW);

    let payload = cache.read_at::<Product>(NOW).payload.unwrap();
    assert_eq!(payload.len(), 1);
    assert_eq!(payload[0].id, 11);

    cache.invalidate(ResourceKey::Products).unwrap();
    assert!(cache.read_at::<Product>(NOW).payload.is_none());
  }

  #[test]
  fn test_invalidate_only_touches_its_key() {
    let (cache, _) = cache();
    cache.write_at(&[category(1, "Herbicide")], NOW);
    cache.invalidate(ResourceKey::Products).unwrap();
    assert!(cache.read_at::<Category>(NOW).is_fresh);
  }
}
