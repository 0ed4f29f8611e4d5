//! Caching implementations for catalog types.

use crate::cache::{CachedResource, ResourceKey};

use super::types::{Category, Product, Virus};

impl CachedResource for Category {
  const KEY: ResourceKey = ResourceKey::Categories;
}

impl CachedResource for Virus {
  const KEY: ResourceKey = ResourceKey::Viruses;
}

impl CachedResource for Product {
  const KEY: ResourceKey = ResourceKey::Products;
}
