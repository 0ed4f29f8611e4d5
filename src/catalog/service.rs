//! Cache-aware catalog operations used by the screens.
//!
//! Reads go through the resource cache. Every mutation follows the same
//! sequence: call the backend, invalidate the affected cache entries, then
//! refetch. The refetched list is returned so a screen can render it
//! without a second round trip.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::cache::{CacheResult, CachedResource, ResourceCache, ResourceKey};

use super::api::{ApiError, CatalogApi};
use super::confirm::{confirm_deletion, ConfirmationError};
use super::drafts::{CategoryDraft, DraftError, ProductDraft, VirusDraft};
use super::stats::DashboardStats;
use super::types::{Category, Order, OrderId, OrderStatus, Product, Virus, VirusId};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
  #[error(transparent)]
  Api(#[from] ApiError),
  #[error("Cache error: {0}")]
  Cache(String),
  #[error(transparent)]
  Confirmation(#[from] ConfirmationError),
  #[error(transparent)]
  Draft(#[from] DraftError),
}

/// A resource list as returned by `invalidate_and_refetch`
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceSnapshot {
  Categories(Vec<Category>),
  Viruses(Vec<Virus>),
  Products(Vec<Product>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
  pub products: Vec<Product>,
  pub categories: Vec<Category>,
  pub viruses: Vec<Virus>,
  /// When the product list was cached; `None` if it came from the backend
  pub cached_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirusPage {
  pub viruses: Vec<Virus>,
  pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderPage {
  pub orders: Vec<Order>,
  pub products: Vec<Product>,
}

impl OrderPage {
  pub fn product_name(&self, order: &Order) -> &str {
    order
      .product_id
      .and_then(|id| self.products.iter().find(|p| p.id == id))
      .map(|p| p.name_en.as_str())
      .unwrap_or("Unknown product")
  }
}

/// Entry point for everything the UI reads or writes.
#[derive(Clone)]
pub struct Catalog {
  api: Arc<dyn CatalogApi>,
  cache: ResourceCache,
}

impl Catalog {
  pub fn new(api: Arc<dyn CatalogApi>, cache: ResourceCache) -> Self {
    Self { api, cache }
  }

  /// Serve the cached list if fresh, else fetch and repopulate.
  ///
  /// A stale entry is never served, not even when the backend is down.
  async fn fetch_list<T, F, Fut>(&self, fetcher: F) -> Result<CacheResult<Vec<T>>, CatalogError>
  where
    T: CachedResource,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
  {
    if let Some((data, fetched_at)) = self.cache.read::<T>().fresh() {
      return Ok(CacheResult::from_cache(data, fetched_at));
    }

    let data = fetcher().await?;
    self.cache.write(&data);
    Ok(CacheResult::from_network(data))
  }

  pub async fn get_categories(&self) -> Result<CacheResult<Vec<Category>>, CatalogError> {
    self.fetch_list(|| self.api.list_categories()).await
  }

  pub async fn get_viruses(&self) -> Result<CacheResult<Vec<Virus>>, CatalogError> {
    self.fetch_list(|| self.api.list_viruses()).await
  }

  pub async fn get_products(&self) -> Result<CacheResult<Vec<Product>>, CatalogError> {
    self.fetch_list(|| self.api.list_products()).await
  }

  /// Orders are not cached; every call hits the backend.
  pub async fn get_orders(&self) -> Result<Vec<Order>, CatalogError> {
    Ok(self.api.list_orders().await?)
  }

  /// Drop the cached lists for `keys`; the next read goes to the backend.
  pub fn invalidate(&self, keys: &[ResourceKey]) -> Result<(), CatalogError> {
    for key in keys {
      self
        .cache
        .invalidate(*key)
        .map_err(|e| CatalogError::Cache(e.to_string()))?;
    }
    Ok(())
  }

  pub async fn invalidate_and_refetch(
    &self,
    key: ResourceKey,
  ) -> Result<ResourceSnapshot, CatalogError> {
    self.invalidate(&[key])?;
    let snapshot = match key {
      ResourceKey::Categories => ResourceSnapshot::Categories(self.get_categories().await?.data),
      ResourceKey::Viruses => ResourceSnapshot::Viruses(self.get_viruses().await?.data),
      ResourceKey::Products => ResourceSnapshot::Products(self.get_products().await?.data),
    };
    Ok(snapshot)
  }

  async fn refetch_categories(&self, extra: &[ResourceKey]) -> Result<Vec<Category>, CatalogError> {
    self.invalidate(&[&[ResourceKey::Categories][..], extra].concat())?;
    Ok(self.get_categories().await?.data)
  }

  async fn refetch_viruses(&self, extra: &[ResourceKey]) -> Result<Vec<Virus>, CatalogError> {
    self.invalidate(&[&[ResourceKey::Viruses][..], extra].concat())?;
    Ok(self.get_viruses().await?.data)
  }

  async fn refetch_products(&self) -> Result<Vec<Product>, CatalogError> {
    self.invalidate(&[ResourceKey::Products])?;
    Ok(self.get_products().await?.data)
  }

  // ==========================================================================
  // Screen loads: concurrent, all-or-nothing
  // ==========================================================================

  pub async fn load_categories(&self) -> Result<Vec<Category>, CatalogError> {
    Ok(self.get_categories().await?.data)
  }

  pub async fn load_product_page(&self) -> Result<ProductPage, CatalogError> {
    let (products, categories, viruses) = futures::try_join!(
      self.get_products(),
      self.get_categories(),
      self.get_viruses()
    )?;
    Ok(ProductPage {
      cached_at: products.fetched_at,
      products: products.data,
      categories: categories.data,
      viruses: viruses.data,
    })
  }

  pub async fn load_virus_page(&self) -> Result<VirusPage, CatalogError> {
    let (viruses, categories) = futures::try_join!(self.get_viruses(), self.get_categories())?;
    Ok(VirusPage {
      viruses: viruses.data,
      categories: categories.data,
    })
  }

  pub async fn load_order_page(&self) -> Result<OrderPage, CatalogError> {
    let (orders, products) = futures::try_join!(self.get_orders(), self.get_products())?;
    Ok(OrderPage {
      orders,
      products: products.data,
    })
  }

  pub async fn load_dashboard(&self) -> Result<DashboardStats, CatalogError> {
    let (categories, products, orders) = futures::try_join!(
      self.get_categories(),
      self.get_products(),
      self.get_orders()
    )?;
    Ok(DashboardStats::compute(
      &categories.data,
      &products.data,
      &orders,
    ))
  }

  // ==========================================================================
  // Categories
  // ==========================================================================

  pub async fn create_category(&self, draft: CategoryDraft) -> Result<Vec<Category>, CatalogError> {
    self.api.create_category(&draft).await?;
    info!(name = %draft.name_en, "Created category");
    self.refetch_categories(&[]).await
  }

  pub async fn update_category(
    &self,
    category: Category,
    draft: CategoryDraft,
  ) -> Result<Vec<Category>, CatalogError> {
    self.api.update_category(category.id, &draft).await?;
    info!(id = category.id, name = %draft.name_en, "Updated category");
    self.refetch_categories(&[]).await
  }

  /// Delete after the user retyped the category's English name.
  ///
  /// Viruses and products may reference the category, so their entries are
  /// invalidated as well.
  pub async fn delete_category(
    &self,
    category: Category,
    typed: String,
  ) -> Result<Vec<Category>, CatalogError> {
    confirm_deletion("Category", &category.name_en, &typed)?;
    self.api.delete_category(category.id).await?;
    info!(id = category.id, name = %category.name_en, "Deleted category");
    self
      .refetch_categories(&[ResourceKey::Viruses, ResourceKey::Products])
      .await
  }

  // ==========================================================================
  // Viruses
  // ==========================================================================

  pub async fn create_virus(&self, draft: VirusDraft) -> Result<Vec<Virus>, CatalogError> {
    self.api.create_virus(&draft).await?;
    info!(name = %draft.name_en, category = draft.category_id, "Created virus");
    self.refetch_viruses(&[]).await
  }

  pub async fn update_virus(&self, id: VirusId, draft: VirusDraft) -> Result<Vec<Virus>, CatalogError> {
    self.api.update_virus(id, &draft).await?;
    info!(id, name = %draft.name_en, "Updated virus");
    self.refetch_viruses(&[]).await
  }

  pub async fn delete_virus(&self, id: VirusId) -> Result<Vec<Virus>, CatalogError> {
    self.api.delete_virus(id).await?;
    info!(id, "Deleted virus");
    self.refetch_viruses(&[ResourceKey::Products]).await
  }

  // ==========================================================================
  // Products
  // ==========================================================================

  pub async fn create_product(&self, draft: ProductDraft) -> Result<Vec<Product>, CatalogError> {
    self.api.create_product(&draft).await?;
    info!(name = %draft.name_en, "Created product");
    self.refetch_products().await
  }

  pub async fn update_product(
    &self,
    product: Product,
    draft: ProductDraft,
  ) -> Result<Vec<Product>, CatalogError> {
    self.api.update_product(product.id, &draft).await?;
    info!(id = product.id, name = %draft.name_en, "Updated product");
    self.refetch_products().await
  }

  pub async fn update_price(&self, product: Product, price: f64) -> Result<Vec<Product>, CatalogError> {
    let draft = ProductDraft::from_product(&product).with_price(price);
    self.update_product(product, draft).await
  }

  pub async fn update_stock(&self, product: Product, quantity: u32) -> Result<Vec<Product>, CatalogError> {
    let draft = ProductDraft::from_product(&product).with_quantity(quantity);
    self.update_product(product, draft).await
  }

  /// Delete after the user retyped the product's English name.
  pub async fn delete_product(
    &self,
    product: Product,
    typed: String,
  ) -> Result<Vec<Product>, CatalogError> {
    confirm_deletion("Product", &product.name_en, &typed)?;
    self.api.delete_product(product.id).await?;
    info!(id = product.id, name = %product.name_en, "Deleted product");
    self.refetch_products().await
  }

  // ==========================================================================
  // Orders
  // ==========================================================================

  pub async fn update_order_status(
    &self,
    id: OrderId,
    status: OrderStatus,
  ) -> Result<Vec<Order>, CatalogError> {
    self.api.update_order_status(id, status).await?;
    info!(id, %status, "Updated order status");
    self.get_orders().await
  }

  /// Drop every cached list.
  pub fn clear_cache(&self) -> Result<(), CatalogError> {
    self.invalidate(&ResourceKey::ALL)?;
    info!("Cleared cache");
    Ok(())
  }
}
