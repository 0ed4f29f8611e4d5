//! Fixtures and fakes shared by unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::cache::{KeyValueStore, MemoryStore, ResourceCache};
use crate::catalog::Catalog;
use crate::catalog::api::{ApiError, CatalogApi};
use crate::catalog::drafts::{CategoryDraft, ProductDraft, VirusDraft};
use crate::catalog::types::{
  Category, CategoryId, Order, OrderId, OrderStatus, Product, ProductId, ProductType, Virus,
  VirusId,
};

pub(crate) fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
    .with_test_writer()
    .try_init();
}

pub(crate) fn category(id: CategoryId, name_en: &str) -> Category {
  Category {
    id,
    name_en: name_en.to_string(),
    name_te: String::new(),
  }
}

pub(crate) fn virus(id: VirusId, name_en: &str, category_id: Option<CategoryId>) -> Virus {
  Virus {
    id,
    name_en: name_en.to_string(),
    name_te: String::new(),
    category_id,
  }
}

pub(crate) fn product(
  id: ProductId,
  name_en: &str,
  name_te: &str,
  category_ids: &[CategoryId],
  virus_ids: &[VirusId],
  product_type: Option<ProductType>,
) -> Product {
  Product {
    id,
    name_en: name_en.to_string(),
    name_te: name_te.to_string(),
    company: "Agro".to_string(),
    price: 10.0,
    quantity: 5,
    description: String::new(),
    product_type,
    image_url: None,
    category_ids: category_ids.to_vec(),
    virus_ids: virus_ids.to_vec(),
  }
}

pub(crate) fn order(id: OrderId, status: OrderStatus) -> Order {
  Order {
    id,
    product_id: Some(10),
    quantity: 1,
    total: 10.0,
    date: "2024-03-01".to_string(),
    status,
  }
}

/// Shared, ordered record of backend calls and store writes.
pub(crate) type CallLog = Arc<Mutex<Vec<String>>>;

/// Memory store that logs `set` and `delete` into a call log.
pub(crate) struct RecordingStore {
  inner: MemoryStore,
  log: CallLog,
}

impl RecordingStore {
  pub(crate) fn new(log: CallLog) -> Self {
    Self {
      inner: MemoryStore::new(),
      log,
    }
  }
}

impl KeyValueStore for RecordingStore {
  fn get(&self, key: &str) -> Result<Option<String>> {
    self.inner.get(key)
  }

  fn set(&self, key: &str, value: &str) -> Result<()> {
    self.log.lock().unwrap().push(format!("set:{}", key));
    self.inner.set(key, value)
  }

  fn delete(&self, key: &str) -> Result<()> {
    self.log.lock().unwrap().push(format!("delete:{}", key));
    self.inner.delete(key)
  }
}

/// In-process backend holding its own lists.
#[derive(Default)]
pub(crate) struct FakeCatalogApi {
  categories: Mutex<Vec<Category>>,
  viruses: Mutex<Vec<Virus>>,
  products: Mutex<Vec<Product>>,
  orders: Mutex<Vec<Order>>,
  failing: Mutex<HashSet<&'static str>>,
  pub(crate) log: CallLog,
}

impl FakeCatalogApi {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn set_categories(&self, categories: Vec<Category>) {
    *self.categories.lock().unwrap() = categories;
  }

  pub(crate) fn set_viruses(&self, viruses: Vec<Virus>) {
    *self.viruses.lock().unwrap() = viruses;
  }

  pub(crate) fn set_products(&self, products: Vec<Product>) {
    *self.products.lock().unwrap() = products;
  }

  pub(crate) fn set_orders(&self, orders: Vec<Order>) {
    *self.orders.lock().unwrap() = orders;
  }

  /// Make every later call to `operation` fail with a network error.
  pub(crate) fn fail(&self, operation: &'static str) {
    self.failing.lock().unwrap().insert(operation);
  }

  pub(crate) fn calls(&self) -> Vec<String> {
    self.log.lock().unwrap().clone()
  }

  pub(crate) fn clear_log(&self) {
    self.log.lock().unwrap().clear();
  }

  pub(crate) fn count(&self, operation: &str) -> usize {
    self.calls().iter().filter(|c| *c == operation).count()
  }

  fn call(&self, operation: &'static str) -> Result<(), ApiError> {
    self.log.lock().unwrap().push(operation.to_string());
    if self.failing.lock().unwrap().contains(operation) {
      return Err(ApiError::Network("connection refused".to_string()));
    }
    Ok(())
  }

  fn not_found(id: i64) -> ApiError {
    ApiError::Server {
      status: 404,
      message: format!("{} not found", id),
    }
  }
}

fn apply_product_draft(id: ProductId, draft: &ProductDraft) -> Product {
  Product {
    id,
    name_en: draft.name_en.clone(),
    name_te: draft.name_te.clone(),
    company: draft.company.clone(),
    price: draft.price,
    quantity: draft.quantity,
    description: draft.description.clone(),
    product_type: draft.product_type,
    image_url: draft.image_url.clone(),
    category_ids: draft.category_ids.clone(),
    virus_ids: draft.virus_ids.clone(),
  }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
  ids.max().unwrap_or(0) + 1
}

#[async_trait]
impl CatalogApi for FakeCatalogApi {
  async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
    self.call("list_categories")?;
    Ok(self.categories.lock().unwrap().clone())
  }

  async fn list_viruses(&self) -> Result<Vec<Virus>, ApiError> {
    self.call("list_viruses")?;
    Ok(self.viruses.lock().unwrap().clone())
  }

  async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
    self.call("list_products")?;
    Ok(self.products.lock().unwrap().clone())
  }

  async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
    self.call("list_orders")?;
    Ok(self.orders.lock().unwrap().clone())
  }

  async fn create_category(&self, draft: &CategoryDraft) -> Result<(), ApiError> {
    self.call("create_category")?;
    let mut categories = self.categories.lock().unwrap();
    let id = next_id(categories.iter().map(|c| c.id));
    categories.push(Category {
      id,
      name_en: draft.name_en.clone(),
      name_te: draft.name_te.clone(),
    });
    Ok(())
  }

  async fn update_category(&self, id: CategoryId, draft: &CategoryDraft) -> Result<(), ApiError> {
    self.call("update_category")?;
    let mut categories = self.categories.lock().unwrap();
    let category = categories
      .iter_mut()
      .find(|c| c.id == id)
      .ok_or_else(|| Self::not_found(id))?;
    category.name_en = draft.name_en.clone();
    category.name_te = draft.name_te.clone();
    Ok(())
  }

  async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
    self.call("delete_category")?;
    self.categories.lock().unwrap().retain(|c| c.id != id);
    Ok(())
  }

  async fn create_virus(&self, draft: &VirusDraft) -> Result<(), ApiError> {
    self.call("create_virus")?;
    let mut viruses = self.viruses.lock().unwrap();
    let id = next_id(viruses.iter().map(|v| v.id));
    viruses.push(Virus {
      id,
      name_en: draft.name_en.clone(),
      name_te: draft.name_te.clone(),
      category_id: Some(draft.category_id),
    });
    Ok(())
  }

  async fn update_virus(&self, id: VirusId, draft: &VirusDraft) -> Result<(), ApiError> {
    self.call("update_virus")?;
    let mut viruses = self.viruses.lock().unwrap();
    let virus = viruses
      .iter_mut()
      .find(|v| v.id == id)
      .ok_or_else(|| Self::not_found(id))?;
    virus.name_en = draft.name_en.clone();
    virus.name_te = draft.name_te.clone();
    virus.category_id = Some(draft.category_id);
    Ok(())
  }

  async fn delete_virus(&self, id: VirusId) -> Result<(), ApiError> {
    self.call("delete_virus")?;
    self.viruses.lock().unwrap().retain(|v| v.id != id);
    Ok(())
  }

  async fn create_product(&self, draft: &ProductDraft) -> Result<(), ApiError> {
    self.call("create_product")?;
    let mut products = self.products.lock().unwrap();
    let id = next_id(products.iter().map(|p| p.id));
    products.push(apply_product_draft(id, draft));
    Ok(())
  }

  async fn update_product(&self, id: ProductId, draft: &ProductDraft) -> Result<(), ApiError> {
    self.call("update_product")?;
    let mut products = self.products.lock().unwrap();
    let product = products
      .iter_mut()
      .find(|p| p.id == id)
      .ok_or_else(|| Self::not_found(id))?;
    *product = apply_product_draft(id, draft);
    Ok(())
  }

  async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
    self.call("delete_product")?;
    self.products.lock().unwrap().retain(|p| p.id != id);
    Ok(())
  }

  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<(), ApiError> {
    self.call("update_order_status")?;
    let mut orders = self.orders.lock().unwrap();
    let order = orders
      .iter_mut()
      .find(|o| o.id == id)
      .ok_or_else(|| Self::not_found(id))?;
    order.status = status;
    Ok(())
  }
}

/// Context for view tests: the fake backend behind a memory cache.
pub(crate) fn app_context(api: Arc<FakeCatalogApi>) -> AppContext {
  let cache = ResourceCache::new(Arc::new(MemoryStore::new()));
  AppContext::new(Catalog::new(api, cache), "916303343274")
}
