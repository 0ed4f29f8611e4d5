//! The REST backend as seen by the rest of the crate.

use async_trait::async_trait;
use thiserror::Error;

use super::drafts::{CategoryDraft, ProductDraft, VirusDraft};
use super::types::{
  Category, CategoryId, Order, OrderId, OrderStatus, Product, ProductId, Virus, VirusId,
};

/// Failure talking to the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
  /// Backend unreachable or the connection broke
  #[error("Network error. Please try again. ({0})")]
  Network(String),
  /// Backend answered with a non-2xx status
  #[error("{message} (HTTP {status})")]
  Server { status: u16, message: String },
  /// Backend answered 2xx with a body we could not read
  #[error("Unexpected response from {endpoint}: {reason}")]
  Decode { endpoint: String, reason: String },
}

/// Catalog operations offered by the backend.
///
/// Mutations do not return the written entity; callers refetch the list.
#[async_trait]
pub trait CatalogApi: Send + Sync {
  async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;
  async fn list_viruses(&self) -> Result<Vec<Virus>, ApiError>;
  async fn list_products(&self) -> Result<Vec<Product>, ApiError>;
  async fn list_orders(&self) -> Result<Vec<Order>, ApiError>;

  async fn create_category(&self, draft: &CategoryDraft) -> Result<(), ApiError>;
  async fn update_category(&self, id: CategoryId, draft: &CategoryDraft) -> Result<(), ApiError>;
  async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError>;

  async fn create_virus(&self, draft: &VirusDraft) -> Result<(), ApiError>;
  async fn update_virus(&self, id: VirusId, draft: &VirusDraft) -> Result<(), ApiError>;
  async fn delete_virus(&self, id: VirusId) -> Result<(), ApiError>;

  async fn create_product(&self, draft: &ProductDraft) -> Result<(), ApiError>;
  async fn update_product(&self, id: ProductId, draft: &ProductDraft) -> Result<(), ApiError>;
  async fn delete_product(&self, id: ProductId) -> Result<(), ApiError>;

  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<(), ApiError>;
}
