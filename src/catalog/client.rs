use crate::catalog::api::{ApiError, CatalogApi};
use crate::catalog::api_types::{
  ApiCategory, ApiErrorBody, ApiOrder, ApiOrderStatusPayload, ApiProduct, ApiProductPayload,
  ApiRelated, ApiVirus,
};
use crate::catalog::drafts::{CategoryDraft, ProductDraft, VirusDraft};
use crate::catalog::types::{
  Category, CategoryId, Order, OrderId, OrderStatus, Product, ProductId, Virus, VirusId,
};
use crate::config::Config;
use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use futures::future::try_join_all;
use reqwest::{Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const CATEGORY: &str = "/category";
const VIRUS: &str = "/virus";
const PRODUCT: &str = "/product";
const ORDER: &str = "/order";

const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// REST client for the catalog backend
#[derive(Clone)]
pub struct HttpCatalogClient {
  http: reqwest::Client,
  base_url: String,
  token: Option<String>,
  hydrate_relations: bool,
}

impl HttpCatalogClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base_url = config.api.validated_base_url()?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .user_agent(concat!("raythu-admin/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: base_url.as_str().trim_end_matches('/').to_string(),
      token: Config::get_api_token(),
      hydrate_relations: config.api.hydrate_product_relations,
    })
  }

  fn endpoint(&self, path: &str) -> String {
    join_url(&self.base_url, path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let url = self.endpoint(path);
    debug!(%method, %url, "Sending request");
    let builder = self.http.request(method, url);
    match &self.token {
      Some(token) => builder.bearer_auth(token),
      None => builder,
    }
  }

  async fn send(&self, builder: RequestBuilder, path: &str) -> Result<Response, ApiError> {
    let response = builder
      .send()
      .await
      .map_err(|e| ApiError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = server_message(&body);
    warn!(%status, path, "Backend rejected request: {}", message);
    Err(ApiError::Server {
      status: status.as_u16(),
      message,
    })
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    let response = self.send(self.request(Method::GET, path), path).await?;
    response.json::<T>().await.map_err(|e| ApiError::Decode {
      endpoint: path.to_string(),
      reason: e.to_string(),
    })
  }

  async fn send_json<B: Serialize + ?Sized>(
    &self,
    method: Method,
    path: &str,
    body: &B,
  ) -> Result<(), ApiError> {
    self
      .send(self.request(method, path).json(body), path)
      .await?;
    Ok(())
  }

  async fn delete(&self, path: &str) -> Result<(), ApiError> {
    self.send(self.request(Method::DELETE, path), path).await?;
    Ok(())
  }

  /// Fetch the category and virus links of every product. Any failure fails
  /// the whole list.
  async fn hydrate(&self, products: Vec<ApiProduct>) -> Result<Vec<ApiProduct>, ApiError> {
    try_join_all(products.into_iter().map(|product| async move {
      let categories_path = format!("{}/{}/categories", PRODUCT, product.id);
      let viruses_path = format!("{}/{}/viruses", PRODUCT, product.id);
      let (categories, viruses) = futures::try_join!(
        self.get_json::<Vec<ApiRelated>>(&categories_path),
        self.get_json::<Vec<ApiRelated>>(&viruses_path),
      )?;
      Ok::<_, ApiError>(product.with_relations(categories, viruses))
    }))
    .await
  }
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
  async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
    let categories: Vec<ApiCategory> = self.get_json(CATEGORY).await?;
    Ok(categories.into_iter().map(Category::from).collect())
  }

  async fn list_viruses(&self) -> Result<Vec<Virus>, ApiError> {
    let viruses: Vec<ApiVirus> = self.get_json(VIRUS).await?;
    Ok(viruses.into_iter().map(Virus::from).collect())
  }

  async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
    let mut products: Vec<ApiProduct> = self.get_json(PRODUCT).await?;
    if self.hydrate_relations {
      products = self.hydrate(products).await?;
    }
    Ok(products.into_iter().map(ApiProduct::into_product).collect())
  }

  async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
    let orders: Vec<ApiOrder> = self.get_json(ORDER).await?;
    Ok(orders.into_iter().map(Order::from).collect())
  }

  async fn create_category(&self, draft: &CategoryDraft) -> Result<(), ApiError> {
    self.send_json(Method::POST, CATEGORY, draft).await
  }

  async fn update_category(&self, id: CategoryId, draft: &CategoryDraft) -> Result<(), ApiError> {
    let path = format!("{}/{}", CATEGORY, id);
    self.send_json(Method::PUT, &path, draft).await
  }

  async fn delete_category(&self, id: CategoryId) -> Result<(), ApiError> {
    self.delete(&format!("{}/{}", CATEGORY, id)).await
  }

  async fn create_virus(&self, draft: &VirusDraft) -> Result<(), ApiError> {
    self.send_json(Method::POST, VIRUS, draft).await
  }

  async fn update_virus(&self, id: VirusId, draft: &VirusDraft) -> Result<(), ApiError> {
    let path = format!("{}/{}", VIRUS, id);
    self.send_json(Method::PUT, &path, draft).await
  }

  async fn delete_virus(&self, id: VirusId) -> Result<(), ApiError> {
    self.delete(&format!("{}/{}", VIRUS, id)).await
  }

  async fn create_product(&self, draft: &ProductDraft) -> Result<(), ApiError> {
    self
      .send_json(Method::POST, PRODUCT, &ApiProductPayload::from(draft))
      .await
  }

  async fn update_product(&self, id: ProductId, draft: &ProductDraft) -> Result<(), ApiError> {
    let path = format!("{}/{}", PRODUCT, id);
    self
      .send_json(Method::PUT, &path, &ApiProductPayload::from(draft))
      .await
  }

  async fn delete_product(&self, id: ProductId) -> Result<(), ApiError> {
    self.delete(&format!("{}/{}", PRODUCT, id)).await
  }

  async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<(), ApiError> {
    let path = format!("{}/{}/status", ORDER, id);
    let body = ApiOrderStatusPayload {
      status: status.as_str(),
    };
    self.send_json(Method::PUT, &path, &body).await
  }
}

/// Join a base URL and an absolute route without doubling slashes
fn join_url(base: &str, path: &str) -> String {
  format!(
    "{}/{}",
    base.trim_end_matches('/'),
    path.trim_start_matches('/')
  )
}

/// Extract the user-facing message from an error body
fn server_message(body: &str) -> String {
  serde_json::from_str::<ApiErrorBody>(body)
    .ok()
    .and_then(|b| b.message)
    .filter(|m| !m.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
}
