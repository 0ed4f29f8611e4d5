//! Serde types matching the REST backend's JSON.
//!
//! These types are separate from domain types because backend variants
//! disagree on field shapes (single ids vs. id arrays vs. nested entities,
//! numbers vs. numeric strings). Everything funnels into the canonical
//! types in `types.rs`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::drafts::ProductDraft;
use super::types::{Category, Order, OrderStatus, Product, ProductType, Virus};

// ============================================================================
// Loose scalar shapes
// ============================================================================

/// An id that may arrive as a number or a string ("3")
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiId {
  Int(i64),
  Text(String),
}

impl ApiId {
  pub fn as_id(&self) -> Option<i64> {
    match self {
      ApiId::Int(id) => Some(*id),
      ApiId::Text(text) => {
        let parsed = text.trim().parse().ok();
        if parsed.is_none() {
          debug!("Ignoring unparsable id {:?}", text);
        }
        parsed
      }
    }
  }
}

/// `category_id` / `virus_id`: one id or a list of ids
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiIdField {
  One(ApiId),
  Many(Vec<ApiId>),
}

impl ApiIdField {
  fn ids(&self) -> Vec<i64> {
    match self {
      ApiIdField::One(id) => id.as_id().into_iter().collect(),
      ApiIdField::Many(ids) => ids.iter().filter_map(ApiId::as_id).collect(),
    }
  }
}

/// A number that may arrive as a string ("120.50")
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiNumber {
  Int(i64),
  Float(f64),
  Text(String),
}

impl ApiNumber {
  fn as_f64(&self) -> Option<f64> {
    match self {
      ApiNumber::Int(n) => Some(*n as f64),
      ApiNumber::Float(n) => Some(*n),
      ApiNumber::Text(text) => text.trim().parse().ok(),
    }
  }

  fn as_u32(&self) -> Option<u32> {
    match self {
      ApiNumber::Int(n) => u32::try_from(*n).ok(),
      ApiNumber::Float(n) if *n >= 0.0 => Some(*n as u32),
      ApiNumber::Float(_) => None,
      ApiNumber::Text(text) => text.trim().parse().ok(),
    }
  }
}

/// Related entity embedded in a product (`categories: [{ id, name_en }]`)
#[derive(Debug, Clone, Deserialize)]
pub struct ApiRelated {
  pub id: ApiId,
}

fn dedup(ids: Vec<i64>) -> Vec<i64> {
  let mut unique = Vec::with_capacity(ids.len());
  for id in ids {
    if !unique.contains(&id) {
      unique.push(id);
    }
  }
  unique
}

/// Nested entity lists win over the flat id field when both are present.
fn relation_ids(nested: Option<&[ApiRelated]>, flat: Option<&ApiIdField>) -> Vec<i64> {
  let ids = match (nested, flat) {
    (Some(related), _) => related.iter().filter_map(|r| r.id.as_id()).collect(),
    (None, Some(field)) => field.ids(),
    (None, None) => Vec::new(),
  };
  dedup(ids)
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiCategory {
  pub id: i64,
  pub name_en: Option<String>,
  pub name_te: Option<String>,
}

impl From<ApiCategory> for Category {
  fn from(api: ApiCategory) -> Self {
    Category {
      id: api.id,
      name_en: api.name_en.unwrap_or_default(),
      name_te: api.name_te.unwrap_or_default(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiVirus {
  pub id: i64,
  pub name_en: Option<String>,
  pub name_te: Option<String>,
  pub category_id: Option<ApiId>,
}

impl From<ApiVirus> for Virus {
  fn from(api: ApiVirus) -> Self {
    Virus {
      id: api.id,
      name_en: api.name_en.unwrap_or_default(),
      name_te: api.name_te.unwrap_or_default(),
      category_id: api.category_id.as_ref().and_then(ApiId::as_id),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiProduct {
  pub id: i64,
  pub name_en: Option<String>,
  pub name_te: Option<String>,
  pub company: Option<String>,
  pub price: Option<ApiNumber>,
  pub quantity: Option<ApiNumber>,
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub product_type: Option<String>,
  pub image_url: Option<String>,
  #[serde(rename = "imageUrl")]
  pub image_url_camel: Option<String>,
  pub categories: Option<Vec<ApiRelated>>,
  pub viruses: Option<Vec<ApiRelated>>,
  pub category_id: Option<ApiIdField>,
  pub virus_id: Option<ApiIdField>,
}

impl ApiProduct {
  /// Attach relation lists fetched separately for this product.
  pub fn with_relations(mut self, categories: Vec<ApiRelated>, viruses: Vec<ApiRelated>) -> Self {
    self.categories = Some(categories);
    self.viruses = Some(viruses);
    self
  }

  pub fn into_product(self) -> Product {
    let category_ids = relation_ids(self.categories.as_deref(), self.category_id.as_ref());
    let virus_ids = relation_ids(self.viruses.as_deref(), self.virus_id.as_ref());
    let image_url = self
      .image_url
      .or(self.image_url_camel)
      .filter(|url| !url.trim().is_empty());

    Product {
      id: self.id,
      name_en: self.name_en.unwrap_or_default(),
      name_te: self.name_te.unwrap_or_default(),
      company: self.company.unwrap_or_default(),
      price: self.price.as_ref().and_then(ApiNumber::as_f64).unwrap_or(0.0),
      quantity: self.quantity.as_ref().and_then(ApiNumber::as_u32).unwrap_or(0),
      description: self.description.unwrap_or_default(),
      product_type: self.product_type.as_deref().and_then(ProductType::parse),
      image_url,
      category_ids,
      virus_ids,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiOrder {
  pub id: i64,
  pub product_id: Option<ApiId>,
  pub quantity: Option<ApiNumber>,
  pub total: Option<ApiNumber>,
  pub date: Option<String>,
  pub status: Option<String>,
}

impl From<ApiOrder> for Order {
  fn from(api: ApiOrder) -> Self {
    Order {
      id: api.id,
      product_id: api.product_id.as_ref().and_then(ApiId::as_id),
      quantity: api.quantity.as_ref().and_then(ApiNumber::as_u32).unwrap_or(0),
      total: api.total.as_ref().and_then(ApiNumber::as_f64).unwrap_or(0.0),
      date: api.date.unwrap_or_default(),
      status: api
        .status
        .as_deref()
        .map(OrderStatus::parse)
        .unwrap_or(OrderStatus::Unknown),
    }
  }
}

/// Error body returned by the backend on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  pub message: Option<String>,
}

// ============================================================================
// Request bodies
// ============================================================================

/// Product body in the multi-select form shape: relations are arrays of
/// string-encoded ids.
#[derive(Debug, Serialize)]
pub struct ApiProductPayload<'a> {
  pub name_en: &'a str,
  pub name_te: &'a str,
  pub company: &'a str,
  pub price: f64,
  pub quantity: u32,
  pub description: &'a str,
  #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
  pub product_type: Option<&'static str>,
  pub image_url: &'a str,
  pub category_id: Vec<String>,
  pub virus_id: Vec<String>,
}

impl<'a> From<&'a ProductDraft> for ApiProductPayload<'a> {
  fn from(draft: &'a ProductDraft) -> Self {
    Self {
      name_en: &draft.name_en,
      name_te: &draft.name_te,
      company: &draft.company,
      price: draft.price,
      quantity: draft.quantity,
      description: &draft.description,
      product_type: draft.product_type.map(|t| t.as_str()),
      image_url: draft.image_url.as_deref().unwrap_or_default(),
      category_id: draft.category_ids.iter().map(|id| id.to_string()).collect(),
      virus_id: draft.virus_ids.iter().map(|id| id.to_string()).collect(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ApiOrderStatusPayload {
  pub status: &'static str,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn decode(value: serde_json::Value) -> Product {
    serde_json::from_value::<ApiProduct>(value)
      .unwrap()
      .into_product()
  }

  #[test]
  fn test_single_valued_product() {
    let product = decode(json!({
      "id": 10, "name_en": "WeedOut", "name_te": "వీడ్",
      "category_id": 1, "virus_id": 100, "type": "liquid",
      "price": 250, "quantity": 4
    }));
    assert_eq!(product.category_ids, vec![1]);
    assert_eq!(product.virus_ids, vec![100]);
    assert_eq!(product.product_type, Some(ProductType::Liquid));
    assert_eq!(product.price, 250.0);
    assert_eq!(product.quantity, 4);
  }

  #[test]
  fn test_string_encoded_id_arrays() {
    let product = decode(json!({
      "id": 11, "category_id": ["1", "2", "2"], "virus_id": ["7", "oops"],
      "price": "99.50"
    }));
    assert_eq!(product.category_ids, vec![1, 2]);
    assert_eq!(product.virus_ids, vec![7]);
    assert_eq!(product.price, 99.5);
  }

  #[test]
  fn test_nested_relations_take_precedence() {
    let product = decode(json!({
      "id": 12,
      "categories": [{ "id": 3, "name_en": "Insecticide" }, { "id": "4" }],
      "category_id": 1,
      "viruses": [],
      "imageUrl": "https://img/1.png"
    }));
    assert_eq!(product.category_ids, vec![3, 4]);
    assert!(product.virus_ids.is_empty());
    assert_eq!(product.image_url.as_deref(), Some("https://img/1.png"));
  }

  #[test]
  fn test_missing_fields_decode_to_defaults() {
    let product = decode(json!({ "id": 13, "name_en": null, "type": "gel" }));
    assert_eq!(product.name_en, "");
    assert!(product.category_ids.is_empty());
    assert_eq!(product.product_type, None);
    assert_eq!(product.image_url, None);
  }

  #[test]
  fn test_virus_with_string_category() {
    let api: ApiVirus =
      serde_json::from_value(json!({ "id": 100, "name_en": "Blight", "category_id": "2" }))
        .unwrap();
    let virus = Virus::from(api);
    assert_eq!(virus.category_id, Some(2));
    assert_eq!(virus.name_te, "");
  }

  #[test]
  fn test_order_with_unknown_status() {
    let api: ApiOrder = serde_json::from_value(json!({
      "id": 5, "product_id": 10, "quantity": 2, "total": "500", "status": "returned"
    }))
    .unwrap();
    let order = Order::from(api);
    assert_eq!(order.status, OrderStatus::Unknown);
    assert_eq!(order.total, 500.0);
    assert_eq!(order.product_id, Some(10));
  }

  #[test]
  fn test_product_payload_uses_string_ids() {
    let draft = ProductDraft {
      name_en: "WeedOut".to_string(),
      name_te: "వీడ్".to_string(),
      company: "Agro".to_string(),
      price: 10.0,
      quantity: 1,
      product_type: Some(ProductType::Solid),
      category_ids: vec![1, 2],
      virus_ids: vec![100],
      image_url: None,
      description: String::new(),
    };
    let value = serde_json::to_value(ApiProductPayload::from(&draft)).unwrap();
    assert_eq!(value["category_id"], json!(["1", "2"]));
    assert_eq!(value["virus_id"], json!(["100"]));
    assert_eq!(value["type"], json!("Solid"));
    assert_eq!(value["image_url"], json!(""));

    let untyped = ProductDraft {
      product_type: None,
      ..draft
    };
    let value = serde_json::to_value(ApiProductPayload::from(&untyped)).unwrap();
    assert!(value.get("type").is_none());
  }
}
