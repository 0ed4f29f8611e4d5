use serde::{Deserialize, Serialize};
use std::fmt;

pub type CategoryId = i64;
pub type VirusId = i64;
pub type ProductId = i64;
pub type OrderId = i64;

/// Product category (herbicide, fungicide, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id: CategoryId,
  #[serde(default)]
  pub name_en: String,
  #[serde(default)]
  pub name_te: String,
}

/// Target virus, pest or disease a product treats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Virus {
  pub id: VirusId,
  #[serde(default)]
  pub name_en: String,
  #[serde(default)]
  pub name_te: String,
  /// Owning category. Older backends may omit it.
  #[serde(default)]
  pub category_id: Option<CategoryId>,
}

/// Physical form of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
  Liquid,
  Solid,
}

impl ProductType {
  pub const ALL: [ProductType; 2] = [ProductType::Liquid, ProductType::Solid];

  pub fn as_str(&self) -> &'static str {
    match self {
      ProductType::Liquid => "Liquid",
      ProductType::Solid => "Solid",
    }
  }

  /// Parse a backend or user supplied label ("liquid", " Solid ").
  pub fn parse(label: &str) -> Option<Self> {
    let label = label.trim();
    Self::ALL
      .into_iter()
      .find(|t| t.as_str().eq_ignore_ascii_case(label))
  }
}

impl fmt::Display for ProductType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Catalog product in its canonical many-to-many form.
///
/// Backends that only know a single category or virus per product are
/// decoded into one-element lists; see `api_types::ApiProduct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  #[serde(default)]
  pub name_en: String,
  #[serde(default)]
  pub name_te: String,
  #[serde(default)]
  pub company: String,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub quantity: u32,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub product_type: Option<ProductType>,
  #[serde(default)]
  pub image_url: Option<String>,
  #[serde(default)]
  pub category_ids: Vec<CategoryId>,
  #[serde(default)]
  pub virus_ids: Vec<VirusId>,
}

impl Product {
  pub fn in_category(&self, id: CategoryId) -> bool {
    self.category_ids.contains(&id)
  }

  pub fn targets_virus(&self, id: VirusId) -> bool {
    self.virus_ids.contains(&id)
  }

  pub fn in_stock(&self) -> bool {
    self.quantity > 0
  }
}

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
  Pending,
  Shipped,
  Completed,
  Cancelled,
  /// Status string this client does not know about
  Unknown,
}

impl OrderStatus {
  /// Statuses an admin can filter by or move an order to.
  pub const KNOWN: [OrderStatus; 4] = [
    OrderStatus::Pending,
    OrderStatus::Shipped,
    OrderStatus::Completed,
    OrderStatus::Cancelled,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Unknown => "unknown",
    }
  }

  pub fn parse(label: &str) -> Self {
    let label = label.trim();
    Self::KNOWN
      .into_iter()
      .find(|s| s.as_str().eq_ignore_ascii_case(label))
      .unwrap_or(OrderStatus::Unknown)
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Customer order
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
  pub id: OrderId,
  pub product_id: Option<ProductId>,
  pub quantity: u32,
  pub total: f64,
  pub date: String,
  pub status: OrderStatus,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_product_type_parse_is_trimmed_and_case_insensitive() {
    assert_eq!(ProductType::parse(" liquid "), Some(ProductType::Liquid));
    assert_eq!(ProductType::parse("SOLID"), Some(ProductType::Solid));
    assert_eq!(ProductType::parse("powder"), None);
  }

  #[test]
  fn test_order_status_parse() {
    assert_eq!(OrderStatus::parse("Shipped"), OrderStatus::Shipped);
    assert_eq!(OrderStatus::parse("lost"), OrderStatus::Unknown);
  }

  #[test]
  fn test_product_relationship_helpers() {
    let product = Product {
      id: 1,
      name_en: "WeedOut".to_string(),
      name_te: String::new(),
      company: String::new(),
      price: 10.0,
      quantity: 0,
      description: String::new(),
      product_type: None,
      image_url: None,
      category_ids: vec![1, 2],
      virus_ids: vec![7],
    };
    assert!(product.in_category(2));
    assert!(!product.in_category(3));
    assert!(product.targets_virus(7));
    assert!(!product.in_stock());
  }
}
