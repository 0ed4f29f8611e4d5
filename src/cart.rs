//! WhatsApp checkout cart.
//!
//! Orders are not placed through the backend: the cart builds a message
//! for the vendor and a `wa.me` link that opens it in WhatsApp.

use thiserror::Error;
use url::Url;

use crate::catalog::types::Product;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
  #[error("Please fill in all fields (missing: {})", .0.join(", "))]
  Incomplete(Vec<&'static str>),
  #[error("Invalid vendor number '{0}'")]
  InvalidVendor(String),
}

/// Buyer details sent along with the items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutDetails {
  pub username: String,
  pub mobile: String,
  pub location_link: String,
}

impl CheckoutDetails {
  pub const FIELDS: [&'static str; 3] = ["Name", "Mobile", "Location link"];

  pub fn from_fields(fields: &[String]) -> Self {
    let field = |i: usize| {
      fields
        .get(i)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
    };
    Self {
      username: field(0),
      mobile: field(1),
      location_link: field(2),
    }
  }

  pub fn to_fields(&self) -> Vec<String> {
    vec![
      self.username.clone(),
      self.mobile.clone(),
      self.location_link.clone(),
    ]
  }
}

/// Cart line for a product
pub fn item_label(product: &Product) -> String {
  if product.company.is_empty() {
    format!("{} - ₹{}", product.name_en, product.price)
  } else {
    format!("{} ({}) - ₹{}", product.name_en, product.company, product.price)
  }
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
  items: Vec<String>,
}

impl Cart {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(&mut self, item: impl Into<String>) {
    self.items.push(item.into());
  }

  pub fn remove(&mut self, index: usize) -> Option<String> {
    (index < self.items.len()).then(|| self.items.remove(index))
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }

  pub fn items(&self) -> &[String] {
    &self.items
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  fn check(&self, details: &CheckoutDetails) -> Result<(), CartError> {
    let mut missing = Vec::new();
    if details.username.trim().is_empty() {
      missing.push("name");
    }
    if details.mobile.trim().is_empty() {
      missing.push("mobile");
    }
    if details.location_link.trim().is_empty() {
      missing.push("location");
    }
    if self.items.is_empty() {
      missing.push("items");
    }
    if missing.is_empty() {
      Ok(())
    } else {
      Err(CartError::Incomplete(missing))
    }
  }

  /// Vendor message with numbered items.
  pub fn message(&self, details: &CheckoutDetails) -> Result<String, CartError> {
    self.check(details)?;
    let items = self
      .items
      .iter()
      .enumerate()
      .map(|(i, item)| format!("{}. {}", i + 1, item))
      .collect::<Vec<_>>()
      .join("\n");
    Ok(format!(
      "Hello Vendor,\n\nUser: {}\nMobile: {}\nLocation: {}\n\nItems:\n{}",
      details.username, details.mobile, details.location_link, items
    ))
  }

  /// `https://wa.me/<vendor>?text=<message>` link.
  pub fn whatsapp_url(&self, vendor_number: &str, details: &CheckoutDetails) -> Result<Url, CartError> {
    let message = self.message(details)?;
    let vendor = vendor_number.trim();
    if vendor.is_empty() || !vendor.chars().all(|c| c.is_ascii_digit()) {
      return Err(CartError::InvalidVendor(vendor_number.to_string()));
    }
    Url::parse_with_params(&format!("https://wa.me/{}", vendor), &[("text", message)])
      .map_err(|_| CartError::InvalidVendor(vendor_number.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::product;

  fn details() -> CheckoutDetails {
    CheckoutDetails {
      username: "Ravi".to_string(),
      mobile: "9876543210".to_string(),
      location_link: "https://www.google.com/maps?q=17.385,78.4867".to_string(),
    }
  }

  fn cart() -> Cart {
    let mut cart = Cart::new();
    cart.add("WeedOut");
    cart.add("FungAway");
    cart
  }

  #[test]
  fn test_message_numbers_items() {
    let message = cart().message(&details()).unwrap();
    assert_eq!(
      message,
      "Hello Vendor,\n\nUser: Ravi\nMobile: 9876543210\n\
       Location: https://www.google.com/maps?q=17.385,78.4867\n\n\
       Items:\n1. WeedOut\n2. FungAway"
    );
  }

  #[test]
  fn test_whatsapp_url_round_trips_message() {
    let cart = cart();
    let url = cart.whatsapp_url("916303343274", &details()).unwrap();
    assert_eq!(url.host_str(), Some("wa.me"));
    assert_eq!(url.path(), "/916303343274");

    let text = url
      .query_pairs()
      .find(|(k, _)| k == "text")
      .map(|(_, v)| v.into_owned())
      .unwrap();
    assert_eq!(text, cart.message(&details()).unwrap());
  }

  #[test]
  fn test_all_fields_required() {
    let err = Cart::new()
      .message(&CheckoutDetails {
        username: "Ravi".to_string(),
        ..Default::default()
      })
      .unwrap_err();
    assert_eq!(
      err,
      CartError::Incomplete(vec!["mobile", "location", "items"])
    );
  }

  #[test]
  fn test_rejects_bad_vendor_number() {
    assert_eq!(
      cart().whatsapp_url("+91 630", &details()),
      Err(CartError::InvalidVendor("+91 630".to_string()))
    );
  }

  #[test]
  fn test_remove_out_of_range() {
    let mut cart = cart();
    assert_eq!(cart.remove(5), None);
    assert_eq!(cart.remove(0).as_deref(), Some("WeedOut"));
    assert_eq!(cart.len(), 1);
  }

  #[test]
  fn test_item_label() {
    let p = product(10, "WeedOut", "", &[1], &[], None);
    assert_eq!(item_label(&p), "WeedOut (Agro) - ₹10");
  }

  #[test]
  fn test_checkout_fields_are_trimmed() {
    let fields = vec![" Ravi ".to_string(), "98765".to_string()];
    let details = CheckoutDetails::from_fields(&fields);
    assert_eq!(details.username, "Ravi");
    assert_eq!(details.location_link, "");
  }
}
