//! Create/update bodies and their parsing from form text.

use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

use super::filter::{viruses_for_categories, SelectionMode};
use super::types::{Category, CategoryId, Product, ProductType, Virus, VirusId};

/// Reasons a form cannot be turned into a draft
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
  #[error("{0} is required")]
  Required(&'static str),
  #[error("Invalid {field}: '{value}'")]
  Invalid { field: &'static str, value: String },
  #[error("Unknown category {0}")]
  UnknownCategory(CategoryId),
  #[error("Virus {0} does not belong to the selected categories")]
  VirusOutsideCategories(VirusId),
}

fn required(field: &'static str, value: &str) -> Result<String, DraftError> {
  let value = value.trim();
  if value.is_empty() {
    return Err(DraftError::Required(field));
  }
  Ok(value.to_string())
}

/// Parse a comma or whitespace separated list of ids, dropping duplicates.
pub fn parse_id_list(field: &'static str, input: &str) -> Result<Vec<i64>, DraftError> {
  let mut ids = Vec::new();
  for token in input
    .split(|c: char| c == ',' || c.is_whitespace())
    .filter(|t| !t.is_empty())
  {
    let id = token.parse::<i64>().map_err(|_| DraftError::Invalid {
      field,
      value: token.to_string(),
    })?;
    if !ids.contains(&id) {
      ids.push(id);
    }
  }
  Ok(ids)
}

pub fn parse_price(input: &str) -> Result<f64, DraftError> {
  let invalid = || DraftError::Invalid {
    field: "price",
    value: input.trim().to_string(),
  };
  let price = input.trim().parse::<f64>().map_err(|_| invalid())?;
  if !price.is_finite() || price < 0.0 {
    return Err(invalid());
  }
  Ok(price)
}

pub fn parse_quantity(input: &str) -> Result<u32, DraftError> {
  input
    .trim()
    .parse::<u32>()
    .map_err(|_| DraftError::Invalid {
      field: "quantity",
      value: input.trim().to_string(),
    })
}

fn join_ids(ids: &[i64]) -> String {
  ids
    .iter()
    .map(|id| id.to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

/// Body for creating or renaming a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDraft {
  pub name_en: String,
  pub name_te: String,
}

impl CategoryDraft {
  pub const FIELDS: [&'static str; 2] = ["Name (English)", "Name (Telugu)"];

  pub fn from_category(category: &Category) -> Self {
    Self {
      name_en: category.name_en.clone(),
      name_te: category.name_te.clone(),
    }
  }

  pub fn to_fields(&self) -> Vec<String> {
    vec![self.name_en.clone(), self.name_te.clone()]
  }

  pub fn from_fields(fields: &[String]) -> Result<Self, DraftError> {
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or_default();
    Ok(Self {
      name_en: required("Name (English)", field(0))?,
      name_te: required("Name (Telugu)", field(1))?,
    })
  }
}

/// Body for creating or updating a virus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VirusDraft {
  pub name_en: String,
  pub name_te: String,
  pub category_id: CategoryId,
}

impl VirusDraft {
  pub const FIELDS: [&'static str; 3] = ["Name (English)", "Name (Telugu)", "Category (id)"];

  /// Empty draft preselecting the first category, as the form does.
  pub fn new_default(categories: &[Category]) -> Vec<String> {
    vec![
      String::new(),
      String::new(),
      categories
        .first()
        .map(|c| c.id.to_string())
        .unwrap_or_default(),
    ]
  }

  pub fn from_virus(virus: &Virus) -> Vec<String> {
    vec![
      virus.name_en.clone(),
      virus.name_te.clone(),
      virus.category_id.map(|c| c.to_string()).unwrap_or_default(),
    ]
  }

  pub fn from_fields(fields: &[String], categories: &[Category]) -> Result<Self, DraftError> {
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or_default();
    let name_en = required("Name (English)", field(0))?;
    let name_te = required("Name (Telugu)", field(1))?;
    let category = required("Category", field(2))?;
    let category_id = category
      .parse::<CategoryId>()
      .map_err(|_| DraftError::Invalid {
        field: "category",
        value: category.clone(),
      })?;
    if !categories.iter().any(|c| c.id == category_id) {
      return Err(DraftError::UnknownCategory(category_id));
    }
    Ok(Self {
      name_en,
      name_te,
      category_id,
    })
  }
}

/// Body for creating or updating a product
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
  pub name_en: String,
  pub name_te: String,
  pub company: String,
  pub price: f64,
  pub quantity: u32,
  /// Left unset when the product has no known type, so edits never invent one
  pub product_type: Option<ProductType>,
  pub category_ids: Vec<CategoryId>,
  pub virus_ids: Vec<VirusId>,
  pub image_url: Option<String>,
  pub description: String,
}

impl ProductDraft {
  pub const FIELDS: [&'static str; 10] = [
    "Name (English)",
    "Name (Telugu)",
    "Company",
    "Price (₹)",
    "Quantity",
    "Type (Liquid/Solid)",
    "Categories (ids)",
    "Target viruses (ids)",
    "Image URL",
    "Description",
  ];

  pub fn from_product(product: &Product) -> Self {
    Self {
      name_en: product.name_en.clone(),
      name_te: product.name_te.clone(),
      company: product.company.clone(),
      price: product.price,
      quantity: product.quantity,
      product_type: product.product_type,
      category_ids: product.category_ids.clone(),
      virus_ids: product.virus_ids.clone(),
      image_url: product.image_url.clone(),
      description: product.description.clone(),
    }
  }

  /// Form values for a new product: first category selected, first virus of
  /// that category preselected, type Liquid.
  pub fn default_fields(categories: &[Category], viruses: &[Virus]) -> Vec<String> {
    let selected: BTreeSet<CategoryId> = categories.first().map(|c| c.id).into_iter().collect();
    let first_virus = viruses_for_categories(viruses, &selected, SelectionMode::Multi)
      .first()
      .map(|v| v.id.to_string())
      .unwrap_or_default();

    vec![
      String::new(),
      String::new(),
      String::new(),
      String::new(),
      "0".to_string(),
      ProductType::Liquid.to_string(),
      join_ids(&selected.into_iter().collect::<Vec<_>>()),
      first_virus,
      String::new(),
      String::new(),
    ]
  }

  pub fn with_price(mut self, price: f64) -> Self {
    self.price = price;
    self
  }

  pub fn with_quantity(mut self, quantity: u32) -> Self {
    self.quantity = quantity;
    self
  }

  pub fn to_fields(&self) -> Vec<String> {
    vec![
      self.name_en.clone(),
      self.name_te.clone(),
      self.company.clone(),
      self.price.to_string(),
      self.quantity.to_string(),
      self
        .product_type
        .map(|t| t.to_string())
        .unwrap_or_default(),
      join_ids(&self.category_ids),
      join_ids(&self.virus_ids),
      self.image_url.clone().unwrap_or_default(),
      self.description.clone(),
    ]
  }

  /// Parse the product form and check its relations against the catalog.
  pub fn from_fields(
    fields: &[String],
    categories: &[Category],
    viruses: &[Virus],
  ) -> Result<Self, DraftError> {
    let field = |i: usize| fields.get(i).map(String::as_str).unwrap_or_default();

    // An empty type keeps the product untyped
    let type_label = field(5).trim();
    let product_type = if type_label.is_empty() {
      None
    } else {
      let parsed = ProductType::parse(type_label).ok_or_else(|| DraftError::Invalid {
        field: "type",
        value: type_label.to_string(),
      })?;
      Some(parsed)
    };

    let image_url = field(8).trim();
    let draft = Self {
      name_en: required("Name (English)", field(0))?,
      name_te: required("Name (Telugu)", field(1))?,
      company: required("Company", field(2))?,
      price: parse_price(field(3))?,
      quantity: parse_quantity(field(4))?,
      product_type,
      category_ids: parse_id_list("categories", field(6))?,
      virus_ids: parse_id_list("viruses", field(7))?,
      image_url: (!image_url.is_empty()).then(|| image_url.to_string()),
      description: field(9).trim().to_string(),
    };
    draft.validate_relations(categories, viruses)?;
    Ok(draft)
  }

  /// Every category must exist and every virus must be one the multi-select
  /// would offer for the chosen categories.
  pub fn validate_relations(
    &self,
    categories: &[Category],
    viruses: &[Virus],
  ) -> Result<(), DraftError> {
    if self.category_ids.is_empty() {
      return Err(DraftError::Required("Category"));
    }
    if let Some(unknown) = self
      .category_ids
      .iter()
      .find(|id| !categories.iter().any(|c| c.id == **id))
    {
      return Err(DraftError::UnknownCategory(*unknown));
    }

    let selected: BTreeSet<CategoryId> = self.category_ids.iter().copied().collect();
    let eligible = viruses_for_categories(viruses, &selected, SelectionMode::Multi);
    if let Some(outside) = self
      .virus_ids
      .iter()
      .find(|id| !eligible.iter().any(|v| v.id == **id))
    {
      return Err(DraftError::VirusOutsideCategories(*outside));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{category, product, virus};

  fn fields(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
  }

  #[test]
  fn test_parse_id_list() {
    assert_eq!(parse_id_list("ids", "1, 2 3,,2").unwrap(), vec![1, 2, 3]);
    assert_eq!(parse_id_list("ids", "  ").unwrap(), Vec::<i64>::new());
    assert!(matches!(
      parse_id_list("ids", "1, x"),
      Err(DraftError::Invalid { value, .. }) if value == "x"
    ));
  }

  #[test]
  fn test_parse_price_rejects_negative() {
    assert_eq!(parse_price(" 120.5 ").unwrap(), 120.5);
    assert!(parse_price("-1").is_err());
    assert!(parse_price("abc").is_err());
  }

  #[test]
  fn test_category_draft_requires_both_names() {
    assert_eq!(
      CategoryDraft::from_fields(&fields(&["Herbicide", " "])),
      Err(DraftError::Required("Name (Telugu)"))
    );
    let draft = CategoryDraft::from_fields(&fields(&[" Herbicide ", "కలుపు"])).unwrap();
    assert_eq!(draft.name_en, "Herbicide");
  }

  #[test]
  fn test_virus_draft_checks_category_exists() {
    let categories = vec![category(1, "Herbicide")];
    assert_eq!(
      VirusDraft::from_fields(&fields(&["Blight", "బ్లైట్", "9"]), &categories),
      Err(DraftError::UnknownCategory(9))
    );
    let draft = VirusDraft::from_fields(&fields(&["Blight", "బ్లైట్", "1"]), &categories).unwrap();
    assert_eq!(draft.category_id, 1);
  }

  #[test]
  fn test_virus_default_preselects_first_category() {
    let categories = vec![category(4, "Insecticide"), category(1, "Herbicide")];
    assert_eq!(VirusDraft::new_default(&categories)[2], "4");
  }

  #[test]
  fn test_product_default_fields_preselect_first_category_and_virus() {
    let categories = vec![category(1, "Herbicide"), category(2, "Fungicide")];
    let viruses = vec![virus(101, "Rust", Some(2)), virus(100, "Weeds", Some(1))];
    let values = ProductDraft::default_fields(&categories, &viruses);
    assert_eq!(values[6], "1");
    assert_eq!(values[7], "100");
    assert_eq!(values[5], "Liquid");
  }

  #[test]
  fn test_product_draft_round_trips_through_fields() {
    let categories = vec![category(1, "Herbicide"), category(2, "Fungicide")];
    let viruses = vec![virus(100, "Weeds", Some(1)), virus(101, "Rust", Some(2))];
    let original = product(10, "WeedOut", "వీడ్", &[1, 2], &[100, 101], Some(ProductType::Solid));

    let draft = ProductDraft::from_product(&original);
    let parsed = ProductDraft::from_fields(&draft.to_fields(), &categories, &viruses).unwrap();
    assert_eq!(parsed, draft);
  }

  #[test]
  fn test_product_draft_rejects_virus_outside_categories() {
    let categories = vec![category(1, "Herbicide"), category(2, "Fungicide")];
    let viruses = vec![virus(100, "Weeds", Some(1)), virus(101, "Rust", Some(2))];
    let values = fields(&[
      "WeedOut", "వీడ్", "Agro", "10", "5", "liquid", "1", "101", "", "",
    ]);
    assert_eq!(
      ProductDraft::from_fields(&values, &categories, &viruses),
      Err(DraftError::VirusOutsideCategories(101))
    );
  }

  #[test]
  fn test_product_draft_requires_a_category() {
    let categories = vec![category(1, "Herbicide")];
    let values = fields(&["WeedOut", "వీడ్", "Agro", "10", "5", "Liquid", "", "", "", ""]);
    assert_eq!(
      ProductDraft::from_fields(&values, &categories, &[]),
      Err(DraftError::Required("Category"))
    );
  }

  #[test]
  fn test_quick_edits_keep_other_fields() {
    let original = product(10, "WeedOut", "", &[1], &[], None);
    let draft = ProductDraft::from_product(&original)
      .with_price(99.0)
      .with_quantity(3);
    assert_eq!(draft.price, 99.0);
    assert_eq!(draft.quantity, 3);
    assert_eq!(draft.name_en, "WeedOut");
    assert_eq!(draft.product_type, None);
  }

  #[test]
  fn test_untyped_product_round_trips_without_a_type() {
    let categories = vec![category(1, "Herbicide")];
    let original = product(12, "Bare", "బేర్", &[1], &[], None);

    let values = ProductDraft::from_product(&original).to_fields();
    assert_eq!(values[5], "");
    let parsed = ProductDraft::from_fields(&values, &categories, &[]).unwrap();
    assert_eq!(parsed.product_type, None);

    let mut typo = values.clone();
    typo[5] = "Gas".to_string();
    assert!(matches!(
      ProductDraft::from_fields(&typo, &categories, &[]),
      Err(DraftError::Invalid { field: "type", .. })
    ));
  }
}
