//! Relationship filtering over catalog snapshots.
//!
//! Everything here is a pure function of its inputs: no caching, no UI
//! state. Results are stable subsequences of the input slice (surviving
//! elements keep their relative order, nothing is re-sorted).

use std::collections::BTreeSet;

use super::types::{
  CategoryId, Order, OrderStatus, Product, ProductType, Virus, VirusId,
};

/// How a category selection was made.
///
/// The two selection widgets disagree on what an empty selection means and
/// both behaviours are kept as-is:
/// - `Single`: a "filter by category" dropdown. Nothing selected means
///   "all categories", so every virus is returned.
/// - `Multi`: the multi-select on the product form. Nothing selected means
///   no category is linked yet, so no virus is eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
  Single,
  Multi,
}

/// Viruses whose category is one of `selected`.
pub fn viruses_for_categories<'a>(
  all: &'a [Virus],
  selected: &BTreeSet<CategoryId>,
  mode: SelectionMode,
) -> Vec<&'a Virus> {
  if selected.is_empty() {
    return match mode {
      SelectionMode::Single => all.iter().collect(),
      SelectionMode::Multi => Vec::new(),
    };
  }

  all
    .iter()
    .filter(|virus| {
      virus
        .category_id
        .is_some_and(|category| selected.contains(&category))
    })
    .collect()
}

/// Filter state of the product screen. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
  pub search_term: String,
  pub category_id: Option<CategoryId>,
  pub virus_id: Option<VirusId>,
  pub product_type: Option<String>,
}

impl FilterState {
  /// Change the category filter. The virus filter is cleared because the
  /// virus options depend on the selected category.
  pub fn set_category(&mut self, category_id: Option<CategoryId>) {
    if self.category_id != category_id {
      self.category_id = category_id;
      self.virus_id = None;
    }
  }

  pub fn is_empty(&self) -> bool {
    self.search_term.is_empty()
      && self.category_id.is_none()
      && self.virus_id.is_none()
      && self.product_type.is_none()
  }

  fn matches(&self, product: &Product) -> bool {
    self.matches_name(product)
      && self.category_id.map_or(true, |id| product.in_category(id))
      && self.virus_id.map_or(true, |id| product.targets_virus(id))
      && self.matches_type(product)
  }

  fn matches_name(&self, product: &Product) -> bool {
    // Telugu has no case, so name_te is compared raw
    product
      .name_en
      .to_lowercase()
      .contains(&self.search_term.to_lowercase())
      || product.name_te.contains(&self.search_term)
  }

  fn matches_type(&self, product: &Product) -> bool {
    let Some(wanted) = &self.product_type else {
      return true;
    };
    product
      .product_type
      .is_some_and(|t| t.as_str().to_lowercase() == wanted.trim().to_lowercase())
  }
}

/// Products passing every predicate of `state`.
pub fn filter_products<'a>(all: &'a [Product], state: &FilterState) -> Vec<&'a Product> {
  all.iter().filter(|p| state.matches(p)).collect()
}

/// Virus screen filter: case-insensitive `name_en` search plus category.
pub fn filter_viruses<'a>(
  all: &'a [Virus],
  search_term: &str,
  category_id: Option<CategoryId>,
) -> Vec<&'a Virus> {
  let needle = search_term.to_lowercase();
  all
    .iter()
    .filter(|virus| virus.name_en.to_lowercase().contains(&needle))
    .filter(|virus| category_id.map_or(true, |id| virus.category_id == Some(id)))
    .collect()
}

/// Order screen filter. `None` shows every order.
pub fn filter_orders(all: &[Order], status: Option<OrderStatus>) -> Vec<&Order> {
  match status {
    None => all.iter().collect(),
    Some(status) => all.iter().filter(|o| o.status == status).collect(),
  }
}

/// Single-valued view of a product, for consumers that only understand one
/// category and one virus per product.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleValuedProduct<'a> {
  pub product: &'a Product,
  pub category_id: Option<CategoryId>,
  pub virus_id: Option<VirusId>,
  pub product_type: Option<ProductType>,
}

/// Degrade the many-to-many relations to their first entry.
pub fn to_single_valued(product: &Product) -> SingleValuedProduct<'_> {
  SingleValuedProduct {
    product,
    category_id: product.category_ids.first().copied(),
    virus_id: product.virus_ids.first().copied(),
    product_type: product.product_type,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{product, virus};

  fn catalog() -> Vec<Product> {
    vec![
      product(10, "WeedOut", "వీడ్అవుట్", &[1], &[100], Some(ProductType::Liquid)),
      product(11, "FungAway", "ఫంగ్అవే", &[2], &[101], Some(ProductType::Solid)),
    ]
  }

  fn ids(products: &[&Product]) -> Vec<i64> {
    products.iter().map(|p| p.id).collect()
  }

  #[test]
  fn test_filter_by_category() {
    let products = catalog();
    let state = FilterState {
      category_id: Some(1),
      ..Default::default()
    };
    assert_eq!(ids(&filter_products(&products, &state)), vec![10]);
  }

  #[test]
  fn test_search_is_case_insensitive_on_english_name() {
    let products = catalog();
    let state = FilterState {
      search_term: "fung".to_string(),
      ..Default::default()
    };
    assert_eq!(ids(&filter_products(&products, &state)), vec![11]);
  }

  #[test]
  fn test_search_matches_telugu_name_raw() {
    let products = catalog();
    let state = FilterState {
      search_term: "వీడ్".to_string(),
      ..Default::default()
    };
    assert_eq!(ids(&filter_products(&products, &state)), vec![10]);
  }

  #[test]
  fn test_empty_filter_returns_everything_in_order() {
    let products = catalog();
    let state = FilterState::default();
    assert!(state.is_empty());
    assert_eq!(ids(&filter_products(&products, &state)), vec![10, 11]);
  }

  #[test]
  fn test_filter_is_idempotent() {
    let products = catalog();
    let state = FilterState {
      search_term: "o".to_string(),
      ..Default::default()
    };
    let first = filter_products(&products, &state);
    let second = filter_products(&products, &state);
    assert_eq!(first, second);
    assert_eq!(state.search_term, "o");
  }

  #[test]
  fn test_type_filter_trims_and_ignores_case() {
    let products = catalog();
    let state = FilterState {
      product_type: Some("  solid ".to_string()),
      ..Default::default()
    };
    assert_eq!(ids(&filter_products(&products, &state)), vec![11]);
  }

  #[test]
  fn test_virus_filter_uses_membership() {
    let mut products = catalog();
    products[1].virus_ids.push(100);
    let state = FilterState {
      virus_id: Some(100),
      ..Default::default()
    };
    assert_eq!(ids(&filter_products(&products, &state)), vec![10, 11]);
  }

  #[test]
  fn test_missing_relationships_never_match() {
    let products = vec![product(12, "Bare", "", &[], &[], None)];
    let by_category = FilterState {
      category_id: Some(1),
      ..Default::default()
    };
    let by_type = FilterState {
      product_type: Some("Liquid".to_string()),
      ..Default::default()
    };
    assert!(filter_products(&products, &by_category).is_empty());
    assert!(filter_products(&products, &by_type).is_empty());
  }

  #[test]
  fn test_predicates_are_anded() {
    let products = catalog();
    let state = FilterState {
      search_term: "weed".to_string(),
      category_id: Some(2),
      ..Default::default()
    };
    assert!(filter_products(&products, &state).is_empty());
  }

  #[test]
  fn test_set_category_clears_virus() {
    let mut state = FilterState {
      category_id: Some(1),
      virus_id: Some(100),
      ..Default::default()
    };
    state.set_category(Some(1));
    assert_eq!(state.virus_id, Some(100));
    state.set_category(Some(2));
    assert_eq!(state.virus_id, None);
  }

  #[test]
  fn test_viruses_for_categories() {
    let viruses = vec![virus(100, "Blight", Some(1)), virus(101, "Rust", Some(2))];
    let selected = BTreeSet::from([1]);
    let result = viruses_for_categories(&viruses, &selected, SelectionMode::Multi);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].id, 100);
  }

  #[test]
  fn test_viruses_for_categories_preserves_input_order() {
    let viruses = vec![
      virus(105, "Wilt", Some(2)),
      virus(100, "Blight", Some(1)),
      virus(103, "Mildew", Some(2)),
    ];
    let selected = BTreeSet::from([1, 2]);
    let result: Vec<i64> = viruses_for_categories(&viruses, &selected, SelectionMode::Single)
      .iter()
      .map(|v| v.id)
      .collect();
    assert_eq!(result, vec![105, 100, 103]);
  }

  #[test]
  fn test_empty_selection_depends_on_mode() {
    let viruses = vec![virus(100, "Blight", Some(1)), virus(101, "Rust", None)];
    let none = BTreeSet::new();
    assert!(viruses_for_categories(&viruses, &none, SelectionMode::Multi).is_empty());
    assert_eq!(
      viruses_for_categories(&viruses, &none, SelectionMode::Single).len(),
      2
    );
  }

  #[test]
  fn test_virus_without_category_never_matches_selection() {
    let viruses = vec![virus(101, "Rust", None)];
    let selected = BTreeSet::from([1]);
    assert!(viruses_for_categories(&viruses, &selected, SelectionMode::Single).is_empty());
  }

  #[test]
  fn test_filter_viruses_by_name_and_category() {
    let viruses = vec![
      virus(100, "Leaf Blight", Some(1)),
      virus(101, "Blight Rot", Some(2)),
      virus(102, "Mildew", Some(1)),
    ];
    let result: Vec<i64> = filter_viruses(&viruses, "BLIGHT", Some(1))
      .iter()
      .map(|v| v.id)
      .collect();
    assert_eq!(result, vec![100]);
    assert_eq!(filter_viruses(&viruses, "", None).len(), 3);
  }

  #[test]
  fn test_single_valued_adapter_takes_first_relation() {
    let p = product(10, "WeedOut", "", &[3, 1], &[], Some(ProductType::Liquid));
    let legacy = to_single_valued(&p);
    assert_eq!(legacy.category_id, Some(3));
    assert_eq!(legacy.virus_id, None);
    assert_eq!(legacy.product.id, 10);
  }
}
