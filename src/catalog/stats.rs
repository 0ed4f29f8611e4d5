use super::types::{Category, Order, OrderStatus, Product};

/// Figures shown on the dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
  pub products: usize,
  pub orders: usize,
  pub categories: usize,
  pub pending_orders: usize,
  pub out_of_stock: usize,
  /// (category name, product count) in category order
  pub products_per_category: Vec<(String, usize)>,
}

impl DashboardStats {
  pub fn compute(categories: &[Category], products: &[Product], orders: &[Order]) -> Self {
    Self {
      products: products.len(),
      orders: orders.len(),
      categories: categories.len(),
      pending_orders: orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .count(),
      out_of_stock: products.iter().filter(|p| !p.in_stock()).count(),
      products_per_category: products_per_category(categories, products),
    }
  }
}

/// A product linked to several categories counts once in each.
pub fn products_per_category(categories: &[Category], products: &[Product]) -> Vec<(String, usize)> {
  categories
    .iter()
    .map(|category| {
      let count = products.iter().filter(|p| p.in_category(category.id)).count();
      (category.name_en.clone(), count)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{category, order, product};

  #[test]
  fn test_dashboard_counts() {
    let categories = vec![category(1, "Herbicide"), category(2, "Fungicide")];
    let mut empty = product(12, "Bare", "", &[], &[], None);
    empty.quantity = 0;
    let products = vec![
      product(10, "WeedOut", "", &[1, 2], &[], None),
      product(11, "FungAway", "", &[2], &[], None),
      empty,
    ];
    let orders = vec![
      order(1, OrderStatus::Pending),
      order(2, OrderStatus::Shipped),
      order(3, OrderStatus::Pending),
    ];

    let stats = DashboardStats::compute(&categories, &products, &orders);
    assert_eq!(stats.products, 3);
    assert_eq!(stats.orders, 3);
    assert_eq!(stats.categories, 2);
    assert_eq!(stats.pending_orders, 2);
    assert_eq!(stats.out_of_stock, 1);
    assert_eq!(
      stats.products_per_category,
      vec![("Herbicide".to_string(), 1), ("Fungicide".to_string(), 2)]
    );
  }
}
