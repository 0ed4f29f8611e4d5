mod cart;
mod categories;
mod dashboard;
mod orders;
mod product_detail;
mod products;
mod viruses;

pub use cart::CartView;
pub use categories::CategoryListView;
pub use dashboard::DashboardView;
pub use orders::OrderListView;
pub use product_detail::ProductDetailView;
pub use products::ProductListView;
pub use viruses::VirusListView;

use crate::query::Mutation;
use crate::ui::renderfns::truncate;
use crate::ui::view::{Notification, ViewAction};
use std::future::Future;

const HINT_MAX_CHARS: usize = 120;

/// "1=Herbicide, 2=Fungicide" help line for an id field
fn id_hint<'a>(entries: impl IntoIterator<Item = (i64, &'a str)>) -> String {
  let joined = entries
    .into_iter()
    .map(|(id, name)| format!("{}={}", id, name))
    .collect::<Vec<_>>()
    .join(", ");
  if joined.is_empty() {
    "(none available)".to_string()
  } else {
    truncate(&joined, HINT_MAX_CHARS)
  }
}

/// Surface an optional notification to the App
fn notify(notification: Option<Notification>) -> ViewAction {
  notification.map(ViewAction::Notify).unwrap_or(ViewAction::None)
}

/// A write the view is waiting on, with the message to show once it lands
struct PendingWrite<T> {
  mutation: Mutation<T>,
  success: String,
}

impl<T: Send + 'static> PendingWrite<T> {
  fn new() -> Self {
    Self {
      mutation: Mutation::new(),
      success: String::new(),
    }
  }

  fn is_pending(&self) -> bool {
    self.mutation.is_pending()
  }

  /// Start `future`; refused with a notification while another write runs
  fn start<Fut>(&mut self, success: impl Into<String>, future: Fut) -> Option<Notification>
  where
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    if !self.mutation.start(future) {
      return Some(Notification::error("Another change is still in progress"));
    }
    self.success = success.into();
    None
  }

  /// Hand a finished result to `apply` and report the outcome
  fn poll(&mut self, apply: impl FnOnce(T)) -> Option<Notification> {
    match self.mutation.poll()? {
      Ok(data) => {
        apply(data);
        Some(Notification::info(std::mem::take(&mut self.success)))
      }
      Err(e) => Some(Notification::error(e)),
    }
  }
}
