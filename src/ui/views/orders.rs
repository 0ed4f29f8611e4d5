use super::{notify, PendingWrite};
use crate::app::AppContext;
use crate::cache::ResourceKey;
use crate::catalog::filter::filter_orders;
use crate::catalog::types::{Order, OrderStatus};
use crate::catalog::OrderPage;
use crate::query::{Query, QueryState};
use crate::ui::components::{KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{format_price, order_status_color, truncate};
use crate::ui::view::{Notification, ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Next status filter in the `f` cycle: all, then each known status
fn next_status_filter(current: Option<OrderStatus>) -> Option<OrderStatus> {
  match current {
    None => OrderStatus::KNOWN.first().copied(),
    Some(status) => {
      let pos = OrderStatus::KNOWN.iter().position(|s| *s == status);
      pos.and_then(|i| OrderStatus::KNOWN.get(i + 1).copied())
    }
  }
}

/// Order list with a status filter and status updates
pub struct OrderListView {
  ctx: AppContext,
  query: Query<OrderPage>,
  write: PendingWrite<Vec<Order>>,
  list_state: ListState,
  search: SearchInput,
  status_filter: Option<OrderStatus>,
}

impl OrderListView {
  pub fn new(ctx: AppContext) -> Self {
    let catalog = ctx.catalog.clone();
    let mut query = Query::new(move || {
      let catalog = catalog.clone();
      async move { catalog.load_order_page().await.map_err(|e| e.to_string()) }
    });
    query.fetch();

    Self {
      ctx,
      query,
      write: PendingWrite::new(),
      list_state: ListState::default(),
      search: SearchInput::new(),
      status_filter: None,
    }
  }

  /// Orders passing the status filter whose product name matches the search
  fn visible(&self) -> Vec<&Order> {
    let Some(page) = self.query.data() else {
      return Vec::new();
    };
    let needle = self.search.query().to_lowercase();
    filter_orders(&page.orders, self.status_filter)
      .into_iter()
      .filter(|order| page.product_name(order).to_lowercase().contains(&needle))
      .collect()
  }

  fn selected(&self) -> Option<Order> {
    let idx = self.list_state.selected()?;
    self.visible().get(idx).map(|o| (*o).clone())
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);

    let filter_label = match self.status_filter {
      Some(status) => format!(" [{}]", status),
      None => String::new(),
    };
    let title = match self.query.state() {
      QueryState::Loading => " Orders (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Orders (error: {}) ", e),
      _ if self.write.is_pending() => format!(" Orders ({}){} saving... ", len, filter_label),
      _ => format!(" Orders ({}){} ", len, filter_label),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load orders. Press 'r' to retry."
      } else {
        "No orders found."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let Some(page) = self.query.data() else {
      return;
    };
    let items: Vec<ListItem> = self
      .visible()
      .iter()
      .map(|order| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<6}", order.id), Style::default().fg(Color::Cyan)),
          Span::raw(" "),
          Span::raw(format!("{:<28}", truncate(page.product_name(order), 26))),
          Span::raw(format!("{:>5} ", order.quantity)),
          Span::raw(format!("{:>12}  ", format_price(order.total))),
          Span::styled(format!("{:<12}", order.date), Style::default().fg(Color::Gray)),
          Span::styled(
            order.status.to_string(),
            Style::default().fg(order_status_color(order.status)),
          ),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn set_status(&mut self, status: OrderStatus) -> Option<ViewAction> {
    let order = self.selected()?;
    if order.status == status {
      return Some(ViewAction::Notify(Notification::info(format!(
        "Order {} is already {}",
        order.id, status
      ))));
    }
    let catalog = self.ctx.catalog.clone();
    Some(notify(self.write.start(
      format!("Order {} marked {}", order.id, status),
      async move {
        catalog
          .update_order_status(order.id, status)
          .await
          .map_err(|e| e.to_string())
      },
    )))
  }

  fn refresh(&mut self) -> ViewAction {
    // Orders are never cached; product names are
    if let Err(e) = self.ctx.catalog.invalidate(&[ResourceKey::Products]) {
      return ViewAction::Notify(Notification::error(e.to_string()));
    }
    self.query.refetch();
    ViewAction::None
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.search.handle_key(key) {
      KeyResult::NotHandled => None,
      KeyResult::Event(SearchEvent::Changed(_)) => {
        self.list_state.select(Some(0));
        Some(ViewAction::None)
      }
      KeyResult::Handled | KeyResult::Event(SearchEvent::Submitted) => Some(ViewAction::None),
    }
  }

  fn handle_navigation(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.list_state.select_next();
        Some(ViewAction::None)
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.list_state.select_previous();
        Some(ViewAction::None)
      }
      _ => None,
    }
  }

  fn handle_actions(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match key.code {
      KeyCode::Char('f') => {
        self.status_filter = next_status_filter(self.status_filter);
        self.list_state.select(Some(0));
        Some(ViewAction::None)
      }
      KeyCode::Char('1') => self.set_status(OrderStatus::Pending),
      KeyCode::Char('2') => self.set_status(OrderStatus::Shipped),
      KeyCode::Char('3') => self.set_status(OrderStatus::Completed),
      KeyCode::Char('x') => self.set_status(OrderStatus::Cancelled),
      KeyCode::Char('r') => Some(self.refresh()),
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for OrderListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.search.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Orders".to_string()
  }

  fn tick(&mut self) -> Option<Notification> {
    self.query.poll();
    let query = &mut self.query;
    let notification = self.write.poll(|orders| {
      if let Some(page) = query.data_mut() {
        page.orders = orders;
      }
    });
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);
    notification
  }

  fn captures_input(&self) -> bool {
    self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("f", "status filter").with_priority(21),
      ShortcutInfo::new("1/2/3", "pending/shipped/completed").with_priority(30),
      ShortcutInfo::new("x", "cancel order").with_priority(31),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
