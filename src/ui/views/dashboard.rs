use crate::app::AppContext;
use crate::cache::ResourceKey;
use crate::catalog::stats::DashboardStats;
use crate::query::{Query, QueryState};
use crate::ui::renderfns::truncate;
use crate::ui::view::{Notification, ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};

const BAR_LABEL_CHARS: usize = 10;

/// Totals plus a products-per-category chart
pub struct DashboardView {
  ctx: AppContext,
  query: Query<DashboardStats>,
}

impl DashboardView {
  pub fn new(ctx: AppContext) -> Self {
    let catalog = ctx.catalog.clone();
    let mut query = Query::new(move || {
      let catalog = catalog.clone();
      async move { catalog.load_dashboard().await.map_err(|e| e.to_string()) }
    });
    query.fetch();
    Self { ctx, query }
  }

  fn totals(stats: &DashboardStats) -> Vec<Line<'static>> {
    let row = |label: &str, value: usize, color: Color| {
      Line::from(vec![
        Span::styled(format!("{:<16}", label), Style::default().fg(Color::Cyan)),
        Span::styled(
          value.to_string(),
          Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
      ])
    };
    let warn = |n: usize| if n > 0 { Color::Yellow } else { Color::Green };
    vec![
      row("Products", stats.products, Color::White),
      row("Categories", stats.categories, Color::White),
      row("Orders", stats.orders, Color::White),
      row("Pending orders", stats.pending_orders, warn(stats.pending_orders)),
      row("Out of stock", stats.out_of_stock, warn(stats.out_of_stock)),
    ]
  }

  fn render_stats(frame: &mut Frame, area: Rect, stats: &DashboardStats) {
    let chunks = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Length(30), Constraint::Min(0)])
      .split(area);

    let totals = Paragraph::new(Self::totals(stats)).block(
      Block::default()
        .title(" Totals ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Blue)),
    );
    frame.render_widget(totals, chunks[0]);

    let bars: Vec<Bar> = stats
      .products_per_category
      .iter()
      .map(|(name, count)| {
        Bar::default()
          .value(*count as u64)
          .label(Line::from(truncate(name, BAR_LABEL_CHARS)))
          .style(Style::default().fg(Color::Green))
      })
      .collect();
    let chart = BarChart::default()
      .block(
        Block::default()
          .title(" Products per category ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue)),
      )
      .data(BarGroup::default().bars(&bars))
      .bar_width(BAR_LABEL_CHARS as u16)
      .bar_gap(2)
      .value_style(Style::default().fg(Color::Black).bg(Color::Green));
    frame.render_widget(chart, chunks[1]);
  }

  fn refresh(&mut self) -> ViewAction {
    if let Err(e) = self.ctx.catalog.invalidate(&ResourceKey::ALL) {
      return ViewAction::Notify(Notification::error(e.to_string()));
    }
    self.query.refetch();
    ViewAction::None
  }
}

impl View for DashboardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => self.refresh(),
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match self.query.state() {
      QueryState::Success(stats) => Self::render_stats(frame, area, stats),
      state => {
        let text = match state {
          QueryState::Error(e) => format!("Failed to load dashboard: {}. Press 'r' to retry.", e),
          _ => "Loading...".to_string(),
        };
        let paragraph = Paragraph::new(text)
          .block(
            Block::default()
              .title(" Dashboard ")
              .title_alignment(Alignment::Center)
              .borders(Borders::ALL)
              .border_style(Style::default().fg(Color::Blue)),
          )
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
      }
    }
  }

  fn breadcrumb_label(&self) -> String {
    "Dashboard".to_string()
  }

  fn tick(&mut self) -> Option<Notification> {
    self.query.poll();
    None
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::types::OrderStatus;
  use crate::test_support::{app_context, category, order, product, FakeCatalogApi};
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use ratatui::Terminal;
  use std::sync::Arc;
  use std::time::Duration;

  fn backend() -> Arc<FakeCatalogApi> {
    let api = Arc::new(FakeCatalogApi::new());
    api.set_categories(vec![category(1, "Herbicide")]);
    api.set_products(vec![product(10, "WeedOut", "", &[1], &[], None)]);
    api.set_orders(vec![order(1, OrderStatus::Pending)]);
    api
  }

  #[tokio::test]
  async fn test_loads_stats() {
    let mut view = DashboardView::new(app_context(backend()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();

    let stats = view.query.data().unwrap();
    assert_eq!(stats.products, 1);
    assert_eq!(stats.pending_orders, 1);
    assert_eq!(stats.products_per_category, vec![("Herbicide".to_string(), 1)]);

    let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
    terminal.draw(|f| view.render(f, f.area())).unwrap();
  }

  #[tokio::test]
  async fn test_refresh_hits_backend_again() {
    let api = backend();
    let mut view = DashboardView::new(app_context(api.clone()));
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();
    assert_eq!(api.count("list_categories"), 1);

    view.handle_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE));
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();
    assert_eq!(api.count("list_categories"), 2);
  }
}
