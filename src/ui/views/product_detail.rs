use crate::app::AppContext;
use crate::cart::item_label;
use crate::catalog::filter::to_single_valued;
use crate::catalog::types::{Category, Product, Virus};
use crate::ui::renderfns::{format_price, stock_color};
use crate::ui::view::{Notification, ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Read-only view of one product with its relations resolved to names
pub struct ProductDetailView {
  ctx: AppContext,
  product: Product,
  categories: Vec<Category>,
  viruses: Vec<Virus>,
  scroll: u16,
}

impl ProductDetailView {
  pub fn new(
    ctx: AppContext,
    product: Product,
    categories: Vec<Category>,
    viruses: Vec<Virus>,
  ) -> Self {
    Self {
      ctx,
      product,
      categories,
      viruses,
      scroll: 0,
    }
  }

  fn category_names(&self) -> Vec<String> {
    self
      .product
      .category_ids
      .iter()
      .map(|id| {
        self
          .categories
          .iter()
          .find(|c| c.id == *id)
          .map_or_else(|| format!("#{}", id), |c| c.name_en.clone())
      })
      .collect()
  }

  fn virus_names(&self) -> Vec<String> {
    self
      .product
      .virus_ids
      .iter()
      .map(|id| {
        self
          .viruses
          .iter()
          .find(|v| v.id == *id)
          .map_or_else(|| format!("#{}", id), |v| v.name_en.clone())
      })
      .collect()
  }

  fn lines(&self) -> Vec<Line<'static>> {
    let label = |text: &str| Span::styled(format!("{:<16}", text), Style::default().fg(Color::Cyan));
    let product = &self.product;
    let legacy = to_single_valued(product);
    let or_dash = |names: Vec<String>| {
      if names.is_empty() {
        "-".to_string()
      } else {
        names.join(", ")
      }
    };

    let mut lines = vec![
      Line::from(vec![label("English"), Span::raw(product.name_en.clone())]),
      Line::from(vec![
        label("Telugu"),
        Span::styled(product.name_te.clone(), Style::default().fg(Color::Yellow)),
      ]),
      Line::from(vec![label("Company"), Span::raw(product.company.clone())]),
      Line::from(vec![label("Price"), Span::raw(format_price(product.price))]),
      Line::from(vec![
        label("Stock"),
        Span::styled(
          if product.in_stock() {
            product.quantity.to_string()
          } else {
            "out of stock".to_string()
          },
          Style::default().fg(stock_color(product.quantity)),
        ),
      ]),
      Line::from(vec![
        label("Type"),
        Span::raw(product.product_type.map_or("-", |t| t.as_str())),
      ]),
      Line::from(vec![label("Categories"), Span::raw(or_dash(self.category_names()))]),
      Line::from(vec![label("Target viruses"), Span::raw(or_dash(self.virus_names()))]),
      Line::from(vec![
        label("Primary ids"),
        Span::styled(
          format!(
            "category {} · virus {}",
            legacy.category_id.map_or("-".to_string(), |id| id.to_string()),
            legacy.virus_id.map_or("-".to_string(), |id| id.to_string()),
          ),
          Style::default().fg(Color::DarkGray),
        ),
      ]),
      Line::from(vec![
        label("Image"),
        Span::raw(product.image_url.clone().unwrap_or_else(|| "-".to_string())),
      ]),
      Line::default(),
    ];

    if product.description.is_empty() {
      lines.push(Line::from(Span::styled(
        "No description.",
        Style::default().fg(Color::DarkGray),
      )));
    } else {
      lines.extend(product.description.lines().map(|l| Line::from(l.to_string())));
    }
    lines
  }
}

impl View for ProductDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.scroll = self.scroll.saturating_add(1);
        ViewAction::None
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.scroll = self.scroll.saturating_sub(1);
        ViewAction::None
      }
      KeyCode::Char('b') => {
        let count = {
          let mut cart = self.ctx.cart.borrow_mut();
          cart.add(item_label(&self.product));
          cart.len()
        };
        ViewAction::Notify(Notification::info(format!(
          "Added {} to cart ({} items)",
          self.product.name_en, count
        )))
      }
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(format!(" Product {} ", self.product.id))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let paragraph = Paragraph::new(self.lines())
      .block(block)
      .wrap(Wrap { trim: false })
      .scroll((self.scroll, 0));
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    self.product.name_en.clone()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("j/k", "scroll").with_priority(20),
      ShortcutInfo::new("b", "cart").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
