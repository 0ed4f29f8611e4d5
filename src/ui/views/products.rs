use super::{id_hint, notify, PendingWrite};
use crate::app::AppContext;
use crate::cache::ResourceKey;
use crate::cart::item_label;
use crate::catalog::confirm::confirm_deletion;
use crate::catalog::drafts::{parse_price, parse_quantity, DraftError, ProductDraft};
use crate::catalog::filter::{filter_products, viruses_for_categories, FilterState, SelectionMode};
use crate::catalog::types::{Product, ProductType, Virus};
use crate::catalog::ProductPage;
use crate::query::{Query, QueryState};
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, FormDialog, FormEvent, KeyResult, Picker, PickerEvent,
  SearchEvent, SearchInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{cache_age, format_price, stock_color, truncate};
use crate::ui::view::{Notification, ShortcutInfo, View, ViewAction};
use crate::ui::views::ProductDetailView;
use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::collections::BTreeSet;

const CATEGORIES_FIELD: usize = 6;
const VIRUSES_FIELD: usize = 7;

enum FormPurpose {
  Create,
  Edit(Product),
  Price(Product),
  Stock(Product),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickerTarget {
  Category,
  Virus,
  Type,
}

/// Product list with search, relationship filters, CRUD, quick price and
/// stock edits, and add-to-cart
pub struct ProductListView {
  ctx: AppContext,
  query: Query<ProductPage>,
  write: PendingWrite<Vec<Product>>,
  list_state: ListState,
  filter: FilterState,
  search: SearchInput,
  picker: Picker,
  picker_target: Option<PickerTarget>,
  form: FormDialog,
  form_purpose: Option<FormPurpose>,
  confirm: ConfirmDialog,
  pending_delete: Option<Product>,
}

impl ProductListView {
  pub fn new(ctx: AppContext) -> Self {
    Self::with_filter(ctx, FilterState::default())
  }

  /// Products of one category, as opened from the category list
  pub fn with_category(ctx: AppContext, category_id: i64) -> Self {
    let filter = FilterState {
      category_id: Some(category_id),
      ..FilterState::default()
    };
    Self::with_filter(ctx, filter)
  }

  pub fn with_filter(ctx: AppContext, filter: FilterState) -> Self {
    let catalog = ctx.catalog.clone();
    let mut query = Query::new(move || {
      let catalog = catalog.clone();
      async move { catalog.load_product_page().await.map_err(|e| e.to_string()) }
    });
    query.fetch();

    Self {
      ctx,
      query,
      write: PendingWrite::new(),
      list_state: ListState::default(),
      filter,
      search: SearchInput::new(),
      picker: Picker::new(),
      picker_target: None,
      form: FormDialog::new(),
      form_purpose: None,
      confirm: ConfirmDialog::new(),
      pending_delete: None,
    }
  }

  fn visible(&self) -> Vec<&Product> {
    match self.query.data() {
      Some(page) => filter_products(&page.products, &self.filter),
      None => Vec::new(),
    }
  }

  fn selected(&self) -> Option<Product> {
    let idx = self.list_state.selected()?;
    self.visible().get(idx).map(|p| (*p).clone())
  }

  /// Virus choices for the filter dropdown: those of the selected category,
  /// or every virus when no category is selected
  fn virus_options(&self) -> Vec<&Virus> {
    let Some(page) = self.query.data() else {
      return Vec::new();
    };
    let selected: BTreeSet<i64> = self.filter.category_id.into_iter().collect();
    viruses_for_categories(&page.viruses, &selected, SelectionMode::Single)
  }

  fn filter_summary(&self) -> String {
    let Some(page) = self.query.data() else {
      return String::new();
    };
    let mut parts = Vec::new();
    if let Some(id) = self.filter.category_id {
      let name = page.categories.iter().find(|c| c.id == id);
      parts.push(name.map_or_else(|| format!("#{}", id), |c| c.name_en.clone()));
    }
    if let Some(id) = self.filter.virus_id {
      let name = page.viruses.iter().find(|v| v.id == id);
      parts.push(name.map_or_else(|| format!("#{}", id), |v| v.name_en.clone()));
    }
    if let Some(product_type) = &self.filter.product_type {
      parts.push(product_type.clone());
    }
    let mut summary = String::new();
    if !parts.is_empty() {
      summary.push_str(&format!(" [{}]", parts.join(" › ")));
    }
    if !self.filter.search_term.is_empty() {
      summary.push_str(&format!(" /{}", self.filter.search_term));
    }
    summary
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => " Products (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Products (error: {}) ", e),
      _ if self.write.is_pending() => {
        format!(" Products ({}){} saving... ", len, self.filter_summary())
      }
      _ => format!(" Products ({}){} ", len, self.filter_summary()),
    };

    let mut block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    if let Some(age) = self.query.data().and_then(|p| cache_age(p.cached_at, Utc::now())) {
      block = block.title_bottom(
        Line::from(Span::styled(format!(" {} ", age), Style::default().fg(Color::DarkGray)))
          .right_aligned(),
      );
    }

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load products. Press 'r' to retry."
      } else if self.filter.is_empty() {
        "No products yet. Press 'a' to add one."
      } else {
        "No products match the current filters."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .visible()
      .iter()
      .map(|product| {
        let product_type = product.product_type.map(|t| t.as_str()).unwrap_or("-");
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<6}", product.id), Style::default().fg(Color::Cyan)),
          Span::raw(" "),
          Span::raw(format!("{:<26}", truncate(&product.name_en, 24))),
          Span::styled(
            format!("{:<18}", truncate(&product.name_te, 16)),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(
            format!("{:<16}", truncate(&product.company, 14)),
            Style::default().fg(Color::Gray),
          ),
          Span::styled(format!("{:<8}", product_type), Style::default().fg(Color::Magenta)),
          Span::raw(format!("{:>12} ", format_price(product.price))),
          Span::styled(
            format!("{:>6}", product.quantity),
            Style::default().fg(stock_color(product.quantity)),
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

  fn open_product_form(&mut self, title: String, values: Vec<String>, purpose: FormPurpose) {
    let Some(page) = self.query.data() else {
      return;
    };
    let category_hint = id_hint(page.categories.iter().map(|c| (c.id, c.name_en.as_str())));
    let virus_hint = id_hint(page.viruses.iter().map(|v| (v.id, v.name_en.as_str())));
    self.form.open(title, &ProductDraft::FIELDS, values);
    self.form.set_hint(CATEGORIES_FIELD, category_hint);
    self.form.set_hint(VIRUSES_FIELD, virus_hint);
    self.form_purpose = Some(purpose);
  }

  /// Validate the open form into the write it asks for
  fn form_write(&self, values: &[String]) -> Result<ProductWrite, DraftError> {
    let value = values.first().map(String::as_str).unwrap_or_default();
    match &self.form_purpose {
      Some(FormPurpose::Price(product)) => {
        parse_price(value).map(|price| ProductWrite::Price(product.clone(), price))
      }
      Some(FormPurpose::Stock(product)) => {
        parse_quantity(value).map(|quantity| ProductWrite::Stock(product.clone(), quantity))
      }
      Some(FormPurpose::Edit(product)) => self
        .parse_draft(values)
        .map(|draft| ProductWrite::Update(product.clone(), draft)),
      Some(FormPurpose::Create) | None => self.parse_draft(values).map(ProductWrite::Create),
    }
  }

  fn parse_draft(&self, values: &[String]) -> Result<ProductDraft, DraftError> {
    let page = self.query.data();
    let categories = page.map(|p| p.categories.as_slice()).unwrap_or(&[]);
    let viruses = page.map(|p| p.viruses.as_slice()).unwrap_or(&[]);
    ProductDraft::from_fields(values, categories, viruses)
  }

  fn submit_form(&mut self, values: Vec<String>) -> ViewAction {
    let job = match self.form_write(&values) {
      Ok(job) => job,
      Err(e) => {
        self.form.set_error(e.to_string());
        return ViewAction::None;
      }
    };
    self.form.close();
    self.form_purpose = None;

    let catalog = self.ctx.catalog.clone();
    let notification = match job {
      ProductWrite::Create(draft) => self.write.start(
        format!("Added product {}", draft.name_en),
        async move { catalog.create_product(draft).await.map_err(|e| e.to_string()) },
      ),
      ProductWrite::Update(product, draft) => self.write.start(
        format!("Updated product {}", draft.name_en),
        async move {
          catalog
            .update_product(product, draft)
            .await
            .map_err(|e| e.to_string())
        },
      ),
      ProductWrite::Price(product, price) => self.write.start(
        format!("Price of {} set to {}", product.name_en, format_price(price)),
        async move {
          catalog
            .update_price(product, price)
            .await
            .map_err(|e| e.to_string())
        },
      ),
      ProductWrite::Stock(product, quantity) => self.write.start(
        format!("Stock of {} set to {}", product.name_en, quantity),
        async move {
          catalog
            .update_stock(product, quantity)
            .await
            .map_err(|e| e.to_string())
        },
      ),
    };
    notify(notification)
  }

  fn confirm_delete(&mut self, typed: String) -> ViewAction {
    let Some(product) = self.pending_delete.clone() else {
      self.confirm.close();
      return ViewAction::None;
    };
    // A mismatch never reaches the backend
    if let Err(e) = confirm_deletion("Product", &product.name_en, &typed) {
      self.confirm.set_error(e.to_string());
      return ViewAction::None;
    }
    self.confirm.close();
    self.pending_delete = None;

    let catalog = self.ctx.catalog.clone();
    notify(self.write.start(
      format!("Deleted product {}", product.name_en),
      async move {
        catalog
          .delete_product(product, typed)
          .await
          .map_err(|e| e.to_string())
      },
    ))
  }

  fn open_picker(&mut self, target: PickerTarget) {
    let Some(page) = self.query.data() else {
      return;
    };
    let (title, options, current) = match target {
      PickerTarget::Category => {
        let mut options = vec!["All categories".to_string()];
        options.extend(page.categories.iter().map(|c| c.name_en.clone()));
        let current = self
          .filter
          .category_id
          .and_then(|id| page.categories.iter().position(|c| c.id == id));
        ("Filter by category", options, current)
      }
      PickerTarget::Virus => {
        let viruses = self.virus_options();
        let mut options = vec!["All viruses".to_string()];
        options.extend(viruses.iter().map(|v| v.name_en.clone()));
        let current = self
          .filter
          .virus_id
          .and_then(|id| viruses.iter().position(|v| v.id == id));
        ("Filter by virus", options, current)
      }
      PickerTarget::Type => {
        let mut options = vec!["All types".to_string()];
        options.extend(ProductType::ALL.iter().map(|t| t.to_string()));
        let current = self
          .filter
          .product_type
          .as_deref()
          .and_then(ProductType::parse)
          .and_then(|t| ProductType::ALL.iter().position(|all| *all == t));
        ("Filter by type", options, current)
      }
    };
    self
      .picker
      .show(title, options, current.map_or(0, |pos| pos + 1));
    self.picker_target = Some(target);
  }

  /// Apply a picker choice; index 0 is always the "All" entry
  fn apply_pick(&mut self, index: usize) {
    let Some(target) = self.picker_target.take() else {
      return;
    };
    let choice = index.checked_sub(1);
    match target {
      PickerTarget::Category => {
        let id = choice.and_then(|i| {
          self
            .query
            .data()
            .and_then(|page| page.categories.get(i))
            .map(|c| c.id)
        });
        self.filter.set_category(id);
      }
      PickerTarget::Virus => {
        self.filter.virus_id = choice.and_then(|i| self.virus_options().get(i).map(|v| v.id));
      }
      PickerTarget::Type => {
        self.filter.product_type = choice
          .and_then(|i| ProductType::ALL.get(i))
          .map(|t| t.as_str().to_string());
      }
    }
    self.list_state.select(Some(0));
  }

  fn add_to_cart(&mut self) -> Option<ViewAction> {
    let product = self.selected()?;
    let count = {
      let mut cart = self.ctx.cart.borrow_mut();
      cart.add(item_label(&product));
      cart.len()
    };
    Some(ViewAction::Notify(Notification::info(format!(
      "Added {} to cart ({} items)",
      product.name_en, count
    ))))
  }

  fn refresh(&mut self) -> ViewAction {
    if let Err(e) = self.ctx.catalog.invalidate(&[
      ResourceKey::Products,
      ResourceKey::Categories,
      ResourceKey::Viruses,
    ]) {
      return ViewAction::Notify(Notification::error(e.to_string()));
    }
    self.query.refetch();
    ViewAction::None
  }

  // Key handling helpers for or_else chain pattern
  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.form.handle_key(key) {
      KeyResult::NotHandled => {}
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(FormEvent::Submitted(values)) => return Some(self.submit_form(values)),
      KeyResult::Event(FormEvent::Cancelled) => {
        self.form_purpose = None;
        return Some(ViewAction::None);
      }
    }

    match self.confirm.handle_key(key) {
      KeyResult::NotHandled => {}
      KeyResult::Handled => return Some(ViewAction::None),
      KeyResult::Event(ConfirmEvent::Confirmed(typed)) => return Some(self.confirm_delete(typed)),
      KeyResult::Event(ConfirmEvent::Cancelled) => {
        self.pending_delete = None;
        return Some(ViewAction::None);
      }
    }

    match self.picker.handle_key(key) {
      KeyResult::NotHandled => {}
      KeyResult::Event(PickerEvent::Selected(index)) => {
        self.apply_pick(index);
        return Some(ViewAction::None);
      }
      KeyResult::Event(PickerEvent::Cancelled) => {
        self.picker_target = None;
        return Some(ViewAction::None);
      }
      KeyResult::Handled => return Some(ViewAction::None),
    }

    match self.search.handle_key(key) {
      KeyResult::NotHandled => None,
      KeyResult::Event(SearchEvent::Changed(term)) => {
        self.filter.search_term = term;
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
      KeyCode::Char('a') => {
        let page = self.query.data()?;
        let values = ProductDraft::default_fields(&page.categories, &page.viruses);
        self.open_product_form("New product".to_string(), values, FormPurpose::Create);
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let product = self.selected()?;
        let values = ProductDraft::from_product(&product).to_fields();
        self.open_product_form(
          format!("Edit product {}", product.id),
          values,
          FormPurpose::Edit(product),
        );
        Some(ViewAction::None)
      }
      KeyCode::Char('p') => {
        let product = self.selected()?;
        self.form.open(
          format!("Price of {}", product.name_en),
          &["Price (₹)"],
          vec![product.price.to_string()],
        );
        self.form_purpose = Some(FormPurpose::Price(product));
        Some(ViewAction::None)
      }
      KeyCode::Char('s') => {
        let product = self.selected()?;
        self.form.open(
          format!("Stock of {}", product.name_en),
          &["Quantity"],
          vec![product.quantity.to_string()],
        );
        self.form_purpose = Some(FormPurpose::Stock(product));
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let product = self.selected()?;
        self.confirm.open_typed(
          "Delete product",
          format!("Type '{}' to delete this product.", product.name_en),
        );
        self.pending_delete = Some(product);
        Some(ViewAction::None)
      }
      KeyCode::Char('b') => self.add_to_cart(),
      KeyCode::Char('c') => {
        self.open_picker(PickerTarget::Category);
        Some(ViewAction::None)
      }
      KeyCode::Char('v') => {
        self.open_picker(PickerTarget::Virus);
        Some(ViewAction::None)
      }
      KeyCode::Char('t') => {
        self.open_picker(PickerTarget::Type);
        Some(ViewAction::None)
      }
      KeyCode::Char('x') => {
        self.filter = FilterState::default();
        self.list_state.select(Some(0));
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => Some(self.refresh()),
      KeyCode::Enter => {
        let product = self.selected()?;
        let page = self.query.data()?;
        Some(ViewAction::Push(Box::new(ProductDetailView::new(
          self.ctx.clone(),
          product,
          page.categories.clone(),
          page.viruses.clone(),
        ))))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

/// A validated product form, ready to send
enum ProductWrite {
  Create(ProductDraft),
  Update(Product, ProductDraft),
  Price(Product, f64),
  Stock(Product, u32),
}

impl View for ProductListView {
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
    self.picker.render_overlay(frame, area);
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Products".to_string()
  }

  fn tick(&mut self) -> Option<Notification> {
    self.query.poll();
    let query = &mut self.query;
    let notification = self.write.poll(|products| {
      if let Some(page) = query.data_mut() {
        page.products = products;
        page.cached_at = None;
      }
    });
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);
    notification
  }

  fn captures_input(&self) -> bool {
    self.form.is_active()
      || self.confirm.is_active()
      || self.picker.is_active()
      || self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("c/v/t", "filter").with_priority(21),
      ShortcutInfo::new("x", "clear").with_priority(22),
      ShortcutInfo::new("a", "add").with_priority(30),
      ShortcutInfo::new("e", "edit").with_priority(31),
      ShortcutInfo::new("p", "price").with_priority(32),
      ShortcutInfo::new("s", "stock").with_priority(33),
      ShortcutInfo::new("d", "delete").with_priority(34),
      ShortcutInfo::new("b", "cart").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
