use super::{notify, PendingWrite};
use crate::app::AppContext;
use crate::cache::ResourceKey;
use crate::catalog::confirm::confirm_deletion;
use crate::catalog::drafts::CategoryDraft;
use crate::catalog::types::Category;
use crate::catalog::ResourceSnapshot;
use crate::query::{Query, QueryState};
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, FormDialog, FormEvent, KeyResult, SearchEvent, SearchInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::view::{Notification, ShortcutInfo, View, ViewAction};
use crate::ui::views::ProductListView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

enum FormPurpose {
  Create,
  Edit(Category),
}

/// Category list with add, rename and typed-name delete
pub struct CategoryListView {
  ctx: AppContext,
  query: Query<Vec<Category>>,
  write: PendingWrite<Vec<Category>>,
  list_state: ListState,
  search: SearchInput,
  form: FormDialog,
  form_purpose: Option<FormPurpose>,
  confirm: ConfirmDialog,
  pending_delete: Option<Category>,
}

impl CategoryListView {
  pub fn new(ctx: AppContext) -> Self {
    let catalog = ctx.catalog.clone();
    let mut query = Query::new(move || {
      let catalog = catalog.clone();
      async move { catalog.load_categories().await.map_err(|e| e.to_string()) }
    });

    // Start fetching immediately
    query.fetch();

    Self {
      ctx,
      query,
      write: PendingWrite::new(),
      list_state: ListState::default(),
      search: SearchInput::new(),
      form: FormDialog::new(),
      form_purpose: None,
      confirm: ConfirmDialog::new(),
      pending_delete: None,
    }
  }

  fn visible(&self) -> Vec<&Category> {
    let term = self.search.query();
    let needle = term.to_lowercase();
    self
      .query
      .data()
      .map(|categories| {
        categories
          .iter()
          .filter(|c| c.name_en.to_lowercase().contains(&needle) || c.name_te.contains(term))
          .collect()
      })
      .unwrap_or_default()
  }

  fn selected(&self) -> Option<Category> {
    let idx = self.list_state.selected()?;
    self.visible().get(idx).map(|c| (*c).clone())
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = match self.query.state() {
      QueryState::Loading => " Categories (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Categories (error: {}) ", e),
      _ if self.write.is_pending() => format!(" Categories ({}) saving... ", len),
      _ if !self.search.query().is_empty() => {
        format!(" Categories ({}) /{} ", len, self.search.query())
      }
      _ => format!(" Categories ({}) ", len),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load categories. Press 'r' to retry."
      } else {
        "No categories found. Press 'a' to add one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    // Collect items first to avoid borrow conflicts with list_state
    let items: Vec<ListItem> = self
      .visible()
      .iter()
      .map(|category| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<6}", category.id), Style::default().fg(Color::Cyan)),
          Span::raw(" "),
          Span::raw(format!("{:<30}", category.name_en)),
          Span::styled(category.name_te.clone(), Style::default().fg(Color::Yellow)),
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

  fn submit_form(&mut self, values: Vec<String>) -> ViewAction {
    let draft = match CategoryDraft::from_fields(&values) {
      Ok(draft) => draft,
      Err(e) => {
        self.form.set_error(e.to_string());
        return ViewAction::None;
      }
    };
    self.form.close();

    let catalog = self.ctx.catalog.clone();
    let notification = match self.form_purpose.take() {
      Some(FormPurpose::Edit(category)) => self.write.start(
        format!("Updated category {}", draft.name_en),
        async move {
          catalog
            .update_category(category, draft)
            .await
            .map_err(|e| e.to_string())
        },
      ),
      Some(FormPurpose::Create) | None => self.write.start(
        format!("Added category {}", draft.name_en),
        async move { catalog.create_category(draft).await.map_err(|e| e.to_string()) },
      ),
    };
    notify(notification)
  }

  fn confirm_delete(&mut self, typed: String) -> ViewAction {
    let Some(category) = self.pending_delete.clone() else {
      self.confirm.close();
      return ViewAction::None;
    };
    // A mismatch never reaches the backend
    if let Err(e) = confirm_deletion("Category", &category.name_en, &typed) {
      self.confirm.set_error(e.to_string());
      return ViewAction::None;
    }
    self.confirm.close();
    self.pending_delete = None;

    let catalog = self.ctx.catalog.clone();
    notify(self.write.start(
      format!("Deleted category {}", category.name_en),
      async move {
        catalog
          .delete_category(category, typed)
          .await
          .map_err(|e| e.to_string())
      },
    ))
  }

  fn refresh(&mut self) -> ViewAction {
    let catalog = self.ctx.catalog.clone();
    notify(self.write.start("Refreshed categories", async move {
      match catalog.invalidate_and_refetch(ResourceKey::Categories).await {
        Ok(ResourceSnapshot::Categories(categories)) => Ok(categories),
        Ok(other) => Err(format!("Unexpected refresh result: {:?}", other)),
        Err(e) => Err(e.to_string()),
      }
    }))
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
      KeyCode::Char('a') => {
        self.form_purpose = Some(FormPurpose::Create);
        self.form.open("New category", &CategoryDraft::FIELDS, Vec::new());
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let category = self.selected()?;
        let values = CategoryDraft::from_category(&category).to_fields();
        self.form.open(
          format!("Edit category {}", category.id),
          &CategoryDraft::FIELDS,
          values,
        );
        self.form_purpose = Some(FormPurpose::Edit(category));
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let category = self.selected()?;
        self.confirm.open_typed(
          "Delete category",
          format!(
            "Viruses and products linked to '{}' may be affected. Type its name to delete.",
            category.name_en
          ),
        );
        self.pending_delete = Some(category);
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => Some(self.refresh()),
      KeyCode::Enter => {
        let category = self.selected()?;
        Some(ViewAction::Push(Box::new(ProductListView::with_category(
          self.ctx.clone(),
          category.id,
        ))))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for CategoryListView {
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
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Categories".to_string()
  }

  fn tick(&mut self) -> Option<Notification> {
    self.query.poll();
    let query = &mut self.query;
    let notification = self.write.poll(|categories| query.set_success(categories));
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);
    notification
  }

  fn captures_input(&self) -> bool {
    self.form.is_active() || self.confirm.is_active() || self.search.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("a", "add").with_priority(30),
      ShortcutInfo::new("e", "edit").with_priority(31),
      ShortcutInfo::new("d", "delete").with_priority(32),
      ShortcutInfo::new("enter", "products").with_priority(40),
      ShortcutInfo::new("r", "refresh").with_priority(50),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_support::{app_context, category, FakeCatalogApi};
  use crossterm::event::KeyModifiers;
  use std::sync::Arc;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(view: &mut CategoryListView, text: &str) {
    for c in text.chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
  }

  async fn settle(view: &mut CategoryListView) -> Option<Notification> {
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick()
  }

  fn loaded_view(api: &Arc<FakeCatalogApi>) -> CategoryListView {
    CategoryListView::new(app_context(api.clone()))
  }

  #[tokio::test]
  async fn test_loads_and_searches() {
    let api = Arc::new(FakeCatalogApi::new());
    api.set_categories(vec![category(1, "Herbicide"), category(2, "Fungicide")]);
    let mut view = loaded_view(&api);
    settle(&mut view).await;
    assert_eq!(view.visible().len(), 2);

    view.handle_key(key(KeyCode::Char('/')));
    type_str(&mut view, "fung");
    let names: Vec<_> = view.visible().iter().map(|c| c.id).collect();
    assert_eq!(names, vec![2]);
  }

  #[tokio::test]
  async fn test_mismatched_delete_never_calls_backend() {
    let api = Arc::new(FakeCatalogApi::new());
    api.set_categories(vec![category(1, "Herbicide")]);
    let mut view = loaded_view(&api);
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('d')));
    assert!(view.captures_input());
    type_str(&mut view, "Herbicide X");
    view.handle_key(key(KeyCode::Enter));
    settle(&mut view).await;

    assert!(view.confirm.is_active());
    assert_eq!(api.count("delete_category"), 0);
    assert_eq!(view.visible().len(), 1);
  }

  #[tokio::test]
  async fn test_typed_delete_refreshes_list() {
    let api = Arc::new(FakeCatalogApi::new());
    api.set_categories(vec![category(1, "Herbicide"), category(2, "Fungicide")]);
    let mut view = loaded_view(&api);
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('d')));
    type_str(&mut view, "Herbicide");
    view.handle_key(key(KeyCode::Enter));
    let notification = settle(&mut view).await;

    assert_eq!(api.count("delete_category"), 1);
    assert_eq!(
      notification.map(|n| n.message),
      Some("Deleted category Herbicide".to_string())
    );
    let ids: Vec<_> = view.visible().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![2]);
  }

  #[tokio::test]
  async fn test_add_requires_names() {
    let api = Arc::new(FakeCatalogApi::new());
    let mut view = loaded_view(&api);
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('a')));
    view.handle_key(key(KeyCode::Enter));
    assert!(view.form.is_active());
    assert_eq!(api.count("create_category"), 0);

    type_str(&mut view, "Seeds");
    view.handle_key(key(KeyCode::Tab));
    type_str(&mut view, "విత్తనాలు");
    view.handle_key(key(KeyCode::Enter));
    settle(&mut view).await;

    assert!(!view.form.is_active());
    assert_eq!(api.count("create_category"), 1);
    assert_eq!(view.visible().len(), 1);
  }
}
