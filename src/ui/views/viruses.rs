use super::{id_hint, notify, PendingWrite};
use crate::app::AppContext;
use crate::cache::ResourceKey;
use crate::catalog::drafts::VirusDraft;
use crate::catalog::filter::{filter_viruses, FilterState};
use crate::catalog::types::{CategoryId, Virus, VirusId};
use crate::catalog::VirusPage;
use crate::query::{Query, QueryState};
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, FormDialog, FormEvent, KeyResult, Picker, PickerEvent,
  SearchEvent, SearchInput,
};
use crate::ui::ensure_valid_selection;
use crate::ui::view::{Notification, ShortcutInfo, View, ViewAction};
use crate::ui::views::ProductListView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Form field holding the category id
const CATEGORY_FIELD: usize = 2;

enum FormPurpose {
  Create,
  Edit(VirusId),
}

/// Virus list with a category filter
pub struct VirusListView {
  ctx: AppContext,
  query: Query<VirusPage>,
  write: PendingWrite<Vec<Virus>>,
  list_state: ListState,
  search: SearchInput,
  category_filter: Option<CategoryId>,
  picker: Picker,
  form: FormDialog,
  form_purpose: Option<FormPurpose>,
  confirm: ConfirmDialog,
  pending_delete: Option<Virus>,
}

impl VirusListView {
  pub fn new(ctx: AppContext) -> Self {
    let catalog = ctx.catalog.clone();
    let mut query = Query::new(move || {
      let catalog = catalog.clone();
      async move { catalog.load_virus_page().await.map_err(|e| e.to_string()) }
    });
    query.fetch();

    Self {
      ctx,
      query,
      write: PendingWrite::new(),
      list_state: ListState::default(),
      search: SearchInput::new(),
      category_filter: None,
      picker: Picker::new(),
      form: FormDialog::new(),
      form_purpose: None,
      confirm: ConfirmDialog::new(),
      pending_delete: None,
    }
  }

  fn visible(&self) -> Vec<&Virus> {
    match self.query.data() {
      Some(page) => filter_viruses(&page.viruses, self.search.query(), self.category_filter),
      None => Vec::new(),
    }
  }

  fn selected(&self) -> Option<Virus> {
    let idx = self.list_state.selected()?;
    self.visible().get(idx).map(|v| (*v).clone())
  }

  fn category_name(&self, id: Option<CategoryId>) -> String {
    let Some(id) = id else {
      return "-".to_string();
    };
    self
      .query
      .data()
      .and_then(|page| page.categories.iter().find(|c| c.id == id))
      .map(|c| c.name_en.clone())
      .unwrap_or_else(|| format!("#{}", id))
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let len = self.visible().len();
    ensure_valid_selection(&mut self.list_state, len);

    let filter_label = match self.category_filter {
      Some(id) => format!(" [{}]", self.category_name(Some(id))),
      None => String::new(),
    };
    let title = match self.query.state() {
      QueryState::Loading => " Viruses (loading...) ".to_string(),
      QueryState::Error(e) => format!(" Viruses (error: {}) ", e),
      _ if self.write.is_pending() => format!(" Viruses ({}){} saving... ", len, filter_label),
      _ => format!(" Viruses ({}){} ", len, filter_label),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if len == 0 && !self.query.is_loading() {
      let content = if self.query.is_error() {
        "Failed to load viruses. Press 'r' to retry."
      } else {
        "No viruses match."
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
      .map(|virus| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<6}", virus.id), Style::default().fg(Color::Cyan)),
          Span::raw(" "),
          Span::raw(format!("{:<28}", virus.name_en)),
          Span::styled(format!("{:<20}", virus.name_te), Style::default().fg(Color::Yellow)),
          Span::styled(
            self.category_name(virus.category_id),
            Style::default().fg(Color::Magenta),
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

  fn open_form(&mut self, title: String, values: Vec<String>, purpose: FormPurpose) {
    let hint = self
      .query
      .data()
      .map(|page| id_hint(page.categories.iter().map(|c| (c.id, c.name_en.as_str()))))
      .unwrap_or_default();
    self.form.open(title, &VirusDraft::FIELDS, values);
    self.form.set_hint(CATEGORY_FIELD, hint);
    self.form_purpose = Some(purpose);
  }

  fn submit_form(&mut self, values: Vec<String>) -> ViewAction {
    let categories = self
      .query
      .data()
      .map(|page| page.categories.clone())
      .unwrap_or_default();
    let draft = match VirusDraft::from_fields(&values, &categories) {
      Ok(draft) => draft,
      Err(e) => {
        self.form.set_error(e.to_string());
        return ViewAction::None;
      }
    };
    self.form.close();

    let catalog = self.ctx.catalog.clone();
    let notification = match self.form_purpose.take() {
      Some(FormPurpose::Edit(id)) => self.write.start(
        format!("Updated virus {}", draft.name_en),
        async move { catalog.update_virus(id, draft).await.map_err(|e| e.to_string()) },
      ),
      Some(FormPurpose::Create) | None => self.write.start(
        format!("Added virus {}", draft.name_en),
        async move { catalog.create_virus(draft).await.map_err(|e| e.to_string()) },
      ),
    };
    notify(notification)
  }

  fn confirm_delete(&mut self) -> ViewAction {
    let Some(virus) = self.pending_delete.take() else {
      return ViewAction::None;
    };
    let catalog = self.ctx.catalog.clone();
    notify(self.write.start(
      format!("Deleted virus {}", virus.name_en),
      async move { catalog.delete_virus(virus.id).await.map_err(|e| e.to_string()) },
    ))
  }

  fn open_category_picker(&mut self) {
    let Some(page) = self.query.data() else {
      return;
    };
    let mut options = vec!["All categories".to_string()];
    options.extend(page.categories.iter().map(|c| c.name_en.clone()));
    let current = self
      .category_filter
      .and_then(|id| page.categories.iter().position(|c| c.id == id))
      .map_or(0, |pos| pos + 1);
    self.picker.show("Filter by category", options, current);
  }

  fn pick_category(&mut self, index: usize) {
    self.category_filter = match index {
      0 => None,
      i => self
        .query
        .data()
        .and_then(|page| page.categories.get(i - 1))
        .map(|c| c.id),
    };
    self.list_state.select(Some(0));
  }

  fn refresh(&mut self) -> ViewAction {
    if let Err(e) = self
      .ctx
      .catalog
      .invalidate(&[ResourceKey::Viruses, ResourceKey::Categories])
    {
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
      KeyResult::Event(ConfirmEvent::Confirmed(_)) => return Some(self.confirm_delete()),
      KeyResult::Event(ConfirmEvent::Cancelled) => {
        self.pending_delete = None;
        return Some(ViewAction::None);
      }
    }

    match self.picker.handle_key(key) {
      KeyResult::NotHandled => {}
      KeyResult::Event(PickerEvent::Selected(index)) => {
        self.pick_category(index);
        return Some(ViewAction::None);
      }
      KeyResult::Handled | KeyResult::Event(PickerEvent::Cancelled) => {
        return Some(ViewAction::None)
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
        let page = self.query.data()?;
        let values = VirusDraft::new_default(&page.categories);
        self.open_form("New virus".to_string(), values, FormPurpose::Create);
        Some(ViewAction::None)
      }
      KeyCode::Char('e') => {
        let virus = self.selected()?;
        self.open_form(
          format!("Edit virus {}", virus.id),
          VirusDraft::from_virus(&virus),
          FormPurpose::Edit(virus.id),
        );
        Some(ViewAction::None)
      }
      KeyCode::Char('d') => {
        let virus = self.selected()?;
        self
          .confirm
          .open_yes_no("Delete virus", format!("Delete '{}'?", virus.name_en));
        self.pending_delete = Some(virus);
        Some(ViewAction::None)
      }
      KeyCode::Char('c') => {
        self.open_category_picker();
        Some(ViewAction::None)
      }
      KeyCode::Char('r') => Some(self.refresh()),
      KeyCode::Enter => {
        let virus = self.selected()?;
        let filter = FilterState {
          category_id: virus.category_id,
          virus_id: Some(virus.id),
          ..FilterState::default()
        };
        Some(ViewAction::Push(Box::new(ProductListView::with_filter(
          self.ctx.clone(),
          filter,
        ))))
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for VirusListView {
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
    "Viruses".to_string()
  }

  fn tick(&mut self) -> Option<Notification> {
    self.query.poll();
    let query = &mut self.query;
    let notification = self.write.poll(|viruses| {
      if let Some(page) = query.data_mut() {
        page.viruses = viruses;
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
      ShortcutInfo::new("c", "category").with_priority(25),
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
  use crate::test_support::{app_context, category, virus, FakeCatalogApi};
  use crossterm::event::KeyModifiers;
  use std::sync::Arc;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  async fn settle(view: &mut VirusListView) -> Option<Notification> {
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick()
  }

  fn backend() -> Arc<FakeCatalogApi> {
    let api = Arc::new(FakeCatalogApi::new());
    api.set_categories(vec![category(1, "Herbicide"), category(2, "Fungicide")]);
    api.set_viruses(vec![
      virus(100, "Leaf Curl", Some(1)),
      virus(101, "Blight", Some(2)),
      virus(102, "Rust", Some(2)),
    ]);
    api
  }

  fn visible_ids(view: &VirusListView) -> Vec<VirusId> {
    view.visible().iter().map(|v| v.id).collect()
  }

  #[tokio::test]
  async fn test_category_picker_filters_list() {
    let api = backend();
    let mut view = VirusListView::new(app_context(api));
    settle(&mut view).await;
    assert_eq!(visible_ids(&view), vec![100, 101, 102]);

    view.handle_key(key(KeyCode::Char('c')));
    assert!(view.captures_input());
    view.handle_key(key(KeyCode::Down));
    view.handle_key(key(KeyCode::Down));
    view.handle_key(key(KeyCode::Enter));
    assert_eq!(visible_ids(&view), vec![101, 102]);

    view.handle_key(key(KeyCode::Char('c')));
    view.handle_key(key(KeyCode::Char('k')));
    view.handle_key(key(KeyCode::Char('k')));
    view.handle_key(key(KeyCode::Enter));
    assert_eq!(visible_ids(&view), vec![100, 101, 102]);
  }

  #[tokio::test]
  async fn test_yes_no_delete() {
    let api = backend();
    let mut view = VirusListView::new(app_context(api.clone()));
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('d')));
    view.handle_key(key(KeyCode::Char('n')));
    settle(&mut view).await;
    assert_eq!(api.count("delete_virus"), 0);

    view.handle_key(key(KeyCode::Char('d')));
    view.handle_key(key(KeyCode::Char('y')));
    let notification = settle(&mut view).await;
    assert_eq!(api.count("delete_virus"), 1);
    assert_eq!(
      notification.map(|n| n.message),
      Some("Deleted virus Leaf Curl".to_string())
    );
    assert_eq!(visible_ids(&view), vec![101, 102]);
  }

  #[tokio::test]
  async fn test_unknown_category_rejected_inline() {
    let api = backend();
    let mut view = VirusListView::new(app_context(api.clone()));
    settle(&mut view).await;

    view.handle_key(key(KeyCode::Char('a')));
    for c in "Mosaic".chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
    view.handle_key(key(KeyCode::Tab));
    view.handle_key(key(KeyCode::Char('మ')));
    view.handle_key(key(KeyCode::Tab));
    view.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
    view.handle_key(key(KeyCode::Char('9')));
    view.handle_key(key(KeyCode::Enter));

    assert!(view.form.is_active());
    assert_eq!(api.count("create_virus"), 0);
  }

  #[tokio::test]
  async fn test_enter_opens_products_for_virus() {
    let api = backend();
    let mut view = VirusListView::new(app_context(api));
    settle(&mut view).await;
    assert!(matches!(
      view.handle_key(key(KeyCode::Enter)),
      ViewAction::Push(_)
    ));
  }
}
