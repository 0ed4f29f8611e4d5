use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{Notification, ShortcutInfo, View, ViewAction};
use crate::ui::views::{
  CartView, CategoryListView, DashboardView, OrderListView, ProductListView, VirusListView,
};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::cell::RefCell;
use std::io::stdout;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Cart shared by every view that can add to or check out from it
pub type SharedCart = Rc<RefCell<Cart>>;

/// Everything a view needs from the application
#[derive(Clone)]
pub struct AppContext {
  pub catalog: Catalog,
  pub cart: SharedCart,
  /// WhatsApp number checkout messages are addressed to
  pub vendor_number: String,
}

impl AppContext {
  pub fn new(catalog: Catalog, vendor_number: impl Into<String>) -> Self {
    Self {
      catalog,
      cart: Rc::new(RefCell::new(Cart::new())),
      vendor_number: vendor_number.into(),
    }
  }
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// `:` command palette
  command_input: CommandInput,

  ctx: AppContext,

  /// Header title
  title: String,

  /// Backend URL shown in the header
  base_url: String,

  /// Footer message, cleared once expired
  notification: Option<Notification>,

  should_quit: bool,
}

impl App {
  /// Build the app with the product list as the root screen.
  /// Views start loading immediately, so this needs a tokio runtime.
  pub fn new(ctx: AppContext, title: impl Into<String>, base_url: impl Into<String>) -> Self {
    let root: Box<dyn View> = Box::new(ProductListView::new(ctx.clone()));
    Self {
      view_stack: vec![root],
      command_input: CommandInput::new(),
      ctx,
      title: title.into(),
      base_url: base_url.into(),
      notification: None,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit() {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    info!("Exiting");
    Ok(())
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  pub fn notification(&self) -> Option<&Notification> {
    self.notification.as_ref()
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view_stack.last_mut()
  }

  pub fn current_shortcuts(&self) -> Vec<ShortcutInfo> {
    self
      .current_view()
      .map(|v| v.shortcuts())
      .unwrap_or_default()
  }

  /// One label per stacked view, root first
  pub fn view_breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect()
  }

  /// Poll every view so buried screens keep their data current
  pub fn tick(&mut self) {
    let mut latest = None;
    for view in &mut self.view_stack {
      if let Some(notification) = view.tick() {
        latest = Some(notification);
      }
    }
    if latest.is_some() {
      self.notification = latest;
    }

    let now = Instant::now();
    if self.notification.as_ref().is_some_and(|n| n.is_expired(now)) {
      self.notification = None;
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // A view typing into a form or search owns ':' too
    let captured = self.current_view().is_some_and(|v| v.captures_input());
    if !captured || self.command_input.is_active() {
      match self.command_input.handle_key(key) {
        KeyResult::NotHandled => {}
        KeyResult::Handled | KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
      }
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "Push view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Notify(notification) => self.notification = Some(notification),
    }
  }

  fn set_root(&mut self, view: Box<dyn View>) {
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  fn execute_command(&mut self, cmd: &str) {
    debug!(command = cmd, "Execute command");
    let ctx = self.ctx.clone();
    match cmd {
      "products" => self.set_root(Box::new(ProductListView::new(ctx))),
      "categories" => self.set_root(Box::new(CategoryListView::new(ctx))),
      "viruses" => self.set_root(Box::new(VirusListView::new(ctx))),
      "orders" => self.set_root(Box::new(OrderListView::new(ctx))),
      "dashboard" => self.set_root(Box::new(DashboardView::new(ctx))),
      "cart" => self.set_root(Box::new(CartView::new(ctx))),
      "quit" => self.should_quit = true,
      "" => {}
      other => {
        self.notification = Some(Notification::error(format!("Unknown command: {}", other)));
      }
    }
  }
}
