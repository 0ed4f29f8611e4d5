use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use std::time::{Duration, Instant};

/// How long a footer notification stays visible
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
  Info,
  Error,
}

/// Transient message shown in the footer
#[derive(Debug, Clone)]
pub struct Notification {
  pub message: String,
  pub level: NotificationLevel,
  created: Instant,
}

impl Notification {
  pub fn info(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      level: NotificationLevel::Info,
      created: Instant::now(),
    }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      level: NotificationLevel::Error,
      created: Instant::now(),
    }
  }

  pub fn is_expired(&self, now: Instant) -> bool {
    now.duration_since(self.created) >= NOTIFICATION_TTL
  }
}

/// Actions that a view can request in response to user input
pub enum ViewAction {
  /// No action needed
  None,
  /// Push a new view onto the stack
  Push(Box<dyn View>),
  /// Pop current view from stack (go back)
  Pop,
  /// Show a message in the footer
  Notify(Notification),
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, forms, confirmations) and
/// return actions for the App to execute. This creates a clean delegation
/// chain: App → View → Components
///
/// Views that load data asynchronously use Query<T> and Mutation<T>
/// internally and poll them in the tick() method.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to poll async work. A finished write reports back
  /// through the returned notification.
  fn tick(&mut self) -> Option<Notification> {
    None
  }

  /// True while an overlay owns the keyboard, so the App must not treat
  /// `:` or `q` as its own
  fn captures_input(&self) -> bool {
    false
  }

  /// Get keyboard shortcuts to display in the header
  /// Override this to provide view-specific shortcuts
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "search").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
