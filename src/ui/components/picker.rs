use super::KeyResult;
use crate::ui::renderfns::centered_popup;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by picker that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
  /// Option selected (index into the options passed to `show`)
  Selected(usize),
  /// Picker cancelled
  Cancelled,
}

/// Single-choice list overlay, used for the filter dropdowns
#[derive(Debug, Clone, Default)]
pub struct Picker {
  active: bool,
  options: Vec<String>,
  selected: usize,
  title: String,
}

impl Picker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if picker is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker with `current` highlighted
  pub fn show(&mut self, title: impl Into<String>, options: Vec<String>, current: usize) {
    self.active = true;
    self.selected = current.min(options.len().saturating_sub(1));
    self.options = options;
    self.title = title.into();
  }

  /// Hide the picker
  pub fn hide(&mut self) {
    self.active = false;
    self.options.clear();
    self.selected = 0;
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<PickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(PickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        let event = if self.selected < self.options.len() {
          PickerEvent::Selected(self.selected)
        } else {
          PickerEvent::Cancelled
        };
        self.hide();
        KeyResult::Event(event)
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.options.is_empty() {
          self.selected = (self.selected + 1) % self.options.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.options.is_empty() {
          self.selected = if self.selected == 0 {
            self.options.len() - 1
          } else {
            self.selected - 1
          };
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Overlay size before clamping to the screen; long lists saturate
  fn popup_size(&self) -> (u16, u16) {
    let max_len = self
      .options
      .iter()
      .map(|o| o.chars().count())
      .max()
      .unwrap_or(10);
    let width = u16::try_from(max_len).unwrap_or(u16::MAX).saturating_add(6);
    let height = u16::try_from(self.options.len())
      .unwrap_or(u16::MAX)
      .saturating_add(2);
    (width, height)
  }

  /// Render the picker overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active || self.options.is_empty() {
      return;
    }

    let (width, height) = self.popup_size();
    let overlay_area = centered_popup(area, width, height);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = self
      .options
      .iter()
      .map(|option| ListItem::new(Span::styled(option.as_str(), Style::default().fg(Color::Cyan))))
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn options() -> Vec<String> {
    vec!["All".to_string(), "Liquid".to_string(), "Solid".to_string()]
  }

  #[test]
  fn test_select_wraps_around() {
    let mut picker = Picker::new();
    picker.show("Type", options(), 0);
    picker.handle_key(key(KeyCode::Up));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected(2))
    );
    assert!(!picker.is_active());
  }

  #[test]
  fn test_starts_at_current() {
    let mut picker = Picker::new();
    picker.show("Type", options(), 1);
    picker.handle_key(key(KeyCode::Char('j')));
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Selected(2))
    );
  }

  #[test]
  fn test_cancel() {
    let mut picker = Picker::new();
    picker.show("Type", options(), 0);
    assert_eq!(
      picker.handle_key(key(KeyCode::Esc)),
      KeyResult::Event(PickerEvent::Cancelled)
    );
  }

  #[test]
  fn test_empty_options_cancel_on_enter() {
    let mut picker = Picker::new();
    picker.show("Virus", Vec::new(), 3);
    assert_eq!(
      picker.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(PickerEvent::Cancelled)
    );
  }

  #[test]
  fn test_oversized_options_fit_the_screen() {
    let mut picker = Picker::new();
    let mut many: Vec<String> = (0..70_000).map(|i| format!("Virus {}", i)).collect();
    many.push("x".repeat(70_000));
    picker.show("Virus", many, 0);
    assert_eq!(picker.popup_size(), (u16::MAX, u16::MAX));

    let backend = ratatui::backend::TestBackend::new(60, 20);
    let mut terminal = ratatui::Terminal::new(backend).unwrap();
    terminal
      .draw(|frame| picker.render_overlay(frame, frame.area()))
      .unwrap();
    let top: String = (0..60u16)
      .map(|x| terminal.backend().buffer()[(x, 1)].symbol().to_string())
      .collect();
    assert!(top.contains("Virus"));
  }
}
