use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::renderfns::{centered_popup, input_line};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by confirm dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmEvent {
  /// Confirmed. Carries what the user typed (empty for yes/no prompts).
  /// A typed confirmation stays open until the parent closes it.
  Confirmed(String),
  Cancelled,
}

#[derive(Debug, Clone, Default)]
enum ConfirmMode {
  #[default]
  YesNo,
  /// The user must type the name shown in the prompt
  Typed(TextInput),
}

/// Destructive-action confirmation
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
  active: bool,
  title: String,
  prompt: String,
  mode: ConfirmMode,
  error: Option<String>,
}

impl ConfirmDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Plain `y`/`n` prompt
  pub fn open_yes_no(&mut self, title: impl Into<String>, prompt: impl Into<String>) {
    self.open(title.into(), prompt.into(), ConfirmMode::YesNo);
  }

  /// Prompt that requires typing a name
  pub fn open_typed(&mut self, title: impl Into<String>, prompt: impl Into<String>) {
    self.open(title.into(), prompt.into(), ConfirmMode::Typed(TextInput::new()));
  }

  fn open(&mut self, title: String, prompt: String, mode: ConfirmMode) {
    self.active = true;
    self.title = title;
    self.prompt = prompt;
    self.mode = mode;
    self.error = None;
  }

  pub fn close(&mut self) {
    self.active = false;
    self.mode = ConfirmMode::YesNo;
    self.error = None;
  }

  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ConfirmEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match &mut self.mode {
      ConfirmMode::YesNo => match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
          self.close();
          KeyResult::Event(ConfirmEvent::Confirmed(String::new()))
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc | KeyCode::Char('q') => {
          self.close();
          KeyResult::Event(ConfirmEvent::Cancelled)
        }
        _ => KeyResult::Handled,
      },
      ConfirmMode::Typed(input) => match input.handle_key(key) {
        InputResult::Submitted(typed) => KeyResult::Event(ConfirmEvent::Confirmed(typed)),
        InputResult::Cancelled => {
          self.close();
          KeyResult::Event(ConfirmEvent::Cancelled)
        }
        InputResult::Consumed => {
          self.error = None;
          KeyResult::Handled
        }
        InputResult::NotHandled => KeyResult::Handled,
      },
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let overlay_area = centered_popup(area, 60, 8);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Red))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines = vec![Line::from(self.prompt.clone()), Line::default()];
    match &self.mode {
      ConfirmMode::YesNo => lines.push(Line::from(vec![
        Span::styled("<y>", Style::default().fg(Color::Cyan)),
        Span::styled(" delete   ", Style::default().fg(Color::DarkGray)),
        Span::styled("<n>", Style::default().fg(Color::Cyan)),
        Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
      ])),
      ConfirmMode::Typed(input) => lines.push(input_line("> ", input)),
    }

    if let Some(error) = &self.error {
      lines.push(Line::from(Span::styled(
        error.clone(),
        Style::default().fg(Color::Red),
      )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[test]
  fn test_yes_no_confirm() {
    let mut dialog = ConfirmDialog::new();
    dialog.open_yes_no("Delete virus", "Delete Leaf Curl?");
    assert_eq!(dialog.handle_key(key(KeyCode::Char('x'))), KeyResult::Handled);
    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('y'))),
      KeyResult::Event(ConfirmEvent::Confirmed(String::new()))
    );
    assert!(!dialog.is_active());
  }

  #[test]
  fn test_yes_no_cancel() {
    let mut dialog = ConfirmDialog::new();
    dialog.open_yes_no("Delete virus", "Delete Leaf Curl?");
    assert_eq!(
      dialog.handle_key(key(KeyCode::Char('n'))),
      KeyResult::Event(ConfirmEvent::Cancelled)
    );
  }

  #[test]
  fn test_typed_confirm_returns_text_and_stays_open() {
    let mut dialog = ConfirmDialog::new();
    dialog.open_typed("Delete category", "Type 'Fruits' to delete");
    for c in "Fruits".chars() {
      dialog.handle_key(key(KeyCode::Char(c)));
    }
    assert_eq!(
      dialog.handle_key(key(KeyCode::Enter)),
      KeyResult::Event(ConfirmEvent::Confirmed("Fruits".to_string()))
    );
    assert!(dialog.is_active());
  }

  #[test]
  fn test_typed_mode_treats_y_as_text() {
    let mut dialog = ConfirmDialog::new();
    dialog.open_typed("Delete product", "Type 'Neem Oil' to delete");
    assert_eq!(dialog.handle_key(key(KeyCode::Char('y'))), KeyResult::Handled);
    assert!(dialog.is_active());
  }
}
