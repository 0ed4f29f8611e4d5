use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::ui::renderfns::{centered_popup, input_line};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Events emitted by the form dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
  /// Enter pressed; the raw field values in label order.
  /// The dialog stays open so the parent can report a validation error.
  Submitted(Vec<String>),
  Cancelled,
}

#[derive(Debug, Clone)]
struct Field {
  label: &'static str,
  input: TextInput,
  hint: Option<String>,
}

/// Modal form with one labeled text input per field
#[derive(Debug, Clone, Default)]
pub struct FormDialog {
  active: bool,
  title: String,
  fields: Vec<Field>,
  focused: usize,
  error: Option<String>,
}

impl FormDialog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Open with `labels`, prefilled from `values` (missing values are empty)
  pub fn open(&mut self, title: impl Into<String>, labels: &[&'static str], values: Vec<String>) {
    let mut values = values.into_iter();
    self.fields = labels
      .iter()
      .map(|&label| Field {
        label,
        input: TextInput::with_value(&values.next().unwrap_or_default()),
        hint: None,
      })
      .collect();
    self.title = title.into();
    self.focused = 0;
    self.error = None;
    self.active = true;
  }

  pub fn close(&mut self) {
    self.active = false;
    self.fields.clear();
    self.error = None;
  }

  /// Help text rendered under a field, e.g. the ids a field accepts
  pub fn set_hint(&mut self, index: usize, hint: impl Into<String>) {
    if let Some(field) = self.fields.get_mut(index) {
      field.hint = Some(hint.into());
    }
  }

  pub fn set_error(&mut self, error: impl Into<String>) {
    self.error = Some(error.into());
  }

  pub fn values(&self) -> Vec<String> {
    self
      .fields
      .iter()
      .map(|f| f.input.value().to_string())
      .collect()
  }

  fn focus_next(&mut self) {
    if !self.fields.is_empty() {
      self.focused = (self.focused + 1) % self.fields.len();
    }
  }

  fn focus_previous(&mut self) {
    if !self.fields.is_empty() {
      self.focused = (self.focused + self.fields.len() - 1) % self.fields.len();
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<FormEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        self.focus_next();
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus_previous();
        return KeyResult::Handled;
      }
      _ => {}
    }

    let Some(field) = self.fields.get_mut(self.focused) else {
      self.close();
      return KeyResult::Event(FormEvent::Cancelled);
    };

    match field.input.handle_key(key) {
      InputResult::Submitted(_) => KeyResult::Event(FormEvent::Submitted(self.values())),
      InputResult::Cancelled => {
        self.close();
        KeyResult::Event(FormEvent::Cancelled)
      }
      InputResult::Consumed => {
        self.error = None;
        KeyResult::Handled
      }
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let rows_per_field = |f: &Field| -> u16 { if f.hint.is_some() { 3 } else { 2 } };
    let body: u16 = self.fields.iter().map(rows_per_field).sum();
    let height = body + 2 + 2; // borders + error/help line
    let overlay_area = centered_popup(area, 70, height);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title))
      .title_bottom(Line::from(" Tab next · Enter save · Esc cancel ").right_aligned());

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let mut lines = Vec::new();
    for (i, field) in self.fields.iter().enumerate() {
      let label_style = if i == self.focused {
        Style::default().fg(Color::Cyan).bold()
      } else {
        Style::default().fg(Color::Gray)
      };
      lines.push(Line::from(Span::styled(field.label, label_style)));

      if i == self.focused {
        lines.push(input_line("  ", &field.input));
      } else {
        lines.push(Line::from(format!("  {}", field.input.value())));
      }

      if let Some(hint) = &field.hint {
        lines.push(Line::from(Span::styled(
          format!("  {}", hint),
          Style::default().fg(Color::DarkGray),
        )));
      }
    }

    if let Some(error) = &self.error {
      lines.push(Line::default());
      lines.push(Line::from(Span::styled(
        error.clone(),
        Style::default().fg(Color::Red),
      )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
  }
}
