pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::ListState;

/// Keep a list selection inside `0..len`, selecting the first row when
/// nothing is selected yet
pub fn ensure_valid_selection(list_state: &mut ListState, len: usize) {
  if len == 0 {
    list_state.select(None);
    return;
  }
  match list_state.selected() {
    Some(idx) if idx >= len => list_state.select(Some(len - 1)),
    None => list_state.select(Some(0)),
    _ => {}
  }
}

/// Main draw function: header, current view, footer, command palette
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Footer
    ])
    .split(frame.area());

  let shortcuts = app.current_shortcuts();
  renderfns::draw_header(frame, chunks[0], app.title(), app.base_url(), &shortcuts);

  if let Some(view) = app.current_view_mut() {
    view.render(frame, chunks[1]);
  }

  renderfns::draw_footer(
    frame,
    chunks[2],
    &app.view_breadcrumb(),
    app.notification(),
  );

  app.command_input().render_overlay(frame, chunks[1]);
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_selection_clamped_to_shrunk_list() {
    let mut state = ListState::default();
    state.select(Some(7));
    ensure_valid_selection(&mut state, 3);
    assert_eq!(state.selected(), Some(2));
  }

  #[test]
  fn test_selection_starts_at_first_row() {
    let mut state = ListState::default();
    ensure_valid_selection(&mut state, 4);
    assert_eq!(state.selected(), Some(0));
  }

  #[test]
  fn test_selection_cleared_for_empty_list() {
    let mut state = ListState::default();
    state.select(Some(1));
    ensure_valid_selection(&mut state, 0);
    assert_eq!(state.selected(), None);
  }
}
