use crate::catalog::types::OrderStatus;
use crate::ui::components::TextInput;
use chrono::{DateTime, Utc};
use ratatui::prelude::*;

/// Truncate to at most `max_chars` characters, adding "..." if truncated.
/// Counts chars so Telugu names never split mid-codepoint.
pub fn truncate(s: &str, max_chars: usize) -> String {
  if s.chars().count() <= max_chars {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Display color for an order status
pub fn order_status_color(status: OrderStatus) -> Color {
  match status {
    OrderStatus::Completed => Color::Green,
    OrderStatus::Shipped => Color::Cyan,
    OrderStatus::Pending => Color::Yellow,
    OrderStatus::Cancelled => Color::Red,
    OrderStatus::Unknown => Color::White,
  }
}

/// Red when sold out, yellow when running low
pub fn stock_color(quantity: u32) -> Color {
  match quantity {
    0 => Color::Red,
    1..=5 => Color::Yellow,
    _ => Color::Green,
  }
}

pub fn format_price(price: f64) -> String {
  format!("₹{:.2}", price)
}

/// "cached 42s ago" for data served from the local cache
pub fn cache_age(cached_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<String> {
  let secs = now.signed_duration_since(cached_at?).num_seconds().max(0);
  Some(if secs < 60 {
    format!("cached {}s ago", secs)
  } else {
    format!("cached {}m ago", secs / 60)
  })
}

/// Overlay anchored at the top-left of `area`, like the k9s prompt
pub fn top_left_popup(area: Rect, height: u16) -> Rect {
  let width = (area.width / 2).max(40).min(area.width);
  let height = height.min(area.height);
  Rect::new(area.x, area.y, width, height)
}

/// Overlay centered in `area`, clamped to fit
pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width.saturating_sub(4)).max(20).min(area.width);
  let height = height.min(area.height.saturating_sub(2)).max(3).min(area.height);
  let x = area.x + area.width.saturating_sub(width) / 2;
  let y = area.y + area.height.saturating_sub(height) / 2;
  Rect::new(x, y, width, height)
}

/// One-line rendering of a text input with a block cursor
pub fn input_line(prefix: &str, input: &TextInput) -> Line<'static> {
  let (before, after) = input.split_at_cursor();
  let mut rest = after.chars();
  let under_cursor = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());

  Line::from(vec![
    Span::styled(prefix.to_string(), Style::default().fg(Color::Yellow)),
    Span::raw(before.to_string()),
    Span::styled(under_cursor, Style::default().add_modifier(Modifier::REVERSED)),
    Span::raw(rest.as_str().to_string()),
  ])
}
