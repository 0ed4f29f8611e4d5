use crate::app::AppContext;
use crate::cart::CheckoutDetails;
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, FormDialog, FormEvent, KeyResult,
};
use crate::ui::ensure_valid_selection;
use crate::ui::view::{Notification, ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

/// Message and link produced by a successful checkout
#[derive(Debug, Clone, PartialEq)]
struct Checkout {
  message: String,
  url: String,
}

/// Cart contents and the WhatsApp checkout form
pub struct CartView {
  ctx: AppContext,
  list_state: ListState,
  form: FormDialog,
  confirm: ConfirmDialog,
  details: CheckoutDetails,
  checkout: Option<Checkout>,
}

impl CartView {
  pub fn new(ctx: AppContext) -> Self {
    Self {
      ctx,
      list_state: ListState::default(),
      form: FormDialog::new(),
      confirm: ConfirmDialog::new(),
      details: CheckoutDetails::default(),
      checkout: None,
    }
  }

  fn item_count(&self) -> usize {
    self.ctx.cart.borrow().len()
  }

  fn submit_checkout(&mut self, values: Vec<String>) -> ViewAction {
    let details = CheckoutDetails::from_fields(&values);
    let result = {
      let cart = self.ctx.cart.borrow();
      cart.message(&details).and_then(|message| {
        let url = cart.whatsapp_url(&self.ctx.vendor_number, &details)?;
        Ok(Checkout {
          message,
          url: url.to_string(),
        })
      })
    };
    self.details = details;

    match result {
      Ok(checkout) => {
        self.form.close();
        self.checkout = Some(checkout);
        ViewAction::Notify(Notification::info("WhatsApp link ready"))
      }
      Err(e) => {
        self.form.set_error(e.to_string());
        ViewAction::None
      }
    }
  }

  fn render_items(&mut self, frame: &mut Frame, area: Rect) {
    let cart = self.ctx.cart.borrow();
    ensure_valid_selection(&mut self.list_state, cart.len());

    let block = Block::default()
      .title(format!(" Cart ({}) ", cart.len()))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if cart.is_empty() {
      let paragraph = Paragraph::new("Cart is empty. Press 'b' on a product to add it.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = cart
      .items()
      .iter()
      .enumerate()
      .map(|(i, item)| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:>3}. ", i + 1), Style::default().fg(Color::Cyan)),
          Span::raw(item.clone()),
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

  fn render_checkout(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Checkout ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let lines: Vec<Line> = match &self.checkout {
      Some(checkout) => {
        let mut lines: Vec<Line> = checkout
          .message
          .lines()
          .map(|l| Line::from(l.to_string()))
          .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
          "Open this link to send the order:",
          Style::default().fg(Color::Gray),
        )));
        lines.push(Line::from(Span::styled(
          checkout.url.clone(),
          Style::default().fg(Color::Green),
        )));
        lines
      }
      None => vec![Line::from(Span::styled(
        "Press Enter to fill in buyer details and build the WhatsApp message.",
        Style::default().fg(Color::DarkGray),
      ))],
    };

    let paragraph = Paragraph::new(lines)
      .block(block)
      .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
  }

  fn handle_overlays(&mut self, key: KeyEvent) -> Option<ViewAction> {
    match self.form.handle_key(key) {
      KeyResult::NotHandled => {}
      KeyResult::Handled | KeyResult::Event(FormEvent::Cancelled) => {
        return Some(ViewAction::None)
      }
      KeyResult::Event(FormEvent::Submitted(values)) => return Some(self.submit_checkout(values)),
    }

    match self.confirm.handle_key(key) {
      KeyResult::NotHandled => None,
      KeyResult::Handled | KeyResult::Event(ConfirmEvent::Cancelled) => Some(ViewAction::None),
      KeyResult::Event(ConfirmEvent::Confirmed(_)) => {
        self.ctx.cart.borrow_mut().clear();
        self.checkout = None;
        Some(ViewAction::Notify(Notification::info("Cart cleared")))
      }
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
      KeyCode::Char('d') => {
        let idx = self.list_state.selected()?;
        let removed = self.ctx.cart.borrow_mut().remove(idx)?;
        self.checkout = None;
        let len = self.item_count();
        ensure_valid_selection(&mut self.list_state, len);
        Some(ViewAction::Notify(Notification::info(format!(
          "Removed {}",
          removed
        ))))
      }
      KeyCode::Char('c') => {
        if self.ctx.cart.borrow().is_empty() {
          return Some(ViewAction::None);
        }
        self
          .confirm
          .open_yes_no("Clear cart", "Remove every item from the cart?");
        Some(ViewAction::None)
      }
      KeyCode::Enter => {
        self.form.open(
          "Checkout via WhatsApp",
          &CheckoutDetails::FIELDS,
          self.details.to_fields(),
        );
        Some(ViewAction::None)
      }
      KeyCode::Char('q') | KeyCode::Esc => Some(ViewAction::Pop),
      _ => None,
    }
  }
}

impl View for CartView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    self
      .handle_overlays(key)
      .or_else(|| self.handle_navigation(key))
      .or_else(|| self.handle_actions(key))
      .unwrap_or(ViewAction::None)
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
      .split(area);

    self.render_items(frame, chunks[0]);
    self.render_checkout(frame, chunks[1]);
    self.confirm.render_overlay(frame, area);
    self.form.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Cart".to_string()
  }

  fn tick(&mut self) -> Option<Notification> {
    // Other views add to the shared cart while this one is buried
    let len = self.item_count();
    ensure_valid_selection(&mut self.list_state, len);
    None
  }

  fn captures_input(&self) -> bool {
    self.form.is_active() || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("enter", "checkout").with_priority(20),
      ShortcutInfo::new("d", "remove").with_priority(30),
      ShortcutInfo::new("c", "clear").with_priority(31),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
