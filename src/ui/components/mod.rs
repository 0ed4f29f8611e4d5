mod command_input;
mod confirm_dialog;
mod form;
mod input;
mod picker;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm_dialog::{ConfirmDialog, ConfirmEvent};
pub use form::{FormDialog, FormEvent};
pub use input::TextInput;
pub use picker::{Picker, PickerEvent};
pub use search_input::{SearchEvent, SearchInput};

/// Outcome of offering a key to a component.
///
/// Every overlay returns this so views can chain them with `or_else`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Key was consumed, no event for parent to handle
  Handled,
  /// Key was consumed, here's an event for parent to process
  Event(T),
  /// Key was not consumed, parent should try next handler
  NotHandled,
}
