mod command_input;

pub use command_input::{CommandEvent, CommandInput};

/// Outcome of offering a key to a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, with an event for the parent
  Event(T),
  /// Not consumed; the parent should try its own bindings
  NotHandled,
}
