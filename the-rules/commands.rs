//! Commands bound to keys by the host.
//!
//! A command inspects the state and reports whether it applies. When given a
//! dispatch callback it also builds its transaction and hands it over; called
//! without one it is a pure query.

use tracing::debug;

use crate::{
  history::History,
  state::EditorState,
  transaction::Transaction,
};
pub use crate::input_rules::undo_input_rule;

pub type Command = fn(&EditorState, Option<&mut dyn FnMut(Transaction)>) -> bool;

/// Step back in the general history.
pub fn undo(state: &EditorState, dispatch: Option<&mut dyn FnMut(Transaction)>) -> bool {
  let Some(tr) = state.history().and_then(History::undo) else {
    return false;
  };
  if let Some(dispatch) = dispatch {
    debug!("undo");
    // the history is cleared by any unrecorded change, so its last entry
    // always starts from the current document
    dispatch(state.stamp(tr));
  }
  true
}

/// Run the first command that applies. Bind backspace to
/// `[undo_input_rule, ...]` to revert a rule before anything else.
pub fn first(
  commands: &[Command],
  state: &EditorState,
  dispatch: Option<&mut dyn FnMut(Transaction)>,
) -> bool {
  match commands.iter().find(|command| command(state, None)) {
    Some(command) => command(state, dispatch),
    None => false,
  }
}
