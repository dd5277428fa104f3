//! The host's general undo, reduced to what a backspace binding needs once
//! no input rule is left to revert: step back through recorded edits.

use tracing::{
  debug,
  trace,
};

use crate::{
  selection::Selection,
  transaction::{
    Result,
    Transaction,
  },
  transform::Transform,
};

/// Stack of recorded edits, most recent last.
///
/// Each entry keeps the inversion of an applied transform and the selection
/// it was applied with. Undo replays the inversion of the top entry and pops
/// it once that transaction is applied.
///
/// Limitations:
///  * Selection-only changes are not recorded.
///  * A document change that is not recorded cannot be undone across; it
///    clears the history.
#[derive(Debug, Default, Clone)]
pub struct History {
  done: Vec<Entry>,
}

#[derive(Debug, Clone)]
struct Entry {
  inversion:        Transform,
  selection_before: Selection,
}

impl History {
  /// State transition of the history plugin for an applied transaction.
  pub fn apply(&mut self, tr: &Transaction, selection_before: &Selection) -> Result<()> {
    if tr.is_undo() {
      trace!(depth = self.done.len(), "undo applied");
      self.done.pop();
      return Ok(());
    }
    if !tr.doc_changed() {
      return Ok(());
    }
    if tr.add_to_history() {
      self.done.push(Entry {
        inversion:        tr.transform().invert()?,
        selection_before: selection_before.clone(),
      });
      return Ok(());
    }

    debug!(depth = self.done.len(), "unrecorded document change, clearing history");
    self.done.clear();
    Ok(())
  }

  /// Number of edits that can be undone.
  #[inline]
  pub fn depth(&self) -> usize {
    self.done.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.done.is_empty()
  }

  /// Prepare an undo without mutating history state.
  ///
  /// The returned transaction carries the inversion of the last edit and
  /// restores the selection it was made with. The entry is dropped when the
  /// transaction is applied.
  pub fn undo(&self) -> Option<Transaction> {
    let entry = self.done.last()?;
    let mut tr = Transaction::from(entry.inversion.clone());
    tr.set_selection(entry.selection_before.clone())
      .set_undo(true);
    Some(tr)
  }
}
