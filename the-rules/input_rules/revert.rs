use tracing::{
  debug,
  warn,
};

use crate::{
  Tendril,
  state::{
    EditorState,
    PluginKey,
  },
  transaction::{
    Result,
    Transaction,
  },
  transform::Transform,
};

/// The last change made by an input rule, kept until anything else changes
/// the document or the selection.
#[derive(Debug, Clone)]
pub struct RevertRecord {
  /// The rule's edit, starting from the document before the rule fired.
  pub transform: Transform,
  /// The insertion the rule intercepted: `text` replacing `[from, to)`.
  pub from:      usize,
  pub to:        usize,
  pub text:      Tendril,
}

/// Tags a transaction as produced by the input rules engine `key`.
#[derive(Debug, Clone)]
pub struct RuleApplication {
  pub key:    PluginKey,
  pub record: RevertRecord,
}

/// Engine state after `tr`: the record it carries for this engine, nothing
/// when it changes the document or the selection, and `prev` otherwise.
pub(crate) fn next_record(
  key: PluginKey,
  tr: &Transaction,
  prev: Option<&RevertRecord>,
) -> Option<RevertRecord> {
  if let Some(applied) = tr.rule_applied().filter(|applied| applied.key == key) {
    return Some(applied.record.clone());
  }
  if tr.doc_changed() || tr.selection_set() {
    return None;
  }
  prev.cloned()
}

/// Build the transaction that undoes `record`: every step of the rule's edit
/// inverted in reverse, then the intercepted text inserted as if no rule had
/// fired.
pub fn revert(state: &EditorState, record: &RevertRecord) -> Result<Transaction> {
  let mut tr = state.tr();
  let transform = &record.transform;
  for (step, before) in transform.steps().iter().zip(transform.docs()).rev() {
    tr.step(step.invert(before)?)?;
  }

  if record.text.is_empty() {
    tr.delete(record.from, record.to)?;
  } else {
    let marks = tr.doc().marks_at(record.from);
    tr.replace_with_marks(record.from, record.to, &record.text, marks)?;
  }
  Ok(tr)
}

/// Revert the change made by the last applied input rule.
///
/// Returns whether some input rules engine holds a revert record, with or
/// without `dispatch`. The revert transaction is only built and dispatched
/// when `dispatch` is given; a record that no longer fits the document is
/// logged and nothing is dispatched.
pub fn undo_input_rule(state: &EditorState, dispatch: Option<&mut dyn FnMut(Transaction)>) -> bool {
  let Some((key, record)) = state
    .input_rules()
    .find_map(|(key, _, record)| record.map(|record| (key, record)))
  else {
    return false;
  };

  if let Some(dispatch) = dispatch {
    match revert(state, record) {
      Ok(tr) => {
        debug!(?key, from = record.from, to = record.to, "reverting input rule");
        dispatch(tr);
      },
      Err(err) => warn!(?key, "input rule revert failed: {err}"),
    }
  }
  true
}
