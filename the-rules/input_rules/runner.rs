use the_core::chars::PLACEHOLDER;
use tracing::{
  debug,
  trace,
};

use super::{
  InputRules,
  RevertRecord,
  RuleApplication,
};
use crate::{
  state::{
    EditorState,
    PluginKey,
  },
  transaction::Transaction,
};

/// A text insertion about to happen: `text` replaces `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextInput<'a> {
  pub from:      usize,
  pub to:        usize,
  pub text:      &'a str,
  /// An input method composition is in progress.
  pub composing: bool,
}

impl<'a> TextInput<'a> {
  pub fn new(from: usize, to: usize, text: &'a str) -> Self {
    Self {
      from,
      to,
      text,
      composing: false,
    }
  }

  pub fn composing(mut self, composing: bool) -> Self {
    self.composing = composing;
    self
  }
}

/// Run `rules` against the text before `input.from` followed by the inserted
/// text.
///
/// Returns the transaction of the first rule that matches and does not
/// decline, tagged with a revert record for the engine `key` when the rule is
/// undoable. `None` means the insertion was not handled.
pub fn try_rules(
  state: &EditorState,
  key: PluginKey,
  rules: &InputRules,
  input: TextInput<'_>,
) -> Option<Transaction> {
  if input.composing {
    trace!(from = input.from, "input rules skipped while composing");
    return None;
  }

  let doc = state.doc();
  if doc.in_verbatim(input.from) {
    trace!(from = input.from, "input rules skipped in verbatim block");
    return None;
  }

  let (block_start, _) = doc.block_range(input.from);
  let window_start = block_start.max(input.from.saturating_sub(rules.max_match()));
  let mut window = doc.text_between(window_start, input.from, PLACEHOLDER);
  window.push_str(input.text);
  trace!(window = %window, from = input.from, to = input.to, "input rules window");

  let typed_len = input.text.chars().count();
  for (index, rule) in rules.iter().enumerate() {
    let Some(matched) = rule.find(&window) else {
      continue;
    };

    let matched_len = matched.as_str().chars().count();
    // lies entirely inside text that is not in the document yet
    let Some(before_len) = matched_len.checked_sub(typed_len) else {
      trace!(rule = index, "match shorter than the typed text");
      continue;
    };
    let start = input.from.saturating_sub(before_len);

    let Some(mut tr) = rule.action().apply(state, &matched, start, input.to) else {
      trace!(rule = index, pattern = rule.pattern(), "input rule declined");
      continue;
    };

    if rule.is_undoable() {
      let record = RevertRecord {
        transform: tr.transform().clone(),
        from:      input.from,
        to:        input.to,
        text:      input.text.into(),
      };
      tr.set_rule_applied(RuleApplication { key, record });
    }

    debug!(
      rule = index,
      pattern = rule.pattern(),
      start,
      end = input.to,
      "input rule applied"
    );
    return Some(tr);
  }

  None
}
