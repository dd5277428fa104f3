//! Input rules: patterns matched against the text before the caret while
//! typing.
//!
//! An [`InputRules`] engine is installed as a
//! [`Plugin::InputRules`](crate::state::Plugin::InputRules). On every text
//! insertion the view calls [`try_rules`] with the text about to be inserted.
//! The first rule whose pattern matches the window (up to
//! [`MAX_MATCH`] characters of the current block before the insertion point,
//! followed by the inserted text) and whose action produces a transaction
//! wins, and the default insertion is skipped.
//!
//! Applied rules are remembered by the engine until the next unrelated change,
//! so [`undo_input_rule`] can put back the text that was typed.
//!
//! ```ignore
//! let rules = InputRules::new(vec![
//!   Rule::replace("--$", "—")?,
//!   Rule::replace(r"\.\.\.$", "…")?,
//! ]);
//! let state = EditorState::new(doc, selection, vec![Plugin::input_rules(rules)])?;
//! ```

mod revert;
mod rule;
mod runner;
mod substitute;

use std::slice;

pub use revert::{
  RevertRecord,
  RuleApplication,
  revert,
  undo_input_rule,
};
pub(crate) use revert::next_record;
pub use rule::{
  Action,
  Handler,
  Rule,
  RuleError,
  RuleMatch,
};
pub use runner::{
  TextInput,
  try_rules,
};
pub use substitute::{
  Substitution,
  substitute,
};

/// Default number of characters before the insertion point that rules see.
pub const MAX_MATCH: usize = 500;

/// An ordered, fixed set of rules. Earlier rules take priority.
#[derive(Debug, Clone)]
pub struct InputRules {
  rules:     Vec<Rule>,
  max_match: usize,
}

impl Default for InputRules {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

impl InputRules {
  pub fn new(rules: Vec<Rule>) -> Self {
    Self {
      rules,
      max_match: MAX_MATCH,
    }
  }

  /// Change the window size.
  pub fn with_max_match(mut self, max_match: usize) -> Self {
    self.max_match = max_match;
    self
  }

  pub fn max_match(&self) -> usize {
    self.max_match
  }

  pub fn iter(&self) -> slice::Iter<'_, Rule> {
    self.rules.iter()
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

impl<'a> IntoIterator for &'a InputRules {
  type Item = &'a Rule;
  type IntoIter = slice::Iter<'a, Rule>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}
