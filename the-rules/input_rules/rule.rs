use std::{
  fmt,
  ops::Range,
  sync::Arc,
};

use regex_automata::meta::{
  BuildError,
  Regex,
};
use smallvec::SmallVec;
use thiserror::Error;

use super::substitute;
use crate::{
  Tendril,
  state::EditorState,
  transaction::Transaction,
};

pub type Result<T> = std::result::Result<T, RuleError>;

#[derive(Debug, Error)]
pub enum RuleError {
  #[error("invalid input rule pattern {pattern:?}: {source}")]
  Pattern {
    pattern: String,
    #[source]
    source:  Box<BuildError>,
  },
}

/// Computes the transaction for a match.
///
/// Called with the state, the match, and the `[start, end)` document range
/// the match covers. Returning `None` declines the match and lets the next
/// rule try.
pub type Handler =
  Arc<dyn Fn(&EditorState, &RuleMatch<'_>, usize, usize) -> Option<Transaction> + Send + Sync>;

#[derive(Clone)]
pub enum Action {
  /// Replace the match with literal text, see [`substitute`].
  Replace(Tendril),
  Handler(Handler),
}

impl Action {
  pub fn apply(
    &self,
    state: &EditorState,
    matched: &RuleMatch<'_>,
    start: usize,
    end: usize,
  ) -> Option<Transaction> {
    match self {
      Action::Replace(text) => substitute::replace(state, matched, text, start, end),
      Action::Handler(handler) => handler(state, matched, start, end),
    }
  }
}

impl fmt::Debug for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Action::Replace(text) => f.debug_tuple("Replace").field(text).finish(),
      Action::Handler(_) => f.write_str("Handler(..)"),
    }
  }
}

/// A pattern and what to do when it matches the text before the caret.
#[derive(Debug, Clone)]
pub struct Rule {
  pattern:  Tendril,
  regex:    Regex,
  action:   Action,
  undoable: bool,
}

impl Rule {
  pub fn new(pattern: &str, action: Action) -> Result<Self> {
    let regex = Regex::builder()
      .build(pattern)
      .map_err(|source| RuleError::Pattern {
        pattern: pattern.to_string(),
        source:  Box::new(source),
      })?;

    Ok(Self {
      pattern: pattern.into(),
      regex,
      action,
      undoable: true,
    })
  }

  /// A rule replacing its match with `text`.
  pub fn replace(pattern: &str, text: &str) -> Result<Self> {
    Self::new(pattern, Action::Replace(text.into()))
  }

  pub fn handler<F>(pattern: &str, handler: F) -> Result<Self>
  where
    F: Fn(&EditorState, &RuleMatch<'_>, usize, usize) -> Option<Transaction> + Send + Sync + 'static,
  {
    Self::new(pattern, Action::Handler(Arc::new(handler)))
  }

  /// Whether an applied match can be reverted with
  /// [`undo_input_rule`](super::undo_input_rule). Defaults to `true`.
  pub fn undoable(mut self, undoable: bool) -> Self {
    self.undoable = undoable;
    self
  }

  pub fn is_undoable(&self) -> bool {
    self.undoable
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  pub fn action(&self) -> &Action {
    &self.action
  }

  /// Leftmost-first search of `subject`.
  pub fn find<'a>(&self, subject: &'a str) -> Option<RuleMatch<'a>> {
    let mut captures = self.regex.create_captures();
    self.regex.captures(subject, &mut captures);
    if !captures.is_match() {
      return None;
    }

    let groups = (0..captures.group_len())
      .map(|index| captures.get_group(index).map(|span| span.range()))
      .collect();
    Some(RuleMatch { subject, groups })
  }
}

/// A successful match of a rule against the text window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<'a> {
  subject: &'a str,
  /// Byte ranges into `subject`, group 0 is the whole match.
  groups:  SmallVec<[Option<Range<usize>>; 4]>,
}

impl<'a> RuleMatch<'a> {
  /// The whole matched text.
  pub fn as_str(&self) -> &'a str {
    self.get(0).unwrap_or_default()
  }

  /// Text of capture group `index`, `None` if it did not participate.
  pub fn get(&self, index: usize) -> Option<&'a str> {
    let range = self.groups.get(index)?.clone()?;
    self.subject.get(range)
  }

  /// Number of groups, including the implicit whole-match group.
  pub fn len(&self) -> usize {
    self.groups.len()
  }

  pub fn is_empty(&self) -> bool {
    self.as_str().is_empty()
  }

  /// The first capture group that participated with non-empty text.
  pub fn first_capture(&self) -> Option<&'a str> {
    (1..self.groups.len())
      .filter_map(|index| self.get(index))
      .find(|group| !group.is_empty())
  }
}
