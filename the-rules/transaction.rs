//! Change sets and the transactions that carry them into an editor state.
//!
//! A [`ChangeSet`] is a sorted list of non-overlapping [`Replacement`]s, all
//! expressed in the coordinates of the document it was built for. It refuses
//! to apply to a document of any other length, and it can be inverted against
//! that document, which is what step inversion in [`crate::transform`] relies
//! on.
//!
//! A [`Transaction`] wraps a [`Transform`] (one or more steps) together with an
//! optional explicit selection and typed [`Meta`]data. Plugins inspect the
//! metadata when the transaction is applied to an
//! [`EditorState`](crate::state::EditorState).
//!
//! ```ignore
//! use the_rules::{document::Document, transaction::Transaction};
//!
//! let doc = Document::from("hello world");
//! let mut tr = Transaction::new(&doc);
//! tr.replace(6, 11, "rust")?;
//! assert_eq!(tr.doc().to_string(), "hello rust");
//! ```

use ropey::Rope;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
  Tendril,
  document::{
    Document,
    Mark,
  },
  input_rules::RuleApplication,
  selection::Selection,
  transform::{
    Step,
    Transform,
  },
};

pub type Result<T> = std::result::Result<T, TransactionError>;

/// (from, to) replacement.
pub type Change = (usize, usize, Option<Tendril>);

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransactionError {
  #[error("changeset length mismatch: expected {expected}, got {actual}")]
  LengthMismatch { expected: usize, actual: usize },
  #[error("invalid change range: start {from} is after end {to}")]
  InvalidRange { from: usize, to: usize },
  #[error("change range {from}..{to} is out of bounds for document length {len}")]
  RangeOutOfBounds {
    from: usize,
    to:   usize,
    len:  usize,
  },
  #[error("change range {from}..{to} overlaps previous end {prev_end}")]
  OverlappingRange {
    prev_end: usize,
    from:     usize,
    to:       usize,
  },
  #[error("position {pos} is out of bounds for changeset length {len}")]
  PositionOutOfBounds { pos: usize, len: usize },
}

/// Which side of an insertion a mapped position sticks to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
  Before,
  After,
}

/// `[from, to)` of the original document becomes `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
  pub from: usize,
  pub to:   usize,
  pub text: Tendril,
}

impl Replacement {
  fn inserted(&self) -> usize {
    self.text.chars().count()
  }

  fn deleted(&self) -> usize {
    self.to - self.from
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChangeSet {
  replacements: SmallVec<[Replacement; 1]>,
  len:          usize,
  len_after:    usize,
}

impl ChangeSet {
  /// Build a changeset from sorted, non-overlapping `(from, to, text)`
  /// replacements against `doc`. Empty replacements are dropped.
  pub fn change<I>(doc: &Rope, changes: I) -> Result<Self>
  where
    I: IntoIterator<Item = Change>,
  {
    let len = doc.len_chars();
    let mut changeset = Self {
      replacements: SmallVec::new(),
      len,
      len_after: len,
    };

    let mut last = 0;
    for (from, to, text) in changes {
      validate_change_bounds(from, to, len)?;
      if from < last {
        return Err(TransactionError::OverlappingRange {
          prev_end: last,
          from,
          to,
        });
      }
      last = to;

      let replacement = Replacement {
        from,
        to,
        text: text.unwrap_or_default(),
      };
      if replacement.deleted() == 0 && replacement.text.is_empty() {
        continue;
      }
      changeset.len_after = changeset.len_after - replacement.deleted() + replacement.inserted();
      changeset.replacements.push(replacement);
    }

    Ok(changeset)
  }

  pub fn replacements(&self) -> &[Replacement] {
    &self.replacements
  }

  /// Document length this changeset applies to.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn len_after(&self) -> usize {
    self.len_after
  }

  pub fn is_empty(&self) -> bool {
    self.replacements.is_empty()
  }

  /// Ranges of the original document removed by this changeset.
  pub fn deleted_ranges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
    self
      .replacements
      .iter()
      .filter(|replacement| replacement.from < replacement.to)
      .map(|replacement| (replacement.from, replacement.to))
  }

  fn ensure_len(&self, text_len: usize) -> Result<()> {
    if text_len != self.len {
      return Err(TransactionError::LengthMismatch {
        expected: self.len,
        actual:   text_len,
      });
    }
    Ok(())
  }

  /// The changeset that restores `original` from the result of this one.
  pub fn invert(&self, original: &Rope) -> Result<Self> {
    self.ensure_len(original.len_chars())?;

    let mut inserted = 0;
    let mut deleted = 0;
    let replacements = self
      .replacements
      .iter()
      .map(|replacement| {
        let from = replacement.from + inserted - deleted;
        inserted += replacement.inserted();
        deleted += replacement.deleted();
        Replacement {
          from,
          to: from + replacement.inserted(),
          text: String::from(original.slice(replacement.from..replacement.to)).into(),
        }
      })
      .collect();

    Ok(Self {
      replacements,
      len: self.len_after,
      len_after: self.len,
    })
  }

  /// The rope after this changeset. `text` is left untouched.
  pub fn apply_to(&self, text: &Rope) -> Result<Rope> {
    self.ensure_len(text.len_chars())?;

    // back to front, so earlier positions stay valid
    let mut next = text.clone();
    for replacement in self.replacements.iter().rev() {
      next.remove(replacement.from..replacement.to);
      next.insert(replacement.from, &replacement.text);
    }
    Ok(next)
  }

  /// Map a position through the changes.
  ///
  /// A position at an insertion point follows `assoc`. A position at the start
  /// of a replacement stays at its start; one inside the replaced range ends
  /// up at the start of the new text, or past it with [`Assoc::After`].
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    if pos > self.len {
      return Err(TransactionError::PositionOutOfBounds { pos, len: self.len });
    }

    let mut inserted = 0;
    let mut deleted = 0;
    for replacement in &self.replacements {
      if pos < replacement.from {
        break;
      }

      let start = replacement.from + inserted - deleted;
      let past = start + replacement.inserted();
      let pure_insert = replacement.deleted() == 0;
      if pos == replacement.from && !pure_insert {
        return Ok(start);
      }
      if pos == replacement.from || pos < replacement.to {
        return Ok(match assoc {
          Assoc::Before => start,
          Assoc::After => past,
        });
      }

      inserted += replacement.inserted();
      deleted += replacement.deleted();
    }

    Ok(pos + inserted - deleted)
  }
}

pub(crate) fn validate_change_bounds(from: usize, to: usize, len: usize) -> Result<()> {
  if from > to {
    return Err(TransactionError::InvalidRange { from, to });
  }
  if to > len {
    return Err(TransactionError::RangeOutOfBounds { from, to, len });
  }
  Ok(())
}

/// Typed side information carried by a transaction.
#[derive(Debug, Clone)]
pub struct Meta {
  /// Set when the transaction was produced by an input rule.
  pub rule_applied:   Option<RuleApplication>,
  /// Whether the history plugin should record this transaction.
  pub add_to_history: bool,
  /// Set on the transactions built by [`History::undo`](crate::history::History::undo).
  pub undo:           bool,
}

impl Default for Meta {
  fn default() -> Self {
    Self {
      rule_applied:   None,
      add_to_history: true,
      undo:           false,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Transaction {
  transform: Transform,
  selection: Option<Selection>,
  meta:      Meta,
  /// Generation of the editor state the transaction was started from.
  origin:    Option<u64>,
}

impl From<Transform> for Transaction {
  fn from(transform: Transform) -> Self {
    Self {
      transform,
      selection: None,
      meta: Meta::default(),
      origin: None,
    }
  }
}

impl Transaction {
  pub fn new(doc: &Document) -> Self {
    Self::from(Transform::new(doc.clone()))
  }

  pub fn transform(&self) -> &Transform {
    &self.transform
  }

  /// The document before any step of this transaction.
  pub fn before(&self) -> &Document {
    self.transform.before()
  }

  /// The document after all steps of this transaction.
  pub fn doc(&self) -> &Document {
    self.transform.doc()
  }

  pub fn doc_changed(&self) -> bool {
    self.transform.doc_changed()
  }

  pub fn step(&mut self, step: Step) -> Result<&mut Self> {
    self.transform.step(step)?;
    Ok(self)
  }

  pub fn replace(&mut self, from: usize, to: usize, text: &str) -> Result<&mut Self> {
    self.transform.replace(from, to, text)?;
    Ok(self)
  }

  pub fn insert_text(&mut self, from: usize, to: usize, text: &str) -> Result<&mut Self> {
    self.transform.insert_text(from, to, text)?;
    Ok(self)
  }

  pub fn replace_with_marks<I>(
    &mut self,
    from: usize,
    to: usize,
    text: &str,
    marks: I,
  ) -> Result<&mut Self>
  where
    I: IntoIterator<Item = Mark>,
  {
    self.transform.replace_with_marks(from, to, text, marks)?;
    Ok(self)
  }

  pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self> {
    self.transform.delete(from, to)?;
    Ok(self)
  }

  pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self> {
    self.transform.add_mark(from, to, mark)?;
    Ok(self)
  }

  /// When set, explicitly updates the selection.
  pub fn selection(&self) -> Option<&Selection> {
    self.selection.as_ref()
  }

  pub fn selection_set(&self) -> bool {
    self.selection.is_some()
  }

  pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
    self.selection = Some(selection);
    self
  }

  pub fn with_selection(mut self, selection: Selection) -> Self {
    self.selection = Some(selection);
    self
  }

  pub fn meta(&self) -> &Meta {
    &self.meta
  }

  pub fn rule_applied(&self) -> Option<&RuleApplication> {
    self.meta.rule_applied.as_ref()
  }

  pub fn set_rule_applied(&mut self, application: RuleApplication) -> &mut Self {
    self.meta.rule_applied = Some(application);
    self
  }

  pub fn add_to_history(&self) -> bool {
    self.meta.add_to_history
  }

  pub fn set_add_to_history(&mut self, add: bool) -> &mut Self {
    self.meta.add_to_history = add;
    self
  }

  pub fn is_undo(&self) -> bool {
    self.meta.undo
  }

  pub fn set_undo(&mut self, undo: bool) -> &mut Self {
    self.meta.undo = undo;
    self
  }

  pub fn origin(&self) -> Option<u64> {
    self.origin
  }

  /// Mark the transaction as started from the state with `generation`.
  pub(crate) fn with_origin(mut self, generation: u64) -> Self {
    self.origin = Some(generation);
    self
  }

  /// Map `selection` through every step of this transaction.
  pub fn map_selection(&self, selection: &Selection) -> Result<Selection> {
    selection.map(&self.transform)
  }
}
