//! Cursor positions and selections.
//!
//! A [`Range`] has two positions: `anchor` and `head`. The `head` is where the
//! cursor appears, the `anchor` is the other end. When `anchor == head`, the
//! range is a point.
//!
//! ```text
//! anchor=2, head=7: "he[llo w]orld"  (forward selection)
//! anchor=7, head=2: "he]llo w[orld"  (backward selection)
//! anchor=5, head=5: "hello|world"    (point/cursor)
//! ```
//!
//! A [`Selection`] holds one or more ranges, sorted with overlaps merged.
//! Input rules only fire while the selection is a single point, see
//! [`Selection::caret`].

use smallvec::{
  SmallVec,
  smallvec,
};
use thiserror::Error;

use crate::{
  transaction::{
    self,
    Assoc,
  },
  transform::Transform,
};

pub type Result<T> = std::result::Result<T, SelectionError>;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
  #[error("selection must contain at least one range")]
  EmptySelection,
  #[error("selection position {pos} is out of bounds for document length {len}")]
  OutOfBounds { pos: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
  pub anchor: usize,
  pub head:   usize,
}

impl Range {
  pub fn new(anchor: usize, head: usize) -> Self {
    Self { anchor, head }
  }

  #[inline]
  pub fn point(head: usize) -> Self {
    Self::new(head, head)
  }

  /// Start of the range
  #[inline]
  #[must_use]
  pub fn from(&self) -> usize {
    std::cmp::min(self.anchor, self.head)
  }

  /// End of the range
  #[inline]
  #[must_use]
  pub fn to(&self) -> usize {
    std::cmp::max(self.anchor, self.head)
  }

  #[inline]
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.anchor == self.head
  }

  pub fn overlaps(&self, other: &Self) -> bool {
    // touching ranges only merge when one of them is a point
    self.from() == other.from() || (self.to() > other.from() && other.to() > self.from())
  }

  /// Returns a `Range` that encompasses both input ranges.
  pub fn merge(&self, other: Self) -> Self {
    if self.anchor > self.head && other.anchor > other.head {
      Self::new(self.anchor.max(other.anchor), self.head.min(other.head))
    } else {
      Self::new(self.from().min(other.from()), self.to().max(other.to()))
    }
  }

  /// Map the range through every step of `transform`.
  ///
  /// A point follows typed text. The edges of a non-empty range stick to the
  /// inside, so text inserted at either edge stays outside of it.
  pub fn map(self, transform: &Transform) -> transaction::Result<Self> {
    use std::cmp::Ordering;

    let (anchor_assoc, head_assoc) = match self.anchor.cmp(&self.head) {
      Ordering::Equal => (Assoc::After, Assoc::After),
      Ordering::Less => (Assoc::After, Assoc::Before),
      Ordering::Greater => (Assoc::Before, Assoc::After),
    };

    Ok(Self::new(
      transform.map_pos(self.anchor, anchor_assoc)?,
      transform.map_pos(self.head, head_assoc)?,
    ))
  }
}

/// A selection is one or more ranges.
/// INVARIANT: A selection can never be empty (always contain at least one
/// range).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
  ranges: SmallVec<[Range; 1]>,
}

impl Selection {
  pub fn new(ranges: SmallVec<[Range; 1]>) -> Result<Self> {
    if ranges.is_empty() {
      return Err(SelectionError::EmptySelection);
    }
    Ok(Self { ranges }.normalize())
  }

  pub fn point(pos: usize) -> Self {
    Self {
      ranges: smallvec![Range::point(pos)],
    }
  }

  #[must_use]
  /// Constructs a selection holding a single range.
  pub fn single(anchor: usize, head: usize) -> Self {
    Self {
      ranges: smallvec![Range::new(anchor, head)],
    }
  }

  pub fn ranges(&self) -> &[Range] {
    &self.ranges
  }

  /// The first range. Selections are never empty.
  pub fn primary(&self) -> Range {
    self.ranges[0]
  }

  pub fn len(&self) -> usize {
    self.ranges.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ranges.iter().all(Range::is_empty)
  }

  /// The caret position when the selection is a single point.
  pub fn caret(&self) -> Option<usize> {
    match self.ranges.as_slice() {
      [range] if range.is_empty() => Some(range.head),
      _ => None,
    }
  }

  /// Check that every range fits a document of `len` characters.
  pub fn ensure_within(&self, len: usize) -> Result<()> {
    match self.ranges.iter().find(|range| range.to() > len) {
      Some(range) => Err(SelectionError::OutOfBounds {
        pos: range.to(),
        len,
      }),
      None => Ok(()),
    }
  }

  /// Map every range through `transform`.
  pub fn map(&self, transform: &Transform) -> transaction::Result<Self> {
    if !transform.doc_changed() {
      return Ok(self.clone());
    }
    let ranges = self
      .ranges
      .iter()
      .map(|range| range.map(transform))
      .collect::<transaction::Result<_>>()?;
    Ok(Self { ranges }.normalize())
  }

  /// Ranges are sorted by [Range::from] with overlapping ranges merged.
  fn normalize(mut self) -> Self {
    if self.ranges.len() < 2 {
      return self;
    }
    self.ranges.sort_by_key(Range::from);

    let mut ranges: SmallVec<[Range; 1]> = SmallVec::with_capacity(self.ranges.len());
    for range in self.ranges {
      if let Some(prev) = ranges.last_mut() {
        if prev.overlaps(&range) {
          *prev = prev.merge(range);
          continue;
        }
      }
      ranges.push(range);
    }

    self.ranges = ranges;
    self
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::document::{
    Document,
    Mark,
  };

  #[test]
  fn caret_only_for_single_points() {
    assert_eq!(Selection::point(3).caret(), Some(3));
    assert_eq!(Selection::single(1, 3).caret(), None);

    let multi = Selection::new(smallvec![Range::point(1), Range::point(4)]).unwrap();
    assert_eq!(multi.len(), 2);
    assert_eq!(multi.caret(), None);
    assert!(multi.is_empty());
  }

  #[test]
  fn new_normalizes() {
    assert_eq!(
      Selection::new(SmallVec::new()),
      Err(SelectionError::EmptySelection)
    );

    let selection = Selection::new(smallvec![Range::new(5, 8), Range::new(0, 2), Range::new(6, 9)])
      .unwrap();
    assert_eq!(selection.ranges(), &[Range::new(0, 2), Range::new(5, 9)]);
  }

  #[test]
  fn ensure_within_bounds() {
    let selection = Selection::single(2, 7);
    assert!(selection.ensure_within(7).is_ok());
    assert_eq!(
      selection.ensure_within(5),
      Err(SelectionError::OutOfBounds { pos: 7, len: 5 })
    );
  }

  #[test]
  fn points_follow_typed_text() {
    let mut transform = Transform::new(Document::from("hello"));
    transform.replace(5, 5, " world").unwrap();

    let mapped = Selection::point(5).map(&transform).unwrap();
    assert_eq!(mapped.caret(), Some(11));
  }

  #[test]
  fn ranges_do_not_grow_at_their_edges() {
    let mut transform = Transform::new(Document::from("abcdef"));
    transform.replace(2, 2, "xx").unwrap().replace(6, 6, "yy").unwrap();
    assert_eq!(transform.doc().to_string(), "abxxcdyyef");

    let mapped = Selection::single(2, 4).map(&transform).unwrap();
    assert_eq!(mapped.primary(), Range::new(4, 6));

    let backward = Selection::single(4, 2).map(&transform).unwrap();
    assert_eq!(backward.primary(), Range::new(6, 4));
  }

  #[test]
  fn mark_steps_keep_selection() {
    let mut transform = Transform::new(Document::from("abc"));
    transform.add_mark(0, 2, Mark::Strong).unwrap();
    let selection = Selection::single(0, 3);
    assert_eq!(selection.map(&transform).unwrap(), selection);
  }
}
