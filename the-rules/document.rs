//! Text plus formatting.
//!
//! A [`Document`] is a rope of text and a sorted list of [`MarkSpan`]s. Text
//! blocks are lines: a block starts after a line ending and ends before the
//! next one. Block-level structure (code blocks, quotes, headings) is carried
//! as block marks spanning the text of a line, inline formatting as inline
//! marks. Embedded non-text content sits in the rope as
//! [`PLACEHOLDER`](the_core::chars::PLACEHOLDER) characters.
//!
//! Mark spans are kept sorted and merged, so two documents with the same text
//! and the same formatting compare equal.

use std::fmt;

use ropey::Rope;
use smallvec::SmallVec;
use the_core::chars::{
  char_is_line_ending,
  push_normalized,
};

use crate::{
  Tendril,
  transaction::{
    Assoc,
    ChangeSet,
    Result,
    validate_change_bounds,
  },
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Mark {
  Strong,
  Emphasis,
  Code,
  Link { href: Tendril },
  CodeBlock,
  Blockquote,
  Heading(u8),
}

impl Mark {
  pub fn is_block(&self) -> bool {
    matches!(self, Mark::CodeBlock | Mark::Blockquote | Mark::Heading(_))
  }

  pub fn is_inline(&self) -> bool {
    !self.is_block()
  }

  /// Content inside the mark is taken verbatim: no input rules apply there.
  pub fn is_verbatim(&self) -> bool {
    matches!(self, Mark::CodeBlock)
  }

  /// Whether text typed right after the mark continues it.
  pub fn is_inclusive(&self) -> bool {
    !matches!(self, Mark::Link { .. })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkSpan {
  pub from: usize,
  pub to:   usize,
  pub mark: Mark,
}

impl MarkSpan {
  pub fn new(from: usize, to: usize, mark: Mark) -> Self {
    Self { from, to, mark }
  }

  fn overlaps(&self, from: usize, to: usize) -> bool {
    if self.from == self.to {
      return from <= self.from && self.from <= to;
    }
    self.from < to && from < self.to
  }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Document {
  text:  Rope,
  marks: Vec<MarkSpan>,
}

impl Document {
  pub fn new(text: Rope) -> Self {
    Self {
      text,
      marks: Vec::new(),
    }
  }

  /// Builder-style [`Document::add_mark`].
  pub fn with_mark(mut self, from: usize, to: usize, mark: Mark) -> Result<Self> {
    self.add_mark(MarkSpan::new(from, to, mark))?;
    Ok(self)
  }

  pub fn text(&self) -> &Rope {
    &self.text
  }

  pub fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  pub fn marks(&self) -> &[MarkSpan] {
    &self.marks
  }

  /// The `[start, end)` range of the text block containing `pos`, without its
  /// line ending.
  pub fn block_range(&self, pos: usize) -> (usize, usize) {
    let pos = pos.min(self.text.len_chars());
    let line = self.text.char_to_line(pos);
    let start = self.text.line_to_char(line);
    let slice = self.text.line(line);
    let ending = slice
      .chars_at(slice.len_chars())
      .reversed()
      .take_while(|&ch| char_is_line_ending(ch))
      .count();
    (start, start + slice.len_chars() - ending)
  }

  /// Text in `[from, to)` with every non-text character replaced by
  /// `placeholder`.
  pub fn text_between(&self, from: usize, to: usize, placeholder: char) -> String {
    let len = self.text.len_chars();
    let to = to.min(len);
    let from = from.min(to);
    let mut out = String::with_capacity(to - from);
    push_normalized(&mut out, self.text.slice(from..to).chars(), placeholder);
    out
  }

  /// Inline marks that text inserted at `pos` picks up: those of the
  /// character before `pos`, or of the character after it at the start of a
  /// block.
  pub fn marks_at(&self, pos: usize) -> SmallVec<[Mark; 2]> {
    let (block_start, _) = self.block_range(pos);
    let inline = self.marks.iter().filter(|span| span.mark.is_inline());

    if pos > block_start {
      inline
        .filter(|span| {
          span.from < pos && (pos < span.to || (pos == span.to && span.mark.is_inclusive()))
        })
        .map(|span| span.mark.clone())
        .collect()
    } else {
      inline
        .filter(|span| span.from <= pos && pos < span.to)
        .map(|span| span.mark.clone())
        .collect()
    }
  }

  /// Whether `pos` lies inside a verbatim (code) block.
  pub fn in_verbatim(&self, pos: usize) -> bool {
    self
      .marks
      .iter()
      .any(|span| span.mark.is_verbatim() && span.from <= pos && pos <= span.to)
  }

  /// Mark spans clipped to `[from, to)`.
  pub fn marks_in(&self, from: usize, to: usize) -> Vec<MarkSpan> {
    self
      .marks
      .iter()
      .filter(|span| span.overlaps(from, to))
      .map(|span| MarkSpan::new(span.from.max(from), span.to.min(to), span.mark.clone()))
      .collect()
  }

  /// Add a mark over `span`, merging it with touching spans of the same mark.
  /// Empty inline spans are ignored.
  pub fn add_mark(&mut self, span: MarkSpan) -> Result<()> {
    validate_change_bounds(span.from, span.to, self.len_chars())?;
    if span.from == span.to && span.mark.is_inline() {
      return Ok(());
    }
    self.marks.push(span);
    self.normalize();
    Ok(())
  }

  /// Remove every mark from `[from, to)`, splitting spans that straddle the
  /// range.
  pub fn clear_marks(&mut self, from: usize, to: usize) -> Result<()> {
    validate_change_bounds(from, to, self.len_chars())?;
    if from == to {
      return Ok(());
    }

    let mut kept = Vec::with_capacity(self.marks.len());
    for span in self.marks.drain(..) {
      if !span.overlaps(from, to) {
        kept.push(span);
        continue;
      }
      if span.from < from {
        kept.push(MarkSpan::new(span.from, from, span.mark.clone()));
      }
      if to < span.to {
        kept.push(MarkSpan::new(to, span.to, span.mark));
      }
    }
    self.marks = kept;
    self.normalize();
    Ok(())
  }

  /// Apply `changes` to the text and map every mark span through them.
  ///
  /// Block marks grow with text typed at either edge; inline marks do not
  /// (typed text gets its marks explicitly, see [`Document::marks_at`]).
  pub fn apply_changes(&self, changes: &ChangeSet) -> Result<Document> {
    let text = changes.apply_to(&self.text)?;
    let mut marks = Vec::with_capacity(self.marks.len());

    for span in &self.marks {
      let (start_assoc, end_assoc) = if span.mark.is_block() {
        (Assoc::Before, Assoc::After)
      } else {
        (Assoc::After, Assoc::Before)
      };
      let from = changes.map_pos(span.from, start_assoc)?;
      let to = changes.map_pos(span.to, end_assoc)?.max(from);
      if from == to && span.mark.is_inline() {
        continue;
      }
      marks.push(MarkSpan::new(from, to, span.mark.clone()));
    }

    let mut doc = Document { text, marks };
    doc.normalize();
    Ok(doc)
  }

  fn normalize(&mut self) {
    self.marks.sort();

    let mut merged: Vec<MarkSpan> = Vec::with_capacity(self.marks.len());
    for span in self.marks.drain(..) {
      let touching = merged
        .iter_mut()
        .rev()
        .find(|prev| prev.mark == span.mark && span.from <= prev.to);
      match touching {
        Some(prev) => prev.to = prev.to.max(span.to),
        None => merged.push(span),
      }
    }
    merged.sort();
    self.marks = merged;
  }
}

impl From<&str> for Document {
  fn from(text: &str) -> Self {
    Self::new(Rope::from_str(text))
  }
}

impl From<Rope> for Document {
  fn from(text: Rope) -> Self {
    Self::new(text)
  }
}

impl fmt::Display for Document {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for chunk in self.text.chunks() {
      f.write_str(chunk)?;
    }
    Ok(())
  }
}
