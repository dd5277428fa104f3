//! Invertible document edits.
//!
//! A [`Transform`] is a list of [`Step`]s together with the document snapshot
//! each step was applied to. Keeping the snapshots is what makes inversion
//! exact: a replace step only knows how many characters it removed, the
//! snapshot knows which ones and how they were formatted.
//!
//! ```ignore
//! let doc = Document::from("a--");
//! let mut transform = Transform::new(doc.clone());
//! transform.replace(1, 3, "—")?;
//!
//! let undo = transform.invert()?;
//! assert_eq!(undo.doc(), &doc);
//! ```

use std::mem;

use crate::{
  Tendril,
  document::{
    Document,
    Mark,
    MarkSpan,
  },
  transaction::{
    Assoc,
    ChangeSet,
    Result,
  },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  /// Replace text. `marks` are added afterwards, in the coordinates of the
  /// resulting document.
  Replace {
    changes: ChangeSet,
    marks:   Vec<MarkSpan>,
  },
  AddMark(MarkSpan),
  /// Reset the marks of `[from, to)` to exactly `marks`.
  ReplaceMarks {
    from:  usize,
    to:    usize,
    marks: Vec<MarkSpan>,
  },
}

impl Step {
  pub fn apply(&self, doc: &Document) -> Result<Document> {
    match self {
      Step::Replace { changes, marks } => {
        let mut next = doc.apply_changes(changes)?;
        for span in marks {
          next.add_mark(span.clone())?;
        }
        Ok(next)
      },
      Step::AddMark(span) => {
        let mut next = doc.clone();
        next.add_mark(span.clone())?;
        Ok(next)
      },
      Step::ReplaceMarks { from, to, marks } => {
        let mut next = doc.clone();
        next.clear_marks(*from, *to)?;
        for span in marks {
          next.add_mark(span.clone())?;
        }
        Ok(next)
      },
    }
  }

  /// The step that undoes this one. `before` is the document this step was
  /// applied to.
  pub fn invert(&self, before: &Document) -> Result<Step> {
    match self {
      Step::Replace { changes, .. } => {
        let inverted = changes.invert(before.text())?;
        // Deleted ranges are expressed in `before` coordinates, which are also
        // the coordinates of the document the inverted step produces.
        let marks = changes
          .deleted_ranges()
          .flat_map(|(from, to)| before.marks_in(from, to))
          .collect();
        Ok(Step::Replace {
          changes: inverted,
          marks,
        })
      },
      Step::AddMark(MarkSpan { from, to, .. }) | Step::ReplaceMarks { from, to, .. } => {
        Ok(Step::ReplaceMarks {
          from:  *from,
          to:    *to,
          marks: before.marks_in(*from, *to),
        })
      },
    }
  }

  pub fn changes(&self) -> Option<&ChangeSet> {
    match self {
      Step::Replace { changes, .. } => Some(changes),
      _ => None,
    }
  }

  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    match self.changes() {
      Some(changes) => changes.map_pos(pos, assoc),
      None => Ok(pos),
    }
  }
}

#[derive(Debug, Clone)]
pub struct Transform {
  /// Document before each step, `docs[i]` is the input of `steps[i]`.
  docs:  Vec<Document>,
  steps: Vec<Step>,
  doc:   Document,
}

impl Transform {
  pub fn new(doc: Document) -> Self {
    Self {
      docs: Vec::new(),
      steps: Vec::new(),
      doc,
    }
  }

  /// The current document, after all steps.
  pub fn doc(&self) -> &Document {
    &self.doc
  }

  /// The document the transform started from.
  pub fn before(&self) -> &Document {
    self.docs.first().unwrap_or(&self.doc)
  }

  pub fn steps(&self) -> &[Step] {
    &self.steps
  }

  pub fn docs(&self) -> &[Document] {
    &self.docs
  }

  pub fn doc_changed(&self) -> bool {
    !self.steps.is_empty()
  }

  /// Apply `step` to the current document and record it.
  pub fn step(&mut self, step: Step) -> Result<&mut Self> {
    let next = step.apply(&self.doc)?;
    self.docs.push(mem::replace(&mut self.doc, next));
    self.steps.push(step);
    Ok(self)
  }

  /// Replace `[from, to)` with unformatted `text`.
  pub fn replace(&mut self, from: usize, to: usize, text: &str) -> Result<&mut Self> {
    self.replace_with_marks(from, to, text, [])
  }

  /// Replace `[from, to)` with `text` carrying the given inline marks.
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
    if from == to && text.is_empty() {
      return Ok(self);
    }

    let fragment = (!text.is_empty()).then(|| Tendril::from(text));
    let changes = ChangeSet::change(self.doc.text(), [(from, to, fragment)])?;
    let end = from + text.chars().count();
    let marks = marks
      .into_iter()
      .filter(|mark| mark.is_inline() && from < end)
      .map(|mark| MarkSpan::new(from, end, mark))
      .collect();

    self.step(Step::Replace { changes, marks })
  }

  /// Replace `[from, to)` with `text` formatted like text typed at `from`.
  pub fn insert_text(&mut self, from: usize, to: usize, text: &str) -> Result<&mut Self> {
    let marks = self.doc.marks_at(from);
    self.replace_with_marks(from, to, text, marks)
  }

  pub fn delete(&mut self, from: usize, to: usize) -> Result<&mut Self> {
    self.replace(from, to, "")
  }

  pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> Result<&mut Self> {
    self.step(Step::AddMark(MarkSpan::new(from, to, mark)))
  }

  /// Map a position in [`Transform::before`] through every step.
  pub fn map_pos(&self, pos: usize, assoc: Assoc) -> Result<usize> {
    self
      .steps
      .iter()
      .try_fold(pos, |pos, step| step.map_pos(pos, assoc))
  }

  /// A transform, starting at [`Transform::doc`], that undoes every step of
  /// this one in reverse order.
  pub fn invert(&self) -> Result<Transform> {
    let mut inverted = Transform::new(self.doc.clone());
    for (step, before) in self.steps.iter().zip(&self.docs).rev() {
      inverted.step(step.invert(before)?)?;
    }
    Ok(inverted)
  }
}

#[cfg(test)]
mod test {
  use quickcheck::{
    TestResult,
    quickcheck,
  };

  use super::*;
  use crate::transaction::TransactionError;

  fn strong_doc() -> Document {
    Document::from("say **hi** there")
      .with_mark(4, 10, Mark::Strong)
      .unwrap()
  }

  #[test]
  fn records_snapshots() {
    let doc = Document::from("a--");
    let mut transform = Transform::new(doc.clone());
    assert!(!transform.doc_changed());
    assert_eq!(transform.before(), &doc);

    transform.replace(1, 3, "—").unwrap().replace(0, 0, ">").unwrap();
    assert_eq!(transform.doc().to_string(), ">a—");
    assert_eq!(transform.steps().len(), 2);
    assert_eq!(transform.docs()[0], doc);
    assert_eq!(transform.docs()[1].to_string(), "a—");
    assert_eq!(transform.before(), &doc);
  }

  #[test]
  fn empty_replace_is_not_a_step() {
    let mut transform = Transform::new(Document::from("abc"));
    transform.replace(2, 2, "").unwrap();
    assert!(!transform.doc_changed());
  }

  #[test]
  fn insert_text_inherits_marks() {
    let mut transform = Transform::new(strong_doc());
    transform.insert_text(10, 10, "!").unwrap();
    assert_eq!(transform.doc().to_string(), "say **hi**! there");
    assert_eq!(transform.doc().marks(), &[MarkSpan::new(4, 11, Mark::Strong)]);

    let mut transform = Transform::new(strong_doc());
    transform.replace(10, 10, "!").unwrap();
    assert_eq!(transform.doc().marks(), &[MarkSpan::new(4, 10, Mark::Strong)]);
  }

  #[test]
  fn invert_restores_text_and_marks() {
    let doc = strong_doc();
    let mut transform = Transform::new(doc.clone());
    transform
      .replace(4, 10, "hi")
      .unwrap()
      .add_mark(0, 3, Mark::Emphasis)
      .unwrap()
      .insert_text(6, 6, "!")
      .unwrap();
    assert_eq!(transform.doc().to_string(), "say hi! there");

    let undo = transform.invert().unwrap();
    assert_eq!(undo.steps().len(), 3);
    assert_eq!(undo.doc(), &doc);
  }

  #[test]
  fn replace_step_inverse_carries_deleted_marks() {
    let doc = strong_doc();
    let mut transform = Transform::new(doc.clone());
    transform.replace(3, 11, "-").unwrap();
    assert_eq!(transform.doc().to_string(), "say-there");
    assert!(transform.doc().marks().is_empty());

    let inverse = transform.steps()[0].invert(&transform.docs()[0]).unwrap();
    let Step::Replace { changes, marks } = &inverse else {
      panic!("expected a replace step, got {inverse:?}");
    };
    assert_eq!(changes.len(), 9);
    assert_eq!(changes.len_after(), 16);
    assert_eq!(marks, &[MarkSpan::new(4, 10, Mark::Strong)]);
    assert_eq!(inverse.apply(transform.doc()).unwrap(), doc);
  }

  #[test]
  fn map_pos_through_steps() {
    let mut transform = Transform::new(Document::from("abcdef"));
    transform
      .replace(1, 3, "X")
      .unwrap()
      .add_mark(0, 2, Mark::Code)
      .unwrap()
      .replace(0, 0, "__")
      .unwrap();
    assert_eq!(transform.doc().to_string(), "__aXdef");
    assert_eq!(transform.map_pos(4, Assoc::Before).unwrap(), 5);
    assert_eq!(transform.map_pos(0, Assoc::After).unwrap(), 2);
    assert_eq!(transform.map_pos(0, Assoc::Before).unwrap(), 0);
  }

  #[test]
  fn out_of_bounds_steps_fail_without_recording() {
    let mut transform = Transform::new(Document::from("abc"));
    let err = transform.replace(2, 7, "x").unwrap_err();
    assert_eq!(err, TransactionError::RangeOutOfBounds {
      from: 2,
      to:   7,
      len:  3,
    });
    assert!(!transform.doc_changed());
  }

  quickcheck! {
    fn invert_round_trips(text: String, from: usize, to: usize, insert: String) -> TestResult {
      let doc = Document::from(text.as_str());
      let len = doc.len_chars();
      if len == 0 {
        return TestResult::discard();
      }
      let (from, to) = (from % (len + 1), to % (len + 1));
      let (from, to) = (from.min(to), from.max(to));
      let doc = doc.with_mark(0, len, Mark::Emphasis).unwrap();

      let mut transform = Transform::new(doc.clone());
      transform.insert_text(from, to, &insert).unwrap();
      let undo = transform.invert().unwrap();
      TestResult::from_bool(undo.doc() == &doc)
    }
  }
}
