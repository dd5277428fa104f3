//! Work that runs once the current event has settled.
//!
//! Handlers that need to observe the document after an event has been fully
//! applied push a task here instead of acting inline. The owner drains the
//! queue when the event is done, see
//! [`EditorView::settle`](crate::view::EditorView::settle).

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct Deferred<T> {
  tasks: VecDeque<T>,
}

impl<T> Default for Deferred<T> {
  fn default() -> Self {
    Self {
      tasks: VecDeque::new(),
    }
  }
}

impl<T> Deferred<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Queue `task` behind every task already waiting.
  pub fn defer(&mut self, task: T) {
    self.tasks.push_back(task);
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }

  /// Take every queued task in order. Tasks deferred while the returned batch
  /// runs wait for the next call.
  pub fn take(&mut self) -> VecDeque<T> {
    std::mem::take(&mut self.tasks)
  }
}
