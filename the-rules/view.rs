//! The event side of the editor: text input, composition and dispatch.
//!
//! [`EditorView`] owns the current [`EditorState`] and replaces it on every
//! dispatched transaction. Text input is offered to the input rules engines
//! first and falls back to a plain insertion.
//!
//! Composition (input method) events are tracked so that the intermediate
//! text of a composition never triggers rules. When a composition ends the
//! composed text is checked once, after the event has settled:
//!
//! ```ignore
//! view.composition_start();
//! view.type_text("e")?;              // rules are skipped
//! view.insert_text(3, 4, "é")?;      // still composing
//! view.composition_end();            // queues the check
//! view.settle()?;                    // rules see "café"
//! ```

use tracing::{
  debug,
  trace,
};

use crate::{
  commands::Command,
  input_rules::{
    TextInput,
    try_rules,
  },
  schedule::Deferred,
  state::{
    EditorState,
    PluginKey,
    Result,
  },
  transaction::Transaction,
};

/// Work queued until the current event settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
  /// Run the input rules engine `key` at the caret with no inserted text.
  CheckComposition(PluginKey),
}

#[derive(Debug)]
pub struct EditorView {
  state:     EditorState,
  composing: bool,
  deferred:  Deferred<Task>,
}

impl EditorView {
  pub fn new(state: EditorState) -> Self {
    Self {
      state,
      composing: false,
      deferred: Deferred::new(),
    }
  }

  pub fn state(&self) -> &EditorState {
    &self.state
  }

  pub fn is_composing(&self) -> bool {
    self.composing
  }

  /// Tasks waiting for [`EditorView::settle`].
  pub fn pending(&self) -> usize {
    self.deferred.len()
  }

  pub fn dispatch(&mut self, tr: Transaction) -> Result<()> {
    self.state = self.state.apply(&tr)?;
    Ok(())
  }

  /// Offer the insertion of `text` over `[from, to)` to the input rules
  /// engines. Returns `true` when one of them handled it; its transaction has
  /// been dispatched and the default insertion must not happen.
  pub fn handle_text_input(&mut self, from: usize, to: usize, text: &str) -> Result<bool> {
    let input = TextInput::new(from, to, text).composing(self.composing);
    let handled = self
      .state
      .input_rules()
      .find_map(|(key, rules, _)| try_rules(&self.state, key, rules, input));

    match handled {
      Some(tr) => {
        self.dispatch(tr)?;
        Ok(true)
      },
      None => Ok(false),
    }
  }

  /// Insert `text` over `[from, to)`: input rules first, a plain insertion
  /// carrying the surrounding marks otherwise. Returns whether a rule handled
  /// the input.
  pub fn insert_text(&mut self, from: usize, to: usize, text: &str) -> Result<bool> {
    if self.handle_text_input(from, to, text)? {
      return Ok(true);
    }

    let mut tr = self.state.tr();
    tr.insert_text(from, to, text)?;
    self.dispatch(tr)?;
    Ok(false)
  }

  /// Type `text` over the primary selection range.
  pub fn type_text(&mut self, text: &str) -> Result<bool> {
    let range = self.state.selection().primary();
    self.insert_text(range.from(), range.to(), text)
  }

  pub fn composition_start(&mut self) {
    trace!("composition start");
    self.composing = true;
  }

  /// End the composition. The composed text is checked against the input
  /// rules on the next [`EditorView::settle`].
  pub fn composition_end(&mut self) {
    trace!("composition end");
    self.composing = false;
    let keys: Vec<_> = self.state.input_rules().map(|(key, ..)| key).collect();
    for key in keys {
      self.deferred.defer(Task::CheckComposition(key));
    }
  }

  /// Run the tasks queued by the events handled so far. Returns whether any
  /// input rule fired.
  pub fn settle(&mut self) -> Result<bool> {
    let mut handled = false;
    for task in self.deferred.take() {
      match task {
        Task::CheckComposition(key) => handled |= self.check_composition(key)?,
      }
    }
    Ok(handled)
  }

  fn check_composition(&mut self, key: PluginKey) -> Result<bool> {
    let Some(caret) = self.state.selection().caret() else {
      trace!("composition check skipped, selection is not a caret");
      return Ok(false);
    };

    let input = TextInput::new(caret, caret, "").composing(self.composing);
    let handled = self
      .state
      .input_rules()
      .find(|(engine, ..)| *engine == key)
      .and_then(|(key, rules, _)| try_rules(&self.state, key, rules, input));

    match handled {
      Some(tr) => {
        debug!(caret, "input rule applied after composition");
        self.dispatch(tr)?;
        Ok(true)
      },
      None => Ok(false),
    }
  }

  /// Run `command` against the current state, dispatching what it produces.
  /// Returns whether the command applied.
  pub fn run<F>(&mut self, command: F) -> Result<bool>
  where
    F: FnOnce(&EditorState, Option<&mut dyn FnMut(Transaction)>) -> bool,
  {
    let mut produced = Vec::new();
    let applied = command(&self.state, Some(&mut |tr: Transaction| produced.push(tr)));
    for tr in produced {
      self.dispatch(tr)?;
    }
    Ok(applied)
  }

  /// Run the first of `commands` that applies.
  pub fn run_first(&mut self, commands: &[Command]) -> Result<bool> {
    self.run(|state, dispatch| crate::commands::first(commands, state, dispatch))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{
    commands::{
      undo,
      undo_input_rule,
    },
    document::{
      Document,
      Mark,
    },
    input_rules::{
      InputRules,
      Rule,
    },
    selection::Selection,
    state::Plugin,
  };

  fn view(text: &str, caret: usize, rules: Vec<Rule>) -> EditorView {
    let state = EditorState::new(Document::from(text), Selection::point(caret), vec![
      Plugin::input_rules(InputRules::new(rules)),
      Plugin::History,
    ])
    .unwrap();
    EditorView::new(state)
  }

  fn text(view: &EditorView) -> String {
    view.state().doc().to_string()
  }

  #[test]
  fn typing_triggers_rules() {
    let mut view = view("", 0, vec![Rule::replace("--$", "—").unwrap()]);
    assert!(!view.type_text("a").unwrap());
    assert!(!view.type_text("-").unwrap());
    assert!(view.type_text("-").unwrap());
    assert_eq!(text(&view), "a—");
    assert_eq!(view.state().selection().caret(), Some(2));

    assert!(!view.type_text("b").unwrap());
    assert_eq!(text(&view), "a—b");
  }

  #[test]
  fn undo_input_rule_then_history() {
    let mut view = view("a-", 2, vec![Rule::replace("--$", "—").unwrap()]);
    let backspace: [Command; 2] = [undo_input_rule, undo];

    assert!(view.type_text("-").unwrap());
    assert_eq!(text(&view), "a—");

    // first press reverts the rule, the second one falls back to history
    assert!(view.run_first(&backspace).unwrap());
    assert_eq!(text(&view), "a--");
    assert!(!view.run(undo_input_rule).unwrap());

    assert!(view.run_first(&backspace).unwrap());
    assert_eq!(text(&view), "a—");
    assert!(view.run(undo).unwrap());
    assert_eq!(text(&view), "a-");
    assert!(!view.run(undo).unwrap());
    assert!(!view.run_first(&backspace).unwrap());
  }

  #[test]
  fn rules_skip_code_blocks() {
    let doc = Document::from("text\n").with_mark(5, 5, Mark::CodeBlock).unwrap();
    let state = EditorState::new(doc, Selection::point(5), vec![Plugin::input_rules(
      InputRules::new(vec![
        Rule::handler(r"^\s*>\s$", |state, _, start, end| {
          let mut tr = state.tr();
          tr.delete(start, end).ok()?;
          tr.add_mark(start, start, Mark::Blockquote).ok()?;
          Some(tr)
        })
        .unwrap(),
      ]),
    )])
    .unwrap();
    let mut view = EditorView::new(state);

    assert!(!view.type_text(">").unwrap());
    assert!(!view.type_text(" ").unwrap());
    assert_eq!(text(&view), "text\n> ");
    assert!(view.state().doc().in_verbatim(7));
  }

  #[test]
  fn blockquote_rule_at_block_start() {
    let mut view = view("text\n", 5, vec![
      Rule::handler(r"^\s*>\s$", |state, _, start, end| {
        let mut tr = state.tr();
        tr.delete(start, end).ok()?;
        let (block_start, block_end) = tr.doc().block_range(start);
        tr.add_mark(block_start, block_end, Mark::Blockquote).ok()?;
        Some(tr)
      })
      .unwrap(),
    ]);

    assert!(!view.type_text(">").unwrap());
    assert!(view.type_text(" ").unwrap());
    assert_eq!(text(&view), "text\n");
    assert_eq!(view.state().doc().marks()[0].mark, Mark::Blockquote);

    assert!(!view.type_text("quoted").unwrap());
    assert_eq!(view.state().doc().marks()[0].to, 11);
  }

  #[test]
  fn composition_defers_rules() {
    let mut view = view("caf", 3, vec![Rule::replace("café$", "coffee").unwrap()]);

    view.composition_start();
    assert!(view.is_composing());
    assert!(!view.type_text("e").unwrap());
    assert!(!view.insert_text(3, 4, "é").unwrap());
    assert_eq!(text(&view), "café");

    view.composition_end();
    assert_eq!(view.pending(), 1);
    // nothing runs before the event settles
    assert_eq!(text(&view), "café");

    assert!(view.settle().unwrap());
    assert_eq!(text(&view), "coffee");
    assert_eq!(view.pending(), 0);

    assert!(view.run(undo_input_rule).unwrap());
    assert_eq!(text(&view), "café");
  }

  #[test]
  fn composition_check_needs_a_caret() {
    let mut view = view("café", 4, vec![Rule::replace("café$", "coffee").unwrap()]);
    view.composition_start();
    view.composition_end();
    view
      .dispatch(view.state().tr().with_selection(Selection::single(0, 4)))
      .unwrap();
    assert!(!view.settle().unwrap());
    assert_eq!(text(&view), "café");
  }
}
