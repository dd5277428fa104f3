//! Editor state: a document, a selection and the state of every plugin.
//!
//! States are values. [`EditorState::apply`] returns the state after a
//! transaction and leaves the original untouched; every plugin computes its
//! next state from the transaction and its previous state.

use std::sync::{
  Arc,
  atomic::{
    AtomicU64,
    Ordering,
  },
};

use thiserror::Error;
use tracing::trace;

use crate::{
  document::Document,
  history::History,
  input_rules::{
    self,
    InputRules,
    RevertRecord,
  },
  selection::{
    Selection,
    SelectionError,
  },
  transaction::{
    Transaction,
    TransactionError,
  },
};

pub type Result<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
  #[error("transaction was built for a different document")]
  MismatchedTransaction,
  #[error(transparent)]
  Transaction(#[from] TransactionError),
  #[error(transparent)]
  Selection(#[from] SelectionError),
}

fn next_generation() -> u64 {
  static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);
  NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Identity of a plugin instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginKey(u64);

impl PluginKey {
  pub fn fresh() -> Self {
    static NEXT_KEY: AtomicU64 = AtomicU64::new(1);
    Self(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
  }
}

#[derive(Debug, Clone)]
pub enum Plugin {
  /// An input rules engine.
  InputRules {
    key:   PluginKey,
    rules: Arc<InputRules>,
  },
  /// General undo history.
  History,
}

impl Plugin {
  pub fn input_rules(rules: InputRules) -> Self {
    Plugin::InputRules {
      key:   PluginKey::fresh(),
      rules: Arc::new(rules),
    }
  }

  pub fn key(&self) -> Option<PluginKey> {
    match self {
      Plugin::InputRules { key, .. } => Some(*key),
      Plugin::History => None,
    }
  }

  pub fn init(&self) -> PluginState {
    match self {
      Plugin::InputRules { .. } => PluginState::InputRules(None),
      Plugin::History => PluginState::History(History::default()),
    }
  }

  /// Compute the plugin's state after `tr`. `old` is the state `tr` was
  /// applied to.
  pub fn apply(
    &self,
    tr: &Transaction,
    prev: &PluginState,
    old: &EditorState,
  ) -> Result<PluginState> {
    match (self, prev) {
      (Plugin::InputRules { key, .. }, PluginState::InputRules(record)) => {
        Ok(PluginState::InputRules(input_rules::next_record(
          *key,
          tr,
          record.as_ref(),
        )))
      },
      (Plugin::History, PluginState::History(history)) => {
        let mut history = history.clone();
        history.apply(tr, old.selection())?;
        Ok(PluginState::History(history))
      },
      // states are created by `init` of the same plugin
      (plugin, _) => Ok(plugin.init()),
    }
  }
}

#[derive(Debug, Clone)]
pub enum PluginState {
  /// The revert record of the last applied rule, if still valid.
  InputRules(Option<RevertRecord>),
  History(History),
}

#[derive(Debug, Clone)]
pub struct EditorState {
  doc:        Document,
  selection:  Selection,
  plugins:    Arc<[Plugin]>,
  states:     Vec<PluginState>,
  /// Unique per applied transaction; identifies `doc` without comparing it.
  generation: u64,
}

impl EditorState {
  pub fn new(doc: Document, selection: Selection, plugins: Vec<Plugin>) -> Result<Self> {
    selection.ensure_within(doc.len_chars())?;
    let states = plugins.iter().map(Plugin::init).collect();
    Ok(Self {
      doc,
      selection,
      plugins: plugins.into(),
      states,
      generation: next_generation(),
    })
  }

  pub fn doc(&self) -> &Document {
    &self.doc
  }

  pub fn selection(&self) -> &Selection {
    &self.selection
  }

  pub fn plugins(&self) -> &[Plugin] {
    &self.plugins
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// A transaction starting from this state's document.
  pub fn tr(&self) -> Transaction {
    Transaction::new(&self.doc).with_origin(self.generation)
  }

  /// Adopt `tr`, built elsewhere against this state's document, as if it had
  /// been started with [`EditorState::tr`].
  pub(crate) fn stamp(&self, tr: Transaction) -> Transaction {
    tr.with_origin(self.generation)
  }

  /// Every input rules engine with its rules and active revert record.
  pub fn input_rules(
    &self,
  ) -> impl Iterator<Item = (PluginKey, &InputRules, Option<&RevertRecord>)> + '_ {
    self
      .plugins
      .iter()
      .zip(&self.states)
      .filter_map(|(plugin, state)| {
        match (plugin, state) {
          (Plugin::InputRules { key, rules }, PluginState::InputRules(record)) => {
            Some((*key, rules.as_ref(), record.as_ref()))
          },
          _ => None,
        }
      })
  }

  /// The state of the first history plugin.
  pub fn history(&self) -> Option<&History> {
    self.states.iter().find_map(|state| {
      match state {
        PluginState::History(history) => Some(history),
        _ => None,
      }
    })
  }

  /// The state after `tr`.
  ///
  /// Transactions started from this state are accepted as is; any other one
  /// must start from an equal document.
  pub fn apply(&self, tr: &Transaction) -> Result<EditorState> {
    let own = tr.origin() == Some(self.generation);
    if !own && tr.before() != &self.doc {
      return Err(StateError::MismatchedTransaction);
    }

    let selection = match tr.selection() {
      Some(selection) => selection.clone(),
      None => tr.map_selection(&self.selection)?,
    };
    selection.ensure_within(tr.doc().len_chars())?;

    let states = self
      .plugins
      .iter()
      .zip(&self.states)
      .map(|(plugin, prev)| plugin.apply(tr, prev, self))
      .collect::<Result<Vec<_>>>()?;

    trace!(
      steps = tr.transform().steps().len(),
      rule_applied = tr.rule_applied().is_some(),
      "applied transaction"
    );
    Ok(EditorState {
      doc: tr.doc().clone(),
      selection,
      plugins: self.plugins.clone(),
      states,
      generation: next_generation(),
    })
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn plugin_keys_are_unique() {
    let a = Plugin::input_rules(InputRules::default());
    let b = Plugin::input_rules(InputRules::default());
    assert_ne!(a.key(), b.key());
    assert_eq!(Plugin::History.key(), None);
  }

  #[test]
  fn new_validates_selection() {
    let err = EditorState::new(Document::from("ab"), Selection::point(3), vec![]).unwrap_err();
    assert_eq!(
      err,
      StateError::Selection(SelectionError::OutOfBounds { pos: 3, len: 2 })
    );
  }

  #[test]
  fn apply_maps_selection_and_keeps_old_state() {
    let state = EditorState::new(Document::from("ab"), Selection::point(1), vec![
      Plugin::History,
    ])
    .unwrap();
    let mut tr = state.tr();
    tr.replace(0, 0, "xx").unwrap();

    let next = state.apply(&tr).unwrap();
    assert_eq!(next.doc().to_string(), "xxab");
    assert_eq!(next.selection().caret(), Some(3));
    assert_eq!(next.history().unwrap().depth(), 1);

    assert_eq!(state.doc().to_string(), "ab");
    assert!(state.history().unwrap().is_empty());
  }

  #[test]
  fn apply_rejects_foreign_transactions() {
    let state = EditorState::new(Document::from("ab"), Selection::point(0), vec![]).unwrap();
    let mut tr = Transaction::new(&Document::from("other"));
    tr.replace(0, 1, "O").unwrap();
    assert_eq!(
      state.apply(&tr).unwrap_err(),
      StateError::MismatchedTransaction
    );
  }

  #[test]
  fn transactions_remember_their_state() {
    let state = EditorState::new(Document::from("ab"), Selection::point(0), vec![]).unwrap();
    let mut tr = state.tr();
    assert_eq!(tr.origin(), Some(state.generation()));
    tr.replace(0, 0, "x").unwrap();

    let next = state.apply(&tr).unwrap();
    assert_ne!(next.generation(), state.generation());
    // a transaction is only good for the state it was started from
    assert_eq!(next.apply(&tr).unwrap_err(), StateError::MismatchedTransaction);

    // a twin state holds an equal document, so its transactions still apply
    let twin = EditorState::new(Document::from("ab"), Selection::point(0), vec![]).unwrap();
    assert_ne!(twin.generation(), state.generation());
    assert_eq!(twin.apply(&tr).unwrap().doc().to_string(), "xab");
    let clone = state.clone();
    assert_eq!(clone.apply(&tr).unwrap().doc().to_string(), "xab");
  }

  #[test]
  fn explicit_selection_must_fit() {
    let state = EditorState::new(Document::from("ab"), Selection::point(0), vec![]).unwrap();
    let tr = state.tr().with_selection(Selection::single(0, 9));
    assert!(matches!(
      state.apply(&tr),
      Err(StateError::Selection(SelectionError::OutOfBounds { pos: 9, len: 2 }))
    ));
  }
}
