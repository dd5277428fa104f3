//! Benchmarks for the input rules runner.
//!
//! Run with: `cargo bench -p the-rules --bench input_rules`

use divan::{
  Bencher,
  black_box,
};
use the_rules::{
  document::Document,
  input_rules::{
    InputRules,
    Rule,
    TextInput,
    try_rules,
  },
  selection::Selection,
  state::{
    EditorState,
    Plugin,
  },
};

fn main() {
  divan::main();
}

fn make_ascii_text(size: usize) -> String {
  let line = "The quick brown fox jumps over the lazy dog. ";
  let mut s = String::with_capacity(size);
  while s.len() < size {
    s.push_str(line);
  }
  s.truncate(size);
  s
}

fn typographic_rules() -> InputRules {
  InputRules::new(vec![
    Rule::replace("--$", "—").unwrap(),
    Rule::replace(r"\.\.\.$", "…").unwrap(),
    Rule::replace(r#"(?:^|[\s{\[(<'"‘“])(")$"#, "“").unwrap(),
    Rule::replace(r#"(")$"#, "”").unwrap(),
  ])
}

/// A single block of `size` chars ending in `tail`, with the caret at the end.
fn make_state(size: usize, tail: &str) -> EditorState {
  let mut text = make_ascii_text(size);
  text.push_str(tail);
  let doc = Document::from(text.as_str());
  let end = doc.len_chars();
  EditorState::new(doc, Selection::point(end), vec![Plugin::input_rules(
    typographic_rules(),
  )])
  .unwrap()
}

fn run(bencher: Bencher, state: &EditorState, text: &str) {
  let (key, rules, _) = state.input_rules().next().unwrap();
  let pos = state.doc().len_chars();

  bencher.bench(|| {
    let tr = try_rules(
      black_box(state),
      key,
      black_box(rules),
      TextInput::new(pos, pos, black_box(text)),
    );
    black_box(tr);
  });
}

// Input that fires a rule.

mod matching {
  use super::*;

  #[divan::bench(args = [64, 4 * 1024, 100 * 1024])]
  fn em_dash(bencher: Bencher, size: usize) {
    let state = make_state(size, "-");
    run(bencher, &state, "-");
  }

  #[divan::bench(args = [64, 4 * 1024, 100 * 1024])]
  fn last_rule(bencher: Bencher, size: usize) {
    let state = make_state(size, "x");
    run(bencher, &state, "\"");
  }
}

// Input that every rule rejects.

mod missing {
  use super::*;

  #[divan::bench(args = [64, 4 * 1024, 100 * 1024])]
  fn plain_char(bencher: Bencher, size: usize) {
    let state = make_state(size, "");
    run(bencher, &state, "x");
  }
}
