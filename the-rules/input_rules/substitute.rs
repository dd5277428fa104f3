//! Literal replacement of a match.
//!
//! Without a capture group the whole match is replaced. With one, only the
//! text from the group onwards is replaced, so a pattern like `(?:^|\s)(")$`
//! swaps the quote and leaves the whitespace alone. Whatever follows the group
//! inside the match is kept after the replacement.
//!
//! The group may begin past the end of the document range: the tail of the
//! match is text that is being typed and not in the document yet. The range
//! then collapses onto its end and the part of the match between the end and
//! the group is re-inserted in front of the replacement.

use tracing::warn;

use super::rule::RuleMatch;
use crate::{
  state::EditorState,
  transaction::Transaction,
};

/// Where a literal replacement goes: the document range `[start, end)` is
/// replaced by `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
  pub start:  usize,
  pub end:    usize,
  pub insert: String,
}

/// Compute the replacement of `matched` (covering `[start, end)`) by
/// `replacement`, anchored at `group` when one participated.
pub fn substitute(
  matched: &str,
  group: Option<&str>,
  replacement: &str,
  start: usize,
  end: usize,
) -> Substitution {
  let Some(group) = group.filter(|group| !group.is_empty()) else {
    return Substitution {
      start,
      end,
      insert: replacement.to_string(),
    };
  };
  // not a substring: nothing to anchor on
  let Some(byte_offset) = matched.rfind(group) else {
    return Substitution {
      start,
      end,
      insert: replacement.to_string(),
    };
  };

  let offset = matched[..byte_offset].chars().count();
  let mut insert = String::with_capacity(replacement.len() + matched.len());
  insert.push_str(replacement);
  insert.push_str(&matched[byte_offset + group.len()..]);

  let start = start + offset;
  if start <= end {
    return Substitution { start, end, insert };
  }

  let cut_off = start - end;
  let keep_from = offset.saturating_sub(cut_off);
  let prefix: String = matched
    .chars()
    .skip(keep_from)
    .take(offset - keep_from)
    .collect();
  insert.insert_str(0, &prefix);
  Substitution {
    start: end,
    end,
    insert,
  }
}

/// Build the transaction for a literal replacement. The inserted text takes
/// the inline marks found at the start of the replaced range.
pub(crate) fn replace(
  state: &EditorState,
  matched: &RuleMatch<'_>,
  replacement: &str,
  start: usize,
  end: usize,
) -> Option<Transaction> {
  let substitution = substitute(
    matched.as_str(),
    matched.first_capture(),
    replacement,
    start,
    end,
  );

  let mut tr = state.tr();
  if let Err(err) = tr.insert_text(substitution.start, substitution.end, &substitution.insert) {
    warn!(
      start = substitution.start,
      end = substitution.end,
      "input rule replacement declined: {err}"
    );
    return None;
  }
  Some(tr)
}
