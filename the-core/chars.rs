//! Character classes used when reading document text for pattern matching.

/// Object replacement character. Stands in for embedded non-text content
/// (images, widgets, hard breaks) whenever text is read out of a document.
pub const PLACEHOLDER: char = '\u{FFFC}';

/// Line breaks recognized by the rope's line index (`unicode_lines`).
#[inline]
pub fn char_is_line_ending(ch: char) -> bool {
  matches!(
    ch,
    '\u{000A}' | // LineFeed
    '\u{000B}' | // VerticalTab
    '\u{000C}' | // FormFeed
    '\u{000D}' | // CarriageReturn
    '\u{0085}' | // NextLine
    '\u{2028}' | // Line Separator
    '\u{2029}'   // Paragraph Separator
  )
}

/// True for characters that do not represent typed text: the object
/// replacement character itself and control characters other than tab.
#[inline]
pub fn char_is_placeholder(ch: char) -> bool {
  ch == PLACEHOLDER || (ch.is_control() && ch != '\t' && !char_is_line_ending(ch))
}

/// Copy `chars` into `out`, replacing every placeholder-like character with
/// `placeholder`.
pub fn push_normalized(out: &mut String, chars: impl Iterator<Item = char>, placeholder: char) {
  out.extend(chars.map(|ch| {
    if char_is_placeholder(ch) {
      placeholder
    } else {
      ch
    }
  }));
}
