//! Horizontal-whitespace helpers for argument lists.
//!
//! Inside an argument list only spaces and tabs count as padding; a line
//! break is a real boundary and is never skipped.

use ropey::RopeSlice;

#[inline]
pub fn char_is_blank(ch: char) -> bool {
  matches!(ch, ' ' | '\t')
}

/// Walk backward from `offset` over blanks, returning the offset right
/// behind the first non-blank char (or 0 when the run reaches the start).
pub fn skip_blanks_back(text: RopeSlice<'_>, offset: usize) -> usize {
  let mut offset = offset.min(text.len_chars());
  while offset > 0 && char_is_blank(text.char(offset - 1)) {
    offset -= 1;
  }
  offset
}

/// Walk forward from `offset` over blanks, returning the offset of the
/// first non-blank char (or the text length when the run reaches the end).
pub fn skip_blanks_forward(text: RopeSlice<'_>, offset: usize) -> usize {
  let mut offset = offset.min(text.len_chars());
  while offset < text.len_chars() && char_is_blank(text.char(offset)) {
    offset += 1;
  }
  offset
}

#[cfg(test)]
mod tests {
  use ropey::Rope;

  use super::*;

  #[test]
  fn blank_classification() {
    assert!(char_is_blank(' '));
    assert!(char_is_blank('\t'));
    assert!(!char_is_blank('\n'));
    assert!(!char_is_blank('a'));
  }

  #[test]
  fn skips_blank_runs_backward() {
    let text = Rope::from("foo(a,  \t b)");
    let slice = text.slice(..);
    // Caret after the blank run between ',' and 'b'.
    assert_eq!(skip_blanks_back(slice, 10), 6);
    // No blanks behind the caret.
    assert_eq!(skip_blanks_back(slice, 5), 5);
    assert_eq!(skip_blanks_back(slice, 0), 0);
  }

  #[test]
  fn skips_blank_runs_forward() {
    let text = Rope::from("foo(a,  \t b)");
    let slice = text.slice(..);
    assert_eq!(skip_blanks_forward(slice, 6), 10);
    assert_eq!(skip_blanks_forward(slice, 11), 11);
    assert_eq!(skip_blanks_forward(slice, slice.len_chars()), slice.len_chars());
  }

  #[test]
  fn stops_at_line_breaks() {
    let text = Rope::from("foo(a,  \n  b)");
    let slice = text.slice(..);
    // Forward from the blanks after ',' halts at the newline.
    assert_eq!(skip_blanks_forward(slice, 6), 8);
    // Backward from 'b' halts right after the newline.
    assert_eq!(skip_blanks_back(slice, 11), 9);
  }
}
