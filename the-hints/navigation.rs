//! Caret movement between parameters and the caret-to-parameter mapping the
//! highlight is driven by. Everything here is a pure function of the text,
//! so it runs inline on the update path.

use ropey::RopeSlice;
use the_hints_core::{
  TextRange,
  chars,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
  Forward,
  Backward,
}

/// Whether `caret` sits between the delimiters of `owner`, exclusive on
/// both sides. A caret on the opening bracket (or past the closing one) is
/// outside.
pub(crate) fn caret_inside(owner: TextRange, caret: usize) -> bool {
  owner.start < caret && caret < owner.end
}

/// Which written argument `offset` belongs to, for navigation. An offset in
/// the gap between two arguments goes with the earlier one while it is at
/// or before the separating delimiter, and with the later one past it.
pub fn parameter_index_at(
  text: RopeSlice<'_>,
  parameters: &[TextRange],
  delimiter: Option<char>,
  offset: usize,
) -> usize {
  for (i, range) in parameters.iter().enumerate() {
    if offset < range.start {
      if i == 0 {
        return 0;
      }
      let gap_start = parameters[i - 1].end;
      if let Some(delim) = delimiter
        && let Some(pos) = find_char(text, gap_start, range.start, delim)
      {
        return if offset <= pos { i - 1 } else { i };
      }
      return i;
    }
    if offset <= range.end {
      return i;
    }
  }
  parameters.len().saturating_sub(1)
}

/// Parameter position of the caret inside `owner`, for the highlight. This
/// counts separators rather than walking argument spans so it also works in
/// lists whose arguments are not written yet, like `foo(|)` or `foo(1, |)`.
/// `None` when the caret is outside the list.
pub fn caret_parameter_index(
  text: RopeSlice<'_>,
  owner: TextRange,
  delimiter: Option<char>,
  caret: usize,
) -> Option<usize> {
  if !caret_inside(owner, caret) {
    return None;
  }
  let upto = caret.min(text.len_chars());
  match delimiter {
    Some(delim) => {
      let count = (owner.start + 1..upto)
        .filter(|&i| text.char(i) == delim)
        .count();
      Some(count)
    },
    None => {
      // Whitespace-delimited: each blank run after a token opens the next
      // position.
      let mut index = 0;
      let mut in_token = false;
      for i in owner.start + 1..upto {
        if chars::char_is_blank(text.char(i)) {
          if in_token {
            index += 1;
            in_token = false;
          }
        } else {
          in_token = true;
        }
      }
      Some(index)
    },
  }
}

/// The offset the caret moves to when navigating one parameter over, or
/// `None` at the boundary of the list.
pub fn adjacent_parameter_offset(
  text: RopeSlice<'_>,
  owner: TextRange,
  parameters: &[TextRange],
  delimiter: Option<char>,
  caret: usize,
  direction: Direction,
) -> Option<usize> {
  if parameters.is_empty() {
    return None;
  }
  // Token-delimited lists ignore blanks the caret hovers after;
  // whitespace-delimited ones match it literally.
  let offset = if delimiter.is_some() {
    chars::skip_blanks_back(text, caret)
  } else {
    caret
  };
  if offset <= owner.start {
    return None;
  }
  let index = parameter_index_at(text, parameters, delimiter, offset);
  let target = match direction {
    Direction::Forward if index + 1 < parameters.len() => index + 1,
    Direction::Backward if index > 0 => index - 1,
    _ => return None,
  };
  Some(parameters[target].start)
}

fn find_char(text: RopeSlice<'_>, from: usize, to: usize, ch: char) -> Option<usize> {
  (from..to.min(text.len_chars())).find(|&i| text.char(i) == ch)
}
