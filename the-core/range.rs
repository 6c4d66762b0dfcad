//! Char-offset spans and remapping of offsets across document edits.
//!
//! Sessions pin themselves to text (the argument-list span and its opening
//! bracket); every edit that lands before or inside those spans has to move
//! them before the next update resolves against the new document.

use serde::{
  Deserialize,
  Serialize,
};

/// A half-open `[start, end)` span of char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
  pub start: usize,
  pub end:   usize,
}

impl TextRange {
  pub fn new(start: usize, end: usize) -> Self {
    debug_assert!(start <= end, "inverted range {start}..{end}");
    TextRange { start, end }
  }

  /// An empty range at `offset`.
  pub fn point(offset: usize) -> Self {
    TextRange {
      start: offset,
      end:   offset,
    }
  }

  pub fn len(&self) -> usize {
    self.end - self.start
  }

  pub fn is_empty(&self) -> bool {
    self.start == self.end
  }

  /// `start <= offset < end`.
  pub fn contains(&self, offset: usize) -> bool {
    self.start <= offset && offset < self.end
  }

  /// `start <= offset <= end`. A caret sitting right behind the closing
  /// bracket still counts as inside for lifecycle purposes.
  pub fn contains_inclusive(&self, offset: usize) -> bool {
    self.start <= offset && offset <= self.end
  }

  /// Whether `other` lies fully within `self`.
  pub fn contains_range(&self, other: TextRange) -> bool {
    self.start <= other.start && other.end <= self.end
  }

  /// Shrink both ends inward by `amount`, collapsing instead of inverting.
  pub fn shrink(&self, amount: usize) -> TextRange {
    let start = (self.start + amount).min(self.end);
    let end = self.end.saturating_sub(amount).max(start);
    TextRange { start, end }
  }

  /// Clamp `offset` into `[start, end]`.
  pub fn clamp_offset(&self, offset: usize) -> usize {
    offset.clamp(self.start, self.end)
  }
}

/// Which side of an edit an offset sticks to when the edit happens exactly
/// at that offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
  Before,
  After,
}

/// One replacement in a document change: the chars in `[start, old_end)`
/// were replaced by text spanning `[start, new_end)`. A batch of edits is
/// sorted by `start`, non-overlapping, with every field in pre-change
/// coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
  pub start:   usize,
  pub old_end: usize,
  pub new_end: usize,
}

impl TextEdit {
  pub fn insert(offset: usize, len: usize) -> Self {
    TextEdit {
      start:   offset,
      old_end: offset,
      new_end: offset + len,
    }
  }

  pub fn delete(start: usize, end: usize) -> Self {
    TextEdit {
      start,
      old_end: end,
      new_end: start,
    }
  }

  pub fn replace(start: usize, end: usize, new_len: usize) -> Self {
    TextEdit {
      start,
      old_end: end,
      new_end: start + new_len,
    }
  }

  pub fn old_len(&self) -> usize {
    self.old_end - self.start
  }

  pub fn new_len(&self) -> usize {
    self.new_end - self.start
  }

  /// Map a single offset across this edit.
  pub fn map_offset(&self, offset: usize, assoc: Assoc) -> usize {
    if offset < self.start || (offset == self.start && assoc == Assoc::Before) {
      offset
    } else if offset >= self.old_end {
      offset - self.old_end + self.new_end
    } else {
      // Strictly inside the replaced span: collapse onto the edge the
      // caller associates with.
      match assoc {
        Assoc::Before => self.start,
        Assoc::After => self.new_end,
      }
    }
  }
}

/// Map `offset` through a sorted, non-overlapping batch of edits.
pub fn map_offset(edits: &[TextEdit], offset: usize, assoc: Assoc) -> usize {
  let mut shift = 0isize;
  for edit in edits {
    if offset < edit.start || (offset == edit.start && assoc == Assoc::Before) {
      break;
    }
    if offset >= edit.old_end {
      shift += edit.new_len() as isize - edit.old_len() as isize;
    } else {
      let edge = match assoc {
        Assoc::Before => edit.start,
        Assoc::After => edit.new_end,
      };
      return (edge as isize + shift) as usize;
    }
  }
  (offset as isize + shift) as usize
}

/// Map a range through a batch of edits. The start follows text inserted at
/// it (so a span pinned to a bracket moves with the bracket); the end does
/// not swallow text inserted directly behind it. A range overrun by a
/// replacement collapses rather than inverting.
pub fn map_range(edits: &[TextEdit], range: TextRange) -> TextRange {
  let start = map_offset(edits, range.start, Assoc::After);
  let end = map_offset(edits, range.end, Assoc::Before).max(start);
  TextRange { start, end }
}
