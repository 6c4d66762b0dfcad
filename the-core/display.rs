//! Turns a [`SignatureSet`] into the plain display model handed to the
//! presentation layer: one block of styled lines per candidate, with the
//! current-parameter span resolved to line-local offsets so decoration
//! never has to re-derive spans from text.
//!
//! Rendering is a pure function of its inputs. Width is measured in chars;
//! the presentation layer owns real cell metrics.

use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  range::TextRange,
  signature::{
    Signature,
    SignatureSet,
    TextFragment,
  },
};

/// Narrower than this, wrapping stops helping.
pub const MIN_HINT_WIDTH: usize = 24;

/// One rendered line: styled runs plus an optional highlight span in
/// line-local char offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLine {
  pub fragments: Vec<TextFragment>,
  pub highlight: Option<TextRange>,
}

impl DisplayLine {
  pub fn text(&self) -> String {
    self.fragments.iter().map(|f| f.text.as_str()).collect()
  }

  pub fn width(&self) -> usize {
    self.fragments.iter().map(TextFragment::len_chars).sum()
  }
}

/// One candidate's rendered block plus its decoration flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureDisplay {
  pub lines:      Vec<DisplayLine>,
  pub current:    bool,
  pub disabled:   bool,
  pub deprecated: bool,
  pub strikeout:  bool,
}

/// The full display model for one hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintDisplay {
  pub signatures: Vec<SignatureDisplay>,
  pub current:    Option<usize>,
}

impl HintDisplay {
  pub fn width(&self) -> usize {
    self
      .signatures
      .iter()
      .flat_map(|s| s.lines.iter())
      .map(DisplayLine::width)
      .max()
      .unwrap_or(0)
  }

  pub fn height(&self) -> usize {
    self.signatures.iter().map(|s| s.lines.len()).sum()
  }

  /// `"(2/3)"` when there is more than one candidate to cycle through.
  pub fn overload_label(&self) -> Option<String> {
    if self.signatures.len() > 1 {
      let index = self.current.unwrap_or(0);
      Some(format!("({}/{})", index + 1, self.signatures.len()))
    } else {
      None
    }
  }
}

/// Render every candidate, wrapping any signature wider than `max_width`
/// at parameter boundaries. The current parameter of `set` is highlighted
/// in each candidate that has a parameter at that position.
pub fn render(set: &SignatureSet, max_width: usize) -> HintDisplay {
  let max_width = max_width.max(MIN_HINT_WIDTH);
  let current = set.selected_index();
  let signatures = set
    .signatures()
    .iter()
    .enumerate()
    .map(|(index, signature)| {
      let highlight = set
        .current_parameter()
        .and_then(|p| signature.parameter_ranges().get(p))
        .copied();
      SignatureDisplay {
        lines:      layout_signature(signature, highlight, max_width),
        current:    current == Some(index),
        disabled:   signature.disabled,
        deprecated: signature.deprecated,
        strikeout:  signature.strikeout,
      }
    })
    .collect();
  HintDisplay { signatures, current }
}

/// Split one signature into lines no wider than `max_width`, breaking only
/// at parameter starts. A chunk wider than the limit stays on its own
/// overlong line rather than breaking mid-token.
fn layout_signature(
  signature: &Signature,
  highlight: Option<TextRange>,
  max_width: usize,
) -> Vec<DisplayLine> {
  let total = signature.len_chars();
  if total <= max_width {
    return vec![slice_line(signature, TextRange::new(0, total), highlight)];
  }

  let mut breaks: Vec<usize> = signature
    .parameter_ranges()
    .iter()
    .map(|range| range.start)
    .filter(|&start| start > 0 && start < total)
    .collect();
  breaks.dedup();
  breaks.push(total);

  let mut lines = Vec::new();
  let mut line_start = 0;
  let mut prev = 0;
  for &candidate in &breaks {
    if candidate - line_start > max_width && prev > line_start {
      lines.push(slice_line(
        signature,
        TextRange::new(line_start, prev),
        highlight,
      ));
      line_start = prev;
    }
    prev = candidate;
  }
  if line_start < total {
    lines.push(slice_line(
      signature,
      TextRange::new(line_start, total),
      highlight,
    ));
  }
  lines
}

/// Cut the fragment list down to `span`, translating the highlight into
/// line-local offsets when it falls inside.
fn slice_line(
  signature: &Signature,
  span: TextRange,
  highlight: Option<TextRange>,
) -> DisplayLine {
  let mut fragments = Vec::new();
  let mut offset = 0;
  for fragment in signature.fragments() {
    let len = fragment.len_chars();
    let start = offset;
    let end = offset + len;
    offset = end;
    if end <= span.start || start >= span.end {
      continue;
    }
    let take_from = span.start.saturating_sub(start);
    let take_to = (span.end - start).min(len);
    if take_from == 0 && take_to == len {
      fragments.push(fragment.clone());
    } else {
      let text: String = fragment
        .text
        .chars()
        .skip(take_from)
        .take(take_to - take_from)
        .collect();
      fragments.push(TextFragment::styled(text, fragment.style));
    }
  }
  let highlight = highlight.and_then(|h| {
    if span.contains(h.start) && h.end <= span.end {
      Some(TextRange::new(h.start - span.start, h.end - span.start))
    } else {
      None
    }
  });
  DisplayLine {
    fragments,
    highlight,
  }
}
