//! Candidate-signature data: styled text with parameter spans, plus the
//! per-update set of candidates and its selection indices.

use serde::{
  Deserialize,
  Serialize,
};

use crate::range::TextRange;

/// Rendering class of one text run. The presentation layer maps these onto
/// whatever theme it has; the engine never interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentStyle {
  #[default]
  Plain,
  /// De-emphasized text such as type annotations or punctuation.
  Muted,
  /// Emphasized text such as the callable name.
  Emphasis,
}

/// One styled run of signature text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
  pub text:  String,
  pub style: FragmentStyle,
}

impl TextFragment {
  pub fn plain(text: impl Into<String>) -> Self {
    TextFragment {
      text:  text.into(),
      style: FragmentStyle::Plain,
    }
  }

  pub fn styled(text: impl Into<String>, style: FragmentStyle) -> Self {
    TextFragment {
      text: text.into(),
      style,
    }
  }

  pub fn len_chars(&self) -> usize {
    self.text.chars().count()
  }
}

/// One candidate callable: styled fragments, the char spans of its
/// parameters within the concatenated text, and decoration flags. Built
/// once by the language handler and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
  fragments:        Vec<TextFragment>,
  parameter_ranges: Vec<TextRange>,
  pub deprecated:   bool,
  pub disabled:     bool,
  pub strikeout:    bool,
}

impl Signature {
  pub fn build() -> SignatureBuilder {
    SignatureBuilder::default()
  }

  pub fn fragments(&self) -> &[TextFragment] {
    &self.fragments
  }

  pub fn parameter_ranges(&self) -> &[TextRange] {
    &self.parameter_ranges
  }

  pub fn parameter_count(&self) -> usize {
    self.parameter_ranges.len()
  }

  /// The full signature text with styling flattened away.
  pub fn text(&self) -> String {
    self.fragments.iter().map(|f| f.text.as_str()).collect()
  }

  pub fn len_chars(&self) -> usize {
    self.fragments.iter().map(TextFragment::len_chars).sum()
  }
}

/// Incremental construction of a [`Signature`], tracking char offsets so
/// parameter spans line up with the concatenated text.
#[derive(Debug, Default)]
pub struct SignatureBuilder {
  fragments:        Vec<TextFragment>,
  parameter_ranges: Vec<TextRange>,
  len:              usize,
  deprecated:       bool,
  disabled:         bool,
  strikeout:        bool,
}

impl SignatureBuilder {
  pub fn text(self, text: impl Into<String>) -> Self {
    self.fragment(TextFragment::plain(text))
  }

  pub fn styled(self, text: impl Into<String>, style: FragmentStyle) -> Self {
    self.fragment(TextFragment::styled(text, style))
  }

  pub fn fragment(mut self, fragment: TextFragment) -> Self {
    self.len += fragment.len_chars();
    self.fragments.push(fragment);
    self
  }

  /// Append a fragment and record its span as the next parameter.
  pub fn parameter(mut self, text: impl Into<String>) -> Self {
    let fragment = TextFragment::plain(text);
    let start = self.len;
    self.len += fragment.len_chars();
    self.parameter_ranges.push(TextRange::new(start, self.len));
    self.fragments.push(fragment);
    self
  }

  pub fn deprecated(mut self) -> Self {
    self.deprecated = true;
    self
  }

  pub fn disabled(mut self) -> Self {
    self.disabled = true;
    self
  }

  pub fn strikeout(mut self) -> Self {
    self.strikeout = true;
    self
  }

  pub fn finish(self) -> Signature {
    Signature {
      fragments:        self.fragments,
      parameter_ranges: self.parameter_ranges,
      deprecated:       self.deprecated,
      disabled:         self.disabled,
      strikeout:        self.strikeout,
    }
  }
}

/// The candidates applicable at one offset, rebuilt wholesale on every
/// successful computation.
///
/// `current_signature` is the candidate the hint centers on,
/// `current_parameter` the argument position at the caret, `highlighted`
/// the candidate the handler's resolution singled out. Setters drop
/// out-of-range indices instead of storing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignatureSet {
  signatures:        Vec<Signature>,
  current_signature: Option<usize>,
  current_parameter: Option<usize>,
  highlighted:       Option<usize>,
}

impl SignatureSet {
  pub fn new(signatures: Vec<Signature>) -> Self {
    SignatureSet {
      signatures,
      current_signature: None,
      current_parameter: None,
      highlighted: None,
    }
  }

  pub fn len(&self) -> usize {
    self.signatures.len()
  }

  pub fn is_empty(&self) -> bool {
    self.signatures.is_empty()
  }

  pub fn signatures(&self) -> &[Signature] {
    &self.signatures
  }

  pub fn current_signature(&self) -> Option<usize> {
    self.current_signature
  }

  pub fn set_current_signature(&mut self, index: Option<usize>) {
    self.current_signature = index.filter(|&i| i < self.signatures.len());
  }

  pub fn current_parameter(&self) -> Option<usize> {
    self.current_parameter
  }

  pub fn set_current_parameter(&mut self, index: Option<usize>) {
    self.current_parameter = index;
  }

  pub fn highlighted(&self) -> Option<usize> {
    self.highlighted
  }

  pub fn set_highlighted(&mut self, index: Option<usize>) {
    self.highlighted = index.filter(|&i| i < self.signatures.len());
  }

  /// The signature the hint centers on: the current one, else the
  /// highlighted one, else the first.
  pub fn selected(&self) -> Option<&Signature> {
    self.selected_index().map(|i| &self.signatures[i])
  }

  pub fn selected_index(&self) -> Option<usize> {
    if self.signatures.is_empty() {
      return None;
    }
    self.current_signature.or(self.highlighted).or(Some(0))
  }

  /// Move the current signature forward with wrap-around.
  pub fn select_next(&mut self) -> bool {
    if self.signatures.len() < 2 {
      return false;
    }
    let current = self.selected_index().unwrap_or(0);
    self.current_signature = Some((current + 1) % self.signatures.len());
    true
  }

  /// Move the current signature backward with wrap-around.
  pub fn select_prev(&mut self) -> bool {
    if self.signatures.len() < 2 {
      return false;
    }
    let current = self.selected_index().unwrap_or(0);
    self.current_signature = Some(if current == 0 {
      self.signatures.len() - 1
    } else {
      current - 1
    });
    true
  }
}
