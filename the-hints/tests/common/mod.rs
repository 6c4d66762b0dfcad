//! Shared fixtures: an in-memory editor, a toy language handler that
//! understands `name(arg, arg)` call sites, and a presenter that records
//! every callback for the assertions.

use std::{
  collections::HashMap,
  num::NonZeroUsize,
  sync::{
    Arc,
    Mutex,
    atomic::{
      AtomicBool,
      AtomicUsize,
      Ordering,
    },
  },
  time::Duration,
};

use anyhow::{
  Result,
  bail,
};
use ropey::{
  Rope,
  RopeSlice,
};
use the_hints::{
  EditorEvent,
  EditorId,
  EditorModel,
  HintAnchor,
  HintDisplay,
  HintEngine,
  HintError,
  HintHandler,
  HintPresenter,
  HintSide,
  LookupContext,
  SessionId,
  Signature,
  SignatureSet,
  TextEdit,
  TextRange,
  Viewport,
};

pub const STEP: Duration = Duration::from_millis(5);

/// Pump the engine until `check` passes, sleeping between rounds so hooks
/// and workers get scheduled. Panics after two seconds.
pub async fn pump_until(
  engine: &mut HintEngine,
  editor: &mut FakeEditor,
  what: &str,
  mut check: impl FnMut(&HintEngine) -> bool,
) {
  for _ in 0..400 {
    if let Err(error) = engine.pump(editor) {
      panic!("pump failed while waiting for {what}: {error}");
    }
    if check(engine) {
      return;
    }
    tokio::time::sleep(STEP).await;
  }
  panic!("timed out waiting for {what}");
}

/// Keep pumping for `duration` and assert nothing fails. For "and then
/// nothing else happens" phases.
pub async fn pump_for(engine: &mut HintEngine, editor: &mut FakeEditor, duration: Duration) {
  let rounds = (duration.as_millis() / STEP.as_millis()).max(1);
  for _ in 0..rounds {
    engine.pump(editor).expect("pump failed");
    tokio::time::sleep(STEP).await;
  }
}

/// Type at the caret the way a host would: document event first, then the
/// caret move that came with the keystroke.
pub fn type_text(engine: &mut HintEngine, editor: &mut FakeEditor, chunk: &str) {
  let edits = editor.insert(editor.caret(), chunk);
  engine.handle_event(editor, EditorEvent::DocumentChanged { edits });
  engine.handle_event(editor, EditorEvent::CaretMoved);
}

/// Like [`pump_until`] but for the failure the pump is expected to report.
pub async fn pump_until_err(engine: &mut HintEngine, editor: &mut FakeEditor) -> HintError {
  for _ in 0..400 {
    if let Err(error) = engine.pump(editor) {
      return error;
    }
    tokio::time::sleep(STEP).await;
  }
  panic!("timed out waiting for a pump failure");
}

pub struct FakeEditor {
  id:       EditorId,
  text:     Rope,
  caret:    usize,
  version:  u64,
  focused:  bool,
  viewport: Viewport,
}

impl FakeEditor {
  pub fn new(id: usize, text: &str) -> Self {
    Self {
      id:       EditorId::new(NonZeroUsize::new(id).expect("editor ids start at 1")),
      text:     Rope::from_str(text),
      caret:    0,
      version:  0,
      focused:  true,
      viewport: Viewport {
        width:      80,
        height:     24,
        first_line: 0,
        first_col:  0,
      },
    }
  }

  pub fn place_caret(&mut self, offset: usize) {
    self.caret = offset;
  }

  /// Char offset of the first occurrence of `needle`.
  pub fn offset_of(&self, needle: &str) -> usize {
    let text = self.text.to_string();
    let byte = text.find(needle).expect("needle not in document");
    text[..byte].chars().count()
  }

  /// Put the caret right after the first occurrence of `needle`.
  pub fn caret_after(&mut self, needle: &str) -> usize {
    let offset = self.offset_of(needle) + needle.chars().count();
    self.caret = offset;
    offset
  }

  pub fn insert(&mut self, offset: usize, chunk: &str) -> Vec<TextEdit> {
    self.text.insert(offset, chunk);
    self.version += 1;
    let len = chunk.chars().count();
    if self.caret >= offset {
      self.caret += len;
    }
    vec![TextEdit::insert(offset, len)]
  }

  pub fn delete(&mut self, start: usize, end: usize) -> Vec<TextEdit> {
    self.text.remove(start..end);
    self.version += 1;
    if self.caret >= end {
      self.caret -= end - start;
    } else if self.caret > start {
      self.caret = start;
    }
    vec![TextEdit::delete(start, end)]
  }

  pub fn set_focus(&mut self, focused: bool) {
    self.focused = focused;
  }

  pub fn scroll_to(&mut self, first_line: usize) {
    self.viewport.first_line = first_line;
  }
}

impl EditorModel for FakeEditor {
  fn id(&self) -> EditorId {
    self.id
  }

  fn text(&self) -> &Rope {
    &self.text
  }

  fn caret(&self) -> usize {
    self.caret
  }

  fn move_caret(&mut self, offset: usize) {
    self.caret = offset;
  }

  fn version(&self) -> u64 {
    self.version
  }

  fn has_focus(&self) -> bool {
    self.focused
  }

  fn viewport(&self) -> Viewport {
    self.viewport
  }
}

/// Bracket-counting handler for `name(arg, arg)` call sites. Signature
/// sets are registered per callee name; lookups can be slowed down or made
/// to fail to exercise the engine's failure paths.
#[derive(Default)]
pub struct ToyHandler {
  table:   Mutex<HashMap<String, SignatureSet>>,
  delay:   Mutex<Duration>,
  failing: AtomicBool,
  lookups: AtomicUsize,
}

impl ToyHandler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn define(&self, name: &str, set: SignatureSet) {
    self
      .table
      .lock()
      .expect("handler table poisoned")
      .insert(name.to_string(), set);
  }

  pub fn set_delay(&self, delay: Duration) {
    *self.delay.lock().expect("handler delay poisoned") = delay;
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::Relaxed);
  }

  pub fn lookup_count(&self) -> usize {
    self.lookups.load(Ordering::Relaxed)
  }
}

impl HintHandler for ToyHandler {
  fn find_owner(&self, text: RopeSlice<'_>, offset: usize) -> Option<TextRange> {
    innermost_pair(text, offset)
  }

  fn signatures(&self, cx: &LookupContext<'_>) -> Result<SignatureSet> {
    self.lookups.fetch_add(1, Ordering::Relaxed);
    let delay = *self.delay.lock().expect("handler delay poisoned");
    if !delay.is_zero() {
      std::thread::sleep(delay);
    }
    if cx.cancel.is_canceled() {
      bail!("lookup canceled");
    }
    if self.failing.load(Ordering::Relaxed) {
      bail!("signature provider unavailable");
    }
    let name = callee_name(cx.text, cx.owner.start);
    let set = self
      .table
      .lock()
      .expect("handler table poisoned")
      .get(&name)
      .cloned()
      .unwrap_or_default();
    Ok(set)
  }

  fn actual_parameters(&self, text: RopeSlice<'_>, owner: TextRange) -> Vec<TextRange> {
    argument_spans(text, owner)
  }
}

/// The innermost `(`..`)` pair around `offset`. An unclosed list runs to
/// the end of the document, the way incomplete code behaves in a real
/// parser.
fn innermost_pair(text: RopeSlice<'_>, offset: usize) -> Option<TextRange> {
  let mut depth = 0usize;
  let mut open = None;
  for i in (0..offset.min(text.len_chars())).rev() {
    match text.char(i) {
      ')' => depth += 1,
      '(' if depth == 0 => {
        open = Some(i);
        break;
      },
      '(' => depth -= 1,
      _ => {},
    }
  }
  let open = open?;
  let mut depth = 0usize;
  for i in open + 1..text.len_chars() {
    match text.char(i) {
      '(' => depth += 1,
      ')' if depth == 0 => return Some(TextRange::new(open, i + 1)),
      ')' => depth -= 1,
      _ => {},
    }
  }
  Some(TextRange::new(open, text.len_chars()))
}

/// The identifier directly before the opening bracket.
fn callee_name(text: RopeSlice<'_>, open: usize) -> String {
  let mut start = open;
  while start > 0 {
    let ch = text.char(start - 1);
    if ch.is_alphanumeric() || ch == '_' {
      start -= 1;
    } else {
      break;
    }
  }
  text.slice(start..open).to_string()
}

/// Spans of the non-blank argument chunks between top-level commas.
fn argument_spans(text: RopeSlice<'_>, owner: TextRange) -> Vec<TextRange> {
  let mut spans = Vec::new();
  let interior = owner.shrink(1);
  let end = interior.end.min(text.len_chars());
  let mut depth = 0usize;
  let mut current: Option<usize> = None;
  for i in interior.start..end {
    let ch = text.char(i);
    match ch {
      '(' => depth += 1,
      ')' => depth = depth.saturating_sub(1),
      ',' if depth == 0 => {
        if let Some(start) = current.take() {
          spans.push(TextRange::new(start, i));
        }
        continue;
      },
      _ => {},
    }
    if ch == ' ' || ch == '\t' || ch == '\n' {
      if depth == 0
        && let Some(start) = current.take()
      {
        spans.push(TextRange::new(start, i));
      }
    } else if current.is_none() {
      current = Some(i);
    }
  }
  if let Some(start) = current.take() {
    spans.push(TextRange::new(start, end));
  }
  spans
}

/// Build `name(a, b, c)` with each argument marked as a parameter span.
pub fn signature(name: &str, params: &[&str]) -> Signature {
  let mut builder = Signature::build().text(format!("{name}("));
  for (i, param) in params.iter().enumerate() {
    if i > 0 {
      builder = builder.text(", ");
    }
    builder = builder.parameter(*param);
  }
  builder.text(")").finish()
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRecord {
  pub session:     SessionId,
  pub text:        String,
  pub highlighted: Option<String>,
  pub overloads:   usize,
  pub current:     Option<usize>,
  pub side:        HintSide,
  pub row:         u16,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
  Updated(UpdateRecord),
  Hidden { session: SessionId },
  Slow { session: SessionId },
}

/// Shared view of everything the presenter was told, in call order.
#[derive(Clone, Default)]
pub struct PresenterLog(Arc<Mutex<Vec<PresenterCall>>>);

impl PresenterLog {
  pub fn all(&self) -> Vec<PresenterCall> {
    self.0.lock().expect("presenter log poisoned").clone()
  }

  pub fn updates(&self) -> Vec<UpdateRecord> {
    self
      .all()
      .into_iter()
      .filter_map(|call| match call {
        PresenterCall::Updated(record) => Some(record),
        _ => None,
      })
      .collect()
  }

  pub fn last_update(&self) -> Option<UpdateRecord> {
    self.updates().pop()
  }

  pub fn update_count(&self) -> usize {
    self.updates().len()
  }

  pub fn hidden_count(&self) -> usize {
    self
      .all()
      .iter()
      .filter(|call| matches!(call, PresenterCall::Hidden { .. }))
      .count()
  }

  pub fn slow_count(&self) -> usize {
    self
      .all()
      .iter()
      .filter(|call| matches!(call, PresenterCall::Slow { .. }))
      .count()
  }

  pub fn clear(&self) {
    self.0.lock().expect("presenter log poisoned").clear();
  }

  fn push(&self, call: PresenterCall) {
    self.0.lock().expect("presenter log poisoned").push(call);
  }
}

pub struct RecordingPresenter {
  log: PresenterLog,
}

impl RecordingPresenter {
  pub fn new() -> (Self, PresenterLog) {
    let log = PresenterLog::default();
    (Self { log: log.clone() }, log)
  }
}

impl HintPresenter for RecordingPresenter {
  fn hint_updated(
    &mut self,
    _editor: EditorId,
    session: SessionId,
    display: &HintDisplay,
    anchor: HintAnchor,
  ) {
    let text = display
      .signatures
      .iter()
      .flat_map(|signature| signature.lines.iter())
      .map(|line| line.text())
      .collect::<Vec<_>>()
      .join("\n");
    self.log.push(PresenterCall::Updated(UpdateRecord {
      session,
      text,
      highlighted: highlighted_text(display),
      overloads: display.signatures.len(),
      current: display.current,
      side: anchor.side,
      row: anchor.point.row,
    }));
  }

  fn hint_hidden(&mut self, _editor: EditorId, session: SessionId) {
    self.log.push(PresenterCall::Hidden { session });
  }

  fn computation_slow(&mut self, _editor: EditorId, session: SessionId) {
    self.log.push(PresenterCall::Slow { session });
  }
}

/// The text under the highlight of the selected candidate.
fn highlighted_text(display: &HintDisplay) -> Option<String> {
  let index = display.current.unwrap_or(0);
  let signature = display.signatures.get(index)?;
  for line in &signature.lines {
    if let Some(range) = line.highlight {
      let text: String = line
        .text()
        .chars()
        .skip(range.start)
        .take(range.len())
        .collect();
      return Some(text);
    }
  }
  None
}
