//! The update engine: session lifecycle, debounced recomputation, worker
//! dispatch, and publication of results back to the presenter.

use std::{
  collections::VecDeque,
  pin::pin,
  sync::Arc,
};

use ropey::{
  Rope,
  RopeSlice,
};
use the_hints_core::{
  HintSize,
  PlacementRequest,
  Point,
  SignatureSet,
  TextEdit,
  TextRange,
  Viewport,
  chars,
  display,
  range,
};
use the_hints_event::{
  AsyncHook,
  TaskHandle,
  cancelable_future,
};
use thiserror::Error;
use tokio::sync::mpsc::{
  self,
  UnboundedReceiver,
  UnboundedSender,
};

use crate::{
  config::HintConfig,
  editor::{
    EditorEvent,
    EditorId,
    EditorModel,
  },
  handler::{
    HintHandler,
    LookupContext,
  },
  navigation::{
    self,
    Direction,
  },
  presenter::HintPresenter,
  registry::{
    SessionId,
    SessionRegistry,
  },
  scheduler::UpdateScheduler,
  session::{
    ContextSnapshot,
    HintSession,
    SessionState,
  },
};

/// Failure surfaced from [`HintEngine::pump`]. Only produced when
/// [`propagate_handler_errors`](HintConfig::propagate_handler_errors) is
/// set; the default path logs, hides the hint, and keeps going.
#[derive(Debug, Error)]
pub enum HintError {
  #[error("signature lookup failed at offset {offset}: {error:#}")]
  Lookup { offset: usize, error: anyhow::Error },
}

/// Messages from scheduler hooks and worker tasks back to the engine. They
/// queue in an unbounded channel until the host pumps the editor they are
/// addressed to.
#[derive(Debug)]
pub(crate) enum EngineMessage {
  /// A session's quiet window elapsed.
  ScheduleFire {
    editor:  EditorId,
    session: SessionId,
  },
  /// A worker finished (or failed) a signature lookup.
  ComputationDone {
    editor:     EditorId,
    session:    SessionId,
    generation: u64,
    outcome:    anyhow::Result<SignatureSet>,
  },
  /// A worker outlived the slow-hint delay and is still running.
  ComputationSlow {
    editor:     EditorId,
    session:    SessionId,
    generation: u64,
  },
}

impl EngineMessage {
  fn editor(&self) -> EditorId {
    match *self {
      EngineMessage::ScheduleFire { editor, .. }
      | EngineMessage::ComputationDone { editor, .. }
      | EngineMessage::ComputationSlow { editor, .. } => editor,
    }
  }
}

/// Debounced parameter-hint engine for any number of editors.
///
/// Hosts own one engine, feed it [`EditorEvent`]s, and call
/// [`pump`](Self::pump) once per update tick so queued scheduler and worker
/// messages get applied. Signature lookups run on the tokio blocking pool;
/// everything else happens inline on the host's update path, so the engine
/// has to live inside a tokio runtime.
pub struct HintEngine {
  config:     HintConfig,
  handler:    Arc<dyn HintHandler>,
  presenter:  Box<dyn HintPresenter>,
  registry:   SessionRegistry,
  message_tx: UnboundedSender<EngineMessage>,
  message_rx: UnboundedReceiver<EngineMessage>,
  /// Drained messages addressed to editors other than the one being
  /// pumped. They wait here for their editor's turn.
  inbox:      VecDeque<EngineMessage>,
}

impl HintEngine {
  pub fn new(
    config: HintConfig,
    handler: Arc<dyn HintHandler>,
    presenter: Box<dyn HintPresenter>,
  ) -> Self {
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    Self {
      config,
      handler,
      presenter,
      registry: SessionRegistry::new(),
      message_tx,
      message_rx,
      inbox: VecDeque::new(),
    }
  }

  pub fn config(&self) -> &HintConfig {
    &self.config
  }

  pub fn registry(&self) -> &SessionRegistry {
    &self.registry
  }

  /// Whether `id` is the innermost session at `offset`. Enclosing sessions
  /// report `false` while the caret is inside a nested list they track.
  pub fn is_innermost(&self, id: SessionId, offset: usize) -> bool {
    self.registry.is_innermost(id, offset)
  }

  /// Apply one editor event. Cheap; anything expensive is deferred to the
  /// session's scheduler and the worker pool.
  pub fn handle_event(&mut self, editor: &mut dyn EditorModel, event: EditorEvent) {
    match event {
      EditorEvent::Invoked => self.invoke(editor, false),
      EditorEvent::InvokedQuiet => {
        if self.config.auto_hints {
          self.invoke(editor, true);
        }
      },
      EditorEvent::DocumentChanged { edits } => self.document_changed(editor, &edits),
      EditorEvent::CaretMoved => self.caret_moved(editor),
      EditorEvent::Scrolled => self.scrolled(editor),
      EditorEvent::ExternalChanged { anchor } => self.external_changed(editor, anchor),
      EditorEvent::Closed => self.editor_closed(editor.id()),
    }
  }

  /// Drain queued scheduler and worker messages addressed to `editor` and
  /// apply them. Messages for other editors are kept until those editors
  /// get pumped. Call once per host update tick.
  ///
  /// Only ever `Err` when
  /// [`propagate_handler_errors`](HintConfig::propagate_handler_errors) is
  /// set, and even then the whole queue is processed first; the first
  /// failure is reported.
  pub fn pump(&mut self, editor: &mut dyn EditorModel) -> Result<(), HintError> {
    while let Ok(message) = self.message_rx.try_recv() {
      self.inbox.push_back(message);
    }
    let editor_id = editor.id();
    let mut kept = VecDeque::new();
    let mut failed = None;
    for message in std::mem::take(&mut self.inbox) {
      if message.editor() != editor_id {
        kept.push_back(message);
        continue;
      }
      match message {
        EngineMessage::ScheduleFire { session, .. } => self.fire_update(editor, session),
        EngineMessage::ComputationDone {
          session,
          generation,
          outcome,
          ..
        } => {
          if let Err(error) = self.apply_outcome(editor, session, generation, outcome) {
            failed.get_or_insert(error);
          }
        },
        EngineMessage::ComputationSlow {
          session,
          generation,
          ..
        } => self.computation_slow(session, generation),
      }
    }
    self.inbox = kept;
    match failed {
      Some(error) => Err(error),
      None => Ok(()),
    }
  }

  /// Move the caret to the previous or next argument of the list at the
  /// caret. Returns whether the caret moved.
  pub fn navigate_parameter(&mut self, editor: &mut dyn EditorModel, direction: Direction) -> bool {
    let Some((id, owner)) = self.session_at_caret(editor) else {
      return false;
    };
    let caret = editor.caret();
    let delimiter = self.handler.parameter_delimiter();
    let text = editor.text();
    let parameters = self.handler.actual_parameters(text.slice(..), owner);
    let target = navigation::adjacent_parameter_offset(
      text.slice(..),
      owner,
      &parameters,
      delimiter,
      caret,
      direction,
    );
    let Some(target) = target else {
      return false;
    };
    editor.move_caret(target);
    if self.registry.get(id).is_some_and(HintSession::is_visible) {
      self.refresh_highlight(editor, id);
    }
    if let Some(session) = self.registry.get(id) {
      session.schedule_immediate();
    }
    true
  }

  /// Cycle the selected signature of the hint at the caret. Returns whether
  /// the selection changed.
  pub fn cycle_overload(&mut self, editor: &mut dyn EditorModel, direction: Direction) -> bool {
    let Some((id, _)) = self.session_at_caret(editor) else {
      return false;
    };
    let Some(session) = self.registry.get_mut(id) else {
      return false;
    };
    let changed = match direction {
      Direction::Forward => session.signatures.select_next(),
      Direction::Backward => session.signatures.select_prev(),
    };
    if changed && session.is_visible() {
      self.present(editor, id);
    }
    changed
  }

  fn invoke(&mut self, editor: &mut dyn EditorModel, quiet: bool) {
    let caret = editor.caret();
    let text = editor.text();
    let probe = self.lookup_offset(text.slice(..), caret);
    let Some(owner) = self.handler.find_owner(text.slice(..), probe) else {
      log::debug!("no argument list at offset {probe} in editor {}", editor.id());
      return;
    };
    let editor_id = editor.id();
    let (matched, stale) = self.registry.find_at(editor_id, owner.start);
    for id in stale {
      self.dispose_session(editor_id, id);
    }
    let session_id = match matched {
      Some(id) => {
        let Some(session) = self.registry.get_mut(id) else {
          return;
        };
        session.owner_range = owner;
        if !quiet {
          // An explicit invocation on a quiet session promotes it to a
          // regular one.
          session.single_parameter_mode = false;
        }
        id
      },
      None => self.create_session(editor_id, owner, quiet),
    };
    if let Some(session) = self.registry.get(session_id) {
      session.schedule_immediate();
    }
  }

  fn create_session(&mut self, editor: EditorId, owner: TextRange, quiet: bool) -> SessionId {
    let quiet_period = self.config.quiet_period();
    let tx = self.message_tx.clone();
    let id = self.registry.insert(editor, |id| {
      let scheduler = UpdateScheduler::new(editor, id, quiet_period, tx).spawn();
      HintSession::new(id, editor, owner, scheduler, quiet, quiet)
    });
    log::debug!(
      "hint session {id:?} created at offset {} in editor {editor}",
      owner.start
    );
    id
  }

  fn document_changed(&mut self, editor: &mut dyn EditorModel, edits: &[TextEdit]) {
    let ids = self.registry.editor_sessions(editor.id()).to_vec();
    for id in ids {
      let Some(session) = self.registry.get_mut(id) else {
        continue;
      };
      if !edits.is_empty() {
        session.owner_range = range::map_range(edits, session.owner_range);
      }
      session.schedule();
    }
  }

  fn caret_moved(&mut self, editor: &mut dyn EditorModel) {
    let caret = editor.caret();
    let ids = self.registry.editor_sessions(editor.id()).to_vec();
    for id in ids {
      let Some(session) = self.registry.get(id) else {
        continue;
      };
      // The highlight follows the caret immediately; candidates refresh
      // after the quiet window. Whether the caret left the list is decided
      // there too, once things settle.
      if session.is_visible() && navigation::caret_inside(session.owner_range(), caret) {
        self.refresh_highlight(editor, id);
      }
      if let Some(session) = self.registry.get(id) {
        session.schedule();
      }
    }
  }

  fn scrolled(&mut self, editor: &mut dyn EditorModel) {
    let ids = self.registry.editor_sessions(editor.id()).to_vec();
    for id in ids {
      let Some(session) = self.registry.get_mut(id) else {
        continue;
      };
      if !session.is_visible() {
        continue;
      }
      // The placement memo is keyed by document offset alone, so a scroll
      // has to drop it before re-anchoring.
      session.selector.invalidate();
      self.present(editor, id);
    }
  }

  fn external_changed(&mut self, editor: &mut dyn EditorModel, anchor: Option<usize>) {
    let ids = self.registry.editor_sessions(editor.id()).to_vec();
    for id in ids {
      let Some(session) = self.registry.get(id) else {
        continue;
      };
      if anchor.is_none_or(|offset| offset == session.anchor()) {
        // Signals from outside the editor (a completion list changing its
        // selection, a provider reloading) skip the quiet window.
        session.schedule_immediate();
      }
    }
  }

  fn editor_closed(&mut self, editor: EditorId) {
    let ids = self.registry.editor_sessions(editor).to_vec();
    let count = ids.len();
    for id in ids {
      self.dispose_session(editor, id);
    }
    self.inbox.retain(|message| message.editor() != editor);
    if count > 0 {
      log::debug!("editor {editor} closed, disposed {count} hint sessions");
    }
  }

  /// A session's quiet window elapsed: re-resolve its owner and kick off a
  /// signature computation.
  fn fire_update(&mut self, editor: &mut dyn EditorModel, id: SessionId) {
    let Some(session) = self.registry.get(id) else {
      return;
    };
    if session.state() == SessionState::Disposed {
      return;
    }
    let anchor = session.anchor();
    let keep_alive = session.keep_alive;
    let editor_id = editor.id();
    let caret = editor.caret();
    let text = editor.text();
    let probe = self.lookup_offset(text.slice(..), caret);
    let owner = owner_with_anchor(self.handler.as_ref(), text.slice(..), probe, anchor);
    let Some(owner) = owner else {
      // The caret left the list, or the list itself is gone.
      if keep_alive {
        self.hide_session(editor_id, id);
      } else {
        self.dispose_session(editor_id, id);
      }
      return;
    };
    let snapshot = ContextSnapshot {
      caret,
      version: editor.version(),
      focused: editor.has_focus(),
    };
    let text = text.clone();
    let Some(session) = self.registry.get_mut(id) else {
      return;
    };
    session.owner_range = owner;
    let (generation, handle) = session.begin_computation(snapshot);
    self.spawn_computation(editor_id, id, generation, handle, text, owner, caret);
  }

  fn spawn_computation(
    &self,
    editor: EditorId,
    session: SessionId,
    generation: u64,
    handle: TaskHandle,
    text: Rope,
    owner: TextRange,
    caret: usize,
  ) {
    let handler = Arc::clone(&self.handler);
    let tx = self.message_tx.clone();
    let slow_tx = self.message_tx.clone();
    let slow_delay = self.config.slow_hint_delay();
    let worker_handle = handle.clone();
    let work = async move {
      let lookup = tokio::task::spawn_blocking(move || {
        let cx = LookupContext {
          text: text.slice(..),
          owner,
          caret,
          cancel: &worker_handle,
        };
        handler.signatures(&cx)
      });
      let outcome = match lookup.await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(anyhow::anyhow!("signature lookup panicked: {join_error}")),
      };
      let _ = tx.send(EngineMessage::ComputationDone {
        editor,
        session,
        generation,
        outcome,
      });
    };
    let guarded = async move {
      let mut work = pin!(work);
      if tokio::time::timeout(slow_delay, work.as_mut()).await.is_err() {
        let _ = slow_tx.send(EngineMessage::ComputationSlow {
          editor,
          session,
          generation,
        });
        work.await;
      }
    };
    tokio::spawn(cancelable_future(guarded, handle));
  }

  fn apply_outcome(
    &mut self,
    editor: &mut dyn EditorModel,
    id: SessionId,
    generation: u64,
    outcome: anyhow::Result<SignatureSet>,
  ) -> Result<(), HintError> {
    let Some(session) = self.registry.get_mut(id) else {
      return Ok(());
    };
    match session.inflight {
      Some(ref inflight) if inflight.generation == generation => {},
      _ => {
        log::debug!("dropping superseded signature result for session {id:?}");
        return Ok(());
      },
    }
    let Some(inflight) = session.inflight.take() else {
      return Ok(());
    };
    let snapshot = inflight.snapshot;
    let owner = session.owner_range();
    let keep_alive = session.keep_alive;
    let single = session.single_parameter_mode;
    let anchor = session.anchor();
    let editor_id = editor.id();

    // The world may have moved on while the worker ran.
    let fresh = editor.version() == snapshot.version
      && editor.has_focus() == snapshot.focused
      && navigation::caret_inside(owner, editor.caret());
    if !fresh {
      log::debug!("dropping stale signature result for session {id:?}");
      return Ok(());
    }

    let set = match outcome {
      Ok(set) => set,
      Err(error) => {
        log::error!("signature lookup failed for session {id:?}: {error:#}");
        self.conclude_empty(editor_id, id, keep_alive);
        if self.config.propagate_handler_errors {
          return Err(HintError::Lookup {
            offset: anchor,
            error,
          });
        }
        return Ok(());
      },
    };
    if set.is_empty() {
      self.conclude_empty(editor_id, id, keep_alive);
      return Ok(());
    }
    self.publish(editor, id, set, single);
    Ok(())
  }

  fn publish(
    &mut self,
    editor: &mut dyn EditorModel,
    id: SessionId,
    mut set: SignatureSet,
    single: bool,
  ) {
    let caret = editor.caret();
    let delimiter = self.handler.parameter_delimiter();
    let editor_id = editor.id();
    let Some(session) = self.registry.get_mut(id) else {
      return;
    };
    let owner = session.owner_range();
    let index =
      navigation::caret_parameter_index(editor.text().slice(..), owner, delimiter, caret);
    set.set_current_parameter(index);
    // A single-parameter session only surfaces while the match is
    // unambiguous: one candidate (or a resolved one) and a known parameter.
    let known =
      (set.len() == 1 || set.highlighted().is_some()) && set.current_parameter().is_some();
    session.signatures = set;
    if single && !known {
      self.hide_session(editor_id, id);
      return;
    }
    if !self.registry.is_innermost(id, caret) {
      // An enclosing list stays registered but quiet while the caret is
      // inside a nested call.
      self.hide_session(editor_id, id);
      return;
    }
    self.present(editor, id);
  }

  fn computation_slow(&mut self, id: SessionId, generation: u64) {
    let Self {
      registry,
      presenter,
      ..
    } = self;
    let Some(session) = registry.get(id) else {
      return;
    };
    let current = session
      .inflight
      .as_ref()
      .is_some_and(|inflight| inflight.generation == generation);
    if current {
      presenter.computation_slow(session.editor(), id);
    }
  }

  /// Cheap caret-following update of a shown hint: recompute the
  /// highlighted parameter and the anchor without a new signature lookup.
  fn refresh_highlight(&mut self, editor: &mut dyn EditorModel, id: SessionId) {
    let delimiter = self.handler.parameter_delimiter();
    let caret = editor.caret();
    let Some(session) = self.registry.get_mut(id) else {
      return;
    };
    let owner = session.owner_range();
    let index =
      navigation::caret_parameter_index(editor.text().slice(..), owner, delimiter, caret);
    session.signatures.set_current_parameter(index);
    self.present(editor, id);
  }

  /// Lay the hint out, pick its anchor, and hand it to the presenter. Sets
  /// the session state to `Shown`.
  fn present(&mut self, editor: &mut dyn EditorModel, id: SessionId) {
    let Self {
      registry,
      presenter,
      config,
      ..
    } = self;
    let Some(session) = registry.get_mut(id) else {
      return;
    };
    if session.signatures.is_empty() {
      return;
    }
    let display = display::render(&session.signatures, config.max_hint_width);
    let text = editor.text();
    let offset = session.owner_range().shrink(1).clamp_offset(editor.caret());
    let size = HintSize {
      width:  display.width().min(u16::MAX as usize) as u16,
      height: display.height().min(u16::MAX as usize) as u16,
    };
    let viewport = editor.viewport();
    let request = PlacementRequest {
      offset,
      cursor: screen_point(text, offset, viewport),
      size,
      multiline_owner: is_multiline(text, session.owner_range()),
      viewport,
    };
    let anchor = session.selector.choose(request, None);
    session.state = SessionState::Shown;
    presenter.hint_updated(session.editor(), id, &display, anchor);
  }

  /// Take the hint off screen but keep the session registered.
  fn hide_session(&mut self, editor: EditorId, id: SessionId) {
    let Self {
      registry,
      presenter,
      ..
    } = self;
    let Some(session) = registry.get_mut(id) else {
      return;
    };
    if session.state() == SessionState::Shown {
      presenter.hint_hidden(editor, id);
    }
    session.state = SessionState::Hidden;
  }

  fn dispose_session(&mut self, editor: EditorId, id: SessionId) {
    let Some(mut session) = self.registry.remove(id) else {
      return;
    };
    let was_visible = session.is_visible();
    session.dispose();
    if was_visible {
      self.presenter.hint_hidden(editor, id);
    }
    log::debug!("hint session {id:?} disposed");
  }

  /// No candidates (or the lookup failed): hide the hint, and retire the
  /// session entirely unless it is kept alive.
  fn conclude_empty(&mut self, editor: EditorId, id: SessionId, keep_alive: bool) {
    if keep_alive {
      self.hide_session(editor, id);
    } else {
      self.dispose_session(editor, id);
    }
  }

  /// The registered session whose owner the caret is in, resolved the same
  /// way invocation resolves it. Stale sessions found on the way are
  /// disposed.
  fn session_at_caret(&mut self, editor: &mut dyn EditorModel) -> Option<(SessionId, TextRange)> {
    let caret = editor.caret();
    let text = editor.text();
    let probe = self.lookup_offset(text.slice(..), caret);
    let owner = self.handler.find_owner(text.slice(..), probe)?;
    let editor_id = editor.id();
    let (matched, stale) = self.registry.find_at(editor_id, owner.start);
    for id in stale {
      self.dispose_session(editor_id, id);
    }
    matched.map(|id| (id, owner))
  }

  /// Where owner resolution starts: the caret, shifted back over blanks
  /// unless the handler cares about them.
  fn lookup_offset(&self, text: RopeSlice<'_>, caret: usize) -> usize {
    if self.handler.whitespace_sensitive() {
      caret
    } else {
      chars::skip_blanks_back(text, caret)
    }
  }
}

/// Re-resolve the owner of a session pinned to `anchor`, climbing out of
/// nested lists. Probing at a list's opening bracket resolves the next
/// enclosing list, so the walk moves strictly outward until it reaches the
/// anchor or passes it.
fn owner_with_anchor(
  handler: &dyn HintHandler,
  text: RopeSlice<'_>,
  offset: usize,
  anchor: usize,
) -> Option<TextRange> {
  let mut probe = offset;
  loop {
    let owner = handler.find_owner(text, probe)?;
    if owner.start == anchor {
      return Some(owner);
    }
    if owner.start >= probe || owner.start < anchor {
      // Not making progress, or already outside where the anchored list
      // would have to start.
      return None;
    }
    probe = owner.start;
  }
}

/// Screen cell of a document offset, clamped into the viewport so hints
/// stay on screen even when the owner scrolled past an edge.
fn screen_point(text: &Rope, offset: usize, viewport: Viewport) -> Point {
  let offset = offset.min(text.len_chars());
  let line = text.char_to_line(offset);
  let col = offset - text.line_to_char(line);
  let row = line
    .saturating_sub(viewport.first_line)
    .min(viewport.height.saturating_sub(1) as usize);
  let col = col
    .saturating_sub(viewport.first_col)
    .min(viewport.width.saturating_sub(1) as usize);
  Point {
    col: col as u16,
    row: row as u16,
  }
}

fn is_multiline(text: &Rope, range: TextRange) -> bool {
  if range.is_empty() {
    return false;
  }
  let len = text.len_chars();
  let start = range.start.min(len);
  let last = (range.end - 1).min(len);
  text.char_to_line(start) != text.char_to_line(last)
}
