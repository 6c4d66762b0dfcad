use the_hints_core::{
  PositionSelector,
  SignatureSet,
  TextRange,
};
use the_hints_event::{
  TaskController,
  TaskHandle,
  send_blocking,
};
use tokio::sync::mpsc::Sender;

use crate::{
  editor::EditorId,
  registry::SessionId,
  scheduler::ScheduleEvent,
};

/// Lifecycle of one hint session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
  /// Created, first computation not finished yet.
  #[default]
  Uninitialized,
  /// First computation in flight.
  Computing,
  /// Hint on screen.
  Shown,
  /// Hint off screen but the session remains registered.
  Hidden,
  /// Torn down. Terminal.
  Disposed,
}

/// Editor state captured when a computation starts. Results are discarded
/// when any of it no longer matches at publish time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContextSnapshot {
  pub caret:   usize,
  pub version: u64,
  pub focused: bool,
}

/// An in-flight computation. `generation` ties worker messages back to the
/// launch they belong to; anything older is ignored.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Inflight {
  pub generation: u64,
  pub snapshot:   ContextSnapshot,
}

/// One tracked argument list in one editor. Owned by the registry; all
/// mutation happens on the update path.
pub struct HintSession {
  pub(crate) id:                    SessionId,
  pub(crate) editor:                EditorId,
  /// Span of the argument list, kept in step with document edits. Its
  /// start is the anchor the session is registered under.
  pub(crate) owner_range:           TextRange,
  /// Survives the hint being hidden instead of being disposed.
  pub(crate) keep_alive:            bool,
  /// Show the hint only while the current parameter is unambiguous.
  pub(crate) single_parameter_mode: bool,
  pub(crate) state:                 SessionState,
  pub(crate) signatures:            SignatureSet,
  pub(crate) selector:              PositionSelector,
  scheduler:                        Sender<ScheduleEvent>,
  controller:                       TaskController,
  request_generation:               u64,
  pub(crate) inflight:              Option<Inflight>,
}

impl HintSession {
  pub(crate) fn new(
    id: SessionId,
    editor: EditorId,
    owner_range: TextRange,
    scheduler: Sender<ScheduleEvent>,
    keep_alive: bool,
    single_parameter_mode: bool,
  ) -> Self {
    Self {
      id,
      editor,
      owner_range,
      keep_alive,
      single_parameter_mode,
      state: SessionState::default(),
      signatures: SignatureSet::default(),
      selector: PositionSelector::default(),
      scheduler,
      controller: TaskController::new(),
      request_generation: 0,
      inflight: None,
    }
  }

  pub fn id(&self) -> SessionId {
    self.id
  }

  pub fn editor(&self) -> EditorId {
    self.editor
  }

  /// Offset of the opening bracket this session is pinned to.
  pub fn anchor(&self) -> usize {
    self.owner_range.start
  }

  pub fn owner_range(&self) -> TextRange {
    self.owner_range
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  pub fn is_visible(&self) -> bool {
    self.state == SessionState::Shown
  }

  /// A session that already produced a hint and is recomputing it.
  pub fn is_updating(&self) -> bool {
    matches!(self.state, SessionState::Shown | SessionState::Hidden) && self.inflight.is_some()
  }

  pub fn signatures(&self) -> &SignatureSet {
    &self.signatures
  }

  /// Ask for a recomputation after the quiet window.
  pub(crate) fn schedule(&self) {
    send_blocking(&self.scheduler, ScheduleEvent::Debounced);
  }

  /// Ask for a recomputation right away.
  pub(crate) fn schedule_immediate(&self) {
    send_blocking(&self.scheduler, ScheduleEvent::Immediate);
  }

  /// Cancel whatever is in flight and start a new computation generation.
  pub(crate) fn begin_computation(&mut self, snapshot: ContextSnapshot) -> (u64, TaskHandle) {
    let handle = self.controller.restart();
    self.request_generation += 1;
    self.inflight = Some(Inflight {
      generation: self.request_generation,
      snapshot,
    });
    if self.state == SessionState::Uninitialized {
      self.state = SessionState::Computing;
    }
    (self.request_generation, handle)
  }

  /// Tear the session down. The scheduler hook exits once `self` (and with
  /// it the sender) is dropped.
  pub(crate) fn dispose(&mut self) {
    self.controller.cancel();
    self.inflight = None;
    self.state = SessionState::Disposed;
  }
}
