use std::time::Duration;

use the_hints_event::AsyncHook;
use tokio::{
  sync::mpsc::UnboundedSender,
  time::Instant,
};

use crate::{
  editor::EditorId,
  engine::EngineMessage,
  registry::SessionId,
};

/// Input to a session's scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScheduleEvent {
  /// Start (or push back) the quiet window.
  Debounced,
  /// Skip the quiet window and fire now.
  Immediate,
}

/// Per-session debounce hook. Coalesces triggers into a single
/// [`EngineMessage::ScheduleFire`] once the quiet window elapses; each new
/// trigger replaces the pending deadline. Dropping the session's sender
/// shuts the hook down.
pub(crate) struct UpdateScheduler {
  editor:  EditorId,
  session: SessionId,
  quiet:   Duration,
  tx:      UnboundedSender<EngineMessage>,
}

impl UpdateScheduler {
  pub fn new(
    editor: EditorId,
    session: SessionId,
    quiet: Duration,
    tx: UnboundedSender<EngineMessage>,
  ) -> Self {
    Self {
      editor,
      session,
      quiet,
      tx,
    }
  }
}

impl AsyncHook for UpdateScheduler {
  type Event = ScheduleEvent;

  fn handle_event(&mut self, event: ScheduleEvent, _deadline: Option<Instant>) -> Option<Instant> {
    match event {
      ScheduleEvent::Debounced => Some(Instant::now() + self.quiet),
      ScheduleEvent::Immediate => {
        self.finish_debounce();
        None
      },
    }
  }

  fn finish_debounce(&mut self) {
    let _ = self.tx.send(EngineMessage::ScheduleFire {
      editor:  self.editor,
      session: self.session,
    });
  }
}
