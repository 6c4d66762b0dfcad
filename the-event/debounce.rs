//! Debounced background hooks.
//!
//! An [`AsyncHook`] runs as a tokio task fed by an mpsc channel and owns a
//! single deadline slot: every incoming event may start, extend or drop the
//! pending deadline, and when the deadline passes without further events the
//! hook fires once. That single-slot structure is what coalesces a burst of
//! triggers into one piece of work: there is never a queue of pending
//! timers, only the most recent one.

use std::time::Duration;

use futures_executor::block_on;
use tokio::{
  sync::mpsc::{
    self,
    Sender,
    error::TrySendError,
  },
  time::Instant,
};

/// Per-hook channel depth. Producers outrun the hook only during event
/// storms, and the hook drains continuously, so a small buffer suffices.
const CHANNEL_CAPACITY: usize = 64;

/// How long a producer may block on a full channel before the event is
/// dropped. Losing a debounced trigger is harmless; stalling the caller's
/// interactive thread is not.
const FULL_CHANNEL_BLOCK: Duration = Duration::from_millis(2);

/// A stateful event consumer living on its own tokio task.
///
/// `handle_event` runs for every received event and returns the deadline to
/// wait for (usually "now + quiet period", or the unchanged incoming one to
/// keep an existing deadline running, or `None` after consuming the event
/// directly). `finish_debounce` runs once the deadline elapses quietly.
pub trait AsyncHook: Sync + Send + 'static + Sized {
  type Event: Sync + Send + 'static;

  fn handle_event(
    &mut self,
    event: Self::Event,
    deadline: Option<Instant>,
  ) -> Option<Instant>;

  fn finish_debounce(&mut self);

  /// Move the hook onto a background task and hand back the producer side.
  /// Outside a tokio runtime no task is spawned and events go nowhere,
  /// which keeps hook construction usable from plain unit tests.
  fn spawn(self) -> Sender<Self::Event> {
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    if tokio::runtime::Handle::try_current().is_ok() {
      tokio::spawn(run(self, rx));
    }
    tx
  }
}

async fn run<H: AsyncHook>(mut hook: H, mut rx: mpsc::Receiver<H::Event>) {
  let mut deadline: Option<Instant> = None;
  loop {
    match deadline {
      Some(at) => match tokio::time::timeout_at(at, rx.recv()).await {
        Ok(Some(event)) => deadline = hook.handle_event(event, deadline),
        Ok(None) => break,
        Err(_) => {
          deadline = None;
          hook.finish_debounce();
        },
      },
      None => match rx.recv().await {
        Some(event) => deadline = hook.handle_event(event, None),
        None => break,
      },
    }
  }
}

/// Send from synchronous code, preferring to drop the event over stalling.
///
/// Tries a non-blocking send first; on a full channel it blocks for at most
/// [`FULL_CHANNEL_BLOCK`] and then gives up. Sends to a closed channel are
/// logged and dropped; the receiving hook is gone, so there is nobody left
/// to care.
pub fn send_blocking<T>(tx: &Sender<T>, event: T) {
  match tx.try_send(event) {
    Ok(()) => {},
    Err(TrySendError::Full(event)) => {
      let _ = block_on(tx.send_timeout(event, FULL_CHANNEL_BLOCK));
    },
    Err(TrySendError::Closed(_)) => {
      log::warn!("dropping event for a closed hook channel");
    },
  }
}

/// Non-blocking send. Returns whether the event was accepted.
pub fn try_send<T>(tx: &Sender<T>, event: T) -> bool {
  tx.try_send(event).is_ok()
}
