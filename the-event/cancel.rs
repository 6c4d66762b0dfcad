//! Generation-based cooperative cancellation.
//!
//! A [`TaskController`] hands out one [`TaskHandle`] per started task and
//! cancels every previous handle the moment a new one is issued, so
//! "restart" and "cancel the predecessor" are a single atomic step.
//! Cancellation is cooperative on both levels: futures race the handle via
//! [`cancelable_future`], and blocking code polls [`TaskHandle::is_canceled`]
//! between units of work.

use std::{
  borrow::Borrow,
  future::Future,
  sync::{
    Arc,
    atomic::{
      AtomicU64,
      Ordering::Relaxed,
    },
  },
};

use tokio::sync::Notify;

/// Packed controller state: generation in the high bits, a running flag in
/// bit 0. One atomic keeps "bump the generation" and "flip the flag" from
/// racing each other.
#[derive(Debug, Default)]
struct Shared {
  state:  AtomicU64,
  notify: Notify,
}

const RUNNING: u64 = 1;

impl Shared {
  fn generation(&self) -> u64 {
    self.state.load(Relaxed) >> 1
  }

  fn is_running(&self) -> bool {
    self.state.load(Relaxed) & RUNNING != 0
  }
}

/// Owner side: issues handles and supersedes them.
#[derive(Debug, Default)]
pub struct TaskController {
  shared: Arc<Shared>,
}

impl TaskController {
  pub fn new() -> Self {
    TaskController::default()
  }

  /// Cancel whatever ran under the previous handle and return a fresh one.
  pub fn restart(&mut self) -> TaskHandle {
    let prev = self
      .shared
      .state
      .fetch_update(Relaxed, Relaxed, |state| {
        Some((((state >> 1) + 1) << 1) | RUNNING)
      })
      .unwrap_or_default();
    self.shared.notify.notify_waiters();
    TaskHandle {
      generation: (prev >> 1) + 1,
      shared:     Arc::clone(&self.shared),
    }
  }

  /// Cancel the current handle without issuing a new one. Returns whether
  /// a task was still running.
  pub fn cancel(&mut self) -> bool {
    let prev = self
      .shared
      .state
      .fetch_update(Relaxed, Relaxed, |state| Some(((state >> 1) + 1) << 1))
      .unwrap_or_default();
    self.shared.notify.notify_waiters();
    prev & RUNNING != 0
  }

  /// Whether the task behind the most recent handle is still going.
  pub fn is_running(&self) -> bool {
    self.shared.is_running()
  }
}

/// Task side: checked (or awaited) to find out the task was superseded.
#[derive(Debug, Clone)]
pub struct TaskHandle {
  generation: u64,
  shared:     Arc<Shared>,
}

impl TaskHandle {
  pub fn is_canceled(&self) -> bool {
    self.shared.generation() != self.generation
  }

  /// Resolves once this handle is canceled. Registers with the notifier
  /// before re-checking so a cancel between the check and the await cannot
  /// be lost.
  pub async fn canceled(&self) {
    loop {
      let notified = self.shared.notify.notified();
      if self.is_canceled() {
        return;
      }
      notified.await;
    }
  }

  /// Clear the running flag, but only while this handle is still current.
  fn finish(&self) {
    let _ = self.shared.state.fetch_update(Relaxed, Relaxed, |state| {
      (state >> 1 == self.generation).then_some(state & !RUNNING)
    });
  }
}

/// Run `future` until it completes or `handle` is canceled, whichever comes
/// first. Returns `None` on cancellation.
pub async fn cancelable_future<T>(
  future: impl Future<Output = T>,
  handle: impl Borrow<TaskHandle>,
) -> Option<T> {
  let handle = handle.borrow();
  tokio::select! {
    biased;
    _ = handle.canceled() => None,
    result = future => {
      handle.finish();
      Some(result)
    },
  }
}
