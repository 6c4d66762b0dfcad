use std::num::NonZeroUsize;

use ropey::Rope;
use the_hints_core::{
  TextEdit,
  Viewport,
};

/// Host-assigned identity of one editor view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EditorId(NonZeroUsize);

impl EditorId {
  pub const fn new(id: NonZeroUsize) -> Self {
    Self(id)
  }

  pub const fn get(self) -> NonZeroUsize {
    self.0
  }
}

impl From<NonZeroUsize> for EditorId {
  fn from(value: NonZeroUsize) -> Self {
    Self::new(value)
  }
}

impl std::fmt::Display for EditorId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// What the engine needs to know about an editor. Implemented by the host;
/// all calls happen on the host's update path, never from worker threads.
pub trait EditorModel {
  fn id(&self) -> EditorId;

  /// Current document content.
  fn text(&self) -> &Rope;

  /// Caret position as a char offset into [`text`](Self::text).
  fn caret(&self) -> usize;

  /// Move the caret. Used by parameter navigation.
  fn move_caret(&mut self, offset: usize);

  /// Monotonic counter the host bumps on every document change. Results
  /// computed against an older version are discarded.
  fn version(&self) -> u64;

  fn has_focus(&self) -> bool;

  /// Visible region, used to place hints near the caret.
  fn viewport(&self) -> Viewport;
}

/// Every trigger source funnels through this one intake.
#[derive(Debug, Clone)]
pub enum EditorEvent {
  /// Explicit parameter-info action at the caret.
  Invoked,
  /// Background invocation that keeps the session alive without forcing the
  /// hint on screen. The hint appears once the current parameter is known.
  InvokedQuiet,
  /// The document changed. Edit coordinates are in pre-change offsets.
  DocumentChanged { edits: Vec<TextEdit> },
  /// The caret moved.
  CaretMoved,
  /// The viewport scrolled or resized.
  Scrolled,
  /// Something outside the document invalidated signature data. `anchor`
  /// narrows the refresh to the session at that offset; `None` refreshes
  /// every session of the editor.
  ExternalChanged { anchor: Option<usize> },
  /// The editor is going away. Tears down all of its sessions.
  Closed,
}
