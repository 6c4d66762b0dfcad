use anyhow::Result;
use ropey::RopeSlice;
use the_hints_core::{
  SignatureSet,
  TextRange,
};
use the_hints_event::TaskHandle;

/// Everything a lookup gets to work with. `text` is a point-in-time copy of
/// the document, so the lookup never races edits made while it runs.
pub struct LookupContext<'a> {
  pub text:   RopeSlice<'a>,
  /// The argument list being described.
  pub owner:  TextRange,
  /// Caret offset at the time the computation started.
  pub caret:  usize,
  /// Cooperative cancellation. Long lookups should poll
  /// [`is_canceled`](TaskHandle::is_canceled) between expensive steps.
  pub cancel: &'a TaskHandle,
}

/// Language-specific knowledge the engine is parameterized over. One
/// handler serves every editor and session, so implementations must be
/// `Send + Sync`.
pub trait HintHandler: Send + Sync + 'static {
  /// The innermost argument list enclosing `offset`, if any. Called on the
  /// update path; must be cheap.
  fn find_owner(&self, text: RopeSlice<'_>, offset: usize) -> Option<TextRange>;

  /// Enumerate signature candidates for `cx.owner`. Runs on a worker
  /// thread and may block.
  fn signatures(&self, cx: &LookupContext<'_>) -> Result<SignatureSet>;

  /// Spans of the arguments currently written inside `owner`, in order.
  /// Called on the update path; must be cheap.
  fn actual_parameters(&self, text: RopeSlice<'_>, owner: TextRange) -> Vec<TextRange>;

  /// The character separating arguments. `None` means arguments are
  /// whitespace-delimited.
  fn parameter_delimiter(&self) -> Option<char> {
    Some(',')
  }

  /// Whether blanks next to the caret are significant when re-resolving the
  /// owner. When `false` the engine shifts the caret back over spaces and
  /// tabs first, so a caret hovering after `foo(a, ` still resolves `foo`.
  fn whitespace_sensitive(&self) -> bool {
    false
  }
}
