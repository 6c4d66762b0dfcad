use the_hints_core::{
  HintAnchor,
  HintDisplay,
};

use crate::{
  editor::EditorId,
  registry::SessionId,
};

/// Rendering callbacks. The engine calls these on the update path with
/// already laid out content; the implementation only paints.
pub trait HintPresenter {
  /// Draw (or redraw) the hint for `session` with this content at this
  /// anchor.
  fn hint_updated(
    &mut self,
    editor: EditorId,
    session: SessionId,
    display: &HintDisplay,
    anchor: HintAnchor,
  );

  /// Take the hint for `session` off the screen. The session may come back
  /// with another `hint_updated` later.
  fn hint_hidden(&mut self, editor: EditorId, session: SessionId);

  /// A lookup outlived the slow-hint delay and is still running. Hosts may
  /// show a progress affordance.
  fn computation_slow(&mut self, _editor: EditorId, _session: SessionId) {}
}
