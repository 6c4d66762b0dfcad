use std::collections::HashMap;

use slotmap::HopSlotMap;

use crate::{
  editor::EditorId,
  session::{
    HintSession,
    SessionState,
  },
};

slotmap::new_key_type! {
  /// Stable identity of one hint session. Stays unique even after the slot
  /// is reused.
  pub struct SessionId;
}

type EditorMap<V> = HashMap<EditorId, V, foldhash::fast::RandomState>;

/// All live sessions, grouped per editor. Owned by the engine; every
/// mutation happens on the update path.
#[derive(Default)]
pub struct SessionRegistry {
  sessions:  HopSlotMap<SessionId, HintSession>,
  by_editor: EditorMap<Vec<SessionId>>,
}

impl SessionRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.sessions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sessions.is_empty()
  }

  /// Sessions of one editor, in creation order.
  pub fn editor_sessions(&self, editor: EditorId) -> &[SessionId] {
    self
      .by_editor
      .get(&editor)
      .map(Vec::as_slice)
      .unwrap_or_default()
  }

  pub fn get(&self, id: SessionId) -> Option<&HintSession> {
    self.sessions.get(id)
  }

  pub(crate) fn get_mut(&mut self, id: SessionId) -> Option<&mut HintSession> {
    self.sessions.get_mut(id)
  }

  pub fn state(&self, id: SessionId) -> Option<SessionState> {
    self.sessions.get(id).map(HintSession::state)
  }

  pub(crate) fn insert(
    &mut self,
    editor: EditorId,
    build: impl FnOnce(SessionId) -> HintSession,
  ) -> SessionId {
    let id = self.sessions.insert_with_key(build);
    self.by_editor.entry(editor).or_default().push(id);
    id
  }

  pub(crate) fn remove(&mut self, id: SessionId) -> Option<HintSession> {
    let session = self.sessions.remove(id)?;
    if let Some(list) = self.by_editor.get_mut(&session.editor()) {
      list.retain(|&other| other != id);
      if list.is_empty() {
        self.by_editor.remove(&session.editor());
      }
    }
    Some(session)
  }

  /// Look up the session anchored at `offset`. Dead matches, sessions that
  /// are neither visible nor kept alive, are not returned; they come back
  /// in `stale` for the caller to dispose. Cleanup rides along on lookups
  /// instead of having its own sweep.
  pub(crate) fn find_at(
    &self,
    editor: EditorId,
    offset: usize,
  ) -> (Option<SessionId>, Vec<SessionId>) {
    let mut stale = Vec::new();
    for &id in self.editor_sessions(editor) {
      let Some(session) = self.sessions.get(id) else {
        continue;
      };
      if session.anchor() != offset {
        continue;
      }
      if session.is_visible() || session.keep_alive {
        return (Some(id), stale);
      }
      stale.push(id);
    }
    (None, stale)
  }

  /// Whether no other session of the same editor tracks a list nested
  /// strictly inside this one at `offset`. Hints of enclosing lists stay
  /// quiet while the caret is in a nested call.
  pub fn is_innermost(&self, id: SessionId, offset: usize) -> bool {
    let Some(session) = self.sessions.get(id) else {
      return false;
    };
    for &other_id in self.editor_sessions(session.editor()) {
      if other_id == id {
        continue;
      }
      let Some(other) = self.sessions.get(other_id) else {
        continue;
      };
      let range = other.owner_range();
      if range != session.owner_range()
        && range.contains(offset)
        && session.owner_range().contains_range(range)
      {
        return false;
      }
    }
    true
  }
}
