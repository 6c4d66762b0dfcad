//! Debounced parameter hints for editors.
//!
//! The engine tracks one session per argument list the user is working in,
//! recomputes signature candidates off-thread after a quiet window, and
//! publishes results only while they still describe the world they were
//! computed against. Hosts plug in three traits: [`EditorModel`] says what
//! an editor looks like, [`HintHandler`] supplies language knowledge, and
//! [`HintPresenter`] paints whatever the engine decides to show.
//!
//! Wiring is intentionally small: construct a [`HintEngine`], forward
//! editor activity as [`EditorEvent`]s, and call
//! [`pump`](HintEngine::pump) once per update tick. Parameter navigation
//! and overload cycling are plain engine calls hosts bind to keys.

pub mod config;
pub mod editor;
pub mod engine;
pub mod handler;
pub mod navigation;
pub mod presenter;
pub mod registry;
mod scheduler;
pub mod session;

pub use config::HintConfig;
pub use editor::{
  EditorEvent,
  EditorId,
  EditorModel,
};
pub use engine::{
  HintEngine,
  HintError,
};
pub use handler::{
  HintHandler,
  LookupContext,
};
pub use navigation::Direction;
pub use presenter::HintPresenter;
pub use registry::{
  SessionId,
  SessionRegistry,
};
pub use session::SessionState;
// The building blocks handlers and presenters trade in.
pub use the_hints_core::{
  FragmentStyle,
  HintAnchor,
  HintDisplay,
  HintSide,
  Signature,
  SignatureBuilder,
  SignatureSet,
  TextEdit,
  TextFragment,
  TextRange,
  Viewport,
};
