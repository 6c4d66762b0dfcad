pub mod chars;
pub mod display;
pub mod position;
pub mod range;
pub mod signature;

pub use display::{
  DisplayLine,
  HintDisplay,
  SignatureDisplay,
  render,
};
pub use position::{
  HintAnchor,
  HintSide,
  HintSize,
  PlacementRequest,
  Point,
  PositionSelector,
  Viewport,
};
pub use range::{
  Assoc,
  TextEdit,
  TextRange,
};
pub use signature::{
  FragmentStyle,
  Signature,
  SignatureBuilder,
  SignatureSet,
  TextFragment,
};
