//! Hint anchoring: given where the caret sits on screen and how big the
//! rendered hint is, pick the side and top-left cell to pin the hint to.
//!
//! The selector memoizes its last choice by caret offset so repeated
//! re-renders at the same spot never flip the hint between sides.

use serde::{
  Deserialize,
  Serialize,
};

/// A screen position in cells, relative to the viewport origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
  pub col: u16,
  pub row: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintSize {
  pub width:  u16,
  pub height: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintSide {
  Above,
  Below,
}

/// Where the presentation layer should pin the hint: the top-left cell of
/// the overlay plus which side of the caret line it ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintAnchor {
  pub point: Point,
  pub side:  HintSide,
}

/// The visible slice of a document, in cells plus scroll position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
  pub width:      u16,
  pub height:     u16,
  /// Topmost visible document line.
  pub first_line: usize,
  /// Leftmost visible column.
  pub first_col:  usize,
}

/// Inputs for one placement decision.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest {
  /// The document offset the hint is anchored to (already clamped inside
  /// the owner brackets). Memo key.
  pub offset:          usize,
  /// Screen cell of that offset.
  pub cursor:          Point,
  pub size:            HintSize,
  /// A multi-line owner pins the hint above so it never covers the call.
  pub multiline_owner: bool,
  pub viewport:        Viewport,
}

#[derive(Debug, Default)]
pub struct PositionSelector {
  memo: Option<(usize, HintAnchor)>,
}

impl PositionSelector {
  pub fn new() -> Self {
    PositionSelector::default()
  }

  /// Forget the memoized choice. Call when the viewport scrolls or
  /// resizes, since the memo is keyed by offset alone.
  pub fn invalidate(&mut self) {
    self.memo = None;
  }

  /// Pick `(point, side)` for the request, preferring `preferred` (or the
  /// previously chosen side) as long as it keeps the hint inside the
  /// viewport.
  pub fn choose(
    &mut self,
    request: PlacementRequest,
    preferred: Option<HintSide>,
  ) -> HintAnchor {
    if let Some((offset, anchor)) = self.memo {
      if offset == request.offset {
        return anchor;
      }
    }

    let preferred = preferred
      .or(self.memo.map(|(_, anchor)| anchor.side))
      .unwrap_or(HintSide::Above);
    let side = pick_side(&request, preferred);
    let anchor = HintAnchor {
      point: anchor_point(&request, side),
      side,
    };
    self.memo = Some((request.offset, anchor));
    anchor
  }
}

fn pick_side(request: &PlacementRequest, preferred: HintSide) -> HintSide {
  if request.multiline_owner {
    return HintSide::Above;
  }
  let above_ok = fits(request, HintSide::Above);
  let below_ok = fits(request, HintSide::Below);
  match preferred {
    HintSide::Above if above_ok => HintSide::Above,
    HintSide::Below if below_ok => HintSide::Below,
    _ if above_ok => HintSide::Above,
    _ if below_ok => HintSide::Below,
    // Neither fits: take whichever side has more room.
    _ => {
      let above_space = request.cursor.row;
      let below_space = request
        .viewport
        .height
        .saturating_sub(request.cursor.row + 1);
      if above_space >= below_space {
        HintSide::Above
      } else {
        HintSide::Below
      }
    },
  }
}

fn fits(request: &PlacementRequest, side: HintSide) -> bool {
  match side {
    HintSide::Above => request.cursor.row >= request.size.height,
    HintSide::Below => {
      request.cursor.row + 1 + request.size.height <= request.viewport.height
    },
  }
}

fn anchor_point(request: &PlacementRequest, side: HintSide) -> Point {
  let col = request
    .cursor
    .col
    .min(request.viewport.width.saturating_sub(request.size.width));
  let row = match side {
    HintSide::Above => request.cursor.row.saturating_sub(request.size.height),
    HintSide::Below => {
      let below = request.cursor.row + 1;
      if below + request.size.height > request.viewport.height {
        request.viewport.height.saturating_sub(request.size.height)
      } else {
        below
      }
    },
  };
  Point { col, row }
}
