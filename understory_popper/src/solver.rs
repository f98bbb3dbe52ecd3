// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement solving: pure geometry that positions a panel next to an anchor.
//!
//! ## Usage
//!
//! 1) Measure the anchor (a rectangle, or a pointer position for context menus),
//!    the bounds the panel must stay inside, and the panel's current size.
//! 2) Build a [`FitRequest`] and call [`solve`].
//! 3) Apply [`FitResult::rect`] and use [`FitResult::origin`] as the transform origin
//!    of any scale-based open/close animation.
//!
//! The solver walks [`attempt_order`]: the requested placement, the remaining placements
//! in [`Placement::ALL`] order, and the requested placement once more as a last resort.
//! The first candidate whose rectangle stays inside the bounds wins; if every candidate
//! overflows, the requested placement is returned anyway.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Rect, Size};
//! use understory_popper::placement::Placement;
//! use understory_popper::solver::{Anchor, FitRequest, solve};
//!
//! let request = FitRequest {
//!     anchor: Anchor::Rect(Rect::new(100.0, 10.0, 150.0, 30.0)),
//!     bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
//!     panel: Size::new(120.0, 40.0),
//!     placement: Placement::Top,
//!     offset: 8.0,
//!     size_adaptable: false,
//!     forced: false,
//! };
//!
//! // No room above, so the panel falls through to the next candidate.
//! let fit = solve(&request);
//! assert_eq!(fit.placement, Placement::Bottom);
//! assert_eq!(fit.rect.origin(), kurbo::Point::new(65.0, 38.0));
//! ```

use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;

use crate::placement::{Alignment, Edge, Placement};

/// What the panel is attached to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Anchor {
    /// An element's bounding rectangle.
    Rect(Rect),
    /// A pointer position (context-menu mode).
    ///
    /// The primary edge and alignment then pick the quadrant around the point that the
    /// panel occupies; for example [`Placement::BottomRight`] pins the panel's top-left
    /// corner to the point.
    Point(Point),
}

/// Transform origin as percentages of the panel's width and height.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TransformOrigin {
    /// Horizontal origin, `0.0` (left edge) to `100.0` (right edge).
    pub x: f64,
    /// Vertical origin, `0.0` (top edge) to `100.0` (bottom edge).
    pub y: f64,
}

impl TransformOrigin {
    /// Creates a transform origin from percentages.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Inputs to a single [`solve`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitRequest {
    /// The anchor to position against.
    pub anchor: Anchor,
    /// Bounds the panel should not overflow (viewport or effect container).
    pub bounds: Rect,
    /// Current size of the panel.
    pub panel: Size,
    /// Requested placement.
    pub placement: Placement,
    /// Gap between anchor and panel. Ignored in point mode.
    pub offset: f64,
    /// Force the panel's cross-axis size to match the anchor. Ignored in point mode.
    pub size_adaptable: bool,
    /// Use `placement` as-is without a fallback search.
    pub forced: bool,
}

/// Output of [`solve`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FitResult {
    /// The placement that was chosen.
    pub placement: Placement,
    /// Panel rectangle in the same coordinate space as the inputs.
    pub rect: Rect,
    /// Point on the panel that touches the anchor attachment point.
    pub origin: TransformOrigin,
    /// Whether the chosen rectangle still overflows the bounds.
    pub overflows: bool,
    /// Number of candidates evaluated.
    pub attempts: usize,
}

/// Candidate order for a requested placement.
///
/// The requested placement comes first, then the other eleven in canonical order, then
/// the requested placement again so the search always ends on it.
#[must_use]
pub fn attempt_order(requested: Placement) -> SmallVec<[Placement; 13]> {
    let mut order = SmallVec::new();
    order.push(requested);
    order.extend(Placement::ALL.into_iter().filter(|p| *p != requested));
    order.push(requested);
    order
}

/// Returns `true` if any edge of `rect` lies outside `bounds`.
#[must_use]
pub fn overflows(rect: Rect, bounds: Rect) -> bool {
    rect.x0 < bounds.x0 || rect.y0 < bounds.y0 || rect.x1 > bounds.x1 || rect.y1 > bounds.y1
}

/// Computes the panel rectangle and transform origin for one placement, without testing
/// for overflow.
#[must_use]
pub fn place(
    anchor: Anchor,
    panel: Size,
    placement: Placement,
    offset: f64,
    size_adaptable: bool,
) -> (Rect, TransformOrigin) {
    match anchor {
        Anchor::Rect(anchor) => place_at_rect(anchor, panel, placement, offset, size_adaptable),
        Anchor::Point(point) => place_at_point(point, panel, placement),
    }
}

/// Resolves a placement for `request`.
#[must_use]
pub fn solve(request: &FitRequest) -> FitResult {
    let candidates: SmallVec<[Placement; 13]> = if request.forced {
        SmallVec::from_elem(request.placement, 1)
    } else {
        attempt_order(request.placement)
    };

    let mut attempts = 0;
    let mut last = None;
    for candidate in candidates {
        attempts += 1;
        let (rect, origin) = place(
            request.anchor,
            request.panel,
            candidate,
            request.offset,
            request.size_adaptable,
        );
        let overflowing = overflows(rect, request.bounds);
        let result = FitResult {
            placement: candidate,
            rect,
            origin,
            overflows: overflowing,
            attempts,
        };
        if !overflowing {
            return result;
        }
        last = Some(result);
    }

    // The candidate list is never empty; the last entry is always the requested placement.
    last.unwrap_or_else(|| {
        let (rect, origin) = place(
            request.anchor,
            request.panel,
            request.placement,
            request.offset,
            request.size_adaptable,
        );
        FitResult {
            placement: request.placement,
            rect,
            origin,
            overflows: true,
            attempts,
        }
    })
}

fn cross_percent(alignment: Option<Alignment>) -> f64 {
    match alignment {
        None => 50.0,
        Some(a) if a.is_start() => 0.0,
        Some(_) => 100.0,
    }
}

fn place_at_rect(
    anchor: Rect,
    panel: Size,
    placement: Placement,
    offset: f64,
    size_adaptable: bool,
) -> (Rect, TransformOrigin) {
    let edge = placement.edge();
    let alignment = placement.alignment();
    let mut size = panel;
    if size_adaptable {
        if edge.is_vertical() {
            size.width = anchor.width();
        } else {
            size.height = anchor.height();
        }
    }

    let cross = cross_percent(alignment);
    let (x, y, origin) = match edge {
        Edge::Top | Edge::Bottom => {
            let x = match alignment {
                None => anchor.x0 + (anchor.width() - size.width) / 2.0,
                Some(a) if a.is_start() => anchor.x0,
                Some(_) => anchor.x1 - size.width,
            };
            if edge == Edge::Top {
                (
                    x,
                    anchor.y0 - size.height - offset,
                    TransformOrigin::new(cross, 100.0),
                )
            } else {
                (x, anchor.y1 + offset, TransformOrigin::new(cross, 0.0))
            }
        }
        Edge::Left | Edge::Right => {
            let y = match alignment {
                None => anchor.y0 + (anchor.height() - size.height) / 2.0,
                Some(a) if a.is_start() => anchor.y0,
                Some(_) => anchor.y1 - size.height,
            };
            if edge == Edge::Left {
                (
                    anchor.x0 - size.width - offset,
                    y,
                    TransformOrigin::new(100.0, cross),
                )
            } else {
                (anchor.x1 + offset, y, TransformOrigin::new(0.0, cross))
            }
        }
    };
    (Rect::from_origin_size((x, y), size), origin)
}

fn place_at_point(point: Point, panel: Size, placement: Placement) -> (Rect, TransformOrigin) {
    // In point mode the alignment names the direction the panel extends from the point,
    // so a trailing alignment (`Right`/`Bottom`) puts the point on the panel's start edge.
    let edge = placement.edge();
    let alignment = placement.alignment();
    let extend_percent = match alignment {
        None => 50.0,
        Some(a) if a.is_start() => 100.0,
        Some(_) => 0.0,
    };
    let (x_percent, y_percent) = match edge {
        Edge::Top => (extend_percent, 100.0),
        Edge::Bottom => (extend_percent, 0.0),
        Edge::Left => (100.0, extend_percent),
        Edge::Right => (0.0, extend_percent),
    };
    let x = point.x - panel.width * x_percent / 100.0;
    let y = point.y - panel.height * y_percent / 100.0;
    (
        Rect::from_origin_size((x, y), panel),
        TransformOrigin::new(x_percent, y_percent),
    )
}
