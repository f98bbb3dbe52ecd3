// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Placement names and their decomposition into a primary edge and a secondary alignment.
//!
//! A [`Placement`] is one of twelve compass-like positions. Each decomposes into an
//! [`Edge`] (which side of the anchor the panel sits on) and an optional [`Alignment`]
//! (which side of the anchor the panel is flushed to instead of being centered).
//!
//! ```
//! use understory_popper::placement::{Alignment, Edge, Placement};
//!
//! let p = Placement::parse("bottomLeft");
//! assert_eq!(p, Placement::BottomLeft);
//! assert_eq!(p.edge(), Edge::Bottom);
//! assert_eq!(p.alignment(), Some(Alignment::Left));
//!
//! // Unknown alignments degrade to the centered variant of the same edge.
//! assert_eq!(Placement::parse("leftMiddle"), Placement::Left);
//! ```

use core::fmt;

/// The side of the anchor a panel is placed on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Above the anchor.
    Top,
    /// Below the anchor.
    Bottom,
    /// Left of the anchor.
    Left,
    /// Right of the anchor.
    Right,
}

impl Edge {
    /// Returns `true` for [`Edge::Top`] and [`Edge::Bottom`].
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    /// The opposite edge.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Secondary alignment along the cross axis of an [`Edge`].
///
/// `Left`/`Top` pin the panel's starting edge, `Right`/`Bottom` its trailing edge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Flush to the top of the anchor (side placements).
    Top,
    /// Flush to the bottom of the anchor (side placements).
    Bottom,
    /// Flush to the left of the anchor (vertical placements).
    Left,
    /// Flush to the right of the anchor (vertical placements).
    Right,
}

impl Alignment {
    /// Returns `true` when the alignment pins the starting edge (`Left` or `Top`).
    #[must_use]
    pub const fn is_start(self) -> bool {
        matches!(self, Self::Left | Self::Top)
    }
}

/// A requested or resolved panel placement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Above, centered.
    #[default]
    Top,
    /// Below, centered.
    Bottom,
    /// Left, centered.
    Left,
    /// Right, centered.
    Right,
    /// Above, flush left.
    TopLeft,
    /// Above, flush right.
    TopRight,
    /// Right, flush top.
    RightTop,
    /// Right, flush bottom.
    RightBottom,
    /// Below, flush right.
    BottomRight,
    /// Below, flush left.
    BottomLeft,
    /// Left, flush bottom.
    LeftBottom,
    /// Left, flush top.
    LeftTop,
}

impl Placement {
    /// Every placement in the canonical fallback order.
    pub const ALL: [Self; 12] = [
        Self::Top,
        Self::Bottom,
        Self::Left,
        Self::Right,
        Self::TopLeft,
        Self::TopRight,
        Self::RightTop,
        Self::RightBottom,
        Self::BottomRight,
        Self::BottomLeft,
        Self::LeftBottom,
        Self::LeftTop,
    ];

    /// Builds a placement from its parts.
    ///
    /// An alignment that does not apply to `edge` (for example `Top` on a vertical edge)
    /// is dropped and the centered placement is returned.
    #[must_use]
    pub const fn from_parts(edge: Edge, alignment: Option<Alignment>) -> Self {
        match (edge, alignment) {
            (Edge::Top, Some(Alignment::Left)) => Self::TopLeft,
            (Edge::Top, Some(Alignment::Right)) => Self::TopRight,
            (Edge::Top, _) => Self::Top,
            (Edge::Bottom, Some(Alignment::Left)) => Self::BottomLeft,
            (Edge::Bottom, Some(Alignment::Right)) => Self::BottomRight,
            (Edge::Bottom, _) => Self::Bottom,
            (Edge::Left, Some(Alignment::Top)) => Self::LeftTop,
            (Edge::Left, Some(Alignment::Bottom)) => Self::LeftBottom,
            (Edge::Left, _) => Self::Left,
            (Edge::Right, Some(Alignment::Top)) => Self::RightTop,
            (Edge::Right, Some(Alignment::Bottom)) => Self::RightBottom,
            (Edge::Right, _) => Self::Right,
        }
    }

    /// Parses a camel-case placement name such as `"rightBottom"`.
    ///
    /// Parsing never fails: an unrecognized alignment suffix yields the centered
    /// placement for the recognized edge, and an unrecognized edge yields [`Placement::Top`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let (edge, rest) = if let Some(rest) = name.strip_prefix("top") {
            (Edge::Top, rest)
        } else if let Some(rest) = name.strip_prefix("bottom") {
            (Edge::Bottom, rest)
        } else if let Some(rest) = name.strip_prefix("left") {
            (Edge::Left, rest)
        } else if let Some(rest) = name.strip_prefix("right") {
            (Edge::Right, rest)
        } else {
            return Self::Top;
        };
        let alignment = match rest {
            "Top" => Some(Alignment::Top),
            "Bottom" => Some(Alignment::Bottom),
            "Left" => Some(Alignment::Left),
            "Right" => Some(Alignment::Right),
            _ => None,
        };
        Self::from_parts(edge, alignment)
    }

    /// The canonical camel-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::TopLeft => "topLeft",
            Self::TopRight => "topRight",
            Self::RightTop => "rightTop",
            Self::RightBottom => "rightBottom",
            Self::BottomRight => "bottomRight",
            Self::BottomLeft => "bottomLeft",
            Self::LeftBottom => "leftBottom",
            Self::LeftTop => "leftTop",
        }
    }

    /// The primary edge.
    #[must_use]
    pub const fn edge(self) -> Edge {
        match self {
            Self::Top | Self::TopLeft | Self::TopRight => Edge::Top,
            Self::Bottom | Self::BottomLeft | Self::BottomRight => Edge::Bottom,
            Self::Left | Self::LeftTop | Self::LeftBottom => Edge::Left,
            Self::Right | Self::RightTop | Self::RightBottom => Edge::Right,
        }
    }

    /// The secondary alignment, or `None` when the panel is centered.
    #[must_use]
    pub const fn alignment(self) -> Option<Alignment> {
        match self {
            Self::Top | Self::Bottom | Self::Left | Self::Right => None,
            Self::TopLeft | Self::BottomLeft => Some(Alignment::Left),
            Self::TopRight | Self::BottomRight => Some(Alignment::Right),
            Self::LeftTop | Self::RightTop => Some(Alignment::Top),
            Self::LeftBottom | Self::RightBottom => Some(Alignment::Bottom),
        }
    }

    /// Same alignment on the opposite edge.
    #[must_use]
    pub const fn flip(self) -> Self {
        Self::from_parts(self.edge().opposite(), self.alignment())
    }

    /// Returns `true` if the panel sits above or below the anchor.
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        self.edge().is_vertical()
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
