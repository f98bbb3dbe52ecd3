// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entry transform staging for scale-based open animations.
//!
//! Opening a panel is a two-step affair: the host first commits the resolved geometry
//! with a collapsed [`StagedTransform`], then on the next animation frame switches to
//! [`StagedTransform::IDENTITY`] so the renderer interpolates between the two, growing
//! from the solver's transform origin.

use kurbo::Affine;

use crate::placement::Placement;
use crate::solver::TransformOrigin;

/// Shape of the entry animation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Scale both axes from the transform origin.
    #[default]
    Zoom,
    /// Scale only along the placement's primary axis.
    Collapse,
}

/// Per-axis scale applied to the panel around its transform origin.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StagedTransform {
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
}

impl StagedTransform {
    /// Fully expanded.
    pub const IDENTITY: Self = Self {
        scale_x: 1.0,
        scale_y: 1.0,
    };

    /// The collapsed state a panel starts from before its first visible frame.
    #[must_use]
    pub fn staged(variant: Variant, placement: Placement) -> Self {
        match variant {
            Variant::Zoom => Self {
                scale_x: 0.0,
                scale_y: 0.0,
            },
            Variant::Collapse if placement.is_vertical() => Self {
                scale_x: 1.0,
                scale_y: 0.0,
            },
            Variant::Collapse => Self {
                scale_x: 0.0,
                scale_y: 1.0,
            },
        }
    }

    /// Returns `true` when no scaling is applied.
    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }

    /// The transform as an affine map in panel-local coordinates, scaling about `origin`
    /// for a panel of the given width and height.
    #[must_use]
    pub fn to_affine(self, origin: TransformOrigin, width: f64, height: f64) -> Affine {
        let about = kurbo::Vec2::new(width * origin.x / 100.0, height * origin.y / 100.0);
        Affine::translate(about)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate(-about)
    }
}

impl Default for StagedTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
