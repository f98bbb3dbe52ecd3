// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_popper --heading-base-level=0

//! Understory Popper: headless floating-panel primitives.
//!
//! This crate decides _where_ a detached panel (tooltip, dropdown, menu, picker) appears
//! next to its anchor and _when_ it is visible. It owns no clock, no element tree and no
//! renderer: the host measures elements, forwards input, polls deadlines and reports
//! animation progress, and the engine answers with geometry and notifications.
//!
//! ## Pieces
//!
//! - [`placement`]: the twelve [`Placement`]s and their parts.
//! - [`solver`]: pure geometry with an ordered fallback search when a placement overflows.
//! - [`trigger`]: hover, focus, `Enter`, click and context-menu input turned into intents,
//!   with hover debounced by deadlines.
//! - [`lifecycle`]: mount strategy and the staged open / settle / close sequence.
//! - [`transition`]: the collapsed entry transform used by scale animations.
//! - [`subscription`]: which listeners and observers an instance needs, as diffs.
//! - [`nesting`] and [`tree`]: hold counting and the tree that keeps ancestors open while
//!   a descendant is open.
//! - [`popper`]: one anchor/panel instance tying the above together.
//! - [`handle`]: sharing one anchor handle between several consumers.
//!
//! ## Example
//!
//! ```
//! use kurbo::{Rect, Size};
//! use understory_popper::{Measure, Placement, Popper, PopperConfig, TriggerSet};
//! use understory_popper::trigger::AnchorEvent;
//!
//! struct Page;
//! impl Measure<u32> for Page {
//!     fn rect(&self, element: u32) -> Option<Rect> {
//!         match element {
//!             // Anchor close to the top edge.
//!             1 => Some(Rect::new(100.0, 10.0, 150.0, 30.0)),
//!             2 => Some(Rect::from_origin_size((0.0, 0.0), Size::new(120.0, 40.0))),
//!             _ => None,
//!         }
//!     }
//!     fn viewport(&self) -> Rect {
//!         Rect::new(0.0, 0.0, 800.0, 600.0)
//!     }
//! }
//!
//! let mut tooltip = Popper::new(PopperConfig {
//!     trigger: TriggerSet::HOVER,
//!     offset: 8.0,
//!     animate: false,
//!     ..PopperConfig::default()
//! });
//! tooltip.set_anchor(Some(1));
//! tooltip.set_panel(Some(2));
//!
//! tooltip.on_anchor_event(AnchorEvent::PointerEnter, 1_000);
//! assert_eq!(tooltip.next_deadline(), Some(1_150));
//! tooltip.poll(1_150);
//! tooltip.layout(&Page);
//!
//! // No room above the anchor, so the tooltip drops below it.
//! let state = tooltip.state().unwrap();
//! assert_eq!(state.placement, Placement::Bottom);
//! assert_eq!((state.bounds.left, state.bounds.top), (65.0, 38.0));
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to Kurbo's `std` feature.
//! - `libm`: forwards to Kurbo's `libm` feature for `no_std` builds.
//! - `tracing`: debug events for open transitions, fits and subscription changes, and
//!   trace events for hover timers.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod handle;
pub mod lifecycle;
pub mod nesting;
pub mod placement;
pub mod popper;
pub mod solver;
pub mod subscription;
pub mod transition;
pub mod tree;
pub mod trigger;

pub use lifecycle::{MountStrategy, Phase};
pub use placement::{Alignment, Edge, Placement};
pub use popper::{
    Bounds, Container, FitOptions, Measure, Popper, PopperConfig, PopperEvent, PopperState,
};
pub use solver::{Anchor, FitRequest, FitResult, TransformOrigin, solve};
pub use subscription::{SubscriptionChange, Subscriptions};
pub use transition::{StagedTransform, Variant};
pub use tree::{PopperContext, PopperError, PopperId, PopperTree};
pub use trigger::{AnchorEvent, Intent, PanelEvent, TriggerSet};
