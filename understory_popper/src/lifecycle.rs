// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility lifecycle: mounting strategy and open/close animation bookkeeping.
//!
//! The lifecycle moves through these phases:
//!
//! ```text
//!            open()            staged()             animation_frame()
//!   Closed ---------> Opening ----------> Staged ---------------------> Open
//!     ^                  |                  |                            |
//!     |                  +------ close() ---+----------------------------+
//!     |                                     |
//!     +----- animation_complete() ----- Closing
//! ```
//!
//! - `Opening`: mounted, waiting for the host to lay out and fit the panel.
//! - `Staged`: geometry committed with the collapsed entry transform, waiting one frame.
//! - `Open`: settled; the renderer may animate to full scale.
//! - `Closing`: no longer open, geometry kept until the exit animation completes.
//!
//! Without animation, `Staged` and `Closing` are skipped.

use smallvec::SmallVec;

/// How long the panel subtree stays mounted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum MountStrategy {
    /// Mount on first open, then keep mounted for the instance's lifetime.
    #[default]
    RenderOnce,
    /// Mounted from the start, regardless of open state.
    AlwaysMounted,
    /// Unmount after every close animation.
    DestroyOnClose,
}

impl MountStrategy {
    /// Maps the tri-state `force_render` option to a strategy.
    #[must_use]
    pub const fn from_force_render(force_render: Option<bool>) -> Self {
        match force_render {
            None => Self::RenderOnce,
            Some(true) => Self::AlwaysMounted,
            Some(false) => Self::DestroyOnClose,
        }
    }
}

/// Current phase of the lifecycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not shown.
    #[default]
    Closed,
    /// Mounted and waiting for layout.
    Opening,
    /// Geometry committed in its collapsed entry state.
    Staged,
    /// Shown and settled.
    Open,
    /// Exit animation running.
    Closing,
}

/// Notifications produced by lifecycle transitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The panel subtree must be mounted.
    Mounted,
    /// The panel subtree may be unmounted.
    Unmounted,
    /// The staged state was painted; switch to the final transform.
    Settled,
    /// The open animation finished.
    OpenEnd,
    /// The close animation finished.
    CloseEnd,
}

/// Small batch of lifecycle events.
pub type LifecycleEvents = SmallVec<[LifecycleEvent; 3]>;

/// Mount and animation state for one panel.
#[derive(Clone, Debug, Default)]
pub struct VisibilityLifecycle {
    strategy: MountStrategy,
    animate: bool,
    phase: Phase,
    mounted: bool,
    open_end_pending: bool,
}

impl VisibilityLifecycle {
    /// Creates a closed lifecycle.
    #[must_use]
    pub fn new(strategy: MountStrategy, animate: bool) -> Self {
        Self {
            strategy,
            animate,
            phase: Phase::Closed,
            mounted: strategy == MountStrategy::AlwaysMounted,
            open_end_pending: false,
        }
    }

    /// Changes the mount strategy. Switching to [`MountStrategy::AlwaysMounted`] mounts
    /// immediately; other changes take effect at the next transition.
    pub fn set_strategy(&mut self, strategy: MountStrategy) -> LifecycleEvents {
        let mut events = LifecycleEvents::new();
        self.strategy = strategy;
        if strategy == MountStrategy::AlwaysMounted && !self.mounted {
            self.mounted = true;
            events.push(LifecycleEvent::Mounted);
        }
        events
    }

    /// Enables or disables animation for subsequent transitions.
    pub fn set_animate(&mut self, animate: bool) {
        self.animate = animate;
    }

    /// The current phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the panel subtree should currently be mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the panel has committed geometry and is open.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        matches!(self.phase, Phase::Staged | Phase::Open)
    }

    /// Whether the host may run the transition to full scale.
    #[must_use]
    pub fn may_animate(&self) -> bool {
        self.phase == Phase::Open
    }

    /// Starts opening. Mounts if needed; the host must then lay out and call [`Self::staged`].
    pub fn open(&mut self) -> LifecycleEvents {
        let mut events = LifecycleEvents::new();
        if matches!(self.phase, Phase::Opening | Phase::Staged | Phase::Open) {
            return events;
        }
        if !self.mounted {
            self.mounted = true;
            events.push(LifecycleEvent::Mounted);
        }
        self.phase = Phase::Opening;
        events
    }

    /// Geometry has been committed for an opening panel.
    pub fn staged(&mut self) -> LifecycleEvents {
        let mut events = LifecycleEvents::new();
        if self.phase != Phase::Opening {
            return events;
        }
        if self.animate {
            self.phase = Phase::Staged;
        } else {
            self.phase = Phase::Open;
            events.push(LifecycleEvent::Settled);
            events.push(LifecycleEvent::OpenEnd);
        }
        events
    }

    /// One animation frame has passed since staging.
    pub fn animation_frame(&mut self) -> Option<LifecycleEvent> {
        if self.phase != Phase::Staged {
            return None;
        }
        self.phase = Phase::Open;
        self.open_end_pending = true;
        Some(LifecycleEvent::Settled)
    }

    /// The running open or close animation finished.
    pub fn animation_complete(&mut self) -> LifecycleEvents {
        let mut events = LifecycleEvents::new();
        match self.phase {
            Phase::Open if self.open_end_pending => {
                self.open_end_pending = false;
                events.push(LifecycleEvent::OpenEnd);
            }
            Phase::Closing => self.finish_close(&mut events),
            _ => {}
        }
        events
    }

    /// Starts closing.
    pub fn close(&mut self) -> LifecycleEvents {
        let mut events = LifecycleEvents::new();
        self.open_end_pending = false;
        match self.phase {
            Phase::Closed | Phase::Closing => {}
            // Nothing was ever painted, so there is nothing to animate out.
            Phase::Opening | Phase::Staged => self.finish_close(&mut events),
            Phase::Open if self.animate => self.phase = Phase::Closing,
            Phase::Open => self.finish_close(&mut events),
        }
        events
    }

    /// Drops everything without emitting events, for disposal.
    pub fn reset(&mut self) {
        self.phase = Phase::Closed;
        self.mounted = false;
        self.open_end_pending = false;
    }

    fn finish_close(&mut self, events: &mut LifecycleEvents) {
        self.phase = Phase::Closed;
        events.push(LifecycleEvent::CloseEnd);
        if self.strategy == MountStrategy::DestroyOnClose && self.mounted {
            self.mounted = false;
            events.push(LifecycleEvent::Unmounted);
        }
    }
}
