// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trigger coordination: turn anchor and panel input into open/close intents.
//!
//! ## Usage
//!
//! 1) Build a [`TriggerCoordinator`] from a [`TriggerSet`] and hover delays.
//! 2) Forward anchor input with [`TriggerCoordinator::on_anchor`] and panel input with
//!    [`TriggerCoordinator::on_panel`], passing the current open state and a timestamp.
//! 3) Apply the returned [`Intent`]s.
//! 4) Hover is debounced with deadlines rather than timers: when
//!    [`TriggerCoordinator::next_deadline`] is reached, call [`TriggerCoordinator::poll`].
//!
//! Every trigger kind is independent. Hover yields plain [`Intent::Open`]/[`Intent::Close`],
//! which a hold can override. Focus, keyboard-enter, click and context-menu yield
//! [`Intent::Hold`], and each kind holds at most once until it is released.
//!
//! ```
//! use understory_popper::trigger::{AnchorEvent, HoverDelays, Intent, TriggerCoordinator, TriggerSet};
//!
//! let mut t = TriggerCoordinator::new(TriggerSet::HOVER, HoverDelays::default(), false);
//!
//! // Entering schedules an open after the enter delay.
//! assert!(t.on_anchor(AnchorEvent::PointerEnter, false, 1_000).intents.is_empty());
//! assert_eq!(t.next_deadline(), Some(1_150));
//! assert_eq!(t.poll(1_100), None);
//! assert_eq!(t.poll(1_150), Some(Intent::Open));
//! ```

use kurbo::Point;
use smallvec::SmallVec;

use crate::subscription::Subscriptions;

bitflags::bitflags! {
    /// Input modalities that may open a panel.
    ///
    /// The empty set disables every trigger; the panel is then driven only by explicit
    /// calls from the host.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TriggerSet: u8 {
        /// Pointer hovering the anchor (or the panel).
        const HOVER        = 0b0000_0001;
        /// Keyboard focus on the anchor.
        const FOCUS        = 0b0000_0010;
        /// `Enter` pressed on the anchor.
        const ENTER        = 0b0000_0100;
        /// Clicking the anchor.
        const CLICK        = 0b0000_1000;
        /// A context-menu request on the anchor.
        const CONTEXT_MENU = 0b0001_0000;
    }
}

impl Default for TriggerSet {
    fn default() -> Self {
        Self::HOVER
    }
}

/// Keys the coordinator distinguishes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// The `Enter` key.
    Enter,
    /// Any other key.
    Other,
}

/// Input observed on the anchor element.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum AnchorEvent {
    /// Pointer entered the anchor.
    PointerEnter,
    /// Pointer left the anchor.
    PointerLeave,
    /// The anchor gained focus.
    Focus,
    /// The anchor lost focus.
    Blur,
    /// A key was pressed while the anchor had focus.
    KeyDown(Key),
    /// The anchor was clicked.
    Click,
    /// A context menu was requested at the given client position.
    ContextMenu(Point),
}

/// Input observed on the panel element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PanelEvent {
    /// Pointer entered the panel.
    PointerEnter,
    /// Pointer left the panel.
    PointerLeave,
    /// The panel content was clicked.
    Click,
}

/// What the coordinator asks the owner to do.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Intent {
    /// Open; never refused unless the owner is disabled.
    Open,
    /// Close, honored only when nothing holds the panel open.
    Close,
    /// Open and take a hold (`true`), or release a hold and close if none remain (`false`).
    Hold(bool),
    /// Close regardless of holds.
    ForceClose,
    /// Anchor the panel at a pointer position before the accompanying hold.
    ContextMenu(Point),
}

/// Hover debounce delays in host time units.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HoverDelays {
    /// Delay between pointer enter and opening.
    pub enter: u64,
    /// Delay between pointer leave and closing.
    pub leave: u64,
}

impl Default for HoverDelays {
    fn default() -> Self {
        Self {
            enter: 150,
            leave: 150,
        }
    }
}

/// Result of feeding one event to the coordinator.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriggerResponse {
    /// Intents to apply, in order.
    pub intents: SmallVec<[Intent; 2]>,
    /// The host should suppress the event's default action (the native context menu).
    pub prevent_default: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TimerKind {
    Enter,
    Leave,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct PendingTimer {
    kind: TimerKind,
    deadline: u64,
}

/// Per-instance trigger state machine.
#[derive(Clone, Debug)]
pub struct TriggerCoordinator {
    triggers: TriggerSet,
    delays: HoverDelays,
    click_to_close: bool,
    pending: Option<PendingTimer>,
    held: TriggerSet,
}

impl TriggerCoordinator {
    /// Creates a coordinator for the given triggers.
    #[must_use]
    pub fn new(triggers: TriggerSet, delays: HoverDelays, click_to_close: bool) -> Self {
        Self {
            triggers,
            delays,
            click_to_close,
            pending: None,
            held: TriggerSet::empty(),
        }
    }

    /// The active trigger set.
    #[must_use]
    pub fn triggers(&self) -> TriggerSet {
        self.triggers
    }

    /// Trigger kinds currently holding the panel open.
    #[must_use]
    pub fn held(&self) -> TriggerSet {
        self.held
    }

    /// Reconfigures the coordinator. Changing the trigger set cancels any pending hover
    /// timer and forgets holds of kinds that are no longer active.
    pub fn reconfigure(&mut self, triggers: TriggerSet, delays: HoverDelays, click_to_close: bool) {
        if triggers != self.triggers {
            self.cancel();
            self.held &= triggers;
        }
        self.triggers = triggers;
        self.delays = delays;
        self.click_to_close = click_to_close;
    }

    /// Anchor listeners needed for the current configuration.
    #[must_use]
    pub fn listeners(&self) -> Subscriptions {
        let mut wanted = Subscriptions::empty();
        if self.triggers.contains(TriggerSet::HOVER) {
            wanted |= Subscriptions::POINTER_ENTER | Subscriptions::POINTER_LEAVE;
        }
        if self.triggers.contains(TriggerSet::FOCUS) {
            wanted |= Subscriptions::FOCUS | Subscriptions::BLUR;
        }
        if self.triggers.contains(TriggerSet::ENTER) {
            wanted |= Subscriptions::KEY_DOWN;
        }
        if self.triggers.contains(TriggerSet::CLICK) || self.click_to_close {
            wanted |= Subscriptions::CLICK;
        }
        if self.triggers.contains(TriggerSet::CONTEXT_MENU) {
            wanted |= Subscriptions::CONTEXT_MENU;
        }
        wanted
    }

    /// The deadline of the pending hover timer, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.map(|p| p.deadline)
    }

    /// Cancels any pending hover timer.
    pub fn cancel(&mut self) {
        #[cfg(feature = "tracing")]
        if let Some(p) = self.pending {
            tracing::trace!(kind = ?p.kind, deadline = p.deadline, "hover timer cancelled");
        }
        self.pending = None;
    }

    /// Cancels pending timers and forgets every hold, for when the panel closes.
    pub fn release_all(&mut self) {
        self.cancel();
        self.release_holds();
    }

    /// Forgets every hold without touching the hover timer.
    pub fn release_holds(&mut self) {
        self.held = TriggerSet::empty();
    }

    /// Fires the pending hover timer if its deadline has passed.
    pub fn poll(&mut self, now: u64) -> Option<Intent> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;
        Some(match pending.kind {
            TimerKind::Enter => Intent::Open,
            TimerKind::Leave => Intent::Close,
        })
    }

    /// Handles input on the anchor.
    pub fn on_anchor(&mut self, event: AnchorEvent, open: bool, now: u64) -> TriggerResponse {
        let mut response = TriggerResponse::default();
        match event {
            AnchorEvent::PointerEnter if self.hovers() => {
                if open {
                    self.cancel();
                } else {
                    self.schedule(TimerKind::Enter, now, &mut response);
                }
            }
            AnchorEvent::PointerLeave if self.hovers() => self.leave(open, now, &mut response),
            AnchorEvent::Focus if self.triggers.contains(TriggerSet::FOCUS) => {
                self.hold(TriggerSet::FOCUS, &mut response);
            }
            AnchorEvent::Blur if self.triggers.contains(TriggerSet::FOCUS) => {
                self.release(TriggerSet::FOCUS, &mut response);
            }
            AnchorEvent::KeyDown(Key::Enter) if self.triggers.contains(TriggerSet::ENTER) => {
                self.hold(TriggerSet::ENTER, &mut response);
            }
            AnchorEvent::Click if open && self.click_to_close => {
                self.cancel();
                response.intents.push(Intent::ForceClose);
            }
            AnchorEvent::Click if self.triggers.contains(TriggerSet::CLICK) => {
                self.hold(TriggerSet::CLICK, &mut response);
            }
            AnchorEvent::ContextMenu(point) if self.triggers.contains(TriggerSet::CONTEXT_MENU) => {
                response.prevent_default = true;
                response.intents.push(Intent::ContextMenu(point));
                self.hold(TriggerSet::CONTEXT_MENU, &mut response);
            }
            _ => {}
        }
        response
    }

    /// Handles input on the panel. Only hover is tracked here; panel clicks are the owner's
    /// business.
    pub fn on_panel(&mut self, event: PanelEvent, open: bool, now: u64) -> TriggerResponse {
        let mut response = TriggerResponse::default();
        if !self.hovers() {
            return response;
        }
        match event {
            PanelEvent::PointerEnter => {
                if self.pending.is_some_and(|p| p.kind == TimerKind::Leave) {
                    self.cancel();
                }
            }
            PanelEvent::PointerLeave => self.leave(open, now, &mut response),
            PanelEvent::Click => {}
        }
        response
    }

    fn hovers(&self) -> bool {
        self.triggers.contains(TriggerSet::HOVER)
    }

    fn leave(&mut self, open: bool, now: u64, response: &mut TriggerResponse) {
        if open {
            self.schedule(TimerKind::Leave, now, response);
        } else {
            self.cancel();
        }
    }

    fn schedule(&mut self, kind: TimerKind, now: u64, response: &mut TriggerResponse) {
        let delay = match kind {
            TimerKind::Enter => self.delays.enter,
            TimerKind::Leave => self.delays.leave,
        };
        if delay == 0 {
            self.pending = None;
            response.intents.push(match kind {
                TimerKind::Enter => Intent::Open,
                TimerKind::Leave => Intent::Close,
            });
            return;
        }
        let deadline = now.saturating_add(delay);
        #[cfg(feature = "tracing")]
        tracing::trace!(?kind, deadline, "hover timer scheduled");
        self.pending = Some(PendingTimer { kind, deadline });
    }

    fn hold(&mut self, kind: TriggerSet, response: &mut TriggerResponse) {
        // A hold supersedes any in-flight hover timer.
        self.cancel();
        if !self.held.contains(kind) {
            self.held |= kind;
            response.intents.push(Intent::Hold(true));
        }
    }

    fn release(&mut self, kind: TriggerSet, response: &mut TriggerResponse) {
        if self.held.contains(kind) {
            self.held -= kind;
            response.intents.push(Intent::Hold(false));
        }
    }
}
