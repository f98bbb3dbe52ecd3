// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener and observer bookkeeping.
//!
//! The engine never attaches listeners itself. Instead it describes the set it wants as
//! [`Subscriptions`] and [`SubscriptionBinding::sync`] turns that into the minimal
//! attach/detach work for the host. Syncing twice with the same inputs is a no-op, and a
//! missing anchor element simply means nothing is attached.
//!
//! ```
//! use understory_popper::subscription::{SubscriptionBinding, Subscriptions};
//!
//! let mut binding = SubscriptionBinding::<u32>::new();
//! let change = binding.sync(Some(7), Subscriptions::CLICK).unwrap();
//! assert_eq!(change.attach, Some((7, Subscriptions::CLICK)));
//! assert!(binding.sync(Some(7), Subscriptions::CLICK).is_none());
//!
//! // No anchor: everything that was attached gets detached.
//! let change = binding.sync(None, Subscriptions::CLICK).unwrap();
//! assert_eq!(change.detach, Some((7, Subscriptions::CLICK)));
//! ```

bitflags::bitflags! {
    /// Listeners on the anchor plus environment observers.
    ///
    /// Anchor listeners are bound to the anchor element. `ANCHOR_RESIZE` and
    /// `ANCESTOR_SCROLL` observe the anchor and its scrollable ancestors,
    /// `PANEL_INTERSECTION` observes the panel against its container, and
    /// `WINDOW_RESIZE`/`CLICK_OUTSIDE` are global to the host.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Subscriptions: u16 {
        /// Pointer entering the anchor.
        const POINTER_ENTER      = 1 << 0;
        /// Pointer leaving the anchor.
        const POINTER_LEAVE      = 1 << 1;
        /// Anchor gaining focus.
        const FOCUS              = 1 << 2;
        /// Anchor losing focus.
        const BLUR               = 1 << 3;
        /// Key presses on the anchor.
        const KEY_DOWN           = 1 << 4;
        /// Clicks on the anchor.
        const CLICK              = 1 << 5;
        /// Context-menu requests on the anchor.
        const CONTEXT_MENU       = 1 << 6;
        /// Anchor size changes.
        const ANCHOR_RESIZE      = 1 << 8;
        /// Panel crossing its container's visible area.
        const PANEL_INTERSECTION = 1 << 9;
        /// Scrolling of any scrollable ancestor of the anchor.
        const ANCESTOR_SCROLL    = 1 << 10;
        /// Window (root viewport) resize.
        const WINDOW_RESIZE      = 1 << 11;
        /// Pointer presses outside every inside element.
        const CLICK_OUTSIDE      = 1 << 12;

        /// Every anchor-level input listener.
        const ANCHOR_LISTENERS = Self::POINTER_ENTER.bits()
            | Self::POINTER_LEAVE.bits()
            | Self::FOCUS.bits()
            | Self::BLUR.bits()
            | Self::KEY_DOWN.bits()
            | Self::CLICK.bits()
            | Self::CONTEXT_MENU.bits();
        /// Environment observers needed while a panel is shown.
        const OPEN_OBSERVERS = Self::ANCHOR_RESIZE.bits()
            | Self::PANEL_INTERSECTION.bits()
            | Self::ANCESTOR_SCROLL.bits()
            | Self::WINDOW_RESIZE.bits();
    }
}

/// Work for the host produced by [`SubscriptionBinding::sync`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionChange<E> {
    /// Subscriptions to remove, and the element they were attached to.
    pub detach: Option<(E, Subscriptions)>,
    /// Subscriptions to add, and the element to attach them to.
    pub attach: Option<(E, Subscriptions)>,
}

/// Tracks what is currently attached and diffs it against what is wanted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionBinding<E> {
    element: Option<E>,
    active: Subscriptions,
}

impl<E> Default for SubscriptionBinding<E> {
    fn default() -> Self {
        Self {
            element: None,
            active: Subscriptions::empty(),
        }
    }
}

impl<E: Copy + PartialEq> SubscriptionBinding<E> {
    /// Creates a binding with nothing attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The element subscriptions are currently attached to.
    #[must_use]
    pub fn element(&self) -> Option<E> {
        self.element
    }

    /// The currently attached set.
    #[must_use]
    pub fn active(&self) -> Subscriptions {
        self.active
    }

    /// Reconciles the attached set with `wanted` on `element`.
    ///
    /// Returns `None` if nothing needs to change. When the element identity changes,
    /// everything is detached from the old element and `wanted` is attached to the new one.
    pub fn sync(
        &mut self,
        element: Option<E>,
        wanted: Subscriptions,
    ) -> Option<SubscriptionChange<E>> {
        let wanted = if element.is_some() {
            wanted
        } else {
            Subscriptions::empty()
        };
        if element == self.element && wanted == self.active {
            return None;
        }

        let (detach, attach) = if element == self.element {
            (self.active - wanted, wanted - self.active)
        } else {
            (self.active, wanted)
        };
        let change = SubscriptionChange {
            detach: self
                .element
                .filter(|_| !detach.is_empty())
                .map(|e| (e, detach)),
            attach: element.filter(|_| !attach.is_empty()).map(|e| (e, attach)),
        };

        self.element = element;
        self.active = wanted;
        if change.detach.is_none() && change.attach.is_none() {
            None
        } else {
            Some(change)
        }
    }

    /// Detaches everything.
    pub fn clear(&mut self) -> Option<SubscriptionChange<E>> {
        self.sync(None, Subscriptions::empty())
    }
}
