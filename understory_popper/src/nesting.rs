// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instance pieces of the nesting protocol: hold counting and before-open callbacks.
//!
//! A [`HoldCounter`] counts reasons to keep a panel open: the instance's own holding
//! triggers (focus, click, ...) plus every descendant that reported itself open. Close
//! requests are honored only at zero; a forced close resets the count.
//!
//! [`BeforeOpenCallbacks`] lets nested consumers run work once per open, after the panel
//! is mounted and before its geometry is first committed.
//!
//! See [`PopperTree`](crate::tree::PopperTree) for routing reports between instances.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Non-negative count of outstanding holds.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct HoldCounter(u32);

impl HoldCounter {
    /// A counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// The current count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns `true` when nothing holds the panel.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Adds a hold.
    pub fn increment(&mut self) {
        self.0 = self.0.saturating_add(1);
    }

    /// Releases a hold, flooring at zero. Returns `true` if the counter is now zero.
    pub fn decrement(&mut self) -> bool {
        self.0 = self.0.saturating_sub(1);
        self.0 == 0
    }

    /// Drops every hold.
    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Handle for removing a registered before-open callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallbackKey(u64);

/// Ordered set of callbacks run before each open.
#[derive(Default)]
pub struct BeforeOpenCallbacks {
    callbacks: Vec<(CallbackKey, Box<dyn FnMut()>)>,
    next: u64,
}

impl fmt::Debug for BeforeOpenCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeforeOpenCallbacks")
            .field("len", &self.callbacks.len())
            .field("next", &self.next)
            .finish()
    }
}

impl BeforeOpenCallbacks {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback; callbacks run in registration order.
    pub fn insert(&mut self, callback: impl FnMut() + 'static) -> CallbackKey {
        let key = CallbackKey(self.next);
        self.next += 1;
        self.callbacks.push((key, Box::new(callback)));
        key
    }

    /// Unregisters a callback. Returns `false` if the key was not registered.
    pub fn remove(&mut self, key: CallbackKey) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(k, _)| *k != key);
        self.callbacks.len() != before
    }

    /// Number of registered callbacks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Returns `true` if no callbacks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Runs every callback once.
    pub fn run(&mut self) {
        for (_, callback) in &mut self.callbacks {
            callback();
        }
    }

    /// Removes every callback.
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::RefCell;

    #[test]
    fn counter_floors_at_zero() {
        let mut c = HoldCounter::new();
        assert!(c.decrement());
        assert_eq!(c.get(), 0);
        c.increment();
        c.increment();
        assert!(!c.decrement());
        assert!(c.decrement());
        assert!(c.is_zero());
    }

    #[test]
    fn reset_drops_all_holds() {
        let mut c = HoldCounter::new();
        for _ in 0..5 {
            c.increment();
        }
        c.reset();
        assert_eq!(c, HoldCounter::new());
    }

    #[test]
    fn callbacks_run_in_order_and_remove() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut callbacks = BeforeOpenCallbacks::new();
        let l1 = log.clone();
        let first = callbacks.insert(move || l1.borrow_mut().push(1));
        let l2 = log.clone();
        callbacks.insert(move || l2.borrow_mut().push(2));

        callbacks.run();
        assert_eq!(*log.borrow(), vec![1, 2]);

        assert!(callbacks.remove(first));
        assert!(!callbacks.remove(first));
        callbacks.run();
        assert_eq!(*log.borrow(), vec![1, 2, 2]);
        assert_eq!(callbacks.len(), 1);
    }
}
