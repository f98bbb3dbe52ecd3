// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handle composition: share one element handle with several consumers.
//!
//! A [`ComposedHandle`] stores the current element and a list of setters. Whenever the
//! element identity changes, every setter is invoked in registration order with the new
//! value. Setting the same element again does nothing.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use understory_popper::handle::ComposedHandle;
//!
//! let seen = Rc::new(Cell::new(None));
//! let mut anchor = ComposedHandle::new();
//! let s = seen.clone();
//! anchor.add_setter(move |e: Option<u32>| s.set(e));
//!
//! assert!(anchor.set(Some(4)));
//! assert!(!anchor.set(Some(4)));
//! assert_eq!(seen.get(), Some(4));
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Handle for removing a setter from a [`ComposedHandle`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SetterKey(u64);

/// An element handle forwarded to an ordered list of setters.
pub struct ComposedHandle<E> {
    current: Option<E>,
    setters: Vec<(SetterKey, Box<dyn FnMut(Option<E>)>)>,
    next: u64,
}

impl<E> Default for ComposedHandle<E> {
    fn default() -> Self {
        Self {
            current: None,
            setters: Vec::new(),
            next: 0,
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for ComposedHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedHandle")
            .field("current", &self.current)
            .field("setters", &self.setters.len())
            .field("next", &self.next)
            .finish()
    }
}

impl<E: Copy + PartialEq> ComposedHandle<E> {
    /// Creates an empty handle with no setters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current element.
    #[must_use]
    pub fn get(&self) -> Option<E> {
        self.current
    }

    /// Adds a setter. It is called immediately if an element is already set.
    pub fn add_setter(&mut self, mut setter: impl FnMut(Option<E>) + 'static) -> SetterKey {
        if self.current.is_some() {
            setter(self.current);
        }
        let key = SetterKey(self.next);
        self.next += 1;
        self.setters.push((key, Box::new(setter)));
        key
    }

    /// Removes a setter. Returns `false` if the key was not registered.
    pub fn remove_setter(&mut self, key: SetterKey) -> bool {
        let before = self.setters.len();
        self.setters.retain(|(k, _)| *k != key);
        self.setters.len() != before
    }

    /// Updates the element. Returns `true` and notifies every setter if it changed.
    pub fn set(&mut self, element: Option<E>) -> bool {
        if self.current == element {
            return false;
        }
        self.current = element;
        for (_, setter) in &mut self.setters {
            setter(element);
        }
        true
    }
}
