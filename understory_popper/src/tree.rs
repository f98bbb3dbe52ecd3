// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Nesting: a tree of [`Popper`] instances that keep each other open.
//!
//! A panel rendered inside another panel is inserted with that panel as its parent.
//! The tree then routes open reports between them:
//!
//! - A child that becomes open reports `true` to its parent, which takes a hold.
//! - A child that closes reports `false`; the parent releases the hold and closes itself
//!   once none remain.
//! - A closed instance force-closes every open descendant.
//! - Removing an instance disposes its subtree and, if it was reported open, sends the
//!   matching `false` report so the parent's hold count stays paired.
//!
//! Every mutation goes through the tree ([`PopperTree::update`] and the event helpers) so
//! reports are delivered before control returns to the host.
//!
//! ```
//! use understory_popper::popper::PopperConfig;
//! use understory_popper::tree::PopperTree;
//! use understory_popper::trigger::TriggerSet;
//!
//! let mut tree = PopperTree::<u32>::new();
//! let config = || PopperConfig { trigger: TriggerSet::empty(), ..PopperConfig::default() };
//! let menu = tree.insert(config(), None).unwrap();
//! let submenu = tree.insert(config(), Some(menu)).unwrap();
//!
//! tree.set_open(menu, true);
//! tree.set_open(submenu, true);
//! assert_eq!(tree.get(menu).unwrap().hold_count(), 1);
//!
//! // Closing the submenu releases the last hold, so the menu closes as well.
//! tree.set_open(submenu, false);
//! assert!(!tree.get(menu).unwrap().is_open());
//! ```

use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::nesting::CallbackKey;
use crate::popper::{Measure, Popper, PopperConfig, PopperEvent};
use crate::subscription::SubscriptionChange;
use crate::trigger::{AnchorEvent, PanelEvent};

/// Identifier for an instance in a [`PopperTree`].
///
/// A slot index plus a generation: ids of removed instances never alias a later one.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PopperId(u32, u32);

impl PopperId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Errors from [`PopperTree`] operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PopperError {
    /// The requested parent has been removed.
    StaleParent(PopperId),
}

impl fmt::Display for PopperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleParent(id) => write!(f, "parent popper {id:?} is no longer alive"),
        }
    }
}

impl core::error::Error for PopperError {}

/// Values a nested consumer reads from its enclosing instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PopperContext {
    /// Clicking inside the panel closes it.
    pub auto_close: bool,
    /// Whether the enclosing panel is open.
    pub open: bool,
}

#[derive(Debug)]
struct Entry<E> {
    popper: Popper<E>,
    parent: Option<PopperId>,
    reported_open: bool,
}

#[derive(Debug)]
struct Slot<E> {
    generation: u32,
    entry: Option<Entry<E>>,
}

/// Arena of nested [`Popper`] instances.
#[derive(Debug)]
pub struct PopperTree<E> {
    slots: Vec<Slot<E>>,
    free: Vec<u32>,
    children: HashMap<PopperId, SmallVec<[PopperId; 4]>>,
}

impl<E> Default for PopperTree<E> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            children: HashMap::new(),
        }
    }
}

impl<E: Copy + PartialEq> PopperTree<E> {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instance, optionally nested under `parent`.
    pub fn insert(
        &mut self,
        config: PopperConfig<E>,
        parent: Option<PopperId>,
    ) -> Result<PopperId, PopperError> {
        if let Some(parent) = parent {
            if !self.is_alive(parent) {
                return Err(PopperError::StaleParent(parent));
            }
        }
        let entry = Entry {
            popper: Popper::new(config),
            parent,
            reported_open: false,
        };
        let id = if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry = Some(entry);
            PopperId(idx, slot.generation)
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "more than u32::MAX live poppers is not a supported configuration"
            )]
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                entry: Some(entry),
            });
            PopperId(idx, 1)
        };
        if let Some(parent) = parent {
            self.children.entry(parent).or_default().push(id);
        }
        // An instance may start open.
        self.propagate(id);
        Ok(id)
    }

    /// Removes an instance and its whole subtree, returning the subscriptions to detach.
    pub fn remove(&mut self, id: PopperId) -> Vec<SubscriptionChange<E>> {
        let Some(entry) = self.entry(id) else {
            return Vec::new();
        };
        let parent = entry.parent;
        let reported = entry.reported_open;

        let mut changes = Vec::new();
        for node in self.subtree(id).into_iter().rev() {
            if let Some(slot) = self.slots.get_mut(node.idx()) {
                if let Some(mut entry) = slot.entry.take() {
                    changes.extend(entry.popper.dispose());
                    self.free.push(node.0);
                }
            }
            self.children.remove(&node);
        }

        if let Some(parent) = parent {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| *c != id);
            }
            if reported {
                if let Some(p) = self.popper_mut(parent) {
                    p.report_child_open_change(false);
                }
                self.propagate(parent);
            }
        }
        changes
    }

    /// Returns `true` if `id` refers to a live instance.
    #[must_use]
    pub fn is_alive(&self, id: PopperId) -> bool {
        self.entry(id).is_some()
    }

    /// The instance for `id`.
    #[must_use]
    pub fn get(&self, id: PopperId) -> Option<&Popper<E>> {
        self.entry(id).map(|e| &e.popper)
    }

    /// The parent of `id`.
    #[must_use]
    pub fn parent(&self, id: PopperId) -> Option<PopperId> {
        self.entry(id)?.parent
    }

    /// Direct children of `id`.
    #[must_use]
    pub fn children(&self, id: PopperId) -> &[PopperId] {
        self.children.get(&id).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// Ids of every live instance.
    pub fn ids(&self) -> impl Iterator<Item = PopperId> + '_ {
        (0_u32..)
            .zip(&self.slots)
            .filter(|(_, slot)| slot.entry.is_some())
            .map(|(idx, slot)| PopperId(idx, slot.generation))
    }

    /// Mutates one instance, then delivers any resulting open reports.
    pub fn update<R>(&mut self, id: PopperId, f: impl FnOnce(&mut Popper<E>) -> R) -> Option<R> {
        let result = f(self.popper_mut(id)?);
        self.propagate(id);
        Some(result)
    }

    /// See [`Popper::set_open`].
    pub fn set_open(&mut self, id: PopperId, open: bool) {
        self.update(id, |p| p.set_open(open));
    }

    /// See [`Popper::set_open_hold`].
    pub fn set_open_hold(&mut self, id: PopperId, open: bool) {
        self.update(id, |p| p.set_open_hold(open));
    }

    /// See [`Popper::set_open_force`].
    pub fn set_open_force(&mut self, id: PopperId, open: bool) {
        self.update(id, |p| p.set_open_force(open));
    }

    /// Reports a child's open state to `id` directly, for consumers that are not
    /// themselves instances in the tree.
    pub fn report_child_open_change(&mut self, id: PopperId, open: bool) {
        self.update(id, |p| p.report_child_open_change(open));
    }

    /// See [`Popper::on_anchor_event`].
    pub fn on_anchor_event(&mut self, id: PopperId, event: AnchorEvent, now: u64) -> bool {
        self.update(id, |p| p.on_anchor_event(event, now))
            .unwrap_or(false)
    }

    /// See [`Popper::on_panel_event`].
    pub fn on_panel_event(&mut self, id: PopperId, event: PanelEvent, now: u64) {
        self.update(id, |p| p.on_panel_event(event, now));
    }

    /// Earliest hover deadline across the tree.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.slots
            .iter()
            .filter_map(|s| s.entry.as_ref()?.popper.next_deadline())
            .min()
    }

    /// Fires every hover timer that is due.
    pub fn poll(&mut self, now: u64) {
        let due: Vec<PopperId> = self
            .ids()
            .filter(|id| {
                self.get(*id)
                    .and_then(Popper::next_deadline)
                    .is_some_and(|d| d <= now)
            })
            .collect();
        for id in due {
            self.update(id, |p| p.poll(now));
        }
    }

    /// The window resized: force-closes every instance.
    pub fn on_window_resize(&mut self) {
        let ids: Vec<PopperId> = self.ids().collect();
        for id in ids {
            self.update(id, Popper::on_window_resize);
        }
    }

    /// A pointer press hit the elements in `path` (root to target).
    ///
    /// Every open instance whose chain of inside elements shares nothing with `path` is
    /// closed as if clicked outside.
    pub fn on_pointer_down(&mut self, path: &[E]) {
        let open: Vec<PopperId> = self
            .ids()
            .filter(|id| self.get(*id).is_some_and(Popper::is_open))
            .collect();
        for id in open {
            if !self.get(id).is_some_and(Popper::is_open) {
                continue;
            }
            let inside = self.inside_elements(id);
            if path.iter().any(|e| inside.contains(e)) {
                continue;
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(?id, "pointer down outside popper chain");
            self.update(id, Popper::on_click_outside);
        }
    }

    /// Elements that count as inside for `id`: its own, those of its ancestors, and those of
    /// every descendant.
    #[must_use]
    pub fn inside_elements(&self, id: PopperId) -> Vec<E> {
        let mut inside = Vec::new();
        for node in self.subtree(id) {
            if let Some(p) = self.get(node) {
                inside.extend(p.inside_elements());
            }
        }
        let mut ancestor = self.parent(id);
        while let Some(a) = ancestor {
            if let Some(p) = self.get(a) {
                inside.extend(p.inside_elements());
            }
            ancestor = self.parent(a);
        }
        inside
    }

    /// Context values for consumers nested in `id`'s panel.
    #[must_use]
    pub fn context(&self, id: PopperId) -> Option<PopperContext> {
        let popper = self.get(id)?;
        Some(PopperContext {
            auto_close: popper.config().auto_close,
            open: popper.is_open(),
        })
    }

    /// Registers a callback run before each open of `id`.
    pub fn register_before_open(
        &mut self,
        id: PopperId,
        callback: impl FnMut() + 'static,
    ) -> Option<CallbackKey> {
        Some(self.popper_mut(id)?.before_open_callbacks_mut().insert(callback))
    }

    /// Unregisters a before-open callback.
    pub fn unregister_before_open(&mut self, id: PopperId, key: CallbackKey) -> bool {
        self.popper_mut(id)
            .is_some_and(|p| p.before_open_callbacks_mut().remove(key))
    }

    /// Runs pending layout passes, ancestors before descendants.
    pub fn layout(&mut self, measure: &impl Measure<E>) {
        let roots: Vec<PopperId> = self
            .ids()
            .filter(|id| self.parent(*id).is_none())
            .collect();
        for root in roots {
            for id in self.subtree(root) {
                if self.get(id).is_some_and(Popper::needs_layout) {
                    self.update(id, |p| p.layout(measure));
                }
            }
        }
    }

    /// Takes pending notifications from every instance.
    pub fn drain_events(&mut self) -> Vec<(PopperId, PopperEvent)> {
        let ids: Vec<PopperId> = self.ids().collect();
        let mut events = Vec::new();
        for id in ids {
            if let Some(p) = self.popper_mut(id) {
                events.extend(p.drain_events().into_iter().map(|e| (id, e)));
            }
        }
        events
    }

    /// Reconciles subscriptions for every instance.
    pub fn sync_subscriptions(&mut self) -> Vec<(PopperId, SubscriptionChange<E>)> {
        let ids: Vec<PopperId> = self.ids().collect();
        let mut changes = Vec::new();
        for id in ids {
            if let Some(change) = self.popper_mut(id).and_then(Popper::sync_subscriptions) {
                changes.push((id, change));
            }
        }
        changes
    }

    fn entry(&self, id: PopperId) -> Option<&Entry<E>> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, id: PopperId) -> Option<&mut Entry<E>> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.1 {
            return None;
        }
        slot.entry.as_mut()
    }

    fn popper_mut(&mut self, id: PopperId) -> Option<&mut Popper<E>> {
        self.entry_mut(id).map(|e| &mut e.popper)
    }

    /// `id` and its descendants in pre-order.
    fn subtree(&self, id: PopperId) -> Vec<PopperId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Delivers open reports upward from `start` until nothing changes.
    fn propagate(&mut self, start: PopperId) {
        let mut id = start;
        loop {
            let Some(open) = self.get(id).map(Popper::is_open) else {
                return;
            };
            if !open {
                self.close_descendants(id);
            }
            let Some(entry) = self.entry_mut(id) else {
                return;
            };
            if entry.reported_open == open {
                return;
            }
            entry.reported_open = open;
            let Some(parent) = entry.parent else {
                return;
            };
            #[cfg(feature = "tracing")]
            tracing::debug!(child = ?id, ?parent, open, "reporting child open change");
            let Some(p) = self.popper_mut(parent) else {
                return;
            };
            p.report_child_open_change(open);
            id = parent;
        }
    }

    fn close_descendants(&mut self, id: PopperId) {
        let mut stack: Vec<PopperId> = self.children(id).to_vec();
        while let Some(child) = stack.pop() {
            let Some(entry) = self.entry_mut(child) else {
                continue;
            };
            if entry.popper.is_open() {
                entry.popper.set_open_force(false);
            }
            let was_reported = core::mem::replace(&mut entry.reported_open, false);
            let parent = entry.parent;
            if was_reported {
                if let Some(p) = parent.and_then(|p| self.popper_mut(p)) {
                    p.report_child_open_change(false);
                }
            }
            stack.extend_from_slice(self.children(child));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::TriggerSet;
    use alloc::vec;

    fn manual() -> PopperConfig<u32> {
        PopperConfig {
            trigger: TriggerSet::empty(),
            animate: false,
            ..PopperConfig::default()
        }
    }

    fn chain(tree: &mut PopperTree<u32>) -> (PopperId, PopperId, PopperId) {
        let a = tree.insert(manual(), None).unwrap();
        let b = tree.insert(manual(), Some(a)).unwrap();
        let c = tree.insert(manual(), Some(b)).unwrap();
        (a, b, c)
    }

    fn holds(tree: &PopperTree<u32>, id: PopperId) -> u32 {
        tree.get(id).unwrap().hold_count()
    }

    #[test]
    fn stale_parent_is_rejected() {
        let mut tree = PopperTree::new();
        let a = tree.insert(manual(), None).unwrap();
        tree.remove(a);
        assert_eq!(
            tree.insert(manual(), Some(a)).unwrap_err(),
            PopperError::StaleParent(a)
        );
    }

    #[test]
    fn ids_are_generational() {
        let mut tree = PopperTree::new();
        let a = tree.insert(manual(), None).unwrap();
        tree.remove(a);
        let b = tree.insert(manual(), None).unwrap();
        assert_ne!(a, b);
        assert!(!tree.is_alive(a));
        assert!(tree.is_alive(b));
        assert!(tree.get(a).is_none());
    }

    #[test]
    fn cascade_closes_up_the_chain() {
        let mut tree = PopperTree::new();
        let (a, b, c) = chain(&mut tree);
        tree.set_open(a, true);
        tree.set_open(b, true);
        tree.set_open(c, true);
        assert_eq!((holds(&tree, a), holds(&tree, b)), (1, 1));

        tree.set_open(c, false);
        for id in [a, b, c] {
            assert!(!tree.get(id).unwrap().is_open());
            assert_eq!(holds(&tree, id), 0);
        }
    }

    #[test]
    fn closing_root_closes_descendants() {
        let mut tree = PopperTree::new();
        let (a, b, c) = chain(&mut tree);
        for id in [a, b, c] {
            tree.set_open(id, true);
        }
        tree.set_open_force(a, false);
        assert!(!tree.get(b).unwrap().is_open());
        assert!(!tree.get(c).unwrap().is_open());

        // Reopening starts from clean hold counts.
        tree.set_open(a, true);
        assert_eq!(holds(&tree, a), 0);
        tree.set_open(a, false);
        assert!(!tree.get(a).unwrap().is_open());
    }

    #[test]
    fn siblings_share_the_parent_hold() {
        let mut tree = PopperTree::new();
        let a = tree.insert(manual(), None).unwrap();
        let b1 = tree.insert(manual(), Some(a)).unwrap();
        let b2 = tree.insert(manual(), Some(a)).unwrap();
        tree.set_open(a, true);
        tree.set_open(b1, true);
        tree.set_open(b2, true);
        assert_eq!(holds(&tree, a), 2);

        tree.set_open(b1, false);
        assert!(tree.get(a).unwrap().is_open());
        tree.set_open(b2, false);
        assert!(!tree.get(a).unwrap().is_open());
    }

    #[test]
    fn removing_open_child_releases_parent() {
        let mut tree = PopperTree::new();
        let a = tree.insert(manual(), None).unwrap();
        let b = tree.insert(manual(), Some(a)).unwrap();
        tree.set_open_hold(a, true);
        tree.set_open(b, true);
        assert_eq!(holds(&tree, a), 2);

        tree.remove(b);
        assert_eq!(holds(&tree, a), 1);
        assert!(tree.get(a).unwrap().is_open());
        assert!(tree.children(a).is_empty());
    }

    #[test]
    fn remove_disposes_subtree() {
        let mut tree = PopperTree::new();
        let (a, b, c) = chain(&mut tree);
        tree.update(c, |p| p.set_anchor(Some(7)));
        tree.sync_subscriptions();
        tree.set_open(a, true);
        tree.set_open(b, true);
        tree.set_open(c, true);
        let changes = tree.sync_subscriptions();
        assert!(!changes.is_empty());

        let detached = tree.remove(b);
        assert!(!tree.is_alive(b));
        assert!(!tree.is_alive(c));
        assert_eq!(detached.len(), 1);
        assert_eq!(detached[0].detach.map(|(e, _)| e), Some(7));
        assert!(!tree.get(a).unwrap().is_open());
    }

    #[test]
    fn child_cannot_stay_open_under_closed_parent() {
        let mut tree = PopperTree::new();
        let a = tree.insert(manual(), None).unwrap();
        let b = tree.insert(manual(), Some(a)).unwrap();
        tree.set_open(b, true);
        assert!(!tree.get(b).unwrap().is_open());
        assert_eq!(holds(&tree, a), 0);
    }

    #[test]
    fn default_open_child_reports_on_insert() {
        let mut tree = PopperTree::new();
        let a = tree.insert(manual(), None).unwrap();
        tree.set_open(a, true);
        let b = tree
            .insert(
                PopperConfig {
                    default_open: true,
                    ..manual()
                },
                Some(a),
            )
            .unwrap();
        assert!(tree.get(b).unwrap().is_open());
        assert_eq!(holds(&tree, a), 1);
    }

    #[test]
    fn pointer_down_respects_chain() {
        let mut tree = PopperTree::new();
        let a = tree.insert(manual(), None).unwrap();
        let b = tree.insert(manual(), Some(a)).unwrap();
        tree.update(a, |p| {
            p.set_anchor(Some(1));
            p.set_panel(Some(2));
        });
        tree.update(b, |p| {
            p.set_anchor(Some(3));
            p.set_panel(Some(4));
        });
        tree.set_open(a, true);
        tree.set_open(b, true);
        assert_eq!(tree.inside_elements(a), vec![1, 2, 3, 4]);
        assert_eq!(tree.inside_elements(b), vec![3, 4, 1, 2]);

        // Inside the submenu and inside the menu both keep everything open.
        tree.on_pointer_down(&[0, 4]);
        tree.on_pointer_down(&[0, 2]);
        assert!(tree.get(b).unwrap().is_open());

        tree.on_pointer_down(&[0, 9]);
        assert!(!tree.get(a).unwrap().is_open());
        assert!(!tree.get(b).unwrap().is_open());
    }

    #[test]
    fn context_and_before_open() {
        use alloc::rc::Rc;
        use core::cell::Cell;

        let mut tree = PopperTree::new();
        let a = tree
            .insert(
                PopperConfig {
                    auto_close: true,
                    ..manual()
                },
                None,
            )
            .unwrap();
        assert_eq!(
            tree.context(a),
            Some(PopperContext {
                auto_close: true,
                open: false
            })
        );

        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        let key = tree
            .register_before_open(a, move || r.set(r.get() + 1))
            .unwrap();

        struct Screen;
        impl Measure<u32> for Screen {
            fn rect(&self, _: u32) -> Option<kurbo::Rect> {
                None
            }
            fn viewport(&self) -> kurbo::Rect {
                kurbo::Rect::new(0.0, 0.0, 100.0, 100.0)
            }
        }

        tree.set_open(a, true);
        tree.layout(&Screen);
        assert_eq!(runs.get(), 1);
        assert!(tree.context(a).unwrap().open);

        assert!(tree.unregister_before_open(a, key));
        tree.set_open(a, false);
        tree.set_open(a, true);
        tree.layout(&Screen);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn tree_wide_timers() {
        let mut tree = PopperTree::new();
        let hover = || PopperConfig::<u32> {
            mouse_enter_delay: 100,
            ..PopperConfig::default()
        };
        let a = tree.insert(hover(), None).unwrap();
        let b = tree.insert(hover(), None).unwrap();
        tree.on_anchor_event(a, AnchorEvent::PointerEnter, 0);
        tree.on_anchor_event(b, AnchorEvent::PointerEnter, 50);
        assert_eq!(tree.next_deadline(), Some(100));

        tree.poll(100);
        assert!(tree.get(a).unwrap().is_open());
        assert!(!tree.get(b).unwrap().is_open());
        assert_eq!(tree.next_deadline(), Some(150));

        let events = tree.drain_events();
        assert!(events.contains(&(a, PopperEvent::OpenChange(true))));
    }
}
