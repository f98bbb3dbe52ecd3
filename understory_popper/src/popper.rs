// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single floating-panel instance.
//!
//! [`Popper`] ties the pieces together for one anchor/panel pair: it feeds input through
//! a [`TriggerCoordinator`], reconciles the resulting intents with its [`HoldCounter`],
//! drives a [`VisibilityLifecycle`], and calls the [solver](crate::solver) when geometry
//! is needed.
//!
//! ## Host loop
//!
//! 1) Forward anchor and panel input ([`Popper::on_anchor_event`], [`Popper::on_panel_event`]).
//! 2) Poll hover timers at [`Popper::next_deadline`] with [`Popper::poll`].
//! 3) After mounting the panel, call [`Popper::layout`] while [`Popper::needs_layout`] is set.
//! 4) Call [`Popper::on_animation_frame`] on the next frame and
//!    [`Popper::on_animation_complete`] when a transition ends.
//! 5) Apply [`Popper::sync_subscriptions`] and drain [`Popper::drain_events`].
//!
//! The crate-level example walks through one pass of this loop.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};
use smallvec::SmallVec;

use crate::handle::ComposedHandle;
use crate::lifecycle::{LifecycleEvent, LifecycleEvents, MountStrategy, Phase, VisibilityLifecycle};
use crate::nesting::{BeforeOpenCallbacks, HoldCounter};
use crate::placement::{Alignment, Edge, Placement};
use crate::solver::{Anchor, FitRequest, TransformOrigin, solve};
use crate::subscription::{SubscriptionBinding, SubscriptionChange, Subscriptions};
use crate::transition::{StagedTransform, Variant};
use crate::trigger::{AnchorEvent, HoverDelays, Intent, PanelEvent, TriggerCoordinator, TriggerSet};

/// Where a panel is rendered, or which rectangle bounds its overflow test.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Container<E> {
    /// The root viewport.
    #[default]
    Root,
    /// A specific element.
    Element(E),
}

/// Measurement provider supplied by the host.
///
/// All rectangles share one client coordinate space (the root viewport's).
pub trait Measure<E> {
    /// Bounding rectangle of an element, or `None` if it is not laid out.
    fn rect(&self, element: E) -> Option<Rect>;

    /// The root viewport.
    fn viewport(&self) -> Rect;

    /// Scroll offset of a container, added to container-local coordinates.
    fn scroll_offset(&self, container: Container<E>) -> Vec2 {
        let _ = container;
        Vec2::ZERO
    }
}

/// Configuration for one [`Popper`].
#[derive(Clone, Debug)]
pub struct PopperConfig<E> {
    /// Requested placement, subject to fallback.
    pub placement: Placement,
    /// Gap between anchor and panel.
    pub offset: f64,
    /// Active triggers. Empty means the panel is driven only by explicit calls.
    pub trigger: TriggerSet,
    /// Hover enter delay in host time units.
    pub mouse_enter_delay: u64,
    /// Hover leave delay in host time units.
    pub mouse_leave_delay: u64,
    /// Shape of the entry animation.
    pub variant: Variant,
    /// Match the panel's cross-axis size to the anchor.
    pub size_adaptable: bool,
    /// Clicking the anchor while open force-closes.
    pub click_to_close: bool,
    /// Clicking inside the panel closes it.
    pub auto_close: bool,
    /// Mount strategy, see [`MountStrategy::from_force_render`].
    pub force_render: Option<bool>,
    /// Externally controlled open state.
    pub open: Option<bool>,
    /// Initial open state when uncontrolled.
    pub default_open: bool,
    /// Ignore every open request.
    pub disabled: bool,
    /// Close when a pointer press lands outside every inside element.
    pub close_on_click_outside: bool,
    /// Stage a collapsed entry transform and wait for animation notifications.
    pub animate: bool,
    /// Container the panel is rendered into.
    pub container: Container<E>,
    /// Container bounding overflow tests; defaults to `container`.
    pub effect_container: Option<Container<E>>,
    /// Auxiliary elements that count as inside for click-outside detection.
    pub targets: Vec<E>,
}

impl<E> Default for PopperConfig<E> {
    fn default() -> Self {
        Self {
            placement: Placement::Top,
            offset: 4.0,
            trigger: TriggerSet::HOVER,
            mouse_enter_delay: 150,
            mouse_leave_delay: 150,
            variant: Variant::Zoom,
            size_adaptable: false,
            click_to_close: false,
            auto_close: false,
            force_render: None,
            open: None,
            default_open: false,
            disabled: false,
            close_on_click_outside: true,
            animate: true,
            container: Container::Root,
            effect_container: None,
            targets: Vec::new(),
        }
    }
}

impl<E> PopperConfig<E> {
    fn delays(&self) -> HoverDelays {
        HoverDelays {
            enter: self.mouse_enter_delay,
            leave: self.mouse_leave_delay,
        }
    }
}

/// Panel geometry relative to its rendering container.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Left offset in container-local coordinates.
    pub left: f64,
    /// Top offset in container-local coordinates.
    pub top: f64,
    /// Forced width, when sized to the anchor.
    pub width: Option<f64>,
    /// Forced height, when sized to the anchor.
    pub height: Option<f64>,
    /// Transform origin for scale animations.
    pub transform_origin: TransformOrigin,
}

/// Result of the most recent fit.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PopperState {
    /// Open state at the time of the fit.
    pub open: bool,
    /// Resolved placement.
    pub placement: Placement,
    /// Container-local geometry.
    pub bounds: Bounds,
    /// Panel rectangle in client coordinates.
    pub rect: Rect,
    /// Primary edge of the resolved placement.
    pub resolved_place_a: Edge,
    /// Secondary alignment of the resolved placement.
    pub resolved_place_b: Option<Alignment>,
    /// Transform to apply to the panel right now.
    pub transform: StagedTransform,
}

/// Options for [`Popper::fit`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FitOptions {
    /// Stage the collapsed entry transform.
    pub animate: bool,
    /// Re-use the last resolved placement without a fallback search.
    pub keep_placement: bool,
}

/// Notifications for the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PopperEvent {
    /// The open state changed or, when controlled, a change was requested.
    OpenChange(bool),
    /// The open or close transition finished.
    OpenChangeEnd(bool),
    /// Mount the panel subtree.
    Mounted,
    /// Unmount the panel subtree.
    Unmounted,
    /// The staged geometry was painted; apply the final transform.
    Settled,
}

/// One anchor/panel instance.
#[derive(Debug)]
pub struct Popper<E> {
    config: PopperConfig<E>,
    triggers: TriggerCoordinator,
    lifecycle: VisibilityLifecycle,
    hold: HoldCounter,
    before_open: BeforeOpenCallbacks,
    anchor: ComposedHandle<E>,
    panel: Option<E>,
    open: bool,
    state: Option<PopperState>,
    context_menu: Option<Point>,
    layout: Option<FitOptions>,
    subscriptions: SubscriptionBinding<E>,
    events: Vec<PopperEvent>,
    disposed: bool,
}

impl<E: Copy + PartialEq> Popper<E> {
    /// Creates an instance. A controlled `open` or `default_open` of `true` starts the
    /// open transition right away.
    pub fn new(config: PopperConfig<E>) -> Self {
        let triggers =
            TriggerCoordinator::new(config.trigger, config.delays(), config.click_to_close);
        let lifecycle = VisibilityLifecycle::new(
            MountStrategy::from_force_render(config.force_render),
            config.animate,
        );
        let initially_open = config.open.unwrap_or(config.default_open);
        let mut popper = Self {
            config,
            triggers,
            lifecycle,
            hold: HoldCounter::new(),
            before_open: BeforeOpenCallbacks::new(),
            anchor: ComposedHandle::new(),
            panel: None,
            open: false,
            state: None,
            context_menu: None,
            layout: None,
            subscriptions: SubscriptionBinding::new(),
            events: Vec::new(),
            disposed: false,
        };
        if popper.lifecycle.is_mounted() {
            popper.events.push(PopperEvent::Mounted);
        }
        if initially_open && !popper.config.disabled {
            popper.open = true;
            popper.transition(true);
        }
        popper
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &PopperConfig<E> {
        &self.config
    }

    /// Replaces the configuration.
    ///
    /// Trigger changes cancel pending hover timers; a changed `open` is applied as if
    /// passed to [`Self::set_open_prop`]. Call [`Self::sync_subscriptions`] afterwards.
    pub fn set_config(&mut self, config: PopperConfig<E>) {
        if self.disposed {
            return;
        }
        self.triggers
            .reconfigure(config.trigger, config.delays(), config.click_to_close);
        let events = self
            .lifecycle
            .set_strategy(MountStrategy::from_force_render(config.force_render));
        self.lifecycle.set_animate(config.animate);
        self.push_lifecycle(events);
        let open = config.open;
        let changed = open != self.config.open;
        self.config = config;
        if changed {
            self.set_open_prop(open);
        }
    }

    /// Whether the panel is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether the panel subtree should be mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Whether the host may run the transition to full scale.
    #[must_use]
    pub fn may_animate(&self) -> bool {
        self.lifecycle.may_animate()
    }

    /// Geometry from the most recent fit.
    #[must_use]
    pub fn state(&self) -> Option<&PopperState> {
        self.state.as_ref()
    }

    /// Outstanding holds.
    #[must_use]
    pub fn hold_count(&self) -> u32 {
        self.hold.get()
    }

    /// The captured context-menu point, if the panel is anchored to one.
    #[must_use]
    pub fn context_menu(&self) -> Option<Point> {
        self.context_menu
    }

    /// The anchor element.
    #[must_use]
    pub fn anchor(&self) -> Option<E> {
        self.anchor.get()
    }

    /// The anchor handle, for consumers that also need the anchor element.
    pub fn anchor_handle_mut(&mut self) -> &mut ComposedHandle<E> {
        &mut self.anchor
    }

    /// Sets the anchor element. Call [`Self::sync_subscriptions`] afterwards.
    pub fn set_anchor(&mut self, anchor: Option<E>) {
        if !self.disposed {
            self.anchor.set(anchor);
        }
    }

    /// The panel element.
    #[must_use]
    pub fn panel(&self) -> Option<E> {
        self.panel
    }

    /// Sets the panel element, once the host has mounted it.
    pub fn set_panel(&mut self, panel: Option<E>) {
        if !self.disposed {
            self.panel = panel;
        }
    }

    /// Callbacks run once per open, after mount and before the first fit.
    pub fn before_open_callbacks_mut(&mut self) -> &mut BeforeOpenCallbacks {
        &mut self.before_open
    }

    /// Takes the pending notifications.
    pub fn drain_events(&mut self) -> Vec<PopperEvent> {
        core::mem::take(&mut self.events)
    }

    /// Opens, or requests a close that is honored only when nothing holds the panel.
    pub fn set_open(&mut self, open: bool) {
        if self.disposed {
            return;
        }
        if open {
            self.request(true);
        } else if self.hold.is_zero() {
            self.request(false);
        }
    }

    /// Opens and takes a hold, or releases a hold and closes when none remain.
    pub fn set_open_hold(&mut self, open: bool) {
        if self.disposed {
            return;
        }
        if open {
            if self.config.disabled {
                return;
            }
            self.hold.increment();
            self.request(true);
        } else if self.hold.decrement() {
            self.request(false);
        }
    }

    /// Opens, or closes regardless of holds and resets the hold count.
    pub fn set_open_force(&mut self, open: bool) {
        if self.disposed {
            return;
        }
        if open {
            self.request(true);
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(holds = self.hold.get(), "popper force-closed");
            self.hold.reset();
            self.triggers.release_all();
            self.request(false);
        }
    }

    /// A nested instance opened (`true`) or closed (`false`).
    pub fn report_child_open_change(&mut self, open: bool) {
        if self.disposed {
            return;
        }
        if open {
            self.hold.increment();
        } else if self.hold.decrement() {
            self.set_open(false);
        }
    }

    /// Applies an externally controlled open state. `None` returns to uncontrolled mode
    /// keeping the current state.
    pub fn set_open_prop(&mut self, open: Option<bool>) {
        if self.disposed {
            return;
        }
        self.config.open = open;
        if let Some(open) = open {
            if open != self.open {
                self.open = open;
                self.transition(open);
            }
        }
    }

    /// Handles input on the anchor. Returns `true` if the host should suppress the
    /// event's default action.
    pub fn on_anchor_event(&mut self, event: AnchorEvent, now: u64) -> bool {
        if self.disposed || self.config.disabled {
            return false;
        }
        // A controlled request the host did not apply leaves no hold behind.
        if self.config.open.is_some() && !self.open {
            self.triggers.release_holds();
            self.hold.reset();
        }
        let response = self.triggers.on_anchor(event, self.open, now);
        for intent in response.intents {
            self.apply(intent);
        }
        response.prevent_default
    }

    /// Handles input on the panel.
    pub fn on_panel_event(&mut self, event: PanelEvent, now: u64) {
        if self.disposed {
            return;
        }
        if event == PanelEvent::Click {
            if self.config.auto_close && self.open {
                self.set_open_force(false);
            }
            return;
        }
        let response = self.triggers.on_panel(event, self.open, now);
        for intent in response.intents {
            self.apply(intent);
        }
    }

    /// Deadline of the pending hover timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        if self.disposed {
            None
        } else {
            self.triggers.next_deadline()
        }
    }

    /// Fires the hover timer if due.
    pub fn poll(&mut self, now: u64) {
        if self.disposed {
            return;
        }
        if let Some(intent) = self.triggers.poll(now) {
            self.apply(intent);
        }
    }

    /// Elements that count as inside for click-outside detection.
    ///
    /// While anchored to a context-menu point only the panel counts; the anchor element
    /// is just where the point came from.
    #[must_use]
    pub fn inside_elements(&self) -> SmallVec<[E; 4]> {
        let mut inside = SmallVec::new();
        if self.context_menu.is_none() {
            inside.extend(self.anchor.get());
            inside.extend(self.config.targets.iter().copied());
        }
        inside.extend(self.panel);
        inside
    }

    /// A pointer press landed outside every inside element.
    pub fn on_click_outside(&mut self) {
        if self.config.close_on_click_outside && self.open {
            self.set_open_force(false);
        }
    }

    /// Whether a layout pass is pending.
    #[must_use]
    pub fn needs_layout(&self) -> bool {
        !self.disposed && self.layout.is_some()
    }

    /// Runs the pending layout pass: before-open callbacks and the staged fit for an
    /// opening panel, or a re-fit for a moved context-menu point.
    pub fn layout(&mut self, measure: &impl Measure<E>) {
        if self.disposed {
            return;
        }
        let Some(options) = self.layout.take() else {
            return;
        };
        if self.lifecycle.phase() == Phase::Opening {
            self.before_open.run();
            self.fit(measure, options);
            let events = self.lifecycle.staged();
            self.push_lifecycle(events);
        } else if self.lifecycle.is_shown() {
            self.fit(measure, options);
        }
    }

    /// Recomputes geometry.
    ///
    /// Does nothing if the anchor cannot be measured; the last geometry is kept.
    pub fn fit(&mut self, measure: &impl Measure<E>, options: FitOptions) -> Option<&PopperState> {
        if self.disposed {
            return None;
        }
        let anchor = match self.context_menu {
            Some(point) => Anchor::Point(point),
            None => Anchor::Rect(measure.rect(self.anchor.get()?)?),
        };
        let panel = self
            .panel
            .and_then(|p| measure.rect(p))
            .map_or(Size::ZERO, |r| r.size());
        let effect = self.config.effect_container.unwrap_or(self.config.container);
        let bounds = container_rect(measure, effect);
        let previous = self.state.map(|s| s.placement);
        let keep = options.keep_placement && previous.is_some();
        let request = FitRequest {
            anchor,
            bounds,
            panel,
            placement: previous
                .filter(|_| keep)
                .unwrap_or(self.config.placement),
            offset: self.config.offset,
            size_adaptable: self.config.size_adaptable,
            forced: keep,
        };
        let fit = solve(&request);

        let container = self.config.container;
        let local = container_rect(measure, container).origin().to_vec2()
            - measure.scroll_offset(container);
        let sized = self.config.size_adaptable && self.context_menu.is_none();
        let transform = if options.animate {
            StagedTransform::staged(self.config.variant, fit.placement)
        } else if self.lifecycle.phase() == Phase::Staged {
            self.state.map_or(StagedTransform::IDENTITY, |s| s.transform)
        } else {
            StagedTransform::IDENTITY
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            requested = %self.config.placement,
            resolved = %fit.placement,
            attempts = fit.attempts,
            overflows = fit.overflows,
            "popper fit"
        );

        self.state = Some(PopperState {
            open: self.open,
            placement: fit.placement,
            bounds: Bounds {
                left: fit.rect.x0 - local.x,
                top: fit.rect.y0 - local.y,
                width: (sized && fit.placement.is_vertical()).then(|| fit.rect.width()),
                height: (sized && !fit.placement.is_vertical()).then(|| fit.rect.height()),
                transform_origin: fit.origin,
            },
            rect: fit.rect,
            resolved_place_a: fit.placement.edge(),
            resolved_place_b: fit.placement.alignment(),
            transform,
        });
        self.state.as_ref()
    }

    /// One animation frame passed; reveals staged geometry.
    pub fn on_animation_frame(&mut self) {
        if self.disposed {
            return;
        }
        if let Some(event) = self.lifecycle.animation_frame() {
            if let Some(state) = &mut self.state {
                state.transform = StagedTransform::IDENTITY;
            }
            self.push_lifecycle([event].into_iter().collect());
        }
    }

    /// The running open or close animation finished.
    pub fn on_animation_complete(&mut self) {
        if self.disposed {
            return;
        }
        let events = self.lifecycle.animation_complete();
        self.push_lifecycle(events);
    }

    /// The anchor changed size.
    pub fn on_anchor_resize(&mut self, measure: &impl Measure<E>) {
        self.refit(measure, false);
    }

    /// The panel left its container's visible area.
    pub fn on_panel_exit_viewport(&mut self, measure: &impl Measure<E>) {
        self.refit(measure, false);
    }

    /// A scrollable ancestor of the anchor scrolled.
    ///
    /// Re-fits at the last resolved placement; in context-menu mode the point is stale,
    /// so the panel is force-closed instead.
    pub fn on_ancestor_scroll(&mut self, measure: &impl Measure<E>) {
        if self.disposed || !self.open {
            return;
        }
        if self.context_menu.is_some() {
            self.set_open_force(false);
        } else {
            self.refit(measure, true);
        }
    }

    /// The window resized: force-closes.
    pub fn on_window_resize(&mut self) {
        if !self.disposed && self.open {
            self.set_open_force(false);
        }
    }

    /// Subscriptions the instance currently wants.
    #[must_use]
    pub fn subscriptions(&self) -> Subscriptions {
        if self.disposed {
            return Subscriptions::empty();
        }
        let mut wanted = if self.config.disabled {
            Subscriptions::empty()
        } else {
            self.triggers.listeners()
        };
        if self.open {
            wanted |= Subscriptions::OPEN_OBSERVERS;
            if self.config.close_on_click_outside {
                wanted |= Subscriptions::CLICK_OUTSIDE;
            }
        }
        wanted
    }

    /// Reconciles attached subscriptions with [`Self::subscriptions`].
    pub fn sync_subscriptions(&mut self) -> Option<SubscriptionChange<E>> {
        let wanted = self.subscriptions();
        let change = self.subscriptions.sync(self.anchor.get(), wanted);
        #[cfg(feature = "tracing")]
        if let Some(change) = &change {
            tracing::debug!(
                detach = ?change.detach.map(|(_, s)| s),
                attach = ?change.attach.map(|(_, s)| s),
                "popper subscriptions changed"
            );
        }
        change
    }

    /// Tears the instance down: cancels timers and returns the subscriptions to detach.
    /// Every later call is a no-op.
    pub fn dispose(&mut self) -> Option<SubscriptionChange<E>> {
        if self.disposed {
            return None;
        }
        self.triggers.release_all();
        self.hold.reset();
        self.layout = None;
        self.lifecycle.reset();
        self.before_open.clear();
        self.disposed = true;
        self.subscriptions.clear()
    }

    fn refit(&mut self, measure: &impl Measure<E>, keep_placement: bool) {
        if self.disposed || !self.lifecycle.is_shown() {
            return;
        }
        self.fit(
            measure,
            FitOptions {
                animate: false,
                keep_placement,
            },
        );
    }

    fn apply(&mut self, intent: Intent) {
        match intent {
            Intent::Open => self.set_open(true),
            Intent::Close => self.set_open(false),
            Intent::Hold(open) => self.set_open_hold(open),
            Intent::ForceClose => self.set_open_force(false),
            Intent::ContextMenu(point) => {
                if self.config.disabled {
                    return;
                }
                self.context_menu = Some(point);
                if self.lifecycle.is_shown() {
                    self.layout = Some(FitOptions::default());
                }
            }
        }
    }

    fn request(&mut self, open: bool) {
        if open && self.config.disabled {
            return;
        }
        if self.config.open.is_some() {
            if open != self.open {
                self.events.push(PopperEvent::OpenChange(open));
            }
            return;
        }
        if open == self.open {
            return;
        }
        self.open = open;
        self.events.push(PopperEvent::OpenChange(open));
        self.transition(open);
    }

    fn transition(&mut self, open: bool) {
        #[cfg(feature = "tracing")]
        tracing::debug!(open, holds = self.hold.get(), "popper open state changed");
        if open {
            let events = self.lifecycle.open();
            self.push_lifecycle(events);
            self.layout = Some(FitOptions {
                animate: self.config.animate,
                keep_placement: false,
            });
        } else {
            self.hold.reset();
            self.triggers.release_all();
            self.context_menu = None;
            self.layout = None;
            if let Some(state) = &mut self.state {
                state.open = false;
            }
            let events = self.lifecycle.close();
            self.push_lifecycle(events);
        }
    }

    fn push_lifecycle(&mut self, events: LifecycleEvents) {
        for event in events {
            self.events.push(match event {
                LifecycleEvent::Mounted => PopperEvent::Mounted,
                LifecycleEvent::Unmounted => PopperEvent::Unmounted,
                LifecycleEvent::Settled => PopperEvent::Settled,
                LifecycleEvent::OpenEnd => PopperEvent::OpenChangeEnd(true),
                LifecycleEvent::CloseEnd => PopperEvent::OpenChangeEnd(false),
            });
        }
    }
}

fn container_rect<E>(measure: &impl Measure<E>, container: Container<E>) -> Rect {
    match container {
        Container::Root => measure.viewport(),
        Container::Element(e) => measure.rect(e).unwrap_or_else(|| measure.viewport()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    const ANCHOR: u32 = 1;
    const PANEL: u32 = 2;
    const BOX: u32 = 3;

    struct Page {
        anchor: Option<Rect>,
        panel: Size,
    }

    impl Measure<u32> for Page {
        fn rect(&self, element: u32) -> Option<Rect> {
            match element {
                ANCHOR => self.anchor,
                PANEL => Some(Rect::from_origin_size((0.0, 0.0), self.panel)),
                BOX => Some(Rect::new(50.0, 60.0, 450.0, 450.0)),
                _ => None,
            }
        }

        fn viewport(&self) -> Rect {
            Rect::new(0.0, 0.0, 800.0, 600.0)
        }

        fn scroll_offset(&self, container: Container<u32>) -> Vec2 {
            match container {
                Container::Element(BOX) => Vec2::new(0.0, 30.0),
                _ => Vec2::ZERO,
            }
        }
    }

    fn page() -> Page {
        Page {
            anchor: Some(Rect::new(100.0, 100.0, 150.0, 120.0)),
            panel: Size::new(120.0, 40.0),
        }
    }

    fn popper(config: PopperConfig<u32>) -> Popper<u32> {
        let mut p = Popper::new(config);
        p.set_anchor(Some(ANCHOR));
        p.set_panel(Some(PANEL));
        p
    }

    #[test]
    fn animated_open_stages_then_settles() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CLICK,
            offset: 8.0,
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::Click, 0);
        assert_eq!(p.phase(), Phase::Opening);
        assert!(p.needs_layout());
        p.layout(&page());

        let state = *p.state().unwrap();
        assert_eq!(p.phase(), Phase::Staged);
        assert_eq!(state.transform, StagedTransform::staged(Variant::Zoom, Placement::Top));
        assert_eq!(state.bounds.transform_origin, TransformOrigin::new(50.0, 100.0));

        p.on_animation_frame();
        assert!(p.may_animate());
        assert!(p.state().unwrap().transform.is_identity());
        p.on_animation_complete();
        assert_eq!(
            p.drain_events(),
            vec![
                PopperEvent::OpenChange(true),
                PopperEvent::Mounted,
                PopperEvent::Settled,
                PopperEvent::OpenChangeEnd(true),
            ]
        );
    }

    #[test]
    fn before_open_runs_once_per_open() {
        use alloc::rc::Rc;
        use core::cell::Cell;

        let runs = Rc::new(Cell::new(0));
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::empty(),
            animate: false,
            ..PopperConfig::default()
        });
        let r = runs.clone();
        p.before_open_callbacks_mut().insert(move || r.set(r.get() + 1));

        p.set_open(true);
        p.layout(&page());
        p.layout(&page());
        assert_eq!(runs.get(), 1);

        p.on_anchor_resize(&page());
        assert_eq!(runs.get(), 1);

        p.set_open(false);
        p.set_open(true);
        p.layout(&page());
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn missing_anchor_keeps_last_geometry() {
        let mut p = popper(PopperConfig {
            animate: false,
            ..PopperConfig::default()
        });
        p.set_open(true);
        p.layout(&page());
        let before = *p.state().unwrap();

        let gone = Page {
            anchor: None,
            panel: Size::new(10.0, 10.0),
        };
        assert!(p.fit(&gone, FitOptions::default()).is_none());
        assert_eq!(*p.state().unwrap(), before);
    }

    #[test]
    fn bounds_are_container_local() {
        let mut p = popper(PopperConfig {
            animate: false,
            offset: 8.0,
            container: Container::Element(BOX),
            effect_container: Some(Container::Root),
            ..PopperConfig::default()
        });
        p.set_open(true);
        p.layout(&page());
        let state = p.state().unwrap();
        assert_eq!(state.rect.origin(), Point::new(65.0, 52.0));
        assert_eq!(state.bounds.left, 15.0);
        assert_eq!(state.bounds.top, 22.0);
    }

    #[test]
    fn effect_container_bounds_overflow() {
        // The box starts at y=60, so a panel ending 8 above y=100 cannot fit above.
        let mut p = popper(PopperConfig {
            animate: false,
            offset: 8.0,
            effect_container: Some(Container::Element(BOX)),
            ..PopperConfig::default()
        });
        p.set_open(true);
        p.layout(&page());
        assert_eq!(p.state().unwrap().placement, Placement::Bottom);
    }

    #[test]
    fn size_adaptable_reports_width() {
        let mut p = popper(PopperConfig {
            animate: false,
            size_adaptable: true,
            placement: Placement::BottomLeft,
            ..PopperConfig::default()
        });
        p.set_open(true);
        p.layout(&page());
        let bounds = p.state().unwrap().bounds;
        assert_eq!(bounds.width, Some(50.0));
        assert_eq!(bounds.height, None);
    }

    #[test]
    fn controlled_mode_only_requests() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CLICK,
            open: Some(false),
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::Click, 0);
        assert!(!p.is_open());
        assert_eq!(p.drain_events(), vec![PopperEvent::OpenChange(true)]);

        p.set_open_prop(Some(true));
        assert!(p.is_open());
        assert_eq!(p.drain_events(), vec![PopperEvent::Mounted]);
    }

    #[test]
    fn disabled_ignores_open_intents() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CLICK | TriggerSet::FOCUS,
            disabled: true,
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::Click, 0);
        p.on_anchor_event(AnchorEvent::Focus, 0);
        p.set_open(true);
        assert!(!p.is_open());
        assert_eq!(p.hold_count(), 0);
        assert!(p.subscriptions().is_empty());

        let enabled = PopperConfig {
            disabled: false,
            ..p.config().clone()
        };
        p.set_config(enabled);
        p.on_anchor_event(AnchorEvent::Click, 10);
        assert!(p.is_open(), "click opens once re-enabled");
    }

    #[test]
    fn refused_controlled_request_is_asked_again() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CLICK,
            open: Some(false),
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::Click, 0);
        assert_eq!(p.drain_events(), vec![PopperEvent::OpenChange(true)]);

        // The host keeps the panel closed.
        p.on_anchor_event(AnchorEvent::Click, 10);
        assert_eq!(p.drain_events(), vec![PopperEvent::OpenChange(true)]);
        assert_eq!(p.hold_count(), 1);
    }

    #[test]
    fn accepted_controlled_focus_requests_close_on_blur() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::FOCUS,
            open: Some(false),
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::Focus, 0);
        p.set_open_prop(Some(true));
        p.drain_events();

        p.on_anchor_event(AnchorEvent::Blur, 10);
        assert_eq!(p.drain_events(), vec![PopperEvent::OpenChange(false)]);
        assert!(p.is_open(), "the host decides when to close");
    }

    #[test]
    fn holds_from_several_triggers() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CLICK | TriggerSet::FOCUS,
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::Focus, 0);
        p.on_anchor_event(AnchorEvent::Click, 0);
        assert_eq!(p.hold_count(), 2);
        p.on_anchor_event(AnchorEvent::Blur, 0);
        assert!(p.is_open(), "click still holds the panel");
        assert_eq!(p.hold_count(), 1);
    }

    #[test]
    fn hover_close_blocked_by_hold() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::HOVER | TriggerSet::CLICK,
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::PointerEnter, 0);
        p.poll(150);
        assert!(p.is_open());
        p.on_anchor_event(AnchorEvent::Click, 160);
        p.on_anchor_event(AnchorEvent::PointerLeave, 170);
        p.poll(400);
        assert!(p.is_open());
    }

    #[test]
    fn click_outside_and_auto_close() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CLICK,
            auto_close: true,
            targets: vec![9],
            ..PopperConfig::default()
        });
        assert_eq!(p.inside_elements().as_slice(), &[ANCHOR, 9, PANEL]);
        p.on_anchor_event(AnchorEvent::Click, 0);
        p.on_click_outside();
        assert!(!p.is_open());
        assert_eq!(p.hold_count(), 0);

        p.on_anchor_event(AnchorEvent::Click, 0);
        assert!(p.is_open(), "click hold was released by the forced close");
        p.on_panel_event(PanelEvent::Click, 5);
        assert!(!p.is_open());
    }

    #[test]
    fn click_outside_can_be_disabled() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CLICK,
            close_on_click_outside: false,
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::Click, 0);
        p.on_click_outside();
        assert!(p.is_open());
        assert!(!p.subscriptions().contains(Subscriptions::CLICK_OUTSIDE));
    }

    #[test]
    fn context_menu_mode() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CONTEXT_MENU,
            placement: Placement::BottomRight,
            animate: false,
            ..PopperConfig::default()
        });
        assert!(p.on_anchor_event(AnchorEvent::ContextMenu(Point::new(300.0, 200.0)), 0));
        p.layout(&page());
        let state = p.state().unwrap();
        assert_eq!((state.bounds.left, state.bounds.top), (300.0, 200.0));
        assert_eq!(state.bounds.transform_origin, TransformOrigin::new(0.0, 0.0));
        assert_eq!(p.inside_elements().as_slice(), &[PANEL]);

        // A second request moves the panel.
        p.on_anchor_event(AnchorEvent::ContextMenu(Point::new(10.0, 20.0)), 5);
        assert!(p.needs_layout());
        p.layout(&page());
        assert_eq!(p.state().unwrap().rect.origin(), Point::new(10.0, 20.0));

        p.on_ancestor_scroll(&page());
        assert!(!p.is_open());
        assert_eq!(p.context_menu(), None);
    }

    #[test]
    fn scroll_refit_keeps_placement() {
        let mut p = popper(PopperConfig {
            animate: false,
            offset: 8.0,
            ..PopperConfig::default()
        });
        p.set_open(true);
        p.layout(&page());
        assert_eq!(p.state().unwrap().placement, Placement::Top);

        let scrolled = Page {
            anchor: Some(Rect::new(100.0, 10.0, 150.0, 30.0)),
            panel: Size::new(120.0, 40.0),
        };
        p.on_ancestor_scroll(&scrolled);
        let state = p.state().unwrap();
        assert_eq!(state.placement, Placement::Top);
        assert_eq!(state.rect.y0, -38.0);

        p.on_anchor_resize(&scrolled);
        assert_eq!(p.state().unwrap().placement, Placement::Bottom);
    }

    #[test]
    fn window_resize_force_closes() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::FOCUS | TriggerSet::CLICK,
            ..PopperConfig::default()
        });
        p.on_anchor_event(AnchorEvent::Focus, 0);
        p.on_anchor_event(AnchorEvent::Click, 0);
        p.report_child_open_change(true);
        assert_eq!(p.hold_count(), 3);
        p.on_window_resize();
        assert!(!p.is_open());
        assert_eq!(p.hold_count(), 0);
    }

    #[test]
    fn subscriptions_follow_state() {
        let mut p = popper(PopperConfig {
            trigger: TriggerSet::CLICK,
            ..PopperConfig::default()
        });
        let change = p.sync_subscriptions().unwrap();
        assert_eq!(change.attach, Some((ANCHOR, Subscriptions::CLICK)));
        assert!(p.sync_subscriptions().is_none());

        p.set_open(true);
        let change = p.sync_subscriptions().unwrap();
        assert_eq!(
            change.attach,
            Some((
                ANCHOR,
                Subscriptions::OPEN_OBSERVERS | Subscriptions::CLICK_OUTSIDE
            ))
        );

        p.set_anchor(None);
        let change = p.sync_subscriptions().unwrap();
        assert_eq!(change.attach, None);
        assert!(change.detach.is_some());
    }

    #[test]
    fn dispose_silences_everything() {
        let mut p = popper(PopperConfig::default());
        p.sync_subscriptions();
        p.on_anchor_event(AnchorEvent::PointerEnter, 0);
        let change = p.dispose().unwrap();
        assert_eq!(change.detach.map(|(e, _)| e), Some(ANCHOR));

        p.poll(1_000);
        assert!(!p.is_open());
        p.set_open(true);
        assert!(!p.is_open());
        assert_eq!(p.next_deadline(), None);
        assert!(p.dispose().is_none());
    }

    #[test]
    fn default_open_starts_opening() {
        let p = popper(PopperConfig {
            default_open: true,
            force_render: Some(true),
            ..PopperConfig::default()
        });
        assert!(p.is_open());
        assert!(p.needs_layout());
        assert!(p.is_mounted());
    }
}
