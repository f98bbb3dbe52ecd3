// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for placement solving and hold counting.
//!
//! 1. The solver always resolves to one of the twelve placements.
//! 2. If any placement fits, the resolved one fits, for rectangles and pointer positions.
//! 3. Solving is deterministic.
//! 4. A forced solve never leaves the requested placement.
//! 5. Parsing a placement's name gives it back.
//! 6. The hold count equals opens minus closes, clamped at zero.

use kurbo::{Point, Rect, Size};
use proptest::prelude::*;
use understory_popper::nesting::HoldCounter;
use understory_popper::solver::{Anchor, FitRequest, overflows, place, solve};
use understory_popper::Placement;

fn placement() -> impl Strategy<Value = Placement> {
    (0..Placement::ALL.len()).prop_map(|i| Placement::ALL[i])
}

fn request() -> impl Strategy<Value = FitRequest> {
    (
        0.0..800.0_f64,
        0.0..600.0_f64,
        1.0..200.0_f64,
        1.0..100.0_f64,
        1.0..400.0_f64,
        1.0..300.0_f64,
        placement(),
        0.0..16.0_f64,
        any::<bool>(),
    )
        .prop_map(|(x, y, w, h, pw, ph, placement, offset, size_adaptable)| FitRequest {
            anchor: Anchor::Rect(Rect::from_origin_size((x, y), (w, h))),
            bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
            panel: Size::new(pw, ph),
            placement,
            offset,
            size_adaptable,
            forced: false,
        })
}

fn point_request() -> impl Strategy<Value = FitRequest> {
    (
        0.0..=800.0_f64,
        0.0..=600.0_f64,
        1.0..300.0_f64,
        1.0..200.0_f64,
        placement(),
    )
        .prop_map(|(x, y, pw, ph, placement)| FitRequest {
            anchor: Anchor::Point(Point::new(x, y)),
            bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
            panel: Size::new(pw, ph),
            placement,
            offset: 8.0,
            size_adaptable: false,
            forced: false,
        })
}

fn check_preference(req: &FitRequest) -> Result<(), TestCaseError> {
    let any_fits = Placement::ALL.iter().any(|p| {
        let (rect, _) = place(req.anchor, req.panel, *p, req.offset, req.size_adaptable);
        !overflows(rect, req.bounds)
    });
    let fit = solve(req);
    prop_assert_eq!(fit.overflows, !any_fits);
    if !any_fits {
        prop_assert_eq!(fit.placement, req.placement);
    }
    Ok(())
}

#[test]
fn pointer_in_corner_flips_to_top_left() {
    let req = FitRequest {
        anchor: Anchor::Point(Point::new(780.0, 580.0)),
        bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
        panel: Size::new(100.0, 50.0),
        placement: Placement::BottomRight,
        offset: 8.0,
        size_adaptable: false,
        forced: false,
    };
    let fit = solve(&req);
    assert_eq!(fit.placement, Placement::TopLeft);
    assert_eq!(fit.rect, Rect::new(680.0, 530.0, 780.0, 580.0));
    assert!(!fit.overflows);
}

proptest! {
    #[test]
    fn resolves_to_a_known_placement(req in request()) {
        let fit = solve(&req);
        prop_assert!(Placement::ALL.contains(&fit.placement));
        prop_assert!(fit.attempts >= 1 && fit.attempts <= 13);
    }

    #[test]
    fn prefers_a_fitting_placement(req in request()) {
        check_preference(&req)?;
    }

    #[test]
    fn pointer_prefers_a_fitting_placement(req in point_request()) {
        check_preference(&req)?;
        let fit = solve(&req);
        if !fit.overflows {
            prop_assert!(req.bounds.contains_rect(fit.rect));
        }
    }

    #[test]
    fn solving_is_deterministic(req in request()) {
        prop_assert_eq!(solve(&req), solve(&req));
    }

    #[test]
    fn forced_keeps_the_request(req in request()) {
        let forced = FitRequest { forced: true, ..req };
        let fit = solve(&forced);
        prop_assert_eq!(fit.placement, req.placement);
        prop_assert_eq!(fit.attempts, 1);
    }

    #[test]
    fn names_round_trip(p in placement()) {
        prop_assert_eq!(Placement::parse(p.as_str()), p);
    }

    #[test]
    fn hold_count_is_clamped_difference(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
        let mut counter = HoldCounter::new();
        let mut model: u32 = 0;
        for open in ops {
            if open {
                counter.increment();
                model += 1;
            } else {
                counter.decrement();
                model = model.saturating_sub(1);
            }
            prop_assert_eq!(counter.get(), model);
        }
        counter.reset();
        prop_assert!(counter.is_zero());
    }
}
