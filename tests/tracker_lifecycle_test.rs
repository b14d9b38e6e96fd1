//! Boundary tracker lifecycle: warm-up, establishment, steady state


use baby_position_validator::{
    boundary::{is_in_frame, Boundary},
    boundary_tracker::{BoundaryTracker, BoxStatus, TrackerConfig, TrackerUpdate},
    landmarks::LandmarkPoint,
};
use proptest::prelude::*;
use test_helpers::{point, run_tracker, small_tracker_config};

#[test]
fn test_worked_example_establish_then_expand() {
    let frames = vec![point(10.0, 10.0), point(20.0, 20.0), point(15.0, 15.0), point(40.0, 20.0)];
    let updates = run_tracker(small_tracker_config(2, 5, 1), &frames, 100, 100);

    assert_eq!(updates[0], TrackerUpdate::Initializing { progress: 1 });
    assert_eq!(updates[1], TrackerUpdate::Initializing { progress: 2 });
    assert_eq!(updates[2], TrackerUpdate::BoundaryEstablished(Boundary::new(5, 5, 25, 25)));
    assert_eq!(updates[3], TrackerUpdate::StretchedAndExpanded(Boundary::new(5, 5, 45, 25)));
}

#[test]
fn test_warmup_never_reports_a_boundary() {
    let mut tracker = BoundaryTracker::new(TrackerConfig::default());
    for i in 0..30 {
        let landmarks = if i % 3 == 0 { Vec::new() } else { point(300.0, 200.0) };
        let update = tracker.process(&landmarks, 640, 480);
        assert_eq!(update.status(), BoxStatus::Initializing);
        assert_eq!(update.boundary(), None);
    }
    assert_eq!(tracker.frame_count(), 30);
    assert_eq!(tracker.history_len(), 20);
}

#[test]
fn test_empty_warmup_frames_consume_slots() {
    let frames = vec![Vec::new(), point(50.0, 50.0), Vec::new(), point(60.0, 60.0)];
    let updates = run_tracker(small_tracker_config(3, 10, 5), &frames, 200, 200);

    assert_eq!(updates[0].init_progress(), 0);
    assert_eq!(updates[1].init_progress(), 1);
    assert_eq!(updates[2].init_progress(), 1);
    // Warm-up is over on the fourth call even though only one entry was stored
    assert_eq!(updates[3], TrackerUpdate::BoundaryEstablished(Boundary::new(40, 40, 60, 60)));
}

#[test]
fn test_establishment_uses_every_history_point_unclamped() {
    let frames = vec![
        vec![LandmarkPoint::pose(3.0, 90.0), LandmarkPoint::face(70.0, 4.0)],
        vec![LandmarkPoint::pose(12.5, 12.5)],
        Vec::new(),
    ];
    let updates = run_tracker(small_tracker_config(2, 20, 5), &frames, 80, 100);

    let established = Boundary::new(-17, -16, 90, 110);
    assert_eq!(updates[2], TrackerUpdate::BoundaryEstablished(established));
    assert!(!is_in_frame(updates[2].boundary().as_ref(), 80, 100));
}

#[test]
fn test_truncation_toward_zero() {
    let frames = vec![point(10.9, 10.9), Vec::new()];
    let updates = run_tracker(small_tracker_config(1, 15, 5), &frames, 100, 100);

    // 10.9 - 15 = -4.1 truncates to -4, 10.9 + 15 = 25.9 truncates to 25
    assert_eq!(updates[1].boundary(), Some(Boundary::new(-4, -4, 25, 25)));
}

#[test]
fn test_initialization_failure_is_terminal() {
    let config = TrackerConfig {
        initialization_frames: 3,
        min_history_points: 5,
        ..TrackerConfig::default()
    };
    let mut tracker = BoundaryTracker::new(config);

    for _ in 0..3 {
        tracker.process(&point(100.0, 100.0), 640, 480);
    }
    for _ in 0..10 {
        let update = tracker.process(&[LandmarkPoint::pose(100.0, 100.0); 40], 640, 480);
        assert_eq!(update, TrackerUpdate::InitializationFailed);
        assert_eq!(update.init_progress(), 0);
    }
    assert!(tracker.is_failed());
    assert_eq!(tracker.established_boundary(), None);
}

#[test]
fn test_no_landmarks_keeps_boundary() {
    let frames = vec![point(50.0, 50.0), point(50.0, 50.0), Vec::new(), Vec::new()];
    let updates = run_tracker(small_tracker_config(1, 10, 2), &frames, 100, 100);

    let established = Boundary::new(40, 40, 60, 60);
    assert_eq!(updates[1], TrackerUpdate::BoundaryEstablished(established));
    assert_eq!(updates[2], TrackerUpdate::NoLandmarks(established));
    assert_eq!(updates[3], TrackerUpdate::NoLandmarks(established));
}

#[test]
fn test_each_edge_expands() {
    let established = Boundary::new(40, 40, 60, 60);
    let cases = [
        (point(20.0, 50.0), Boundary::new(10, 40, 60, 60)),
        (point(80.0, 50.0), Boundary::new(40, 40, 90, 60)),
        (point(50.0, 20.0), Boundary::new(40, 10, 60, 60)),
        (point(50.0, 80.0), Boundary::new(40, 40, 60, 90)),
    ];

    for (landmarks, expected) in cases {
        let frames = vec![point(50.0, 50.0), point(50.0, 50.0), landmarks];
        let updates = run_tracker(small_tracker_config(1, 10, 2), &frames, 200, 200);
        assert_eq!(updates[1].boundary(), Some(established));
        assert_eq!(updates[2], TrackerUpdate::StretchedAndExpanded(expected));
    }
}

#[test]
fn test_expansion_is_clamped_to_frame() {
    let frames = vec![point(50.0, 50.0), Vec::new(), point(5.0, 98.0)];
    let updates = run_tracker(small_tracker_config(1, 20, 2), &frames, 100, 100);

    assert_eq!(updates[1].boundary(), Some(Boundary::new(30, 30, 70, 70)));
    assert_eq!(updates[2], TrackerUpdate::StretchedAndExpanded(Boundary::new(0, 30, 70, 100)));
}

#[test]
fn test_points_on_threshold_do_not_expand() {
    // Exactly x2 + threshold is not past the boundary
    let frames = vec![point(50.0, 50.0), Vec::new(), point(62.0, 38.0)];
    let updates = run_tracker(small_tracker_config(1, 10, 2), &frames, 200, 200);

    assert_eq!(updates[2], TrackerUpdate::Stable(Boundary::new(40, 40, 60, 60)));
}

#[test]
fn test_points_applied_in_order_within_a_frame() {
    // The second point is compared against the boundary already widened by the first
    let frames = vec![
        point(50.0, 50.0),
        Vec::new(),
        vec![LandmarkPoint::pose(80.0, 50.0), LandmarkPoint::pose(85.0, 50.0)],
    ];
    let updates = run_tracker(small_tracker_config(1, 10, 2), &frames, 200, 200);

    assert_eq!(updates[2], TrackerUpdate::StretchedAndExpanded(Boundary::new(40, 40, 90, 60)));
}

#[test]
fn test_high_edge_clamp_can_pull_an_unclamped_boundary_inward() {
    // Establishment leaves x2 past the frame edge; a later stretch on that
    // side is capped at the frame width, which moves x2 inward
    let frames = vec![point(95.0, 50.0), Vec::new(), point(120.0, 50.0)];
    let updates = run_tracker(small_tracker_config(1, 20, 2), &frames, 100, 100);

    assert_eq!(updates[1].boundary(), Some(Boundary::new(75, 30, 115, 70)));
    assert_eq!(updates[2], TrackerUpdate::StretchedAndExpanded(Boundary::new(75, 30, 100, 70)));
}

#[test]
fn test_low_edge_floor_only() {
    // A stretch to the left floors x1 at 0, above its unclamped value, and
    // leaves the negative y1 alone
    let frames = vec![point(10.0, 10.0), Vec::new(), point(-30.0, 12.0)];
    let updates = run_tracker(small_tracker_config(1, 20, 2), &frames, 100, 100);

    assert_eq!(updates[1].boundary(), Some(Boundary::new(-10, -10, 30, 30)));
    assert_eq!(updates[2], TrackerUpdate::StretchedAndExpanded(Boundary::new(0, -10, 30, 30)));
}

#[test]
fn test_independent_trackers_do_not_share_state() {
    let mut first = BoundaryTracker::new(small_tracker_config(1, 10, 2));
    let mut second = BoundaryTracker::new(small_tracker_config(1, 10, 2));

    first.process(&point(50.0, 50.0), 200, 200);
    second.process(&point(150.0, 150.0), 200, 200);

    assert_eq!(first.process(&[], 200, 200).boundary(), Some(Boundary::new(40, 40, 60, 60)));
    assert_eq!(second.process(&[], 200, 200).boundary(), Some(Boundary::new(140, 140, 160, 160)));
}

#[test]
fn test_saturated_edges_survive_steady_state() {
    // Far out-of-range coordinates saturate the established edges at the i32 limits
    let frames = vec![point(1.0e10, 50.0), Vec::new(), point(1.0e10, 50.0)];
    let updates = run_tracker(small_tracker_config(1, 10, 2), &frames, 100, 100);

    assert_eq!(updates[1].boundary(), Some(Boundary::new(i32::MAX, 40, i32::MAX, 60)));
    let expanded = Boundary::new(i32::MAX, 40, 100, 60);
    assert_eq!(updates[2], TrackerUpdate::StretchedAndExpanded(expanded));
    assert!(!is_in_frame(Some(&expanded), 100, 100));
    assert_eq!(expanded.center(), (1_073_741_873, 50));

    let frames = vec![point(-1.0e10, 50.0), Vec::new(), point(-1.0e10, 50.0)];
    let updates = run_tracker(small_tracker_config(1, 10, 2), &frames, 100, 100);

    assert_eq!(updates[1].boundary(), Some(Boundary::new(i32::MIN, 40, i32::MIN, 60)));
    assert_eq!(
        updates[2],
        TrackerUpdate::StretchedAndExpanded(Boundary::new(0, 40, i32::MIN, 60))
    );
}

proptest! {
    #[test]
    fn prop_interior_points_stay_stable(
        xs in prop::collection::vec(0.0f32..1.0, 1..20),
        ys in prop::collection::vec(0.0f32..1.0, 1..20),
    ) {
        let frames = vec![point(100.0, 100.0), point(300.0, 250.0), Vec::new()];
        let mut tracker = BoundaryTracker::new(small_tracker_config(2, 50, 5));
        for f in &frames {
            tracker.process(f, 640, 480);
        }
        let established = tracker.established_boundary().unwrap();
        prop_assert_eq!(established, Boundary::new(50, 50, 350, 300));

        // Points strictly inside the boundary shrunk by the threshold
        let landmarks: Vec<LandmarkPoint> = xs
            .iter()
            .zip(ys.iter().cycle())
            .map(|(fx, fy)| LandmarkPoint::pose(56.0 + fx * 288.0, 56.0 + fy * 238.0))
            .collect();

        let update = tracker.process(&landmarks, 640, 480);
        prop_assert_eq!(update, TrackerUpdate::Stable(established));
    }

    #[test]
    fn prop_boundary_never_shrinks_inside_frame(
        moves in prop::collection::vec((0.0f32..640.0, 0.0f32..480.0), 1..30),
    ) {
        let mut tracker = BoundaryTracker::new(small_tracker_config(1, 20, 5));
        tracker.process(&point(320.0, 240.0), 640, 480);
        let mut previous = tracker.process(&[], 640, 480).boundary().unwrap();

        for (x, y) in moves {
            let current = tracker.process(&point(x, y), 640, 480).boundary().unwrap();
            prop_assert!(current.x1 <= previous.x1 && current.y1 <= previous.y1);
            prop_assert!(current.x2 >= previous.x2 && current.y2 >= previous.y2);
            prop_assert!(is_in_frame(Some(&current), 640, 480));
            previous = current;
        }
    }
}
