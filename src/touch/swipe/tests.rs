use super::*;

fn detector() -> DistanceSwipeDetector {
    DistanceSwipeDetector::new(SwipeConfig {
        threshold_px: 40.0,
        unit_px: 10.0,
        velocity_threshold_px_per_s: 500.0,
    })
}

#[test]
fn small_motion_does_not_fire() {
    let mut detector = detector();
    detector.on_down(0, Point::new(100.0, 100.0), 0);
    assert_eq!(detector.on_move(0, Point::new(115.0, 105.0), 16, false), None);
}

#[test]
fn move_past_half_threshold_reports_unit_counts() {
    let mut detector = detector();
    detector.on_down(0, Point::new(100.0, 100.0), 0);

    let event = detector
        .on_move(0, Point::new(125.0, 102.0), 16, false)
        .expect("should fire");
    assert_eq!(event.phase, SwipePhase::Move);
    assert_eq!(event.direction, SwipeDirection::Right);
    assert_eq!(event.abs_unit_count_x, 2);
    assert_eq!(event.rel_unit_count_x, 2);

    let event = detector
        .on_move(0, Point::new(151.0, 102.0), 32, false)
        .expect("should fire again");
    assert_eq!(event.abs_unit_count_x, 5);
    assert_eq!(event.rel_unit_count_x, 3);
}

#[test]
fn forced_move_fires_without_travel() {
    let mut detector = detector();
    detector.on_down(2, Point::new(50.0, 50.0), 0);
    let event = detector
        .on_move(2, Point::new(53.0, 50.0), 10, true)
        .expect("forced");
    assert_eq!(event.rel_unit_count_x, 0);
}

#[test]
fn fast_long_release_is_a_swipe() {
    let mut detector = detector();
    detector.on_down(0, Point::new(100.0, 200.0), 0);
    let _ = detector.on_move(0, Point::new(100.0, 170.0), 20, false);
    let event = detector
        .on_up(0, Point::new(100.0, 130.0), 40)
        .expect("swipe up");
    assert_eq!(event.phase, SwipePhase::Up);
    assert_eq!(event.direction, SwipeDirection::Up);
    assert_eq!(event.abs_unit_count_y, -7);
}

#[test]
fn slow_release_is_not_a_swipe() {
    let mut detector = detector();
    detector.on_down(0, Point::new(100.0, 100.0), 0);
    let _ = detector.on_move(0, Point::new(160.0, 100.0), 1_000, false);
    assert_eq!(detector.on_up(0, Point::new(161.0, 100.0), 2_000), None);
}

#[test]
fn cancelled_pointer_is_forgotten() {
    let mut detector = detector();
    detector.on_down(1, Point::new(0.0, 0.0), 0);
    detector.on_cancel(1);
    assert_eq!(detector.on_move(1, Point::new(90.0, 0.0), 10, false), None);
    assert_eq!(detector.on_up(1, Point::new(90.0, 0.0), 20), None);
}
