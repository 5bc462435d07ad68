use std::time::{Duration, Instant};

use zone_guard::geometry::contains;
use zone_guard::{
    evaluate, AlarmState, BoundingBox, Detection, FrameSize, MatchPolicy, NormPoint, PixelPoint,
    Zone, ZoneRegistry, DEFAULT_ZONE_COLOR,
};

const VGA: FrameSize = FrameSize {
    width: 640,
    height: 480,
};

fn square(name: &str, lo: f32, hi: f32) -> Zone {
    Zone::new(
        name,
        vec![
            NormPoint::new(lo, lo),
            NormPoint::new(hi, lo),
            NormPoint::new(hi, hi),
            NormPoint::new(lo, hi),
        ],
        DEFAULT_ZONE_COLOR,
    )
    .expect("valid square")
}

/// A person standing with their feet on pixel `(fx, fy)`.
fn person_at(fx: f32, fy: f32) -> Detection {
    Detection::person(BoundingBox::new(fx - 30.0, fy - 160.0, fx + 30.0, fy), 0.8)
}

#[test]
fn unit_square_center_inside_far_point_outside() {
    let square = [
        NormPoint::new(0.0, 0.0),
        NormPoint::new(1.0, 0.0),
        NormPoint::new(1.0, 1.0),
        NormPoint::new(0.0, 1.0),
    ];
    assert_eq!(contains(&square, NormPoint::new(0.5, 0.5)), Ok(true));
    assert_eq!(contains(&square, NormPoint::new(5.0, -3.0)), Ok(false));
}

#[test]
fn foot_point_is_bottom_center_of_box() {
    for bbox in [
        BoundingBox::new(0.0, 0.0, 10.0, 20.0),
        BoundingBox::new(101.5, 33.0, 180.25, 299.0),
        BoundingBox::from_center(320.0, 240.0, 64.0, 128.0),
    ] {
        let foot = Detection::person(bbox, 0.9).foot_point();
        assert_eq!(foot.y, bbox.y2);
        assert_eq!(foot.x, (bbox.x1 + bbox.x2) / 2.0);
    }
}

#[test]
fn center_detection_intrudes_and_corner_detection_does_not() {
    let registry = ZoneRegistry::frozen(vec![square("floor", 0.2, 0.8)]);

    let inside = evaluate(
        &[person_at(320.0, 240.0)],
        VGA,
        &registry,
        MatchPolicy::FirstMatch,
    )
    .unwrap();
    assert_eq!(inside.len(), 1);
    assert_eq!(inside[0].foot_point, NormPoint::new(0.5, 0.5));

    let corner = PixelPoint::new(10.0, 10.0).normalize(VGA);
    assert!((corner.x - 0.016).abs() < 0.001);
    assert!((corner.y - 0.021).abs() < 0.001);
    let outside = evaluate(
        &[person_at(10.0, 10.0)],
        VGA,
        &registry,
        MatchPolicy::FirstMatch,
    )
    .unwrap();
    assert!(outside.is_empty());
}

#[test]
fn overlapping_zones_report_first_zone_only() {
    let registry = ZoneRegistry::frozen(vec![square("east", 0.3, 0.9), square("west", 0.1, 0.7)]);
    let events = evaluate(
        &[person_at(320.0, 240.0)],
        VGA,
        &registry,
        MatchPolicy::FirstMatch,
    )
    .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].zone_name, "east");
}

#[test]
fn repeated_evaluation_is_identical() {
    let registry = ZoneRegistry::frozen(vec![square("floor", 0.2, 0.8)]);
    let detections = [person_at(320.0, 240.0), person_at(600.0, 470.0)];
    let first = evaluate(&detections, VGA, &registry, MatchPolicy::AllMatches).unwrap();
    let second = evaluate(&detections, VGA, &registry, MatchPolicy::AllMatches).unwrap();
    assert_eq!(first, second);
}

#[test]
fn display_alarm_held_for_three_seconds_after_single_intrusion() {
    let mut alarm = AlarmState::default();
    let t0 = Instant::now();
    assert!(alarm.update(true, t0).display_active());

    let mut elapsed = Duration::ZERO;
    while elapsed < Duration::from_secs(3) {
        elapsed += Duration::from_millis(50);
        let active = alarm.update(false, t0 + elapsed).display_active();
        assert_eq!(
            active,
            elapsed < Duration::from_secs(3),
            "at {:?}",
            elapsed
        );
    }
    assert!(!alarm.update(false, t0 + Duration::from_secs(10)).display_active());
}
