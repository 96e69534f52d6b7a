use super::*;
use crate::animation::keyframe::{Interpolation, TangentMode};
use std::sync::{Arc, Mutex};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn curve_of(points: &[Keyframe]) -> Curve {
    let mut c = Curve::new();
    for p in points {
        c.add_or_update_value(p.time, p.clone()).unwrap();
    }
    c
}

fn ramp(kind: fn(f64, f64) -> Keyframe) -> Curve {
    curve_of(&[kind(0.0, 0.0), kind(1.0, 10.0)])
}

fn recorded(curve: &mut Curve) -> Arc<Mutex<Vec<CurveEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    curve.subscribe(move |e| sink.lock().unwrap().push(*e));
    events
}

#[test]
fn sampling_an_empty_curve_fails() {
    let c = Curve::new();
    assert!(matches!(c.sample(0.0), Err(CurveError::EmptyCurve)));
}

#[test]
fn non_finite_queries_are_rejected() {
    let c = ramp(Keyframe::linear);
    assert!(matches!(c.sample(f64::NAN), Err(CurveError::InvalidKey(_))));
    assert!(matches!(
        c.sample(f64::INFINITY),
        Err(CurveError::InvalidKey(_))
    ));
}

#[test]
fn rejected_mutations_leave_no_trace() {
    let mut c = ramp(Keyframe::linear);
    let events = recorded(&mut c);
    let before = c.clone();
    let rev = c.revision();

    assert!(matches!(
        c.add_or_update_value(f64::NAN, Keyframe::new(0.0, 1.0)),
        Err(CurveError::InvalidKey(_))
    ));
    assert!(matches!(
        c.add_or_update_value(0.5, Keyframe::new(0.0, f64::INFINITY)),
        Err(CurveError::InvalidValue(_))
    ));
    assert!(c.remove_value(f64::NAN).is_err());
    assert!(c.move_value(0.0, f64::NEG_INFINITY).is_err());

    assert_eq!(c, before);
    assert_eq!(c.revision(), rev);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn sample_at_every_key_returns_its_value() {
    let c = curve_of(&[
        Keyframe::constant(0.0, 1.0),
        Keyframe::smooth(1.0, -2.0),
        Keyframe::linear(2.5, 4.0),
        Keyframe::cubic(3.0, 0.5),
        Keyframe::new(4.0, 8.0).with_tangents(0.7, -0.3),
    ]);
    for p in c.points() {
        assert_eq!(c.sample(p.time).unwrap(), p.value);
    }
}

#[test]
fn add_then_sample_returns_added_value() {
    let mut c = ramp(Keyframe::cubic);
    c.add_or_update_value(0.4, Keyframe::smooth(0.0, 123.25))
        .unwrap();
    assert_eq!(c.sample(0.4).unwrap(), 123.25);
    assert_eq!(c.get_point(0.4).unwrap().time, 0.4);
}

#[test]
fn update_overwrites_in_place() {
    let mut c = curve_of(&[
        Keyframe::new(0.0, 0.0),
        Keyframe::new(1.0, 1.0),
        Keyframe::new(2.0, 2.0),
    ]);
    c.add_or_update_value(1.0, Keyframe::constant(99.0, 5.0))
        .unwrap();
    assert_eq!(c.len(), 3);
    assert_eq!(c.points()[1].time, 1.0);
    assert_eq!(c.points()[1].value, 5.0);
    assert_eq!(c.points()[1].interpolation, Interpolation::Constant);
}

#[test]
fn linear_and_spline_are_continuous_at_keys() {
    let h = 1e-7;
    let kinds: [fn(f64, f64) -> Keyframe; 3] = [Keyframe::linear, Keyframe::cubic, Keyframe::smooth];
    for kind in kinds {
        let c = curve_of(&[
            kind(0.0, 0.0),
            kind(1.0, 3.0),
            kind(2.0, 1.0),
            kind(4.0, 2.0),
        ]);
        for p in &c.points()[1..3] {
            let left = c.sample(p.time - h).unwrap();
            let right = c.sample(p.time + h).unwrap();
            assert!((left - p.value).abs() < 1e-5);
            assert!((right - p.value).abs() < 1e-5);
        }
    }
}

#[test]
fn unified_spline_tangents_are_c1() {
    let c = curve_of(&[
        Keyframe::cubic(0.0, 0.0),
        Keyframe::cubic(1.0, 3.0),
        Keyframe::cubic(3.0, 4.0),
    ]);
    let h = 1e-6;
    let k = 1.0;
    let v = c.sample(k).unwrap();
    let d_left = (v - c.sample(k - h).unwrap()) / h;
    let d_right = (c.sample(k + h).unwrap() - v) / h;
    assert!((d_left - d_right).abs() < 1e-3);
    assert!((d_right - 4.0 / 3.0).abs() < 1e-3);
}

#[test]
fn constant_segments_hold_left_value_and_jump_at_keys() {
    let c = curve_of(&[
        Keyframe::constant(0.0, 1.0),
        Keyframe::constant(1.0, 2.0),
        Keyframe::constant(2.0, 3.0),
    ]);
    assert_eq!(c.sample(0.999_999).unwrap(), 1.0);
    assert_eq!(c.sample(1.0).unwrap(), 2.0);
    assert_eq!(c.sample(1.5).unwrap(), 2.0);
    assert_eq!(c.sample(2.0).unwrap(), 3.0);
}

#[test]
fn left_point_kind_governs_segment() {
    let c = curve_of(&[Keyframe::linear(0.0, 0.0), Keyframe::constant(1.0, 10.0)]);
    assert_eq!(c.sample(0.5).unwrap(), 5.0);
    let c = curve_of(&[Keyframe::constant(0.0, 0.0), Keyframe::linear(1.0, 10.0)]);
    assert_eq!(c.sample(0.5).unwrap(), 0.0);
}

#[test]
fn constant_mapping_holds_boundary_values() {
    let c = ramp(Keyframe::linear);
    assert_eq!(c.sample(-100.0).unwrap(), 0.0);
    assert_eq!(c.sample(100.0).unwrap(), 10.0);
}

#[test]
fn cycle_repeats_without_drift() {
    let mut c = ramp(Keyframe::linear);
    c.set_pre_mapping(OutsideCurveBehavior::Cycle);
    c.set_post_mapping(OutsideCurveBehavior::Cycle);
    assert_eq!(c.sample(-0.5).unwrap(), 5.0);
    assert_eq!(c.sample(-0.5).unwrap(), c.sample(0.5).unwrap());
    assert_eq!(c.sample(1.5).unwrap(), 5.0);
    assert!(close(c.sample(7.25).unwrap(), 2.5));
}

#[test]
fn cycle_with_offset_continues_the_trend() {
    let mut c = ramp(Keyframe::linear);
    c.set_pre_mapping(OutsideCurveBehavior::CycleWithOffset);
    c.set_post_mapping(OutsideCurveBehavior::CycleWithOffset);
    assert_eq!(c.sample(-1.0).unwrap(), -10.0);
    assert_eq!(c.sample(-0.5).unwrap(), -5.0);
    assert_eq!(c.sample(1.5).unwrap(), 15.0);
    assert_eq!(c.sample(2.0).unwrap(), 20.0);
    assert_eq!(c.sample(-2.0).unwrap(), -20.0);
}

#[test]
fn ping_pong_flips_direction_where_cycle_does_not() {
    let points = [
        Keyframe::constant(0.0, 0.0),
        Keyframe::constant(0.5, 5.0),
        Keyframe::constant(1.0, 10.0),
    ];
    let mut cycle = curve_of(&points);
    cycle.set_post_mapping(OutsideCurveBehavior::Cycle);
    let mut pp = curve_of(&points);
    pp.set_post_mapping(OutsideCurveBehavior::PingPong);

    // First period after the curve: cycle restarts at the front, ping-pong runs backwards.
    assert_eq!(cycle.sample(1.25).unwrap(), 0.0);
    assert_eq!(pp.sample(1.25).unwrap(), 5.0);
    // Second period: ping-pong runs forward again.
    assert_eq!(pp.sample(2.25).unwrap(), 0.0);
    assert_eq!(pp.sample(2.75).unwrap(), 5.0);

    let linear = {
        let mut c = ramp(Keyframe::linear);
        c.set_post_mapping(OutsideCurveBehavior::PingPong);
        c
    };
    assert_eq!(linear.sample(1.5).unwrap(), 5.0);
    assert!(linear.sample(1.2).unwrap() > linear.sample(1.4).unwrap());
    assert!(linear.sample(2.2).unwrap() < linear.sample(2.4).unwrap());
}

#[test]
fn removing_down_to_one_spline_point_still_samples() {
    let mut c = ramp(Keyframe::smooth);
    let removed = c.remove_value(0.0).unwrap();
    assert_eq!(removed.map(|k| k.value), Some(0.0));
    assert_eq!(c.len(), 1);
    for u in [-5.0, 0.0, 1.0, 3.0] {
        assert_eq!(c.sample(u).unwrap(), 10.0);
    }
    c.set_post_mapping(OutsideCurveBehavior::CycleWithOffset);
    assert_eq!(c.sample(3.0).unwrap(), 10.0);
}

#[test]
fn removing_a_missing_time_is_a_no_op() {
    let mut c = ramp(Keyframe::linear);
    let rev = c.revision();
    assert_eq!(c.remove_value(0.5).unwrap(), None);
    assert_eq!(c.revision(), rev);
}

#[test]
fn neighbor_lookups_skip_to_adjacent_keys() {
    let c = curve_of(&[
        Keyframe::new(0.0, 0.0),
        Keyframe::new(1.0, 0.0),
        Keyframe::new(2.0, 0.0),
    ]);
    assert_eq!(c.previous_time(0.0), None);
    assert_eq!(c.next_time(2.0), None);
    assert_eq!(c.previous_time(1.0), Some(0.0));
    assert_eq!(c.next_time(1.0), Some(2.0));
    assert_eq!(c.previous_time(1.5), Some(1.0));
    assert_eq!(c.next_time(-3.0), Some(0.0));
    assert_eq!(c.next_time(f64::NAN), None);
    assert!(c.exists_before(0.5));
    assert!(!c.exists_after(2.0));
    assert!(c.has_point_at(1.0));
    assert!(!c.has_point_at(1.0 + f64::EPSILON));
}

#[test]
fn move_rekeys_and_overwrites_on_collision() {
    let mut c = curve_of(&[
        Keyframe::new(0.0, 0.0),
        Keyframe::new(1.0, 1.0),
        Keyframe::new(2.0, 2.0),
    ]);
    assert!(c.move_value(1.0, 3.0).unwrap());
    assert_eq!(
        c.points().iter().map(|k| k.time).collect::<Vec<_>>(),
        vec![0.0, 2.0, 3.0]
    );
    assert_eq!(c.get_point(3.0).unwrap().value, 1.0);

    assert!(c.move_value(3.0, 2.0).unwrap());
    assert_eq!(c.len(), 2);
    assert_eq!(c.get_point(2.0).unwrap().value, 1.0);

    assert!(!c.move_value(7.0, 8.0).unwrap());
}

#[test]
fn strict_move_rejects_collisions_atomically() {
    let mut c = curve_of(&[Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)]);
    let before = c.clone();
    assert!(matches!(
        c.move_value_strict(0.0, 1.0),
        Err(CurveError::KeyCollision(t)) if t == 1.0
    ));
    assert_eq!(c, before);
    assert!(c.move_value_strict(0.0, 0.5).unwrap());
}

#[test]
fn neighbors_get_fresh_tangents_after_structural_edits() {
    let mut c = curve_of(&[Keyframe::cubic(0.0, 0.0), Keyframe::cubic(2.0, 2.0)]);
    assert!(close(c.points()[0].out_slope(), 1.0));

    c.add_or_update_value(1.0, Keyframe::cubic(0.0, 4.0)).unwrap();
    assert!(close(c.points()[0].out_slope(), 4.0));
    assert!(close(c.points()[2].in_slope(), -2.0));

    c.remove_value(1.0).unwrap();
    assert!(close(c.points()[0].out_slope(), 1.0));

    c.add_or_update_value(3.0, Keyframe::cubic(0.0, 5.0)).unwrap();
    c.move_value(3.0, 1.0).unwrap();
    assert!(close(c.points()[0].out_slope(), 5.0));
    assert!(close(c.points()[2].in_slope(), -3.0));
}

#[test]
fn each_mutation_notifies_once_after_applying() {
    let mut c = Curve::new();
    let events = recorded(&mut c);

    c.add_or_update_value(0.0, Keyframe::new(0.0, 1.0)).unwrap();
    c.add_or_update_value(1.0, Keyframe::new(0.0, 2.0)).unwrap();
    c.move_value(1.0, 2.0).unwrap();
    c.remove_value(0.0).unwrap();
    c.set_pre_mapping(OutsideCurveBehavior::Cycle);
    c.set_pre_mapping(OutsideCurveBehavior::Cycle);
    c.set_selected(2.0, true).unwrap();

    let got = events.lock().unwrap().clone();
    let kinds: Vec<_> = got.iter().map(|e| e.change).collect();
    assert_eq!(
        kinds,
        vec![
            CurveChange::PointsChanged,
            CurveChange::PointsChanged,
            CurveChange::PointsChanged,
            CurveChange::PointsChanged,
            CurveChange::MappingChanged,
            CurveChange::SelectionChanged,
        ]
    );
    assert_eq!(got.last().unwrap().revision, c.revision());
    assert_eq!(c.revision(), 6);
}

#[test]
fn batches_coalesce_into_one_notification() {
    let mut c = Curve::new();
    let events = recorded(&mut c);
    c.batch(|c| {
        for i in 0..5 {
            c.add_or_update_value(f64::from(i), Keyframe::new(0.0, f64::from(i)))
                .unwrap();
        }
        c.set_post_mapping(OutsideCurveBehavior::PingPong);
    });
    let got = events.lock().unwrap().clone();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].change, CurveChange::Batch);
    assert_eq!(got[0].revision, 6);

    c.batch(|_| {});
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[test]
fn muted_and_unsubscribed_observers_stay_quiet() {
    let mut c = Curve::new();
    let events = Arc::new(Mutex::new(0usize));
    let sink = Arc::clone(&events);
    let id = c.subscribe(move |_| *sink.lock().unwrap() += 1);

    c.set_notifications_enabled(false);
    c.add_or_update_value(0.0, Keyframe::new(0.0, 1.0)).unwrap();
    assert_eq!(*events.lock().unwrap(), 0);
    assert_eq!(c.revision(), 1);

    c.set_notifications_enabled(true);
    c.add_or_update_value(1.0, Keyframe::new(0.0, 1.0)).unwrap();
    assert_eq!(*events.lock().unwrap(), 1);

    assert!(c.unsubscribe(id));
    assert!(!c.unsubscribe(id));
    c.remove_value(1.0).unwrap();
    assert_eq!(*events.lock().unwrap(), 1);
}

#[test]
fn segment_hint_never_changes_results() {
    let c = curve_of(&[
        Keyframe::smooth(0.0, 0.0),
        Keyframe::cubic(0.7, 3.0),
        Keyframe::linear(1.9, -1.0),
        Keyframe::constant(2.2, 4.0),
        Keyframe::smooth(3.5, 2.0),
    ]);
    let times: Vec<f64> = (0..=70).map(|i| f64::from(i) * 0.05).collect();
    let forward = c.sample_many(&times).unwrap();

    let mut shuffled: Vec<usize> = (0..times.len()).collect();
    shuffled.reverse();
    shuffled.rotate_left(17);
    for i in shuffled {
        let fresh = c.clone();
        assert_eq!(c.sample(times[i]).unwrap(), fresh.sample(times[i]).unwrap());
        assert_eq!(c.sample(times[i]).unwrap(), forward[i]);
    }
}

#[test]
fn json_roundtrip_preserves_samples() {
    let mut c = curve_of(&[
        Keyframe::constant(-1.0, 0.1),
        Keyframe::smooth(0.3, 1.0 / 3.0),
        Keyframe::linear(1.7, -2.5e-7),
        Keyframe::new(2.0, 4.0).with_tangents(0.2, -0.9).with_weights(0.5, 0.25),
        Keyframe::cubic(3.141_592_653_589_793, 2.0).with_selected(true),
    ]);
    c.set_pre_mapping(OutsideCurveBehavior::CycleWithOffset);
    c.set_post_mapping(OutsideCurveBehavior::PingPong);
    c.set_component(2);

    let json = c.to_json_string().unwrap();
    let back = Curve::from_json_str(&json).unwrap();
    assert_eq!(back, c);

    let times = [-7.3, -1.0, -0.2, 0.3, 1.0, 1.85, 2.0, 3.0, 3.2, 11.9];
    for u in times {
        assert_eq!(back.sample(u).unwrap(), c.sample(u).unwrap(), "u={u}");
    }
}

#[test]
fn json_roundtrip_of_empty_curve() {
    let c = Curve::with_component(1);
    let back = Curve::from_json_str(&c.to_json_string().unwrap()).unwrap();
    assert_eq!(back, c);
    assert!(back.is_empty());
}

#[test]
fn json_rejects_duplicate_times_and_defaults_mappings() {
    let err = Curve::from_json_str(
        r#"{ "points": [ { "time": 1.0, "value": 0.0 }, { "time": 1.0, "value": 2.0 } ] }"#,
    )
    .unwrap_err();
    assert!(matches!(err, CurveError::Serde(_)));

    let c = Curve::from_json_str(
        r#"{ "points": [ { "time": 2.0, "value": 1.0 }, { "time": 0.0, "value": 0.0 } ] }"#,
    )
    .unwrap();
    assert_eq!(c.pre_mapping(), OutsideCurveBehavior::Constant);
    assert_eq!(c.first_time(), Some(0.0));
    assert_eq!(c.time_range(), Some((0.0, 2.0)));
}

#[test]
fn from_points_sorts_and_rejects_duplicates() {
    let c = Curve::from_points([Keyframe::new(3.0, 1.0), Keyframe::new(-1.0, 2.0)]).unwrap();
    assert_eq!(c.first_time(), Some(-1.0));
    assert!(matches!(
        Curve::from_points([Keyframe::new(1.0, 1.0), Keyframe::new(1.0, 2.0)]),
        Err(CurveError::KeyCollision(_))
    ));
    assert!(matches!(
        Curve::from_points([Keyframe::new(f64::NAN, 1.0)]),
        Err(CurveError::InvalidKey(_))
    ));
}

#[test]
fn explicit_tangent_mode_is_kept_through_edits() {
    let mut c = curve_of(&[
        Keyframe::new(0.0, 0.0).with_tangents(0.5, 0.5),
        Keyframe::cubic(1.0, 1.0),
    ]);
    c.add_or_update_value(0.5, Keyframe::cubic(0.0, 3.0)).unwrap();
    let first = &c.points()[0];
    assert_eq!(first.out_mode, TangentMode::Tangent);
    assert_eq!(first.out_angle, 0.5);
}

#[test]
fn steep_ramp_keeps_tangents_inside_the_open_range_and_roundtrips() {
    let c = curve_of(&[Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1e17)]);
    let first = &c.points()[0];
    assert!(first.out_angle < std::f64::consts::FRAC_PI_2);
    assert!(first.validate().is_ok());

    let back = Curve::from_json_str(&c.to_json_string().unwrap()).unwrap();
    assert_eq!(back, c);
    assert_eq!(back.sample(0.5).unwrap(), 5e16);
}

#[test]
fn strict_move_checks_the_source_key_before_collisions() {
    let mut c = curve_of(&[Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)]);
    assert!(matches!(
        c.move_value_strict(f64::NAN, 1.0),
        Err(CurveError::InvalidKey(_))
    ));
}
