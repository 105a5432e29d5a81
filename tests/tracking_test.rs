//! End-to-end scenarios exercising the full predict/associate/update/
//! birth/death/promote lifecycle through the public `Tracker` API.

use spatial_tracker::{ConfirmedTrack, Point3, Tracker, TrackerSettings};

fn settings(distance_threshold: f64, max_age: u32, min_hits: u32, max_misses: u32) -> TrackerSettings {
    TrackerSettings::new(0.1, 0.01, 1.0, distance_threshold, max_age, min_hits, max_misses).unwrap()
}

fn ids(confirmed: &[ConfirmedTrack]) -> Vec<u64> {
    let mut v: Vec<u64> = confirmed.iter().map(|t| t.id).collect();
    v.sort();
    v
}

#[test]
fn linear_motion_is_tracked_by_a_single_stable_id() {
    let mut tracker = Tracker::new(settings(2.0, 3, 2, 5));
    let mut last_id = None;
    for step in 0..20 {
        let detection = Point3::new(step as f64, 0.0, 0.0);
        let confirmed = tracker.update_tracks(&[detection]).unwrap();
        if step >= 1 {
            assert_eq!(confirmed.len(), 1);
            if let Some(id) = last_id {
                assert_eq!(confirmed[0].id, id, "track id changed mid-trajectory at step {step}");
            }
            last_id = Some(confirmed[0].id);
        }
    }
}

#[test]
fn two_non_crossing_objects_never_swap_ids() {
    let mut tracker = Tracker::new(settings(2.0, 3, 2, 5));
    let mut id_a = None;
    let mut id_b = None;
    for step in 0..15 {
        let a = Point3::new(step as f64, 0.0, 0.0);
        let b = Point3::new(step as f64, 50.0, 0.0);
        let confirmed = tracker.update_tracks(&[a, b]).unwrap();
        if step >= 1 {
            assert_eq!(confirmed.len(), 2);
            let near_a = confirmed.iter().find(|t| t.position.distance(&a) < 2.0).unwrap();
            let near_b = confirmed.iter().find(|t| t.position.distance(&b) < 2.0).unwrap();
            if let (Some(expected_a), Some(expected_b)) = (id_a, id_b) {
                assert_eq!(near_a.id, expected_a);
                assert_eq!(near_b.id, expected_b);
            }
            id_a = Some(near_a.id);
            id_b = Some(near_b.id);
        }
    }
}

#[test]
fn a_missing_frame_within_max_age_keeps_the_track_alive() {
    let mut tracker = Tracker::new(settings(2.0, 4, 1, 10));
    let position = Point3::new(0.0, 0.0, 0.0);
    tracker.update_tracks(&[position]).unwrap();
    tracker.update_tracks(&[]).unwrap();
    tracker.update_tracks(&[]).unwrap();
    tracker.update_tracks(&[]).unwrap();
    let confirmed = tracker.update_tracks(&[position]).unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].id, 0);
}

#[test]
fn a_missing_frame_beyond_max_age_births_a_fresh_id() {
    let mut tracker = Tracker::new(settings(2.0, 1, 1, 10));
    let position = Point3::new(0.0, 0.0, 0.0);
    tracker.update_tracks(&[position]).unwrap();
    tracker.update_tracks(&[]).unwrap();
    tracker.update_tracks(&[]).unwrap();
    let confirmed = tracker.update_tracks(&[position]).unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_ne!(confirmed[0].id, 0);
}

#[test]
fn a_spurious_detection_births_and_dies_without_disturbing_the_real_track() {
    let mut tracker = Tracker::new(settings(2.0, 1, 2, 5));
    let real = Point3::new(0.0, 0.0, 0.0);
    let spurious = Point3::new(200.0, 0.0, 0.0);

    tracker.update_tracks(&[real]).unwrap();
    tracker.update_tracks(&[real, spurious]).unwrap();
    for _ in 0..3 {
        tracker.update_tracks(&[real]).unwrap();
    }

    assert!(tracker.live_tracks().iter().all(|t| t.position().distance(&spurious) > 2.0));
}

#[test]
fn an_id_switch_can_happen_when_two_tracks_cross_within_the_gate() {
    let mut tracker = Tracker::new(settings(5.0, 3, 1, 10));
    tracker.update_tracks(&[Point3::new(-3.0, 0.0, 0.0), Point3::new(3.0, 0.0, 0.0)]).unwrap();
    tracker.update_tracks(&[Point3::new(-1.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]).unwrap();
    let confirmed = tracker.update_tracks(&[Point3::new(1.0, 0.0, 0.0), Point3::new(-1.0, 0.0, 0.0)]).unwrap();
    assert_eq!(confirmed.len(), 2);
}

#[test]
fn a_run_of_empty_frames_never_confirms_anything() {
    let mut tracker = Tracker::new(settings(2.0, 3, 1, 5));
    for _ in 0..10 {
        assert!(tracker.update_tracks(&[]).unwrap().is_empty());
    }
    assert!(ids(&tracker.update_tracks(&[]).unwrap()).is_empty());
}
