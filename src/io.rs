//! Serde wire types for the JSON shapes this pipeline reads and writes.
//!
//! This module only describes the shapes; reading files from disk is the
//! `objective` module's concern (see `Objective::from_paths`). Nothing here
//! owns a path or a CLI flag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tracker::TrackerSettings;

/// One frame's worth of records, keyed the way the original JSON files key
/// a frame: `{"tracks": [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FramePayload<T> {
    pub tracks: Vec<T>,
}

/// A whole clip: frame index (as a string key in JSON, `u32` once parsed) to
/// that frame's payload. Frame indices not present are treated as empty.
pub type FrameMap<T> = BTreeMap<u32, FramePayload<T>>;

/// One detection as read from a detections file. `id`, when present, is
/// carried through for traceability but ignored by the tracker — detections
/// are anonymous by definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DetectionRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One ground-truth reference position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub id: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One emitted track's full published state for a frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrackedRecord {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

/// `TrackerSettings` as read from / written to a parameters JSON file. Kept
/// as a plain, permissive record (not `#[serde(deny_unknown_fields)]`) so
/// extra keys in a parameters file don't break deserialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParametersRecord {
    pub measurement_noise: f64,
    pub process_noise: f64,
    pub covariance: f64,
    pub distance_threshold: f64,
    pub max_age: u32,
    pub min_hits: u32,
    pub max_consecutive_misses: u32,
}

impl ParametersRecord {
    pub fn from_settings(settings: &TrackerSettings) -> Self {
        Self {
            measurement_noise: settings.measurement_noise,
            process_noise: settings.process_noise,
            covariance: settings.covariance,
            distance_threshold: settings.distance_threshold,
            max_age: settings.max_age,
            min_hits: settings.min_hits,
            max_consecutive_misses: settings.max_consecutive_misses,
        }
    }

    pub fn into_settings(self) -> crate::error::Result<TrackerSettings> {
        TrackerSettings::new(
            self.measurement_noise,
            self.process_noise,
            self.covariance,
            self.distance_threshold,
            self.max_age,
            self.min_hits,
            self.max_consecutive_misses,
        )
    }
}
