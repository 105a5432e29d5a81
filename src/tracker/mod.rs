//! The tracking engine: per-track Kalman filters, cost-matrix association,
//! and the frame-by-frame track lifecycle state machine.

mod engine;
mod kalman;
mod matching;

pub use engine::{ConfirmedTrack, Tracker};
pub use kalman::{
    KalmanTrack, TrackStage, TrackerSettings, COVARIANCE_RANGE, DISTANCE_THRESHOLD_RANGE,
    MAX_AGE_RANGE, MAX_CONSECUTIVE_MISSES_RANGE, MEASUREMENT_NOISE_RANGE, MIN_HITS_RANGE,
    PROCESS_NOISE_RANGE,
};
pub use matching::{associate, cost_matrix, AssignmentResult};
