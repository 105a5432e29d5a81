//! Per-track Kalman filter on a constant-acceleration 3D kinematic model.

use std::collections::VecDeque;

use nalgebra::{SMatrix, SVector};

use crate::error::{Error, Result};
use crate::geometry::Point3;

/// Bound on the bounded box every `TrackerSettings` field is validated against
/// (spec §4.E / the optimizer contract).
pub const MEASUREMENT_NOISE_RANGE: (f64, f64) = (0.001, 10.0);
pub const PROCESS_NOISE_RANGE: (f64, f64) = (0.0001, 0.1);
pub const COVARIANCE_RANGE: (f64, f64) = (0.001, 20.0);
pub const DISTANCE_THRESHOLD_RANGE: (f64, f64) = (0.01, 20.0);
pub const MAX_AGE_RANGE: (u32, u32) = (1, 10);
pub const MIN_HITS_RANGE: (u32, u32) = (1, 10);
pub const MAX_CONSECUTIVE_MISSES_RANGE: (u32, u32) = (1, 10);

/// Immutable configuration shared by every track in a single `Tracker` run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSettings {
    pub measurement_noise: f64,
    pub process_noise: f64,
    pub covariance: f64,
    pub distance_threshold: f64,
    pub max_age: u32,
    pub min_hits: u32,
    pub max_consecutive_misses: u32,
}

impl TrackerSettings {
    /// Build settings, validating every field against the bounded box the
    /// optimizer contract is allowed to search (spec §4.E). A value outside
    /// its range is a setup-time error, not a runtime one.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        measurement_noise: f64,
        process_noise: f64,
        covariance: f64,
        distance_threshold: f64,
        max_age: u32,
        min_hits: u32,
        max_consecutive_misses: u32,
    ) -> Result<Self> {
        check_range_f64("measurement_noise", measurement_noise, MEASUREMENT_NOISE_RANGE)?;
        check_range_f64("process_noise", process_noise, PROCESS_NOISE_RANGE)?;
        check_range_f64("covariance", covariance, COVARIANCE_RANGE)?;
        check_range_f64(
            "distance_threshold",
            distance_threshold,
            DISTANCE_THRESHOLD_RANGE,
        )?;
        check_range_u32("max_age", max_age, MAX_AGE_RANGE)?;
        check_range_u32("min_hits", min_hits, MIN_HITS_RANGE)?;
        check_range_u32(
            "max_consecutive_misses",
            max_consecutive_misses,
            MAX_CONSECUTIVE_MISSES_RANGE,
        )?;

        Ok(Self {
            measurement_noise,
            process_noise,
            covariance,
            distance_threshold,
            max_age,
            min_hits,
            max_consecutive_misses,
        })
    }
}

fn check_range_f64(field: &'static str, value: f64, range: (f64, f64)) -> Result<()> {
    if value > range.0 && value < range.1 {
        Ok(())
    } else {
        Err(Error::ParameterOutOfRange {
            field,
            value,
            min: range.0,
            max: range.1,
        })
    }
}

fn check_range_u32(field: &'static str, value: u32, range: (u32, u32)) -> Result<()> {
    if value >= range.0 && value <= range.1 {
        Ok(())
    } else {
        Err(Error::ParameterOutOfRange {
            field,
            value: value as f64,
            min: range.0 as f64,
            max: range.1 as f64,
        })
    }
}

/// Lifecycle stage of a track; promotion is monotonic, never demoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStage {
    Initialized,
    Confirmed,
}

const STATE_DIM: usize = 9;
const MEAS_DIM: usize = 3;
const HISTORY_CAP: usize = 5;

type State = SVector<f64, STATE_DIM>;
type Covariance = SMatrix<f64, STATE_DIM, STATE_DIM>;
type Transition = SMatrix<f64, STATE_DIM, STATE_DIM>;
type Observation = SMatrix<f64, MEAS_DIM, STATE_DIM>;
type MeasurementNoise = SMatrix<f64, MEAS_DIM, MEAS_DIM>;

/// One track's constant-acceleration Kalman filter plus its lifecycle counters.
#[derive(Debug, Clone)]
pub struct KalmanTrack {
    pub id: u64,
    state: State,
    covariance: Covariance,
    f: Transition,
    h: Observation,
    r: MeasurementNoise,
    q: Covariance,
    pub stage: TrackStage,
    pub age: u32,
    pub hits: u32,
    pub hit_streak: u32,
    pub time_since_update: u32,
    pub consecutive_misses: u32,
    position_history: VecDeque<Point3>,
}

impl KalmanTrack {
    /// Birth a new track at `position` with zero velocity/acceleration.
    pub fn new(id: u64, position: Point3, settings: &TrackerSettings) -> Self {
        let mut f = Transition::identity();
        for i in 0..3 {
            f[(i, i + 3)] = 1.0;
            f[(i, i + 6)] = 0.5;
            f[(i + 3, i + 6)] = 1.0;
        }

        let mut h = Observation::zeros();
        for i in 0..3 {
            h[(i, i)] = 1.0;
        }

        let r = MeasurementNoise::identity() * settings.measurement_noise;
        let q = Covariance::identity() * settings.process_noise;
        let covariance = Covariance::identity() * settings.covariance;

        let mut state = State::zeros();
        state[0] = position.x;
        state[1] = position.y;
        state[2] = position.z;

        log::trace!("track {id} born at ({}, {}, {})", position.x, position.y, position.z);

        Self {
            id,
            state,
            covariance,
            f,
            h,
            r,
            q,
            stage: TrackStage::Initialized,
            age: 0,
            hits: 1,
            hit_streak: 0,
            time_since_update: 0,
            consecutive_misses: 0,
            position_history: VecDeque::from([position]),
        }
    }

    /// Advance state and covariance by one step; returns the predicted position.
    pub fn predict(&mut self) -> Result<Point3> {
        self.state = self.f * self.state;
        self.covariance = self.f * self.covariance * self.f.transpose() + self.q;
        self.age += 1;
        self.consecutive_misses += 1;
        self.check_finite("predict")?;
        Ok(self.position())
    }

    /// Incorporate a measurement; resets the miss counters and appends to the
    /// smoothing history.
    pub fn update(&mut self, measurement: Point3) -> Result<()> {
        let z = SVector::<f64, MEAS_DIM>::new(measurement.x, measurement.y, measurement.z);
        let y = z - self.h * self.state;
        let s = self.h * self.covariance * self.h.transpose() + self.r;
        let s_inv = s
            .try_inverse()
            .ok_or(Error::NumericInstability {
                track_id: self.id,
                context: "update (S not invertible)",
            })?;
        let k = self.covariance * self.h.transpose() * s_inv;

        self.state += k * y;
        let identity = Covariance::identity();
        self.covariance = (identity - k * self.h) * self.covariance;

        self.time_since_update = 0;
        self.hits += 1;
        self.hit_streak += 1;
        self.consecutive_misses = 0;
        self.position_history.push_back(measurement);
        if self.position_history.len() > HISTORY_CAP {
            self.position_history.pop_front();
        }

        self.check_finite("update")
    }

    fn check_finite(&self, context: &'static str) -> Result<()> {
        if self.state.iter().all(|v| v.is_finite()) && self.covariance.iter().all(|v| v.is_finite())
        {
            Ok(())
        } else {
            Err(Error::NumericInstability {
                track_id: self.id,
                context,
            })
        }
    }

    pub fn position(&self) -> Point3 {
        Point3::new(self.state[0], self.state[1], self.state[2])
    }

    pub fn velocity(&self) -> Point3 {
        Point3::new(self.state[3], self.state[4], self.state[5])
    }

    pub fn acceleration(&self) -> Point3 {
        Point3::new(self.state[6], self.state[7], self.state[8])
    }

    /// Arithmetic mean of the last five updated measurements — the published
    /// position, distinct from the raw Kalman state.
    pub fn smoothed_position(&self) -> Point3 {
        let sum = self
            .position_history
            .iter()
            .fold(Point3::zero(), |acc, p| acc + *p);
        sum / self.position_history.len() as f64
    }

    pub fn position_history_len(&self) -> usize {
        self.position_history.len()
    }

    pub fn promote_if_eligible(&mut self, min_hits: u32) {
        if self.hits >= min_hits && self.stage == TrackStage::Initialized {
            self.stage = TrackStage::Confirmed;
            log::debug!("track {} confirmed after {} hits", self.id, self.hits);
        }
    }
}
