//! Offline multi-object 3D tracker, evaluation engine, and parameter-tuning
//! pipeline.
//!
//! Per frame, [`tracker::Tracker`] consumes an unordered set of position
//! detections and emits persistent, smoothed tracks via a bank of
//! constant-acceleration Kalman filters gated by cost-matrix association.
//! [`evaluation::evaluate`] compares tracked output against ground-truth
//! references to produce per-entity statistics and a scalar loss.
//! [`objective::Objective`] and [`optimizer`] wire that loss into a
//! derivative-free parameter search over a batch of clips.

pub mod error;
pub mod evaluation;
pub mod geometry;
pub mod io;
pub mod objective;
pub mod optimizer;
pub mod tracker;

pub use error::{Error, Result};
pub use evaluation::{evaluate, ReferenceStats, Statistics, TrackStats};
pub use geometry::Point3;
pub use objective::Objective;
pub use optimizer::{Minimizer, OptimizerDriver, ParameterBox, ParticleSwarmMinimizer};
pub use tracker::{ConfirmedTrack, KalmanTrack, TrackStage, Tracker, TrackerSettings};
