//! Error taxonomy for the tracking, evaluation, and tuning pipeline.

use thiserror::Error;

/// Errors raised anywhere in the pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing field, wrong JSON shape, or a non-finite coordinate in input data.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A Kalman covariance entry went non-finite after predict or update.
    #[error("numerical instability in track {track_id} during {context}")]
    NumericInstability {
        track_id: u64,
        context: &'static str,
    },

    /// Evaluation was requested against an empty reference set.
    #[error("evaluation requested with no references present")]
    EmptyReferences,

    /// A `TrackerSettings` field fell outside the bounded box from the optimizer contract.
    #[error("parameter {field} = {value} out of range [{min}, {max}]")]
    ParameterOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
