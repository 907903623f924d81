use thiserror::Error;

/// Errors returned by workstream operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkstreamError {
    #[error("workstream: insufficient data: {count} embedded achievements, need at least {minimum}")]
    InsufficientData { count: usize, minimum: usize },

    #[error("workstream: no existing workstreams to assign into")]
    NoExistingWorkstreams,

    #[error("workstream: centroid of empty input")]
    EmptyCentroidInput,

    #[error("workstream: dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("workstream: invalid params: {0}")]
    InvalidParams(String),
}
