//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HindsightError {
    /// Invalid construction parameters, e.g. zero capacity or history length.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A batch was requested before the buffer holds enough sampleable transitions.
    #[error("Insufficient data: requested {requested} samples, {available} sampleable transitions")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,

        /// Number of indices that can be drawn.
        available: usize,
    },

    /// An observation does not match the shape fixed at construction.
    #[error("State shape error: expected {expected:?}, got {got:?}")]
    StateShape {
        /// Shape fixed at construction.
        expected: Vec<usize>,

        /// Shape of the offending observation.
        got: Vec<usize>,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKey(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueType(String),
}

impl HindsightError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
