//! Error taxonomy for the scoring core.
//!
//! Empty event batches and unterminated notation constructs are *not* errors;
//! both have well-defined results.

use thiserror::Error;

/// Errors raised by the calculators and the assessment state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// Weight magnitude outside `[0.1, 12.0]`, zero, or NaN.
    ///
    /// Upstream validation is expected to enforce the range, so this signals
    /// a data-integrity bug in the caller rather than bad user input.
    #[error("weight {weight} outside valid range [0.1-12.0]")]
    OutOfRange { weight: f64 },

    /// Caller passed an unsupported argument (window label, probability, link).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ScoringError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ScoringError>;
