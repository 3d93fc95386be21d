//! Errors returned before generation starts
//!
//! Once the inputs are accepted a generation run cannot fail: internal
//! invariant problems are resolved by the finalize guard instead of being
//! reported.

use thiserror::Error;

/// Input validation errors
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Invalid dimensions {width}x{height}: each side must be within {min}..={max}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        min: usize,
        max: usize,
    },

    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),
}
