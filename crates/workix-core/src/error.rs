//! # Error Types
//!
//! Top-level error type shared by the foundational crates. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! Component crates define narrower error enums (transition errors, calendar
//! errors, store errors) and convert into their own aggregate types; this
//! enum covers parsing and validation of the primitives defined here.

use thiserror::Error;

/// Top-level error type for the foundational primitives.
#[derive(Error, Debug)]
pub enum WorkixError {
    /// A value failed validation (unknown enum name, malformed identifier).
    #[error("validation error: {0}")]
    Validation(String),

    /// A timestamp could not be parsed or was out of range.
    #[error("temporal error: {0}")]
    Temporal(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
