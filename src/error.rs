//! # Error Types
//!
//! This module defines error types used throughout the thermalize library.
//!
//! Only conditions the encoders cannot recover from are errors: a missing
//! byte sink and a failing one. Out-of-range parameters are clamped and
//! degenerate input is skipped, so neither ever surfaces here.

use thiserror::Error;

/// Main error type for thermalize operations
#[derive(Debug, Error)]
pub enum ThermalizeError {
    /// The encoder was built without a byte sink
    #[error("writer not specified")]
    NoSink,

    /// Image decoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid argument supplied by a caller (CLI, profile lookup)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// I/O error wrapper (sink write or flush failure)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used by every encoder operation
pub type Result<T, E = ThermalizeError> = std::result::Result<T, E>;
