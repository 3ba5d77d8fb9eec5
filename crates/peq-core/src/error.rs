//! Error types for the EQ core

use thiserror::Error;

/// Core error type
///
/// Only setup paths return errors. The real-time path clamps, drops or
/// defaults instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PeqError {
    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid block size: {0}")]
    InvalidBlockSize(usize),

    #[error("Invalid FFT order: {0} (expected 6..=15)")]
    InvalidFftOrder(usize),

    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias
pub type PeqResult<T> = Result<T, PeqError>;
