//! Error types for Trident

use thiserror::Error;

/// Core error type
///
/// Only control-side operations return it. The audio path degrades instead
/// of failing.
#[derive(Error, Debug)]
pub enum TdError {
    #[error("Invalid parameter index: {0}")]
    InvalidParam(usize),

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("Invalid preset slot: {0}")]
    InvalidPresetSlot(usize),

    #[error("Command queue full")]
    QueueFull,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for TdError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias
pub type TdResult<T> = Result<T, TdError>;
