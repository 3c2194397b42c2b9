use std::fmt::Display;

use thiserror::Error;

use crate::controller::MAX_LEDS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("LED count {0} is outside the supported range 1-{MAX_LEDS}")]
    LedCount(usize),
    #[error("pattern has {actual} values, expected {expected} (3 per LED)")]
    PatternLength { expected: usize, actual: usize },
    #[error("frame has {actual} pixels, expected {expected}")]
    FrameLength { expected: usize, actual: usize },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to open {device}: {reason}")]
    Open { device: String, reason: String },
    #[error("failed to write to {device}: {reason}")]
    Write { device: String, reason: String },
    #[error("{0} is already closed")]
    Closed(&'static str),
    #[error("{0}")]
    Unsupported(&'static str),
    #[error("failed to encode frame: {0}")]
    Encoding(String),
}

impl TransportError {
    pub fn open(device: impl Display, reason: impl Display) -> Self {
        TransportError::Open {
            device: device.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn write(device: impl Display, reason: impl Display) -> Self {
        TransportError::Write {
            device: device.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Out of range pixel indices are rejected rather than ignored
    #[error("pixel index {index} is out of range for {len} LEDs")]
    Index { index: usize, len: usize },
}
