use anyhow::Error;
use thiserror::Error;

/// Raw RGB frame delivered by a capture backend.
pub struct CapturedFrame {
    /// Packed `height * width * 3` bytes, row major.
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Capture time, Unix milliseconds. Non-decreasing within one backend.
    pub timestamp_ms: i64,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to open capture source {name:?}")]
    Open { name: String },
    #[error(transparent)]
    Other(#[from] Error),
}
