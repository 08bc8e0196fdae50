//! Capture-device boundary for the streaming client.
//!
//! A capture backend is a background thread that delivers raw RGB frames
//! over a small bounded channel; the channel is the whole interface, so the
//! client neither knows nor cares what produces the pixels. The built-in
//! backend is a synthetic test-pattern camera that needs no hardware.

mod synthetic;
mod types;

pub use synthetic::{spawn_synthetic_reader, SyntheticConfig};
pub use types::{CaptureError, CapturedFrame};
