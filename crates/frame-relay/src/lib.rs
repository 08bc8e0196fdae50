//! Shared state between the streaming endpoints: timestamped frames and
//! detection results, the bounded buffers that absorb rate mismatch between
//! producer and consumer, and the message-pair layer that moves both over an
//! array session.
//!
//! Buffering policy is most-recent-wins throughout: the history keeps the
//! last N frames for timestamp correlation and evicts the oldest, the
//! single-slot hand-off drops anything a fresh item supersedes.

mod history;
mod slot;
mod types;
pub mod wire;

pub use history::FrameHistory;
pub use slot::LatestSlot;
pub use types::{Detections, DetectionResult, Frame, RelayError};
