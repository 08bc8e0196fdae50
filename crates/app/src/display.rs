//! Display seam. Pixel-level drawing lives outside this system; the built-in
//! sink reports correlated detections through the log instead.

use anyhow::Result;
use frame_relay::{Detections, Frame};
use tracing::{debug, info};

pub trait DisplaySink {
    /// Present one frame together with the detections computed from it.
    fn show(&mut self, frame: &Frame, detections: &Detections) -> Result<()>;
}

pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn show(&mut self, frame: &Frame, detections: &Detections) -> Result<()> {
        if detections.is_empty() {
            debug!(timestamp = frame.timestamp_ms, "no detections");
        } else {
            info!(
                timestamp = frame.timestamp_ms,
                count = detections.len(),
                first_box = ?detections.boxes[0],
                confidence = detections.confidences[0],
                "detections"
            );
        }
        Ok(())
    }
}
