use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::types::Frame;

/// Capture history used to recover a frame by timestamp after its result
/// comes back from the remote detector.
///
/// A capacity-bounded FIFO: frames go in capture order (timestamps
/// non-decreasing) and the oldest is evicted once the capacity is exceeded.
/// Cloning yields another handle onto the same buffer.
#[derive(Clone)]
pub struct FrameHistory {
    inner: Arc<Mutex<VecDeque<Frame>>>,
    capacity: usize,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        FrameHistory {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, frame: Frame) {
        if let Ok(mut guard) = self.inner.lock() {
            if guard.len() == self.capacity {
                guard.pop_front();
            }
            guard.push_back(frame);
        }
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.len(),
            Err(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the frame captured at `timestamp_ms`.
    ///
    /// Scans oldest to newest and stops as soon as a buffered timestamp
    /// exceeds the target, since no later frame can match. Returns `None`
    /// when the frame was already evicted (result outlived the retention
    /// window); the caller decides what a miss means.
    pub fn correlate(&self, timestamp_ms: i64) -> Option<Frame> {
        let guard = self.inner.lock().ok()?;
        for frame in guard.iter() {
            if frame.timestamp_ms == timestamp_ms {
                return Some(frame.clone());
            }
            if frame.timestamp_ms > timestamp_ms {
                break;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use array_wire::TypedArray;

    use super::*;

    fn frame(timestamp_ms: i64, fill: u8) -> Frame {
        Frame {
            timestamp_ms,
            image: TypedArray::rgb_image(1, 1, vec![fill; 3]).unwrap(),
        }
    }

    #[test]
    fn pushing_past_capacity_evicts_the_oldest() {
        let history = FrameHistory::new(3);
        for ts in 0..4 {
            history.push(frame(ts, ts as u8));
        }
        assert_eq!(history.len(), 3);
        assert!(history.correlate(0).is_none());
        assert!(history.correlate(1).is_some());
        assert!(history.correlate(3).is_some());
    }

    #[test]
    fn correlate_finds_the_matching_frame() {
        let history = FrameHistory::new(8);
        for ts in [100, 101, 102] {
            history.push(frame(ts, ts as u8));
        }
        let hit = history.correlate(101).expect("101 is buffered");
        assert_eq!(hit.timestamp_ms, 101);
        assert_eq!(hit.image.data(), &[101, 101, 101]);
    }

    #[test]
    fn correlate_misses_deterministically() {
        let history = FrameHistory::new(8);
        for ts in [100, 101, 102] {
            history.push(frame(ts, 0));
        }
        assert!(history.correlate(999).is_none());
        // Below the oldest entry the scan stops at the first frame.
        assert!(history.correlate(50).is_none());
        // Gaps inside the window miss too.
        history.push(frame(110, 0));
        assert!(history.correlate(105).is_none());
    }
}
