//! Synthetic test-pattern camera.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use crate::types::{CaptureError, CapturedFrame};

/// Shape and pacing of the generated stream.
#[derive(Clone, Copy, Debug)]
pub struct SyntheticConfig {
    pub width: usize,
    pub height: usize,
    pub fps: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        SyntheticConfig {
            width: 640,
            height: 480,
            fps: 15,
        }
    }
}

/// Spawns a background thread that produces paced test-pattern frames.
///
/// The channel bound is intentionally small so the generator backpressures
/// instead of queueing when the consumer falls behind. The thread exits once
/// the receiver is dropped.
pub fn spawn_synthetic_reader(
    config: SyntheticConfig,
) -> Result<Receiver<Result<CapturedFrame, CaptureError>>> {
    let (tx, rx) = bounded(2);
    thread::Builder::new()
        .name("frame-source".into())
        .spawn(move || generate_loop(config, tx))?;
    Ok(rx)
}

fn generate_loop(config: SyntheticConfig, tx: Sender<Result<CapturedFrame, CaptureError>>) {
    let interval = Duration::from_secs_f64(1.0 / f64::from(config.fps.max(1)));
    debug!(
        width = config.width,
        height = config.height,
        fps = config.fps,
        "synthetic capture started"
    );

    let mut index: u64 = 0;
    loop {
        let started = Instant::now();
        let frame = CapturedFrame {
            data: test_pattern(config.width, config.height, index),
            width: config.width,
            height: config.height,
            timestamp_ms: Utc::now().timestamp_millis(),
        };
        if tx.send(Ok(frame)).is_err() {
            debug!("synthetic capture stopped: receiver dropped");
            break;
        }
        index = index.wrapping_add(1);
        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            thread::sleep(remaining);
        }
    }
}

/// A horizontal gradient with a bright bar sweeping down one row per frame,
/// so consecutive frames differ and a brightness detector has something to
/// find.
fn test_pattern(width: usize, height: usize, index: u64) -> Vec<u8> {
    let mut data = vec![0u8; width * height * 3];
    let bar_row = if height > 0 {
        (index as usize) % height
    } else {
        0
    };
    for y in 0..height {
        for x in 0..width {
            let offset = (y * width + x) * 3;
            if y == bar_row {
                data[offset] = 255;
                data[offset + 1] = 255;
                data[offset + 2] = 255;
            } else {
                data[offset] = ((x * 256) / width.max(1)) as u8;
                data[offset + 1] = ((y * 256) / height.max(1)) as u8;
                data[offset + 2] = 64;
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_are_sized_and_time_ordered() {
        let config = SyntheticConfig {
            width: 8,
            height: 6,
            fps: 200,
        };
        let rx = spawn_synthetic_reader(config).unwrap();
        let first = rx.recv().unwrap().unwrap();
        let second = rx.recv().unwrap().unwrap();
        assert_eq!(first.data.len(), 8 * 6 * 3);
        assert_eq!((first.width, first.height), (8, 6));
        assert!(second.timestamp_ms >= first.timestamp_ms);
        drop(rx);
    }

    #[test]
    fn bar_moves_between_frames() {
        assert_ne!(test_pattern(4, 4, 0), test_pattern(4, 4, 1));
    }
}
