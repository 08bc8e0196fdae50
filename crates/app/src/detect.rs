//! Inference seam and the built-in hardware-free detector.

use anyhow::{bail, Result};
use array_wire::TypedArray;
use frame_relay::Detections;

/// The inference collaborator: takes one `(h, w, 3)` image, returns boxes,
/// confidences and class ids. Implementations run on the server's main loop
/// thread, one frame at a time.
pub trait Detector: Send {
    fn infer(&mut self, image: &TypedArray) -> Result<Detections>;
}

/// Brightness detector: reports the bounding box of all pixels whose luma
/// meets the threshold, with the box's bright-pixel coverage as confidence.
/// Stands in for a real model so the server runs end to end without one.
pub struct LumaThresholdDetector {
    threshold: u8,
}

impl LumaThresholdDetector {
    pub fn new(threshold: u8) -> Self {
        LumaThresholdDetector { threshold }
    }
}

impl Detector for LumaThresholdDetector {
    fn infer(&mut self, image: &TypedArray) -> Result<Detections> {
        let shape = image.shape();
        if shape.len() != 3 || shape[2] != 3 {
            bail!("detector expects (h, w, 3) images, got shape {shape:?}");
        }
        let (height, width) = (shape[0], shape[1]);
        let data = image.data();

        let mut min_x = width;
        let mut max_x = 0usize;
        let mut min_y = height;
        let mut max_y = 0usize;
        let mut bright = 0usize;
        for y in 0..height {
            for x in 0..width {
                let offset = (y * width + x) * 3;
                let r = u16::from(data[offset]);
                let g = u16::from(data[offset + 1]);
                let b = u16::from(data[offset + 2]);
                // Cheap luma: (r + 2g + b) / 4.
                let luma = ((r + 2 * g + b) / 4) as u8;
                if luma >= self.threshold {
                    bright += 1;
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    min_y = min_y.min(y);
                    max_y = max_y.max(y);
                }
            }
        }

        if bright == 0 {
            return Ok(Detections::empty());
        }
        let box_w = max_x - min_x + 1;
        let box_h = max_y - min_y + 1;
        let coverage = bright as f32 / (box_w * box_h) as f32;
        Ok(Detections {
            boxes: vec![[min_x as i64, min_y as i64, box_w as i64, box_h as i64]],
            confidences: vec![coverage.min(1.0)],
            class_ids: vec![0],
        })
    }
}
