use array_wire::{TypedArray, WireError};
use thiserror::Error;

/// Errors raised when wire arrays do not assemble into domain values.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("unexpected array shape for {field}: {shape:?}")]
    Shape { field: &'static str, shape: Vec<usize> },

    #[error("detection fields disagree on count: {boxes} boxes, {confidences} confidences, {class_ids} class ids")]
    CountMismatch {
        boxes: usize,
        confidences: usize,
        class_ids: usize,
    },
}

impl RelayError {
    /// Whether the underlying cause is the peer going away rather than a
    /// corrupt or mismatched stream.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, RelayError::Wire(err) if err.is_disconnect())
    }
}

/// One captured image with its capture time in Unix milliseconds.
///
/// Timestamps are non-decreasing in capture order; correlation relies on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub timestamp_ms: i64,
    pub image: TypedArray,
}

/// Detector output for one frame: parallel lists of boxes `(x, y, w, h)`,
/// confidences and class ids.
#[derive(Clone, Debug, PartialEq)]
pub struct Detections {
    pub boxes: Vec<[i64; 4]>,
    pub confidences: Vec<f32>,
    pub class_ids: Vec<i64>,
}

impl Detections {
    pub fn empty() -> Self {
        Detections {
            boxes: Vec::new(),
            confidences: Vec::new(),
            class_ids: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Assemble from the three wire arrays, validating shapes and counts.
    pub fn from_arrays(
        boxes: &TypedArray,
        confidences: &TypedArray,
        class_ids: &TypedArray,
    ) -> Result<Self, RelayError> {
        if boxes.shape().len() != 2 || boxes.shape()[1] != 4 {
            return Err(RelayError::Shape {
                field: "boxes",
                shape: boxes.shape().to_vec(),
            });
        }
        if confidences.shape().len() != 1 {
            return Err(RelayError::Shape {
                field: "confidences",
                shape: confidences.shape().to_vec(),
            });
        }
        if class_ids.shape().len() != 1 {
            return Err(RelayError::Shape {
                field: "class_ids",
                shape: class_ids.shape().to_vec(),
            });
        }

        let box_values = boxes.to_i64_vec()?;
        let confidences = confidences.to_f32_vec()?;
        let class_ids = class_ids.to_i64_vec()?;
        let boxes: Vec<[i64; 4]> = box_values
            .chunks_exact(4)
            .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
            .collect();

        if boxes.len() != confidences.len() || boxes.len() != class_ids.len() {
            return Err(RelayError::CountMismatch {
                boxes: boxes.len(),
                confidences: confidences.len(),
                class_ids: class_ids.len(),
            });
        }
        Ok(Detections {
            boxes,
            confidences,
            class_ids,
        })
    }

    /// Flatten back into the three wire arrays `(k,4) <i8`, `(k,) <f4`,
    /// `(k,) <i8`.
    pub fn to_arrays(&self) -> Result<(TypedArray, TypedArray, TypedArray), RelayError> {
        let k = self.len();
        let flat: Vec<i64> = self.boxes.iter().flatten().copied().collect();
        let boxes = TypedArray::from_i64(vec![k, 4], &flat)?;
        let confidences = TypedArray::from_f32(vec![k], &self.confidences)?;
        let class_ids = TypedArray::from_i64(vec![k], &self.class_ids)?;
        Ok((boxes, confidences, class_ids))
    }
}

/// A detector verdict tied back to the frame that produced it by timestamp.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    pub timestamp_ms: i64,
    pub detections: Detections,
}
