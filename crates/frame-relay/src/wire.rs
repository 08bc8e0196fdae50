//! Message-group layer on top of the raw array protocol.
//!
//! Client to server: repeated `(timestamp, image)` pairs ended by a sentinel
//! pair. Server to client: repeated `(timestamp, boxes, confidences,
//! class_ids)` quadruples. A sentinel in any position ends the direction;
//! reads of a group surface it as `Ok(None)` so callers can tell a clean
//! shutdown from a dropped peer.

use array_wire::{ArrayMessage, ArrayReceiver, ArraySender, TypedArray, WireError};

use crate::types::{DetectionResult, Detections, Frame, RelayError};

/// Send one `(timestamp, image)` pair.
pub fn send_frame(sender: &mut ArraySender, frame: &Frame) -> Result<(), WireError> {
    let timestamp = TypedArray::from_i64(vec![1], &[frame.timestamp_ms])?;
    sender.send(&ArrayMessage::Array(timestamp))?;
    sender.send(&ArrayMessage::Array(frame.image.clone()))?;
    sender.flush()
}

/// Send the sentinel pair that ends the frame stream.
pub fn send_shutdown(sender: &mut ArraySender) -> Result<(), WireError> {
    sender.send(&ArrayMessage::Sentinel)?;
    sender.send(&ArrayMessage::Sentinel)?;
    sender.flush()
}

/// Read one `(timestamp, image)` pair. `Ok(None)` means the peer ended the
/// stream with a sentinel in either position.
pub fn read_frame(receiver: &mut ArrayReceiver) -> Result<Option<Frame>, RelayError> {
    let timestamp = match receiver.receive()? {
        ArrayMessage::Sentinel => {
            // Consume the pair's second half if the peer sent both; a bare
            // sentinel still ends the stream.
            let _ = receiver.receive();
            return Ok(None);
        }
        ArrayMessage::Array(array) => timestamp_of(&array)?,
    };
    let image = match receiver.receive()? {
        ArrayMessage::Sentinel => return Ok(None),
        ArrayMessage::Array(array) => array,
    };
    Ok(Some(Frame {
        timestamp_ms: timestamp,
        image,
    }))
}

/// Send one `(timestamp, boxes, confidences, class_ids)` quadruple.
pub fn send_result(sender: &mut ArraySender, result: &DetectionResult) -> Result<(), RelayError> {
    let timestamp = TypedArray::from_i64(vec![1], &[result.timestamp_ms])?;
    let (boxes, confidences, class_ids) = result.detections.to_arrays()?;
    sender.send(&ArrayMessage::Array(timestamp))?;
    sender.send(&ArrayMessage::Array(boxes))?;
    sender.send(&ArrayMessage::Array(confidences))?;
    sender.send(&ArrayMessage::Array(class_ids))?;
    sender.flush()?;
    Ok(())
}

/// Read one result quadruple. `Ok(None)` means the peer ended the stream.
pub fn read_result(receiver: &mut ArrayReceiver) -> Result<Option<DetectionResult>, RelayError> {
    let mut parts = Vec::with_capacity(4);
    for _ in 0..4 {
        match receiver.receive()? {
            ArrayMessage::Sentinel => return Ok(None),
            ArrayMessage::Array(array) => parts.push(array),
        }
    }
    let timestamp_ms = timestamp_of(&parts[0])?;
    let detections = Detections::from_arrays(&parts[1], &parts[2], &parts[3])?;
    Ok(Some(DetectionResult {
        timestamp_ms,
        detections,
    }))
}

fn timestamp_of(array: &TypedArray) -> Result<i64, RelayError> {
    if array.shape() != [1] {
        return Err(RelayError::Shape {
            field: "timestamp",
            shape: array.shape().to_vec(),
        });
    }
    Ok(array.to_i64_vec()?[0])
}
