use crate::dtype::Dtype;
use crate::error::WireError;

/// A shaped, typed, contiguous binary array value.
///
/// Invariant: `data.len() == product(shape) * dtype.width()`. Constructors
/// enforce it; a mismatch is an error, never a silent truncation. The shape
/// is never empty — rank zero is reserved on the wire for the sentinel.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedArray {
    shape: Vec<usize>,
    dtype: Dtype,
    data: Vec<u8>,
}

impl TypedArray {
    pub fn new(shape: Vec<usize>, dtype: Dtype, data: Vec<u8>) -> Result<Self, WireError> {
        if shape.is_empty() {
            return Err(WireError::protocol("rank-zero array is not a value"));
        }
        let elements: usize = shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            .ok_or_else(|| WireError::protocol("shape element count overflows"))?;
        let expected = elements
            .checked_mul(dtype.width())
            .ok_or_else(|| WireError::protocol("payload size overflows"))?;
        if data.len() != expected {
            return Err(WireError::protocol(format!(
                "payload is {} bytes but shape {:?} with dtype {} needs {}",
                data.len(),
                shape,
                dtype,
                expected
            )));
        }
        Ok(TypedArray { shape, dtype, data })
    }

    /// Build a little-endian `<i8` array from integer values.
    pub fn from_i64(shape: Vec<usize>, values: &[i64]) -> Result<Self, WireError> {
        let mut data = Vec::with_capacity(values.len() * 8);
        for value in values {
            data.extend_from_slice(&value.to_le_bytes());
        }
        Self::new(shape, Dtype::INT64, data)
    }

    /// Build a little-endian `<f4` array from float values.
    pub fn from_f32(shape: Vec<usize>, values: &[f32]) -> Result<Self, WireError> {
        let mut data = Vec::with_capacity(values.len() * 4);
        for value in values {
            data.extend_from_slice(&value.to_le_bytes());
        }
        Self::new(shape, Dtype::FLOAT32, data)
    }

    /// Build a `|u1` image array of shape `(height, width, 3)`.
    pub fn rgb_image(height: usize, width: usize, data: Vec<u8>) -> Result<Self, WireError> {
        Self::new(vec![height, width, 3], Dtype::UINT8, data)
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// Decode the payload as `<i8` values.
    pub fn to_i64_vec(&self) -> Result<Vec<i64>, WireError> {
        if self.dtype != Dtype::INT64 {
            return Err(WireError::protocol(format!(
                "expected <i8 payload, got {}",
                self.dtype
            )));
        }
        Ok(self
            .data
            .chunks_exact(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(chunk);
                i64::from_le_bytes(raw)
            })
            .collect())
    }

    /// Decode the payload as `<f4` values.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>, WireError> {
        if self.dtype != Dtype::FLOAT32 {
            return Err(WireError::protocol(format!(
                "expected <f4 payload, got {}",
                self.dtype
            )));
        }
        Ok(self
            .data
            .chunks_exact(4)
            .map(|chunk| {
                let mut raw = [0u8; 4];
                raw.copy_from_slice(chunk);
                f32::from_le_bytes(raw)
            })
            .collect())
    }

}

/// One message on the array stream: a value, or the end-of-direction marker.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayMessage {
    Array(TypedArray),
    /// In-band termination: no more arrays will follow in this direction.
    Sentinel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_length_must_match_shape_and_width() {
        let err = TypedArray::new(vec![2, 2], Dtype::INT64, vec![0u8; 31]).unwrap_err();
        assert!(matches!(err, WireError::Protocol { .. }));
        assert!(TypedArray::new(vec![2, 2], Dtype::INT64, vec![0u8; 32]).is_ok());
    }

    #[test]
    fn rank_zero_value_is_rejected() {
        assert!(TypedArray::new(vec![], Dtype::UINT8, vec![]).is_err());
    }

    #[test]
    fn i64_round_trip() {
        let arr = TypedArray::from_i64(vec![3], &[-1, 0, i64::MAX]).unwrap();
        assert_eq!(arr.to_i64_vec().unwrap(), vec![-1, 0, i64::MAX]);
        assert_eq!(arr.dtype().to_string(), "<i8");
        assert_eq!(arr.element_count(), 3);
    }

    #[test]
    fn f32_round_trip() {
        let arr = TypedArray::from_f32(vec![2], &[0.5, -2.25]).unwrap();
        assert_eq!(arr.to_f32_vec().unwrap(), vec![0.5, -2.25]);
    }

    #[test]
    fn typed_accessors_reject_wrong_dtype() {
        let arr = TypedArray::rgb_image(1, 1, vec![0, 0, 0]).unwrap();
        assert!(arr.to_i64_vec().is_err());
        assert!(arr.to_f32_vec().is_err());
    }

    #[test]
    fn overflowing_shape_is_rejected() {
        let err = TypedArray::new(vec![usize::MAX, 2], Dtype::UINT8, vec![]).unwrap_err();
        assert!(matches!(err, WireError::Protocol { .. }));
    }
}
