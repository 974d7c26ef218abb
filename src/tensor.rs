//! Dense tensor values exchanged with inference sessions.
//!
//! A tensor pairs a shape with a dtype-tagged payload. Sessions validate
//! every supplied tensor against the model's declared input contract, so
//! construction only enforces the one invariant a tensor cannot exist
//! without: the payload length must match the shape's element count.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::TensorError;

/// Element type of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DType {
    #[default]
    F32,
    I64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "F32"),
            DType::I64 => write!(f, "I64"),
        }
    }
}

/// Tensor payload, tagged by dtype.
///
/// The serde representation (`"dtype"` tag plus `"data"` array) is also the
/// wire form used by the extension ABI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "data")]
pub enum TensorData {
    F32(Vec<f32>),
    I64(Vec<i64>),
}

impl TensorData {
    /// Number of elements in the payload.
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(values) => values.len(),
            TensorData::I64(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type of the payload.
    pub fn dtype(&self) -> DType {
        match self {
            TensorData::F32(_) => DType::F32,
            TensorData::I64(_) => DType::I64,
        }
    }
}

/// An owned dense tensor.
///
/// Equality is exact: two tensors are equal when shape, dtype and every
/// element compare equal. Identity-style assertions rely on this rather
/// than an epsilon comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: TensorData,
}

impl Tensor {
    /// Creates a tensor, validating that the payload fills the shape exactly.
    pub fn new(shape: Vec<usize>, data: TensorData) -> Result<Self, TensorError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(TensorError::ShapeDataMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates an f32 tensor from a shape and flat row-major data.
    pub fn from_f32(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, TensorError> {
        Self::new(shape, TensorData::F32(data))
    }

    /// Creates an i64 tensor from a shape and flat row-major data.
    pub fn from_i64(shape: Vec<usize>, data: Vec<i64>) -> Result<Self, TensorError> {
        Self::new(shape, TensorData::I64(data))
    }

    /// Creates a zero-filled tensor of the given shape and dtype.
    pub fn zeros(shape: Vec<usize>, dtype: DType) -> Self {
        let count: usize = shape.iter().product();
        let data = match dtype {
            DType::F32 => TensorData::F32(vec![0.0; count]),
            DType::I64 => TensorData::I64(vec![0; count]),
        };
        Self { shape, data }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn element_count(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Flat f32 view, or `None` when the tensor holds another dtype.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            TensorData::F32(values) => Some(values),
            _ => None,
        }
    }

    /// Flat i64 view, or `None` when the tensor holds another dtype.
    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.data {
            TensorData::I64(values) => Some(values),
            _ => None,
        }
    }

    /// Splits the tensor into its shape and payload.
    pub fn into_parts(self) -> (Vec<usize>, TensorData) {
        (self.shape, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_payload_shorter_than_shape() {
        let result = Tensor::from_f32(vec![2, 2], vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            result,
            Err(TensorError::ShapeDataMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn rejects_payload_longer_than_shape() {
        let result = Tensor::from_i64(vec![2], vec![1, 2, 3]);
        assert!(matches!(
            result,
            Err(TensorError::ShapeDataMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn scalar_shape_holds_one_element() {
        let tensor = Tensor::from_f32(vec![], vec![7.5]).unwrap();
        assert_eq!(tensor.element_count(), 1);
        assert_eq!(tensor.shape(), &[] as &[usize]);
    }

    #[test]
    fn equality_is_exact() {
        let a = Tensor::from_f32(vec![2, 2], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let b = Tensor::from_f32(vec![2, 2], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let c = Tensor::from_f32(vec![2, 2], vec![0.1, 0.2, 0.3, 0.400_000_03]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn equality_distinguishes_shape_and_dtype() {
        let flat = Tensor::from_f32(vec![4], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let square = Tensor::from_f32(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_ne!(flat, square);

        let ints = Tensor::from_i64(vec![4], vec![1, 2, 3, 4]).unwrap();
        assert_ne!(flat, ints);
    }

    #[test]
    fn zeros_fills_the_shape() {
        let tensor = Tensor::zeros(vec![3, 2], DType::I64);
        assert_eq!(tensor.element_count(), 6);
        assert_eq!(tensor.as_i64(), Some(&[0i64; 6][..]));
        assert_eq!(tensor.dtype(), DType::I64);
    }

    #[test]
    fn wire_payload_round_trips_through_serde() {
        let data = TensorData::F32(vec![1.0, -2.5]);
        let json = serde_json::to_string(&data).unwrap();
        assert_eq!(json, r#"{"dtype":"F32","data":[1.0,-2.5]}"#);

        let back: TensorData = serde_json::from_str(&json).unwrap();
        assert_eq!(back, data);
    }
}
