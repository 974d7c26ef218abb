//! Error type for tensor construction.

use thiserror::Error;

/// Errors raised when constructing a tensor.
#[derive(Error, Debug)]
pub enum TensorError {
    #[error("Tensor payload does not fill the shape: expected {expected} elements but got {actual}")]
    ShapeDataMismatch { expected: usize, actual: usize },
}
