//! Error types for executing a session.

use thiserror::Error;

use crate::errors::TensorError;
use crate::tensor::DType;

/// Errors that can occur while running inference.
///
/// Input-contract violations (wrong name, shape or dtype) are rejected
/// before any node executes; a malformed feed must never reach a kernel.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Required input '{name}' was not supplied")]
    MissingInput { name: String },

    #[error("Input '{name}' does not match any declared model input")]
    UnknownInput { name: String },

    #[error("Input '{name}' was supplied more than once")]
    DuplicateInput { name: String },

    #[error("Input '{name}' has shape {actual:?} but the model declares {expected:?}")]
    InputShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Input '{name}' has dtype {actual} but the model declares {expected}")]
    InputDtypeMismatch {
        name: String,
        expected: DType,
        actual: DType,
    },

    #[error("Operator '{op_type}' expects {expected} input(s) but received {actual}")]
    WrongArity {
        op_type: String,
        expected: usize,
        actual: usize,
    },

    #[error("Operator '{op_type}' requires matching operand shapes, got {left:?} and {right:?}")]
    OperandShapeMismatch {
        op_type: String,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    #[error("Operator '{op_type}' does not support dtype {dtype}")]
    UnsupportedDtype { op_type: String, dtype: DType },

    #[error("Node '{node}' produced {actual} output(s) but the graph expects {expected}")]
    OutputCountMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },

    #[error("Output '{name}' has shape {actual:?} but the model declares {expected:?}")]
    OutputShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Output '{name}' has dtype {actual} but the model declares {expected}")]
    OutputDtypeMismatch {
        name: String,
        expected: DType,
        actual: DType,
    },

    #[error("Intermediate value '{name}' was never computed")]
    MissingIntermediate { name: String },

    #[error("Custom operator '{op_type}' failed: {message}")]
    ExtensionCompute { op_type: String, message: String },

    #[error(transparent)]
    Tensor(#[from] TensorError),
}
