//! Operator kernels executed by inference sessions.
//!
//! Every operator is split in two pieces, mirroring how engines bind a
//! graph: an [`OperatorFactory`] runs once per node at session build
//! (attribute parsing and arity checks live here, so a bad node fails the
//! session instead of the run), and the [`Kernel`] it produces executes on
//! tensors for every `run` call.

use crate::errors::{RunError, SessionError};
use crate::graph::NodeInfo;
use crate::tensor::Tensor;

pub mod add;
pub mod identity;
pub mod mul;
pub mod relu;
pub mod scale;

pub use add::AddKernel;
pub use identity::IdentityKernel;
pub use mul::MulKernel;
pub use relu::ReluKernel;
pub use scale::ScaleKernel;

/// An executable operator bound to one graph node.
pub trait Kernel: Send + Sync {
    /// Executes the operator on the node's input tensors, in declared order.
    fn apply(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, RunError>;
}

/// Builds a [`Kernel`] from a graph node during session construction.
pub trait OperatorFactory: Send + Sync {
    fn instantiate(&self, node: &NodeInfo) -> Result<Box<dyn Kernel>, SessionError>;
}

/// Validates a node's declared input/output counts at session build.
pub(crate) fn expect_node_arity(
    node: &NodeInfo,
    inputs: usize,
    outputs: usize,
) -> Result<(), SessionError> {
    if node.inputs.len() != inputs {
        return Err(SessionError::WrongInputCount {
            node: node.label().to_string(),
            expected: inputs,
            actual: node.inputs.len(),
        });
    }
    if node.outputs.len() != outputs {
        return Err(SessionError::WrongOutputCount {
            node: node.label().to_string(),
            expected: outputs,
            actual: node.outputs.len(),
        });
    }
    Ok(())
}

/// Validates the number of tensors handed to a kernel at run time.
pub(crate) fn expect_input_count(
    op_type: &str,
    inputs: &[&Tensor],
    expected: usize,
) -> Result<(), RunError> {
    if inputs.len() != expected {
        return Err(RunError::WrongArity {
            op_type: op_type.to_string(),
            expected,
            actual: inputs.len(),
        });
    }
    Ok(())
}

/// Flat f32 view of an operand, rejecting other dtypes.
pub(crate) fn f32_operand<'a>(op_type: &str, tensor: &'a Tensor) -> Result<&'a [f32], RunError> {
    tensor.as_f32().ok_or_else(|| RunError::UnsupportedDtype {
        op_type: op_type.to_string(),
        dtype: tensor.dtype(),
    })
}

/// Requires two operands to share a shape.
pub(crate) fn expect_same_shape(op_type: &str, left: &Tensor, right: &Tensor) -> Result<(), RunError> {
    if left.shape() != right.shape() {
        return Err(RunError::OperandShapeMismatch {
            op_type: op_type.to_string(),
            left: left.shape().to_vec(),
            right: right.shape().to_vec(),
        });
    }
    Ok(())
}
