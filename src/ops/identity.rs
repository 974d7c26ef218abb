//! Identity operator: reproduces its input unchanged.

use crate::errors::{RunError, SessionError};
use crate::graph::NodeInfo;
use crate::ops::{expect_input_count, expect_node_arity, Kernel, OperatorFactory};
use crate::tensor::Tensor;

/// Pass-through kernel. Any shape, any dtype.
pub struct IdentityKernel;

impl Kernel for IdentityKernel {
    fn apply(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, RunError> {
        expect_input_count("Identity", inputs, 1)?;
        Ok(vec![inputs[0].clone()])
    }
}

pub struct IdentityFactory;

impl OperatorFactory for IdentityFactory {
    fn instantiate(&self, node: &NodeInfo) -> Result<Box<dyn Kernel>, SessionError> {
        expect_node_arity(node, 1, 1)?;
        Ok(Box::new(IdentityKernel))
    }
}
