//! Elementwise multiplication operator.

use crate::errors::{RunError, SessionError};
use crate::graph::NodeInfo;
use crate::ops::{
    expect_input_count, expect_node_arity, expect_same_shape, f32_operand, Kernel, OperatorFactory,
};
use crate::tensor::Tensor;

/// Multiplies two f32 tensors of identical shape.
pub struct MulKernel;

impl Kernel for MulKernel {
    fn apply(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, RunError> {
        expect_input_count("Mul", inputs, 2)?;
        expect_same_shape("Mul", inputs[0], inputs[1])?;
        let left = f32_operand("Mul", inputs[0])?;
        let right = f32_operand("Mul", inputs[1])?;

        let product: Vec<f32> = left.iter().zip(right).map(|(a, b)| a * b).collect();
        Ok(vec![Tensor::from_f32(inputs[0].shape().to_vec(), product)?])
    }
}

pub struct MulFactory;

impl OperatorFactory for MulFactory {
    fn instantiate(&self, node: &NodeInfo) -> Result<Box<dyn Kernel>, SessionError> {
        expect_node_arity(node, 2, 1)?;
        Ok(Box::new(MulKernel))
    }
}
