//! Elementwise addition operator.

use crate::errors::{RunError, SessionError};
use crate::graph::NodeInfo;
use crate::ops::{
    expect_input_count, expect_node_arity, expect_same_shape, f32_operand, Kernel, OperatorFactory,
};
use crate::tensor::Tensor;

/// Adds two f32 tensors of identical shape.
pub struct AddKernel;

impl Kernel for AddKernel {
    fn apply(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, RunError> {
        expect_input_count("Add", inputs, 2)?;
        expect_same_shape("Add", inputs[0], inputs[1])?;
        let left = f32_operand("Add", inputs[0])?;
        let right = f32_operand("Add", inputs[1])?;

        let sum: Vec<f32> = left.iter().zip(right).map(|(a, b)| a + b).collect();
        Ok(vec![Tensor::from_f32(inputs[0].shape().to_vec(), sum)?])
    }
}

pub struct AddFactory;

impl OperatorFactory for AddFactory {
    fn instantiate(&self, node: &NodeInfo) -> Result<Box<dyn Kernel>, SessionError> {
        expect_node_arity(node, 2, 1)?;
        Ok(Box::new(AddKernel))
    }
}
