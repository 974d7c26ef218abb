//! Rectified linear unit operator: f(x) = max(0, x).

use crate::errors::{RunError, SessionError};
use crate::graph::NodeInfo;
use crate::ops::{expect_input_count, expect_node_arity, f32_operand, Kernel, OperatorFactory};
use crate::tensor::Tensor;

pub struct ReluKernel;

impl Kernel for ReluKernel {
    fn apply(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, RunError> {
        expect_input_count("Relu", inputs, 1)?;
        let values = f32_operand("Relu", inputs[0])?;

        let rectified: Vec<f32> = values.iter().map(|&x| x.max(0.0)).collect();
        Ok(vec![Tensor::from_f32(
            inputs[0].shape().to_vec(),
            rectified,
        )?])
    }
}

pub struct ReluFactory;

impl OperatorFactory for ReluFactory {
    fn instantiate(&self, node: &NodeInfo) -> Result<Box<dyn Kernel>, SessionError> {
        expect_node_arity(node, 1, 1)?;
        Ok(Box::new(ReluKernel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_negatives_to_zero() {
        let input = Tensor::from_f32(vec![4], vec![-1.0, 0.0, 0.5, -0.25]).unwrap();
        let outputs = ReluKernel.apply(&[&input]).unwrap();
        assert_eq!(outputs[0].as_f32(), Some(&[0.0, 0.0, 0.5, 0.0][..]));
    }
}
