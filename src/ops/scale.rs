//! Scale operator: multiplies every element by a node attribute.
//!
//! The `factor` attribute is resolved once at session build, so a node with
//! a missing or non-numeric factor fails session construction rather than
//! the first run.

use crate::errors::{RunError, SessionError};
use crate::graph::NodeInfo;
use crate::ops::{expect_input_count, expect_node_arity, f32_operand, Kernel, OperatorFactory};
use crate::tensor::Tensor;

pub struct ScaleKernel {
    factor: f32,
}

impl ScaleKernel {
    pub fn new(factor: f32) -> Self {
        Self { factor }
    }
}

impl Kernel for ScaleKernel {
    fn apply(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, RunError> {
        expect_input_count("Scale", inputs, 1)?;
        let values = f32_operand("Scale", inputs[0])?;

        let scaled: Vec<f32> = values.iter().map(|&x| x * self.factor).collect();
        Ok(vec![Tensor::from_f32(inputs[0].shape().to_vec(), scaled)?])
    }
}

pub struct ScaleFactory;

impl OperatorFactory for ScaleFactory {
    fn instantiate(&self, node: &NodeInfo) -> Result<Box<dyn Kernel>, SessionError> {
        expect_node_arity(node, 1, 1)?;

        let attribute = node
            .attributes
            .get("factor")
            .ok_or_else(|| SessionError::MissingAttribute {
                node: node.label().to_string(),
                attribute: "factor".to_string(),
            })?;
        let factor = attribute
            .as_f32()
            .ok_or_else(|| SessionError::AttributeTypeMismatch {
                node: node.label().to_string(),
                attribute: "factor".to_string(),
                expected: "number".to_string(),
            })?;

        Ok(Box::new(ScaleKernel::new(factor)))
    }
}
