//! Model graph definition.
//!
//! A model file is a JSON document describing declared inputs and outputs
//! plus a topologically ordered list of operator nodes. Parsing is lenient
//! about optional fields (node names, attribute maps, domains); structural
//! validation happens when a [`Session`](crate::session::Session) is built.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::SessionError;
use crate::tensor::DType;

/// A declared graph input or output: name, shape and element type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorSpec {
    pub name: String,
    pub shape: Vec<usize>,
    #[serde(default)]
    pub dtype: DType,
}

/// A node attribute value as it appears in the model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int(i64),
    Float(f32),
    Str(String),
}

impl AttributeValue {
    /// Numeric view of the attribute; integers coerce to f32.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            AttributeValue::Float(value) => Some(*value),
            AttributeValue::Int(value) => Some(*value as f32),
            AttributeValue::Str(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttributeValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

/// One operator invocation in the graph.
///
/// `op_type` plus `domain` select the operator implementation; built-in
/// operators live in the empty domain. Inputs and outputs reference value
/// names: graph inputs or outputs of earlier nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub name: String,
    pub op_type: String,
    #[serde(default)]
    pub domain: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, AttributeValue>,
}

impl NodeInfo {
    /// Label used in diagnostics: the node name when present, otherwise the op type.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.op_type
        } else {
            &self.name
        }
    }
}

/// A complete model graph as loaded from a model file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphInfo {
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
    pub nodes: Vec<NodeInfo>,
}

impl GraphInfo {
    /// Parses a graph from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, SessionError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a graph from a model file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| SessionError::ModelRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Creates a new builder for a graph.
    pub fn builder() -> GraphInfoBuilder {
        GraphInfoBuilder::new()
    }
}

/// Builder for [`GraphInfo`], mainly used by tests and fixtures.
pub struct GraphInfoBuilder {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
    nodes: Vec<NodeInfo>,
}

impl GraphInfoBuilder {
    fn new() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn input(mut self, name: &str, shape: Vec<usize>, dtype: DType) -> Self {
        self.inputs.push(TensorSpec {
            name: name.to_string(),
            shape,
            dtype,
        });
        self
    }

    pub fn output(mut self, name: &str, shape: Vec<usize>, dtype: DType) -> Self {
        self.outputs.push(TensorSpec {
            name: name.to_string(),
            shape,
            dtype,
        });
        self
    }

    pub fn node(mut self, node: NodeInfo) -> Self {
        self.nodes.push(node);
        self
    }

    /// Convenience for built-in (empty domain) nodes without attributes.
    pub fn simple_node(self, op_type: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        self.node(NodeInfo {
            name: String::new(),
            op_type: op_type.to_string(),
            domain: String::new(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            attributes: HashMap::new(),
        })
    }

    pub fn build(self) -> GraphInfo {
        GraphInfo {
            inputs: self.inputs,
            outputs: self.outputs,
            nodes: self.nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_float_coercion() {
        assert_eq!(AttributeValue::Float(1.5).as_f32(), Some(1.5));
        assert_eq!(AttributeValue::Int(3).as_f32(), Some(3.0));
        assert_eq!(AttributeValue::Str("x".to_string()).as_f32(), None);
    }

    #[test]
    fn node_label_falls_back_to_op_type() {
        let node = NodeInfo {
            name: String::new(),
            op_type: "Relu".to_string(),
            domain: String::new(),
            inputs: vec![],
            outputs: vec![],
            attributes: HashMap::new(),
        };
        assert_eq!(node.label(), "Relu");
    }

    #[test]
    fn parses_minimal_graph() {
        let graph = GraphInfo::from_json_str(
            r#"{
                "inputs": [{ "name": "input1", "shape": [2, 2] }],
                "outputs": [{ "name": "output1", "shape": [2, 2] }],
                "nodes": [
                    { "op_type": "Identity", "inputs": ["input1"], "outputs": ["output1"] }
                ]
            }"#,
        )
        .expect("graph should parse");

        assert_eq!(graph.inputs.len(), 1);
        assert_eq!(graph.inputs[0].dtype, DType::F32);
        assert_eq!(graph.nodes[0].domain, "");
        assert!(graph.nodes[0].attributes.is_empty());
    }

    #[test]
    fn parses_typed_attributes() {
        let graph = GraphInfo::from_json_str(
            r#"{
                "inputs": [{ "name": "a", "shape": [2] }],
                "outputs": [{ "name": "b", "shape": [2] }],
                "nodes": [
                    {
                        "op_type": "Scale",
                        "inputs": ["a"],
                        "outputs": ["b"],
                        "attributes": { "factor": 2.5, "mode": "exact", "repeat": 2 }
                    }
                ]
            }"#,
        )
        .expect("graph should parse");

        let attrs = &graph.nodes[0].attributes;
        assert_eq!(attrs["factor"], AttributeValue::Float(2.5));
        assert_eq!(attrs["mode"], AttributeValue::Str("exact".to_string()));
        assert_eq!(attrs["repeat"], AttributeValue::Int(2));
    }

    #[test]
    fn builder_produces_the_same_graph_as_json() {
        let built = GraphInfo::builder()
            .input("input1", vec![2, 2], DType::F32)
            .output("output1", vec![2, 2], DType::F32)
            .simple_node("Identity", &["input1"], &["output1"])
            .build();

        assert_eq!(built.inputs[0].name, "input1");
        assert_eq!(built.outputs[0].shape, vec![2, 2]);
        assert_eq!(built.nodes[0].op_type, "Identity");
        assert_eq!(built.nodes[0].label(), "Identity");
        assert!(built.nodes[0].attributes.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        let result = GraphInfo::from_json_str("{ not json");
        assert!(matches!(result, Err(SessionError::ModelParse(_))));
    }
}
