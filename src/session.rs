//! Inference sessions.
//!
//! A session binds a model graph to a set of options: it validates the
//! graph's structure, resolves every node against the operator registry,
//! instantiates kernels, and can then be run any number of times with a
//! name-to-tensor input feed. Everything that can fail due to a bad model
//! fails while the session is built; `run` only fails on a bad feed or a
//! kernel error.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::errors::{RunError, RunResult, SessionError, SessionResult};
use crate::graph::{GraphInfo, TensorSpec};
use crate::ops::Kernel;
use crate::registry;
use crate::tensor::Tensor;

/// Graph optimization level applied while the session is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptLevel {
    /// Execute the graph exactly as written.
    Disabled,
    /// Drop nodes whose outputs cannot reach any declared graph output.
    #[default]
    Basic,
}

/// Settings controlling session behavior.
///
/// `intra_op_threads` is a tuning hint; the executor is synchronous and
/// single-threaded, so values above 1 are accepted and ignored.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub intra_op_threads: usize,
    pub optimization: OptLevel,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            intra_op_threads: 1,
            optimization: OptLevel::Basic,
        }
    }
}

struct PlannedNode {
    label: String,
    kernel: Box<dyn Kernel>,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

/// A bound, executable instance of a model graph plus configuration.
pub struct Session {
    inputs: Vec<TensorSpec>,
    outputs: Vec<TensorSpec>,
    plan: Vec<PlannedNode>,
}

impl Session {
    /// Builds a session from a model file on disk.
    pub fn from_file(path: impl AsRef<std::path::Path>, options: &SessionOptions) -> SessionResult<Self> {
        let graph = GraphInfo::from_file(path)?;
        Self::from_graph(graph, options)
    }

    /// Builds a session from an already-parsed graph.
    pub fn from_graph(graph: GraphInfo, options: &SessionOptions) -> SessionResult<Self> {
        if options.intra_op_threads == 0 {
            return Err(SessionError::InvalidThreadCount { requested: 0 });
        }

        Self::validate_structure(&graph)?;

        let nodes = match options.optimization {
            OptLevel::Disabled => graph.nodes,
            OptLevel::Basic => Self::prune_dead_nodes(graph.nodes, &graph.outputs),
        };

        let mut plan = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let factory = registry::resolve(&node.domain, &node.op_type).ok_or_else(|| {
                SessionError::UnknownOperator {
                    domain: node.domain.clone(),
                    op_type: node.op_type.clone(),
                }
            })?;
            let kernel = factory.instantiate(node)?;
            plan.push(PlannedNode {
                label: node.label().to_string(),
                kernel,
                input_names: node.inputs.clone(),
                output_names: node.outputs.clone(),
            });
        }

        debug!(
            "session bound: {} input(s), {} output(s), {} node(s)",
            graph.inputs.len(),
            graph.outputs.len(),
            plan.len()
        );
        Ok(Self {
            inputs: graph.inputs,
            outputs: graph.outputs,
            plan,
        })
    }

    /// Declared model inputs, in declaration order.
    pub fn input_specs(&self) -> &[TensorSpec] {
        &self.inputs
    }

    /// Declared model outputs, in declaration order.
    pub fn output_specs(&self) -> &[TensorSpec] {
        &self.outputs
    }

    fn validate_structure(graph: &GraphInfo) -> SessionResult<()> {
        if graph.nodes.is_empty() {
            return Err(SessionError::EmptyGraph);
        }
        if graph.inputs.is_empty() || graph.outputs.is_empty() {
            return Err(SessionError::MissingGraphBoundary);
        }

        // Value names are unique across graph inputs and node outputs;
        // nodes are topologically ordered, so every node input must already
        // be known when the node is reached.
        let mut known: HashSet<&str> = HashSet::new();
        for spec in &graph.inputs {
            if !known.insert(&spec.name) {
                return Err(SessionError::DuplicateValueName {
                    name: spec.name.clone(),
                });
            }
        }
        for node in &graph.nodes {
            for input in &node.inputs {
                if !known.contains(input.as_str()) {
                    return Err(SessionError::UnresolvedNodeInput {
                        node: node.label().to_string(),
                        input: input.clone(),
                    });
                }
            }
            for output in &node.outputs {
                if !known.insert(output) {
                    return Err(SessionError::DuplicateValueName {
                        name: output.clone(),
                    });
                }
            }
        }
        for spec in &graph.outputs {
            if !known.contains(spec.name.as_str()) {
                return Err(SessionError::UnproducedGraphOutput {
                    name: spec.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Keeps only nodes whose outputs feed a declared graph output,
    /// directly or through later nodes.
    fn prune_dead_nodes(
        nodes: Vec<crate::graph::NodeInfo>,
        outputs: &[TensorSpec],
    ) -> Vec<crate::graph::NodeInfo> {
        let mut needed: HashSet<String> = outputs.iter().map(|spec| spec.name.clone()).collect();
        let mut keep = vec![false; nodes.len()];
        for (index, node) in nodes.iter().enumerate().rev() {
            if node.outputs.iter().any(|name| needed.contains(name)) {
                keep[index] = true;
                needed.extend(node.inputs.iter().cloned());
            }
        }

        let total = nodes.len();
        let kept: Vec<_> = nodes
            .into_iter()
            .zip(keep)
            .filter_map(|(node, keep)| keep.then_some(node))
            .collect();
        if kept.len() < total {
            debug!("pruned {} dead node(s)", total - kept.len());
        }
        kept
    }

    fn validate_feed(&self, inputs: &[(&str, Tensor)]) -> RunResult<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for (name, _) in inputs {
            if !seen.insert(name) {
                return Err(RunError::DuplicateInput {
                    name: name.to_string(),
                });
            }
            if !self.inputs.iter().any(|spec| spec.name == *name) {
                return Err(RunError::UnknownInput {
                    name: name.to_string(),
                });
            }
        }

        for spec in &self.inputs {
            let supplied = inputs
                .iter()
                .find(|(name, _)| *name == spec.name)
                .map(|(_, tensor)| tensor)
                .ok_or_else(|| RunError::MissingInput {
                    name: spec.name.clone(),
                })?;
            if supplied.dtype() != spec.dtype {
                return Err(RunError::InputDtypeMismatch {
                    name: spec.name.clone(),
                    expected: spec.dtype,
                    actual: supplied.dtype(),
                });
            }
            if supplied.shape() != spec.shape.as_slice() {
                return Err(RunError::InputShapeMismatch {
                    name: spec.name.clone(),
                    expected: spec.shape.clone(),
                    actual: supplied.shape().to_vec(),
                });
            }
        }
        Ok(())
    }

    /// Runs the graph once on the supplied named inputs and returns the
    /// declared outputs in declaration order.
    ///
    /// The feed must supply every declared input exactly once, with the
    /// declared shape and dtype; anything else is rejected before the first
    /// node executes.
    pub fn run(&self, inputs: &[(&str, Tensor)]) -> RunResult<Vec<Tensor>> {
        self.validate_feed(inputs)?;

        let mut values: HashMap<String, Tensor> = inputs
            .iter()
            .map(|(name, tensor)| (name.to_string(), tensor.clone()))
            .collect();

        for node in &self.plan {
            let mut operands = Vec::with_capacity(node.input_names.len());
            for name in &node.input_names {
                let value = values
                    .get(name)
                    .ok_or_else(|| RunError::MissingIntermediate { name: name.clone() })?;
                operands.push(value);
            }

            let produced = node.kernel.apply(&operands)?;
            if produced.len() != node.output_names.len() {
                return Err(RunError::OutputCountMismatch {
                    node: node.label.clone(),
                    expected: node.output_names.len(),
                    actual: produced.len(),
                });
            }
            for (name, tensor) in node.output_names.iter().zip(produced) {
                values.insert(name.clone(), tensor);
            }
        }

        let mut outputs = Vec::with_capacity(self.outputs.len());
        for spec in &self.outputs {
            let tensor = values
                .remove(&spec.name)
                .ok_or_else(|| RunError::MissingIntermediate {
                    name: spec.name.clone(),
                })?;
            if tensor.dtype() != spec.dtype {
                return Err(RunError::OutputDtypeMismatch {
                    name: spec.name.clone(),
                    expected: spec.dtype,
                    actual: tensor.dtype(),
                });
            }
            if tensor.shape() != spec.shape.as_slice() {
                return Err(RunError::OutputShapeMismatch {
                    name: spec.name.clone(),
                    expected: spec.shape.clone(),
                    actual: tensor.shape().to_vec(),
                });
            }
            outputs.push(tensor);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphInfo;
    use crate::tensor::DType;

    fn identity_graph() -> GraphInfo {
        GraphInfo::builder()
            .input("input1", vec![2, 2], DType::F32)
            .output("output1", vec![2, 2], DType::F32)
            .simple_node("Identity", &["input1"], &["output1"])
            .build()
    }

    #[test]
    fn empty_graph_is_rejected() {
        let graph = GraphInfo::builder()
            .input("a", vec![1], DType::F32)
            .output("a", vec![1], DType::F32)
            .build();
        let result = Session::from_graph(graph, &SessionOptions::default());
        assert!(matches!(result, Err(SessionError::EmptyGraph)));
    }

    #[test]
    fn unresolved_node_input_is_rejected() {
        let graph = GraphInfo::builder()
            .input("a", vec![1], DType::F32)
            .output("b", vec![1], DType::F32)
            .simple_node("Identity", &["missing"], &["b"])
            .build();
        let result = Session::from_graph(graph, &SessionOptions::default());
        assert!(matches!(
            result,
            Err(SessionError::UnresolvedNodeInput { input, .. }) if input == "missing"
        ));
    }

    #[test]
    fn duplicate_value_name_is_rejected() {
        let graph = GraphInfo::builder()
            .input("a", vec![1], DType::F32)
            .output("a2", vec![1], DType::F32)
            .simple_node("Identity", &["a"], &["a"])
            .build();
        let result = Session::from_graph(graph, &SessionOptions::default());
        assert!(matches!(
            result,
            Err(SessionError::DuplicateValueName { name }) if name == "a"
        ));
    }

    #[test]
    fn unproduced_graph_output_is_rejected() {
        let graph = GraphInfo::builder()
            .input("a", vec![1], DType::F32)
            .output("never", vec![1], DType::F32)
            .simple_node("Identity", &["a"], &["b"])
            .build();
        let result = Session::from_graph(graph, &SessionOptions::default());
        assert!(matches!(
            result,
            Err(SessionError::UnproducedGraphOutput { name }) if name == "never"
        ));
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let graph = GraphInfo::builder()
            .input("a", vec![1], DType::F32)
            .output("b", vec![1], DType::F32)
            .simple_node("Conv", &["a"], &["b"])
            .build();
        let result = Session::from_graph(graph, &SessionOptions::default());
        assert!(matches!(
            result,
            Err(SessionError::UnknownOperator { op_type, .. }) if op_type == "Conv"
        ));
    }

    #[test]
    fn zero_threads_is_rejected() {
        let options = SessionOptions {
            intra_op_threads: 0,
            ..SessionOptions::default()
        };
        let result = Session::from_graph(identity_graph(), &options);
        assert!(matches!(
            result,
            Err(SessionError::InvalidThreadCount { requested: 0 })
        ));
    }

    #[test]
    fn dead_nodes_are_pruned_under_basic_optimization() {
        // The dangling Relu feeds nothing; Basic drops it before binding.
        let graph = GraphInfo::builder()
            .input("a", vec![2], DType::F32)
            .output("b", vec![2], DType::F32)
            .simple_node("Identity", &["a"], &["b"])
            .simple_node("Relu", &["a"], &["unused"])
            .build();
        let session = Session::from_graph(graph, &SessionOptions::default())
            .expect("dead node should not block the session");
        assert_eq!(session.plan.len(), 1);
    }

    #[test]
    fn disabled_optimization_keeps_dead_nodes() {
        let graph = GraphInfo::builder()
            .input("a", vec![2], DType::F32)
            .output("b", vec![2], DType::F32)
            .simple_node("Identity", &["a"], &["b"])
            .simple_node("Relu", &["a"], &["unused"])
            .build();
        let options = SessionOptions {
            optimization: OptLevel::Disabled,
            ..SessionOptions::default()
        };
        let session = Session::from_graph(graph, &options).expect("graph is still valid");
        assert_eq!(session.plan.len(), 2);
    }

    #[test]
    fn run_checks_input_names() {
        let session = Session::from_graph(identity_graph(), &SessionOptions::default()).unwrap();
        let tensor = Tensor::zeros(vec![2, 2], DType::F32);

        let result = session.run(&[("wrong_name", tensor.clone())]);
        assert!(matches!(result, Err(RunError::UnknownInput { .. })));

        let result = session.run(&[]);
        assert!(matches!(
            result,
            Err(RunError::MissingInput { name }) if name == "input1"
        ));

        let result = session.run(&[("input1", tensor.clone()), ("input1", tensor)]);
        assert!(matches!(result, Err(RunError::DuplicateInput { .. })));
    }
}
