//! Error types for model loading and session construction.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a model file or building a session.
///
/// Session construction validates the whole graph up front; an invalid or
/// unresolvable model must fail here with a descriptive error, never produce
/// a session that silently does nothing.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to read model file {path}: {source}")]
    ModelRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse model JSON: {0}")]
    ModelParse(#[from] serde_json::Error),

    #[error("The model graph must declare at least one node")]
    EmptyGraph,

    #[error("The model graph must declare at least one input and one output")]
    MissingGraphBoundary,

    #[error("The value name '{name}' is declared more than once in the graph")]
    DuplicateValueName { name: String },

    #[error("Node '{node}' reads '{input}', which is not a graph input or an earlier node's output")]
    UnresolvedNodeInput { node: String, input: String },

    #[error("Declared graph output '{name}' is not produced by any node")]
    UnproducedGraphOutput { name: String },

    #[error("No operator registered for '{op_type}' in domain '{domain}'")]
    UnknownOperator { domain: String, op_type: String },

    #[error("Node '{node}' expects {expected} input(s) but lists {actual}")]
    WrongInputCount {
        node: String,
        expected: usize,
        actual: usize,
    },

    #[error("Node '{node}' expects {expected} output(s) but lists {actual}")]
    WrongOutputCount {
        node: String,
        expected: usize,
        actual: usize,
    },

    #[error("Node '{node}' is missing required attribute '{attribute}'")]
    MissingAttribute { node: String, attribute: String },

    #[error("Node '{node}' attribute '{attribute}' must be a {expected}")]
    AttributeTypeMismatch {
        node: String,
        attribute: String,
        expected: String,
    },

    #[error("intra_op_threads must be at least 1, got {requested}")]
    InvalidThreadCount { requested: usize },
}
