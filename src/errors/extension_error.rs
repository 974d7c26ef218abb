//! Error types for loading custom-operator extension libraries.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading an extension library or registering its operators.
///
/// Any failure here is fatal to the caller: a model referencing custom
/// operators cannot run without them, so extensions fail fast at load time.
#[derive(Error, Debug)]
pub enum ExtensionError {
    #[error("Failed to load extension library at {path}: {source}")]
    LoadFailed {
        path: PathBuf,
        source: libloading::Error,
    },

    #[error("Required symbol '{symbol}' not found in {path}")]
    SymbolNotFound { path: PathBuf, symbol: String },

    #[error("Extension {path} reports ABI version {actual}, host supports {expected}")]
    AbiVersionMismatch {
        path: PathBuf,
        expected: u32,
        actual: u32,
    },

    #[error("Extension returned a null pointer from {function}")]
    NullPointer { function: String },

    #[error("Extension returned invalid UTF-8 from {function}")]
    InvalidUtf8 { function: String },

    #[error("Failed to parse extension operator list: {source}")]
    OperatorListParse { source: serde_json::Error },

    #[error("Extension declares no operators")]
    EmptyOperatorList,

    #[error("Operator '{op_type}' in domain '{domain}' is already registered")]
    DuplicateOperator { domain: String, op_type: String },
}
