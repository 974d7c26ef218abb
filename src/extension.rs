//! Custom-operator extension libraries.
//!
//! Loads native shared libraries (`.so`/`.dll`/`.dylib`) that provide
//! operator kernels the built-in registry does not know, and registers them
//! into the process-wide registry before any session referencing them is
//! built.
//!
//! # C ABI contract
//!
//! Every extension library must export these symbols:
//!
//! - `tg_ext_abi_version() -> u32` — must return [`EXTENSION_ABI_VERSION`].
//! - `tg_ext_operators() -> *const c_char` — JSON array of
//!   `{ "domain", "op_type" }` descriptors. Freed via `tg_ext_free`.
//! - `tg_ext_compute(op_type, request) -> *const c_char` — executes one
//!   kernel. The request is JSON (`{ "attributes", "inputs" }` with tensors
//!   as `{ "shape", "dtype", "data" }`) and the response is either
//!   `{ "outputs": [...] }` or `{ "error": "..." }`. Freed via `tg_ext_free`.
//! - `tg_ext_free(ptr)` — frees a string previously returned by the library.
//!
//! On Unix the library is opened with `RTLD_NOW | RTLD_GLOBAL`: the host
//! process's symbols become visible to the extension, and unresolved
//! references fail at load time instead of at first call.

use std::collections::HashMap;
use std::ffi::{c_char, CStr, CString};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::{ExtensionError, ExtensionResult, RunError, SessionError};
use crate::graph::{AttributeValue, NodeInfo};
use crate::ops::{Kernel, OperatorFactory};
use crate::registry;
use crate::tensor::{Tensor, TensorData};

/// ABI version this host speaks. Bump on any wire or symbol change.
pub const EXTENSION_ABI_VERSION: u32 = 1;

const SYM_ABI_VERSION: &[u8] = b"tg_ext_abi_version\0";
const SYM_OPERATORS: &[u8] = b"tg_ext_operators\0";
const SYM_COMPUTE: &[u8] = b"tg_ext_compute\0";
const SYM_FREE: &[u8] = b"tg_ext_free\0";

type AbiVersionFn = unsafe extern "C" fn() -> u32;
type OperatorsFn = unsafe extern "C" fn() -> *const c_char;
type ComputeFn = unsafe extern "C" fn(*const c_char, *const c_char) -> *const c_char;
type FreeFn = unsafe extern "C" fn(*const c_char);

/// One operator advertised by an extension library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDescriptor {
    #[serde(default)]
    pub domain: String,
    pub op_type: String,
}

/// Tensor as it crosses the extension ABI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct WireTensor {
    pub shape: Vec<usize>,
    #[serde(flatten)]
    pub payload: TensorData,
}

impl From<&Tensor> for WireTensor {
    fn from(tensor: &Tensor) -> Self {
        Self {
            shape: tensor.shape().to_vec(),
            payload: tensor.data().clone(),
        }
    }
}

impl WireTensor {
    fn into_tensor(self) -> Result<Tensor, crate::errors::TensorError> {
        Tensor::new(self.shape, self.payload)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ComputeRequest {
    pub attributes: HashMap<String, AttributeValue>,
    pub inputs: Vec<WireTensor>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ComputeResponse {
    #[serde(default)]
    pub outputs: Vec<WireTensor>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A successfully loaded extension library.
///
/// The library itself stays mapped for the rest of the process: every
/// registered factory holds an `Arc` to it, and the registry never drops
/// entries. Dropping this handle only drops the descriptor list.
#[derive(Debug)]
pub struct LoadedExtension {
    path: PathBuf,
    operators: Vec<OperatorDescriptor>,
}

impl LoadedExtension {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Operators this extension registered, in advertised order.
    pub fn operators(&self) -> &[OperatorDescriptor] {
        &self.operators
    }
}

#[cfg(unix)]
fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    use libloading::os::unix::{Library as UnixLibrary, RTLD_GLOBAL, RTLD_NOW};
    unsafe { UnixLibrary::open(Some(path), RTLD_NOW | RTLD_GLOBAL).map(Into::into) }
}

#[cfg(not(unix))]
fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    unsafe { Library::new(path) }
}

fn get_symbol<'lib, T>(
    library: &'lib Library,
    name: &[u8],
    path: &Path,
) -> ExtensionResult<Symbol<'lib, T>> {
    unsafe { library.get(name) }.map_err(|_| ExtensionError::SymbolNotFound {
        path: path.to_path_buf(),
        symbol: String::from_utf8_lossy(&name[..name.len() - 1]).into_owned(),
    })
}

/// Copies a string returned by the extension, then hands the pointer back
/// to the extension's free function.
fn take_string(raw: *const c_char, free: &Symbol<'_, FreeFn>, function: &str) -> ExtensionResult<String> {
    if raw.is_null() {
        return Err(ExtensionError::NullPointer {
            function: function.to_string(),
        });
    }
    let text = unsafe { CStr::from_ptr(raw) }
        .to_str()
        .map(str::to_owned)
        .map_err(|_| ExtensionError::InvalidUtf8 {
            function: function.to_string(),
        });
    unsafe { (**free)(raw) };
    text
}

/// Loads a custom-operator extension library and registers every operator
/// it advertises into the process-wide registry.
///
/// Nothing is registered unless the whole load succeeds: a version
/// mismatch, a malformed operator list or a name collision leaves the
/// registry untouched.
pub fn load_extension(path: impl AsRef<Path>) -> ExtensionResult<LoadedExtension> {
    let path = path.as_ref();
    let library = open_library(path).map_err(|source| ExtensionError::LoadFailed {
        path: path.to_path_buf(),
        source,
    })?;

    // Symbols borrow the library; resolve and use them all before the
    // library moves into its shared handle.
    let operators = {
        let abi_version = get_symbol::<AbiVersionFn>(&library, SYM_ABI_VERSION, path)?;
        let actual = unsafe { abi_version() };
        if actual != EXTENSION_ABI_VERSION {
            return Err(ExtensionError::AbiVersionMismatch {
                path: path.to_path_buf(),
                expected: EXTENSION_ABI_VERSION,
                actual,
            });
        }

        // Compute is looked up again per call; resolving it here surfaces a
        // missing export at load time.
        get_symbol::<ComputeFn>(&library, SYM_COMPUTE, path)?;
        let free = get_symbol::<FreeFn>(&library, SYM_FREE, path)?;
        let operators_fn = get_symbol::<OperatorsFn>(&library, SYM_OPERATORS, path)?;

        let listing = take_string(unsafe { operators_fn() }, &free, "tg_ext_operators")?;
        let operators: Vec<OperatorDescriptor> = serde_json::from_str(&listing)
            .map_err(|source| ExtensionError::OperatorListParse { source })?;
        operators
    };

    if operators.is_empty() {
        return Err(ExtensionError::EmptyOperatorList);
    }
    for (index, descriptor) in operators.iter().enumerate() {
        let clashes_within_list = operators[..index].contains(descriptor);
        if clashes_within_list || registry::is_registered(&descriptor.domain, &descriptor.op_type) {
            return Err(ExtensionError::DuplicateOperator {
                domain: descriptor.domain.clone(),
                op_type: descriptor.op_type.clone(),
            });
        }
    }

    let library = Arc::new(library);
    for descriptor in &operators {
        let factory = ExtensionOperatorFactory {
            library: Arc::clone(&library),
            descriptor: descriptor.clone(),
        };
        registry::register_custom_operator(
            &descriptor.domain,
            &descriptor.op_type,
            Arc::new(factory),
        )?;
        debug!(
            "extension {} provides '{}' in domain '{}'",
            path.display(),
            descriptor.op_type,
            descriptor.domain
        );
    }

    info!(
        "loaded extension {} ({} operator(s))",
        path.display(),
        operators.len()
    );
    Ok(LoadedExtension {
        path: path.to_path_buf(),
        operators,
    })
}

/// Factory for kernels backed by an extension library.
struct ExtensionOperatorFactory {
    library: Arc<Library>,
    descriptor: OperatorDescriptor,
}

impl OperatorFactory for ExtensionOperatorFactory {
    fn instantiate(&self, node: &NodeInfo) -> Result<Box<dyn Kernel>, SessionError> {
        // Arity is the extension's contract to enforce; the host only
        // carries the node's attributes across the boundary.
        Ok(Box::new(ExtensionKernel {
            library: Arc::clone(&self.library),
            op_type: self.descriptor.op_type.clone(),
            attributes: node.attributes.clone(),
        }))
    }
}

/// Kernel that marshals tensors across the extension ABI.
struct ExtensionKernel {
    library: Arc<Library>,
    op_type: String,
    attributes: HashMap<String, AttributeValue>,
}

impl ExtensionKernel {
    fn compute_error(&self, message: impl Into<String>) -> RunError {
        RunError::ExtensionCompute {
            op_type: self.op_type.clone(),
            message: message.into(),
        }
    }
}

impl Kernel for ExtensionKernel {
    fn apply(&self, inputs: &[&Tensor]) -> Result<Vec<Tensor>, RunError> {
        let request = ComputeRequest {
            attributes: self.attributes.clone(),
            inputs: inputs.iter().map(|t| WireTensor::from(*t)).collect(),
        };
        let request_json = serde_json::to_string(&request)
            .map_err(|err| self.compute_error(format!("request encoding failed: {err}")))?;
        let op_type = CString::new(self.op_type.as_str())
            .map_err(|_| self.compute_error("operator name contains a NUL byte"))?;
        let request_c = CString::new(request_json)
            .map_err(|_| self.compute_error("request contains a NUL byte"))?;

        let compute: Symbol<'_, ComputeFn> = unsafe { self.library.get(SYM_COMPUTE) }
            .map_err(|err| self.compute_error(format!("symbol lookup failed: {err}")))?;
        let free: Symbol<'_, FreeFn> = unsafe { self.library.get(SYM_FREE) }
            .map_err(|err| self.compute_error(format!("symbol lookup failed: {err}")))?;

        let raw = unsafe { compute(op_type.as_ptr(), request_c.as_ptr()) };
        let response_json = take_string(raw, &free, "tg_ext_compute")
            .map_err(|err| self.compute_error(err.to_string()))?;

        let response: ComputeResponse = serde_json::from_str(&response_json)
            .map_err(|err| self.compute_error(format!("response decoding failed: {err}")))?;
        if let Some(message) = response.error {
            return Err(self.compute_error(message));
        }

        let mut outputs = Vec::with_capacity(response.outputs.len());
        for wire in response.outputs {
            outputs.push(wire.into_tensor()?);
        }
        Ok(outputs)
    }
}
