//! Small graph inference runtime with dynamically loaded custom operators.
//!
//! Models are JSON graphs of named operator nodes. A [`Session`] binds a
//! model to [`SessionOptions`], resolving every node against the
//! process-wide operator registry: built-in operators plus any custom
//! operators registered by extension shared libraries loaded through
//! [`load_extension`]. Extensions must be loaded before the sessions that
//! reference their operators are built.

pub mod errors;
pub mod extension;
pub mod graph;
pub mod ops;
pub mod registry;
pub mod session;
pub mod tensor;

pub use extension::{load_extension, LoadedExtension, EXTENSION_ABI_VERSION};
pub use graph::{AttributeValue, GraphInfo, NodeInfo, TensorSpec};
pub use session::{OptLevel, Session, SessionOptions};
pub use tensor::{DType, Tensor, TensorData};
