//! Error types for the inference runtime.
//!
//! Each concern carries its own error enum instead of a generic wrapper
//! like `anyhow` or `Box<dyn Error>`: setup failures (`SessionError`,
//! `ExtensionError`) and run-time contract violations (`RunError`) must be
//! matchable by callers, since the smoke fixtures branch on them.

mod extension_error;
mod run_error;
mod session_error;
mod tensor_error;

pub use extension_error::ExtensionError;
pub use run_error::RunError;
pub use session_error::SessionError;
pub use tensor_error::TensorError;

/// Result type alias for session construction and model loading.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Result type alias for executing a session.
pub type RunResult<T> = std::result::Result<T, RunError>;

/// Result type alias for extension loading and operator registration.
pub type ExtensionResult<T> = std::result::Result<T, ExtensionError>;
