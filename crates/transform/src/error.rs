//! Transform error types
//!
//! Only compilation of configuration can fail. Evaluation of predicates,
//! paths and templates against message data always yields a value.

use thiserror::Error;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Result type for transform compilation
pub type TransformResult<T> = std::result::Result<T, TransformError>;

/// Errors raised while compiling route configuration
#[derive(Debug, Error)]
pub enum TransformError {
    /// Predicate kind not in `=`, `inside`, `in`
    #[error("unknown filter test '{0}'")]
    UnknownTest(String),

    /// Path expression that cannot be compiled
    #[error("invalid path '{path}': {message}")]
    InvalidPath {
        /// The path as configured
        path: String,
        /// What is wrong with it
        message: String,
    },

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TransformError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }
}
