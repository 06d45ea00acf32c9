//! Sink error types
//!
//! Filesystem failures are returned by the write primitive and counted by the
//! filer; they never reach the producer. Configuration failures disable a
//! single route at startup.

use std::io;
use std::path::{Path, PathBuf};

use civic_config::ConfigError;
use civic_transform::TransformError;
use thiserror::Error;

/// Errors raised while compiling a route or persisting a record
#[derive(Debug, Error)]
pub enum StoreError {
    /// Target directory could not be created
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Open or write failed
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Blocking write task panicked or was cancelled
    #[error("write task failed: {0}")]
    Join(String),

    /// Route configuration invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Route predicate or path expression invalid
    #[error("route {route}: {source}")]
    Compile {
        route: String,
        #[source]
        source: TransformError,
    },
}

impl StoreError {
    /// Create a directory creation error
    pub fn create_dir(path: &Path, source: io::Error) -> Self {
        Self::CreateDir {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a write error
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a join error
    pub fn join(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }

    /// Create a compile error for a route
    pub fn compile(route: impl Into<String>, source: TransformError) -> Self {
        Self::Compile {
            route: route.into(),
            source,
        }
    }

    /// True for errors raised while touching the filesystem
    pub fn is_io(&self) -> bool {
        matches!(self, Self::CreateDir { .. } | Self::Io { .. } | Self::Join(_))
    }
}

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, StoreError>;
