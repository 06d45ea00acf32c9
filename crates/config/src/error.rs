//! Configuration error types

use std::io;
use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Lookup of a feed or route that is not configured
    #[error("no {component} named '{name}' in config")]
    NotFound {
        /// Component type ("feed" or "route")
        component: &'static str,
        /// Requested name
        name: String,
    },

    /// Validation error - required field missing
    #[error("{component} '{name}' is missing required field '{field}'")]
    MissingField {
        /// Component type (e.g., "route", "feed")
        component: &'static str,
        /// Name of the component
        name: String,
        /// Missing field name
        field: &'static str,
    },

    /// Validation error - invalid value
    #[error("{component} '{name}' has invalid {field}: {message}")]
    InvalidValue {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Field name
        field: &'static str,
        /// Error message
        message: String,
    },

    /// Feed or route table whose fields have the wrong type
    #[error("{component} '{name}' is malformed: {message}")]
    Malformed {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// Deserializer message
        message: String,
    },

    /// Validation error - two options that cannot be combined
    #[error("{component} '{name}' sets both '{first}' and '{second}'")]
    Conflict {
        /// Component type
        component: &'static str,
        /// Name of the component
        name: String,
        /// First field
        first: &'static str,
        /// Second field
        second: &'static str,
    },
}

impl ConfigError {
    /// Create a NotFound error
    pub fn not_found(component: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            component,
            name: name.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
    ) -> Self {
        Self::MissingField {
            component,
            name: name.into(),
            field,
        }
    }

    /// Create an InvalidValue error
    pub fn invalid_value(
        component: &'static str,
        name: impl Into<String>,
        field: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            component,
            name: name.into(),
            field,
            message: message.into(),
        }
    }

    /// Create a Malformed error
    pub fn malformed(
        component: &'static str,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Malformed {
            component,
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a Conflict error
    pub fn conflict(
        component: &'static str,
        name: impl Into<String>,
        first: &'static str,
        second: &'static str,
    ) -> Self {
        Self::Conflict {
            component,
            name: name.into(),
            first,
            second,
        }
    }
}
