//! Source error types
//!
//! Parsing never fails; only building a parser from configuration does.

use civic_config::ConfigError;
use thiserror::Error;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Result type for parser construction
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors raised while building a feed
#[derive(Debug, Error)]
pub enum SourceError {
    /// Feed configuration failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No parser for this feed type
    #[error("feed '{feed}' has unknown feed_type '{feed_type}'")]
    UnknownFeedType {
        /// Feed name
        feed: String,
        /// Configured type
        feed_type: String,
    },
}

impl SourceError {
    /// Create an UnknownFeedType error
    pub fn unknown_feed_type(feed: impl Into<String>, feed_type: impl Into<String>) -> Self {
        Self::UnknownFeedType {
            feed: feed.into(),
            feed_type: feed_type.into(),
        }
    }
}
