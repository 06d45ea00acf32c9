//! Pipeline error types

use thiserror::Error;

use civic_routing::RoutingError;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Subscription table could not be built
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// A filer task panicked or was cancelled
    #[error("filer '{route}' task failed: {message}")]
    FilerTask {
        /// Route name
        route: String,
        message: String,
    },
}

impl PipelineError {
    /// Create a filer task error
    pub fn filer_task(route: impl Into<String>, err: tokio::task::JoinError) -> Self {
        Self::FilerTask {
            route: route.into(),
            message: err.to_string(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err: PipelineError = RoutingError::duplicate_route("vix_latest").into();
        assert!(err.to_string().contains("vix_latest"));
    }
}
