//! Routing error types

use thiserror::Error;

/// Result type for routing operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors that can occur during routing table compilation
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Two routes registered under one name
    #[error("duplicate route '{name}'")]
    DuplicateRoute {
        /// Route name
        name: String,
    },

    /// Route subscribed to an empty address
    #[error("route '{name}' has an empty source address")]
    EmptyAddress {
        /// Route name
        name: String,
    },

    /// More routes than `RouteId` can index
    #[error("too many routes (max {max})")]
    TooManyRoutes {
        /// Route limit
        max: usize,
    },
}

impl RoutingError {
    /// Create a DuplicateRoute error
    #[inline]
    pub fn duplicate_route(name: impl Into<String>) -> Self {
        Self::DuplicateRoute { name: name.into() }
    }

    /// Create an EmptyAddress error
    #[inline]
    pub fn empty_address(name: impl Into<String>) -> Self {
        Self::EmptyAddress { name: name.into() }
    }
}
