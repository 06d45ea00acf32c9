//! Route identifier type
//!
//! `RouteId` is a `Copy` handle for a configured route, assigned in
//! registration order.

use std::fmt;

/// Route identifier
///
/// Indexes the router's per-route channels and the table's route names.
///
/// ```
/// use civic_routing::RouteId;
///
/// let route = RouteId::new(0);
/// let copy = route;
/// assert_eq!(route, copy);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(u16);

impl RouteId {
    /// Maximum number of routes supported
    pub const MAX: u16 = u16::MAX;

    /// Create a route ID from a numeric index
    #[inline]
    #[must_use]
    pub const fn new(index: u16) -> Self {
        Self(index)
    }

    /// Numeric index
    #[inline]
    #[must_use]
    pub const fn index(self) -> u16 {
        self.0
    }

    /// Index as usize (for slice indexing)
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "route:{}", self.0)
    }
}

impl From<u16> for RouteId {
    #[inline]
    fn from(index: u16) -> Self {
        Self::new(index)
    }
}

impl From<RouteId> for usize {
    #[inline]
    fn from(id: RouteId) -> Self {
        id.0 as usize
    }
}
