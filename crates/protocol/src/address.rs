//! Bus address type
//!
//! `Address` names the topic an envelope is published on, e.g.
//! `"acp.feedmaker.vix"`. Routes subscribe to exactly one address.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bus address for publish/subscribe routing
///
/// # Example
///
/// ```
/// use civic_protocol::Address;
///
/// let address = Address::new("acp.feedmaker.vix");
/// assert_eq!(address.as_str(), "acp.feedmaker.vix");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create a new address
    #[inline]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get the address as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
