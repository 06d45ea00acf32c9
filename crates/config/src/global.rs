//! Global configuration settings

use serde::Deserialize;

/// Settings shared by every component
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Capacity of each route's bus channel
    /// Default: 1000
    pub queue_size: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self { queue_size: 1000 }
    }
}
