//! CLI subcommands

pub mod ingest;
pub mod replay;

use std::path::Path;

use anyhow::{Context, Result};
use civic_config::{Config, usable_feeds};
use civic_sinks::Filer;

/// Default configuration path
pub const DEFAULT_CONFIG: &str = "configs/civic.toml";

/// Load and parse a configuration file
pub fn load_config(path: &Path) -> Result<Config> {
    Config::from_file(path).with_context(|| format!("failed to load config {}", path.display()))
}

/// Log feeds that fail their own checks; the others stay usable
pub fn report_config(config: &Config) {
    let (feeds, errors) = usable_feeds(config);
    for e in &errors {
        tracing::warn!(error = %e, "feed unusable");
    }
    tracing::debug!(feeds = feeds.len(), routes = config.routes.len(), "config loaded");
}

/// Filers for every route that compiles
///
/// A broken route is logged and left out; the others still run.
pub fn build_filers(config: &Config) -> Vec<Filer> {
    for (name, message) in &config.malformed_routes {
        tracing::error!(route = %name, error = %message, "route disabled: malformed table");
    }

    config
        .routes
        .iter()
        .filter_map(|(name, route)| match Filer::from_route(name, route) {
            Ok(filer) => Some(filer),
            Err(e) => {
                tracing::error!(route = %name, error = %e, "route disabled");
                None
            }
        })
        .collect()
}
