//! Civic Configuration
//!
//! TOML configuration for feeds and routes.
//!
//! # Parsing
//!
//! ```
//! use civic_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[routes.latest]\nsource_address = \"feedmaker.vix\"").unwrap();
//! assert!(config.routes.contains_key("latest"));
//! ```
//!
//! # Example Config
//!
//! ```toml
//! [log]
//! level = "info"
//!
//! [feeds.vix]
//! feed_type = "feed_xml_flat"
//! address = "feedmaker.vix"
//! tag_record = "VehicleActivity"
//!
//! [routes.vix_latest]
//! source_address = "feedmaker.vix"
//! store_path = "/media/tfc/vix"
//! store_name = "latest.json"
//! ```
//!
//! See `configs/civic.toml` for a complete file.

mod error;
mod feeds;
mod global;
mod logging;
mod routes;
mod validation;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use serde::de::DeserializeOwned;

pub use error::{ConfigError, Result};
pub use feeds::{
    FEED_BT_JOURNEY_TIMES, FEED_XML_FLAT, FeedConfig, KNOWN_FEED_TYPES, TagFormat, TagMapConfig,
    is_known_feed_type,
};
pub use global::GlobalConfig;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use routes::{PointConfig, RouteConfig, SourceFilterConfig, StoreMode};
pub use validation::{usable_feeds, usable_routes};

/// Main configuration structure
///
/// All sections are optional. A feed or route table that does not
/// deserialize is kept out of `feeds` / `routes` and recorded with its
/// error instead, so the rest of the file stays usable.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Global settings
    pub global: GlobalConfig,

    /// Feeds by name
    pub feeds: BTreeMap<String, FeedConfig>,

    /// Routes by name
    pub routes: BTreeMap<String, RouteConfig>,

    /// Feed tables that could not be read, with the reason
    pub malformed_feeds: BTreeMap<String, String>,

    /// Route tables that could not be read, with the reason
    pub malformed_routes: BTreeMap<String, String>,
}

/// File layout before feeds and routes are typed
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    log: LogConfig,
    global: GlobalConfig,
    feeds: BTreeMap<String, toml::Value>,
    routes: BTreeMap<String, toml::Value>,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or contains invalid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    fn parse(s: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(s).map_err(ConfigError::ParseError)?;
        let (feeds, malformed_feeds) = type_entries(raw.feeds);
        let (routes, malformed_routes) = type_entries(raw.routes);

        let config = Config {
            log: raw.log,
            global: raw.global,
            feeds,
            routes,
            malformed_feeds,
            malformed_routes,
        };
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Look up a feed by name
    pub fn feed(&self, name: &str) -> Result<&FeedConfig> {
        if let Some(message) = self.malformed_feeds.get(name) {
            return Err(ConfigError::malformed("feed", name, message.as_str()));
        }
        self.feeds
            .get(name)
            .ok_or_else(|| ConfigError::not_found("feed", name))
    }

    /// Look up a route by name
    pub fn route(&self, name: &str) -> Result<&RouteConfig> {
        if let Some(message) = self.malformed_routes.get(name) {
            return Err(ConfigError::malformed("route", name, message.as_str()));
        }
        self.routes
            .get(name)
            .ok_or_else(|| ConfigError::not_found("route", name))
    }
}

/// Deserialize each table on its own; failures are returned by name
fn type_entries<T: DeserializeOwned>(
    entries: BTreeMap<String, toml::Value>,
) -> (BTreeMap<String, T>, BTreeMap<String, String>) {
    let mut typed = BTreeMap::new();
    let mut malformed = BTreeMap::new();

    for (name, value) in entries {
        match value.try_into::<T>() {
            Ok(entry) => {
                typed.insert(name, entry);
            }
            Err(e) => {
                malformed.insert(name, e.message().to_string());
            }
        }
    }

    (typed, malformed)
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
