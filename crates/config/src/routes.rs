//! Route configuration
//!
//! One `[routes.<name>]` table per persisted stream:
//!
//! ```toml
//! [routes.vix_positions]
//! source_address = "feedmaker.vix"
//! flatten = "request_data"
//! store_path = "/media/tfc/vix/data_bin_json/{{ts|yyyy}}/{{ts|MM}}/{{ts|dd}}"
//! store_name = "{{ts}}_{{VehicleRef}}.json"
//! store_mode = "write"
//! source_filter = { test = "inside", points = [
//!     { lat = 52.0, lng = 0.0 }, { lat = 52.0, lng = 0.2 },
//!     { lat = 52.4, lng = 0.2 }, { lat = 52.4, lng = 0.0 },
//! ] }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// How a route writes its target file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreMode {
    /// Rotate the existing file to `.prev` and replace it
    #[default]
    Overwrite,
    /// Append one line
    Append,
}

impl StoreMode {
    /// Configuration spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overwrite => "write",
            Self::Append => "append",
        }
    }
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "write" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            other => Err(format!("'{other}' (expected 'write' or 'append')")),
        }
    }
}

/// Polygon vertex
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
pub struct PointConfig {
    /// Latitude (y)
    pub lat: f64,
    /// Longitude (x)
    pub lng: f64,
}

/// `source_filter` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceFilterConfig {
    /// Predicate kind: `=`, `inside` or `in`
    #[serde(alias = "compare")]
    pub test: String,

    /// Field tested by `=` and `in`
    #[serde(alias = "field")]
    pub key: Option<String>,

    /// Value for `=`
    pub value: Option<String>,

    /// Values for `in`
    pub values: Vec<String>,

    /// Latitude field for `inside`
    pub lat_key: String,

    /// Longitude field for `inside`
    pub lng_key: String,

    /// Polygon for `inside`
    pub points: Vec<PointConfig>,
}

impl Default for SourceFilterConfig {
    fn default() -> Self {
        Self {
            test: "=".into(),
            key: None,
            value: None,
            values: Vec::new(),
            lat_key: "acp_lat".into(),
            lng_key: "acp_lng".into(),
            points: Vec::new(),
        }
    }
}

/// A `[routes.<name>]` table
///
/// Fields are kept as written; [`validate`](Self::validate) and the route
/// compiler decide whether the route can run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RouteConfig {
    /// Bus address to subscribe to
    pub source_address: Option<String>,

    /// Admission predicate
    pub source_filter: Option<SourceFilterConfig>,

    /// List field to explode into one record per element
    pub flatten: Option<String>,

    /// Path expression locating the record list
    pub records_data: Option<String>,

    /// Envelope fields copied into each extracted record
    pub merge_base: Vec<String>,

    /// Directory template
    pub store_path: Option<String>,

    /// File name template
    pub store_name: Option<String>,

    /// `write` (default) or `append`
    pub store_mode: Option<String>,
}

impl RouteConfig {
    /// Parsed store mode
    pub fn store_mode(&self, name: &str) -> Result<StoreMode> {
        match self.store_mode.as_deref() {
            None => Ok(StoreMode::default()),
            Some(s) => s
                .parse()
                .map_err(|msg: String| ConfigError::invalid_value("route", name, "store_mode", msg)),
        }
    }

    /// Check the route's own fields are consistent
    ///
    /// Path expressions and predicates are checked when the route is compiled.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.source_address.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::missing_field("route", name, "source_address"));
        }
        if self.store_path.is_none() {
            return Err(ConfigError::missing_field("route", name, "store_path"));
        }
        if self.store_name.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::missing_field("route", name, "store_name"));
        }
        if self.flatten.is_some() && self.records_data.is_some() {
            return Err(ConfigError::conflict("route", name, "flatten", "records_data"));
        }
        self.store_mode(name)?;
        Ok(())
    }
}
