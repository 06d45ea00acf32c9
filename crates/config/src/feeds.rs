//! Feed configuration
//!
//! One `[feeds.<name>]` table per incoming feed:
//!
//! ```toml
//! [feeds.vix]
//! feed_type = "feed_xml_flat"
//! address = "feedmaker.vix"
//! module_name = "feedmaker"
//! module_id = "vix"
//! tag_record = "VehicleActivity"
//! tag_map = [
//!     { original_tag = "RecordedAtTime", new_tag = "acp_ts", format = "datetime_iso_to_int_utc_seconds" },
//!     { original_tag = "Latitude", new_tag = "acp_lat", format = "float" },
//!     { original_tag = "Longitude", new_tag = "acp_lng", format = "float" },
//! ]
//! ```

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Flat XML feed type
pub const FEED_XML_FLAT: &str = "feed_xml_flat";

/// Journey-times JSON feed type
pub const FEED_BT_JOURNEY_TIMES: &str = "feed_bt_journey_times";

/// Feed types that have a parser
pub const KNOWN_FEED_TYPES: &[&str] = &[FEED_XML_FLAT, FEED_BT_JOURNEY_TIMES];

/// Check whether a feed type has a parser
pub fn is_known_feed_type(feed_type: &str) -> bool {
    KNOWN_FEED_TYPES.contains(&feed_type)
}

/// Conversion applied to a mapped tag value
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TagFormat {
    /// Signed 64-bit integer
    Int,
    /// 64-bit float
    Float,
    /// RFC 3339 timestamp re-rendered in UTC
    DatetimeIsoToUtc,
    /// RFC 3339 timestamp as integer Unix seconds
    DatetimeIsoToIntUtcSeconds,
    /// Copy the text (default, also used for unrecognized names)
    #[default]
    #[serde(other)]
    String,
}

/// One `tag_map` entry
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TagMapConfig {
    /// Source tag name
    pub original_tag: String,
    /// Derived field name
    pub new_tag: String,
    /// Conversion
    #[serde(default)]
    pub format: TagFormat,
}

/// A `[feeds.<name>]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Parser selector
    pub feed_type: String,

    /// Bus address the feed publishes on
    pub address: String,

    /// `module_name` of published envelopes
    pub module_name: String,

    /// `module_id` of published envelopes
    pub module_id: String,

    /// Tag delimiting one record (XML feeds)
    pub tag_record: Option<String>,

    /// Derived fields
    pub tag_map: Vec<TagMapConfig>,
}

impl FeedConfig {
    /// Check the feed can be built
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.feed_type.is_empty() {
            return Err(ConfigError::missing_field("feed", name, "feed_type"));
        }
        if !is_known_feed_type(&self.feed_type) {
            return Err(ConfigError::invalid_value(
                "feed",
                name,
                "feed_type",
                format!("'{}' (expected one of: {})", self.feed_type, KNOWN_FEED_TYPES.join(", ")),
            ));
        }
        if self.address.is_empty() {
            return Err(ConfigError::missing_field("feed", name, "address"));
        }
        if self.feed_type == FEED_XML_FLAT && self.tag_record.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::missing_field("feed", name, "tag_record"));
        }
        Ok(())
    }
}
