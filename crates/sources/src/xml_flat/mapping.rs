//! Tag mappings - derived fields computed from tag values

use chrono::{DateTime, SecondsFormat, Utc};
use civic_config::{TagFormat, TagMapConfig};
use civic_protocol::Value;

#[cfg(test)]
#[path = "mapping_test.rs"]
mod tests;

/// Rename-and-convert rule for one source tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMapping {
    /// Tag whose value is converted
    pub source_field: String,
    /// Name of the derived field
    pub output_field: String,
    /// Conversion applied to the text
    pub format: TagFormat,
}

impl TagMapping {
    /// Create a mapping
    pub fn new(
        source_field: impl Into<String>,
        output_field: impl Into<String>,
        format: TagFormat,
    ) -> Self {
        Self {
            source_field: source_field.into(),
            output_field: output_field.into(),
            format,
        }
    }

    /// Convert tag text into the derived value
    ///
    /// Returns `None` when the text does not fit the format.
    pub fn convert(&self, text: &str) -> Option<Value> {
        match self.format {
            TagFormat::String => Some(Value::Str(text.to_string())),
            TagFormat::Int => text.parse::<i64>().ok().map(Value::Int),
            TagFormat::Float => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::Float),
            TagFormat::DatetimeIsoToUtc => parse_iso(text)
                .map(|dt| Value::Str(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
            TagFormat::DatetimeIsoToIntUtcSeconds => {
                parse_iso(text).map(|dt| Value::Int(dt.timestamp()))
            }
        }
    }
}

impl From<&TagMapConfig> for TagMapping {
    fn from(config: &TagMapConfig) -> Self {
        Self::new(&config.original_tag, &config.new_tag, config.format)
    }
}

/// `2017-09-29T09:45:38+01:00` → UTC instant
fn parse_iso(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
