//! Journey-times feed parser (`feed_bt_journey_times`)
//!
//! The feed is a JSON array of link measurements:
//!
//! ```json
//! [
//!   {
//!     "id": "CAMBRIDGE_JTMS|9800WBETRSU3",
//!     "time": "2020-01-26 09:28:22",
//!     "period": 674,
//!     "travelTime": 127,
//!     "normalTravelTime": 129.39
//!   }
//! ]
//! ```
//!
//! Each element becomes one record. Members that are not strings or
//! numbers are dropped.

use civic_protocol::{Document, Record};
use serde_json::Value;

use crate::FeedParser;

#[cfg(test)]
#[path = "journey_times_test.rs"]
mod tests;

/// Parser for journey-time arrays
#[derive(Debug, Clone, Copy, Default)]
pub struct JourneyTimesParser;

impl JourneyTimesParser {
    /// Create a parser
    pub const fn new() -> Self {
        Self
    }

    fn element_record(index: usize, element: &Document) -> Record {
        let (record, dropped) = Record::from_document(element);
        if !dropped.is_empty() {
            tracing::debug!(index, dropped = ?dropped, "dropped non-scalar journey time fields");
        }
        record
    }
}

impl FeedParser for JourneyTimesParser {
    fn feed_type(&self) -> &'static str {
        civic_config::FEED_BT_JOURNEY_TIMES
    }

    fn parse(&self, raw: &[u8]) -> Vec<Record> {
        let elements = match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Array(elements)) => elements,
            Ok(other) => {
                tracing::warn!(kind = json_kind(&other), "journey times feed is not an array");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(error = %e, "journey times feed is not valid JSON");
                return Vec::new();
            }
        };

        let records: Vec<Record> = elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| match element {
                Value::Object(object) => Some(Self::element_record(index, object)),
                other => {
                    tracing::warn!(index, kind = json_kind(other), "skipping non-object journey time");
                    None
                }
            })
            .collect();

        tracing::debug!(records = records.len(), "parsed journey times feed");
        records
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
