//! Flat XML feed parser (`feed_xml_flat`)
//!
//! Turns repeating XML elements into flat records. Every element inside a
//! record that directly wraps text becomes a field named after its tag;
//! nesting is ignored:
//!
//! ```text
//! <VehicleActivity>                            {
//!   <RecordedAtTime>2020-01-27T09:14:08Z</..>    "RecordedAtTime": "2020-01-27T09:14:08Z",
//!   <MonitoredVehicleJourney>                    "VehicleRef": "SCNH-35224",
//!     <VehicleRef>SCNH-35224</VehicleRef>        "Latitude": "52.2",
//!     <VehicleLocation>                          "acp_lat": 52.2
//!       <Latitude>52.2</Latitude>              }
//! ...
//! ```
//!
//! The scanner is a cursor over the page text, not a conforming XML parser:
//!
//! - a record whose closing tag is missing ends the page, with a warning
//! - a self-closing element (`<Foo/>`) ends the current record; fields seen
//!   so far are kept
//! - attributes are ignored (`<Foo id="1">` is tag `Foo`)
//! - values are taken verbatim; entities are not decoded
//! - a repeated tag inside one record overwrites the earlier value

mod mapping;

pub use mapping::TagMapping;

use std::collections::HashMap;

use civic_config::FeedConfig;
use civic_protocol::Record;

use crate::FeedParser;
use crate::error::{Result, SourceError};

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

/// Tag-flattening parser for one record tag
#[derive(Debug, Clone)]
pub struct XmlFlatParser {
    record_open: String,
    record_close: String,
    tag_record: String,
    mappings: HashMap<String, TagMapping>,
}

impl XmlFlatParser {
    /// Create a parser for records delimited by `<tag_record>`
    pub fn new(tag_record: impl Into<String>) -> Self {
        let tag_record = tag_record.into();
        Self {
            record_open: format!("<{tag_record}>"),
            record_close: format!("</{tag_record}>"),
            tag_record,
            mappings: HashMap::new(),
        }
    }

    /// Add a derived field rule
    ///
    /// A later mapping for the same source tag replaces an earlier one.
    #[must_use]
    pub fn with_mapping(mut self, mapping: TagMapping) -> Self {
        self.mappings.insert(mapping.source_field.clone(), mapping);
        self
    }

    /// Record tag this parser splits on
    pub fn tag_record(&self) -> &str {
        &self.tag_record
    }

    /// Build from a `[feeds.<name>]` table
    pub fn from_config(name: &str, config: &FeedConfig) -> Result<Self> {
        let tag_record = config
            .tag_record
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SourceError::from(civic_config::ConfigError::missing_field(
                    "feed",
                    name,
                    "tag_record",
                ))
            })?;

        let parser = config
            .tag_map
            .iter()
            .map(TagMapping::from)
            .fold(Self::new(tag_record), Self::with_mapping);

        tracing::debug!(
            feed = name,
            tag_record,
            mappings = parser.mappings.len(),
            "xml flat parser configured"
        );
        Ok(parser)
    }

    /// Scan `page` for records
    pub fn parse_str(&self, page: &str) -> Vec<Record> {
        let mut records = Vec::new();
        let mut cursor = 0;

        while cursor < page.len() {
            let Some(start) = find_from(page, &self.record_open, cursor) else {
                break;
            };
            let Some(end) = find_from(page, &self.record_close, start) else {
                tracing::warn!(
                    tag_record = %self.tag_record,
                    offset = start,
                    "incomplete record at end of feed"
                );
                break;
            };

            records.push(self.scan_record(page, start, end));
            cursor = end;
        }

        tracing::debug!(
            tag_record = %self.tag_record,
            records = records.len(),
            "parsed xml flat feed"
        );
        records
    }

    /// Collect the fields of the record spanning `start..end`
    fn scan_record(&self, page: &str, start: usize, end: usize) -> Record {
        let bytes = page.as_bytes();
        let mut record = Record::new();
        let mut current_tag = "";
        let mut cursor = start;

        while cursor < end {
            let Some(open) = find_byte_from(page, b'<', cursor).filter(|&i| i < end) else {
                break;
            };
            let Some(close) = find_byte_from(page, b'>', open) else {
                tracing::warn!(
                    tag_record = %self.tag_record,
                    offset = open,
                    "unterminated tag in record"
                );
                break;
            };

            if bytes[close - 1] == b'/' {
                tracing::debug!(
                    tag_record = %self.tag_record,
                    element = &page[open..=close],
                    "self-closed element ends record"
                );
                break;
            }

            let name_end = find_byte_from(page, b' ', open)
                .filter(|&space| space < close)
                .unwrap_or(close);
            if name_end >= end {
                break;
            }

            let tag = &page[open + 1..name_end];
            if tag.strip_prefix('/') == Some(current_tag) {
                let text = &page[cursor + 1..open];
                self.store(&mut record, current_tag, text);
            }

            current_tag = tag;
            cursor = close;
        }

        record
    }

    fn store(&self, record: &mut Record, tag: &str, text: &str) {
        record.insert(tag, text);

        if let Some(mapping) = self.mappings.get(tag) {
            match mapping.convert(text) {
                Some(value) => {
                    tracing::trace!(tag, field = %mapping.output_field, %value, "mapped tag");
                    record.insert(mapping.output_field.clone(), value);
                }
                None => {
                    tracing::trace!(tag, text, format = ?mapping.format, "tag value did not convert");
                }
            }
        }
    }
}

impl FeedParser for XmlFlatParser {
    fn feed_type(&self) -> &'static str {
        civic_config::FEED_XML_FLAT
    }

    fn parse(&self, raw: &[u8]) -> Vec<Record> {
        self.parse_str(&String::from_utf8_lossy(raw))
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack.get(from..)?.find(needle).map(|i| i + from)
}

fn find_byte_from(haystack: &str, needle: u8, from: usize) -> Option<usize> {
    haystack
        .as_bytes()
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|i| i + from)
}
