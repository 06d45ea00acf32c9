//! Feed parser trait, factory and envelope packing

use chrono::Utc;
use civic_config::{FEED_BT_JOURNEY_TIMES, FEED_XML_FLAT, FeedConfig};
use civic_protocol::{Address, Envelope, Record};

use crate::error::{Result, SourceError};
use crate::{JourneyTimesParser, XmlFlatParser};

/// Converts one raw feed payload into records
///
/// Implementations never fail: malformed input yields fewer records.
pub trait FeedParser: Send + Sync + std::fmt::Debug {
    /// Feed type name, as configured
    fn feed_type(&self) -> &'static str;

    /// Parse a payload
    fn parse(&self, raw: &[u8]) -> Vec<Record>;
}

/// Build the parser for a configured feed
///
/// # Errors
///
/// Returns an error if the feed fails validation or its type has no parser.
pub fn create_parser(name: &str, config: &FeedConfig) -> Result<Box<dyn FeedParser>> {
    config.validate(name)?;

    match config.feed_type.as_str() {
        FEED_XML_FLAT => Ok(Box::new(XmlFlatParser::from_config(name, config)?)),
        FEED_BT_JOURNEY_TIMES => Ok(Box::new(JourneyTimesParser::new())),
        other => Err(SourceError::unknown_feed_type(name, other)),
    }
}

/// A configured feed: parser plus envelope header
#[derive(Debug)]
pub struct Feed {
    name: String,
    address: Address,
    module_name: String,
    module_id: String,
    parser: Box<dyn FeedParser>,
}

impl Feed {
    /// Build a feed from its `[feeds.<name>]` table
    pub fn new(name: &str, config: &FeedConfig) -> Result<Self> {
        let parser = create_parser(name, config)?;

        Ok(Self {
            name: name.to_string(),
            address: Address::new(&config.address),
            module_name: config.module_name.clone(),
            module_id: config.module_id.clone(),
            parser,
        })
    }

    /// Feed name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address the feed publishes on
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Parser in use
    pub fn parser(&self) -> &dyn FeedParser {
        self.parser.as_ref()
    }

    /// Parse a payload and pack the records into an envelope
    ///
    /// The envelope also carries `ts` (Unix seconds) and `feed_id`.
    pub fn ingest(&self, raw: &[u8]) -> Envelope {
        let records = self.parser.parse(raw);

        tracing::debug!(
            feed = %self.name,
            feed_type = self.parser.feed_type(),
            bytes = raw.len(),
            records = records.len(),
            "ingested feed payload"
        );

        Envelope::new(&self.module_name, &self.module_id)
            .with_records(records)
            .with_field("ts", Utc::now().timestamp())
            .with_field("feed_id", self.name.as_str())
    }
}
