//! Civic - Sources
//!
//! Feed parsers that turn a raw feed payload into flat [`Record`]s, and the
//! [`Feed`] wrapper that packs them into a published [`Envelope`].
//!
//! # Available Parsers
//!
//! - **`feed_xml_flat`** - tag-flattening XML scanner (e.g. SIRI-VM bus positions)
//! - **`feed_bt_journey_times`** - JSON array of journey-time measurements
//!
//! # Design Principles
//!
//! - **Degrade, don't fail**: malformed input produces fewer records and a
//!   warning, never an error
//! - **Pure**: parsers hold only their compiled configuration and may be
//!   shared across threads
//!
//! # Example
//!
//! ```
//! use civic_config::FeedConfig;
//! use civic_sources::Feed;
//!
//! let config = FeedConfig {
//!     feed_type: "feed_xml_flat".into(),
//!     address: "feedmaker.vix".into(),
//!     tag_record: Some("VehicleActivity".into()),
//!     ..Default::default()
//! };
//! let feed = Feed::new("vix", &config).unwrap();
//!
//! let envelope = feed.ingest(b"<VehicleActivity><VehicleRef>SCNH-35224</VehicleRef></VehicleActivity>");
//! assert_eq!(envelope.request_data[0].get_str("VehicleRef"), Some("SCNH-35224"));
//! ```

mod error;
mod feed;
pub mod journey_times;
pub mod xml_flat;

pub use civic_protocol::{Envelope, Record};
pub use error::{Result, SourceError};
pub use feed::{Feed, FeedParser, create_parser};
pub use journey_times::JourneyTimesParser;
pub use xml_flat::{TagMapping, XmlFlatParser};
