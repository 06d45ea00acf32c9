//! Civic Protocol - Canonical message types
//!
//! This crate provides the types that flow from feed parsers, over the bus,
//! into the route persisters:
//! - `Value` - A scalar field value (string, integer or float)
//! - `Record` - A flat field → scalar mapping, the atomic unit of storage
//! - `Envelope` - Producer metadata plus an ordered list of records
//! - `Address` - Bus address an envelope is published on
//! - `Document` - The JSON object view routes operate on
//!
//! # Lifecycle
//!
//! Envelopes and records are created once per feed fetch and are immutable
//! after publication. Consumers that need to reshape a message work on their
//! own `Document` copy obtained from [`Envelope::to_document`].

mod address;
mod envelope;
mod record;
mod value;

pub use address::Address;
pub use envelope::{Envelope, timestamp_now};
pub use record::Record;
pub use value::Value;

/// JSON object view of a message
///
/// Field order is preserved, so a stored document serializes its fields in
/// the order they were inserted.
pub type Document = serde_json::Map<String, serde_json::Value>;
