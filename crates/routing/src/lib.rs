//! Civic - Routing
//!
//! Pre-compiled subscription table: which routes receive messages published
//! on a bus address.
//!
//! # Design
//!
//! Subscriptions are fixed when the configuration is loaded. The
//! `RoutingTable` maps each [`Address`] to the [`RouteId`]s subscribed to
//! it, so publishing is one hash lookup returning a slice. An address with
//! no subscribers routes nowhere; there is no default route.
//!
//! # Example
//!
//! ```
//! use civic_routing::{Address, RoutingTableBuilder};
//!
//! let mut builder = RoutingTableBuilder::new();
//! let positions = builder.add_route("vix_positions", "feedmaker.vix").unwrap();
//! let log = builder.add_route("vix_log", "feedmaker.vix").unwrap();
//! let table = builder.build();
//!
//! assert_eq!(table.route(&Address::new("feedmaker.vix")), &[positions, log]);
//! assert!(table.route(&Address::new("feedmaker.other")).is_empty());
//! ```

mod error;
mod route_id;
mod table;


pub use error::{Result, RoutingError};
pub use route_id::RouteId;
pub use table::{RoutingTable, RoutingTableBuilder};

// Re-export Address for convenience
pub use civic_protocol::Address;
