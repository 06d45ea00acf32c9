//! Civic - Pipeline
//!
//! The in-process bus connecting feed parsers to route filers.
//!
//! # Architecture
//!
//! ```text
//! [Feed]                   [Router]                        [Filers]
//!   vix ───publish(addr)──→ RoutingTable ──Arc<Envelope>──┬──→ vix_latest
//!                           addr → [RouteId]              └──→ vix_log
//! ```
//!
//! # Key Design
//!
//! - **Channel-based**: one bounded `tokio::sync::mpsc` channel per filer
//! - **Arc fan-out**: an envelope is allocated once and shared by all subscribers
//! - **Backpressure**: `publish` uses `try_send`; `publish_blocking` waits
//! - **Pre-compiled routing**: subscriptions are fixed at startup
//!
//! # Example
//!
//! ```ignore
//! let filers = vec![Filer::from_route("vix_latest", route)?];
//! let bus = Bus::start(filers, 1000)?;
//!
//! bus.publish(&Address::new("feedmaker.vix"), envelope);
//!
//! for (route, snapshot) in bus.shutdown().await? {
//!     println!("{route}: {} stored", snapshot.records_stored);
//! }
//! ```

mod bus;
mod error;
mod filer_handle;
mod metrics;
mod router;

pub use bus::Bus;
pub use error::{PipelineError, Result};
pub use filer_handle::FilerHandle;
pub use metrics::{MetricsSnapshot, RouterMetrics};
pub use router::Router;

pub use civic_protocol::{Address, Envelope};
pub use civic_routing::{RouteId, RoutingTable, RoutingTableBuilder};

/// Default filer channel capacity
pub const DEFAULT_CHANNEL_SIZE: usize = 1000;

#[cfg(test)]
mod router_test;
