//! Civic - Sinks
//!
//! Route persisters that take envelopes off the bus and store them on disk.
//!
//! # Architecture
//!
//! Each configured route becomes one [`Filer`]. The filer receives
//! `Arc<Envelope>` over a tokio channel, applies the route's predicate and
//! reshaping, expands its storage templates, and hands each resulting record
//! to the [`FileStore`] write/rotate primitive.
//!
//! ```text
//! [Router] --Arc<Envelope>--> [Filer channel] --> [Filer] --> [FileStore] --> <store_path>/<store_name>
//!                                                   |                            (+ <store_name>.prev)
//!                                          predicate, reshape,
//!                                          template expansion
//! ```
//!
//! # Store modes
//!
//! | Mode | Config | Effect |
//! |------|--------|--------|
//! | Overwrite | `write` | previous file kept as `.prev`, new content replaces it |
//! | Append | `append` | record appended as one line |
//!
//! # Example
//!
//! ```no_run
//! use civic_config::StoreMode;
//! use civic_sinks::{Filer, FilerConfig};
//! use civic_protocol::Envelope;
//!
//! let config = FilerConfig::new("vix_latest", "feeds.vix", "/data/{{module_id}}", "latest.json")
//!     .with_store_mode(StoreMode::Overwrite);
//! let filer = Filer::new(config);
//!
//! let stored = filer.store_blocking(&Envelope::new("feedmaker", "vix"));
//! assert_eq!(stored, 1);
//! ```

mod error;

/// Per-route persister
pub mod filer;

/// Write/rotate primitive
pub mod store;

/// Rate-limited logging
pub mod util;

pub use error::{Result, StoreError};
pub use filer::{Filer, FilerConfig, FilerMetrics, FilerSnapshot, Reshape};
pub use store::{FileStore, PREV_FILE_SUFFIX, WriteRequest};
