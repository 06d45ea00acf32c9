//! Filer - the per-route persister
//!
//! One `Filer` is built for each configured route. For every message it
//! receives it:
//!
//! 1. drops the message if the route predicate rejects it
//! 2. reshapes it into zero or more documents ([`Reshape`])
//! 3. expands `store_path` / `store_name` against each document
//! 4. hands each document to the [`FileStore`] primitive
//!
//! Steps 1-3 are pure. Step 4 runs either on the blocking pool
//! ([`Filer::store`]) or on the calling thread ([`Filer::store_blocking`]).
//! In append mode the pool writes of one filer run one at a time, in the
//! order they were requested. Write failures are counted and logged, never
//! returned to the producer.
//!
//! # Example
//!
//! ```ignore
//! let route = config.route("vix_latest")?;
//! let filer = Filer::from_route("vix_latest", route)?;
//!
//! let (tx, rx) = mpsc::channel(1000);
//! let task = tokio::spawn(filer.run(rx));
//! // publish Arc<Envelope> on tx ...
//! drop(tx);
//! let snapshot = task.await?;
//! ```

mod metrics;
mod reshape;

use std::path::PathBuf;
use std::sync::Arc;

use civic_config::{RouteConfig, StoreMode};
use civic_protocol::{Address, Document, Envelope};
use civic_transform::{PathExpression, Predicate, expand};
use serde_json::Value;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{Result, StoreError};
use crate::store::{FileStore, WriteRequest};
use crate::util::RateLimitedLogger;

pub use metrics::{FilerMetrics, FilerSnapshot};
pub use reshape::Reshape;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

#[cfg(test)]
#[path = "reshape_test.rs"]
mod reshape_tests;

/// Compiled route
#[derive(Debug, Clone)]
pub struct FilerConfig {
    /// Route name
    pub name: String,

    /// Bus address the route listens on
    pub source_address: Address,

    /// Admission test, if any
    pub predicate: Option<Predicate>,

    /// Record shaping
    pub reshape: Reshape,

    /// Directory template
    pub store_path: String,

    /// File name template
    pub store_name: String,

    pub store_mode: StoreMode,
}

impl FilerConfig {
    /// Validate and compile a `[routes.<name>]` table
    pub fn from_route(name: &str, route: &RouteConfig) -> Result<Self> {
        route.validate(name)?;

        let predicate = route
            .source_filter
            .as_ref()
            .map(Predicate::try_from)
            .transpose()
            .map_err(|e| StoreError::compile(name, e))?;

        let reshape = if let Some(ref field) = route.flatten {
            Reshape::Flatten {
                field: field.clone(),
            }
        } else if let Some(ref path) = route.records_data {
            Reshape::Extract {
                path: PathExpression::compile(path).map_err(|e| StoreError::compile(name, e))?,
                merge_base: route.merge_base.clone(),
            }
        } else {
            Reshape::Whole
        };

        Ok(Self {
            name: name.to_string(),
            source_address: Address::new(route.source_address.clone().unwrap_or_default()),
            predicate,
            reshape,
            store_path: route.store_path.clone().unwrap_or_default(),
            store_name: route.store_name.clone().unwrap_or_default(),
            store_mode: route.store_mode(name)?,
        })
    }

    /// Create an unfiltered whole-message route
    pub fn new(
        name: impl Into<String>,
        source_address: impl Into<Address>,
        store_path: impl Into<String>,
        store_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source_address: source_address.into(),
            predicate: None,
            reshape: Reshape::Whole,
            store_path: store_path.into(),
            store_name: store_name.into(),
            store_mode: StoreMode::Overwrite,
        }
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    #[must_use]
    pub fn with_reshape(mut self, reshape: Reshape) -> Self {
        self.reshape = reshape;
        self
    }

    #[must_use]
    pub fn with_store_mode(mut self, mode: StoreMode) -> Self {
        self.store_mode = mode;
        self
    }
}

/// Per-route persister
#[derive(Debug)]
pub struct Filer {
    config: FilerConfig,
    store: FileStore,
    metrics: Arc<FilerMetrics>,
    error_logger: Arc<RateLimitedLogger>,
    /// Completion signal of the most recently scheduled append
    append_tail: Mutex<Option<oneshot::Receiver<()>>>,
}

impl Filer {
    /// Create a filer for a compiled route
    pub fn new(config: FilerConfig) -> Self {
        let store = FileStore::new(config.store_mode);
        let error_logger = Arc::new(RateLimitedLogger::with_default_interval(config.name.clone()));
        Self {
            config,
            store,
            metrics: Arc::new(FilerMetrics::new()),
            error_logger,
            append_tail: Mutex::new(None),
        }
    }

    /// Compile a route table and create its filer
    pub fn from_route(name: &str, route: &RouteConfig) -> Result<Self> {
        FilerConfig::from_route(name, route).map(Self::new)
    }

    /// Route name
    #[inline]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Address the route listens on
    #[inline]
    pub fn source_address(&self) -> &Address {
        &self.config.source_address
    }

    #[inline]
    pub fn config(&self) -> &FilerConfig {
        &self.config
    }

    #[inline]
    pub fn metrics(&self) -> &FilerMetrics {
        &self.metrics
    }

    /// Shared counters that stay readable after `run()` consumes the filer
    pub fn metrics_handle(&self) -> Arc<FilerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Write requests for one message
    ///
    /// Empty when the predicate rejects the message or reshaping yields
    /// nothing.
    pub fn prepare(&self, message: &Document) -> Vec<WriteRequest> {
        self.metrics.record_received();

        if let Some(ref predicate) = self.config.predicate
            && !predicate.evaluate(message)
        {
            self.metrics.record_filtered();
            tracing::trace!(route = %self.config.name, test = predicate.kind(), "message filtered");
            return Vec::new();
        }

        self.config
            .reshape
            .apply(message)
            .into_iter()
            .map(|doc| {
                let dir = expand(&self.config.store_path, &doc);
                let name = expand(&self.config.store_name, &doc);
                WriteRequest::new(PathBuf::from(dir), name, Value::Object(doc).to_string())
            })
            .collect()
    }

    /// Store an envelope without waiting for the writes
    ///
    /// Must be called from within a tokio runtime. The returned handles
    /// resolve once each write has finished and been accounted for.
    pub fn store(&self, envelope: &Envelope) -> Vec<JoinHandle<()>> {
        self.store_document(&envelope.to_document())
    }

    /// Store a message document without waiting for the writes
    pub fn store_document(&self, message: &Document) -> Vec<JoinHandle<()>> {
        self.prepare(message)
            .into_iter()
            .map(|request| self.spawn_write(request))
            .collect()
    }

    /// Schedule one write; an append waits for the append scheduled before it
    fn spawn_write(&self, request: WriteRequest) -> JoinHandle<()> {
        let store = self.store;
        let metrics = Arc::clone(&self.metrics);
        let error_logger = Arc::clone(&self.error_logger);

        let (previous, done) = match store.mode() {
            StoreMode::Append => {
                let (tx, rx) = oneshot::channel();
                (self.append_tail.lock().replace(rx), Some(tx))
            }
            StoreMode::Overwrite => (None, None),
        };

        tokio::spawn(async move {
            // A dropped sender also releases the wait
            if let Some(previous) = previous {
                let _ = previous.await;
            }
            let result = store
                .persist(request)
                .await
                .unwrap_or_else(|e| Err(StoreError::join(e)));
            account(&metrics, &error_logger, &result);
            if let Some(done) = done {
                let _ = done.send(());
            }
        })
    }

    /// Store an envelope, returning once every write has finished
    ///
    /// Returns the number of records written.
    pub fn store_blocking(&self, envelope: &Envelope) -> usize {
        self.store_document_blocking(&envelope.to_document())
    }

    /// Store a message document, returning once every write has finished
    pub fn store_document_blocking(&self, message: &Document) -> usize {
        self.prepare(message)
            .iter()
            .map(|request| self.store.persist_blocking(request))
            .filter(|result| account(&self.metrics, &self.error_logger, result))
            .count()
    }

    /// Store every envelope received until the channel closes
    ///
    /// Waits for outstanding writes before returning the final counters.
    pub async fn run(self, mut receiver: mpsc::Receiver<Arc<Envelope>>) -> FilerSnapshot {
        tracing::info!(
            route = %self.config.name,
            source_address = %self.config.source_address,
            reshape = self.config.reshape.kind(),
            store_mode = %self.config.store_mode,
            "filer starting"
        );

        let mut pending: Vec<JoinHandle<()>> = Vec::new();
        while let Some(envelope) = receiver.recv().await {
            pending.retain(|handle| !handle.is_finished());
            pending.extend(self.store(&envelope));
        }

        for handle in pending {
            if let Err(e) = handle.await {
                self.error_logger.error("write task failed", &e);
            }
        }

        let snapshot = self.metrics.snapshot();
        tracing::info!(
            route = %self.config.name,
            messages_received = snapshot.messages_received,
            messages_filtered = snapshot.messages_filtered,
            records_stored = snapshot.records_stored,
            write_errors = snapshot.write_errors,
            "filer shutting down"
        );
        snapshot
    }
}

/// Count and log the outcome of one write; true if it succeeded
fn account(metrics: &FilerMetrics, error_logger: &RateLimitedLogger, result: &Result<PathBuf>) -> bool {
    match result {
        Ok(path) => {
            metrics.record_stored();
            tracing::debug!(route = %error_logger.label(), path = %path.display(), "record stored");
            true
        }
        Err(e) => {
            metrics.record_error();
            error_logger.error("record write failed", e);
            false
        }
    }
}
