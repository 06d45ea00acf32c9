//! Router - publish/subscribe fan-out
//!
//! The `Router` delivers each published envelope to every filer subscribed
//! to its address, using the pre-compiled `RoutingTable`.

use std::sync::Arc;

use civic_protocol::{Address, Envelope};
use civic_routing::{RouteId, RoutingTable};
use tokio::sync::mpsc::error::TrySendError;

use crate::filer_handle::FilerHandle;
use crate::metrics::{BackpressureTracker, RouterMetrics};

/// Bus router
///
/// # Design
///
/// - One `Arc<Envelope>` per publish, shared by every subscriber
/// - Filer handles stored in a `Vec<Option<_>>` indexed by `RouteId`
/// - `publish` never waits: a full channel counts as backpressure and the
///   envelope is not delivered to that filer
/// - `publish_blocking` waits for channel capacity
///
/// # Example
///
/// ```ignore
/// let mut router = Router::new(table);
/// let (tx, rx) = mpsc::channel(1000);
/// router.register_filer(FilerHandle::new(route_id, "vix_latest", tx));
/// tokio::spawn(filer.run(rx));
///
/// router.publish(&Address::new("feedmaker.vix"), envelope);
/// ```
pub struct Router {
    routing_table: RoutingTable,

    /// Indexed by `RouteId`
    filers: Vec<Option<FilerHandle>>,

    metrics: Arc<RouterMetrics>,

    backpressure_tracker: BackpressureTracker,
}

impl Router {
    /// Create a router with room for every route in the table
    pub fn new(routing_table: RoutingTable) -> Self {
        let route_count = routing_table.route_count();
        let mut filers = Vec::with_capacity(route_count);
        filers.resize_with(route_count, || None);

        Self {
            routing_table,
            filers,
            metrics: Arc::new(RouterMetrics::new()),
            backpressure_tracker: BackpressureTracker::new(),
        }
    }

    /// Shared counters that stay readable after the router is dropped
    pub fn metrics_handle(&self) -> Arc<RouterMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Register a filer's channel under its route id
    pub fn register_filer(&mut self, handle: FilerHandle) {
        let index = handle.id().as_usize();
        if index >= self.filers.len() {
            self.filers.resize_with(index + 1, || None);
        }

        tracing::debug!(
            route_id = %handle.id(),
            route = %handle.name(),
            "registered filer with router"
        );

        self.filers[index] = Some(handle);
    }

    /// Number of registered filers
    pub fn filer_count(&self) -> usize {
        self.filers.iter().filter(|h| h.is_some()).count()
    }

    #[inline]
    pub fn metrics(&self) -> &RouterMetrics {
        &self.metrics
    }

    #[inline]
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    /// Subscribed routes for `address`, or `None` after counting a drop
    fn subscribers(&self, address: &Address, envelope: &Envelope) -> Option<&[RouteId]> {
        self.metrics.record_received(envelope.record_count() as u64);

        let route_ids = self.routing_table.route(address);
        if route_ids.is_empty() {
            tracing::trace!(address = %address, "no routes subscribed, dropping envelope");
            self.metrics.record_dropped();
            return None;
        }
        Some(route_ids)
    }

    fn handle(&self, id: RouteId) -> Option<&FilerHandle> {
        match self.filers.get(id.as_usize()).and_then(Option::as_ref) {
            Some(handle) if !handle.is_closed() => Some(handle),
            Some(handle) => {
                tracing::warn!(route_id = %id, route = %handle.name(), "filer channel closed, skipping");
                self.metrics.record_send_failed();
                None
            }
            None => {
                tracing::warn!(route_id = %id, "filer not registered, skipping");
                self.metrics.record_send_failed();
                None
            }
        }
    }

    fn finish(&self, address: &Address, delivered: usize, targets: usize) {
        if delivered > 0 {
            self.metrics.record_routed();
        } else {
            self.metrics.record_dropped();
            tracing::warn!(address = %address, targets, "envelope dropped: all filer sends failed");
        }
    }

    /// Publish without waiting
    ///
    /// Returns the number of filers the envelope was delivered to.
    pub fn publish(&self, address: &Address, envelope: Envelope) -> usize {
        let Some(route_ids) = self.subscribers(address, &envelope) else {
            return 0;
        };

        let record_count = envelope.record_count() as u64;
        let envelope = Arc::new(envelope);
        let mut delivered = 0;

        for &id in route_ids {
            let Some(handle) = self.handle(id) else {
                continue;
            };

            match handle.try_send(Arc::clone(&envelope)) {
                Ok(()) => {
                    self.metrics.record_send_success();
                    delivered += 1;
                }
                Err(TrySendError::Full(_)) => {
                    self.metrics.record_backpressure();
                    self.metrics.record_send_failed();
                    self.backpressure_tracker.record_drop(record_count);

                    tracing::debug!(
                        route_id = %id,
                        route = %handle.name(),
                        "filer channel full (backpressure)"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    self.metrics.record_send_failed();
                    tracing::warn!(route_id = %id, route = %handle.name(), "filer channel closed, skipping");
                }
            }
        }

        self.finish(address, delivered, route_ids.len());
        delivered
    }

    /// Publish, waiting for channel capacity
    ///
    /// Returns the number of filers the envelope was delivered to.
    pub async fn publish_blocking(&self, address: &Address, envelope: Envelope) -> usize {
        let Some(route_ids) = self.subscribers(address, &envelope) else {
            return 0;
        };

        let envelope = Arc::new(envelope);
        let mut delivered = 0;

        for &id in route_ids {
            let Some(handle) = self.handle(id) else {
                continue;
            };

            match handle.send(Arc::clone(&envelope)).await {
                Ok(()) => {
                    self.metrics.record_send_success();
                    delivered += 1;
                }
                Err(_) => self.metrics.record_send_failed(),
            }
        }

        self.finish(address, delivered, route_ids.len());
        delivered
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("filer_count", &self.filer_count())
            .field("route_count", &self.routing_table.route_count())
            .finish()
    }
}
