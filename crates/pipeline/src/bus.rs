//! Bus - a router wired to running filer tasks
//!
//! `Bus::start` subscribes each filer to its source address, gives it a
//! bounded channel, and spawns its `run` loop. `shutdown` closes every
//! channel and waits for the filers to finish their writes.

use civic_protocol::{Address, Envelope};
use civic_routing::RoutingTableBuilder;
use civic_sinks::{Filer, FilerSnapshot};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{PipelineError, Result};
use crate::filer_handle::FilerHandle;
use crate::router::Router;

/// Router plus the filer tasks it feeds
#[derive(Debug)]
pub struct Bus {
    router: Router,
    tasks: Vec<(String, JoinHandle<FilerSnapshot>)>,
}

impl Bus {
    /// Subscribe and spawn `filers`, each with a channel of `queue_size`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(filers: Vec<Filer>, queue_size: usize) -> Result<Self> {
        let mut builder = RoutingTableBuilder::new();
        let mut ids = Vec::with_capacity(filers.len());
        for filer in &filers {
            ids.push(builder.add_route(filer.name(), filer.source_address().clone())?);
        }

        let mut router = Router::new(builder.build());
        let mut tasks = Vec::with_capacity(filers.len());

        for (filer, id) in filers.into_iter().zip(ids) {
            let (tx, rx) = mpsc::channel(queue_size.max(1));
            let name = filer.name().to_string();
            router.register_filer(FilerHandle::new(id, name.clone(), tx));
            tasks.push((name, tokio::spawn(filer.run(rx))));
        }

        tracing::info!(
            routes = router.filer_count(),
            addresses = router.routing_table().address_count(),
            queue_size,
            "bus started"
        );

        Ok(Self { router, tasks })
    }

    #[inline]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// See [`Router::publish`]
    pub fn publish(&self, address: &Address, envelope: Envelope) -> usize {
        self.router.publish(address, envelope)
    }

    /// See [`Router::publish_blocking`]
    pub async fn publish_blocking(&self, address: &Address, envelope: Envelope) -> usize {
        self.router.publish_blocking(address, envelope).await
    }

    /// Close every filer channel and wait for outstanding writes
    ///
    /// Returns each route's final counters in registration order.
    pub async fn shutdown(self) -> Result<Vec<(String, FilerSnapshot)>> {
        let Self { router, tasks } = self;
        let routed = router.metrics().snapshot();
        drop(router);

        let mut snapshots = Vec::with_capacity(tasks.len());
        for (name, task) in tasks {
            let snapshot = task
                .await
                .map_err(|e| PipelineError::filer_task(name.clone(), e))?;
            snapshots.push((name, snapshot));
        }

        tracing::info!(
            envelopes_received = routed.envelopes_received,
            envelopes_routed = routed.envelopes_routed,
            envelopes_dropped = routed.envelopes_dropped,
            backpressure_events = routed.backpressure_events,
            "bus stopped"
        );
        Ok(snapshots)
    }
}
