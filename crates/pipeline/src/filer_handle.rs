//! Filer handle
//!
//! `FilerHandle` pairs a route id with the sending half of that route's
//! channel, so the router can deliver envelopes without knowing the filer.

use std::sync::Arc;

use civic_protocol::Envelope;
use civic_routing::RouteId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Sending side of one filer's channel
///
/// ```ignore
/// let (tx, rx) = mpsc::channel(1000);
/// router.register_filer(FilerHandle::new(route_id, "vix_latest", tx));
/// tokio::spawn(filer.run(rx));
/// ```
pub struct FilerHandle {
    id: RouteId,

    /// Route name for logs
    name: String,

    sender: mpsc::Sender<Arc<Envelope>>,
}

impl FilerHandle {
    #[inline]
    pub fn new(id: RouteId, name: impl Into<String>, sender: mpsc::Sender<Arc<Envelope>>) -> Self {
        Self {
            id,
            name: name.into(),
            sender,
        }
    }

    #[inline]
    pub fn id(&self) -> RouteId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Send without waiting
    ///
    /// The error tells a full channel from a closed one and gives the
    /// envelope back.
    #[inline]
    pub fn try_send(&self, envelope: Arc<Envelope>) -> Result<(), TrySendError<Arc<Envelope>>> {
        self.sender.try_send(envelope)
    }

    /// Send, waiting for capacity
    ///
    /// Gives the envelope back if the channel is closed.
    #[inline]
    pub async fn send(&self, envelope: Arc<Envelope>) -> Result<(), Arc<Envelope>> {
        self.sender.send(envelope).await.map_err(|e| e.0)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Free slots in the channel
    #[inline]
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }
}

impl std::fmt::Debug for FilerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilerHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
