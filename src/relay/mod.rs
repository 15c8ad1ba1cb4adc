//! Broadcast loop
//!
//! Publish handlers push onto one shared inbound queue; a single background
//! task drains it and fans each message out to the registry. One worker means
//! every listener sees messages in publish order.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::registry::{ListenerRegistry, WebhookMessage};

/// Error type for publishing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// The broadcast loop has shut down
    #[error("relay closed")]
    Closed,
}

/// Inbound queue plus the broadcast worker that drains it
pub struct Relay {
    registry: Arc<ListenerRegistry>,
    inbound: mpsc::Sender<WebhookMessage>,
    /// Taken by the first `start` call
    pending: Mutex<Option<mpsc::Receiver<WebhookMessage>>>,
}

impl Relay {
    /// Create a relay feeding `registry`, sized from its configuration
    pub fn new(registry: Arc<ListenerRegistry>) -> Self {
        let capacity = registry.config().inbound_capacity;
        let (inbound, rx) = mpsc::channel(capacity);

        Self {
            registry,
            inbound,
            pending: Mutex::new(Some(rx)),
        }
    }

    /// Registry this relay fans out to
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// Enqueue a message for broadcast
    ///
    /// Waits only while the inbound queue is full. Does not wait for delivery.
    pub async fn publish(&self, message: WebhookMessage) -> Result<(), RelayError> {
        let len = message.len();
        let metrics = self.registry.metrics();

        // recorded before the loop can receive it
        metrics.record_published();
        if self.inbound.send(message).await.is_err() {
            metrics.revert_published();
            return Err(RelayError::Closed);
        }

        tracing::debug!(bytes = len, "Message queued for broadcast");
        Ok(())
    }

    /// Start the broadcast worker
    ///
    /// Idempotent: only the first call spawns the loop and returns its handle,
    /// later calls return `None`.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        let rx = self.pending.lock().take()?;
        let registry = Arc::clone(&self.registry);

        tracing::info!("Broadcast loop starting");
        Some(tokio::spawn(broadcast_loop(registry, rx)))
    }

    /// Whether the worker has been started
    pub fn is_started(&self) -> bool {
        self.pending.lock().is_none()
    }

    /// Free slots in the inbound queue
    pub fn inbound_capacity(&self) -> usize {
        self.inbound.capacity()
    }
}

async fn broadcast_loop(registry: Arc<ListenerRegistry>, mut rx: mpsc::Receiver<WebhookMessage>) {
    while let Some(message) = rx.recv().await {
        let report = registry.fan_out(&message);

        tracing::debug!(
            bytes = message.len(),
            delivered = report.delivered,
            dropped = report.dropped,
            evicted = report.evicted.len(),
            "Message broadcast"
        );
    }

    tracing::info!("Broadcast loop stopped");
}
