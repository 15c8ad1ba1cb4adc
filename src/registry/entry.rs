//! Listener entry types
//!
//! This module defines the per-session state stored in the registry and the
//! handle a stream connection uses to drain it.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::error::ParseListenerIdError;
use super::message::WebhookMessage;
use super::store::ListenerRegistry;

/// Session identifier carried in the `idx` cookie
///
/// Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ListenerId {
    type Err = ParseListenerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().parse::<u64>() {
            Ok(0) | Err(_) => Err(ParseListenerIdError(s.to_string())),
            Ok(n) => Ok(Self(n)),
        }
    }
}

/// Monotonic id source
///
/// Seeded from the wall clock so ids from a previous process run are unlikely
/// to match a live listener, then advanced atomically so concurrent
/// registrations can never collide.
#[derive(Debug)]
pub(super) struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    pub(super) fn seeded_from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1);
        Self::starting_at(nanos)
    }

    pub(super) fn starting_at(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed.max(1)),
        }
    }

    pub(super) fn next(&self) -> ListenerId {
        loop {
            let n = self.next.fetch_add(1, Ordering::Relaxed);
            if n != 0 {
                return ListenerId(n);
            }
        }
    }
}

/// Outcome of pushing one message into a listener queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Message queued
    Queued,
    /// Queue at capacity
    Full,
    /// Receiving half is gone
    Closed,
}

/// Entry for a single browser session in the registry
pub struct Listener {
    id: ListenerId,

    /// Sending half, written only by the broadcast loop
    tx: mpsc::Sender<WebhookMessage>,

    /// Receiving half until a stream connection attaches
    rx: Mutex<Option<mpsc::Receiver<WebhookMessage>>>,

    /// When the listener was registered
    created_at: Instant,
}

impl Listener {
    pub(super) fn new(id: ListenerId, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);

        Self {
            id,
            tx,
            rx: Mutex::new(Some(rx)),
            created_at: Instant::now(),
        }
    }

    /// Session id
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// When the listener was registered
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Whether a stream connection currently owns the queue
    pub fn is_streaming(&self) -> bool {
        self.rx.lock().is_none()
    }

    /// Messages waiting in the queue
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Queue capacity
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }

    /// Push without waiting
    pub(super) fn try_deliver(&self, message: &WebhookMessage) -> Delivery {
        match self.tx.try_send(message.clone()) {
            Ok(()) => Delivery::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => Delivery::Full,
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    pub(super) fn take_receiver(&self) -> Option<mpsc::Receiver<WebhookMessage>> {
        self.rx.lock().take()
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("queued", &self.queued())
            .field("streaming", &self.is_streaming())
            .finish()
    }
}

/// A listener's queue attached to one stream connection
///
/// Dropping the stream removes the listener from the registry, whatever ended
/// the connection.
pub struct ListenerStream {
    id: ListenerId,
    rx: mpsc::Receiver<WebhookMessage>,
    registry: Arc<ListenerRegistry>,
}

impl ListenerStream {
    pub(super) fn new(
        id: ListenerId,
        rx: mpsc::Receiver<WebhookMessage>,
        registry: Arc<ListenerRegistry>,
    ) -> Self {
        Self { id, rx, registry }
    }

    /// Session id
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Wait for the next message
    ///
    /// Returns `None` once the listener has been removed from the registry and
    /// everything already queued has been received.
    pub async fn recv(&mut self) -> Option<WebhookMessage> {
        self.rx.recv().await
    }
}

impl Drop for ListenerStream {
    fn drop(&mut self) {
        self.rx.close();
        self.registry.remove_listener(self.id);
    }
}

impl fmt::Debug for ListenerStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerStream").field("id", &self.id).finish()
    }
}
