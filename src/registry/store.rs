//! Listener registry implementation
//!
//! The central registry that owns every browser session's queue and replicates
//! webhook messages onto them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::config::{RegistryConfig, SlowListenerPolicy};
use super::entry::{Delivery, IdGenerator, Listener, ListenerId, ListenerStream};
use super::error::RegistryError;
use super::message::WebhookMessage;
use crate::stats::RelayMetrics;

/// Result of replicating one message onto the registry snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutReport {
    /// Listeners that queued the message
    pub delivered: usize,
    /// Listeners that skipped it (full queue under `DropNewest`)
    pub dropped: usize,
    /// Listeners removed during this fan-out
    pub evicted: Vec<ListenerId>,
}

/// Central registry for all browser sessions
///
/// One mutex guards the map. It is held only for map access and non-blocking
/// queue pushes, never across an `.await`.
pub struct ListenerRegistry {
    /// Map of session id to listener entry
    listeners: Mutex<HashMap<ListenerId, Arc<Listener>>>,

    ids: IdGenerator,

    metrics: RelayMetrics,

    /// Configuration
    config: RegistryConfig,
}

impl ListenerRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            ids: IdGenerator::seeded_from_clock(),
            metrics: RelayMetrics::new(),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Relay counters
    pub fn metrics(&self) -> &RelayMetrics {
        &self.metrics
    }

    /// Register a new listener with an empty queue
    pub fn add_listener(&self) -> (ListenerId, Arc<Listener>) {
        let mut listeners = self.listeners.lock();

        let mut id = self.ids.next();
        while listeners.contains_key(&id) {
            id = self.ids.next();
        }

        let listener = Arc::new(Listener::new(id, self.config.listener_capacity));
        listeners.insert(id, Arc::clone(&listener));
        self.metrics.record_registered();

        tracing::info!(listener_id = %id, listeners = listeners.len(), "Listener added");

        (id, listener)
    }

    /// Look up a live listener
    pub fn get_listener(&self, id: ListenerId) -> Option<Arc<Listener>> {
        let listener = self.listeners.lock().get(&id).cloned();

        tracing::debug!(listener_id = %id, found = listener.is_some(), "Listener lookup");

        listener
    }

    /// Remove a listener
    ///
    /// Returns whether it was present. Removing an absent id is a no-op.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.listeners.lock().remove(&id).is_some();

        if removed {
            self.metrics.record_removed();
            tracing::info!(listener_id = %id, "Listener removed");
        }

        removed
    }

    /// Hand a listener's queue to one stream connection
    ///
    /// The returned stream removes the listener from the registry when dropped.
    pub fn attach(self: &Arc<Self>, id: ListenerId) -> Result<ListenerStream, RegistryError> {
        let listener = self
            .get_listener(id)
            .ok_or(RegistryError::ListenerNotFound(id))?;

        let rx = listener
            .take_receiver()
            .ok_or(RegistryError::AlreadyStreaming(id))?;

        tracing::info!(
            listener_id = %id,
            backlog = listener.queued(),
            "Listener attached to stream"
        );

        Ok(ListenerStream::new(id, rx, Arc::clone(self)))
    }

    /// Replicate a message onto every listener registered right now
    ///
    /// Listeners added after the lock is taken do not see this message. Never
    /// waits on a listener queue.
    pub fn fan_out(&self, message: &WebhookMessage) -> FanOutReport {
        let mut report = FanOutReport::default();
        let mut listeners = self.listeners.lock();

        for (id, listener) in listeners.iter() {
            match listener.try_deliver(message) {
                Delivery::Queued => {
                    tracing::trace!(listener_id = %id, "Forwarding message");
                    report.delivered += 1;
                }
                Delivery::Full => match self.config.slow_listener_policy {
                    SlowListenerPolicy::Disconnect => {
                        tracing::warn!(
                            listener_id = %id,
                            capacity = listener.capacity(),
                            "Listener queue full, disconnecting"
                        );
                        report.evicted.push(*id);
                    }
                    SlowListenerPolicy::DropNewest => {
                        tracing::warn!(listener_id = %id, "Listener queue full, dropping message");
                        report.dropped += 1;
                    }
                },
                Delivery::Closed => {
                    tracing::debug!(listener_id = %id, "Listener queue closed, removing");
                    report.evicted.push(*id);
                }
            }
        }

        for id in &report.evicted {
            listeners.remove(id);
            self.metrics.record_removed();
        }
        drop(listeners);

        self.metrics
            .record_fan_out(report.delivered, report.dropped + report.evicted.len());
        self.metrics.record_evicted(report.evicted.len());

        report
    }

    /// Run cleanup once
    ///
    /// Removes listeners that have never been attached to a stream and are
    /// older than `unclaimed_ttl`. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let ttl = self.config.unclaimed_ttl;
        let mut listeners = self.listeners.lock();

        let stale: Vec<ListenerId> = listeners
            .values()
            .filter(|l| !l.is_streaming() && now.duration_since(l.created_at()) > ttl)
            .map(|l| l.id())
            .collect();

        for id in &stale {
            listeners.remove(id);
            self.metrics.record_removed();
            tracing::info!(listener_id = %id, "Unclaimed listener removed by cleanup");
        }

        self.metrics.record_reaped(stale.len());
        stale.len()
    }

    /// Spawn background cleanup task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = registry.cleanup();
                if removed > 0 {
                    tracing::debug!(removed, remaining = registry.len(), "Cleanup pass");
                }
            }
        })
    }

    /// Remove every listener, closing all queues
    pub fn clear(&self) -> usize {
        let drained: Vec<_> = self.listeners.lock().drain().collect();

        for _ in &drained {
            self.metrics.record_removed();
        }
        if !drained.is_empty() {
            tracing::info!(count = drained.len(), "All listeners removed");
        }

        drained.len()
    }

    /// Number of live listeners
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Whether there are no live listeners
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_test::{assert_pending, assert_ready};

    use super::*;

    fn message(text: &'static str) -> WebhookMessage {
        WebhookMessage::new(text)
    }

    #[tokio::test]
    async fn test_add_get_remove() {
        let registry = ListenerRegistry::new();

        let (id, listener) = registry.add_listener();
        assert_eq!(listener.id(), id);
        assert_eq!(registry.len(), 1);
        assert!(registry.get_listener(id).is_some());

        assert!(registry.remove_listener(id));
        assert!(registry.get_listener(id).is_none());

        // idempotent
        assert!(!registry.remove_listener(id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_get_never_issued() {
        let registry = ListenerRegistry::new();
        let (id, _) = registry.add_listener();

        let other: ListenerId = (id.get() + 1000).to_string().parse().unwrap();
        assert!(registry.get_listener(other).is_none());
    }

    #[tokio::test]
    async fn test_every_listener_gets_every_message_in_order() {
        let registry = Arc::new(ListenerRegistry::new());

        let mut streams: Vec<_> = (0..3)
            .map(|_| {
                let (id, _) = registry.add_listener();
                registry.attach(id).unwrap()
            })
            .collect();

        for text in ["one", "two", "three", "four"] {
            let report = registry.fan_out(&message(text));
            assert_eq!(report.delivered, 3);
        }

        for stream in &mut streams {
            for expected in ["one", "two", "three", "four"] {
                let msg = stream.recv().await.unwrap();
                assert_eq!(msg.text(), expected);
            }
        }
    }

    #[tokio::test]
    async fn test_snapshot_semantics() {
        let registry = Arc::new(ListenerRegistry::new());

        let (early, _) = registry.add_listener();
        let (removed, _) = registry.add_listener();
        registry.remove_listener(removed);

        registry.fan_out(&message("first"));

        let (late, _) = registry.add_listener();
        registry.fan_out(&message("second"));

        let mut early = registry.attach(early).unwrap();
        let mut late = registry.attach(late).unwrap();

        assert_eq!(early.recv().await.unwrap().text(), "first");
        assert_eq!(early.recv().await.unwrap().text(), "second");
        // late joiner only sees what was published after it registered
        assert_eq!(late.recv().await.unwrap().text(), "second");
        assert!(registry.get_listener(removed).is_none());
    }

    #[tokio::test]
    async fn test_fan_out_without_listeners() {
        let registry = ListenerRegistry::new();

        let report = registry.fan_out(&message("nobody home"));
        assert_eq!(report, FanOutReport::default());
        assert_eq!(registry.metrics().snapshot().messages_fanned_out, 1);
    }

    #[tokio::test]
    async fn test_attach_twice() {
        let registry = Arc::new(ListenerRegistry::new());
        let (id, _) = registry.add_listener();

        let _stream = registry.attach(id).unwrap();
        assert_eq!(
            registry.attach(id).unwrap_err(),
            RegistryError::AlreadyStreaming(id)
        );
    }

    #[tokio::test]
    async fn test_attach_unknown() {
        let registry = Arc::new(ListenerRegistry::new());
        let (id, _) = registry.add_listener();
        registry.remove_listener(id);

        assert_eq!(
            registry.attach(id).unwrap_err(),
            RegistryError::ListenerNotFound(id)
        );
    }

    #[tokio::test]
    async fn test_dropping_stream_removes_listener() {
        let registry = Arc::new(ListenerRegistry::new());
        let (id, _) = registry.add_listener();

        let stream = registry.attach(id).unwrap();
        assert!(registry.get_listener(id).unwrap().is_streaming());

        drop(stream);
        assert!(registry.get_listener(id).is_none());
    }

    #[tokio::test]
    async fn test_recv_waits_for_message() {
        let registry = Arc::new(ListenerRegistry::new());
        let (id, _) = registry.add_listener();
        let mut stream = registry.attach(id).unwrap();

        {
            let mut recv = tokio_test::task::spawn(stream.recv());
            assert_pending!(recv.poll());

            registry.fan_out(&message("wake"));
            assert!(recv.is_woken());

            let msg = assert_ready!(recv.poll()).unwrap();
            assert_eq!(msg.text(), "wake");
        }

        assert_eq!(stream.id(), id);
    }

    #[tokio::test]
    async fn test_slow_listener_disconnected() {
        let config = RegistryConfig::default().listener_capacity(2);
        let registry = Arc::new(ListenerRegistry::with_config(config));

        let (slow, _) = registry.add_listener();
        let (fast, _) = registry.add_listener();
        let mut slow_stream = registry.attach(slow).unwrap();
        let mut fast_stream = registry.attach(fast).unwrap();

        registry.fan_out(&message("a"));
        registry.fan_out(&message("b"));
        fast_stream.recv().await.unwrap();
        fast_stream.recv().await.unwrap();

        let report = registry.fan_out(&message("c"));
        assert_eq!(report.evicted, vec![slow]);
        assert_eq!(report.delivered, 1);
        assert!(registry.get_listener(slow).is_none());
        assert!(registry.get_listener(fast).is_some());

        // buffered messages drain, then the queue reports closed
        assert_eq!(slow_stream.recv().await.unwrap().text(), "a");
        assert_eq!(slow_stream.recv().await.unwrap().text(), "b");
        assert!(slow_stream.recv().await.is_none());

        assert_eq!(fast_stream.recv().await.unwrap().text(), "c");
        assert_eq!(registry.metrics().snapshot().listeners_evicted, 1);
    }

    #[tokio::test]
    async fn test_slow_listener_drop_newest() {
        let config = RegistryConfig::default()
            .listener_capacity(1)
            .slow_listener_policy(SlowListenerPolicy::DropNewest);
        let registry = Arc::new(ListenerRegistry::with_config(config));

        let (id, _) = registry.add_listener();
        registry.fan_out(&message("kept"));

        let report = registry.fan_out(&message("skipped"));
        assert_eq!(report.dropped, 1);
        assert!(report.evicted.is_empty());

        let mut stream = registry.attach(id).unwrap();
        assert_eq!(stream.recv().await.unwrap().text(), "kept");

        registry.fan_out(&message("after"));
        assert_eq!(stream.recv().await.unwrap().text(), "after");
    }

    #[tokio::test]
    async fn test_cleanup_reaps_only_unclaimed() {
        let config = RegistryConfig::default().unclaimed_ttl(Duration::from_millis(20));
        let registry = Arc::new(ListenerRegistry::with_config(config));

        let (unclaimed, _) = registry.add_listener();
        let (claimed, _) = registry.add_listener();
        let _stream = registry.attach(claimed).unwrap();

        assert_eq!(registry.cleanup(), 0);

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(registry.cleanup(), 1);
        assert!(registry.get_listener(unclaimed).is_none());
        assert!(registry.get_listener(claimed).is_some());
    }

    #[tokio::test]
    async fn test_clear_closes_streams() {
        let registry = Arc::new(ListenerRegistry::new());
        let (id, _) = registry.add_listener();
        let mut stream = registry.attach(id).unwrap();
        registry.add_listener();

        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
        assert!(stream.recv().await.is_none());
    }
}
