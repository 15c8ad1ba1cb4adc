//! Counters for the relay and listener registry

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-wide relay counters
///
/// Updated with relaxed atomics from handlers and the broadcast loop; read
/// through [`RelayMetrics::snapshot`].
#[derive(Debug)]
pub struct RelayMetrics {
    started_at: Instant,
    messages_published: AtomicU64,
    messages_fanned_out: AtomicU64,
    deliveries: AtomicU64,
    dropped_deliveries: AtomicU64,
    listeners_registered: AtomicU64,
    listeners_removed: AtomicU64,
    listeners_evicted: AtomicU64,
    listeners_reaped: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            messages_published: AtomicU64::new(0),
            messages_fanned_out: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            dropped_deliveries: AtomicU64::new(0),
            listeners_registered: AtomicU64::new(0),
            listeners_removed: AtomicU64::new(0),
            listeners_evicted: AtomicU64::new(0),
            listeners_reaped: AtomicU64::new(0),
        }
    }

    pub fn record_published(&self) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Undo `record_published` for a message the relay refused
    pub fn revert_published(&self) {
        self.messages_published.fetch_sub(1, Ordering::Relaxed);
    }

    /// One message went through the broadcast loop
    pub fn record_fan_out(&self, delivered: usize, dropped: usize) {
        self.messages_fanned_out.fetch_add(1, Ordering::Release);
        self.deliveries.fetch_add(delivered as u64, Ordering::Relaxed);
        self.dropped_deliveries
            .fetch_add(dropped as u64, Ordering::Relaxed);
    }

    pub fn record_registered(&self) {
        self.listeners_registered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_removed(&self) {
        self.listeners_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evicted(&self, count: usize) {
        self.listeners_evicted
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_reaped(&self, count: usize) {
        self.listeners_reaped
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Time since the counters were created
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        // fanned out first: a snapshot never shows it ahead of published
        let messages_fanned_out = self.messages_fanned_out.load(Ordering::Acquire);
        MetricsSnapshot {
            messages_published: self.messages_published.load(Ordering::Relaxed),
            messages_fanned_out,
            deliveries: self.deliveries.load(Ordering::Relaxed),
            dropped_deliveries: self.dropped_deliveries.load(Ordering::Relaxed),
            listeners_registered: self.listeners_registered.load(Ordering::Relaxed),
            listeners_removed: self.listeners_removed.load(Ordering::Relaxed),
            listeners_evicted: self.listeners_evicted.load(Ordering::Relaxed),
            listeners_reaped: self.listeners_reaped.load(Ordering::Relaxed),
            uptime: self.uptime(),
        }
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`RelayMetrics`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Messages accepted by the publish handler
    pub messages_published: u64,
    /// Messages processed by the broadcast loop
    pub messages_fanned_out: u64,
    /// Individual listener queue pushes that succeeded
    pub deliveries: u64,
    /// Pushes skipped because a queue was full or closed
    pub dropped_deliveries: u64,
    /// Listeners ever registered
    pub listeners_registered: u64,
    /// Listeners removed, for any reason
    pub listeners_removed: u64,
    /// Listeners evicted as slow consumers
    pub listeners_evicted: u64,
    /// Unattached listeners removed by the cleanup task
    pub listeners_reaped: u64,
    /// Time since start
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Listeners registered and not yet removed
    pub fn active_listeners(&self) -> u64 {
        self.listeners_registered
            .saturating_sub(self.listeners_removed)
    }

    /// Messages still waiting in the inbound queue
    pub fn pending_messages(&self) -> u64 {
        self.messages_published
            .saturating_sub(self.messages_fanned_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let snapshot = RelayMetrics::new().snapshot();
        assert_eq!(snapshot.messages_published, 0);
        assert_eq!(snapshot.deliveries, 0);
        assert_eq!(snapshot.active_listeners(), 0);
        assert_eq!(snapshot.pending_messages(), 0);
    }

    #[test]
    fn test_fan_out_accounting() {
        let metrics = RelayMetrics::new();
        metrics.record_published();
        metrics.record_published();
        metrics.record_fan_out(3, 1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.messages_fanned_out, 1);
        assert_eq!(snapshot.deliveries, 3);
        assert_eq!(snapshot.dropped_deliveries, 1);
        assert_eq!(snapshot.pending_messages(), 1);
    }

    #[test]
    fn test_listener_accounting() {
        let metrics = RelayMetrics::new();
        for _ in 0..3 {
            metrics.record_registered();
        }
        metrics.record_removed();
        metrics.record_evicted(1);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.active_listeners(), 2);
        assert_eq!(snapshot.listeners_evicted, 1);
    }
}
