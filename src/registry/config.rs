//! Registry configuration

use std::time::Duration;

/// What the broadcast loop does when a listener's queue is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlowListenerPolicy {
    /// Evict the listener; its stream drains what is buffered, then closes
    #[default]
    Disconnect,
    /// Keep the listener but skip this message for it
    DropNewest,
}

/// Registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Capacity of each listener's private queue
    pub listener_capacity: usize,

    /// Capacity of the shared inbound queue feeding the broadcast loop
    pub inbound_capacity: usize,

    /// Behaviour when a listener queue is full
    pub slow_listener_policy: SlowListenerPolicy,

    /// How long a listener may stay registered without a stream attached
    pub unclaimed_ttl: Duration,

    /// How often the cleanup task runs
    pub cleanup_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            listener_capacity: 1_000,
            inbound_capacity: 1_000,
            slow_listener_policy: SlowListenerPolicy::Disconnect,
            unclaimed_ttl: Duration::from_secs(10 * 60),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl RegistryConfig {
    /// Set the per-listener queue capacity (minimum 1)
    pub fn listener_capacity(mut self, capacity: usize) -> Self {
        self.listener_capacity = capacity.max(1);
        self
    }

    /// Set the inbound queue capacity (minimum 1)
    pub fn inbound_capacity(mut self, capacity: usize) -> Self {
        self.inbound_capacity = capacity.max(1);
        self
    }

    /// Set the slow listener policy
    pub fn slow_listener_policy(mut self, policy: SlowListenerPolicy) -> Self {
        self.slow_listener_policy = policy;
        self
    }

    /// Set the unclaimed listener TTL
    pub fn unclaimed_ttl(mut self, ttl: Duration) -> Self {
        self.unclaimed_ttl = ttl;
        self
    }

    /// Set the cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}
