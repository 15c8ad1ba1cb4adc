//! Messages relayed to listeners

use std::borrow::Cow;
use std::time::SystemTime;

use bytes::Bytes;

/// A webhook payload waiting to be fanned out
///
/// Cheap to clone: every listener queue holds a reference-counted view of the
/// same `Bytes` allocation.
#[derive(Debug, Clone)]
pub struct WebhookMessage {
    /// Raw request body
    pub body: Bytes,
    /// When the publish handler accepted the request
    pub received_at: SystemTime,
}

impl WebhookMessage {
    /// Wrap a request body received now
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            received_at: SystemTime::now(),
        }
    }

    /// Body as text for a WebSocket text frame
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Body length in bytes
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
