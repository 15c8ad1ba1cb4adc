//! Per-connection stream pump
//!
//! Moves messages from one listener queue onto its push channel until the
//! connection ends, then closes the channel and releases the listener.

use std::future::Future;

use crate::registry::ListenerStream;

use super::push::{PushChannel, PushError};

/// Why a stream ended
#[derive(Debug)]
pub enum StreamEnd {
    /// Listener was removed from the registry (eviction or shutdown)
    QueueClosed,
    /// Peer closed the connection
    Disconnected,
    /// A frame could not be written
    PushFailed(PushError),
}

/// Pump messages until the queue closes, the peer goes away, or a push fails
///
/// `disconnected` resolves when the peer closes its side. On return the
/// channel has been shut down and the listener removed from the registry.
pub async fn run_stream<C, D>(
    mut stream: ListenerStream,
    channel: &mut C,
    disconnected: D,
) -> StreamEnd
where
    C: PushChannel,
    D: Future<Output = ()>,
{
    let id = stream.id();
    let mut sent: u64 = 0;
    tokio::pin!(disconnected);

    let end = loop {
        tokio::select! {
            message = stream.recv() => {
                let Some(message) = message else {
                    break StreamEnd::QueueClosed;
                };
                if let Err(e) = channel.push_text(message.text().into_owned()).await {
                    tracing::error!(listener_id = %id, error = %e, "Failed to push message");
                    break StreamEnd::PushFailed(e);
                }
                sent += 1;
            }
            _ = &mut disconnected => break StreamEnd::Disconnected,
        }
    };

    if let Err(e) = channel.shutdown().await {
        tracing::debug!(listener_id = %id, error = %e, "Push channel close failed");
    }
    drop(stream);

    tracing::info!(listener_id = %id, sent, end = ?end, "Stream ended");
    end
}
