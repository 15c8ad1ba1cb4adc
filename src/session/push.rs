//! Push channel abstraction
//!
//! The stream pump only needs "send one text frame" and "close". Keeping that
//! behind a trait lets the pump run against a WebSocket in production and an
//! in-memory recorder in tests.

use std::future::Future;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use thiserror::Error;

/// Error type for push channel writes
#[derive(Debug, Error)]
pub enum PushError {
    /// Peer already closed the connection
    #[error("push channel closed")]
    Closed,
    /// Transport-level failure
    #[error("push channel transport error: {0}")]
    Transport(#[from] axum::Error),
}

/// Server-to-client frame delivery for one connected peer
pub trait PushChannel: Send {
    /// Send one text frame
    fn push_text(&mut self, text: String) -> impl Future<Output = Result<(), PushError>> + Send;

    /// Close the channel
    fn shutdown(&mut self) -> impl Future<Output = Result<(), PushError>> + Send;
}

impl PushChannel for SplitSink<WebSocket, Message> {
    async fn push_text(&mut self, text: String) -> Result<(), PushError> {
        self.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), PushError> {
        SinkExt::close(self).await?;
        Ok(())
    }
}
