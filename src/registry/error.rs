//! Registry error types

use thiserror::Error;

use super::entry::ListenerId;

/// Error type for registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No live listener with this id
    #[error("listener not found: {0}")]
    ListenerNotFound(ListenerId),
    /// Another connection is already streaming this listener's queue
    #[error("listener already streaming: {0}")]
    AlreadyStreaming(ListenerId),
}

/// A session cookie value that is not a valid listener id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid listener id: {0:?}")]
pub struct ParseListenerIdError(pub String);
