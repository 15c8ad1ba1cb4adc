//! Crate-level error type

use std::net::SocketAddr;

use thiserror::Error;

/// Errors surfaced by the server lifecycle
#[derive(Debug, Error)]
pub enum Error {
    /// The listen address could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Any other I/O failure while serving
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
