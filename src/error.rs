//! Crate-level error types

use std::net::SocketAddr;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error (socket, stdin)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to bind the listening socket
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the server tried to bind
        addr: SocketAddr,
        /// Underlying socket error
        source: std::io::Error,
    },
}
