//! Endpoint server error types.

use std::net::SocketAddr;

/// Errors raised by the endpoint listener itself.
///
/// Request-level failures never surface here; they become HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    /// The listener could not bind.
    #[error("failed to bind endpoint to {addr}: {source}")]
    Bind {
        /// The requested address.
        addr: SocketAddr,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Any other listener I/O failure.
    #[error("endpoint I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for endpoint server operations.
pub type EndpointResult<T> = Result<T, EndpointError>;
