//! Error types for locator-directory.

/// Main error type for directory operations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] locator_transport::TransportError),

    /// Could not bind the registration listener.
    #[error("cannot bind registration listener on {addr}: {source}")]
    Bind {
        /// The address that failed to bind.
        addr: std::net::SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for directory operations.
pub type Result<T> = std::result::Result<T, DirectoryError>;
