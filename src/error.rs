//! Error types for diagram-sync.

use thiserror::Error;

/// Main error type for diagram-sync operations.
#[derive(Error, Debug)]
pub enum DiagramSyncError {
    /// Binding the listener failed for a reason other than the port being taken.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    /// Every port in the negotiation range was already in use.
    #[error("no available port in range {start}-{end}")]
    NoAvailablePort { start: u16, end: u16 },

    /// The HTTP server task ended abnormally.
    #[error("server error: {0}")]
    Server(String),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type for diagram-sync operations.
pub type Result<T> = std::result::Result<T, DiagramSyncError>;
