use crate::traits::ConnectionState;

/// Failures of a message transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport not open (state: {state})")]
    NotOpen { state: ConnectionState },

    /// Handshake with the controller endpoint failed.
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    /// The outbound pump is gone; the connection was dropped underneath us.
    #[error("transport shut down")]
    Shutdown,

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
