use knitlink_transport::ConnectionState;

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A send was attempted while the connection is not open. Nothing was queued.
    #[error("transport unavailable (state: {state})")]
    TransportUnavailable { state: ConnectionState },

    /// The transport failed while the session was running.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    #[error("transport error: {0}")]
    Transport(#[from] knitlink_transport::TransportError),

    #[error("frame error: {0}")]
    Frame(#[from] knitlink_frame::FrameError),

    #[error("control error: {0}")]
    Control(#[from] knitlink_control::ControlError),

    #[error("machine message error: {0}")]
    Ayab(#[from] knitlink_ayab::AyabError),
}

pub type Result<T> = std::result::Result<T, SessionError>;
