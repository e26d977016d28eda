/// Errors that can occur on the control channel.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Text unit was not a JSON object with an `id`.
    #[error("malformed JSON message: {message}")]
    MalformedJson { text: String, message: String },

    /// No handler is registered for this id.
    #[error("unexpected message id {id}")]
    UnroutedId { id: u32 },

    /// `data` does not match the expected payload shape.
    #[error("invalid payload for message {id}: {source}")]
    Payload {
        id: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ControlError>;
