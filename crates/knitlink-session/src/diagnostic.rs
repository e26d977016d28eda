use knitlink_frame::FrameError;
use knitlink_transport::ConnectionState;

/// How loudly a diagnostic is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warn,
}

/// A non-fatal report about one unit, frame or send attempt.
#[derive(Debug, thiserror::Error)]
pub enum Diagnostic {
    /// A binary frame too short for its tag's layout.
    #[error("malformed frame (tag 0x{tag:02X}: {len} bytes, need {required})")]
    MalformedFrame {
        tag: u8,
        len: usize,
        required: usize,
    },

    /// A binary frame with a tag that has no known layout.
    #[error("unknown machine message tag 0x{tag:02X}")]
    UnknownTag { tag: u8 },

    /// A text unit that is not a JSON envelope.
    #[error("malformed JSON message: {message}")]
    MalformedJson { text: String, message: String },

    /// An envelope whose id has no registered handler.
    #[error("unexpected message id {id}")]
    UnroutedId { id: u32 },

    /// A send attempted while the connection is not open.
    #[error("transport unavailable (state: {state})")]
    TransportUnavailable { state: ConnectionState },

    /// The byte stream broke SLIP framing rules.
    #[error("framing violation: {0}")]
    FramingViolation(FrameError),

    /// A unit kind the session does not handle.
    #[error("unsupported unit kind: {kind}")]
    UnsupportedUnit { kind: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::UnknownTag { .. } => Severity::Info,
            _ => Severity::Warn,
        }
    }

    /// Short stable name for structured output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedFrame { .. } => "malformed_frame",
            Self::UnknownTag { .. } => "unknown_tag",
            Self::MalformedJson { .. } => "malformed_json",
            Self::UnroutedId { .. } => "unrouted_id",
            Self::TransportUnavailable { .. } => "transport_unavailable",
            Self::FramingViolation(_) => "framing_violation",
            Self::UnsupportedUnit { .. } => "unsupported_unit",
        }
    }

    /// The offending input, for diagnostics that carry it.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::MalformedJson { text, .. } => Some(text),
            _ => None,
        }
    }

    /// Log through `tracing` at this diagnostic's severity.
    pub fn log(&self) {
        let text = self.text();
        match self.severity() {
            Severity::Info => tracing::info!(kind = self.kind(), text, "{self}"),
            Severity::Warn => tracing::warn!(kind = self.kind(), text, "{self}"),
        }
    }
}
