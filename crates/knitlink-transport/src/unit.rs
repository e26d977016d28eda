use bytes::Bytes;

/// One unit delivered by, or handed to, the transport.
///
/// The transport tags every unit with its kind. Kinds the dispatcher does not
/// understand arrive as [`Unit::Unsupported`] so they can be reported instead of
/// vanishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// UTF-8 text (control-channel JSON).
    Text(String),
    /// Raw bytes (SLIP-framed knitting-machine stream).
    Binary(Bytes),
    /// A unit of a kind neither side of the protocol uses.
    Unsupported { kind: String },
}

impl Unit {
    /// Build a text unit.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Build a binary unit.
    pub fn binary(bytes: impl Into<Bytes>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Short kind name for logs.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Unsupported { kind } => kind,
        }
    }

    /// Payload size in bytes (0 for unsupported units).
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
            Self::Unsupported { .. } => 0,
        }
    }

    /// True when the unit carries no payload bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
