/// Errors that can occur while decoding or encoding AYAB messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AyabError {
    /// A zero-length frame has no tag to dispatch on.
    #[error("empty frame")]
    Empty,

    /// A frame is shorter than its type's fixed layout.
    #[error("truncated frame (tag 0x{tag:02X}: {len} bytes, need {required})")]
    Truncated {
        tag: u8,
        len: usize,
        required: usize,
    },

    /// The message only ever travels firmware -> host.
    #[error("message 0x{tag:02X} cannot be sent to the firmware")]
    NotEncodable { tag: u8 },
}

pub type Result<T> = std::result::Result<T, AyabError>;
