/// SLIP framing failures.
///
/// `InvalidEscape` and `PayloadTooLarge` are also what [`SlipDecoder`]
/// records as violations; the decoder itself never fails.
///
/// [`SlipDecoder`]: crate::SlipDecoder
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// `ESC` followed by something other than `ESC_END` or `ESC_ESC`.
    #[error("invalid SLIP escape sequence (0xDB 0x{byte:02X})")]
    InvalidEscape { byte: u8 },

    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// End of stream, or a writer that stopped accepting bytes.
    #[error("stream closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
