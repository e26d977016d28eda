use bytes::{BufMut, Bytes, BytesMut};
use tracing::{trace, warn};

use crate::error::FrameError;
use crate::slip::{escape, unescape, END, ESC};

/// Default maximum payload size: 10 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 10 * 1024 * 1024;

/// Violations kept for the owner between two [`SlipDecoder::take_violations`] calls.
const MAX_PENDING_VIOLATIONS: usize = 64;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Number of bytes [`encode_frame`] writes for `payload`.
pub fn encoded_len(payload: &[u8]) -> usize {
    let escaped = payload.iter().filter(|b| escape(**b).is_some()).count();
    payload.len() + escaped + 2
}

/// Encode a payload into one SLIP frame.
///
/// Wire format:
/// ```text
/// ┌──────┬──────────────────────────────────────────┬──────┐
/// │ END  │ payload, END -> ESC ESC_END,             │ END  │
/// │ 0xC0 │          ESC -> ESC ESC_ESC              │ 0xC0 │
/// └──────┴──────────────────────────────────────────┴──────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(encoded_len(payload));
    dst.put_u8(END);
    for &byte in payload {
        match escape(byte) {
            Some(substitute) => {
                dst.put_u8(ESC);
                dst.put_u8(substitute);
            }
            None => dst.put_u8(byte),
        }
    }
    dst.put_u8(END);
}

/// Encode a payload into a freshly allocated frame.
pub fn encode_to_vec(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(encoded_len(payload));
    encode_frame(payload, &mut dst);
    dst.freeze()
}

/// Decode every complete frame in `wire` with a throwaway decoder.
///
/// Trailing bytes that do not form a complete frame are dropped.
pub fn decode_all(wire: &[u8]) -> Vec<Bytes> {
    SlipDecoder::new().decode(wire)
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum decoded payload size in bytes. Default: 10 MiB.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

/// Streaming SLIP decoder: the per-connection decoder buffer state.
///
/// Holds the bytes accumulated since the last completed frame and whether the
/// previous byte was `ESC`. Owned by exactly one receive path.
#[derive(Debug)]
pub struct SlipDecoder {
    buf: BytesMut,
    escape_pending: bool,
    /// Dropping bytes until the next `END` after a violation.
    discarding: bool,
    violations: Vec<FrameError>,
    total_violations: u64,
    config: FrameConfig,
}

impl SlipDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(FrameConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            escape_pending: false,
            discarding: false,
            violations: Vec::new(),
            total_violations: 0,
            config,
        }
    }

    /// Feed one chunk, returning every payload it completes, in order.
    ///
    /// Never fails. Protocol violations discard the partial frame and are kept
    /// for [`take_violations`](Self::take_violations).
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        let mut frames = Vec::new();
        for &byte in chunk {
            if let Some(frame) = self.push_byte(byte) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Feed one byte, returning a payload when it completes one.
    pub fn push_byte(&mut self, byte: u8) -> Option<Bytes> {
        if self.discarding {
            if byte == END {
                self.discarding = false;
            }
            return None;
        }

        if self.escape_pending {
            self.escape_pending = false;
            match unescape(byte) {
                Some(value) => self.append(value),
                None => {
                    self.violation(FrameError::InvalidEscape { byte });
                    self.buf.clear();
                    // ESC END still closes the frame; anything else poisons the rest of it.
                    self.discarding = byte != END;
                }
            }
            return None;
        }

        match byte {
            ESC => self.escape_pending = true,
            END => {
                if !self.buf.is_empty() {
                    let frame = self.buf.split().freeze();
                    trace!(len = frame.len(), "slip frame complete");
                    return Some(frame);
                }
            }
            _ => self.append(byte),
        }
        None
    }

    /// Drain protocol violations recorded since the last call.
    pub fn take_violations(&mut self) -> Vec<FrameError> {
        std::mem::take(&mut self.violations)
    }

    /// Total protocol violations seen by this decoder.
    pub fn total_violations(&self) -> u64 {
        self.total_violations
    }

    /// Bytes accumulated towards the next frame.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// True when the last byte fed was an unresolved `ESC`.
    pub fn is_escape_pending(&self) -> bool {
        self.escape_pending
    }

    /// Drop any partial frame and pending escape.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.escape_pending = false;
        self.discarding = false;
    }

    /// Current decoder configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn append(&mut self, byte: u8) {
        if self.buf.len() >= self.config.max_payload_size {
            self.violation(FrameError::PayloadTooLarge {
                size: self.buf.len().saturating_add(1),
                max: self.config.max_payload_size,
            });
            self.buf.clear();
            self.discarding = true;
            return;
        }
        self.buf.put_u8(byte);
    }

    fn violation(&mut self, err: FrameError) {
        warn!(error = %err, "slip protocol violation; partial frame dropped");
        self.total_violations = self.total_violations.saturating_add(1);
        if self.violations.len() < MAX_PENDING_VIOLATIONS {
            self.violations.push(err);
        }
    }
}

impl Default for SlipDecoder {
    fn default() -> Self {
        Self::new()
    }
}
