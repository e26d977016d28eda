//! SLIP byte-stream framing for the knitting-machine link.
//!
//! Every payload exchanged with the AYAB firmware travels as one SLIP frame:
//! - an `END` (0xC0) delimiter before and after the payload
//! - `END` inside the payload escaped as `ESC ESC_END`
//! - `ESC` inside the payload escaped as `ESC ESC_ESC`
//!
//! Decoding is streaming: feed chunks as they arrive, get completed payloads
//! back. Partial frames survive across chunk boundaries.

pub mod codec;
pub mod error;
pub mod reader;
pub mod slip;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    decode_all, encode_frame, encode_to_vec, encoded_len, FrameConfig, SlipDecoder,
    DEFAULT_MAX_PAYLOAD,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use slip::{END, ESC, ESC_END, ESC_ESC};
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::SlipCodec;
