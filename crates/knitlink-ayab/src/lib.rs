//! AYAB knitting-machine messages.
//!
//! Each SLIP payload exchanged with the AYAB firmware starts with a tag byte
//! that selects a fixed binary layout. Tags sent by the firmware have the
//! high `0x80` bit set.

pub mod error;
pub mod message;
pub mod tag;

pub use error::{AyabError, Result};
pub use message::{
    decode_message, encode_message, AyabMessage, FirmwareVersion, IndicatorState, InfoReply,
    INDICATOR_STATE_LEN, INFO_REPLY_LEN, TAG_STRING_LEN,
};
pub use tag::{is_reply, tag_name, IND_STATE, REPLY_BIT, REP_INFO, REQ_INFO};
