use std::fmt;

use bytes::Bytes;
use serde::Serialize;

use crate::error::{AyabError, Result};
use crate::tag::{IND_STATE, REP_INFO, REQ_INFO};

/// Minimum length of an info reply frame, tag byte included.
pub const INFO_REPLY_LEN: usize = 21;

/// Length of an indicator state frame, tag byte included.
pub const INDICATOR_STATE_LEN: usize = 12;

/// Width of the NUL-padded firmware tag string in an info reply.
pub const TAG_STRING_LEN: usize = 16;

const TAG_STRING_OFFSET: usize = 5;

/// A message exchanged with the knitting-machine firmware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AyabMessage {
    /// Host asks the firmware to identify itself.
    RequestInfo,
    InfoReply(InfoReply),
    IndicatorState(IndicatorState),
    /// Any tag without a known layout.
    Unknown { tag: u8 },
}

impl AyabMessage {
    /// The tag byte this message travels under.
    pub fn tag(&self) -> u8 {
        match self {
            Self::RequestInfo => REQ_INFO,
            Self::InfoReply(_) => REP_INFO,
            Self::IndicatorState(_) => IND_STATE,
            Self::Unknown { tag } => *tag,
        }
    }
}

/// Firmware version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Reply to [`AyabMessage::RequestInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoReply {
    pub api_version: u8,
    pub firmware: FirmwareVersion,
    /// Build tag with trailing NUL padding removed.
    pub tag: String,
}

/// Periodic sensor and carriage report.
///
/// Values are passed through as sent; the firmware owns their meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorState {
    pub error: u8,
    pub state: u8,
    pub hall_left: u16,
    pub hall_right: u16,
    pub carriage_type: u8,
    pub carriage_position: u8,
    pub carriage_direction: u8,
    pub hall_active: u8,
    pub belt_shift: u8,
}

/// Decode one SLIP payload into a typed message.
///
/// Unknown tags are not an error; they come back as [`AyabMessage::Unknown`].
pub fn decode_message(frame: &[u8]) -> Result<AyabMessage> {
    let Some(&tag) = frame.first() else {
        return Err(AyabError::Empty);
    };

    match tag {
        REP_INFO => {
            require(frame, INFO_REPLY_LEN)?;
            Ok(AyabMessage::InfoReply(InfoReply {
                api_version: frame[1],
                firmware: FirmwareVersion {
                    major: frame[2],
                    minor: frame[3],
                    patch: frame[4],
                },
                tag: tag_string(&frame[TAG_STRING_OFFSET..TAG_STRING_OFFSET + TAG_STRING_LEN]),
            }))
        }
        IND_STATE => {
            require(frame, INDICATOR_STATE_LEN)?;
            Ok(AyabMessage::IndicatorState(IndicatorState {
                error: frame[1],
                state: frame[2],
                hall_left: u16::from_be_bytes([frame[3], frame[4]]),
                hall_right: u16::from_be_bytes([frame[5], frame[6]]),
                carriage_type: frame[7],
                carriage_position: frame[8],
                carriage_direction: frame[9],
                hall_active: frame[10],
                belt_shift: frame[11],
            }))
        }
        other => Ok(AyabMessage::Unknown { tag: other }),
    }
}

/// Encode an outbound message as an (unframed) payload.
pub fn encode_message(message: &AyabMessage) -> Result<Bytes> {
    match message {
        AyabMessage::RequestInfo => Ok(Bytes::from_static(&[REQ_INFO])),
        other => Err(AyabError::NotEncodable { tag: other.tag() }),
    }
}

fn require(frame: &[u8], required: usize) -> Result<()> {
    if frame.len() < required {
        return Err(AyabError::Truncated {
            tag: frame[0],
            len: frame.len(),
            required,
        });
    }
    Ok(())
}

fn tag_string(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |idx| idx + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
