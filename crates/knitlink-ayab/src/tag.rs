//! Tag bytes.
//!
//! Firmware-originated tags carry [`REPLY_BIT`]; host requests never do.

/// Set on every message the firmware sends.
pub const REPLY_BIT: u8 = 0x80;

/// Host -> firmware: request firmware information.
pub const REQ_INFO: u8 = 0x03;

/// Firmware -> host: indicator state (sensors, carriage).
pub const IND_STATE: u8 = 0x84;

/// Firmware -> host: firmware information reply.
pub const REP_INFO: u8 = 0xC3;

/// Returns a human-readable name for a tag byte.
pub fn tag_name(tag: u8) -> &'static str {
    match tag {
        REQ_INFO => "reqInfo",
        IND_STATE => "indState",
        REP_INFO => "cnfInfo",
        _ => "unknown",
    }
}

/// True when the tag is in the firmware-to-host space.
pub fn is_reply(tag: u8) -> bool {
    tag & REPLY_BIT != 0
}
