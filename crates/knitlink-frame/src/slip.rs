//! SLIP special bytes (RFC 1055), byte-identical to the AYAB firmware.

/// Frame delimiter.
pub const END: u8 = 0xC0;

/// Escape introducer.
pub const ESC: u8 = 0xDB;

/// Escaped substitute for `END`.
pub const ESC_END: u8 = 0xDC;

/// Escaped substitute for `ESC`.
pub const ESC_ESC: u8 = 0xDD;

/// The substitute to emit after `ESC` for a payload byte, if it needs escaping.
pub fn escape(byte: u8) -> Option<u8> {
    match byte {
        END => Some(ESC_END),
        ESC => Some(ESC_ESC),
        _ => None,
    }
}

/// The payload byte an escaped substitute stands for.
pub fn unescape(substitute: u8) -> Option<u8> {
    match substitute {
        ESC_END => Some(END),
        ESC_ESC => Some(ESC),
        _ => None,
    }
}
