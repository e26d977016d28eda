//! Host-side link to an AYAB knitting-machine controller.
//!
//! The controller exposes one connection carrying JSON control messages as
//! text units and SLIP-framed knitting-machine messages as binary units.
//!
//! # Crate Structure
//!
//! - [`transport`]: text/binary unit contract, in-memory and WebSocket transports
//! - [`frame`]: SLIP byte-stream framing
//! - [`ayab`]: knitting-machine message model
//! - [`control`]: control-channel envelope, id table and payloads
//! - [`session`]: dispatcher and connection session (behind `session` feature)

/// Re-export transport types.
pub mod transport {
    pub use knitlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use knitlink_frame::*;
}

/// Re-export machine message types.
pub mod ayab {
    pub use knitlink_ayab::*;
}

/// Re-export control-channel types.
pub mod control {
    pub use knitlink_control::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use knitlink_session::*;
}
