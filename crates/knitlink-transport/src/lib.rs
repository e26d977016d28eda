//! Transport contract for the knitting-machine controller link.
//!
//! The controller exposes one logical connection that carries two kinds of
//! units, in order:
//! - text units holding JSON control-channel messages
//! - binary units holding SLIP-framed knitting-machine bytes
//!
//! This is the lowest layer of knitlink. The codec and session layers only
//! ever see [`Unit`] values and the [`Transport`] trait provided here.

pub mod error;
pub mod memory;
pub mod traits;
pub mod unit;

#[cfg(feature = "async")]
pub mod channel;

#[cfg(feature = "ws")]
pub mod ws;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use traits::{ConnectionState, Transport, TransportEvent};
pub use unit::Unit;

#[cfg(feature = "async")]
pub use channel::{ChannelTransport, OutboundReceiver};

#[cfg(feature = "ws")]
pub use ws::{connect_ws, split_stream, ClientStream, WsReceiver, ABNORMAL_CLOSURE};
