//! Session layer for one connection to the knitting controller.
//!
//! A [`Session`] owns the transport handle and a [`Dispatcher`]. Inbound
//! units are classified by kind: text units are parsed as control-channel
//! envelopes and routed by id; binary units are fed through the connection's
//! SLIP decoder and each completed frame is decoded as an AYAB message.
//!
//! Nothing in this layer is fatal. Malformed input becomes a [`Diagnostic`],
//! is logged and handed to an optional sink, and the session keeps going.

pub mod diagnostic;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod session;

#[cfg(feature = "ws")]
pub mod drive;

pub use diagnostic::{Diagnostic, Severity};
pub use dispatch::{DiagnosticSink, Dispatcher, Inbound, MachineHandler};
pub use error::{Result, SessionError};
pub use registry::{ControlHandler, HandlerRegistry};
pub use session::{CloseInfo, Session, SessionConfig, SessionStats};
