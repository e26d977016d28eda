use std::fmt;

use crate::error::Result;
use crate::unit::Unit;

/// Connection state as seen by the sending side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionState {
    pub(crate) fn to_u8(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Open => 1,
            Self::Closing => 2,
            Self::Closed => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Lifecycle and data events surfaced by a transport's receive side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established.
    Open,
    /// One inbound unit.
    Unit(Unit),
    /// The connection closed with a code and reason.
    Closed { code: u16, reason: String },
    /// A transport-level error; the connection should be considered dead.
    Error(String),
}

/// Outbound half of a connection.
///
/// Implementations never queue while the connection is not open: `send` must
/// fail with [`TransportError::NotOpen`](crate::TransportError::NotOpen) instead.
pub trait Transport {
    /// Current connection state.
    fn state(&self) -> ConnectionState;

    /// Hand one unit to the transport for transmission.
    fn send(&mut self, unit: Unit) -> Result<()>;

    /// True when the connection can accept units.
    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn state(&self) -> ConnectionState {
        (**self).state()
    }

    fn send(&mut self, unit: Unit) -> Result<()> {
        (**self).send(unit)
    }
}
