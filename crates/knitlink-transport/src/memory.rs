use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::{ConnectionState, Transport};
use crate::unit::Unit;

/// In-process transport that records every unit it is asked to send.
///
/// Used for offline replay of captured traffic and as a test double.
#[derive(Debug)]
pub struct MemoryTransport {
    state: ConnectionState,
    sent: Vec<Unit>,
}

impl MemoryTransport {
    /// Create a transport that is already open.
    pub fn new() -> Self {
        Self::with_state(ConnectionState::Open)
    }

    /// Create a transport in an explicit state.
    pub fn with_state(state: ConnectionState) -> Self {
        Self {
            state,
            sent: Vec::new(),
        }
    }

    /// Change the connection state.
    pub fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    /// Units sent so far, oldest first.
    pub fn sent(&self) -> &[Unit] {
        &self.sent
    }

    /// Drain the recorded units.
    pub fn take_sent(&mut self) -> Vec<Unit> {
        std::mem::take(&mut self.sent)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MemoryTransport {
    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, unit: Unit) -> Result<()> {
        if self.state != ConnectionState::Open {
            return Err(TransportError::NotOpen { state: self.state });
        }
        debug!(kind = unit.kind(), len = unit.len(), "memory transport send");
        self.sent.push(unit);
        Ok(())
    }
}
