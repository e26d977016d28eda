use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::{Result, TransportError};
use crate::traits::{ConnectionState, Transport};
use crate::unit::Unit;

/// Synchronous sending half backed by an unbounded tokio channel.
///
/// The session calls [`Transport::send`] from synchronous code; a pump task owns
/// the [`OutboundReceiver`] and writes the units to the real socket. Both halves
/// share one connection state.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<Unit>,
    state: Arc<AtomicU8>,
}

/// Receiving half drained by the pump task.
#[derive(Debug)]
pub struct OutboundReceiver {
    rx: mpsc::UnboundedReceiver<Unit>,
    state: Arc<AtomicU8>,
}

impl ChannelTransport {
    /// Create a connected pair in the given initial state.
    pub fn pair(initial: ConnectionState) -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicU8::new(initial.to_u8()));
        (
            Self {
                tx,
                state: Arc::clone(&state),
            },
            OutboundReceiver { rx, state },
        )
    }

    /// Update the shared connection state.
    pub fn set_state(&self, state: ConnectionState) {
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }
}

impl Transport for ChannelTransport {
    fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn send(&mut self, unit: Unit) -> Result<()> {
        let state = self.state();
        if state != ConnectionState::Open {
            return Err(TransportError::NotOpen { state });
        }
        self.tx.send(unit).map_err(|_| TransportError::Shutdown)
    }
}

impl OutboundReceiver {
    /// Wait for the next outbound unit. `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<Unit> {
        self.rx.recv().await
    }

    /// Update the shared connection state.
    pub fn set_state(&self, state: ConnectionState) {
        self.state.store(state.to_u8(), Ordering::SeqCst);
    }

    /// Current shared connection state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    #[cfg(feature = "ws")]
    pub(crate) fn shared_state(&self) -> Arc<AtomicU8> {
        Arc::clone(&self.state)
    }
}
