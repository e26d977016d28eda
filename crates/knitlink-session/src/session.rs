use knitlink_ayab::{encode_message, AyabMessage};
use knitlink_control::{Envelope, MessageId};
use knitlink_frame::{encode_to_vec, FrameConfig};
use knitlink_transport::{ConnectionState, Transport, TransportError, TransportEvent, Unit};
use tracing::{debug, info, warn};

use crate::diagnostic::Diagnostic;
use crate::dispatch::{Dispatcher, Inbound};
use crate::error::{Result, SessionError};
use crate::registry::HandlerRegistry;

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// SLIP decoder limits for the binary path.
    pub frame: FrameConfig,
    /// Send a system-info request as soon as the connection opens.
    pub request_system_info_on_open: bool,
    /// Log every unit at `debug`.
    pub log_traffic: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            request_system_info_on_open: true,
            log_traffic: false,
        }
    }
}

/// Counters for one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub units_received: u64,
    pub units_sent: u64,
    pub frames: u64,
    pub machine_messages: u64,
    pub envelopes: u64,
    pub diagnostics: u64,
    /// Times the connection opened.
    pub opens: u64,
}

/// How a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

/// One connection to the knitting controller.
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
    dispatcher: Dispatcher,
    config: SessionConfig,
    open: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let dispatcher =
            Dispatcher::new(config.frame.clone()).with_traffic_logging(config.log_traffic);
        Self {
            transport,
            dispatcher,
            config,
            open: false,
        }
    }

    /// Register a control-channel handler for `id`.
    pub fn on_control<F>(&mut self, id: u32, handler: F)
    where
        F: FnMut(&Envelope) + Send + 'static,
    {
        self.dispatcher.registry_mut().register(id, handler);
    }

    /// Register the handler for decoded machine messages.
    pub fn on_machine_message<F>(&mut self, handler: F)
    where
        F: FnMut(&AyabMessage) + Send + 'static,
    {
        self.dispatcher.set_machine_handler(handler);
    }

    /// Register the diagnostic sink.
    pub fn on_diagnostic<F>(&mut self, sink: F)
    where
        F: FnMut(&Diagnostic) + Send + 'static,
    {
        self.dispatcher.set_diagnostic_sink(sink);
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        self.dispatcher.registry_mut()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The connection opened: start from an empty decoder.
    pub fn on_open(&mut self) -> Result<()> {
        self.dispatcher.reset_decoder();
        self.open = true;
        self.dispatcher.stats_mut().opens += 1;
        info!(state = %self.transport.state(), "session open");

        if self.config.request_system_info_on_open {
            self.send_control(&Envelope::request(MessageId::SystemInfo))?;
        }
        Ok(())
    }

    /// The connection closed. Any partial frame is discarded.
    pub fn on_close(&mut self, code: u16, reason: &str) {
        self.teardown();
        info!(code, reason, "session closed");
    }

    /// The transport reported an error. Any partial frame is discarded.
    pub fn on_error(&mut self, message: &str) {
        self.teardown();
        warn!(error = message, "session transport error");
    }

    /// Route one inbound unit.
    pub fn handle_unit(&mut self, unit: &Unit) -> Vec<Inbound> {
        self.dispatcher.route(unit)
    }

    /// Apply one transport event. Returns decoded items for unit events and
    /// the close info once the connection has ended.
    pub fn handle_event(
        &mut self,
        event: TransportEvent,
    ) -> Result<(Vec<Inbound>, Option<CloseInfo>)> {
        match event {
            TransportEvent::Open => {
                self.on_open()?;
                Ok((Vec::new(), None))
            }
            TransportEvent::Unit(unit) => Ok((self.handle_unit(&unit), None)),
            TransportEvent::Closed { code, reason } => {
                self.on_close(code, &reason);
                Ok((Vec::new(), Some(CloseInfo { code, reason })))
            }
            TransportEvent::Error(message) => {
                self.on_error(&message);
                Err(SessionError::ConnectionLost(message))
            }
        }
    }

    /// Serialize an envelope and send it as a text unit.
    pub fn send_control(&mut self, envelope: &Envelope) -> Result<()> {
        let text = envelope.to_json()?;
        if self.config.log_traffic {
            debug!(id = envelope.id, "sending control message");
        }
        self.send_unit(Unit::Text(text))
    }

    /// Send a payload-less control request.
    pub fn request(&mut self, message: MessageId) -> Result<()> {
        self.send_control(&Envelope::request(message))
    }

    /// Encode, frame and send a machine message as a binary unit.
    pub fn send_machine(&mut self, message: &AyabMessage) -> Result<()> {
        let payload = encode_message(message)?;
        if self.config.log_traffic {
            debug!(tag = message.tag(), "sending machine message");
        }
        self.send_unit(Unit::Binary(encode_to_vec(&payload)))
    }

    /// Ask the knitting-machine firmware to identify itself.
    pub fn request_info(&mut self) -> Result<()> {
        self.send_machine(&AyabMessage::RequestInfo)
    }

    pub fn stats(&self) -> SessionStats {
        *self.dispatcher.stats()
    }

    /// True between `on_open` and `on_close`/`on_error`.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    fn send_unit(&mut self, unit: Unit) -> Result<()> {
        if !self.transport.is_open() {
            let state = self.transport.state();
            return Err(self.unavailable(state));
        }
        // the handle may still look open after a Closed event
        if !self.open {
            return Err(self.unavailable(ConnectionState::Closed));
        }
        match self.transport.send(unit) {
            Ok(()) => {
                self.dispatcher.stats_mut().units_sent += 1;
                Ok(())
            }
            Err(TransportError::NotOpen { state }) => Err(self.unavailable(state)),
            Err(err) => Err(err.into()),
        }
    }

    fn unavailable(&mut self, state: ConnectionState) -> SessionError {
        self.dispatcher.report(Diagnostic::TransportUnavailable { state });
        SessionError::TransportUnavailable { state }
    }

    fn teardown(&mut self) {
        self.open = false;
        let discarded = self.dispatcher.reset_decoder();
        if discarded > 0 {
            debug!(discarded, "dropping partial frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use knitlink_transport::MemoryTransport;

    use super::*;

    #[test]
    fn on_open_requests_system_info() {
        let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
        session.on_open().unwrap();

        assert!(session.is_open());
        assert_eq!(session.transport().sent(), &[Unit::text(r#"{"id":1}"#)]);
        assert_eq!(session.stats().units_sent, 1);
    }

    #[test]
    fn on_open_request_can_be_disabled() {
        let config = SessionConfig {
            request_system_info_on_open: false,
            ..Default::default()
        };
        let mut session = Session::new(MemoryTransport::new(), config);
        session.on_open().unwrap();

        assert!(session.transport().sent().is_empty());
    }

    #[test]
    fn request_info_sends_framed_tag() {
        let config = SessionConfig {
            request_system_info_on_open: false,
            ..Default::default()
        };
        let mut session = Session::new(MemoryTransport::new(), config);
        session.on_open().unwrap();
        session.request_info().unwrap();

        assert_eq!(
            session.transport().sent(),
            &[Unit::binary(vec![0xC0, 0x03, 0xC0])]
        );
    }

    #[test]
    fn send_before_open_reports_unavailable() {
        let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());

        let err = session.request_info().unwrap_err();

        assert!(matches!(
            err,
            SessionError::TransportUnavailable {
                state: ConnectionState::Closed
            }
        ));
        assert!(session.transport().sent().is_empty());
    }

    #[test]
    fn send_after_close_event_is_rejected_while_handle_looks_open() {
        let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
        session.on_open().unwrap();
        session.on_close(1000, "bye");
        assert!(session.transport().is_open());

        assert!(matches!(
            session.request_info(),
            Err(SessionError::TransportUnavailable {
                state: ConnectionState::Closed
            })
        ));
        // only the system-info request from on_open went out
        assert_eq!(session.transport().sent(), &[Unit::text(r#"{"id":1}"#)]);
        assert_eq!(session.stats().units_sent, 1);
        assert_eq!(session.stats().diagnostics, 1);
    }

    #[test]
    fn send_machine_rejects_inbound_only_message() {
        let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
        let err = session
            .send_machine(&AyabMessage::Unknown { tag: 0x7F })
            .unwrap_err();

        assert!(matches!(err, SessionError::Ayab(_)));
        assert!(session.transport().sent().is_empty());
    }

    #[test]
    fn send_while_closed_reports_unavailable() {
        let transport = MemoryTransport::with_state(ConnectionState::Closed);
        let mut session = Session::new(transport, SessionConfig::default());

        let err = session.request(MessageId::ListFiles).unwrap_err();

        assert!(matches!(
            err,
            SessionError::TransportUnavailable {
                state: ConnectionState::Closed
            }
        ));
        assert_eq!(session.stats().diagnostics, 1);
        assert!(session.transport().sent().is_empty());
    }

    #[test]
    fn close_event_returns_close_info() {
        let mut session = Session::new(MemoryTransport::new(), SessionConfig::default());
        session.handle_event(TransportEvent::Open).unwrap();

        let (items, close) = session
            .handle_event(TransportEvent::Closed {
                code: 1000,
                reason: "bye".into(),
            })
            .unwrap();

        assert!(items.is_empty());
        assert_eq!(
            close,
            Some(CloseInfo {
                code: 1000,
                reason: "bye".into()
            })
        );
        assert!(!session.is_open());
    }
}
