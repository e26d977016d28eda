use std::fmt;

use knitlink_ayab::{decode_message, AyabError, AyabMessage};
use knitlink_control::{ControlError, Envelope};
use knitlink_frame::{FrameConfig, SlipDecoder};
use knitlink_transport::Unit;
use tracing::debug;

use crate::diagnostic::Diagnostic;
use crate::registry::HandlerRegistry;
use crate::session::SessionStats;

/// Callback for every decoded machine message.
pub type MachineHandler = Box<dyn FnMut(&AyabMessage) + Send>;

/// Callback for every diagnostic, after it has been logged.
pub type DiagnosticSink = Box<dyn FnMut(&Diagnostic) + Send>;

/// One successfully decoded inbound item.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Machine(AyabMessage),
    Control(Envelope),
}

/// Classifies units and routes them to handlers.
///
/// Owns the connection's SLIP decoder state; binary units are only ever fed
/// through this one decoder, in arrival order.
pub struct Dispatcher {
    decoder: SlipDecoder,
    registry: HandlerRegistry,
    machine_handler: Option<MachineHandler>,
    sink: Option<DiagnosticSink>,
    stats: SessionStats,
    log_traffic: bool,
}

impl Dispatcher {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            decoder: SlipDecoder::with_config(config),
            registry: HandlerRegistry::new(),
            machine_handler: None,
            sink: None,
            stats: SessionStats::default(),
            log_traffic: false,
        }
    }

    /// Log every inbound unit at `debug`.
    pub fn with_traffic_logging(mut self, enabled: bool) -> Self {
        self.log_traffic = enabled;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub fn set_machine_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&AyabMessage) + Send + 'static,
    {
        self.machine_handler = Some(Box::new(handler));
    }

    pub fn set_diagnostic_sink<F>(&mut self, sink: F)
    where
        F: FnMut(&Diagnostic) + Send + 'static,
    {
        self.sink = Some(Box::new(sink));
    }

    pub fn decoder(&self) -> &SlipDecoder {
        &self.decoder
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut SessionStats {
        &mut self.stats
    }

    /// Replace the decoder with a fresh one. Buffered partial bytes are lost.
    ///
    /// Returns the number of bytes discarded.
    pub fn reset_decoder(&mut self) -> usize {
        let pending = self.decoder.pending_len();
        self.decoder = SlipDecoder::with_config(self.decoder.config().clone());
        pending
    }

    /// Route one unit. Returns the successfully decoded items in order.
    ///
    /// Never fails; problems are reported as diagnostics.
    pub fn route(&mut self, unit: &Unit) -> Vec<Inbound> {
        self.stats.units_received += 1;
        if self.log_traffic {
            debug!(kind = unit.kind(), len = unit.len(), "unit received");
        }

        match unit {
            Unit::Text(text) => self.route_text(text).into_iter().collect(),
            Unit::Binary(bytes) => self.route_binary(bytes),
            Unit::Unsupported { kind } => {
                self.report(Diagnostic::UnsupportedUnit { kind: kind.clone() });
                Vec::new()
            }
        }
    }

    /// Log a diagnostic, count it and pass it to the sink.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.stats.diagnostics += 1;
        if let Some(sink) = self.sink.as_mut() {
            sink(&diagnostic);
        }
    }

    fn route_text(&mut self, text: &str) -> Option<Inbound> {
        let envelope = match knitlink_control::parse(text) {
            Ok(envelope) => envelope,
            Err(ControlError::MalformedJson { text, message }) => {
                self.report(Diagnostic::MalformedJson { text, message });
                return None;
            }
            Err(err) => {
                self.report(Diagnostic::MalformedJson {
                    text: text.to_string(),
                    message: err.to_string(),
                });
                return None;
            }
        };

        self.stats.envelopes += 1;
        if self.log_traffic {
            debug!(id = envelope.id, "control message");
        }
        if let Err(ControlError::UnroutedId { id }) = self.registry.dispatch(&envelope) {
            self.report(Diagnostic::UnroutedId { id });
        }
        Some(Inbound::Control(envelope))
    }

    fn route_binary(&mut self, bytes: &[u8]) -> Vec<Inbound> {
        let frames = self.decoder.decode(bytes);
        for violation in self.decoder.take_violations() {
            self.report(Diagnostic::FramingViolation(violation));
        }

        let mut inbound = Vec::with_capacity(frames.len());
        for frame in frames {
            self.stats.frames += 1;
            let message = match decode_message(&frame) {
                Ok(message) => message,
                Err(AyabError::Truncated { tag, len, required }) => {
                    self.report(Diagnostic::MalformedFrame { tag, len, required });
                    continue;
                }
                // the decoder never yields empty frames
                Err(err) => {
                    debug!(error = %err, "frame skipped");
                    continue;
                }
            };

            if let AyabMessage::Unknown { tag } = message {
                self.report(Diagnostic::UnknownTag { tag });
            }
            if self.log_traffic {
                debug!(tag = message.tag(), len = frame.len(), "machine message");
            }
            self.stats.machine_messages += 1;
            if let Some(handler) = self.machine_handler.as_mut() {
                handler(&message);
            }
            inbound.push(Inbound::Machine(message));
        }
        inbound
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(FrameConfig::default())
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("decoder", &self.decoder)
            .field("registry", &self.registry)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
