//! WebSocket adapter for the controller's `/ws` endpoint.
//!
//! [`connect_ws`] opens the socket and splits it in two:
//! - a [`ChannelTransport`] the session sends through; a writer task drains it
//!   into the socket sink
//! - a [`WsReceiver`] that turns incoming WebSocket messages into
//!   [`TransportEvent`]s
//!
//! Protocol-level ping/pong is answered by tungstenite and never surfaces.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::channel::{ChannelTransport, OutboundReceiver};
use crate::error::{Result, TransportError};
use crate::traits::{ConnectionState, TransportEvent};
use crate::unit::Unit;

/// Close code reported when the stream ends without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Client WebSocket stream type returned by [`connect_ws`].
pub type ClientStream = MaybeTlsStream<TcpStream>;

/// Receive side of a WebSocket connection.
pub struct WsReceiver<S> {
    stream: SplitStream<WebSocketStream<S>>,
    state: Arc<AtomicU8>,
    writer: Option<JoinHandle<()>>,
    announced_open: bool,
    finished: bool,
}

/// Connect to a controller endpoint such as `ws://ayab.local/ws`.
pub async fn connect_ws(url: &str) -> Result<(ChannelTransport, WsReceiver<ClientStream>)> {
    let (stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|err| TransportError::Connect {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
    info!(url, "websocket connected");
    Ok(split_stream(stream))
}

/// Wrap an already-established WebSocket stream (client or server side).
pub fn split_stream<S>(stream: WebSocketStream<S>) -> (ChannelTransport, WsReceiver<S>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (sink, stream) = stream.split();
    let (transport, outbound) = ChannelTransport::pair(ConnectionState::Open);
    let state = outbound.shared_state();
    let writer = tokio::spawn(write_loop(sink, outbound));

    (
        transport,
        WsReceiver {
            stream,
            state,
            writer: Some(writer),
            announced_open: false,
            finished: false,
        },
    )
}

impl<S> WsReceiver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Next lifecycle or data event. `None` once the connection is finished.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.finished {
            return None;
        }
        if !self.announced_open {
            self.announced_open = true;
            return Some(TransportEvent::Open);
        }

        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(err)) => {
                    warn!(error = %err, "websocket receive failed");
                    self.finish();
                    return Some(TransportEvent::Error(err.to_string()));
                }
                None => {
                    self.finish();
                    return Some(TransportEvent::Closed {
                        code: ABNORMAL_CLOSURE,
                        reason: String::new(),
                    });
                }
            };

            match message {
                WsMessage::Text(text) => return Some(TransportEvent::Unit(Unit::Text(text))),
                WsMessage::Binary(bytes) => {
                    return Some(TransportEvent::Unit(Unit::Binary(Bytes::from(bytes))))
                }
                WsMessage::Ping(data) => {
                    debug!(len = data.len(), "websocket ping");
                }
                WsMessage::Pong(_) => {
                    debug!("websocket pong");
                }
                WsMessage::Close(frame) => {
                    let (code, reason) = match frame {
                        Some(frame) => (u16::from(frame.code), frame.reason.into_owned()),
                        None => (ABNORMAL_CLOSURE, String::new()),
                    };
                    info!(code, %reason, "websocket closed by peer");
                    self.finish();
                    return Some(TransportEvent::Closed { code, reason });
                }
                WsMessage::Frame(_) => {
                    return Some(TransportEvent::Unit(Unit::Unsupported {
                        kind: "raw-frame".to_string(),
                    }))
                }
            }
        }
    }

    /// Current shared connection state.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Wait for the writer task to flush and exit.
    ///
    /// The writer exits once every [`ChannelTransport`] clone is dropped, after
    /// sending a close frame.
    pub async fn join_writer(&mut self) {
        if let Some(writer) = self.writer.take() {
            if let Err(err) = writer.await {
                warn!(error = %err, "websocket writer task failed");
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.state.store(ConnectionState::Closed.to_u8(), Ordering::SeqCst);
    }
}

async fn write_loop<S>(
    mut sink: SplitSink<WebSocketStream<S>, WsMessage>,
    mut outbound: OutboundReceiver,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    while let Some(unit) = outbound.recv().await {
        let message = match unit {
            Unit::Text(text) => WsMessage::Text(text),
            Unit::Binary(bytes) => WsMessage::Binary(bytes.to_vec()),
            Unit::Unsupported { kind } => {
                warn!(%kind, "refusing to send unsupported unit kind");
                continue;
            }
        };
        if let Err(err) = sink.send(message).await {
            debug!(error = %err, "websocket send failed");
            outbound.set_state(ConnectionState::Closed);
            return;
        }
    }

    if outbound.state() == ConnectionState::Open {
        outbound.set_state(ConnectionState::Closing);
    }
    if let Err(err) = sink.close().await {
        debug!(error = %err, "websocket close failed");
    }
}
