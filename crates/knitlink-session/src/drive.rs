use knitlink_transport::{Transport, WsReceiver, ABNORMAL_CLOSURE};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::session::{CloseInfo, Session};

impl<T: Transport> Session<T> {
    /// Pump events from `receiver` into this session until the connection ends.
    ///
    /// Handlers registered on the session see every unit as it arrives. A
    /// transport error ends the loop with [`SessionError::ConnectionLost`].
    ///
    /// [`SessionError::ConnectionLost`]: crate::SessionError::ConnectionLost
    pub async fn drive<S>(&mut self, receiver: &mut WsReceiver<S>) -> Result<CloseInfo>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        while let Some(event) = receiver.next_event().await {
            if let (_, Some(close)) = self.handle_event(event)? {
                return Ok(close);
            }
        }

        self.on_close(ABNORMAL_CLOSURE, "");
        Ok(CloseInfo {
            code: ABNORMAL_CLOSURE,
            reason: String::new(),
        })
    }
}
