use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, FrameConfig, SlipDecoder};
use crate::error::FrameError;

/// `tokio_util` codec adapter around [`SlipDecoder`] / [`encode_frame`].
///
/// Input bytes are moved into the decoder state as they arrive, so a stream
/// that ends mid-frame finishes cleanly and the partial frame is dropped.
#[derive(Debug, Default)]
pub struct SlipCodec {
    decoder: SlipDecoder,
}

impl SlipCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: FrameConfig) -> Self {
        Self {
            decoder: SlipDecoder::with_config(config),
        }
    }

    /// Borrow the streaming decoder state.
    pub fn decoder(&mut self) -> &mut SlipDecoder {
        &mut self.decoder
    }
}

impl Decoder for SlipCodec {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while src.has_remaining() {
            let byte = src.get_u8();
            if let Some(frame) = self.decoder.push_byte(byte) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}

impl Encoder<Bytes> for SlipCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        Encoder::<&[u8]>::encode(self, item.as_ref(), dst)
    }
}

impl Encoder<&[u8]> for SlipCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &[u8], dst: &mut BytesMut) -> Result<(), Self::Error> {
        let max = self.decoder.config().max_payload_size;
        if item.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: item.len(),
                max,
            });
        }
        encode_frame(item, dst);
        Ok(())
    }
}
