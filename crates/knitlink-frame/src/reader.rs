use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use bytes::Bytes;

use crate::codec::{FrameConfig, SlipDecoder};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Reads complete SLIP payloads from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete payloads.
/// Protocol violations do not surface as errors, they stay on the
/// decoder (see [`SlipDecoder::take_violations`]).
pub struct FrameReader<T> {
    inner: T,
    decoder: SlipDecoder,
    ready: VecDeque<Bytes>,
}

impl<T: Read> FrameReader<T> {
    /// Reader with the default payload limit, [`DEFAULT_MAX_PAYLOAD`](crate::DEFAULT_MAX_PAYLOAD).
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            decoder: SlipDecoder::with_config(config),
            ready: VecDeque::new(),
        }
    }

    /// Block until the next payload is complete.
    ///
    /// End of input yields [`FrameError::ConnectionClosed`]. Bytes of an
    /// unterminated frame stay in the decoder, see [`SlipDecoder::pending_len`].
    pub fn read_frame(&mut self) -> Result<Bytes> {
        loop {
            if let Some(frame) = self.ready.pop_front() {
                return Ok(frame);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.ready.extend(self.decoder.decode(&chunk[..read]));
        }
    }

    /// Borrow the streaming decoder (pending bytes, violations).
    pub fn decoder(&mut self) -> &mut SlipDecoder {
        &mut self.decoder
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Bytes>;

    /// Yields payloads until a clean end of stream.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_frame() {
            Ok(frame) => Some(Ok(frame)),
            Err(FrameError::ConnectionClosed) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;
    use crate::slip::{END, ESC};

    #[test]
    fn reads_request_info_frame() {
        let mut reader = FrameReader::new(Cursor::new(vec![END, 0x03, END]));
        assert_eq!(reader.read_frame().unwrap().as_ref(), &[0x03]);
        assert!(reader.next().is_none());
    }

    #[test]
    fn iterator_yields_frames_in_order() {
        let mut wire = BytesMut::new();
        for tag in [0x84u8, 0xC3, 0x7F] {
            encode_frame(&[tag, 0x00], &mut wire);
        }

        let tags: Vec<u8> = FrameReader::new(Cursor::new(wire.to_vec()))
            .map(|frame| frame.unwrap()[0])
            .collect();
        assert_eq!(tags, vec![0x84, 0xC3, 0x7F]);
    }

    #[test]
    fn escaped_frame_arriving_byte_by_byte() {
        let mut wire = BytesMut::new();
        encode_frame(&[0x84, END, ESC, 0x01], &mut wire);

        let mut reader = FrameReader::new(OneByteAtATime(Cursor::new(wire.to_vec())));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.as_ref(), &[0x84, END, ESC, 0x01]);
    }

    #[test]
    fn empty_input_is_closed() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut reader = FrameReader::new(Cursor::new(vec![END, 0x84, 0x00]));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert_eq!(reader.decoder().pending_len(), 2);
    }

    #[test]
    fn violation_does_not_stop_stream() {
        let mut wire = vec![END, 0x01, ESC, 0x00, END];
        let mut good = BytesMut::new();
        encode_frame(b"after", &mut good);
        wire.extend_from_slice(&good);

        let mut reader = FrameReader::new(Cursor::new(wire));
        let frame = reader.read_frame().unwrap();
        assert_eq!(frame.as_ref(), b"after");
        assert_eq!(reader.decoder().take_violations().len(), 1);
    }

    #[test]
    fn interrupted_read_retries() {
        let source = Flaky {
            errors: vec![ErrorKind::Interrupted],
            inner: Cursor::new(vec![END, 0x7F, END]),
        };
        let mut reader = FrameReader::new(source);
        assert_eq!(reader.read_frame().unwrap().as_ref(), &[0x7F]);
    }

    #[test]
    fn other_io_errors_surface() {
        let source = Flaky {
            errors: vec![ErrorKind::WouldBlock],
            inner: Cursor::new(Vec::new()),
        };
        let mut reader = FrameReader::new(source);
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::Io(err)) if err.kind() == ErrorKind::WouldBlock
        ));
    }

    struct OneByteAtATime<R>(R);

    impl<R: Read> Read for OneByteAtATime<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(1);
            self.0.read(&mut buf[..len])
        }
    }

    /// Fails with each queued error kind once, then reads from `inner`.
    struct Flaky<R> {
        errors: Vec<ErrorKind>,
        inner: R,
    }

    impl<R: Read> Read for Flaky<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.errors.pop() {
                Some(kind) => Err(kind.into()),
                None => self.inner.read(buf),
            }
        }
    }
}
