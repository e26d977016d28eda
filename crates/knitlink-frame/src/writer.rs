use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, FrameConfig};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Blocking SLIP frame writer.
///
/// Each [`send`](Self::send) encodes into a reused buffer and writes the
/// whole frame before flushing, so a frame is never interleaved with another.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    max_payload_size: usize,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_payload_size: config.max_payload_size,
        }
    }

    /// Frame `payload` and write it out.
    ///
    /// Payloads over the configured limit are rejected before anything is
    /// written. A writer that accepts zero bytes counts as closed.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        if payload.len() > self.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(payload, &mut self.buf);
        write_fully(&mut self.inner, &self.buf)?;
        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        retry_interrupted(|| self.inner.flush())
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

fn write_fully<T: Write>(inner: &mut T, mut data: &[u8]) -> Result<()> {
    while !data.is_empty() {
        let written = retry_interrupted(|| inner.write(data))?;
        if written == 0 {
            return Err(FrameError::ConnectionClosed);
        }
        data = &data[written..];
    }
    Ok(())
}

fn retry_interrupted<R>(mut op: impl FnMut() -> std::io::Result<R>) -> Result<R> {
    loop {
        match op() {
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            other => return other.map_err(FrameError::Io),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::decode_all;
    use crate::reader::FrameReader;
    use crate::slip::{END, ESC, ESC_END};

    #[test]
    fn request_info_on_the_wire() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.send(&[0x03]).unwrap();
        writer.send(&[END]).unwrap();

        assert_eq!(
            writer.into_inner(),
            vec![END, 0x03, END, END, ESC, ESC_END, END]
        );
    }

    #[test]
    fn consecutive_sends_decode_separately() {
        let mut writer = FrameWriter::new(Vec::new());
        writer.send(&[0x84, 0x01]).unwrap();
        writer.send(&[0xC3]).unwrap();

        let frames = decode_all(writer.get_ref());
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].as_ref(), &[0xC3]);
    }

    #[test]
    fn oversize_payload_writes_nothing() {
        let config = FrameConfig {
            max_payload_size: 4,
        };
        let mut writer = FrameWriter::with_config(Vec::new(), config);

        let err = writer.send(&[0u8; 9]).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 4 }));
        assert!(writer.get_ref().is_empty());
    }

    #[test]
    fn short_and_interrupted_writes_complete_the_frame() {
        let mut writer = FrameWriter::new(Stuttering::default());
        writer.send(&[0xC3, 0x01, ESC]).unwrap();

        let sink = writer.into_inner();
        assert!(sink.flushed);
        let mut reader = FrameReader::new(Cursor::new(sink.data));
        assert_eq!(reader.read_frame().unwrap().as_ref(), &[0xC3, 0x01, ESC]);
    }

    #[test]
    fn zero_length_write_is_closed() {
        let mut writer = FrameWriter::new(Closed);
        assert!(matches!(
            writer.send(&[0x03]),
            Err(FrameError::ConnectionClosed)
        ));
    }

    /// Accepts two bytes per call and fails every other call with `Interrupted`.
    #[derive(Default)]
    struct Stuttering {
        data: Vec<u8>,
        calls: usize,
        flushed: bool,
    }

    impl Write for Stuttering {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            if self.calls % 2 == 1 {
                return Err(ErrorKind::Interrupted.into());
            }
            let len = buf.len().min(2);
            self.data.extend_from_slice(&buf[..len]);
            Ok(len)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed = true;
            Ok(())
        }
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
