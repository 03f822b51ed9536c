use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, CanFrame, WIRE_SIZE};
use crate::error::{FrameError, Result};
use crate::payload::Payload;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(WIRE_SIZE),
        }
    }

    /// Write a complete frame (blocking).
    ///
    /// All 13 wire bytes are written before this returns; a short write is
    /// continued, never abandoned mid-frame.
    pub fn write_frame(&mut self, frame: &CanFrame) -> Result<()> {
        self.buf.clear();
        encode_frame(frame, &mut self.buf);

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Encode and send a payload under `id`.
    pub fn send(&mut self, id: u32, payload: impl Into<Payload>) -> Result<()> {
        self.write_frame(&CanFrame::new(id, payload))
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::decode_buf;

    #[test]
    fn write_hello_frame() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(0x35E, b"HELLO").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(
            wire,
            [0xAA, 0xC8, 0x5E, 0x03, 0x48, 0x45, 0x4C, 0x4C, 0x4F, 0x00, 0x00, 0x00, 0x55]
        );
    }

    #[test]
    fn write_multiple_frames() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(0x005, [0x01u8, 0x02, 0x03]).unwrap();
        writer.send(0x003, b"\x11\x22\x33\x44\x55").unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire.len(), 2 * WIRE_SIZE);

        let mut src = wire.as_slice();
        let f1 = decode_buf(&mut src).unwrap().unwrap();
        let f2 = decode_buf(&mut src).unwrap().unwrap();
        assert_eq!((f1.id(), &f1.data()[..3]), (0x005, [1u8, 2, 3].as_ref()));
        assert_eq!(
            (f2.id(), &f2.data()[..5]),
            (0x003, [0x11u8, 0x22, 0x33, 0x44, 0x55].as_ref())
        );
    }

    #[test]
    fn write_frame_uses_frame_fields() {
        let frame = CanFrame::new(0x7FF, [0xFFu8; 8]);
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_frame(&frame).unwrap();

        let wire = writer.into_inner().into_inner();
        assert_eq!(wire, frame.to_wire().as_bytes().to_vec());
    }

    #[test]
    fn partial_writes_are_completed() {
        let mut writer = FrameWriter::new(OneByteWriter::default());
        writer.send(0x100, b"chunked").unwrap();

        let inner = writer.into_inner();
        assert_eq!(inner.bytes.len(), WIRE_SIZE);
        assert!(inner.flushed);
    }

    #[test]
    fn zero_write_reports_closed() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = writer.send(1, b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn interrupted_write_retries() {
        let interrupted = Arc::new(AtomicBool::new(false));
        let mut writer = FrameWriter::new(InterruptOnceWriter {
            interrupted: Arc::clone(&interrupted),
            bytes: Vec::new(),
        });
        writer.send(2, b"retry").unwrap();

        assert!(interrupted.load(Ordering::SeqCst));
        assert_eq!(writer.get_ref().bytes.len(), WIRE_SIZE);
    }

    #[test]
    fn broken_pipe_propagates() {
        let mut writer = FrameWriter::new(BrokenWriter);
        let err = writer.send(3, b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[derive(Default)]
    struct OneByteWriter {
        bytes: Vec<u8>,
        flushed: bool,
    }

    impl Write for OneByteWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            self.bytes.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed = true;
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct InterruptOnceWriter {
        interrupted: Arc<AtomicBool>,
        bytes: Vec<u8>,
    }

    impl Write for InterruptOnceWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted.swap(true, Ordering::SeqCst) {
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.bytes.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
