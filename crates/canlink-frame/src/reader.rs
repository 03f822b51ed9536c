use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use canlink_transport::ReadTimeout;

use crate::codec::{decode_frame, CanFrame, WIRE_SIZE};
use crate::error::{FrameError, Result};

const READ_CHUNK_SIZE: usize = 64;

/// Reads complete frames from any `Read` stream.
///
/// Bytes are pulled in small chunks and fed to the decoder one at a time.
/// Read timeouts (`TimedOut`, `WouldBlock`) and `Interrupted` are retried
/// indefinitely, so [`read_frame`](Self::read_frame) blocks until a frame
/// arrives, the stream fails, or the shutdown flag is raised.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    shutdown: Option<Arc<AtomicBool>>,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(4 * WIRE_SIZE),
            shutdown: None,
        }
    }

    /// Abort blocked reads with [`FrameError::Cancelled`] once `flag` is set.
    ///
    /// The flag is checked before every transport read, including between
    /// the bytes of a partially received frame.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = Some(flag);
        self
    }

    /// Read the next complete frame (blocking).
    ///
    /// Framing errors leave the reader usable; call again to resume
    /// scanning from the byte after the one that failed validation.
    pub fn read_frame(&mut self) -> Result<CanFrame> {
        let Self {
            inner,
            buf,
            shutdown,
        } = self;
        let shutdown = shutdown.as_deref();

        loop {
            if let Some(frame) = decode_frame(|| next_byte(inner, buf, shutdown).map(Some))? {
                return Ok(frame);
            }
        }
    }

    /// Bytes received from the stream but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + ReadTimeout> FrameReader<T> {
    /// Create a frame reader and bound each transport read by
    /// `read_timeout`, which caps how long a shutdown request can go unseen.
    pub fn with_read_timeout(mut inner: T, read_timeout: Duration) -> Result<Self> {
        inner.apply_read_timeout(read_timeout)?;
        Ok(Self::new(inner))
    }
}

fn next_byte<T: Read>(
    inner: &mut T,
    buf: &mut BytesMut,
    shutdown: Option<&AtomicBool>,
) -> Result<u8> {
    loop {
        if shutdown.is_some_and(|flag| flag.load(Ordering::Acquire)) {
            return Err(FrameError::Cancelled);
        }
        if buf.has_remaining() {
            return Ok(buf.get_u8());
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        match inner.read(&mut chunk) {
            Ok(0) => return Err(FrameError::ConnectionClosed),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
                ) =>
            {
                continue
            }
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
}
