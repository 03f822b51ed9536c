use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::error::Result;

/// An open serial device. Implements `Read` and `Write`.
///
/// Reads return `ErrorKind::TimedOut` once the configured read timeout
/// elapses with no data. Dropping the stream releases the device handle.
pub struct SerialStream {
    inner: Box<dyn SerialPort>,
    path: String,
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl SerialStream {
    pub(crate) fn from_port(inner: Box<dyn SerialPort>, path: String) -> Self {
        Self { inner, path }
    }

    /// Device path this stream was opened from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Set the read timeout on the underlying device.
    pub fn set_read_timeout(&mut self, timeout: Duration) -> Result<()> {
        Ok(self.inner.set_timeout(timeout)?)
    }

    /// Discard anything pending in the input and output buffers.
    pub fn clear(&self) -> Result<()> {
        Ok(self.inner.clear(serialport::ClearBuffer::All)?)
    }

    /// Try to clone this stream (creates a new device handle).
    ///
    /// The clone shares the device, so one half can read while the other
    /// writes.
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.inner.try_clone()?;
        Ok(Self::from_port(cloned, self.path.clone()))
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("path", &self.path)
            .field("read_timeout", &self.inner.timeout())
            .finish()
    }
}
