use std::io;
use std::time::Duration;

use crate::error::TransportError;
use crate::stream::SerialStream;

/// Streams whose blocking reads can be bounded.
///
/// Frame readers rely on reads returning periodically (with `TimedOut` or
/// `WouldBlock`) so a shutdown request is seen even when the peer is silent.
pub trait ReadTimeout {
    /// Bound every subsequent read by `timeout`. A zero timeout is rejected.
    fn apply_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

impl ReadTimeout for SerialStream {
    fn apply_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        check_nonzero(timeout)?;
        self.set_read_timeout(timeout).map_err(|err| match err {
            TransportError::Io(err) => err,
            TransportError::Open { source, .. } | TransportError::Serial(source) => source.into(),
        })
    }
}

#[cfg(unix)]
impl ReadTimeout for std::os::unix::net::UnixStream {
    fn apply_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        check_nonzero(timeout)?;
        self.set_read_timeout(Some(timeout))
    }
}

impl ReadTimeout for std::net::TcpStream {
    fn apply_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        check_nonzero(timeout)?;
        self.set_read_timeout(Some(timeout))
    }
}

fn check_nonzero(timeout: Duration) -> io::Result<()> {
    if timeout.is_zero() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "read timeout must be greater than zero",
        ));
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Read;
    use std::os::unix::net::UnixStream;
    use std::time::Instant;

    use super::*;

    #[test]
    fn unix_stream_read_is_bounded() {
        let (_peer, mut stream) = UnixStream::pair().unwrap();
        stream
            .apply_read_timeout(Duration::from_millis(20))
            .unwrap();

        let started = Instant::now();
        let mut buf = [0u8; 1];
        let err = stream.read(&mut buf).unwrap_err();

        assert!(matches!(
            err.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        ));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let (_peer, mut stream) = UnixStream::pair().unwrap();
        let err = stream.apply_read_timeout(Duration::ZERO).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
