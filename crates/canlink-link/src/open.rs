use canlink_transport::{SerialConfig, SerialStream};
use tracing::debug;

use crate::error::{LinkError, Result};
use crate::link::Link;

/// Open a link on the serial device at `path` with default 8N1 settings
/// at 2 Mbaud.
pub fn open_path(path: impl Into<String>) -> Result<Link<SerialStream>> {
    open(&SerialConfig::new(path))
}

/// Open a link with explicit serial settings.
///
/// Bytes the adapter buffered before the port was opened are discarded so
/// decoding starts on a frame boundary. The device handle is cloned so the
/// receive side can block on reads while sends go out on the other handle.
/// Both are released when the link is closed or dropped.
pub fn open(config: &SerialConfig) -> Result<Link<SerialStream>> {
    let stream = canlink_transport::open(config).map_err(LinkError::TransportUnavailable)?;
    stream.clear().map_err(LinkError::TransportUnavailable)?;
    debug!(path = %config.path, "discarded stale adapter buffers");

    let reader_stream = stream
        .try_clone()
        .map_err(LinkError::TransportUnavailable)?;
    Link::from_parts(config.path.clone(), reader_stream, stream, config.read_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_device_is_unavailable() {
        let err = open_path(format!("/dev/canlink-missing-{}", std::process::id())).unwrap_err();
        assert!(matches!(err, LinkError::TransportUnavailable(_)));
        assert!(!err.is_recoverable());
    }
}
