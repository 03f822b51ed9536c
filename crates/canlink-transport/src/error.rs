/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: serialport::Error,
    },

    /// The serial driver rejected a settings change or handle clone.
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// An I/O error occurred on the transport stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// Whether the device itself is missing or unreachable, as opposed to a
    /// settings or I/O fault on an open handle.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TransportError::Open { .. })
    }

    /// Whether the OS refused access to the device (e.g. the user is not in
    /// the `dialout` group).
    pub fn is_permission_denied(&self) -> bool {
        match self {
            TransportError::Open { source, .. } | TransportError::Serial(source) => matches!(
                source.kind(),
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied)
            ),
            TransportError::Io(err) => err.kind() == std::io::ErrorKind::PermissionDenied,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_is_detected_on_open() {
        let err = TransportError::Open {
            path: "/dev/ttyUSB0".to_string(),
            source: serialport::Error::new(
                serialport::ErrorKind::Io(std::io::ErrorKind::PermissionDenied),
                "Permission denied",
            ),
        };
        assert!(err.is_unavailable());
        assert!(err.is_permission_denied());
    }

    #[test]
    fn missing_device_is_not_permission_denied() {
        let err = TransportError::Open {
            path: "/dev/ttyUSB9".to_string(),
            source: serialport::Error::new(serialport::ErrorKind::NoDevice, "not found"),
        };
        assert!(err.is_unavailable());
        assert!(!err.is_permission_denied());
        assert!(!TransportError::Io(std::io::Error::other("x")).is_unavailable());
    }
}
