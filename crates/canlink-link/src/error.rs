use canlink_frame::FrameError;
use canlink_transport::TransportError;

/// Errors that can occur in link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The serial device could not be opened.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(#[source] TransportError),

    /// The link was used before `open` or after `close`.
    #[error("link is not open")]
    NotOpen,

    /// Malformed bytes on the wire. The link stays open.
    #[error("framing error: {0}")]
    Framing(#[source] FrameError),

    /// The transport failed while reading or writing.
    #[error("transport I/O error: {0}")]
    TransportIo(#[source] FrameError),

    /// A receive loop is already running on this link.
    #[error("receive loop already running")]
    AlreadyRunning,

    /// The receive loop (or another caller) currently owns the reader.
    #[error("receiver busy")]
    ReceiverBusy,

    /// The background worker thread could not be started.
    #[error("failed to spawn receive worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}

impl LinkError {
    /// Whether the link is still usable after this error.
    ///
    /// Framing faults and usage errors are recoverable; transport faults
    /// are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            LinkError::Framing(_)
                | LinkError::NotOpen
                | LinkError::AlreadyRunning
                | LinkError::ReceiverBusy
        )
    }
}

impl From<FrameError> for LinkError {
    fn from(err: FrameError) -> Self {
        match err {
            err if err.is_framing() => LinkError::Framing(err),
            FrameError::Cancelled => LinkError::NotOpen,
            err => LinkError::TransportIo(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
