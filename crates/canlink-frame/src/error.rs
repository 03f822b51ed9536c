/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The byte after the start sentinel is not the CAN data command.
    #[error("invalid command byte 0x{0:02X} (expected 0xC8)")]
    InvalidCommand(u8),

    /// The byte after the payload is not the end sentinel.
    #[error("invalid tail byte 0x{0:02X} (expected 0x55)")]
    InvalidTail(u8),

    /// A finite byte source ran out after the start sentinel.
    #[error("byte source ended mid-frame")]
    Truncated,

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream reported end-of-file.
    #[error("connection closed")]
    ConnectionClosed,

    /// The reader's shutdown flag was raised while waiting for bytes.
    #[error("read cancelled")]
    Cancelled,
}

impl FrameError {
    /// Malformed wire data. The stream is still usable: the next decode
    /// resumes scanning for a start sentinel.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            FrameError::InvalidCommand(_) | FrameError::InvalidTail(_)
        )
    }
}

/// Errors raised while normalizing caller input into an 8-byte payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// Text payloads must be ASCII.
    #[error("non-ASCII character {ch:?} at byte {index}")]
    NonAscii { index: usize, ch: char },

    /// Integer payload elements must fit in a byte.
    #[error("value {value} at index {index} is outside 0..=255")]
    ValueOutOfRange { index: usize, value: i64 },

    /// A hex token could not be parsed as a byte.
    #[error("invalid hex byte {token:?}")]
    InvalidHex { token: String },
}

pub type Result<T> = std::result::Result<T, FrameError>;
