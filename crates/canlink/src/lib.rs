//! Drive USB-to-CAN serial adapters.
//!
//! canlink speaks the fixed 13-byte sentinel framing used by USB-CAN-A
//! style adapters: open the adapter's serial port, send standard-id CAN
//! frames, and receive them one at a time or from a background loop.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial device access (open, configure, enumerate)
//! - [`frame`]: wire codec, payload normalization, stream reader/writer
//! - [`link`]: session with send, receive, and receive loop (behind `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use canlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use canlink_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use canlink_link::*;
}
