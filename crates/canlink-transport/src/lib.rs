//! Serial transport for USB-to-CAN adapters.
//!
//! This is the lowest layer of canlink. It opens a named serial device with
//! the line settings the adapter expects and hands back a [`SerialStream`]
//! that implements `Read + Write`. Reads are bounded by the configured
//! timeout, so a silent device yields `ErrorKind::TimedOut` instead of
//! blocking forever.

pub mod config;
pub mod error;
pub mod serial;
pub mod stream;
pub mod timeout;

pub use config::{SerialConfig, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
pub use error::{Result, TransportError};
pub use serial::{available_ports, open, PortInfo};
pub use stream::SerialStream;
pub use timeout::ReadTimeout;
