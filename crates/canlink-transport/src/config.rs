use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};

/// Line rate used by the USB-CAN-A class of adapters.
pub const DEFAULT_BAUD_RATE: u32 = 2_000_000;

/// Default bound on a single transport read.
///
/// This is also the worst-case latency for cancelling a blocked receive.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Settings for opening a serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyUSB0` or `COM8`.
    pub path: String,
    /// Line rate in baud. Default: 2 000 000.
    pub baud_rate: u32,
    /// Upper bound on a single read. Default: 100 ms.
    pub read_timeout: Duration,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
}

impl SerialConfig {
    /// 8N1 settings at the default baud rate for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
        }
    }

    /// Override the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the read timeout.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}
