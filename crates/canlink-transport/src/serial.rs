use serialport::SerialPortType;
use tracing::{debug, info};

use crate::config::SerialConfig;
use crate::error::{Result, TransportError};
use crate::stream::SerialStream;

/// Open the serial device described by `config` (blocking).
pub fn open(config: &SerialConfig) -> Result<SerialStream> {
    let port = serialport::new(config.path.as_str(), config.baud_rate)
        .data_bits(config.data_bits)
        .parity(config.parity)
        .stop_bits(config.stop_bits)
        .flow_control(config.flow_control)
        .timeout(config.read_timeout)
        .open()
        .map_err(|source| TransportError::Open {
            path: config.path.clone(),
            source,
        })?;

    info!(
        path = %config.path,
        baud = config.baud_rate,
        "opened serial device"
    );
    Ok(SerialStream::from_port(port, config.path.clone()))
}

/// A serial device visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Device path, usable as [`SerialConfig::path`].
    pub name: String,
    /// Short transport label: `usb`, `pci`, `bluetooth` or `unknown`.
    pub kind: &'static str,
    /// USB vendor/product id, when the device is a USB adapter.
    pub usb_id: Option<(u16, u16)>,
    /// USB product string, when the driver reports one.
    pub product: Option<String>,
}

/// Enumerate serial devices on this host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    debug!(count = ports.len(), "enumerated serial ports");

    Ok(ports
        .into_iter()
        .map(|port| {
            let (kind, usb_id, product) = match port.port_type {
                SerialPortType::UsbPort(usb) => ("usb", Some((usb.vid, usb.pid)), usb.product),
                SerialPortType::PciPort => ("pci", None, None),
                SerialPortType::BluetoothPort => ("bluetooth", None, None),
                SerialPortType::Unknown => ("unknown", None, None),
            };
            PortInfo {
                name: port.port_name,
                kind,
                usb_id,
                product,
            }
        })
        .collect())
}
