use std::time::Duration;

use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod listen;
pub mod ports;
pub mod send;
pub mod version;

/// Largest standard (11-bit) CAN identifier.
pub const MAX_STANDARD_ID: u16 = 0x7FF;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a single frame.
    Send(SendArgs),
    /// Receive frames and print them until Ctrl-C.
    Listen(ListenArgs),
    /// List serial ports.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial settings shared by commands that open a device.
#[derive(Args, Debug)]
pub struct PortArgs {
    /// Serial device of the adapter, e.g. /dev/ttyUSB0 or COM8.
    pub port: String,
    /// Line rate in baud.
    #[arg(long, env = "CANLINK_BAUD", default_value_t = canlink_transport::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Upper bound on a single serial read (e.g. 100ms, 1s; bare numbers are
    /// milliseconds).
    #[arg(long, default_value = "100ms")]
    pub timeout: String,
}

impl PortArgs {
    pub fn serial_config(&self) -> CliResult<canlink_transport::SerialConfig> {
        Ok(canlink_transport::SerialConfig::new(&self.port)
            .with_baud_rate(self.baud)
            .with_read_timeout(parse_duration(&self.timeout)?))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Standard CAN identifier, decimal or 0x-prefixed hex (max 0x7FF).
    #[arg(long, value_parser = parse_id)]
    pub id: u16,
    /// ASCII text payload.
    #[arg(long, conflicts_with_all = ["hex", "bytes"])]
    pub data: Option<String>,
    /// Hex payload, e.g. "01 02 ff" or "0102ff".
    #[arg(long, conflicts_with_all = ["data", "bytes"])]
    pub hex: Option<String>,
    /// Comma-separated byte values, e.g. 1,2,255.
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["data", "hex"])]
    pub bytes: Option<Vec<i64>>,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub port: PortArgs,
    /// Only print these identifiers (comma-separated, decimal or 0x hex).
    #[arg(long, value_delimiter = ',', value_parser = parse_id)]
    pub ids: Option<Vec<u16>>,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a standard CAN identifier from decimal or `0x` hex.
pub fn parse_id(input: &str) -> Result<u16, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse::<u32>(),
    }
    .map_err(|_| format!("invalid identifier: {input}"))?;

    match u16::try_from(parsed) {
        Ok(id) if id <= MAX_STANDARD_ID => Ok(id),
        _ => Err(format!(
            "identifier {input} exceeds the 11-bit maximum 0x{MAX_STANDARD_ID:03X}"
        )),
    }
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "s" => Duration::from_secs(value),
        _ => Duration::from_millis(value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_decimal_and_hex() {
        assert_eq!(parse_id("862"), Ok(0x35E));
        assert_eq!(parse_id("0x35E"), Ok(0x35E));
        assert_eq!(parse_id("0X7ff"), Ok(0x7FF));
        assert_eq!(parse_id("0"), Ok(0));
    }

    #[test]
    fn parse_id_rejects_out_of_range_and_garbage() {
        assert!(parse_id("0x800").is_err());
        assert!(parse_id("2048").is_err());
        assert!(parse_id("0x1FFFFFFF").is_err());
        assert!(parse_id("-1").is_err());
        assert!(parse_id("abc").is_err());
        assert!(parse_id("").is_err());
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("50").unwrap(), Duration::from_millis(50));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert_eq!(parse_duration("0ms").unwrap_err().code, USAGE);
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration(" ").is_err());
    }
}
