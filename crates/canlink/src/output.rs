use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use canlink_frame::CanFrame;
use canlink_transport::PortInfo;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    event: &'a str,
    port: &'a str,
    id: u16,
    id_hex: String,
    data: [u8; 8],
    data_hex: String,
    ascii: String,
    wire: String,
    timestamp_ms: u64,
}

impl<'a> FrameOutput<'a> {
    fn new(event: &'a str, frame: &CanFrame, port: &'a str) -> Self {
        Self {
            event,
            port,
            id: frame.id(),
            id_hex: id_hex(frame.id()),
            data: *frame.data(),
            data_hex: hex_bytes(frame.data(), " "),
            ascii: ascii_preview(frame.data()),
            wire: hex_bytes(frame.to_wire().as_bytes(), " "),
            timestamp_ms: now_unix_millis(),
        }
    }
}

/// Print one frame. `event` is `"sent"` or `"received"`.
pub fn print_frame(event: &str, frame: &CanFrame, port: &str, format: OutputFormat) {
    let out = FrameOutput::new(event, frame, port);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "PORT", "ID", "DATA", "ASCII"])
                .add_row(vec![
                    out.event.to_string(),
                    out.port.to_string(),
                    out.id_hex,
                    out.data_hex,
                    out.ascii,
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} id={} data=[{}] ascii={:?} port={}",
                out.event, out.id_hex, out.data_hex, out.ascii, out.port
            );
        }
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    vid: Option<String>,
    pid: Option<String>,
    product: Option<&'a str>,
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    let rows: Vec<PortOutput<'_>> = ports
        .iter()
        .map(|port| PortOutput {
            name: &port.name,
            kind: port.kind,
            vid: port.usb_id.map(|(vid, _)| format!("{vid:04x}")),
            pid: port.usb_id.map(|(_, pid)| format!("{pid:04x}")),
            product: port.product.as_deref(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "VID:PID", "PRODUCT"]);
            for row in &rows {
                table.add_row(vec![
                    row.name.to_string(),
                    row.kind.to_string(),
                    usb_id_label(row),
                    row.product.unwrap_or("-").to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if rows.is_empty() {
                println!("no serial ports found");
            }
            for row in &rows {
                println!(
                    "{} type={} usb={} product={}",
                    row.name,
                    row.kind,
                    usb_id_label(row),
                    row.product.unwrap_or("-")
                );
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn usb_id_label(row: &PortOutput<'_>) -> String {
    match (&row.vid, &row.pid) {
        (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
        _ => "-".to_string(),
    }
}

pub fn id_hex(id: u16) -> String {
    format!("0x{id:03X}")
}

fn hex_bytes(bytes: &[u8], sep: &str) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(sep)
}

fn ascii_preview(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        })
        .collect()
}

fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
