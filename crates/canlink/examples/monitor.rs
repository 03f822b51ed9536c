//! Print every frame seen on an adapter as raw wire hex plus its identifier.
//!
//! Run with:
//!   cargo run --example monitor -- /dev/ttyUSB0

use canlink::frame::CanFrame;
use canlink::link::open_path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let link = open_path(port)?;
    eprintln!("Listening on {}", link.label());

    // Ends when the transport fails; the error is kept on the link.
    let frames = link.subscribe()?;
    for frame in frames {
        println!("{}  id=0x{:03X}", wire_hex(&frame), frame.id());
    }

    if let Some(err) = link.take_loop_error() {
        eprintln!("Receive loop stopped: {err}");
    }
    Ok(())
}

fn wire_hex(frame: &CanFrame) -> String {
    frame
        .to_wire()
        .as_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
