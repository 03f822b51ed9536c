//! Send a "HELLO" frame under identifier 0x35E, then two raw-byte frames.
//!
//! Run with:
//!   cargo run --example send-hello -- /dev/ttyUSB0
//!
//! On a second adapter:
//!   cargo run --features cli -- listen /dev/ttyUSB1 --count 3

use canlink::link::open_path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_string());

    let link = open_path(port)?;
    eprintln!("Opened {}", link.label());

    link.send(0x35E, b"HELLO")?;
    link.send(0x005, [0x01u8, 0x02, 0x03])?;
    link.send(0x003, b"\x11\x22\x33\x44\x55")?;

    link.close();
    Ok(())
}
