//! Sentinel-delimited CAN frame codec for USB-to-CAN serial adapters.
//!
//! Every standard-id CAN frame travels as a fixed 13-byte record:
//! - `0xAA` start sentinel and `0xC8` command byte
//! - the 11-bit identifier, little-endian in two bytes
//! - exactly 8 payload bytes (zero-padded or truncated)
//! - `0x55` end sentinel
//!
//! Decoding scans for the start sentinel, so a reader that joins mid-stream
//! or hits line noise resynchronizes on the next frame by itself.

pub mod codec;
pub mod error;
pub mod payload;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_buf, decode_frame, encode_frame, CanFrame, WireFrame, COMMAND, END, ID_MASK,
    PAYLOAD_SIZE, START, WIRE_SIZE,
};
pub use error::{FrameError, PayloadError, Result};
pub use payload::Payload;
pub use reader::FrameReader;
pub use writer::FrameWriter;
