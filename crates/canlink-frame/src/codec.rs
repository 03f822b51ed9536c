use bytes::{Buf, BufMut, BytesMut};
use tracing::{debug, trace};

use crate::error::{FrameError, Result};
use crate::payload::Payload;

/// Start sentinel.
pub const START: u8 = 0xAA;

/// Command byte for a standard data frame (the only one defined).
pub const COMMAND: u8 = 0xC8;

/// End sentinel.
pub const END: u8 = 0x55;

/// Payload bytes carried by every frame.
pub const PAYLOAD_SIZE: usize = 8;

/// Wire size: sentinel (1) + command (1) + id (2) + payload (8) + sentinel (1).
pub const WIRE_SIZE: usize = 13;

/// Standard CAN identifiers are 11 bits wide.
pub const ID_MASK: u16 = 0x07FF;

/// A standard-id CAN frame with a fixed 8-byte payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CanFrame {
    id: u16,
    data: [u8; PAYLOAD_SIZE],
}

impl CanFrame {
    /// Create a frame. Identifier bits above the low 11 are discarded.
    pub fn new(id: u32, payload: impl Into<Payload>) -> Self {
        Self::from_parts(id as u16, payload.into().into_bytes())
    }

    fn from_parts(id: u16, data: [u8; PAYLOAD_SIZE]) -> Self {
        Self {
            id: id & ID_MASK,
            data,
        }
    }

    /// The 11-bit identifier.
    pub fn id(&self) -> u16 {
        self.id
    }

    /// The payload, always 8 bytes.
    pub fn data(&self) -> &[u8; PAYLOAD_SIZE] {
        &self.data
    }

    /// Encode into the fixed wire layout.
    pub fn to_wire(&self) -> WireFrame {
        let [low, high] = self.id.to_le_bytes();
        let mut wire = [0u8; WIRE_SIZE];
        wire[0] = START;
        wire[1] = COMMAND;
        wire[2] = low;
        wire[3] = high;
        wire[4..4 + PAYLOAD_SIZE].copy_from_slice(&self.data);
        wire[WIRE_SIZE - 1] = END;
        WireFrame(wire)
    }
}

/// The 13-byte on-the-wire form of a [`CanFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WireFrame([u8; WIRE_SIZE]);

impl WireFrame {
    pub fn as_bytes(&self) -> &[u8; WIRE_SIZE] {
        &self.0
    }
}

impl AsRef<[u8]> for WireFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<WireFrame> for [u8; WIRE_SIZE] {
    fn from(wire: WireFrame) -> Self {
        wire.0
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬─────────┬──────────┬──────────────────┬───────┐
/// │ Start │ Command │ Id       │ Payload          │ End   │
/// │ 0xAA  │ 0xC8    │ (2B LE)  │ (8B, zero-padded)│ 0x55  │
/// └───────┴─────────┴──────────┴──────────────────┴───────┘
/// ```
pub fn encode_frame(frame: &CanFrame, dst: &mut BytesMut) {
    dst.reserve(WIRE_SIZE);
    dst.put_u8(START);
    dst.put_u8(COMMAND);
    dst.put_u16_le(frame.id);
    dst.put_slice(&frame.data);
    dst.put_u8(END);
}

/// Decode one frame from a byte supplier.
///
/// `next_byte` yields `Ok(Some(byte))`, or `Ok(None)` when no more data is
/// available. Bytes before the start sentinel are discarded; running dry
/// there returns `Ok(None)` (nothing to decode yet). Running dry after the
/// sentinel is [`FrameError::Truncated`].
///
/// A bad command or tail byte aborts this attempt without rescanning. The
/// next call picks up at the following byte and will find the next start
/// sentinel on its own.
pub fn decode_frame<F>(mut next_byte: F) -> Result<Option<CanFrame>>
where
    F: FnMut() -> Result<Option<u8>>,
{
    let mut skipped = 0usize;
    loop {
        match next_byte()? {
            Some(START) => break,
            Some(_) => skipped += 1,
            None => {
                if skipped > 0 {
                    trace!(skipped, "no start sentinel in available bytes");
                }
                return Ok(None);
            }
        }
    }
    if skipped > 0 {
        debug!(skipped, "resynchronized on start sentinel");
    }

    let mut required = || -> Result<u8> { next_byte()?.ok_or(FrameError::Truncated) };

    let command = required()?;
    if command != COMMAND {
        return Err(FrameError::InvalidCommand(command));
    }

    let low = required()?;
    let high = required()?;

    let mut data = [0u8; PAYLOAD_SIZE];
    for byte in &mut data {
        *byte = required()?;
    }

    let tail = required()?;
    if tail != END {
        return Err(FrameError::InvalidTail(tail));
    }

    Ok(Some(CanFrame::from_parts(
        u16::from_le_bytes([low, high]),
        data,
    )))
}

/// Decode one frame from an in-memory buffer.
///
/// The buffer is advanced past every byte the decoder looked at, including
/// on error, so calling again continues where the last attempt stopped.
pub fn decode_buf<B: Buf>(src: &mut B) -> Result<Option<CanFrame>> {
    decode_frame(|| {
        if src.has_remaining() {
            Ok(Some(src.get_u8()))
        } else {
            Ok(None)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(id: u32, payload: &[u8]) -> Vec<u8> {
        CanFrame::new(id, payload).to_wire().as_bytes().to_vec()
    }

    #[test]
    fn test_encode_hello() {
        let frame = CanFrame::new(0x35E, b"HELLO");
        assert_eq!(
            frame.to_wire().as_bytes(),
            &[
                0xAA, 0xC8, 0x5E, 0x03, 0x48, 0x45, 0x4C, 0x4C, 0x4F, 0x00, 0x00, 0x00,
                0x55
            ]
        );
    }

    #[test]
    fn test_encode_frame_matches_to_wire() {
        let frame = CanFrame::new(0x123, [1u8, 2, 3]);
        let mut buf = BytesMut::new();
        encode_frame(&frame, &mut buf);

        assert_eq!(buf.len(), WIRE_SIZE);
        assert_eq!(&buf[..], &frame.to_wire().as_bytes()[..]);
    }

    #[test]
    fn test_encode_truncates_long_payload() {
        let bytes = wire(0x10, &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(bytes.len(), WIRE_SIZE);
        assert_eq!(&bytes[4..12], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(bytes[12], END);
    }

    #[test]
    fn test_identifier_wraps_to_11_bits() {
        let frame = CanFrame::new(0x1FFF, b"");
        assert_eq!(frame.id(), 0x7FF);
        assert_eq!(&frame.to_wire().as_bytes()[2..4], &[0xFF, 0x07]);

        assert_eq!(CanFrame::new(0x800, b"").id(), 0);
    }

    #[test]
    fn test_roundtrip_every_id_and_payload_length() {
        let source = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
        for id in 0..=ID_MASK as u32 {
            for len in 0..=PAYLOAD_SIZE {
                let bytes = wire(id, &source[..len]);
                let mut src = bytes.as_slice();
                let frame = decode_buf(&mut src).unwrap().unwrap();

                let mut expected = [0u8; PAYLOAD_SIZE];
                expected[..len].copy_from_slice(&source[..len]);
                assert_eq!(frame.id() as u32, id, "id 0x{id:03X} len {len}");
                assert_eq!(frame.data(), &expected, "id 0x{id:03X} len {len}");
                assert!(src.is_empty());
            }
        }
    }

    #[test]
    fn test_resync_skips_stray_byte() {
        let mut stream = wire(0x100, b"first");
        stream.push(0x00);
        stream.extend(wire(0x200, b"second"));

        let mut src = stream.as_slice();
        let f1 = decode_buf(&mut src).unwrap().unwrap();
        let f2 = decode_buf(&mut src).unwrap().unwrap();

        assert_eq!((f1.id(), &f1.data()[..5]), (0x100, b"first".as_ref()));
        assert_eq!((f2.id(), &f2.data()[..6]), (0x200, b"second".as_ref()));
        assert!(decode_buf(&mut src).unwrap().is_none());
    }

    #[test]
    fn test_resync_after_leading_garbage() {
        let mut stream = vec![0x01, 0x55, 0xC8, 0x7F];
        stream.extend(wire(0x42, b"x"));

        let mut src = stream.as_slice();
        let frame = decode_buf(&mut src).unwrap().unwrap();
        assert_eq!(frame.id(), 0x42);
    }

    #[test]
    fn test_invalid_command_then_recovers() {
        let mut stream = vec![START, 0x00, 0x01, 0x02];
        stream.extend(wire(0x35E, b"HELLO"));

        let mut src = stream.as_slice();
        let err = decode_buf(&mut src).unwrap_err();
        assert!(matches!(err, FrameError::InvalidCommand(0x00)));
        assert!(err.is_framing());

        let frame = decode_buf(&mut src).unwrap().unwrap();
        assert_eq!(frame.id(), 0x35E);
        assert_eq!(&frame.data()[..5], b"HELLO");
    }

    #[test]
    fn test_invalid_tail() {
        let mut bytes = wire(0x35E, b"HELLO");
        bytes[WIRE_SIZE - 1] = 0x56;

        let err = decode_buf(&mut bytes.as_slice()).unwrap_err();
        assert!(matches!(err, FrameError::InvalidTail(0x56)));
        assert!(err.is_framing());
    }

    #[test]
    fn test_empty_source_is_not_ready() {
        assert!(decode_buf(&mut &[0u8; 0][..]).unwrap().is_none());
        assert!(decode_buf(&mut &[0x00u8, 0x13, 0x37][..]).unwrap().is_none());
    }

    #[test]
    fn test_source_ending_mid_frame_is_truncated() {
        let bytes = wire(0x1, b"abc");
        let err = decode_buf(&mut &bytes[..7]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated));
        assert!(!err.is_framing());
    }

    #[test]
    fn test_decoded_high_id_bits_are_masked() {
        let mut bytes = wire(0x7FF, b"");
        bytes[3] = 0xFF;

        let frame = decode_buf(&mut bytes.as_slice()).unwrap().unwrap();
        assert_eq!(frame.id(), 0x7FF);
    }

    #[test]
    fn test_supplier_errors_propagate() {
        let mut calls = 0;
        let err = decode_frame(|| {
            calls += 1;
            if calls == 1 {
                Ok(Some(START))
            } else {
                Err(FrameError::Cancelled)
            }
        })
        .unwrap_err();
        assert!(matches!(err, FrameError::Cancelled));
    }
}
