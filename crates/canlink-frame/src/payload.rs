use tracing::trace;

use crate::codec::PAYLOAD_SIZE;
use crate::error::PayloadError;

/// A normalized 8-byte CAN payload.
///
/// Every constructor pads short input with zeros and silently truncates
/// anything past the eighth byte, so a `Payload` is always wire-ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Payload([u8; PAYLOAD_SIZE]);

impl Payload {
    /// Raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() > PAYLOAD_SIZE {
            trace!(len = bytes.len(), "truncating payload to 8 bytes");
        }
        let mut data = [0u8; PAYLOAD_SIZE];
        let n = bytes.len().min(PAYLOAD_SIZE);
        data[..n].copy_from_slice(&bytes[..n]);
        Self(data)
    }

    /// ASCII text, one byte per character.
    pub fn from_text(text: &str) -> Result<Self, PayloadError> {
        if let Some((index, ch)) = text.char_indices().find(|(_, ch)| !ch.is_ascii()) {
            return Err(PayloadError::NonAscii { index, ch });
        }
        Ok(Self::from_bytes(text.as_bytes()))
    }

    /// Small integers, each of which must fit in a byte.
    pub fn from_values<T>(values: &[T]) -> Result<Self, PayloadError>
    where
        T: Copy + Into<i64>,
    {
        let bytes = values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let value: i64 = (*value).into();
                u8::try_from(value).map_err(|_| PayloadError::ValueOutOfRange { index, value })
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Hex bytes, either separated (`"01 02 ff"`, `"01:02:ff"`, `"01,02"`)
    /// or packed (`"0102ff"`).
    pub fn from_hex(text: &str) -> Result<Self, PayloadError> {
        let mut bytes = Vec::with_capacity(PAYLOAD_SIZE);
        for token in text
            .split(|c: char| c.is_whitespace() || c == ':' || c == ',')
            .filter(|token| !token.is_empty())
        {
            let token = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            let invalid = || PayloadError::InvalidHex {
                token: token.to_string(),
            };
            // from_str_radix alone would accept a leading sign.
            if token.len() % 2 != 0 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(invalid());
            }
            for pair in token.as_bytes().chunks(2) {
                let pair = std::str::from_utf8(pair).map_err(|_| invalid())?;
                bytes.push(u8::from_str_radix(pair, 16).map_err(|_| invalid())?);
            }
        }
        Ok(Self::from_bytes(&bytes))
    }

    pub fn as_bytes(&self) -> &[u8; PAYLOAD_SIZE] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; PAYLOAD_SIZE] {
        self.0
    }
}

impl From<&[u8]> for Payload {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl<const N: usize> From<[u8; N]> for Payload {
    fn from(bytes: [u8; N]) -> Self {
        Self::from_bytes(&bytes)
    }
}

impl<const N: usize> From<&[u8; N]> for Payload {
    fn from(bytes: &[u8; N]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(&bytes)
    }
}

impl TryFrom<&str> for Payload {
    type Error = PayloadError;

    fn try_from(text: &str) -> Result<Self, Self::Error> {
        Self::from_text(text)
    }
}
