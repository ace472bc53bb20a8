//! Byte layout of an encoded graph.
//!
//! ```text
//! stream        := START VERSION version_string
//!                  { object_record | link_record | root_record }
//!                  END
//! object_record := OBJECT_BEGIN identity class_name [ payload ] OBJECT_END
//! link_record   := LINK_BEGIN owner_identity field_name referenced_identity LINK_END
//! root_record   := ROOT_BEGIN identity ROOT_END
//! string        := u64 length (terminator included), bytes, 0
//! payload       := u64 byte count, bytes (value wrappers only)
//! ```
//!
//! Integers are little-endian and identities are u64.

use byteorder::{ByteOrder, LittleEndian};
use graphcodec_structures::{CodecError, CodecResult};
use std::fmt::{Display, Formatter};

/// Pass-local identity of an object inside a stream
pub type ObjectIndex = u64;

const U64_BYTE_COUNT: usize = 8;

//region Marker

/// Single-byte record boundaries.
///
/// # Example
/// ```
/// use graphcodec_serialization::Marker;
///
/// assert_eq!(Marker::Start as u8, 0xA0);
/// assert_eq!(Marker::from_byte(0xB0), Some(Marker::ObjectBegin));
/// assert_eq!(Marker::from_byte(0x00), None);
/// ```
#[repr(u8)]
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum Marker {
    Start = 0xA0,
    End = 0xA1,
    Version = 0xA2,
    ObjectBegin = 0xB0,
    ObjectEnd = 0xB1,
    LinkBegin = 0xC0,
    LinkEnd = 0xC1,
    RootBegin = 0xD0,
    RootEnd = 0xD1,
}

impl Marker {
    pub fn from_byte(byte: u8) -> Option<Marker> {
        match byte {
            0xA0 => Some(Marker::Start),
            0xA1 => Some(Marker::End),
            0xA2 => Some(Marker::Version),
            0xB0 => Some(Marker::ObjectBegin),
            0xB1 => Some(Marker::ObjectEnd),
            0xC0 => Some(Marker::LinkBegin),
            0xC1 => Some(Marker::LinkEnd),
            0xD0 => Some(Marker::RootBegin),
            0xD1 => Some(Marker::RootEnd),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Marker::Start => "START",
            Marker::End => "END",
            Marker::Version => "VERSION",
            Marker::ObjectBegin => "OBJECT_BEGIN",
            Marker::ObjectEnd => "OBJECT_END",
            Marker::LinkBegin => "LINK_BEGIN",
            Marker::LinkEnd => "LINK_END",
            Marker::RootBegin => "ROOT_BEGIN",
            Marker::RootEnd => "ROOT_END",
        }
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

//endregion

//region Writer

/// Appends records to an in-memory buffer
#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn write_marker(&mut self, marker: Marker) {
        self.bytes.push(marker as u8);
    }

    pub(crate) fn write_u64(&mut self, value: u64) {
        let mut buffer = [0u8; U64_BYTE_COUNT];
        LittleEndian::write_u64(&mut buffer, value);
        self.bytes.extend_from_slice(&buffer);
    }

    pub(crate) fn write_identity(&mut self, identity: ObjectIndex) {
        self.write_u64(identity);
    }

    /// Length includes the trailing 0 byte
    pub(crate) fn write_string(&mut self, value: &str) {
        self.write_u64(value.len() as u64 + 1);
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.push(0);
    }

    pub(crate) fn write_payload(&mut self, payload: &[u8]) {
        self.write_u64(payload.len() as u64);
        self.bytes.extend_from_slice(payload);
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

//endregion

//region Reader

/// Bounds-checked cursor over an encoded stream
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take(&mut self, count: usize) -> CodecResult<&'a [u8]> {
        if count > self.remaining() {
            return Err(CodecError::Truncated {
                needed: count,
                position: self.position,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    pub(crate) fn read_u64(&mut self) -> CodecResult<u64> {
        Ok(LittleEndian::read_u64(self.take(U64_BYTE_COUNT)?))
    }

    pub(crate) fn read_identity(&mut self) -> CodecResult<ObjectIndex> {
        self.read_u64()
    }

    pub(crate) fn read_marker(&mut self) -> CodecResult<Marker> {
        let position = self.position;
        let byte = self.take(1)?[0];
        Marker::from_byte(byte).ok_or(CodecError::InvalidMarker {
            found: byte,
            position,
        })
    }

    pub(crate) fn expect_marker(&mut self, expected: Marker) -> CodecResult<()> {
        let position = self.position;
        let marker = self.read_marker()?;
        if marker != expected {
            return Err(CodecError::UnexpectedMarker {
                expected: expected.name(),
                found: marker as u8,
                position,
            });
        }
        Ok(())
    }

    /// Reads a length-prefixed, null-terminated UTF-8 string of at most `max_length` bytes
    /// (terminator excluded).
    pub(crate) fn read_string(&mut self, max_length: usize) -> CodecResult<String> {
        let position = self.position;
        let length = self.read_u64()?;
        if length == 0 {
            return Err(CodecError::MalformedString {
                position,
                reason: "length must include the terminator".into(),
            });
        }
        let length = usize::try_from(length)
            .ok()
            .filter(|length| length - 1 <= max_length)
            .ok_or_else(|| CodecError::MalformedString {
                position,
                reason: format!("length {} exceeds the limit of {}", length, max_length),
            })?;
        let raw = self.take(length)?;
        let (text, terminator) = raw.split_at(length - 1);
        if terminator[0] != 0 {
            return Err(CodecError::MalformedString {
                position,
                reason: "missing null terminator".into(),
            });
        }
        String::from_utf8(text.to_vec()).map_err(|err| CodecError::MalformedString {
            position,
            reason: err.to_string(),
        })
    }

    pub(crate) fn read_payload(&mut self) -> CodecResult<&'a [u8]> {
        let position = self.position;
        let length = self.read_u64()?;
        let length = usize::try_from(length).map_err(|_| CodecError::Truncated {
            needed: usize::MAX,
            position,
            available: self.remaining(),
        })?;
        self.take(length)
    }
}

//endregion
