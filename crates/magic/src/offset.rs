//! Indirect offsets: a rule whose position is read out of the buffer itself.

use sniff_core::prelude::*;

use crate::endian::{converter_for, EndianConverter};
use crate::types::number::sign_extend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decode {
    Number { signed: bool },
    Id3,
}

/// Computes a rule's offset by decoding an integer stored in the buffer and adding an adjustment,
/// like the `(0x3c.l+4)` offsets of magic(5).
#[derive(Debug, Clone, Copy)]
pub struct OffsetResolver {
    offset: usize,
    converter: &'static dyn EndianConverter,
    decode: Decode,
    size: usize,
    adjustment: i32,
}

impl OffsetResolver {
    /// Reads a `size`-byte integer at `offset` in the given byte order.
    #[must_use]
    pub fn number(offset: usize, endian: Endian, size: usize, signed: bool, adjustment: i32) -> Self {
        Self { offset, converter: converter_for(endian), decode: Decode::Number { signed }, size, adjustment }
    }

    /// Reads a `size`-byte ID3 synchsafe integer at `offset`.
    #[must_use]
    pub fn id3(offset: usize, endian: Endian, size: usize, adjustment: i32) -> Self {
        Self { offset, converter: converter_for(endian), decode: Decode::Id3, size, adjustment }
    }

    /// Returns the resolved offset, truncated to 32 bits, or `None` if the integer can't be read.
    pub fn resolve(&self, data: &[u8]) -> Option<i32> {
        let decoded = match self.decode {
            Decode::Number { signed } => {
                let raw = self.converter.convert_number(self.offset, data, self.size)?;
                match signed {
                    true => sign_extend(raw, self.size),
                    false => raw as i64,
                }
            }
            Decode::Id3 => self.converter.convert_id3(self.offset, data, self.size)? as i64,
        };
        Some(decoded.wrapping_add(i64::from(self.adjustment)) as i32)
    }
}

impl core::fmt::Display for OffsetResolver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let kind = match self.decode {
            Decode::Number { .. } => "",
            Decode::Id3 => "id3 ",
        };
        write!(f, "({kind}{:#x}/{}{:+})", self.offset, self.size, self.adjustment)
    }
}
