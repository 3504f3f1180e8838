//! Byte-order converters used by matchers and indirect offsets.
//!
//! Every converter is a stateless unit struct, so a rule can hold a `&'static` reference picked once
//! when the rule is built.

use sniff_core::prelude::*;

/// Decodes integers out of a buffer in one specific byte order.
pub trait EndianConverter: core::fmt::Debug + Send + Sync {
    /// Decodes a `size`-byte unsigned integer at `offset`. Returns `None` if the buffer is too
    /// short or `size` is not supported by this byte order.
    fn convert_number(&self, offset: usize, data: &[u8], size: usize) -> Option<u64>;

    /// Decodes an ID3 synchsafe integer spread over `size` bytes at `offset`, where only the low 7
    /// bits of every byte are significant.
    fn convert_id3(&self, offset: usize, data: &[u8], size: usize) -> Option<u64>;
}

fn read_number(endian: Endian, offset: usize, data: &[u8], size: usize) -> Option<u64> {
    let mut cursor = DataCursorRef::at(data, offset, endian).ok()?;
    match cursor.read_uint(size) {
        Ok(value) => Some(value),
        Err(error) => {
            log::trace!("Unable to read {size} bytes at {offset:#X}: {error}");
            None
        }
    }
}

fn read_id3_bytes(offset: usize, data: &[u8], size: usize) -> Option<&[u8]> {
    // Nine bytes is already 63 significant bits
    if size == 0 || size > 9 {
        return None;
    }
    let end = offset.checked_add(size)?;
    data.get(offset..end)
}

#[inline]
fn fold_id3<'a>(bytes: impl Iterator<Item = &'a u8>) -> u64 {
    bytes.fold(0, |acc, &byte| (acc << 7) | u64::from(byte & 0x7F))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BigEndianConverter;

impl EndianConverter for BigEndianConverter {
    fn convert_number(&self, offset: usize, data: &[u8], size: usize) -> Option<u64> {
        read_number(Endian::Big, offset, data, size)
    }

    fn convert_id3(&self, offset: usize, data: &[u8], size: usize) -> Option<u64> {
        read_id3_bytes(offset, data, size).map(|bytes| fold_id3(bytes.iter()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LittleEndianConverter;

impl EndianConverter for LittleEndianConverter {
    fn convert_number(&self, offset: usize, data: &[u8], size: usize) -> Option<u64> {
        read_number(Endian::Little, offset, data, size)
    }

    fn convert_id3(&self, offset: usize, data: &[u8], size: usize) -> Option<u64> {
        read_id3_bytes(offset, data, size).map(|bytes| fold_id3(bytes.iter().rev()))
    }
}

/// PDP-11 byte order. There is no middle-endian ID3 layout, so [`convert_id3`] always fails.
///
/// [`convert_id3`]: EndianConverter::convert_id3
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiddleEndianConverter;

impl EndianConverter for MiddleEndianConverter {
    fn convert_number(&self, offset: usize, data: &[u8], size: usize) -> Option<u64> {
        read_number(Endian::Middle, offset, data, size)
    }

    fn convert_id3(&self, _offset: usize, _data: &[u8], _size: usize) -> Option<u64> {
        None
    }
}

/// Returns the converter for the given byte order.
#[must_use]
pub fn converter_for(endian: Endian) -> &'static dyn EndianConverter {
    match endian {
        Endian::Big => &BigEndianConverter,
        Endian::Little => &LittleEndianConverter,
        Endian::Middle => &MiddleEndianConverter,
    }
}
