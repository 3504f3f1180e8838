use snafu::prelude::*;

/// Error conditions for when reading data.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum DataError {
    /// Thrown if reading tries to go out of bounds.
    #[snafu(display("Tried to read out-of-bounds"))]
    EndOfFile,
    /// Thrown if a requested integer width is not supported by the byte order.
    #[snafu(display("Unsupported integer width {width} for {endian:?} byte order"))]
    InvalidWidth { width: usize, endian: Endian },
}

/// Byte order of the values being read.
///
/// `Middle` is the PDP-11 layout: 16-bit little-endian halves, stored most significant half first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
    Middle,
}

/// Position tracking for a cursor over a fixed-length buffer.
pub trait SeekExt {
    fn position(&self) -> usize;

    /// Moves the cursor to `position`.
    ///
    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if the position is past the end of the data.
    fn set_position(&mut self, position: usize) -> Result<usize, DataError>;

    fn len(&self) -> usize;

    /// Returns `true` once every byte has been consumed.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len().saturating_sub(self.position()) == 0
    }
}

/// Endian-aware reads. A failed read leaves the position unchanged.
pub trait ReadExt {
    /// Byte order used by every multi-byte read.
    fn endian(&self) -> Endian;

    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if fewer than `N` bytes remain.
    fn read_exact<const N: usize>(&mut self) -> Result<[u8; N], DataError>;

    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if fewer than `length` bytes remain.
    fn read_slice(&mut self, length: usize) -> Result<&[u8], DataError>;

    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) at the end of the data.
    #[inline]
    fn read_u8(&mut self) -> Result<u8, DataError> {
        Ok(self.read_exact::<1>()?[0])
    }

    /// Middle-endian data has no byte swap at this width, so it reads as little-endian.
    ///
    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if fewer than 2 bytes remain.
    #[inline]
    fn read_u16(&mut self) -> Result<u16, DataError> {
        let bytes = self.read_exact()?;
        Ok(match self.endian() {
            Endian::Little | Endian::Middle => u16::from_le_bytes(bytes),
            Endian::Big => u16::from_be_bytes(bytes),
        })
    }

    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if fewer than 4 bytes remain.
    #[inline]
    fn read_u32(&mut self) -> Result<u32, DataError> {
        let bytes = self.read_exact()?;
        Ok(match self.endian() {
            Endian::Little => u32::from_le_bytes(bytes),
            Endian::Big => u32::from_be_bytes(bytes),
            Endian::Middle => u32::from_le_bytes([bytes[2], bytes[3], bytes[0], bytes[1]]),
        })
    }

    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if fewer than 8 bytes remain.
    #[inline]
    fn read_u64(&mut self) -> Result<u64, DataError> {
        let bytes = self.read_exact()?;
        Ok(match self.endian() {
            Endian::Little => u64::from_le_bytes(bytes),
            Endian::Big => u64::from_be_bytes(bytes),
            Endian::Middle => u64::from_le_bytes([
                bytes[6], bytes[7], bytes[4], bytes[5], bytes[2], bytes[3], bytes[0], bytes[1],
            ]),
        })
    }

    /// Reads an unsigned integer of `width` bytes, zero-extended to 64 bits.
    ///
    /// Big and little endian accept any width from 1 to 8. Middle endian only defines 1, 2, 4,
    /// and 8 byte layouts.
    ///
    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if trying to read out of bounds.
    /// Returns [`InvalidWidth`](DataError::InvalidWidth) for an unsupported width.
    fn read_uint(&mut self, width: usize) -> Result<u64, DataError> {
        let endian = self.endian();
        match (width, endian) {
            (1, _) => Ok(u64::from(self.read_u8()?)),
            (2, _) => Ok(u64::from(self.read_u16()?)),
            (4, _) => Ok(u64::from(self.read_u32()?)),
            (8, _) => self.read_u64(),
            (3 | 5..=7, Endian::Big) => {
                let bytes = self.read_slice(width)?;
                Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
            }
            (3 | 5..=7, Endian::Little) => {
                let bytes = self.read_slice(width)?;
                Ok(bytes.iter().rev().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
            }
            _ => InvalidWidthSnafu { width, endian }.fail(),
        }
    }

    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if fewer than 4 bytes remain.
    #[inline]
    fn read_f32(&mut self) -> Result<f32, DataError> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if fewer than 8 bytes remain.
    #[inline]
    fn read_f64(&mut self) -> Result<f64, DataError> {
        Ok(f64::from_bits(self.read_u64()?))
    }
}

/// A read-only cursor over a borrowed buffer. Works without `std`.
#[derive(Debug, Clone)]
pub struct DataCursorRef<'a> {
    data: &'a [u8],
    position: usize,
    endian: Endian,
}

impl<'a> DataCursorRef<'a> {
    #[inline]
    #[must_use]
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self { data, position: 0, endian }
    }

    /// Creates a cursor that starts reading at `position`.
    ///
    /// # Errors
    /// Returns [`EndOfFile`](DataError::EndOfFile) if `position` is past the end of `data`.
    #[inline]
    pub fn at(data: &'a [u8], position: usize, endian: Endian) -> Result<Self, DataError> {
        let mut cursor = Self::new(data, endian);
        cursor.set_position(position)?;
        Ok(cursor)
    }
}

impl SeekExt for DataCursorRef<'_> {
    #[inline]
    fn position(&self) -> usize {
        self.position
    }

    #[inline]
    fn set_position(&mut self, position: usize) -> Result<usize, DataError> {
        ensure!(position <= self.data.len(), EndOfFileSnafu);
        self.position = position;
        Ok(self.position)
    }

    #[inline]
    fn len(&self) -> usize {
        self.data.len()
    }
}

impl ReadExt for DataCursorRef<'_> {
    #[inline]
    fn endian(&self) -> Endian {
        self.endian
    }

    #[inline]
    fn read_exact<const N: usize>(&mut self) -> Result<[u8; N], DataError> {
        let bytes = self.read_slice(N)?;
        let mut result = [0u8; N];
        result.copy_from_slice(bytes);
        Ok(result)
    }

    #[inline]
    fn read_slice(&mut self, length: usize) -> Result<&[u8], DataError> {
        let end = self.position.checked_add(length).context(EndOfFileSnafu)?;
        let data: &'_ [u8] = self.data;
        let result = data.get(self.position..end).context(EndOfFileSnafu)?;
        self.position = end;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_each_byte_order() {
        let data = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(DataCursorRef::new(&data, Endian::Big).read_u32().unwrap(), 0x1234_5678);
        assert_eq!(DataCursorRef::new(&data, Endian::Little).read_u32().unwrap(), 0x7856_3412);
        assert_eq!(DataCursorRef::new(&data, Endian::Middle).read_u32().unwrap(), 0x3412_7856);
    }

    #[test]
    fn reads_odd_widths() {
        let data = [0x01, 0x02, 0x03];
        assert_eq!(DataCursorRef::new(&data, Endian::Big).read_uint(3).unwrap(), 0x01_0203);
        assert_eq!(DataCursorRef::new(&data, Endian::Little).read_uint(3).unwrap(), 0x03_0201);
        assert!(matches!(
            DataCursorRef::new(&data, Endian::Middle).read_uint(3),
            Err(DataError::InvalidWidth { width: 3, .. })
        ));
    }

    #[test]
    fn reads_floats_in_any_byte_order() {
        let data = 1.5f32.to_be_bytes();
        assert_eq!(DataCursorRef::new(&data, Endian::Big).read_f32().unwrap(), 1.5);
        let data = (-2.25f64).to_le_bytes();
        assert_eq!(DataCursorRef::new(&data, Endian::Little).read_f64().unwrap(), -2.25);
    }

    #[test]
    fn short_reads_fail_without_moving() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut cursor = DataCursorRef::at(&data, 1, Endian::Big).unwrap();
        assert!(matches!(cursor.read_u32(), Err(DataError::EndOfFile)));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_u16().unwrap(), 0xBBCC);
        assert!(cursor.is_empty());
    }

    #[test]
    fn positions_past_the_end_are_rejected() {
        let data = [0u8; 4];
        assert!(DataCursorRef::at(&data, 4, Endian::Big).is_ok());
        assert!(matches!(DataCursorRef::at(&data, 5, Endian::Big), Err(DataError::EndOfFile)));
    }
}
