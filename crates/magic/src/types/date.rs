use sniff_core::prelude::*;
use snafu::prelude::*;

use super::number::{compare_integers, sign_extend, width_mask};
use crate::endian::{converter_for, EndianConverter};
use crate::error::{InvalidWidthSnafu, Result};
use crate::matcher::{MagicMatcher, Operand, Value};

/// Unix timestamps stored as 32 or 64-bit seconds. They render as UTC dates through `%s`.
#[derive(Debug, Clone, Copy)]
pub struct DateMatcher {
    width: usize,
    converter: &'static dyn EndianConverter,
}

impl DateMatcher {
    /// # Errors
    /// Returns [`InvalidWidth`](crate::Error::InvalidWidth) unless `width` is 4 or 8.
    pub fn new(width: usize, endian: Endian) -> Result<Self> {
        ensure!(matches!(width, 4 | 8), InvalidWidthSnafu { width });
        Ok(Self { width, converter: converter_for(endian) })
    }
}

impl MagicMatcher for DateMatcher {
    fn extract<'a>(&self, offset: usize, data: &'a [u8]) -> Option<Value<'a>> {
        let raw = self.converter.convert_number(offset, data, self.width)?;
        // 32-bit dates are unsigned, so they run until 2106
        Some(Value::Date(match self.width {
            4 => raw as i64,
            _ => sign_extend(raw, self.width),
        }))
    }

    fn is_match<'a>(
        &self,
        test: &Operand,
        mask: Option<u64>,
        unsigned: bool,
        value: Value<'a>,
        _offset: usize,
        _data: &'a [u8],
    ) -> Option<Value<'a>> {
        let (Operand::Number(test), Value::Date(raw)) = (test, value) else {
            return None;
        };
        let all = width_mask(self.width);
        let value = mask.map_or(raw as u64, |mask| raw as u64 & mask) & all;
        let unsigned = unsigned || self.width == 4;
        compare_integers(test.op, value, test.value as u64 & all, unsigned, self.width).then(|| {
            Value::Date(match unsigned {
                true => value as i64,
                false => sign_extend(value, self.width),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Template;
    use crate::matcher::Comparison;

    #[test]
    fn renders_as_a_date() {
        let matcher = DateMatcher::new(4, Endian::Little).unwrap();
        let data = 1_700_000_000u32.to_le_bytes();
        let value = matcher.extract(0, &data).unwrap();
        let value = matcher.is_match(&Operand::number(Comparison::GreaterThan, 0), None, false, value, 0, &data).unwrap();

        let mut output = String::new();
        matcher.render(&mut output, &value, &Template::new("last modified: %s").unwrap());
        assert_eq!(output, "last modified: 2023-11-14 22:13:20");
    }

    #[test]
    fn zero_dates_fail_a_greater_than_test() {
        let matcher = DateMatcher::new(4, Endian::Little).unwrap();
        let data = [0u8; 4];
        let value = matcher.extract(0, &data).unwrap();
        assert!(matcher.is_match(&Operand::number(Comparison::GreaterThan, 0), None, false, value, 0, &data).is_none());
    }

    #[test]
    fn only_date_widths_are_accepted() {
        assert!(DateMatcher::new(2, Endian::Big).is_err());
    }
}
