use sniff_core::prelude::*;
use snafu::prelude::*;

use crate::endian::{converter_for, EndianConverter};
use crate::error::{InvalidWidthSnafu, Result};
use crate::matcher::{Comparison, MagicMatcher, Operand, Value};

/// Fixed-width integers: `byte`, `short`, `long` and `quad` in any byte order.
#[derive(Debug, Clone, Copy)]
pub struct NumberMatcher {
    width: usize,
    converter: &'static dyn EndianConverter,
    signed: bool,
}

impl NumberMatcher {
    /// Creates a matcher for `width`-byte integers. `signed` is the type's default, a rule can
    /// still ask for an unsigned comparison.
    ///
    /// # Errors
    /// Returns [`InvalidWidth`](crate::Error::InvalidWidth) unless `width` is 1, 2, 4 or 8.
    pub fn new(width: usize, endian: Endian, signed: bool) -> Result<Self> {
        ensure!(matches!(width, 1 | 2 | 4 | 8), InvalidWidthSnafu { width });
        Ok(Self { width, converter: converter_for(endian), signed })
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }
}

/// All bits that fit in a `width`-byte integer.
#[inline]
pub(crate) fn width_mask(width: usize) -> u64 {
    match width {
        8.. => u64::MAX,
        width => (1u64 << (width * 8)) - 1,
    }
}

/// Sign-extends the low `width` bytes of `raw`.
#[inline]
pub(crate) fn sign_extend(raw: u64, width: usize) -> i64 {
    let shift = 64 - (width.min(8) * 8) as u32;
    ((raw << shift) as i64) >> shift
}

/// Compares two integers of `width` bytes with `op`. Both sides must already be truncated to the
/// width.
pub(crate) fn compare_integers(op: Comparison, value: u64, expected: u64, unsigned: bool, width: usize) -> bool {
    let ordered = |value: u64, expected: u64| match unsigned {
        true => value.cmp(&expected),
        false => sign_extend(value, width).cmp(&sign_extend(expected, width)),
    };
    match op {
        Comparison::Equal => value == expected,
        Comparison::NotEqual => value != expected,
        Comparison::LessThan => ordered(value, expected).is_lt(),
        Comparison::GreaterThan => ordered(value, expected).is_gt(),
        Comparison::AllSet => value & expected == expected,
        Comparison::AnyClear => value & expected != expected,
        Comparison::Negated => value == !expected & width_mask(width),
    }
}

impl MagicMatcher for NumberMatcher {
    fn extract<'a>(&self, offset: usize, data: &'a [u8]) -> Option<Value<'a>> {
        let raw = self.converter.convert_number(offset, data, self.width)?;
        Some(match self.signed {
            true => Value::Int(sign_extend(raw, self.width)),
            false => Value::UInt(raw),
        })
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
        let Operand::Number(test) = test else {
            return None;
        };
        let all = width_mask(self.width);
        let raw = match value {
            Value::Int(v) => v as u64,
            Value::UInt(v) => v,
            _ => return None,
        };
        let value = mask.map_or(raw, |mask| raw & mask) & all;
        let unsigned = unsigned || !self.signed;

        compare_integers(test.op, value, test.value as u64 & all, unsigned, self.width).then(|| {
            match unsigned {
                true => Value::UInt(value),
                false => Value::Int(sign_extend(value, self.width)),
            }
        })
    }
}
