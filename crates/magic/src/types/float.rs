use sniff_core::prelude::*;

use crate::matcher::{Comparison, MagicMatcher, Operand, Value};

/// IEEE 754 `float` and `double` values in any byte order.
#[derive(Debug, Clone, Copy)]
pub struct FloatMatcher {
    double: bool,
    endian: Endian,
}

impl FloatMatcher {
    #[must_use]
    pub fn single(endian: Endian) -> Self {
        Self { double: false, endian }
    }

    #[must_use]
    pub fn double(endian: Endian) -> Self {
        Self { double: true, endian }
    }
}

impl MagicMatcher for FloatMatcher {
    fn extract<'a>(&self, offset: usize, data: &'a [u8]) -> Option<Value<'a>> {
        let mut cursor = DataCursorRef::at(data, offset, self.endian).ok()?;
        let value = match self.double {
            true => cursor.read_f64(),
            false => cursor.read_f32().map(f64::from),
        };
        value.ok().map(Value::Float)
    }

    /// Masks don't apply to floating point values and are ignored.
    fn is_match<'a>(
        &self,
        test: &Operand,
        _mask: Option<u64>,
        _unsigned: bool,
        value: Value<'a>,
        _offset: usize,
        _data: &'a [u8],
    ) -> Option<Value<'a>> {
        let (Operand::Float(test), Value::Float(value)) = (test, value) else {
            return None;
        };
        let matched = match test.op {
            Comparison::Equal => value == test.value,
            Comparison::NotEqual => value != test.value,
            Comparison::LessThan => value < test.value,
            Comparison::GreaterThan => value > test.value,
            _ => false,
        };
        matched.then_some(Value::Float(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_widths() {
        let single = 1.5f32.to_le_bytes();
        let double = (-2.25f64).to_be_bytes();
        assert_eq!(FloatMatcher::single(Endian::Little).extract(0, &single), Some(Value::Float(1.5)));
        assert_eq!(FloatMatcher::double(Endian::Big).extract(0, &double), Some(Value::Float(-2.25)));
        assert_eq!(FloatMatcher::double(Endian::Big).extract(0, &single), None);
        assert_eq!(FloatMatcher::single(Endian::Big).extract(5, &single), None);
    }

    #[test]
    fn compares_values() {
        let matcher = FloatMatcher::single(Endian::Big);
        let data = 3.0f32.to_be_bytes();
        let value = || matcher.extract(0, &data).unwrap();
        let check = |op, expected| matcher.is_match(&Operand::float(op, expected), None, false, value(), 0, &data);
        assert!(check(Comparison::Equal, 3.0).is_some());
        assert!(check(Comparison::GreaterThan, 2.0).is_some());
        assert!(check(Comparison::LessThan, 2.0).is_none());
        assert!(check(Comparison::AllSet, 3.0).is_none());
    }
}
