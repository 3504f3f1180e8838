use core::cmp::Ordering;

use bitflags::bitflags;

use crate::matcher::{Comparison, MagicMatcher, Operand, Value};

bitflags! {
    /// Modifiers for string comparisons, the `/WwcC` suffixes of a magic(5) `string` type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StringFlags: u8 {
        /// A blank in the pattern matches one or more blanks in the data.
        const CompactWhitespace = 1 << 0;
        /// A blank in the pattern matches zero or more blanks in the data.
        const OptionalWhitespace = 1 << 1;
        /// Lower-case pattern characters match either case.
        const LowerInsensitive = 1 << 2;
        /// Upper-case pattern characters match either case.
        const UpperInsensitive = 1 << 3;
    }
}

/// Byte strings, compared against the data at the rule's offset.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringMatcher {
    flags: StringFlags,
}

impl StringMatcher {
    #[must_use]
    pub fn new(flags: StringFlags) -> Self {
        Self { flags }
    }

    fn bytes_equal(&self, pattern: u8, data: u8) -> bool {
        pattern == data
            || (self.flags.contains(StringFlags::LowerInsensitive)
                && pattern.is_ascii_lowercase()
                && data.to_ascii_lowercase() == pattern)
            || (self.flags.contains(StringFlags::UpperInsensitive)
                && pattern.is_ascii_uppercase()
                && data.to_ascii_uppercase() == pattern)
    }

    /// Compares `data` against `pattern`, returning how the data orders relative to the pattern
    /// and how many data bytes were consumed.
    fn compare(&self, pattern: &[u8], data: &[u8]) -> (Ordering, usize) {
        let blanks = self.flags.intersects(StringFlags::CompactWhitespace | StringFlags::OptionalWhitespace);
        let mut position = 0;

        for &expected in pattern {
            if blanks && expected.is_ascii_whitespace() {
                let run = data[position..].iter().take_while(|b| b.is_ascii_whitespace()).count();
                if run == 0 && self.flags.contains(StringFlags::CompactWhitespace) {
                    return match data.get(position) {
                        Some(&found) => (found.cmp(&expected), position),
                        None => (Ordering::Less, position),
                    };
                }
                position += run;
                continue;
            }

            let Some(&found) = data.get(position) else {
                return (Ordering::Less, position);
            };
            if !self.bytes_equal(expected, found) {
                return (found.cmp(&expected), position);
            }
            position += 1;
        }
        (Ordering::Equal, position)
    }
}

impl MagicMatcher for StringMatcher {
    fn extract<'a>(&self, offset: usize, data: &'a [u8]) -> Option<Value<'a>> {
        data.get(offset..).filter(|rest| !rest.is_empty()).map(Value::Bytes)
    }

    /// Masks and signedness don't apply to strings and are ignored.
    fn is_match<'a>(
        &self,
        test: &Operand,
        _mask: Option<u64>,
        _unsigned: bool,
        value: Value<'a>,
        _offset: usize,
        _data: &'a [u8],
    ) -> Option<Value<'a>> {
        let (Operand::String(test), Value::Bytes(bytes)) = (test, value) else {
            return None;
        };
        let (ordering, consumed) = self.compare(&test.pattern, bytes);
        let matched = match test.op {
            Comparison::Equal => ordering.is_eq(),
            Comparison::NotEqual => ordering.is_ne(),
            Comparison::LessThan => ordering.is_lt(),
            Comparison::GreaterThan => ordering.is_gt(),
            _ => false,
        };
        if !matched {
            return None;
        }
        // An exact match renders what was matched, anything else renders the data as a C string
        Some(match ordering {
            Ordering::Equal => Value::Text(String::from_utf8_lossy(&bytes[..consumed]).into_owned()),
            _ => Value::Bytes(bytes),
        })
    }
}
