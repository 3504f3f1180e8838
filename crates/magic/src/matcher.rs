//! The value capability: how a rule pulls a value out of a buffer, tests it, and renders it.
//!
//! A rule never looks at the value itself. It hands the extracted [`Value`] and its [`Operand`] to
//! the [`MagicMatcher`] it was built with, so the evaluator stays independent of widths and types.

use core::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::format::Template;

/// A value extracted from a buffer, or produced by a successful test.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Raw bytes starting at the rule's offset, running to the end of the buffer.
    Bytes(&'a [u8]),
    Text(String),
    /// Seconds since the Unix epoch.
    Date(i64),
}

/// How a candidate value is compared against the operand.
///
/// The discriminants are the operator characters used by magic(5) files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Comparison {
    Equal = b'=',
    NotEqual = b'!',
    LessThan = b'<',
    GreaterThan = b'>',
    /// Every bit set in the operand is also set in the value.
    AllSet = b'&',
    /// At least one bit set in the operand is clear in the value.
    AnyClear = b'^',
    /// The value equals the bitwise negation of the operand.
    Negated = b'~',
}

impl Comparison {
    #[inline]
    #[must_use]
    pub fn symbol(self) -> char {
        char::from(u8::from(self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericTest {
    pub op: Comparison,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatTest {
    pub op: Comparison,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringTest {
    pub op: Comparison,
    pub pattern: Vec<u8>,
}

/// The test operand of a rule. Which variant a matcher accepts is up to the matcher; handing it
/// the wrong one is simply a non-match.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Operand {
    Number(NumericTest),
    Float(FloatTest),
    String(StringTest),
}

impl Operand {
    #[must_use]
    pub fn number(op: Comparison, value: i64) -> Self {
        Self::Number(NumericTest { op, value })
    }

    #[must_use]
    pub fn equal(value: i64) -> Self {
        Self::number(Comparison::Equal, value)
    }

    #[must_use]
    pub fn float(op: Comparison, value: f64) -> Self {
        Self::Float(FloatTest { op, value })
    }

    #[must_use]
    pub fn string<P: Into<Vec<u8>>>(op: Comparison, pattern: P) -> Self {
        Self::String(StringTest { op, pattern: pattern.into() })
    }

    #[must_use]
    pub fn text<P: Into<Vec<u8>>>(pattern: P) -> Self {
        Self::string(Comparison::Equal, pattern)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, body) = match self {
            Self::Number(test) => (test.op, format!("{:#x}", test.value)),
            Self::Float(test) => (test.op, test.value.to_string()),
            Self::String(test) => (test.op, test.pattern.escape_ascii().to_string()),
        };
        match op {
            Comparison::Equal => f.write_str(&body),
            op => write!(f, "{}{body}", op.symbol()),
        }
    }
}

/// Pulls typed values out of a buffer and decides whether they match a rule's operand.
///
/// Implementations must be stateless: one matcher is shared by every evaluation of its rule, on
/// any thread.
pub trait MagicMatcher: fmt::Debug + Send + Sync {
    /// Extracts the value at `offset`. Returns `None` if `offset` is out of range or there are not
    /// enough bytes left for this matcher's width.
    fn extract<'a>(&self, offset: usize, data: &'a [u8]) -> Option<Value<'a>>;

    /// Tests `value` against `test`, applying `mask` first when present. `unsigned` selects how
    /// ordering and equality treat the sign bit.
    ///
    /// Returns the value to render on a match, which may differ from `value` (a string test
    /// returns the matched text rather than the raw bytes), or `None` otherwise.
    fn is_match<'a>(
        &self,
        test: &Operand,
        mask: Option<u64>,
        unsigned: bool,
        value: Value<'a>,
        offset: usize,
        data: &'a [u8],
    ) -> Option<Value<'a>>;

    /// Appends `value` to `output` through `template`.
    fn render(&self, output: &mut String, value: &Value<'_>, template: &Template) {
        template.render(output, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_round_trip_through_their_symbols() {
        assert_eq!(Comparison::try_from(b'&').unwrap(), Comparison::AllSet);
        assert_eq!(Comparison::Negated.symbol(), '~');
        assert!(Comparison::try_from(b'?').is_err());
    }

    #[test]
    fn operands_display_like_magic_files() {
        assert_eq!(Operand::equal(0x8950_4E47).to_string(), "0x89504e47");
        assert_eq!(Operand::number(Comparison::GreaterThan, 16).to_string(), ">0x10");
        assert_eq!(Operand::text(&b"PK\x03\x04"[..]).to_string(), "PK\\x03\\x04");
        assert_eq!(Operand::string(Comparison::NotEqual, "abc").to_string(), "!abc");
    }
}
