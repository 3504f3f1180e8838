//! Output templates, a printf-style subset used to turn matched values into description text.
//!
//! Supported: flags `- 0 + space #`, width, precision, the length modifiers `h hh l ll q L j z t`
//! (accepted and ignored, since values are already 64 bits wide), and the conversions
//! `d i u x X o c s e f g` plus `%%`. Templates are parsed once when a rule is built.

use core::fmt::{self, Write};

use sniff_core::prelude::time::format_timestamp;
use snafu::prelude::*;

use crate::error::{InvalidTemplateSnafu, Result};
use crate::matcher::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Signed,
    Unsigned,
    LowerHex,
    UpperHex,
    Octal,
    Char,
    Str,
    Exponent,
    Fixed,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Spec(Spec),
}

/// A parsed output template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
}

impl Template {
    /// Parses `source` into a template.
    ///
    /// # Errors
    /// Returns [`InvalidTemplate`](crate::Error::InvalidTemplate) if a conversion is incomplete
    /// or uses an unsupported conversion character.
    pub fn new<S: Into<String>>(source: S) -> Result<Self> {
        let source = source.into();
        let pieces = parse(&source)?;
        Ok(Self { source, pieces })
    }

    /// Returns the template text as it was written.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Appends `value` formatted through this template to `output`. Every conversion in the
    /// template renders the same value.
    pub fn render(&self, output: &mut String, value: &Value<'_>) {
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => output.push_str(text),
                Piece::Spec(spec) => render_spec(output, spec, value),
            }
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Largest width or precision a conversion may ask for.
const MAX_FIELD: usize = u16::MAX as usize;

fn parse(source: &str) -> Result<Vec<Piece>> {
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        if chars.next_if_eq(&'%').is_some() {
            literal.push('%');
            continue;
        }

        let mut spec = Spec {
            left: false,
            zero: false,
            plus: false,
            space: false,
            alternate: false,
            width: 0,
            precision: None,
            conversion: Conversion::Str,
        };
        while let Some(flag) = chars.next_if(|c| "-0+ #".contains(*c)) {
            match flag {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                _ => spec.alternate = true,
            }
        }
        spec.width = parse_number(&mut chars);
        if chars.next_if_eq(&'.').is_some() {
            spec.precision = Some(parse_number(&mut chars));
        }
        ensure!(
            spec.width <= MAX_FIELD && spec.precision.unwrap_or(0) <= MAX_FIELD,
            InvalidTemplateSnafu { template: source, reason: "field width or precision too large" }
        );
        while chars.next_if(|c| "hlqLjzt".contains(*c)).is_some() {}

        spec.conversion = match chars.next() {
            Some('d' | 'i') => Conversion::Signed,
            Some('u') => Conversion::Unsigned,
            Some('x') => Conversion::LowerHex,
            Some('X') => Conversion::UpperHex,
            Some('o') => Conversion::Octal,
            Some('c') => Conversion::Char,
            Some('s') => Conversion::Str,
            Some('e' | 'E') => Conversion::Exponent,
            Some('f' | 'F') => Conversion::Fixed,
            Some('g' | 'G') => Conversion::General,
            Some(_) => {
                return InvalidTemplateSnafu { template: source, reason: "unsupported conversion" }.fail()
            }
            None => {
                return InvalidTemplateSnafu { template: source, reason: "incomplete conversion" }.fail()
            }
        };

        if !literal.is_empty() {
            pieces.push(Piece::Literal(core::mem::take(&mut literal)));
        }
        pieces.push(Piece::Spec(spec));
    }

    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(pieces)
}

fn parse_number(chars: &mut core::iter::Peekable<core::str::Chars<'_>>) -> usize {
    let mut number: usize = 0;
    while let Some(digit) = chars.next_if(char::is_ascii_digit) {
        number = number.saturating_mul(10).saturating_add(digit as usize - '0' as usize);
    }
    number
}

/// Text form of a value, for `%s` and for numeric conversions applied to strings.
fn value_text(value: &Value<'_>) -> String {
    match value {
        Value::Int(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Bytes(bytes) => {
            let end = bytes.iter().position(|&b| b == 0 || b == b'\n').unwrap_or(bytes.len());
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        }
        Value::Text(text) => text.clone(),
        Value::Date(v) => format_timestamp(*v).unwrap_or_else(|_| v.to_string()),
    }
}

fn value_float(value: &Value<'_>) -> Option<f64> {
    match value {
        Value::Int(v) | Value::Date(v) => Some(*v as f64),
        Value::UInt(v) => Some(*v as f64),
        Value::Float(v) => Some(*v),
        Value::Bytes(_) | Value::Text(_) => None,
    }
}

fn render_spec(output: &mut String, spec: &Spec, value: &Value<'_>) {
    let integer = match value {
        Value::Int(v) | Value::Date(v) => Some((*v < 0, v.unsigned_abs(), *v as u64)),
        Value::UInt(v) => Some((false, *v, *v)),
        Value::Float(v) => Some((*v < 0.0, v.abs() as u64, *v as i64 as u64)),
        Value::Bytes(_) | Value::Text(_) => None,
    };

    let body = match spec.conversion {
        Conversion::Str => {
            let text = value_text(value);
            match spec.precision {
                Some(precision) => text.chars().take(precision).collect(),
                None => text,
            }
        }
        Conversion::Char => match (value, integer) {
            (_, Some((_, _, bits))) => char::from(bits as u8).to_string(),
            (value, None) => value_text(value).chars().take(1).collect(),
        },
        Conversion::Signed | Conversion::Unsigned | Conversion::LowerHex | Conversion::UpperHex
        | Conversion::Octal => match integer {
            Some((negative, magnitude, bits)) => {
                return pad_number(output, spec, format_integer(spec, negative, magnitude, bits))
            }
            None => value_text(value),
        },
        Conversion::Exponent | Conversion::Fixed | Conversion::General => match value_float(value) {
            Some(float) => return pad_number(output, spec, format_float(spec, float)),
            None => value_text(value),
        },
    };
    pad(output, spec, "", &body);
}

/// A formatted number split into its sign/prefix and its digits, so zero padding can go between.
struct Number {
    prefix: String,
    digits: String,
}

fn format_integer(spec: &Spec, negative: bool, magnitude: u64, bits: u64) -> Number {
    let (mut prefix, mut digits) = match spec.conversion {
        Conversion::Signed => (sign(spec, negative).to_owned(), magnitude.to_string()),
        Conversion::Unsigned => (String::new(), bits.to_string()),
        Conversion::LowerHex => {
            let prefix = if spec.alternate && bits != 0 { "0x" } else { "" };
            (prefix.to_owned(), format!("{bits:x}"))
        }
        Conversion::UpperHex => {
            let prefix = if spec.alternate && bits != 0 { "0X" } else { "" };
            (prefix.to_owned(), format!("{bits:X}"))
        }
        _ => (String::new(), format!("{bits:o}")),
    };
    if let Some(precision) = spec.precision {
        if digits.len() < precision {
            digits.insert_str(0, &"0".repeat(precision - digits.len()));
        }
    }
    if spec.conversion == Conversion::Octal && spec.alternate && !digits.starts_with('0') {
        prefix.push('0');
    }
    Number { prefix, digits }
}

fn format_float(spec: &Spec, value: f64) -> Number {
    let precision = spec.precision.unwrap_or(6);
    let prefix = sign(spec, value.is_sign_negative() && value != 0.0).to_owned();
    let value = value.abs();
    let digits = match spec.conversion {
        Conversion::Fixed => format!("{value:.precision$}"),
        Conversion::Exponent => c_exponent(value, precision),
        _ => {
            // %g picks the shorter of %e and %f and drops trailing zeros
            let precision = precision.max(1);
            let exponent = if value == 0.0 { 0 } else { value.log10().floor() as i32 };
            if exponent < -4 || exponent >= precision as i32 {
                let formatted = c_exponent(value, precision - 1);
                match formatted.split_once('e') {
                    Some((mantissa, exp)) => format!("{}e{exp}", trim_fraction(mantissa)),
                    None => formatted,
                }
            } else {
                let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
                trim_fraction(&format!("{value:.decimals$}")).to_owned()
            }
        }
    };
    Number { prefix, digits }
}

/// Formats like C's `%e`: at least two exponent digits and an explicit exponent sign.
fn c_exponent(value: f64, precision: usize) -> String {
    let formatted = format!("{value:.precision$e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
        }
        None => formatted,
    }
}

fn trim_fraction(number: &str) -> &str {
    match number.contains('.') {
        true => number.trim_end_matches('0').trim_end_matches('.'),
        false => number,
    }
}

fn sign(spec: &Spec, negative: bool) -> &'static str {
    match (negative, spec.plus, spec.space) {
        (true, _, _) => "-",
        (false, true, _) => "+",
        (false, false, true) => " ",
        _ => "",
    }
}

fn pad_number(output: &mut String, spec: &Spec, number: Number) {
    // Zero padding is ignored for left-justified output and, for integers, when a precision is set
    let integer = !matches!(
        spec.conversion,
        Conversion::Exponent | Conversion::Fixed | Conversion::General
    );
    let zero = spec.zero && !spec.left && !(integer && spec.precision.is_some());
    let length = number.prefix.len() + number.digits.len();
    if zero && length < spec.width {
        output.push_str(&number.prefix);
        output.push_str(&"0".repeat(spec.width - length));
        output.push_str(&number.digits);
    } else {
        pad(output, spec, &number.prefix, &number.digits);
    }
}

fn pad(output: &mut String, spec: &Spec, prefix: &str, body: &str) {
    let length = prefix.chars().count() + body.chars().count();
    let fill = spec.width.saturating_sub(length);
    match spec.left {
        true => write!(output, "{prefix}{body}{:fill$}", ""),
        false => write!(output, "{:fill$}{prefix}{body}", ""),
    }
    .ok();
}
