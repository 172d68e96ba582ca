//! Typed value slots and the coercers that fill them from raw strings.
//!
//! Every coercer is a pure function from the raw command-line text to a
//! typed value. Integer widths share one generic routine driven by the
//! [`IntegerKind`] descriptor.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a raw string could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoerceError {
    #[error("expected one of 1/on/true/yes or 0/off/false/no")]
    NotBoolean,
    #[error("not a base-10 integer")]
    MalformedInteger,
    #[error("negative value for unsigned {0}")]
    Negative(ValueKind),
    #[error("value out of range for {0}")]
    OutOfRange(ValueKind),
    #[error("not a floating point literal")]
    MalformedFloat,
    #[error("floating point value out of range for {0}")]
    FloatRange(ValueKind),
}

/// Type of an option's value slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    String,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Boolean => "boolean",
            ValueKind::String => "string",
            ValueKind::Int8 => "int8",
            ValueKind::Int16 => "int16",
            ValueKind::Int32 => "int32",
            ValueKind::Int64 => "int64",
            ValueKind::Uint8 => "uint8",
            ValueKind::Uint16 => "uint16",
            ValueKind::Uint32 => "uint32",
            ValueKind::Uint64 => "uint64",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
        };
        f.write_str(name)
    }
}

/// The value slot of an option.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    String(Option<String>),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Float(f32),
    Double(f64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::String(_) => ValueKind::String,
            Value::Int8(_) => ValueKind::Int8,
            Value::Int16(_) => ValueKind::Int16,
            Value::Int32(_) => ValueKind::Int32,
            Value::Int64(_) => ValueKind::Int64,
            Value::Uint8(_) => ValueKind::Uint8,
            Value::Uint16(_) => ValueKind::Uint16,
            Value::Uint32(_) => ValueKind::Uint32,
            Value::Uint64(_) => ValueKind::Uint64,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
        }
    }

    /// Only booleans have a no-value form.
    pub fn takes_flag(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub(crate) fn flag(&mut self) -> bool {
        match self {
            Value::Boolean(b) => {
                *b = true;
                true
            }
            _ => false,
        }
    }

    /// Replaces the slot with the coerced form of `raw`.
    ///
    /// On failure the slot is left untouched.
    pub fn parse(&mut self, raw: &str) -> Result<(), CoerceError> {
        match self {
            Value::Boolean(v) => *v = parse_boolean(raw)?,
            Value::String(v) => *v = Some(raw.to_string()),
            Value::Int8(v) => *v = parse_integer(raw)?,
            Value::Int16(v) => *v = parse_integer(raw)?,
            Value::Int32(v) => *v = parse_integer(raw)?,
            Value::Int64(v) => *v = parse_integer(raw)?,
            Value::Uint8(v) => *v = parse_integer(raw)?,
            Value::Uint16(v) => *v = parse_integer(raw)?,
            Value::Uint32(v) => *v = parse_integer(raw)?,
            Value::Uint64(v) => *v = parse_integer(raw)?,
            Value::Float(v) => *v = parse_float(raw)?,
            Value::Double(v) => *v = parse_double(raw)?,
        }
        Ok(())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Some(v.to_string()))
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(Some(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

/// Coerces the boolean literals. Matching is exact and case-sensitive.
///
/// # Examples
///
/// ```
/// use kmnd_core::parse_boolean;
///
/// assert_eq!(parse_boolean("yes"), Ok(true));
/// assert_eq!(parse_boolean("off"), Ok(false));
/// assert!(parse_boolean("Yes").is_err());
/// ```
pub fn parse_boolean(raw: &str) -> Result<bool, CoerceError> {
    match raw {
        "1" | "on" | "true" | "yes" => Ok(true),
        "0" | "off" | "false" | "no" => Ok(false),
        _ => Err(CoerceError::NotBoolean),
    }
}

/// Extraction of a typed value from an option slot, used by
/// [`Grammar::get`](crate::Grammar::get).
pub trait FromValue<'a>: Sized {
    const KIND: ValueKind;

    fn from_value(value: &'a Value) -> Option<Self>;
}

impl<'a> FromValue<'a> for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl<'a> FromValue<'a> for f64 {
    const KIND: ValueKind = ValueKind::Double;

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }
}

/// A string option, `None` when it has neither a default nor a value.
impl<'a> FromValue<'a> for Option<&'a str> {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v.as_deref()),
            _ => None,
        }
    }
}

/// Bit width, signedness and bounds of an integer option type.
pub trait IntegerKind: Copy + Sized {
    const KIND: ValueKind;
    const SIGNED: bool;
    const MIN: i128;
    const MAX: i128;

    /// Narrows a value already checked against `MIN..=MAX`.
    fn from_wide(wide: i128) -> Option<Self>;
}

macro_rules! integer_kind {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl IntegerKind for $ty {
                const KIND: ValueKind = ValueKind::$kind;
                const SIGNED: bool = <$ty>::MIN != 0;
                const MIN: i128 = <$ty>::MIN as i128;
                const MAX: i128 = <$ty>::MAX as i128;

                fn from_wide(wide: i128) -> Option<Self> {
                    <$ty>::try_from(wide).ok()
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$kind(v)
                }
            }

            impl<'a> FromValue<'a> for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn from_value(value: &'a Value) -> Option<Self> {
                    match value {
                        Value::$kind(v) => Some(*v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

integer_kind! {
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => Uint8,
    u16 => Uint16,
    u32 => Uint32,
    u64 => Uint64,
}

/// Whitespace as understood by C's `isspace` in the "C" locale.
fn is_c_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0b}' | '\u{0c}' | '\r')
}

/// True when a `-` appears before the first non-whitespace character.
fn is_negative(raw: &str) -> bool {
    raw.trim_start_matches(is_c_space).starts_with('-')
}

/// Coerces a base-10 integer for any of the eight supported widths.
///
/// The text is parsed at the widest width of its signedness and then
/// narrowed; leading whitespace and a sign are accepted, anything after the
/// digits is not.
///
/// # Examples
///
/// ```
/// use kmnd_core::parse_integer;
///
/// assert_eq!(parse_integer::<i8>("-128"), Ok(-128));
/// assert!(parse_integer::<i8>("128").is_err());
/// assert!(parse_integer::<u64>("-0").is_err());
/// ```
pub fn parse_integer<T: IntegerKind>(raw: &str) -> Result<T, CoerceError> {
    if !T::SIGNED && is_negative(raw) {
        return Err(CoerceError::Negative(T::KIND));
    }

    let digits = raw.trim_start_matches(is_c_space);
    let unsigned = digits.strip_prefix(['+', '-']).unwrap_or(digits);
    if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoerceError::MalformedInteger);
    }

    let wide: i128 = if T::SIGNED {
        digits
            .parse::<i64>()
            .map_err(|_| CoerceError::OutOfRange(T::KIND))?
            .into()
    } else {
        digits
            .parse::<u64>()
            .map_err(|_| CoerceError::OutOfRange(T::KIND))?
            .into()
    };

    if wide < T::MIN || wide > T::MAX {
        return Err(CoerceError::OutOfRange(T::KIND));
    }
    T::from_wide(wide).ok_or(CoerceError::OutOfRange(T::KIND))
}

/// Coerces a single precision float.
///
/// # Examples
///
/// ```
/// use kmnd_core::parse_float;
///
/// assert_eq!(parse_float("2.5"), Ok(2.5));
/// assert_eq!(parse_float("0x1p-1"), Ok(0.5));
/// assert!(parse_float("1e39").is_err());
/// ```
pub fn parse_float(raw: &str) -> Result<f32, CoerceError> {
    let literal = FloatLiteral::parse(raw)?;
    let value = match &literal {
        FloatLiteral::Decimal(text) => text.parse::<f32>().map_err(|_| CoerceError::MalformedFloat)?,
        FloatLiteral::Hex(hex) => f32::from_bits(hex.to_bits(BINARY32) as u32),
        FloatLiteral::Special(value) => *value as f32,
    };
    check_range(value.is_infinite(), value == 0.0 || value.is_subnormal(), &literal, ValueKind::Float)?;
    Ok(value)
}

/// Coerces a double precision float.
pub fn parse_double(raw: &str) -> Result<f64, CoerceError> {
    let literal = FloatLiteral::parse(raw)?;
    let value = match &literal {
        FloatLiteral::Decimal(text) => text.parse::<f64>().map_err(|_| CoerceError::MalformedFloat)?,
        FloatLiteral::Hex(hex) => f64::from_bits(hex.to_bits(BINARY64)),
        FloatLiteral::Special(value) => *value,
    };
    check_range(value.is_infinite(), value == 0.0 || value.is_subnormal(), &literal, ValueKind::Double)?;
    Ok(value)
}

fn check_range(
    infinite: bool,
    tiny: bool,
    literal: &FloatLiteral<'_>,
    kind: ValueKind,
) -> Result<(), CoerceError> {
    if let FloatLiteral::Special(_) = literal {
        return Ok(());
    }
    if infinite || (tiny && literal.has_nonzero_digit()) {
        return Err(CoerceError::FloatRange(kind));
    }
    Ok(())
}

/// Classified float text, after leading whitespace is dropped.
enum FloatLiteral<'a> {
    Decimal(&'a str),
    Hex(HexFloat),
    Special(f64),
}

impl<'a> FloatLiteral<'a> {
    fn parse(raw: &'a str) -> Result<Self, CoerceError> {
        let text = raw.trim_start_matches(is_c_space);
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };

        let special = match body.to_ascii_lowercase().as_str() {
            "inf" | "infinity" => Some(f64::INFINITY),
            "nan" => Some(f64::NAN),
            _ => None,
        };
        if let Some(value) = special {
            return Ok(FloatLiteral::Special(if negative { -value } else { value }));
        }

        if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
            return HexFloat::parse(negative, hex).map(FloatLiteral::Hex);
        }

        let is_decimal = !body.is_empty()
            && body.bytes().any(|b| b.is_ascii_digit())
            && body
                .bytes()
                .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
        if !is_decimal {
            return Err(CoerceError::MalformedFloat);
        }
        Ok(FloatLiteral::Decimal(text))
    }

    fn has_nonzero_digit(&self) -> bool {
        match self {
            FloatLiteral::Decimal(text) => text
                .split(['e', 'E'])
                .next()
                .is_some_and(|mantissa| mantissa.bytes().any(|b| (b'1'..=b'9').contains(&b))),
            FloatLiteral::Hex(hex) => hex.mantissa != 0 || hex.sticky,
            FloatLiteral::Special(_) => false,
        }
    }
}

/// `<hex>[.<hex>][p[+-]<dec>]` with the `0x` prefix already removed.
struct HexFloat {
    negative: bool,
    mantissa: u64,
    exponent: i64,
    /// A nonzero digit fell below the mantissa's 60 bits.
    sticky: bool,
}

impl HexFloat {
    fn parse(negative: bool, text: &str) -> Result<Self, CoerceError> {
        let (digits, exponent) = match text.find(['p', 'P']) {
            Some(at) => (&text[..at], Some(&text[at + 1..])),
            None => (text, None),
        };

        let mut mantissa: u64 = 0;
        let mut shift: i64 = 0;
        let mut seen_digit = false;
        let mut sticky = false;
        let mut after_point = false;
        for c in digits.chars() {
            if c == '.' {
                if after_point {
                    return Err(CoerceError::MalformedFloat);
                }
                after_point = true;
                continue;
            }
            let digit = c.to_digit(16).ok_or(CoerceError::MalformedFloat)?;
            seen_digit = true;
            if mantissa < (1 << 60) {
                mantissa = mantissa * 16 + u64::from(digit);
                if after_point {
                    shift -= 4;
                }
            } else {
                sticky |= digit != 0;
                // Digits past the mantissa's precision only scale it.
                if !after_point {
                    shift += 4;
                }
            }
        }
        if !seen_digit {
            return Err(CoerceError::MalformedFloat);
        }

        let exponent = match exponent {
            None => 0,
            Some(exp) => {
                let unsigned = exp.strip_prefix(['+', '-']).unwrap_or(exp);
                if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(CoerceError::MalformedFloat);
                }
                // Saturate: anything this large is a range error anyway.
                exp.parse::<i64>()
                    .unwrap_or(if exp.starts_with('-') { -100_000 } else { 100_000 })
                    .clamp(-100_000, 100_000)
            }
        };

        Ok(Self {
            negative,
            mantissa,
            exponent: shift + exponent,
            sticky,
        })
    }

    /// IEEE 754 bits of `mantissa * 2^exponent` in `format`, rounded once
    /// to nearest, ties to even. Overflow yields infinity.
    fn to_bits(&self, format: BinaryFormat) -> u64 {
        let sign = u64::from(self.negative) << (format.width - 1);
        if self.mantissa == 0 {
            return sign;
        }

        let zeros = self.mantissa.leading_zeros();
        let normalized = u128::from(self.mantissa << zeros);
        // The value lies in [2^exponent, 2^(exponent + 1)).
        let mut exponent = self.exponent - i64::from(zeros) + 63;
        let precision = i64::from(format.mantissa_bits) + 1;
        let min_exponent = 1 - format.max_exponent;
        let dropped = 64 - precision + (min_exponent - exponent).max(0);

        let mut kept = 0u128;
        if dropped < 128 {
            let dropped = dropped as u32;
            kept = normalized >> dropped;
            let rest = normalized & ((1u128 << dropped) - 1);
            let half = 1u128 << (dropped - 1);
            let round_up = rest > half || (rest == half && (self.sticky || kept & 1 == 1));
            if round_up {
                kept += 1;
            }
        }

        if exponent < min_exponent {
            // Subnormal: a carry into the exponent field yields the smallest normal.
            return sign | kept as u64;
        }
        if kept == 1u128 << precision {
            kept >>= 1;
            exponent += 1;
        }
        if exponent > format.max_exponent {
            return sign | ((2 * format.max_exponent + 1) as u64) << format.mantissa_bits;
        }

        let fraction = kept as u64 & ((1u64 << format.mantissa_bits) - 1);
        sign | ((exponent + format.max_exponent) as u64) << format.mantissa_bits | fraction
    }
}

/// Layout of an IEEE 754 binary interchange format.
#[derive(Clone, Copy)]
struct BinaryFormat {
    width: u32,
    mantissa_bits: u32,
    max_exponent: i64,
}

const BINARY32: BinaryFormat = BinaryFormat {
    width: 32,
    mantissa_bits: 23,
    max_exponent: 127,
};

const BINARY64: BinaryFormat = BinaryFormat {
    width: 64,
    mantissa_bits: 52,
    max_exponent: 1023,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_literals() {
        for raw in ["1", "on", "true", "yes"] {
            assert_eq!(parse_boolean(raw), Ok(true), "{raw}");
        }
        for raw in ["0", "off", "false", "no"] {
            assert_eq!(parse_boolean(raw), Ok(false), "{raw}");
        }
        for raw in ["", "TRUE", "On", "y", "2", " yes"] {
            assert_eq!(parse_boolean(raw), Err(CoerceError::NotBoolean), "{raw}");
        }
    }

    fn bounds<T: IntegerKind + PartialEq + fmt::Debug>(min: T, max: T, min_text: &str, max_text: &str) {
        assert_eq!(parse_integer::<T>(min_text), Ok(min));
        assert_eq!(parse_integer::<T>(max_text), Ok(max));

        let below = (T::MIN - 1).to_string();
        let above = (T::MAX + 1).to_string();
        assert!(parse_integer::<T>(&below).is_err(), "{below}");
        assert!(parse_integer::<T>(&above).is_err(), "{above}");
    }

    #[test]
    fn test_signed_bounds() {
        bounds::<i8>(i8::MIN, i8::MAX, "-128", "127");
        bounds::<i16>(i16::MIN, i16::MAX, "-32768", "32767");
        bounds::<i32>(i32::MIN, i32::MAX, "-2147483648", "2147483647");
        bounds::<i64>(i64::MIN, i64::MAX, "-9223372036854775808", "9223372036854775807");
    }

    #[test]
    fn test_unsigned_bounds() {
        bounds::<u8>(0, u8::MAX, "0", "255");
        bounds::<u16>(0, u16::MAX, "0", "65535");
        bounds::<u32>(0, u32::MAX, "0", "4294967295");
        bounds::<u64>(0, u64::MAX, "0", "18446744073709551615");
    }

    #[test]
    fn test_unsigned_rejects_any_leading_minus() {
        assert_eq!(parse_integer::<u8>("-1"), Err(CoerceError::Negative(ValueKind::Uint8)));
        assert_eq!(parse_integer::<u64>("  -0"), Err(CoerceError::Negative(ValueKind::Uint64)));
        assert_eq!(
            parse_integer::<u64>("-18446744073709551615"),
            Err(CoerceError::Negative(ValueKind::Uint64))
        );
    }

    #[test]
    fn test_integer_text_shape() {
        assert_eq!(parse_integer::<i32>("  42"), Ok(42));
        assert_eq!(parse_integer::<u16>("+7"), Ok(7));
        assert_eq!(parse_integer::<i32>("42 "), Err(CoerceError::MalformedInteger));
        assert_eq!(parse_integer::<i32>("4x2"), Err(CoerceError::MalformedInteger));
        assert_eq!(parse_integer::<i32>(""), Err(CoerceError::MalformedInteger));
        assert_eq!(parse_integer::<i32>("-"), Err(CoerceError::MalformedInteger));
        assert_eq!(parse_integer::<i32>("0x10"), Err(CoerceError::MalformedInteger));
    }

    #[test]
    fn test_wide_overflow_is_rejected() {
        assert_eq!(
            parse_integer::<i64>("99999999999999999999"),
            Err(CoerceError::OutOfRange(ValueKind::Int64))
        );
        assert_eq!(
            parse_integer::<u8>("99999999999999999999"),
            Err(CoerceError::OutOfRange(ValueKind::Uint8))
        );
    }

    #[test]
    fn test_float_decimal() {
        assert_eq!(parse_float("-37.827281689071"), Ok(-37.827281689071_f32));
        assert_eq!(parse_double("-37.827281689071"), Ok(-37.827281689071));
        assert_eq!(parse_double("1e3"), Ok(1000.0));
        assert_eq!(parse_double("  .5"), Ok(0.5));
        assert_eq!(parse_double("0"), Ok(0.0));
        assert_eq!(parse_double("-0.0"), Ok(-0.0));
    }

    #[test]
    fn test_float_hex() {
        let expected = -(0x37827281689071_u64 as f64) * 2f64.powi(-47);
        assert_eq!(parse_double("-0x37.827281689071p1"), Ok(expected));
        let expected = -(0x37827281689071_u64 as f32) * 2f32.powi(-47);
        assert_eq!(parse_float("-0x37.827281689071p1"), Ok(expected));
        assert_eq!(parse_double("0x1p-1074"), Err(CoerceError::FloatRange(ValueKind::Double)));
        assert_eq!(parse_double("0x1p+3"), Ok(8.0));
        assert_eq!(parse_double("0XAp0"), Ok(10.0));
        assert_eq!(parse_double("0x.8"), Ok(0.5));
    }

    #[test]
    fn test_hex_float_rounds_once_at_target_precision() {
        // 1 + 2^-24 + 2^-56: just above the f32 halfway point.
        let single = parse_float("0x1.00000100000001p0").unwrap();
        assert_eq!(single.to_bits(), 0x3f80_0001);
        assert_eq!(single, "1.00000005960464477539062500000000000000000000000001".parse::<f32>().unwrap());

        // Exact ties go to even.
        assert_eq!(parse_float("0x1.000001p0").unwrap().to_bits(), 0x3f80_0000);
        assert_eq!(parse_float("0x1.000003p0").unwrap().to_bits(), 0x3f80_0002);
        assert_eq!(parse_double("0x1.00000000000008p0").unwrap().to_bits(), 0x3ff0_0000_0000_0000);
        assert_eq!(parse_double("0x1.00000000000018p0").unwrap().to_bits(), 0x3ff0_0000_0000_0002);
    }

    #[test]
    fn test_hex_float_keeps_digits_past_the_mantissa() {
        // A tie broken by a nonzero digit far beyond 60 mantissa bits.
        let value = parse_double("0x1.0000000000000800000000000001p0").unwrap();
        assert_eq!(value.to_bits(), 0x3ff0_0000_0000_0001);

        let value = parse_double("0x1.0000000000000800000000000000p0").unwrap();
        assert_eq!(value.to_bits(), 0x3ff0_0000_0000_0000);
    }

    #[test]
    fn test_hex_float_edges() {
        assert_eq!(parse_double("0x1.fffffffffffffp1023"), Ok(f64::MAX));
        assert_eq!(
            parse_double("0x1.fffffffffffff8p1023"),
            Err(CoerceError::FloatRange(ValueKind::Double))
        );
        assert_eq!(parse_float("0x1.fffffep127"), Ok(f32::MAX));
        assert_eq!(parse_float("0x1p-126"), Ok(f32::MIN_POSITIVE));
        assert_eq!(parse_double("0x1p-1022"), Ok(f64::MIN_POSITIVE));
        assert_eq!(parse_double("-0x0p0").unwrap().to_bits(), (-0.0f64).to_bits());
        assert_eq!(parse_float("0x1p-200"), Err(CoerceError::FloatRange(ValueKind::Float)));
    }

    #[test]
    fn test_float_special_literals() {
        assert_eq!(parse_float("INF"), Ok(f32::INFINITY));
        assert_eq!(parse_double("-infinity"), Ok(f64::NEG_INFINITY));
        assert!(parse_double("NaN").unwrap().is_nan());
    }

    #[test]
    fn test_float_rejects_garbage_and_range() {
        assert_eq!(parse_float("abc"), Err(CoerceError::MalformedFloat));
        assert_eq!(parse_double("1.5x"), Err(CoerceError::MalformedFloat));
        assert_eq!(parse_double(""), Err(CoerceError::MalformedFloat));
        assert_eq!(parse_double("0x"), Err(CoerceError::MalformedFloat));
        assert_eq!(parse_double("0x1p"), Err(CoerceError::MalformedFloat));
        assert_eq!(parse_float("1e39"), Err(CoerceError::FloatRange(ValueKind::Float)));
        assert_eq!(parse_double("1e309"), Err(CoerceError::FloatRange(ValueKind::Double)));
        assert_eq!(parse_double("1e-400"), Err(CoerceError::FloatRange(ValueKind::Double)));
        assert_eq!(parse_double("0e-400"), Ok(0.0));
    }

    #[test]
    fn test_value_parse_dispatch() {
        let mut value = Value::from(904u16);
        value.parse("65535").unwrap();
        assert_eq!(value, Value::Uint16(65535));
        assert!(value.parse("65536").is_err());
        assert_eq!(value, Value::Uint16(65535));

        let mut text = Value::String(None);
        text.parse("barfood").unwrap();
        assert_eq!(text, Value::String(Some("barfood".to_string())));
        assert!(!text.takes_flag());
    }
}
