//! Scalar values carried by property filters.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A typed scalar compared against a property.
///
/// This is a closed set: every backend formats each variant explicitly, so a
/// new kind of value is a compile error until all of them handle it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// A boolean.
    Bool(bool),
    /// An integer that fits in 64 bits.
    Int(i64),
    /// An integer outside the `i64` range.
    BigInt(BigInt),
    /// A finite floating point number.
    Float(f64),
    /// A string.
    String(String),
    /// A date and time with a UTC offset.
    DateTime(DateTime<FixedOffset>),
    /// A UUID.
    Uuid(Uuid),
}

impl Value {
    /// Returns a human readable name for the kind of value.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::BigInt(_) => "integer",
            Value::Float(_) => "decimal",
            Value::String(_) => "string",
            Value::DateTime(_) => "date/time",
            Value::Uuid(_) => "uuid",
        }
    }

    /// Returns the string slice if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for integer values of either width.
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Int(_) | Value::BigInt(_))
    }

    /// Returns true if the value can be used in a filter.
    ///
    /// Only non-finite floats are rejected.
    pub fn is_valid(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            _ => true,
        }
    }

    /// Returns the next integer up, or `None` for non-integers.
    pub fn successor(&self) -> Option<Value> {
        match self {
            Value::Int(i) => Some(match i.checked_add(1) {
                Some(next) => Value::Int(next),
                None => Value::BigInt(BigInt::from(*i) + BigInt::from(1u8)),
            }),
            Value::BigInt(b) => Some(Value::from(b.clone() + BigInt::from(1u8))),
            _ => None,
        }
    }

    /// Returns the next integer down, or `None` for non-integers.
    pub fn predecessor(&self) -> Option<Value> {
        match self {
            Value::Int(i) => Some(match i.checked_sub(1) {
                Some(prev) => Value::Int(prev),
                None => Value::BigInt(BigInt::from(*i) - BigInt::from(1u8)),
            }),
            Value::BigInt(b) => Some(Value::from(b.clone() - BigInt::from(1u8))),
            _ => None,
        }
    }

    /// Compares two values of compatible kinds.
    ///
    /// Integers and decimals compare numerically with each other; any other
    /// mix of kinds is unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::BigInt(b)) => Some(BigInt::from(*a).cmp(b)),
            (Value::BigInt(a), Value::Int(b)) => Some(a.cmp(&BigInt::from(*b))),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::BigInt(a), Value::Float(b)) => big_to_f64(a).partial_cmp(b),
            (Value::Float(a), Value::BigInt(b)) => a.partial_cmp(&big_to_f64(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Returns true if a string has the length and alphabet of a hyphenated
    /// UUID, which the lexer reads as a UUID literal unless it is escaped.
    pub(crate) fn looks_like_uuid(s: &str) -> bool {
        s.len() == 36 && s.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
    }

    /// Formats a number the same way in every dialect.
    ///
    /// Floats keep a fractional part or exponent so they read back as decimals.
    pub(crate) fn format_number(&self) -> Option<String> {
        match self {
            Value::Int(i) => Some(i.to_string()),
            Value::BigInt(b) => Some(b.to_string()),
            Value::Float(f) => Some(format!("{:?}", f)),
            _ => None,
        }
    }

    /// Formats a date/time as RFC 3339, using `Z` for UTC.
    pub(crate) fn format_date_time(value: &DateTime<FixedOffset>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

fn big_to_f64(value: &BigInt) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Writes the value as a literal of the textual filter grammar.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(_) | Value::BigInt(_) | Value::Float(_) => {
                write!(f, "{}", self.format_number().unwrap_or_default())
            }
            Value::String(s) => write_quoted(f, s),
            Value::DateTime(dt) => write!(f, "\"{}\"", Value::format_date_time(dt)),
            Value::Uuid(u) => write!(f, "\"{}\"", u.hyphenated()),
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    let uuid_shaped = Value::looks_like_uuid(s);
    for (i, c) in s.chars().enumerate() {
        match c {
            c if i == 0 && uuid_shaped => write!(f, "\\u{:04x}", c as u32)?,
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            '\u{8}' => f.write_str("\\b")?,
            '\u{c}' => f.write_str("\\f")?,
            c if c.is_control() => write!(f, "\\u{:04x}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_small_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_small_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_from_wide_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    match i64::try_from(value) {
                        Ok(i) => Value::Int(i),
                        Err(_) => Value::BigInt(BigInt::from(value)),
                    }
                }
            }
        )*
    };
}

impl_from_wide_int!(u64, i128, u128, isize, usize);

impl From<BigInt> for Value {
    /// Narrows to [`Value::Int`] when the integer fits in an `i64`.
    fn from(value: BigInt) -> Self {
        match i64::try_from(&value) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::BigInt(value),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(value: DateTime<FixedOffset>) -> Self {
        Value::DateTime(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value.fixed_offset())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42u8), Value::Int(42));
        assert_eq!(Value::from("x"), Value::String("x".to_string()));
        assert_eq!(Value::from(u64::MAX), Value::BigInt(BigInt::from(u64::MAX)));
        assert_eq!(Value::from(BigInt::from(7)), Value::Int(7));
    }

    #[test]
    fn test_successor_and_predecessor() {
        assert_eq!(Value::Int(18).successor(), Some(Value::Int(19)));
        assert_eq!(Value::Int(18).predecessor(), Some(Value::Int(17)));
        assert_eq!(
            Value::Int(i64::MAX).successor(),
            Some(Value::BigInt(BigInt::from(i64::MAX) + BigInt::from(1u8)))
        );
        assert_eq!(Value::Float(1.5).successor(), None);
        assert_eq!(Value::from("a").predecessor(), None);
    }

    #[test]
    fn test_compare_numeric_kinds() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
        assert_eq!(
            Value::BigInt(BigInt::from(u64::MAX)).compare(&Value::Int(1)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(1).compare(&Value::from("1")), None);
    }

    #[test]
    fn test_display_literals() {
        assert_eq!(Value::from("say \"hi\"").to_string(), r#""say \"hi\"""#);
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Int(-3).to_string(), "-3");
        assert_eq!(Value::Bool(false).to_string(), "false");

        let dt = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Value::from(dt).to_string(), "\"2023-01-01T00:00:00Z\"");
    }

    #[test]
    fn test_display_escapes_uuid_shaped_strings() {
        let text = "94957019-fc7d-417d-bd1b-147cc6113ed3";
        assert_eq!(
            Value::from(text).to_string(),
            r#""\u00394957019-fc7d-417d-bd1b-147cc6113ed3""#
        );
        let uuid = Uuid::parse_str(text).unwrap();
        assert_eq!(Value::from(uuid).to_string(), format!("\"{}\"", text));
    }

    #[test]
    fn test_compare_big_integer_with_float() {
        let big = Value::BigInt(BigInt::from(u64::MAX) * BigInt::from(4u8));
        assert_eq!(big.compare(&Value::Float(1.0e19)), Some(Ordering::Greater));
        assert_eq!(Value::Float(1.0e30).compare(&big), Some(Ordering::Greater));
    }

    #[test]
    fn test_is_valid_rejects_non_finite() {
        assert!(Value::Float(0.5).is_valid());
        assert!(!Value::Float(f64::NAN).is_valid());
        assert!(!Value::Float(f64::INFINITY).is_valid());
    }
}
