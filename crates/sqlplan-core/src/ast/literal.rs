//! Typed literal values.

use core::fmt;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::types::{DataType, MAX_DECIMAL_PRECISION};

pub const MICROS_PER_MILLISECOND: i64 = 1_000;
pub const MICROS_PER_SECOND: i64 = 1_000_000;
pub const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
pub const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;
pub const MICROS_PER_DAY: i64 = 24 * MICROS_PER_HOUR;
pub const MICROS_PER_WEEK: i64 = 7 * MICROS_PER_DAY;

/// A calendar interval normalized to months plus microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Interval {
    /// Whole months (years are folded in as 12 months each).
    pub months: i32,
    /// Everything below a month, in microseconds.
    pub microseconds: i64,
}

impl Interval {
    /// Creates an interval.
    #[must_use]
    pub const fn new(months: i32, microseconds: i64) -> Self {
        Self {
            months,
            microseconds,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("INTERVAL")?;
        if self.months != 0 {
            write!(f, " {} MONTHS", self.months)?;
        }
        if self.microseconds != 0 || self.months == 0 {
            write!(f, " {} MICROSECONDS", self.microseconds)?;
        }
        Ok(())
    }
}

/// A literal value. Every variant maps to exactly one [`DataType`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    Binary(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Interval(Interval),
}

impl LiteralValue {
    /// Returns the resolved type of the value.
    ///
    /// Decimals take their precision and scale from the value itself:
    /// the scale as written and `max(digits, scale)` as precision.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Null => DataType::Null,
            Self::Boolean(_) => DataType::Boolean,
            Self::Byte(_) => DataType::Byte,
            Self::Short(_) => DataType::Short,
            Self::Int(_) => DataType::Integer,
            Self::Long(_) => DataType::Long,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::Decimal(d) => decimal_type(d),
            Self::String(_) => DataType::String,
            Self::Binary(_) => DataType::Binary,
            Self::Date(_) => DataType::Date,
            Self::Timestamp(_) => DataType::Timestamp,
            Self::Interval(_) => DataType::Interval,
        }
    }

    /// Returns the string payload, if this is a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an `i64` for the integral variants.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(*v as i64),
            Self::Short(v) => Some(*v as i64),
            Self::Int(v) => Some(*v as i64),
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }
}

fn decimal_type(value: &BigDecimal) -> DataType {
    let (_, scale) = value.as_bigint_and_exponent();
    let scale = u64::try_from(scale).unwrap_or(0);
    let precision = value.digits().max(scale);
    DataType::decimal(
        u8::try_from(precision).unwrap_or(MAX_DECIMAL_PRECISION),
        u8::try_from(scale).unwrap_or(MAX_DECIMAL_PRECISION),
    )
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Byte(v) => write!(f, "{v}Y"),
            Self::Short(v) => write!(f, "{v}S"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Float(v) => write!(f, "{v}F"),
            Self::Double(v) => write!(f, "{v}D"),
            Self::Decimal(v) => write!(f, "{v}BD"),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Binary(bytes) => {
                f.write_str("X'")?;
                for b in bytes {
                    write!(f, "{b:02X}")?;
                }
                f.write_str("'")
            }
            Self::Date(d) => write!(f, "DATE '{}'", d.format("%Y-%m-%d")),
            Self::Timestamp(ts) => write!(f, "TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Interval(i) => write!(f, "{i}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_decimal_precision_from_value() {
        let d = BigDecimal::from_str("3.14").unwrap();
        assert_eq!(LiteralValue::Decimal(d).data_type(), DataType::decimal(3, 2));

        let d = BigDecimal::from_str("0.001").unwrap();
        assert_eq!(LiteralValue::Decimal(d).data_type(), DataType::decimal(3, 3));

        let d = BigDecimal::from_str("12345678901234567890").unwrap();
        assert_eq!(LiteralValue::Decimal(d).data_type(), DataType::decimal(20, 0));

        let d = BigDecimal::from_str("12345678901234567890123456789012345678").unwrap();
        assert_eq!(LiteralValue::Decimal(d).data_type(), DataType::decimal(38, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(LiteralValue::Long(5).to_string(), "5L");
        assert_eq!(LiteralValue::String(String::from("it's")).to_string(), "'it''s'");
        assert_eq!(LiteralValue::Binary(vec![0xDE, 0xAD]).to_string(), "X'DEAD'");
        assert_eq!(
            LiteralValue::Interval(Interval::new(14, 0)).to_string(),
            "INTERVAL 14 MONTHS"
        );
    }

    #[test]
    fn test_every_variant_is_typed() {
        assert_eq!(LiteralValue::Null.data_type(), DataType::Null);
        assert_eq!(LiteralValue::Short(1).data_type(), DataType::Short);
        assert_eq!(
            LiteralValue::Interval(Interval::default()).data_type(),
            DataType::Interval
        );
    }
}
