//! Literal type inference: numeric text, intervals and date/time strings.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};

use crate::ast::{
    Interval, LiteralValue, MAX_DECIMAL_PRECISION, MICROS_PER_DAY, MICROS_PER_HOUR,
    MICROS_PER_MILLISECOND, MICROS_PER_MINUTE, MICROS_PER_SECOND, MICROS_PER_WEEK,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    Byte,
    Short,
    Long,
    Float,
    Double,
    BigDecimal,
}

fn split_suffix(text: &str) -> (&str, Option<Suffix>) {
    let len = text.len();
    if len > 2 && text[len - 2..].eq_ignore_ascii_case("bd") {
        return (&text[..len - 2], Some(Suffix::BigDecimal));
    }
    let suffix = match text.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('Y') => Suffix::Byte,
        Some('S') => Suffix::Short,
        Some('L') => Suffix::Long,
        Some('F') => Suffix::Float,
        Some('D') => Suffix::Double,
        _ => return (text, None),
    };
    (&text[..len - 1], Some(suffix))
}

/// Exact decimal with a non-negative scale and at most
/// [`MAX_DECIMAL_PRECISION`] digits.
fn parse_decimal(text: &str) -> Result<BigDecimal, String> {
    let digits = text.strip_suffix('.').unwrap_or(text);
    let value =
        BigDecimal::from_str(digits).map_err(|_| format!("Invalid decimal literal {text}"))?;
    let (_, scale) = value.as_bigint_and_exponent();
    let value = if scale < 0 { value.with_scale(0) } else { value };
    let (_, scale) = value.as_bigint_and_exponent();
    let max = u64::from(MAX_DECIMAL_PRECISION);
    if value.digits() > max || u64::try_from(scale).unwrap_or(0) > max {
        return Err(format!(
            "Decimal literal {text} exceeds the maximum precision of {MAX_DECIMAL_PRECISION}"
        ));
    }
    Ok(value)
}

/// Infers the typed value of a numeric token.
///
/// `negative` folds a directly preceding unary minus into the value so that
/// the minimum value of each integral type is representable.
///
/// # Errors
///
/// Returns a message when the text does not fit the type it selects.
pub(crate) fn numeric_literal(text: &str, negative: bool) -> Result<LiteralValue, String> {
    let (body, suffix) = split_suffix(text);
    let body = if body.starts_with('.') {
        format!("0{body}")
    } else {
        String::from(body)
    };
    let signed = if negative { format!("-{body}") } else { body };
    let integral = signed
        .trim_start_matches('-')
        .bytes()
        .all(|b| b.is_ascii_digit());
    let out_of_range = |ty: &str| format!("Numeric literal {text} does not fit in range for {ty}");

    match suffix {
        Some(Suffix::Double) => match signed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(LiteralValue::Double(v)),
            _ => Err(out_of_range("DOUBLE")),
        },
        Some(Suffix::Float) => match signed.parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(LiteralValue::Float(v)),
            _ => Err(out_of_range("FLOAT")),
        },
        Some(Suffix::Long) if integral => signed
            .parse::<i64>()
            .map(LiteralValue::Long)
            .map_err(|_| out_of_range("BIGINT")),
        Some(Suffix::Short) if integral => signed
            .parse::<i16>()
            .map(LiteralValue::Short)
            .map_err(|_| out_of_range("SMALLINT")),
        Some(Suffix::Byte) if integral => signed
            .parse::<i8>()
            .map(LiteralValue::Byte)
            .map_err(|_| out_of_range("TINYINT")),
        Some(Suffix::Long | Suffix::Short | Suffix::Byte) => {
            Err(format!("Integral suffix on non-integral literal {text}"))
        }
        Some(Suffix::BigDecimal) => parse_decimal(&signed).map(LiteralValue::Decimal),
        None if signed.contains(['e', 'E']) => match signed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(LiteralValue::Double(v)),
            _ => Err(out_of_range("DOUBLE")),
        },
        None if !integral => parse_decimal(&signed).map(LiteralValue::Decimal),
        None => {
            if let Ok(v) = signed.parse::<i32>() {
                Ok(LiteralValue::Int(v))
            } else if let Ok(v) = signed.parse::<i64>() {
                Ok(LiteralValue::Long(v))
            } else {
                parse_decimal(&signed).map(LiteralValue::Decimal)
            }
        }
    }
}

/// Units of the unit-sequence interval form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntervalUnit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
}

impl IntervalUnit {
    /// Matches a unit word, singular or plural, ignoring case.
    pub(crate) fn from_word(word: &str) -> Option<Self> {
        let upper = word.to_ascii_uppercase();
        let singular = upper.strip_suffix('S').unwrap_or(&upper);
        match singular {
            "YEAR" => Some(Self::Year),
            "MONTH" => Some(Self::Month),
            "WEEK" => Some(Self::Week),
            "DAY" => Some(Self::Day),
            "HOUR" => Some(Self::Hour),
            "MINUTE" => Some(Self::Minute),
            "SECOND" => Some(Self::Second),
            "MILLISECOND" => Some(Self::Millisecond),
            "MICROSECOND" => Some(Self::Microsecond),
            _ => None,
        }
    }

    /// Adds `value` of this unit to an interval, or `None` on overflow.
    pub(crate) fn accumulate(self, acc: Interval, value: i64) -> Option<Interval> {
        let months = |m: i64| {
            let m = i32::try_from(m).ok()?;
            Some(Interval::new(acc.months.checked_add(m)?, acc.microseconds))
        };
        let micros = |unit: i64| {
            let us = value.checked_mul(unit)?;
            Some(Interval::new(acc.months, acc.microseconds.checked_add(us)?))
        };
        match self {
            Self::Year => months(value.checked_mul(12)?),
            Self::Month => months(value),
            Self::Week => micros(MICROS_PER_WEEK),
            Self::Day => micros(MICROS_PER_DAY),
            Self::Hour => micros(MICROS_PER_HOUR),
            Self::Minute => micros(MICROS_PER_MINUTE),
            Self::Second => micros(MICROS_PER_SECOND),
            Self::Millisecond => micros(MICROS_PER_MILLISECOND),
            Self::Microsecond => micros(1),
        }
    }
}

fn strip_sign(text: &str) -> (i64, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (-1, rest)
    } else {
        (1, text.strip_prefix('+').unwrap_or(text))
    }
}

fn bounded(text: &str, max: i64) -> Option<i64> {
    let value: i64 = text.trim().parse().ok()?;
    (0..=max).contains(&value).then_some(value)
}

/// Parses the `[+|-]y-m` body of `INTERVAL '...' YEAR TO MONTH`.
///
/// # Errors
///
/// Returns a message when the text does not match or overflows.
pub(crate) fn year_month_interval(text: &str) -> Result<Interval, String> {
    let err = || format!("Interval string does not match year-month format of 'y-m': {text}");
    let (sign, rest) = strip_sign(text.trim());
    let (years, months) = rest.split_once('-').ok_or_else(err)?;
    let years: i64 = years.trim().parse().map_err(|_| err())?;
    let months = bounded(months, 11).ok_or_else(err)?;
    let total = years
        .checked_mul(12)
        .and_then(|y| y.checked_add(months))
        .and_then(|m| m.checked_mul(sign))
        .and_then(|m| i32::try_from(m).ok())
        .ok_or_else(|| format!("Interval value out of range: {text}"))?;
    Ok(Interval::new(total, 0))
}

/// Parses the `[+|-]d h:m:s[.n]` body of `INTERVAL '...' DAY TO SECOND`.
///
/// # Errors
///
/// Returns a message when the text does not match or overflows.
pub(crate) fn day_time_interval(text: &str) -> Result<Interval, String> {
    let err = || format!("Interval string does not match day-time format of 'd h:m:s.n': {text}");
    let (sign, rest) = strip_sign(text.trim());
    let (days, time) = rest.split_once(' ').ok_or_else(err)?;
    let days: i64 = days.parse().map_err(|_| err())?;

    let mut parts = time.trim().split(':');
    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(err());
    };
    let hours = bounded(hours, 23).ok_or_else(err)?;
    let minutes = bounded(minutes, 59).ok_or_else(err)?;
    let (seconds, fraction) = seconds.split_once('.').unwrap_or((seconds, ""));
    let seconds = bounded(seconds, 59).ok_or_else(err)?;
    if fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let nanos: i64 = format!("{fraction:0<9}").parse().map_err(|_| err())?;

    let total = days
        .checked_mul(MICROS_PER_DAY)
        .and_then(|us| us.checked_add(hours * MICROS_PER_HOUR))
        .and_then(|us| us.checked_add(minutes * MICROS_PER_MINUTE))
        .and_then(|us| us.checked_add(seconds * MICROS_PER_SECOND))
        .and_then(|us| us.checked_add(nanos / 1_000))
        .and_then(|us| us.checked_mul(sign))
        .ok_or_else(|| format!("Interval value out of range: {text}"))?;
    Ok(Interval::new(0, total))
}

/// Parses the body of a `DATE '...'` literal.
///
/// # Errors
///
/// Returns a message for anything but a valid `yyyy-mm-dd` date.
pub(crate) fn date_literal(text: &str) -> Result<LiteralValue, String> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map(LiteralValue::Date)
        .map_err(|e| format!("Invalid DATE literal '{text}': {e}"))
}

/// Parses the body of a `TIMESTAMP '...'` literal; a bare date means midnight.
///
/// # Errors
///
/// Returns a message when no accepted layout matches.
pub(crate) fn timestamp_literal(text: &str) -> Result<LiteralValue, String> {
    const LAYOUTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ];
    let trimmed = text.trim();
    LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(trimmed, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(LiteralValue::Timestamp)
        .ok_or_else(|| format!("Invalid TIMESTAMP literal '{text}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_narrowing() {
        assert_eq!(numeric_literal("42", false), Ok(LiteralValue::Int(42)));
        assert_eq!(
            numeric_literal("2147483648", false),
            Ok(LiteralValue::Long(2_147_483_648))
        );
        assert_eq!(
            numeric_literal("2147483648", true),
            Ok(LiteralValue::Int(i32::MIN))
        );
        let big = numeric_literal("92233720368547758070", false).unwrap();
        assert!(matches!(big, LiteralValue::Decimal(_)));
        assert_eq!(big.data_type().to_string(), "DECIMAL(20,0)");
    }

    #[test]
    fn test_decimal_and_double() {
        let d = numeric_literal("3.14", false).unwrap();
        assert_eq!(d.data_type().to_string(), "DECIMAL(3,2)");
        assert_eq!(numeric_literal("1e3", false), Ok(LiteralValue::Double(1000.0)));
        assert_eq!(numeric_literal("1.5E-1", false), Ok(LiteralValue::Double(0.15)));
        let half = numeric_literal(".5", false).unwrap();
        assert_eq!(half.data_type().to_string(), "DECIMAL(1,1)");
    }

    #[test]
    fn test_suffixes_force_type() {
        assert_eq!(numeric_literal("10L", false), Ok(LiteralValue::Long(10)));
        assert_eq!(numeric_literal("10s", false), Ok(LiteralValue::Short(10)));
        assert_eq!(numeric_literal("10Y", false), Ok(LiteralValue::Byte(10)));
        assert_eq!(numeric_literal("2D", false), Ok(LiteralValue::Double(2.0)));
        assert_eq!(numeric_literal("2.5F", false), Ok(LiteralValue::Float(2.5)));
        let bd = numeric_literal("7BD", false).unwrap();
        assert_eq!(bd.data_type().to_string(), "DECIMAL(1,0)");
        let bd = numeric_literal("1.5e3BD", false).unwrap();
        assert_eq!(bd.data_type().to_string(), "DECIMAL(4,0)");
    }

    #[test]
    fn test_trailing_decimal_point() {
        let value = numeric_literal("1.", false).unwrap();
        assert_eq!(value.data_type().to_string(), "DECIMAL(1,0)");
        assert_eq!(numeric_literal("1.D", false), Ok(LiteralValue::Double(1.0)));
    }

    #[test]
    fn test_decimal_precision_limit() {
        let wide = numeric_literal("12345678901234567890123456789012345678", false).unwrap();
        assert_eq!(wide.data_type().to_string(), "DECIMAL(38,0)");
        let err = numeric_literal("123456789012345678901234567890123456789", false).unwrap_err();
        assert!(err.contains("maximum precision of 38"), "{err}");
    }

    #[test]
    fn test_suffix_range_errors() {
        assert!(numeric_literal("128Y", false).is_err());
        assert_eq!(numeric_literal("128Y", true), Ok(LiteralValue::Byte(-128)));
        assert!(numeric_literal("40000S", false).is_err());
        assert!(numeric_literal("1.5L", false).is_err());
    }

    #[test]
    fn test_unit_accumulation() {
        let i = IntervalUnit::Year
            .accumulate(Interval::default(), 1)
            .and_then(|i| IntervalUnit::Month.accumulate(i, 2))
            .unwrap();
        assert_eq!(i, Interval::new(14, 0));

        let d = IntervalUnit::Day.accumulate(Interval::default(), 2).unwrap();
        assert_eq!(d, Interval::new(0, 2 * 86_400_000_000));

        assert!(IntervalUnit::Week
            .accumulate(Interval::default(), i64::MAX)
            .is_none());
    }

    #[test]
    fn test_unit_words() {
        assert_eq!(IntervalUnit::from_word("days"), Some(IntervalUnit::Day));
        assert_eq!(IntervalUnit::from_word("Second"), Some(IntervalUnit::Second));
        assert_eq!(IntervalUnit::from_word("fortnight"), None);
    }

    #[test]
    fn test_compound_intervals() {
        assert_eq!(year_month_interval("1-2"), Ok(Interval::new(14, 0)));
        assert_eq!(year_month_interval("-1-2"), Ok(Interval::new(-14, 0)));
        assert!(year_month_interval("1-12").is_err());

        let dt = day_time_interval("1 02:03:04.5").unwrap();
        assert_eq!(
            dt.microseconds,
            MICROS_PER_DAY + 2 * MICROS_PER_HOUR + 3 * MICROS_PER_MINUTE + 4_500_000
        );
        assert!(day_time_interval("1 24:00:00").is_err());
    }

    #[test]
    fn test_date_time_literals() {
        assert!(date_literal("2024-02-29").is_ok());
        assert!(date_literal("2023-02-29").is_err());
        assert!(timestamp_literal("2024-01-01 10:11:12.345").is_ok());
        assert!(timestamp_literal("2024-01-01").is_ok());
        assert!(timestamp_literal("yesterday").is_err());
    }
}
