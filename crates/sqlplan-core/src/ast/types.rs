//! SQL data type definitions.

use core::fmt;

use serde::Serialize;

/// Largest precision a decimal type may declare.
pub const MAX_DECIMAL_PRECISION: u8 = 38;

/// Precision and scale of an unparameterized `DECIMAL`.
pub const DEFAULT_DECIMAL: (u8, u8) = (10, 0);

/// SQL data types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    /// Type of the untyped NULL literal.
    Null,
    /// Boolean.
    Boolean,
    /// 8-bit signed integer (TINYINT, BYTE).
    Byte,
    /// 16-bit signed integer (SMALLINT, SHORT).
    Short,
    /// 32-bit signed integer (INT, INTEGER).
    Integer,
    /// 64-bit signed integer (BIGINT, LONG).
    Long,
    /// 4-byte float (FLOAT, REAL).
    Float,
    /// 8-byte float.
    Double,
    /// Exact decimal.
    Decimal {
        /// Total number of digits.
        precision: u8,
        /// Number of digits after the decimal point.
        scale: u8,
    },
    /// Unbounded string (STRING, CLOB).
    String,
    /// Variable-length string with a maximum length.
    Varchar(u32),
    /// Fixed-length string.
    Char(u32),
    /// Binary data (BINARY, BLOB).
    Binary,
    /// Calendar date.
    Date,
    /// Timestamp without time zone.
    Timestamp,
    /// Calendar interval.
    Interval,
    /// Array of elements.
    Array(Box<DataType>),
    /// Map from keys to values.
    Map(Box<DataType>, Box<DataType>),
    /// Struct with named fields.
    Struct(Vec<StructField>),
}

/// A named field of a struct type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StructField {
    /// Field name.
    pub name: String,
    /// Field type.
    pub data_type: DataType,
}

impl DataType {
    /// Creates a decimal type.
    #[must_use]
    pub const fn decimal(precision: u8, scale: u8) -> Self {
        Self::Decimal { precision, scale }
    }

    /// Returns true for the integral and floating point types and decimals.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Byte
                | Self::Short
                | Self::Integer
                | Self::Long
                | Self::Float
                | Self::Double
                | Self::Decimal { .. }
        )
    }

    /// Returns true for the character string types.
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Self::String | Self::Varchar(_) | Self::Char(_))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Byte => f.write_str("TINYINT"),
            Self::Short => f.write_str("SMALLINT"),
            Self::Integer => f.write_str("INT"),
            Self::Long => f.write_str("BIGINT"),
            Self::Float => f.write_str("FLOAT"),
            Self::Double => f.write_str("DOUBLE"),
            Self::Decimal { precision, scale } => write!(f, "DECIMAL({precision},{scale})"),
            Self::String => f.write_str("STRING"),
            Self::Varchar(n) => write!(f, "VARCHAR({n})"),
            Self::Char(n) => write!(f, "CHAR({n})"),
            Self::Binary => f.write_str("BINARY"),
            Self::Date => f.write_str("DATE"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::Interval => f.write_str("INTERVAL"),
            Self::Array(element) => write!(f, "ARRAY<{element}>"),
            Self::Map(key, value) => write!(f, "MAP<{key},{value}>"),
            Self::Struct(fields) => {
                f.write_str("STRUCT<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}:{}", field.name, field.data_type)?;
                }
                f.write_str(">")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_display() {
        assert_eq!(DataType::Integer.to_string(), "INT");
        assert_eq!(DataType::Varchar(255).to_string(), "VARCHAR(255)");
        assert_eq!(DataType::decimal(10, 2).to_string(), "DECIMAL(10,2)");
    }

    #[test]
    fn test_nested_display() {
        let ty = DataType::Map(
            Box::new(DataType::String),
            Box::new(DataType::Array(Box::new(DataType::Long))),
        );
        assert_eq!(ty.to_string(), "MAP<STRING,ARRAY<BIGINT>>");

        let st = DataType::Struct(vec![StructField {
            name: String::from("a"),
            data_type: DataType::Integer,
        }]);
        assert_eq!(st.to_string(), "STRUCT<a:INT>");
    }

    #[test]
    fn test_type_predicates() {
        assert!(DataType::decimal(3, 2).is_numeric());
        assert!(!DataType::String.is_numeric());
        assert!(DataType::Char(3).is_string());
    }
}
