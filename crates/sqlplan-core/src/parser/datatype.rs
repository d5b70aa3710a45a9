//! Data type grammar, used by CAST and the standalone type entry point.

use super::error::ParseError;
use super::parser::Parser;
use crate::ast::{DataType, StructField, DEFAULT_DECIMAL, MAX_DECIMAL_PRECISION};
use crate::lexer::TokenKind;

impl<'a> Parser<'a> {
    /// Parses a data type name with its parameters.
    pub(crate) fn parse_data_type(&mut self) -> Result<DataType, ParseError> {
        let span = self.current().span;
        let Some(word) = self.word_at(0) else {
            return Err(self.error_here("data type"));
        };
        let word = word.to_ascii_uppercase();
        self.advance();

        let data_type = match word.as_str() {
            "BOOLEAN" | "BOOL" => DataType::Boolean,
            "TINYINT" | "BYTE" => DataType::Byte,
            "SMALLINT" | "SHORT" => DataType::Short,
            "INT" | "INTEGER" => DataType::Integer,
            "BIGINT" | "LONG" => DataType::Long,
            "FLOAT" | "REAL" => DataType::Float,
            "DOUBLE" => DataType::Double,
            "DECIMAL" | "DEC" | "NUMERIC" => self.parse_decimal_parameters()?,
            "STRING" | "CLOB" => DataType::String,
            "VARCHAR" => match self.parse_optional_length()? {
                Some(length) => DataType::Varchar(length),
                None => DataType::String,
            },
            "CHAR" | "CHARACTER" => match self.parse_optional_length()? {
                Some(length) => DataType::Char(length),
                None => DataType::String,
            },
            "BINARY" | "BLOB" => DataType::Binary,
            "DATE" => DataType::Date,
            "TIMESTAMP" => DataType::Timestamp,
            "INTERVAL" => DataType::Interval,
            "ARRAY" => {
                self.expect(&TokenKind::Lt)?;
                let element = self.parse_data_type()?;
                self.expect_closing_angle()?;
                DataType::Array(Box::new(element))
            }
            "MAP" => {
                self.expect(&TokenKind::Lt)?;
                let key = self.parse_data_type()?;
                self.expect(&TokenKind::Comma)?;
                let value = self.parse_data_type()?;
                self.expect_closing_angle()?;
                DataType::Map(Box::new(key), Box::new(value))
            }
            "STRUCT" => {
                self.expect(&TokenKind::Lt)?;
                let mut fields = vec![];
                loop {
                    let name = self.identifier()?;
                    self.expect(&TokenKind::Colon)?;
                    let data_type = self.parse_data_type()?;
                    fields.push(StructField { name, data_type });
                    if !self.consume(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect_closing_angle()?;
                DataType::Struct(fields)
            }
            _ => {
                return Err(ParseError::new(
                    format!("DataType {} is not supported", word.to_lowercase()),
                    span,
                ));
            }
        };
        Ok(data_type)
    }

    /// `[(precision [, scale])]`, checked against the supported maximum.
    fn parse_decimal_parameters(&mut self) -> Result<DataType, ParseError> {
        if !self.check(&TokenKind::LeftParen) {
            let (precision, scale) = DEFAULT_DECIMAL;
            return Ok(DataType::decimal(precision, scale));
        }
        let open = self.advance().span;
        let precision = self.parse_type_number()?;
        let scale = if self.consume(&TokenKind::Comma) {
            self.parse_type_number()?
        } else {
            0
        };
        self.expect(&TokenKind::RightParen)?;

        if precision == 0 || precision > u32::from(MAX_DECIMAL_PRECISION) {
            return Err(ParseError::semantic(
                format!(
                    "Decimal precision {precision} is out of range; the maximum is {MAX_DECIMAL_PRECISION}"
                ),
                open,
            ));
        }
        if scale > precision {
            return Err(ParseError::semantic(
                format!("Decimal scale ({scale}) cannot be greater than precision ({precision})"),
                open,
            ));
        }
        // Both are bounded by MAX_DECIMAL_PRECISION here.
        let precision = u8::try_from(precision).unwrap_or(MAX_DECIMAL_PRECISION);
        let scale = u8::try_from(scale).unwrap_or(precision);
        Ok(DataType::decimal(precision, scale))
    }

    fn parse_optional_length(&mut self) -> Result<Option<u32>, ParseError> {
        if !self.consume(&TokenKind::LeftParen) {
            return Ok(None);
        }
        let length = self.parse_type_number()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(Some(length))
    }

    fn parse_type_number(&mut self) -> Result<u32, ParseError> {
        let token = self.current().clone();
        let TokenKind::Number(text) = &token.kind else {
            return Err(self.error_here("number"));
        };
        let value = text.parse::<u32>().map_err(|_| {
            ParseError::new(format!("Invalid type parameter {text}"), token.span)
        })?;
        self.advance();
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::DataType;
    use crate::config::ParserConfig;
    use crate::parser::parser::{ParameterMode, Parser};
    use crate::parser::ParseError;

    fn data_type(sql: &str) -> Result<DataType, ParseError> {
        let config = ParserConfig::default();
        Parser::new(sql, &config, ParameterMode::Unbound).parse_standalone_data_type()
    }

    #[test]
    fn test_aliases() {
        assert_eq!(data_type("long").unwrap(), DataType::Long);
        assert_eq!(data_type("CLOB").unwrap(), DataType::String);
        assert_eq!(data_type("varchar").unwrap(), DataType::String);
        assert_eq!(data_type("varchar(10)").unwrap(), DataType::Varchar(10));
        assert_eq!(data_type("decimal").unwrap(), DataType::decimal(10, 0));
    }

    #[test]
    fn test_nested_closing_angles() {
        let parsed = data_type("map<string, array<array<int>>>").unwrap();
        assert_eq!(parsed.to_string(), "MAP<STRING,ARRAY<ARRAY<INT>>>");
    }

    #[test]
    fn test_decimal_bounds() {
        assert!(data_type("decimal(39)").unwrap_err().is_semantic());
        assert!(data_type("decimal(5, 6)").unwrap_err().is_semantic());
        assert_eq!(data_type("numeric(38,38)").unwrap(), DataType::decimal(38, 38));
    }

    #[test]
    fn test_unknown_type() {
        let err = data_type("uuid").unwrap_err();
        assert!(err.message.contains("uuid"));
    }
}
