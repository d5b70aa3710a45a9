//! DML statements and the commands that are never cached.

use tracing::{debug, warn};

use super::error::ParseError;
use super::parser::Parser;
use crate::ast::{Command, Expr, LogicalPlan};
use crate::lexer::{Keyword, TokenKind};

impl<'a> Parser<'a> {
    /// INSERT or PUT. With the external fallback enabled, an `INTO` statement
    /// whose source is not a query is kept verbatim for the external DML
    /// handler. Anything else reports its syntax error.
    pub(super) fn parse_insert_or_put(&mut self) -> Result<LogicalPlan, ParseError> {
        if !self.config.external_dml_fallback {
            return self.parse_insert_or_put_body();
        }

        let start = self.position();
        if let Some(plan) = self.attempt(Self::parse_whole_insert_or_put)? {
            return Ok(plan);
        }
        if self.routes_to_external_dml(start)? {
            self.parse_external_dml(start)
        } else {
            self.seek(start);
            self.parse_whole_insert_or_put()
        }
    }

    fn parse_whole_insert_or_put(&mut self) -> Result<LogicalPlan, ParseError> {
        let plan = self.parse_insert_or_put_body()?;
        self.consume(&TokenKind::Semicolon);
        self.expect_eof()?;
        Ok(plan)
    }

    /// `(INSERT|PUT) INTO [TABLE] t [(cols)]` followed by something other
    /// than SELECT, WITH, VALUES or a parenthesized query.
    fn routes_to_external_dml(&mut self, start: usize) -> Result<bool, ParseError> {
        self.seek(start);
        let header = self.attempt(|p| {
            if !p.consume_keyword(Keyword::Insert) {
                p.expect_keyword(Keyword::Put)?;
            }
            p.expect_keyword(Keyword::Into)?;
            p.consume_keyword(Keyword::Table);
            p.parse_table_identifier()?;
            p.attempt(|p| {
                p.expect(&TokenKind::LeftParen)?;
                p.parse_identifier_list()?;
                p.expect(&TokenKind::RightParen)?;
                Ok(())
            })?;
            Ok(())
        })?;
        let query_source = self.at_query_start()
            || self.check_keyword(Keyword::Values)
            || self.check(&TokenKind::LeftParen);
        self.seek(start);
        Ok(header.is_some() && !query_source)
    }

    /// `INSERT (INTO|OVERWRITE) [TABLE] t [(cols)] query` or
    /// `PUT INTO [TABLE] t [(cols)] query`.
    fn parse_insert_or_put_body(&mut self) -> Result<LogicalPlan, ParseError> {
        let put = self.consume_keyword(Keyword::Put);
        let overwrite = if put {
            self.expect_keyword(Keyword::Into)?;
            false
        } else {
            self.expect_keyword(Keyword::Insert)?;
            if self.consume_keyword(Keyword::Overwrite) {
                true
            } else {
                self.expect_keyword(Keyword::Into)?;
                false
            }
        };
        self.consume_keyword(Keyword::Table);
        let table = self.parse_table_identifier()?;

        let columns = self
            .attempt(|p| {
                p.expect(&TokenKind::LeftParen)?;
                let columns = p.parse_identifier_list()?;
                p.expect(&TokenKind::RightParen)?;
                Ok(columns)
            })?
            .unwrap_or_default();

        let source = Box::new(self.parse_query()?);
        Ok(if put {
            LogicalPlan::Put {
                table,
                columns,
                source,
            }
        } else {
            LogicalPlan::Insert {
                table,
                columns,
                overwrite,
                source,
            }
        })
    }

    /// `(INSERT|PUT) INTO [TABLE] t` followed by anything.
    fn parse_external_dml(&mut self, start: usize) -> Result<LogicalPlan, ParseError> {
        let reason = self
            .last_failure()
            .map(ToString::to_string)
            .unwrap_or_default();
        self.seek(start);
        if !self.consume_keyword(Keyword::Insert) {
            self.expect_keyword(Keyword::Put)?;
        }
        self.expect_keyword(Keyword::Into)?;
        self.consume_keyword(Keyword::Table);
        let table = self.parse_table_identifier()?;
        let rest_start = self.current().span.start;
        let sql = self.rest_of_statement(rest_start);

        warn!(table = %table, error = %reason, "statement routed to external DML handling");
        self.ctx.disable_caching("external DML");
        Ok(LogicalPlan::ExternalDml { table, sql })
    }

    /// `UPDATE t [[AS] alias] SET col = expr, ... [FROM relations] [WHERE cond]`
    pub(super) fn parse_update(&mut self) -> Result<LogicalPlan, ParseError> {
        self.expect_keyword(Keyword::Update)?;
        let table = self.parse_table_identifier()?;
        let alias = self.parse_optional_alias()?;
        self.expect_keyword(Keyword::Set)?;

        let assignments = self.tokenized(|p| {
            let mut assignments = vec![];
            loop {
                let mut column = vec![p.identifier()?];
                while p.consume(&TokenKind::Dot) {
                    column.push(p.identifier()?);
                }
                p.expect(&TokenKind::Eq)?;
                let value = p.parse_expr(0)?;
                assignments.push((column, value));
                if !p.consume(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(assignments)
        })?;

        let from = if self.consume_keyword(Keyword::From) {
            Some(Box::new(self.suspended(Self::parse_from_clause)?))
        } else {
            None
        };
        let predicate = self.parse_optional_where()?;

        Ok(LogicalPlan::Update {
            table,
            alias,
            assignments,
            from,
            predicate,
        })
    }

    /// `DELETE FROM t [[AS] alias] [WHERE cond]`
    pub(super) fn parse_delete(&mut self) -> Result<LogicalPlan, ParseError> {
        self.expect_keyword(Keyword::Delete)?;
        self.expect_keyword(Keyword::From)?;
        let table = self.parse_table_identifier()?;
        let alias = self.parse_optional_alias()?;
        let predicate = self.parse_optional_where()?;
        Ok(LogicalPlan::Delete {
            table,
            alias,
            predicate,
        })
    }

    fn parse_optional_where(&mut self) -> Result<Option<Expr>, ParseError> {
        if self.consume_keyword(Keyword::Where) {
            Ok(Some(self.tokenized(|p| p.parse_expr(0))?))
        } else {
            Ok(None)
        }
    }

    // --- Commands ---

    /// `SET [key [= value]]`, both sides kept as written.
    pub(super) fn parse_set(&mut self) -> Result<LogicalPlan, ParseError> {
        self.expect_keyword(Keyword::Set)?;
        let start = self.current().span.start;
        let text = self.rest_of_statement(start);

        let pair = text
            .split_once('=')
            .map(|(key, value)| (String::from(key.trim()), String::from(value.trim())));
        let (key, value) = match pair {
            _ if text.is_empty() => (None, None),
            Some((key, value)) => (Some(key), Some(value)),
            None => (Some(text), None),
        };
        debug!(key = ?key, "SET command");
        Ok(LogicalPlan::Command(Command::Set { key, value }))
    }

    /// `CACHE [LAZY] TABLE t [[AS] query]`
    pub(super) fn parse_cache(&mut self) -> Result<LogicalPlan, ParseError> {
        self.expect_keyword(Keyword::Cache)?;
        let lazy = self.consume_keyword(Keyword::Lazy);
        self.expect_keyword(Keyword::Table)?;
        let table = self.parse_table_identifier()?;
        let has_query = self.consume_keyword(Keyword::As)
            || self.at_query_start()
            || self.check(&TokenKind::LeftParen);
        let query = if has_query {
            Some(Box::new(self.parse_query()?))
        } else {
            None
        };
        Ok(LogicalPlan::Command(Command::CacheTable { table, lazy, query }))
    }

    /// `UNCACHE TABLE [IF EXISTS] t`
    pub(super) fn parse_uncache(&mut self) -> Result<LogicalPlan, ParseError> {
        self.expect_keyword(Keyword::Uncache)?;
        self.expect_keyword(Keyword::Table)?;
        let if_exists = self.consume_pair(Keyword::If, Keyword::Exists);
        let table = self.parse_table_identifier()?;
        Ok(LogicalPlan::Command(Command::UncacheTable { table, if_exists }))
    }

    /// `DESCRIBE|DESC [EXTENDED] [TABLE] t`
    pub(super) fn parse_describe(&mut self) -> Result<LogicalPlan, ParseError> {
        self.advance();
        let extended = self.consume_keyword(Keyword::Extended);
        self.consume_keyword(Keyword::Table);
        let table = self.parse_table_identifier()?;
        Ok(LogicalPlan::Command(Command::Describe { table, extended }))
    }

    /// `EXPLAIN [EXTENDED] statement`; the inner statement is never cached.
    pub(super) fn parse_explain(&mut self) -> Result<LogicalPlan, ParseError> {
        self.expect_keyword(Keyword::Explain)?;
        let extended = self.consume_keyword(Keyword::Extended);
        let statement = Box::new(self.parse_statement_body(false)?);
        Ok(LogicalPlan::Command(Command::Explain {
            statement,
            extended,
        }))
    }

    /// CREATE, DROP, ALTER, TRUNCATE, GRANT and REVOKE, kept verbatim.
    pub(super) fn parse_ddl(&mut self) -> Result<LogicalPlan, ParseError> {
        let start = self.current().span.start;
        let sql = self.rest_of_statement(start);
        debug!(sql = %sql, "DDL statement");
        Ok(LogicalPlan::Command(Command::Ddl { sql }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Command, LogicalPlan, TableIdentifier};
    use crate::config::ParserConfig;
    use crate::parser::parser::{ParameterMode, Parser};

    fn statement(sql: &str, config: &ParserConfig) -> LogicalPlan {
        let mut parser = Parser::new(sql, config, ParameterMode::Unbound);
        parser.parse_statement().unwrap()
    }

    #[test]
    fn test_set_raw_text() {
        let plan = statement("SET spark.sql.shuffle.partitions = 10", &ParserConfig::default());
        assert_eq!(
            plan,
            LogicalPlan::Command(Command::Set {
                key: Some("spark.sql.shuffle.partitions".into()),
                value: Some("10".into()),
            })
        );
        let plan = statement("SET", &ParserConfig::default());
        assert_eq!(
            plan,
            LogicalPlan::Command(Command::Set {
                key: None,
                value: None
            })
        );
    }

    #[test]
    fn test_external_fallback() {
        let config = ParserConfig {
            external_dml_fallback: true,
            ..ParserConfig::default()
        };
        let plan = statement("INSERT INTO ext.t some vendor syntax;", &config);
        let LogicalPlan::ExternalDml { table, sql } = plan else {
            panic!("expected external DML");
        };
        assert_eq!(table, TableIdentifier::qualified("ext", "t"));
        assert_eq!(sql, "some vendor syntax");
    }

    #[test]
    fn test_fallback_skips_query_sources() {
        let config = ParserConfig {
            external_dml_fallback: true,
            ..ParserConfig::default()
        };
        for sql in ["INSERT INTO t SELECT a FORM s", "INSERT OVERWRITE t vendor syntax"] {
            let mut parser = Parser::new(sql, &config, ParameterMode::Unbound);
            assert!(parser.parse_statement().is_err(), "{sql}");
        }
    }

    #[test]
    fn test_fallback_disabled_reports_error() {
        let config = ParserConfig {
            external_dml_fallback: false,
            ..ParserConfig::default()
        };
        let mut parser = Parser::new(
            "INSERT INTO t some vendor syntax",
            &config,
            ParameterMode::Unbound,
        );
        assert!(parser.parse_statement().is_err());
    }
}
