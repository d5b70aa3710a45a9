//! SQL Parser
//!
//! A hand-written recursive descent parser with Pratt expression parsing and
//! ordered-choice backtracking. Literals of cacheable statements are captured
//! as parameters while parsing.

mod context;
mod datatype;
mod dml;
mod error;
mod expr;
mod functions;
mod hints;
mod like;
mod literal;
#[allow(clippy::module_inception)]
mod parser;
mod pratt;
mod query;

use tracing::debug;

pub use context::TokenizedLiteral;
pub use error::{ErrorKind, ParseError};

use self::parser::{ParameterMode, Parser};
use crate::ast::{DataType, Expr, LiteralValue, TableIdentifier};
use crate::config::ParserConfig;
use crate::statement::ParsedStatement;

/// Entry point for parsing statements, expressions, types and table names.
///
/// Each call parses independently; the parser holds only its configuration.
#[derive(Debug, Clone, Default)]
pub struct SqlParser {
    config: ParserConfig,
}

impl SqlParser {
    /// Creates a parser with the given configuration.
    #[must_use]
    pub const fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses one statement. A `?` marker is an error here.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] describing the furthest point the input
    /// could be parsed to, or a semantic violation.
    pub fn parse(&mut self, sql: &str) -> Result<ParsedStatement, ParseError> {
        self.run(sql, ParameterMode::Unbound)
    }

    /// Parses a statement for preparation; `?` markers become
    /// [`Expr::Parameter`] nodes numbered from 1.
    ///
    /// # Errors
    ///
    /// See [`SqlParser::parse`].
    pub fn prepare(&mut self, sql: &str) -> Result<ParsedStatement, ParseError> {
        self.run(sql, ParameterMode::Prepare)
    }

    /// Parses a prepared statement with `values` bound to its `?` markers in
    /// order. Bound values are captured like literals.
    ///
    /// # Errors
    ///
    /// See [`SqlParser::parse`]; also fails when a marker has no value.
    pub fn parse_with_parameters(
        &mut self,
        sql: &str,
        values: &[LiteralValue],
    ) -> Result<ParsedStatement, ParseError> {
        self.run(sql, ParameterMode::Bound(values))
    }

    /// Parses a standalone expression. Literals are never tokenized.
    ///
    /// # Errors
    ///
    /// See [`SqlParser::parse`].
    pub fn parse_expression(&mut self, sql: &str) -> Result<Expr, ParseError> {
        let mut parser = Parser::new(sql, &self.config, ParameterMode::Prepare);
        parser
            .parse_standalone_expression()
            .map_err(|e| parser.furthest_error(e).with_context(sql))
    }

    /// Parses a standalone data type such as `map<string, array<int>>`.
    ///
    /// # Errors
    ///
    /// See [`SqlParser::parse`].
    pub fn parse_data_type(&mut self, sql: &str) -> Result<DataType, ParseError> {
        let mut parser = Parser::new(sql, &self.config, ParameterMode::Unbound);
        parser
            .parse_standalone_data_type()
            .map_err(|e| parser.furthest_error(e).with_context(sql))
    }

    /// Parses `[database.]table`.
    ///
    /// # Errors
    ///
    /// See [`SqlParser::parse`].
    pub fn parse_table_identifier(&mut self, sql: &str) -> Result<TableIdentifier, ParseError> {
        let mut parser = Parser::new(sql, &self.config, ParameterMode::Unbound);
        parser
            .parse_standalone_table_identifier()
            .map_err(|e| parser.furthest_error(e).with_context(sql))
    }

    fn run(&self, sql: &str, mode: ParameterMode<'_>) -> Result<ParsedStatement, ParseError> {
        debug!(len = sql.len(), "parsing statement");
        let mut parser = Parser::new(sql, &self.config, mode);
        let result = parser
            .parse_statement()
            .and_then(|plan| parser.finish(plan));
        result.map_err(|e| parser.furthest_error(e).with_context(sql))
    }
}
