//! Parser state, token cursor and the top-level statement dispatcher.

use std::ops::RangeInclusive;

use tracing::{debug, trace};

use super::context::{TokenizationContext, TokenizedLiteral};
use super::error::ParseError;
use super::hints::{resolve_hints, HintTarget};
use crate::ast::{DataType, Expr, LiteralValue, LogicalPlan, TableIdentifier};
use crate::config::ParserConfig;
use crate::lexer::{registry, HintComment, Keyword, KeywordClass, Lexer, Span, Token, TokenKind};
use crate::statement::{materialize_plan, ParsedStatement};

/// How `?` markers are treated.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ParameterMode<'a> {
    /// Prepare phase: `?` stays a positional parameter.
    Prepare,
    /// Execution with values bound by position.
    Bound(&'a [LiteralValue]),
    /// No values available; any `?` is an error.
    Unbound,
}

/// State restored when an ordered alternative fails.
struct Snapshot {
    pos: usize,
    split_gt: u8,
    ctx: TokenizationContext,
    positional: usize,
    hint_targets: usize,
}

/// SQL Parser over a pre-scanned token stream.
pub(crate) struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    hint_comments: Vec<HintComment>,
    pos: usize,
    /// Number of `>` already taken from a `>>`/`>>>` token at `pos`.
    split_gt: u8,
    pub(super) config: &'a ParserConfig,
    pub(super) ctx: TokenizationContext,
    parameters: ParameterMode<'a>,
    positional: usize,
    hint_targets: Vec<HintTarget>,
    furthest: Option<ParseError>,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given input.
    pub(crate) fn new(
        source: &'a str,
        config: &'a ParserConfig,
        parameters: ParameterMode<'a>,
    ) -> Self {
        let scanned = Lexer::new(source).tokenize();
        Self {
            source,
            tokens: scanned.tokens,
            hint_comments: scanned.hints,
            pos: 0,
            split_gt: 0,
            config,
            ctx: TokenizationContext::default(),
            parameters,
            positional: 0,
            hint_targets: Vec::new(),
            furthest: None,
        }
    }

    // --- Statements ---

    /// Parses one statement, an optional `;`, and requires end of input.
    pub(crate) fn parse_statement(&mut self) -> Result<LogicalPlan, ParseError> {
        let plan = self.parse_statement_body(true)?;
        self.consume(&TokenKind::Semicolon);
        self.expect_eof()?;
        Ok(plan)
    }

    /// Chooses between cacheable statements, parsed with tokenization enabled,
    /// and administrative ones, parsed with it disabled.
    pub(super) fn parse_statement_body(
        &mut self,
        allow_caching: bool,
    ) -> Result<LogicalPlan, ParseError> {
        let kind = self.current().kind.clone();
        let cacheable = matches!(
            kind,
            TokenKind::LeftParen
                | TokenKind::Keyword(
                    Keyword::Select
                        | Keyword::With
                        | Keyword::Values
                        | Keyword::Insert
                        | Keyword::Put
                        | Keyword::Update
                        | Keyword::Delete
                )
        );
        let enabled = cacheable && allow_caching && self.config.tokenize_literals;
        self.ctx.set_enabled(enabled);
        debug!(statement = %kind.describe(), tokenize = enabled, "dispatching statement");

        match kind {
            TokenKind::Keyword(Keyword::With) => self.parse_cte_statement(),
            TokenKind::Keyword(Keyword::Select | Keyword::Values) | TokenKind::LeftParen => {
                self.parse_query()
            }
            TokenKind::Keyword(Keyword::Insert | Keyword::Put) => self.parse_insert_or_put(),
            TokenKind::Keyword(Keyword::Update) => self.parse_update(),
            TokenKind::Keyword(Keyword::Delete) => self.parse_delete(),
            TokenKind::Keyword(Keyword::Set) => self.parse_set(),
            TokenKind::Keyword(Keyword::Cache) => self.parse_cache(),
            TokenKind::Keyword(Keyword::Uncache) => self.parse_uncache(),
            TokenKind::Keyword(Keyword::Describe | Keyword::Desc) => self.parse_describe(),
            TokenKind::Keyword(Keyword::Explain) => self.parse_explain(),
            TokenKind::Keyword(Keyword::Create | Keyword::Drop) => self.parse_ddl(),
            TokenKind::Identifier(ref word)
                if ["ALTER", "TRUNCATE", "GRANT", "REVOKE"]
                    .iter()
                    .any(|w| word.eq_ignore_ascii_case(w)) =>
            {
                self.parse_ddl()
            }
            _ => Err(self.error_here("SELECT, WITH, INSERT, PUT, UPDATE, DELETE or a command")),
        }
    }

    /// Builds the statement result once the plan is complete.
    pub(crate) fn finish(&mut self, plan: LogicalPlan) -> Result<ParsedStatement, ParseError> {
        let hints = resolve_hints(&self.hint_comments, &self.hint_targets)?;
        let records = self.ctx.take_records();
        let cacheable = self.ctx.is_enabled() && self.ctx.caching_disabled().is_none();

        let (plan, parameters) = if cacheable {
            renumber(plan, records)
        } else {
            (materialize_plan(plan, &records), Vec::new())
        };

        debug!(
            cacheable,
            parameters = parameters.len(),
            positional = self.positional,
            hints = hints.len(),
            "parsed statement"
        );
        Ok(ParsedStatement {
            plan,
            hints,
            parameters,
            positional_parameters: self.positional,
            cacheable,
        })
    }

    // --- Bare entry points ---

    /// Parses a single expression spanning the whole input.
    pub(crate) fn parse_standalone_expression(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expr(0)?;
        self.expect_eof()?;
        Ok(expr)
    }

    /// Parses a single data type spanning the whole input.
    pub(crate) fn parse_standalone_data_type(
        &mut self,
    ) -> Result<DataType, ParseError> {
        let data_type = self.parse_data_type()?;
        self.expect_eof()?;
        Ok(data_type)
    }

    /// Parses a single table identifier spanning the whole input.
    pub(crate) fn parse_standalone_table_identifier(
        &mut self,
    ) -> Result<TableIdentifier, ParseError> {
        let table = self.parse_table_identifier()?;
        self.expect_eof()?;
        Ok(table)
    }

    /// `name` or `database.name`.
    pub(super) fn parse_table_identifier(&mut self) -> Result<TableIdentifier, ParseError> {
        let first = self.identifier()?;
        if self.consume(&TokenKind::Dot) {
            let table = self.identifier()?;
            Ok(TableIdentifier::qualified(first, table))
        } else {
            Ok(TableIdentifier::new(first))
        }
    }

    // --- Backtracking ---

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            split_gt: self.split_gt,
            ctx: self.ctx.clone(),
            positional: self.positional,
            hint_targets: self.hint_targets.len(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.split_gt = snapshot.split_gt;
        self.ctx = snapshot.ctx;
        self.positional = snapshot.positional;
        self.hint_targets.truncate(snapshot.hint_targets);
    }

    /// Runs one ordered alternative. A syntax error rewinds the cursor and
    /// yields `None`; a semantic error propagates.
    pub(super) fn attempt<T>(
        &mut self,
        alternative: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<Option<T>, ParseError> {
        let saved = self.snapshot();
        match alternative(self) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_semantic() => Err(err),
            Err(err) => {
                trace!(error = %err, "backtracking");
                self.record_failure(err);
                self.restore(saved);
                Ok(None)
            }
        }
    }

    fn record_failure(&mut self, err: ParseError) {
        let further = self
            .furthest
            .as_ref()
            .map_or(true, |best| err.span.start > best.span.start);
        if further {
            self.furthest = Some(err);
        }
    }

    /// Picks whichever of `err` and the failures of abandoned alternatives
    /// got further into the input.
    pub(crate) fn furthest_error(&mut self, err: ParseError) -> ParseError {
        match self.furthest.take() {
            Some(best) if !err.is_semantic() && best.span.start > err.span.start => best,
            _ => err,
        }
    }

    /// The most recent abandoned alternative's error, if any.
    pub(super) fn last_failure(&self) -> Option<&ParseError> {
        self.furthest.as_ref()
    }

    // --- Tokenization regions ---

    fn with_region<T>(
        &mut self,
        active: bool,
        body: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.ctx.push_region(active);
        let result = body(self);
        self.ctx.pop_region();
        result
    }

    /// Runs `body` with literals captured as placeholders.
    pub(super) fn tokenized<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.with_region(true, body)
    }

    /// Runs `body` with literals kept as constants.
    pub(super) fn suspended<T>(
        &mut self,
        body: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        self.with_region(false, body)
    }

    // --- Parameters and hints ---

    /// Resolves the next `?` marker.
    pub(super) fn next_parameter(&mut self, span: Span) -> Result<Expr, ParseError> {
        self.positional += 1;
        let position = self.positional;
        match self.parameters {
            ParameterMode::Prepare => Ok(Expr::Parameter { position }),
            ParameterMode::Bound(values) => match values.get(position - 1) {
                Some(value) => Ok(self.ctx.emit(value.clone())),
                None => Err(ParseError::semantic(
                    format!(
                        "No value bound for parameter {position}; {} value(s) supplied",
                        values.len()
                    ),
                    span,
                )),
            },
            ParameterMode::Unbound => Err(ParseError::semantic(
                format!(
                    "Parameter {position} has no bound value; prepare the statement or supply parameter values"
                ),
                span,
            )),
        }
    }

    /// Records the token range whose hints belong to a relation.
    /// `suffix` is `None` for derived tables, where hints are rejected.
    pub(super) fn add_hint_target(&mut self, tokens: RangeInclusive<usize>, suffix: Option<String>) {
        self.hint_targets.push(HintTarget { tokens, suffix });
    }

    // --- Token cursor ---

    /// The current token; the stream always ends with EOF.
    pub(super) fn current(&self) -> &Token {
        self.peek(0)
    }

    /// The token `n` positions ahead.
    pub(super) fn peek(&self, n: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + n).min(last)]
    }

    pub(super) const fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor back to an earlier token.
    pub(super) fn seek(&mut self, pos: usize) {
        self.pos = pos;
        self.split_gt = 0;
    }

    /// Advances to the next token and returns the one consumed.
    pub(super) fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if !token.is_eof() {
            self.pos += 1;
        }
        self.split_gt = 0;
        token
    }

    /// Source text of a token as written.
    pub(super) fn token_text(&self, token: &Token) -> &'a str {
        let source = self.source;
        source.get(token.span.start..token.span.end).unwrap_or("")
    }

    /// Source text from `start` up to the end of the statement, without a
    /// trailing `;`. Moves the cursor to that `;` or the end of input.
    pub(super) fn rest_of_statement(&mut self, start: usize) -> String {
        let mut end_index = self.tokens.len() - 1;
        if end_index > 0 && matches!(self.tokens[end_index - 1].kind, TokenKind::Semicolon) {
            end_index -= 1;
        }
        let end = self.tokens[end_index].span.start;
        self.pos = end_index.max(self.pos);
        self.split_gt = 0;
        let source = self.source;
        String::from(source.get(start..end).unwrap_or("").trim())
    }

    /// Checks if the current token matches the given kind.
    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        core::mem::discriminant(&self.current().kind) == core::mem::discriminant(kind)
    }

    /// Checks if the current token is the given keyword.
    pub(super) fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek_keyword(0, keyword)
    }

    /// Checks if the token `n` ahead is the given keyword.
    pub(super) fn peek_keyword(&self, n: usize, keyword: Keyword) -> bool {
        matches!(&self.peek(n).kind, TokenKind::Keyword(kw) if *kw == keyword)
    }

    /// Checks for an unquoted contextual word such as `DURATION`.
    pub(super) fn check_word(&self, word: &str) -> bool {
        self.word_at(0).is_some_and(|w| w.eq_ignore_ascii_case(word))
    }

    /// The unquoted word (identifier or keyword) `n` tokens ahead.
    pub(super) fn word_at(&self, n: usize) -> Option<&'a str> {
        let token = self.peek(n);
        match token.kind {
            TokenKind::Identifier(_) | TokenKind::Keyword(_) => Some(self.token_text(token)),
            _ => None,
        }
    }

    /// Consumes the current token if it has the given kind.
    pub(super) fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes the current token if it is the given keyword.
    pub(super) fn consume_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Error for the current token, naming what was expected.
    pub(super) fn error_here(&self, expected: &str) -> ParseError {
        let token = self.current();
        ParseError::unexpected(expected, token.kind.clone(), token.span)
    }

    /// Expects the current token to be the given kind.
    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(&kind.describe()))
        }
    }

    /// Expects the current token to be the given keyword.
    pub(super) fn expect_keyword(&mut self, keyword: Keyword) -> Result<Token, ParseError> {
        if self.check_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.error_here(keyword.as_str()))
        }
    }

    /// Expects a contextual word.
    pub(super) fn expect_word(&mut self, word: &str) -> Result<Token, ParseError> {
        if self.check_word(word) {
            Ok(self.advance())
        } else {
            Err(self.error_here(word))
        }
    }

    pub(super) fn expect_eof(&self) -> Result<(), ParseError> {
        if self.current().is_eof() {
            Ok(())
        } else {
            Err(self.error_here("end of input"))
        }
    }

    /// Consumes one `>`, splitting `>>` and `>>>` that close nested types.
    pub(super) fn expect_closing_angle(&mut self) -> Result<(), ParseError> {
        let width = match self.current().kind {
            TokenKind::Gt => 1,
            TokenKind::RightShift => 2,
            TokenKind::UnsignedRightShift => 3,
            _ => return Err(self.error_here("'>'")),
        };
        self.split_gt += 1;
        if self.split_gt == width {
            self.advance();
        }
        Ok(())
    }

    // --- Identifiers ---

    /// Applies the configured case folding.
    pub(super) fn normalize(&self, name: &str) -> String {
        if self.config.case_sensitive {
            String::from(name)
        } else {
            name.to_lowercase()
        }
    }

    /// True if the current token can be read by [`Self::identifier`].
    pub(super) fn at_identifier(&self) -> bool {
        match &self.current().kind {
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) => true,
            TokenKind::Keyword(kw) => !kw.is_reserved(),
            _ => false,
        }
    }

    /// True if the current token can be read by [`Self::strict_identifier`].
    pub(super) fn at_strict_identifier(&self) -> bool {
        matches!(
            self.current().kind,
            TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_)
        )
    }

    /// An identifier in a general position: plain, quoted, or a
    /// non-reserved keyword.
    pub(super) fn identifier(&mut self) -> Result<String, ParseError> {
        if !self.at_identifier() {
            return Err(self.reserved_word_error());
        }
        let token = self.advance();
        Ok(match &token.kind {
            TokenKind::QuotedIdentifier(name) => self.normalize(name),
            _ => self.normalize(self.token_text(&token)),
        })
    }

    /// An identifier where no keyword is accepted unquoted, such as aliases.
    pub(super) fn strict_identifier(&mut self) -> Result<String, ParseError> {
        if !self.at_strict_identifier() {
            return Err(self.reserved_word_error());
        }
        self.identifier()
    }

    fn reserved_word_error(&self) -> ParseError {
        let token = self.current();
        if let TokenKind::Keyword(kw) = token.kind {
            let class = registry().classify(kw.as_str());
            let kind = if class == KeywordClass::Reserved {
                "reserved"
            } else {
                "non-reserved"
            };
            let mut err = ParseError::unexpected("identifier", token.kind.clone(), token.span);
            err.message = format!(
                "{kind} keyword {} cannot be used as an identifier here; quote it with backticks",
                kw.as_str()
            );
            return err;
        }
        self.error_here("identifier")
    }

    /// A comma-separated list of identifiers.
    pub(super) fn parse_identifier_list(&mut self) -> Result<Vec<String>, ParseError> {
        let mut idents = vec![];
        loop {
            idents.push(self.identifier()?);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(idents)
    }

    /// `[AS] alias` with a strict identifier.
    pub(super) fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if self.consume_keyword(Keyword::As) {
            return self.strict_identifier().map(Some);
        }
        if self.at_strict_identifier() {
            return self.strict_identifier().map(Some);
        }
        Ok(None)
    }
}

/// Gives the surviving records dense ordinals in capture order.
fn renumber(
    plan: LogicalPlan,
    records: Vec<TokenizedLiteral>,
) -> (LogicalPlan, Vec<TokenizedLiteral>) {
    let old: Vec<usize> = records.iter().map(|r| r.ordinal).collect();
    let plan = plan.transform_expressions(&mut |e| match e {
        Expr::Placeholder { ordinal, data_type } => {
            let ordinal = old.iter().position(|o| *o == ordinal).unwrap_or(ordinal);
            Expr::Placeholder { ordinal, data_type }
        }
        other => other,
    });
    let records = records
        .into_iter()
        .enumerate()
        .map(|(ordinal, r)| TokenizedLiteral {
            ordinal,
            value: r.value,
        })
        .collect();
    (plan, records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser<'a>(sql: &'a str, config: &'a ParserConfig) -> Parser<'a> {
        Parser::new(sql, config, ParameterMode::Unbound)
    }

    #[test]
    fn test_attempt_rewinds_on_syntax_error() {
        let config = ParserConfig::default();
        let mut p = parser("a b c", &config);
        let out = p
            .attempt(|p| {
                p.advance();
                p.expect_keyword(Keyword::Select)
            })
            .unwrap();
        assert!(out.is_none());
        assert_eq!(p.position(), 0);
        assert!(p.last_failure().is_some());
    }

    #[test]
    fn test_attempt_propagates_semantic_error() {
        let config = ParserConfig::default();
        let mut p = parser("a", &config);
        let out: Result<Option<()>, _> =
            p.attempt(|_| Err(ParseError::semantic("nope", Span::default())));
        assert!(out.is_err());
    }

    #[test]
    fn test_identifier_classes() {
        let config = ParserConfig::default();
        let mut p = parser("Window `Select` select", &config);
        assert_eq!(p.identifier().unwrap(), "window");
        assert_eq!(p.strict_identifier().unwrap(), "select");
        let err = p.identifier().unwrap_err();
        assert!(err.message.contains("reserved keyword SELECT"));
    }

    #[test]
    fn test_non_reserved_rejected_in_strict_position() {
        let config = ParserConfig::default();
        let mut p = parser("window", &config);
        assert!(p.strict_identifier().is_err());
    }

    #[test]
    fn test_case_sensitive_identifiers() {
        let config = ParserConfig {
            case_sensitive: true,
            ..ParserConfig::default()
        };
        let mut p = parser("MyTable `Quoted`", &config);
        assert_eq!(p.identifier().unwrap(), "MyTable");
        assert_eq!(p.identifier().unwrap(), "Quoted");
    }

    #[test]
    fn test_split_closing_angles() {
        let config = ParserConfig::default();
        let mut p = parser(">> x", &config);
        p.expect_closing_angle().unwrap();
        assert_eq!(p.position(), 0);
        p.expect_closing_angle().unwrap();
        assert_eq!(p.position(), 1);
    }

    #[test]
    fn test_rest_of_statement() {
        let config = ParserConfig::default();
        let mut p = parser("SET a.b = 10 ;", &config);
        p.advance();
        let start = p.current().span.start;
        assert_eq!(p.rest_of_statement(start), "a.b = 10");
        assert!(p.check(&TokenKind::Semicolon));
    }
}
