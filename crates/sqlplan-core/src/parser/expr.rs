//! Expression grammar.

use tracing::trace;

use super::error::ParseError;
use super::functions::{policy, FunctionPolicy};
use super::like::{rewrite_like, DEFAULT_ESCAPE};
use super::literal::{
    date_literal, day_time_interval, numeric_literal, timestamp_literal, year_month_interval,
    IntervalUnit,
};
use super::parser::Parser;
use super::pratt::{
    infix_binding_power, postfix_binding_power, prefix_binding_power, token_to_binary_op,
    token_to_unary_op,
};
use crate::ast::{
    Expr, FrameBound, FrameUnits, FunctionCall, Interval, LiteralValue, NullOrdering,
    SortDirection, SortOrder, Window, WindowFrame, WindowSpec,
};
use crate::lexer::{Keyword, Span, TokenKind};

impl<'a> Parser<'a> {
    /// Parses an expression with the given minimum binding power.
    pub(crate) fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_prefix()?;

        loop {
            let kind = self.current().kind.clone();

            if let Some(bp) = postfix_binding_power(&kind) {
                if bp < min_bp {
                    break;
                }
                left = self.parse_postfix(left)?;
                continue;
            }

            let Some((l_bp, r_bp)) = infix_binding_power(&kind) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }

            left = match kind {
                TokenKind::Keyword(Keyword::Is) => self.parse_is(left)?,
                TokenKind::Keyword(Keyword::Not) => {
                    let negatable = [
                        Keyword::Between,
                        Keyword::In,
                        Keyword::Like,
                        Keyword::Rlike,
                        Keyword::Regexp,
                    ]
                    .into_iter()
                    .any(|kw| self.peek_keyword(1, kw));
                    if !negatable {
                        break;
                    }
                    self.advance();
                    self.parse_predicate(left, true, r_bp)?
                }
                TokenKind::Keyword(
                    Keyword::Between | Keyword::In | Keyword::Like | Keyword::Rlike | Keyword::Regexp,
                ) => self.parse_predicate(left, false, r_bp)?,
                _ => {
                    let Some(op) = token_to_binary_op(&kind) else {
                        break;
                    };
                    self.advance();
                    let right = self.parse_expr(r_bp)?;
                    left.binary(op, right)
                }
            };
        }

        Ok(left)
    }

    /// Parses a prefix expression (unary operators or primary).
    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let kind = self.current().kind.clone();
        let Some(bp) = prefix_binding_power(&kind) else {
            return self.parse_primary();
        };

        if kind == TokenKind::Minus {
            if let TokenKind::Number(text) = &self.peek(1).kind {
                let text = text.clone();
                let span = self.advance().span.merge(self.advance().span);
                return self.number(&text, true, span);
            }
        }

        self.advance();
        let operand = self.parse_expr(bp)?;
        Ok(match token_to_unary_op(&kind) {
            Some(op) => Expr::Unary {
                op,
                operand: Box::new(operand),
            },
            // unary plus
            None => operand,
        })
    }

    /// Parses a primary expression.
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.current().clone();
        match &token.kind {
            TokenKind::Number(text) => {
                self.advance();
                self.number(text, false, token.span)
            }
            TokenKind::String(_) => {
                let value = self.parse_string()?;
                Ok(self.ctx.emit(LiteralValue::String(value)))
            }
            TokenKind::Blob(bytes) => {
                self.advance();
                Ok(self.ctx.emit(LiteralValue::Binary(bytes.clone())))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(LiteralValue::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(LiteralValue::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Literal(LiteralValue::Null))
            }
            TokenKind::Question => {
                self.advance();
                self.next_parameter(token.span)
            }
            TokenKind::Star => {
                self.advance();
                Ok(Expr::Star(None))
            }
            TokenKind::LeftParen => self.parse_parenthesized(),
            TokenKind::LeftBrace => self.parse_escaped_function(),
            TokenKind::Keyword(Keyword::Case) => self.parse_case(),
            TokenKind::Keyword(Keyword::Cast) => self.parse_cast(),
            TokenKind::Keyword(Keyword::Exists) => {
                self.advance();
                self.expect(&TokenKind::LeftParen)?;
                let subquery = self.parse_query()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::Exists(Box::new(subquery)))
            }
            TokenKind::Keyword(Keyword::CurrentDate) => {
                self.advance();
                self.skip_empty_parens()?;
                Ok(Expr::CurrentDate)
            }
            TokenKind::Keyword(Keyword::CurrentTimestamp) => {
                self.advance();
                self.skip_empty_parens()?;
                Ok(Expr::CurrentTimestamp)
            }
            TokenKind::Keyword(Keyword::Interval) => self.parse_interval(),
            TokenKind::Keyword(kw @ (Keyword::Date | Keyword::Timestamp))
                if matches!(self.peek(1).kind, TokenKind::String(_)) =>
            {
                let kw = *kw;
                self.advance();
                let span = self.current().span;
                let text = self.parse_string()?;
                let value = if kw == Keyword::Date {
                    date_literal(&text)
                } else {
                    timestamp_literal(&text)
                }
                .map_err(|msg| ParseError::new(msg, span))?;
                Ok(self.ctx.emit(value))
            }
            _ if self.at_identifier() => self.parse_name(),
            _ => Err(self.error_here("expression")),
        }
    }

    /// Builds a numeric constant or placeholder from its token text.
    fn number(&mut self, text: &str, negative: bool, span: Span) -> Result<Expr, ParseError> {
        let value = numeric_literal(text, negative).map_err(|msg| ParseError::new(msg, span))?;
        Ok(self.ctx.emit(value))
    }

    /// One string token, or several adjacent ones concatenated.
    pub(super) fn parse_string(&mut self) -> Result<String, ParseError> {
        let TokenKind::String(first) = &self.current().kind else {
            return Err(self.error_here("string"));
        };
        let mut value = first.clone();
        self.advance();
        while let TokenKind::String(next) = &self.current().kind {
            value.push_str(next);
            self.advance();
        }
        Ok(value)
    }

    fn skip_empty_parens(&mut self) -> Result<(), ParseError> {
        if self.consume(&TokenKind::LeftParen) {
            self.expect(&TokenKind::RightParen)?;
        }
        Ok(())
    }

    /// `a`, `t.a`, `t.*` or a function call.
    fn parse_name(&mut self) -> Result<Expr, ParseError> {
        let mut parts = vec![self.identifier()?];
        while self.check(&TokenKind::Dot) {
            match &self.peek(1).kind {
                TokenKind::Star => {
                    self.advance();
                    self.advance();
                    return Ok(Expr::Star(Some(parts)));
                }
                TokenKind::Identifier(_) | TokenKind::QuotedIdentifier(_) | TokenKind::Keyword(_) => {
                    self.advance();
                    parts.push(self.identifier()?);
                }
                _ => break,
            }
        }

        if self.check(&TokenKind::LeftParen) {
            return self.parse_call(parts.join("."));
        }
        Ok(Expr::Attribute(parts))
    }

    /// Postfix subscript or field access.
    fn parse_postfix(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        if self.consume(&TokenKind::LeftBracket) {
            let index = self.parse_expr(0)?;
            self.expect(&TokenKind::RightBracket)?;
            return Ok(Expr::Index {
                expr: Box::new(expr),
                index: Box::new(index),
            });
        }
        self.expect(&TokenKind::Dot)?;
        let name = self.identifier()?;
        Ok(match expr {
            Expr::Attribute(mut parts) => {
                parts.push(name);
                Expr::Attribute(parts)
            }
            other => Expr::Field {
                expr: Box::new(other),
                name,
            },
        })
    }

    /// `IS [NOT] NULL`
    fn parse_is(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Is)?;
        let negated = self.consume_keyword(Keyword::Not);
        self.expect_keyword(Keyword::Null)?;
        Ok(Expr::IsNull {
            expr: Box::new(expr),
            negated,
        })
    }

    /// BETWEEN, IN, LIKE and RLIKE, after an optional NOT.
    fn parse_predicate(&mut self, expr: Expr, negated: bool, r_bp: u8) -> Result<Expr, ParseError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Keyword(Keyword::Between) => {
                let low = self.parse_expr(r_bp)?;
                self.expect_keyword(Keyword::And)?;
                let high = self.parse_expr(r_bp)?;
                Ok(Expr::Between {
                    expr: Box::new(expr),
                    low: Box::new(low),
                    high: Box::new(high),
                    negated,
                })
            }
            TokenKind::Keyword(Keyword::In) => {
                self.expect(&TokenKind::LeftParen)?;
                if self.at_query_start() {
                    let subquery = self.parse_query()?;
                    self.expect(&TokenKind::RightParen)?;
                    return Ok(Expr::InSubquery {
                        expr: Box::new(expr),
                        subquery: Box::new(subquery),
                        negated,
                    });
                }
                let list = self.parse_expr_list()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(Expr::InList {
                    expr: Box::new(expr),
                    list,
                    negated,
                })
            }
            TokenKind::Keyword(Keyword::Like) => {
                let pattern = self.parse_expr(r_bp)?;
                let escape = if self.consume_keyword(Keyword::Escape) {
                    let span = self.current().span;
                    let text = self.parse_string()?;
                    let mut chars = text.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => c,
                        _ => {
                            return Err(ParseError::new(
                                format!("Invalid escape string '{text}'; it must be one character"),
                                span,
                            ));
                        }
                    }
                } else {
                    DEFAULT_ESCAPE
                };
                let pattern = self.ctx.demote(pattern);
                let like = rewrite_like(expr, pattern, escape);
                Ok(if negated { like.not() } else { like })
            }
            _ => {
                let pattern = self.parse_expr(r_bp)?;
                let rlike = Expr::RLike {
                    expr: Box::new(expr),
                    pattern: Box::new(pattern),
                };
                Ok(if negated { rlike.not() } else { rlike })
            }
        }
    }

    /// True when the current token opens a query.
    pub(super) fn at_query_start(&self) -> bool {
        self.check_keyword(Keyword::Select) || self.check_keyword(Keyword::With)
    }

    /// A subquery, a parenthesized expression or an anonymous struct.
    fn parse_parenthesized(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        if self.at_query_start() {
            let subquery = self.parse_query()?;
            self.expect(&TokenKind::RightParen)?;
            self.ctx.disable_caching("scalar subquery");
            return Ok(Expr::ScalarSubquery(Box::new(subquery)));
        }
        let mut items = self.parse_expr_list()?;
        self.expect(&TokenKind::RightParen)?;
        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(Expr::Struct(items))
        }
    }

    /// A comma-separated list of expressions.
    pub(super) fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expr(0)?];
        while self.consume(&TokenKind::Comma) {
            exprs.push(self.parse_expr(0)?);
        }
        Ok(exprs)
    }

    /// A function call after its name.
    pub(super) fn parse_call(&mut self, name: String) -> Result<Expr, ParseError> {
        let open = self.expect(&TokenKind::LeftParen)?;
        let lower = name.to_lowercase();

        if self.check(&TokenKind::Star) {
            if lower != "count" {
                return Err(ParseError::new(
                    format!("{name}(*) is not allowed; only count(*) takes a star argument"),
                    open.span,
                ));
            }
            self.advance();
            self.expect(&TokenKind::RightParen)?;
            return self.finish_call(name, vec![Expr::int(1)], false);
        }

        let distinct = self.consume_keyword(Keyword::Distinct);
        if !distinct {
            self.consume_keyword(Keyword::All);
        }
        let args = if self.check(&TokenKind::RightParen) {
            vec![]
        } else {
            self.parse_expr_list()?
        };
        self.expect(&TokenKind::RightParen)?;
        self.finish_call(name, args, distinct)
    }

    /// Applies the tokenization policy and parses an optional OVER clause.
    fn finish_call(
        &mut self,
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    ) -> Result<Expr, ParseError> {
        let lower = name.to_lowercase();
        let args = match policy(&lower) {
            Some(FunctionPolicy::Constant(arg_policy)) => args
                .into_iter()
                .enumerate()
                .map(|(i, arg)| {
                    if arg_policy.applies_to(i) {
                        self.ctx.demote_all(arg)
                    } else {
                        arg
                    }
                })
                .collect(),
            Some(FunctionPolicy::DisableCaching) => {
                self.ctx.disable_caching(&lower);
                args
            }
            None => args,
        };

        let over = if self.consume_keyword(Keyword::Over) {
            Some(self.parse_over()?)
        } else {
            None
        };

        Ok(Expr::Function(FunctionCall {
            name,
            args,
            distinct,
            over,
        }))
    }

    /// `{fn name(args)}` escape syntax.
    fn parse_escaped_function(&mut self) -> Result<Expr, ParseError> {
        self.expect(&TokenKind::LeftBrace)?;
        self.expect_keyword(Keyword::Fn)?;
        let name_span = self.current().span;
        let name = self.identifier()?;

        if !name.eq_ignore_ascii_case("timestampadd") {
            let call = self.parse_call(name)?;
            self.expect(&TokenKind::RightBrace)?;
            return Ok(call);
        }

        self.expect(&TokenKind::LeftParen)?;
        let unit_span = self.current().span;
        let unit = self.word_at(0).unwrap_or("");
        if !unit.eq_ignore_ascii_case("SQL_TSI_DAY") {
            return Err(ParseError::semantic(
                format!("Unsupported TIMESTAMPADD unit '{unit}'; only SQL_TSI_DAY is supported"),
                unit_span,
            ));
        }
        self.advance();
        self.expect(&TokenKind::Comma)?;
        let count = self.parse_expr(0)?;
        self.expect(&TokenKind::Comma)?;
        let timestamp = self.parse_expr(0)?;
        self.expect(&TokenKind::RightParen)?;
        self.expect(&TokenKind::RightBrace)?;
        trace!(span = ?name_span, "rewrote TIMESTAMPADD to date_add");
        Ok(Expr::function("date_add", vec![timestamp, count]))
    }

    /// `CASE [operand] WHEN .. THEN .. [ELSE ..] END`
    fn parse_case(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Case)?;
        let operand = if self.check_keyword(Keyword::When) {
            None
        } else {
            Some(Box::new(self.parse_expr(0)?))
        };

        let mut branches = vec![];
        while self.consume_keyword(Keyword::When) {
            let condition = self.parse_expr(0)?;
            self.expect_keyword(Keyword::Then)?;
            let result = self.parse_expr(0)?;
            branches.push((condition, result));
        }
        if branches.is_empty() {
            return Err(self.error_here("WHEN"));
        }

        let else_expr = if self.consume_keyword(Keyword::Else) {
            Some(Box::new(self.parse_expr(0)?))
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;

        Ok(Expr::Case {
            operand,
            branches,
            else_expr,
        })
    }

    /// `CAST(expr AS type)`
    fn parse_cast(&mut self) -> Result<Expr, ParseError> {
        self.expect_keyword(Keyword::Cast)?;
        self.expect(&TokenKind::LeftParen)?;
        let expr = self.parse_expr(0)?;
        self.expect_keyword(Keyword::As)?;
        let data_type = self.parse_data_type()?;
        self.expect(&TokenKind::RightParen)?;
        Ok(Expr::Cast {
            expr: Box::new(expr),
            data_type,
        })
    }

    /// Interval literals in both the quoted and the unit-sequence forms.
    fn parse_interval(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect_keyword(Keyword::Interval)?.span;

        if matches!(self.current().kind, TokenKind::String(_)) {
            let text_span = self.current().span;
            let text = self.parse_string()?;
            let from = self.interval_unit()?;
            let interval = if self.consume_keyword(Keyword::To) {
                let to = self.interval_unit()?;
                match (from, to) {
                    (IntervalUnit::Year, IntervalUnit::Month) => year_month_interval(&text),
                    (IntervalUnit::Day, IntervalUnit::Second) => day_time_interval(&text),
                    _ => {
                        return Err(ParseError::semantic(
                            format!("Interval {from:?} TO {to:?} is not supported"),
                            text_span,
                        ));
                    }
                }
                .map_err(|msg| ParseError::new(msg, text_span))?
            } else {
                let value: i64 = text.trim().parse().map_err(|_| {
                    ParseError::new(format!("Invalid interval value '{text}'"), text_span)
                })?;
                from.accumulate(Interval::default(), value).ok_or_else(|| {
                    ParseError::semantic(format!("Interval value out of range: {text}"), text_span)
                })?
            };
            return Ok(self.ctx.emit(LiteralValue::Interval(interval)));
        }

        let mut interval = Interval::default();
        let mut units = 0;
        loop {
            let (negative, offset) = match (&self.current().kind, &self.peek(1).kind) {
                (TokenKind::Minus, TokenKind::Number(_)) => (true, 1),
                (TokenKind::Number(_), _) => (false, 0),
                _ => break,
            };
            let Some(unit) = self.word_at(offset + 1).and_then(IntervalUnit::from_word) else {
                break;
            };
            if negative {
                self.advance();
            }
            let number = self.advance();
            let text = self.token_text(&number);
            let value: i64 = text.parse().map_err(|_| {
                ParseError::new(
                    format!("Interval values must be integral, got {text}"),
                    number.span,
                )
            })?;
            let value = if negative { -value } else { value };
            interval = unit.accumulate(interval, value).ok_or_else(|| {
                ParseError::semantic(format!("Interval value out of range: {value}"), number.span)
            })?;
            self.advance();
            units += 1;
        }

        if units == 0 {
            return Err(ParseError::semantic(
                "At least one time unit should be given for an interval literal",
                start,
            ));
        }
        Ok(self.ctx.emit(LiteralValue::Interval(interval)))
    }

    fn interval_unit(&mut self) -> Result<IntervalUnit, ParseError> {
        match self.word_at(0).and_then(IntervalUnit::from_word) {
            Some(unit) => {
                self.advance();
                Ok(unit)
            }
            None => Err(self.error_here("interval unit")),
        }
    }

    // --- Windows ---

    /// `OVER name` or `OVER (spec)`. Window expressions are never tokenized.
    fn parse_over(&mut self) -> Result<Window, ParseError> {
        if self.consume(&TokenKind::LeftParen) {
            let spec = self.suspended(Self::parse_window_spec)?;
            self.expect(&TokenKind::RightParen)?;
            Ok(Window::Spec(spec))
        } else {
            Ok(Window::Named(self.identifier()?))
        }
    }

    /// PARTITION BY, ORDER BY and frame of a window definition.
    pub(super) fn parse_window_spec(&mut self) -> Result<WindowSpec, ParseError> {
        let mut spec = WindowSpec::default();

        if (self.check_keyword(Keyword::Partition) || self.check_keyword(Keyword::Distribute))
            && self.peek_keyword(1, Keyword::By)
        {
            self.advance();
            self.advance();
            spec.partition_by = self.parse_expr_list()?;
        }

        if (self.check_keyword(Keyword::Order) || self.check_keyword(Keyword::Sort))
            && self.peek_keyword(1, Keyword::By)
        {
            self.advance();
            self.advance();
            spec.order_by = self.parse_sort_items()?;
        }

        let units = if self.consume_keyword(Keyword::Rows) {
            Some(FrameUnits::Rows)
        } else if self.consume_keyword(Keyword::Range) {
            Some(FrameUnits::Range)
        } else {
            None
        };
        if let Some(units) = units {
            let (start, end) = if self.consume_keyword(Keyword::Between) {
                let start = self.parse_frame_bound()?;
                self.expect_keyword(Keyword::And)?;
                (start, self.parse_frame_bound()?)
            } else {
                (self.parse_frame_bound()?, FrameBound::CurrentRow)
            };
            spec.frame = Some(WindowFrame { units, start, end });
        }

        Ok(spec)
    }

    fn parse_frame_bound(&mut self) -> Result<FrameBound, ParseError> {
        if self.consume_keyword(Keyword::Unbounded) {
            if self.consume_keyword(Keyword::Preceding) {
                return Ok(FrameBound::UnboundedPreceding);
            }
            self.expect_keyword(Keyword::Following)?;
            return Ok(FrameBound::UnboundedFollowing);
        }
        if self.consume_keyword(Keyword::Current) {
            self.expect_keyword(Keyword::Row)?;
            return Ok(FrameBound::CurrentRow);
        }
        let offset = Box::new(self.parse_expr(0)?);
        if self.consume_keyword(Keyword::Preceding) {
            return Ok(FrameBound::Preceding(offset));
        }
        self.expect_keyword(Keyword::Following)?;
        Ok(FrameBound::Following(offset))
    }

    /// Ordering keys: `expr [ASC|DESC] [NULLS FIRST|LAST]`, comma separated.
    pub(super) fn parse_sort_items(&mut self) -> Result<Vec<SortOrder>, ParseError> {
        let mut items = vec![];
        loop {
            let expr = self.parse_expr(0)?;
            let direction = if self.consume_keyword(Keyword::Desc) {
                SortDirection::Descending
            } else {
                self.consume_keyword(Keyword::Asc);
                SortDirection::Ascending
            };
            let nulls = if self.consume_keyword(Keyword::Nulls) {
                if self.consume_keyword(Keyword::First) {
                    NullOrdering::NullsFirst
                } else {
                    self.expect_keyword(Keyword::Last)?;
                    NullOrdering::NullsLast
                }
            } else if direction == SortDirection::Ascending {
                NullOrdering::NullsFirst
            } else {
                NullOrdering::NullsLast
            };
            items.push(SortOrder {
                expr,
                direction,
                nulls,
            });
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }
}
