//! Query grammar: SELECT blocks, set operations, relations and modifiers.

use std::collections::HashMap;

use tracing::trace;

use super::error::ParseError;
use super::parser::Parser;
use crate::ast::{
    Expr, FunctionCall, GroupBy, JoinConstraint, JoinType, LogicalPlan, SetOpKind, SortOrder,
    Window, WindowSpec,
};
use crate::lexer::{Keyword, Span, TokenKind};

/// Widest GROUP BY list that GROUPING SETS masks can describe.
const MAX_GROUPING_COLUMNS: usize = 64;

/// Named windows of a SELECT block, after indirection is resolved.
type WindowDefinitions = HashMap<String, WindowSpec>;

impl<'a> Parser<'a> {
    /// `[WITH ctes] query`
    pub(crate) fn parse_query(&mut self) -> Result<LogicalPlan, ParseError> {
        if self.check_keyword(Keyword::With) {
            let ctes = self.parse_ctes()?;
            let body = self.parse_set_query()?;
            return Ok(LogicalPlan::With {
                ctes,
                body: Box::new(body),
            });
        }
        self.parse_set_query()
    }

    /// `WITH ...` at statement level, where the body may also be INSERT or PUT.
    pub(super) fn parse_cte_statement(&mut self) -> Result<LogicalPlan, ParseError> {
        let ctes = self.parse_ctes()?;
        let body = if self.check_keyword(Keyword::Insert) || self.check_keyword(Keyword::Put) {
            self.parse_insert_or_put()?
        } else {
            self.parse_set_query()?
        };
        Ok(LogicalPlan::With {
            ctes,
            body: Box::new(body),
        })
    }

    /// `WITH name AS (query) [, ...]`
    fn parse_ctes(&mut self) -> Result<Vec<(String, LogicalPlan)>, ParseError> {
        self.expect_keyword(Keyword::With)?;
        let mut ctes = vec![];
        loop {
            let name = self.identifier()?;
            self.expect_keyword(Keyword::As)?;
            self.expect(&TokenKind::LeftParen)?;
            let query = self.parse_query()?;
            self.expect(&TokenKind::RightParen)?;
            let plan = LogicalPlan::SubqueryAlias {
                alias: name.clone(),
                child: Box::new(query),
            };
            ctes.push((name, plan));
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(ctes)
    }

    /// Set operations folded left to right, then the query modifiers.
    /// Modifiers of a lone SELECT block see its WINDOW definitions.
    fn parse_set_query(&mut self) -> Result<LogicalPlan, ParseError> {
        let (mut plan, mut windows) = self.parse_query_term()?;
        loop {
            let kind = match self.current().kind {
                TokenKind::Keyword(Keyword::Union) => SetOpKind::Union,
                TokenKind::Keyword(Keyword::Intersect) => SetOpKind::Intersect,
                TokenKind::Keyword(Keyword::Except) => SetOpKind::Except,
                _ => break,
            };
            self.advance();
            let distinct = if self.consume_keyword(Keyword::All) {
                false
            } else {
                self.consume_keyword(Keyword::Distinct);
                true
            };
            let (right, _) = self.parse_query_term()?;
            windows.clear();
            plan = LogicalPlan::SetOp {
                kind,
                distinct,
                left: Box::new(plan),
                right: Box::new(right),
            };
        }
        self.parse_query_modifiers(plan, &windows)
    }

    fn parse_query_term(&mut self) -> Result<(LogicalPlan, WindowDefinitions), ParseError> {
        match self.current().kind {
            TokenKind::Keyword(Keyword::Select) => self.parse_select(),
            TokenKind::Keyword(Keyword::Values) => Ok((self.parse_inline_table()?, HashMap::new())),
            TokenKind::LeftParen => {
                self.advance();
                let query = self.parse_query()?;
                self.expect(&TokenKind::RightParen)?;
                Ok((query, HashMap::new()))
            }
            _ => Err(self.error_here("SELECT, VALUES or '('")),
        }
    }

    /// ORDER BY, CLUSTER BY, DISTRIBUTE BY, SORT BY and LIMIT. Literals in
    /// these clauses are never tokenized.
    fn parse_query_modifiers(
        &mut self,
        plan: LogicalPlan,
        windows: &WindowDefinitions,
    ) -> Result<LogicalPlan, ParseError> {
        self.suspended(move |p| {
            let mut plan = plan;
            let span = p.current().span;
            if p.consume_pair(Keyword::Order, Keyword::By) {
                let order = resolve_sort_windows(p.parse_sort_items()?, windows, span)?;
                plan = sort(plan, order, true);
            } else if p.consume_pair(Keyword::Cluster, Keyword::By) {
                let exprs = p.parse_expr_list()?;
                let order = exprs.iter().cloned().map(SortOrder::ascending).collect();
                plan = sort(repartition(plan, exprs), order, false);
            } else {
                if p.consume_pair(Keyword::Distribute, Keyword::By) {
                    let exprs = p.parse_expr_list()?;
                    plan = repartition(plan, exprs);
                }
                let span = p.current().span;
                if p.consume_pair(Keyword::Sort, Keyword::By) {
                    let order = resolve_sort_windows(p.parse_sort_items()?, windows, span)?;
                    plan = sort(plan, order, false);
                }
            }

            if p.consume_keyword(Keyword::Limit) {
                let count = p.parse_expr(0)?;
                plan = limit(plan, count);
            } else if p.consume_keyword(Keyword::Fetch) {
                p.expect_keyword(Keyword::First)?;
                let count = p.parse_expr(0)?;
                if !p.consume_keyword(Keyword::Rows) {
                    p.expect_keyword(Keyword::Row)?;
                }
                p.expect_keyword(Keyword::Only)?;
                plan = limit(plan, count);
            }
            Ok(plan)
        })
    }

    /// Consumes two keywords if both are next.
    pub(super) fn consume_pair(&mut self, first: Keyword, second: Keyword) -> bool {
        if self.check_keyword(first) && self.peek_keyword(1, second) {
            self.advance();
            self.advance();
            true
        } else {
            false
        }
    }

    /// One SELECT block, with its WINDOW definitions for the modifiers.
    fn parse_select(&mut self) -> Result<(LogicalPlan, WindowDefinitions), ParseError> {
        self.expect_keyword(Keyword::Select)?;
        let distinct = self.consume_keyword(Keyword::Distinct);
        if !distinct {
            self.consume_keyword(Keyword::All);
        }

        let mut projection = self.tokenized(Self::parse_select_list)?;

        let mut plan = if self.consume_keyword(Keyword::From) {
            self.suspended(Self::parse_from_clause)?
        } else {
            LogicalPlan::OneRow
        };

        while self.check_keyword(Keyword::Lateral) {
            plan = self.suspended(move |p| p.parse_lateral_view(plan))?;
        }

        if self.consume_keyword(Keyword::Where) {
            let predicate = self.tokenized(|p| p.parse_expr(0))?;
            plan = filter(plan, predicate);
        }

        let group_by = if self.consume_pair(Keyword::Group, Keyword::By) {
            Some(self.suspended(Self::parse_group_by)?)
        } else {
            None
        };

        let mut having = if self.consume_keyword(Keyword::Having) {
            Some(self.tokenized(|p| p.parse_expr(0))?)
        } else {
            None
        };

        let window_span = self.current().span;
        let definitions = if self.check_keyword(Keyword::Window) {
            self.suspended(Self::parse_window_definitions)?
        } else {
            vec![]
        };
        let windows = resolve_window_definitions(definitions)?;
        projection = resolve_named_windows(projection, &windows, window_span)?;
        if let Some(predicate) = having.take() {
            having = Some(resolve_named_window(predicate, &windows, window_span)?);
        }

        if let Some(group_by) = &group_by {
            let keys: Vec<Expr> = group_by
                .exprs()
                .iter()
                .filter(|key| !matches!(key, Expr::Literal(_)))
                .cloned()
                .collect();
            if !keys.is_empty() {
                projection = projection
                    .into_iter()
                    .map(|item| self.demote_grouping_keys(item, &keys))
                    .collect();
                having = having.map(|predicate| self.demote_grouping_keys(predicate, &keys));
            }
        }

        plan = match group_by {
            Some(group_by) => LogicalPlan::Aggregate {
                group_by,
                exprs: projection,
                child: Box::new(plan),
            },
            None if having.is_some() => LogicalPlan::Aggregate {
                group_by: GroupBy::Exprs(vec![]),
                exprs: projection,
                child: Box::new(plan),
            },
            None => LogicalPlan::Project {
                exprs: projection,
                child: Box::new(plan),
            },
        };
        if let Some(predicate) = having {
            plan = filter(plan, predicate);
        }
        if distinct {
            plan = LogicalPlan::Distinct {
                child: Box::new(plan),
            };
        }
        Ok((plan, windows))
    }

    /// Grouping keys hold constants, so any select-list or HAVING
    /// subexpression repeating a key gives its placeholders back.
    fn demote_grouping_keys(&mut self, expr: Expr, keys: &[Expr]) -> Expr {
        if keys.contains(&self.ctx.materialized(&expr)) {
            return self.ctx.demote_all(expr);
        }
        expr.map_children(&mut |child| self.demote_grouping_keys(child, keys))
    }

    fn parse_select_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut items = vec![];
        loop {
            let expr = self.parse_expr(0)?;
            let item = match self.parse_optional_alias()? {
                Some(name) => Expr::Alias {
                    expr: Box::new(expr),
                    name,
                },
                None => expr,
            };
            items.push(item);
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(items)
    }

    // --- FROM ---

    /// Relations separated by commas become inner joins without a condition.
    pub(super) fn parse_from_clause(&mut self) -> Result<LogicalPlan, ParseError> {
        let mut plan = self.parse_relation()?;
        while self.consume(&TokenKind::Comma) {
            let right = self.parse_relation()?;
            plan = LogicalPlan::Join {
                left: Box::new(plan),
                right: Box::new(right),
                join_type: JoinType::Inner,
                constraint: JoinConstraint::None,
            };
        }
        Ok(plan)
    }

    /// A relation followed by any number of joins.
    fn parse_relation(&mut self) -> Result<LogicalPlan, ParseError> {
        let mut plan = self.parse_relation_primary()?;
        while let Some((join_type, natural)) = self.parse_join_type()? {
            let right = self.parse_relation_primary()?;
            let constraint = if natural {
                JoinConstraint::Natural
            } else if self.consume_keyword(Keyword::On) {
                JoinConstraint::On(self.tokenized(|p| p.parse_expr(0))?)
            } else if self.consume_keyword(Keyword::Using) {
                self.expect(&TokenKind::LeftParen)?;
                let columns = self.parse_identifier_list()?;
                self.expect(&TokenKind::RightParen)?;
                JoinConstraint::Using(columns)
            } else {
                JoinConstraint::None
            };
            trace!(join = join_type.as_str(), "parsed join");
            plan = LogicalPlan::Join {
                left: Box::new(plan),
                right: Box::new(right),
                join_type,
                constraint,
            };
        }
        Ok(plan)
    }

    /// The join keywords, or `None` when no join follows.
    fn parse_join_type(&mut self) -> Result<Option<(JoinType, bool)>, ParseError> {
        let natural = self.consume_keyword(Keyword::Natural);
        let join_type = match self.current().kind {
            TokenKind::Keyword(Keyword::Join) => JoinType::Inner,
            TokenKind::Keyword(Keyword::Inner) => {
                self.advance();
                JoinType::Inner
            }
            TokenKind::Keyword(Keyword::Cross) => {
                self.advance();
                JoinType::Cross
            }
            TokenKind::Keyword(Keyword::Left) => {
                self.advance();
                if self.consume_keyword(Keyword::Semi) {
                    JoinType::LeftSemi
                } else if self.consume_keyword(Keyword::Anti) {
                    JoinType::LeftAnti
                } else {
                    self.consume_keyword(Keyword::Outer);
                    JoinType::LeftOuter
                }
            }
            TokenKind::Keyword(Keyword::Right) => {
                self.advance();
                self.consume_keyword(Keyword::Outer);
                JoinType::RightOuter
            }
            TokenKind::Keyword(Keyword::Full) => {
                self.advance();
                self.consume_keyword(Keyword::Outer);
                JoinType::FullOuter
            }
            TokenKind::Keyword(Keyword::Semi) if self.peek_keyword(1, Keyword::Join) => {
                self.advance();
                JoinType::LeftSemi
            }
            TokenKind::Keyword(Keyword::Anti) if self.peek_keyword(1, Keyword::Join) => {
                self.advance();
                JoinType::LeftAnti
            }
            _ if natural => return Err(self.error_here("JOIN")),
            _ => return Ok(None),
        };
        self.expect_keyword(Keyword::Join)?;
        Ok(Some((join_type, natural)))
    }

    /// Table, table function, VALUES, derived table or parenthesized join.
    fn parse_relation_primary(&mut self) -> Result<LogicalPlan, ParseError> {
        if self.check(&TokenKind::LeftParen) {
            let derived = self.attempt(|p| {
                p.advance();
                let query = p.parse_query()?;
                p.expect(&TokenKind::RightParen)?;
                Ok(query)
            })?;
            let Some(query) = derived else {
                self.advance();
                let plan = self.parse_relation()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(plan);
            };
            let after = self.position();
            let alias = self.parse_optional_alias()?;
            self.add_hint_target(after..=self.position(), None);
            return Ok(match alias {
                Some(alias) => LogicalPlan::SubqueryAlias {
                    alias,
                    child: Box::new(query),
                },
                None => query,
            });
        }

        if self.check_keyword(Keyword::Values) {
            let table = self.parse_inline_table()?;
            return self.parse_inline_table_alias(table);
        }

        let table = self.parse_table_identifier()?;
        if self.check(&TokenKind::LeftParen) {
            let name = match &table.database {
                Some(database) => format!("{database}.{}", table.table),
                None => table.table.clone(),
            };
            self.advance();
            let args = if self.check(&TokenKind::RightParen) {
                vec![]
            } else {
                self.parse_expr_list()?
            };
            self.expect(&TokenKind::RightParen)?;
            let alias = self.parse_optional_alias()?;
            return Ok(LogicalPlan::TableFunction { name, args, alias });
        }

        let name_end = self.position();
        let stream = if self.check_keyword(Keyword::Window)
            && matches!(self.peek(1).kind, TokenKind::LeftParen)
        {
            Some(self.parse_stream_window()?)
        } else {
            None
        };
        let alias = self.parse_optional_alias()?;
        let suffix = alias.clone().unwrap_or_else(|| table.table.clone());
        self.add_hint_target(name_end..=self.position(), Some(suffix));

        let relation = LogicalPlan::Relation { table, alias };
        Ok(match stream {
            Some((duration_ms, slide_ms)) => LogicalPlan::StreamWindow {
                duration_ms,
                slide_ms,
                child: Box::new(relation),
            },
            None => relation,
        })
    }

    /// `[AS] alias [(col, ...)]` after VALUES in FROM.
    fn parse_inline_table_alias(&mut self, table: LogicalPlan) -> Result<LogicalPlan, ParseError> {
        let span = self.current().span;
        let Some(alias) = self.parse_optional_alias()? else {
            return Ok(table);
        };
        let mut table = table;
        if self.consume(&TokenKind::LeftParen) {
            let names = self.parse_identifier_list()?;
            self.expect(&TokenKind::RightParen)?;
            if let LogicalPlan::InlineTable { columns, .. } = &mut table {
                if columns.len() != names.len() {
                    return Err(ParseError::semantic(
                        format!(
                            "Number of column aliases ({}) does not match number of columns ({})",
                            names.len(),
                            columns.len()
                        ),
                        span,
                    ));
                }
                *columns = names;
            }
        }
        Ok(LogicalPlan::SubqueryAlias {
            alias,
            child: Box::new(table),
        })
    }

    /// `VALUES row [, row ...]`; every row literal is tokenized.
    pub(super) fn parse_inline_table(&mut self) -> Result<LogicalPlan, ParseError> {
        let start = self.expect_keyword(Keyword::Values)?.span;
        let rows = self.tokenized(|p| {
            let mut rows = vec![];
            loop {
                let row = if p.consume(&TokenKind::LeftParen) {
                    let row = p.parse_expr_list()?;
                    p.expect(&TokenKind::RightParen)?;
                    row
                } else {
                    vec![p.parse_expr(0)?]
                };
                rows.push(row);
                if !p.consume(&TokenKind::Comma) {
                    break;
                }
            }
            Ok(rows)
        })?;

        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(ParseError::semantic(
                "All rows of a VALUES list must have the same number of columns",
                start,
            ));
        }
        let columns = (1..=width).map(|i| format!("col{i}")).collect();
        Ok(LogicalPlan::InlineTable { columns, rows })
    }

    /// `WINDOW (DURATION n unit [, SLIDE n unit])` after a stream table.
    fn parse_stream_window(&mut self) -> Result<(u64, Option<u64>), ParseError> {
        self.expect_keyword(Keyword::Window)?;
        self.expect(&TokenKind::LeftParen)?;
        self.expect_word("DURATION")?;
        let duration = self.parse_duration()?;
        let slide = if self.consume(&TokenKind::Comma) {
            self.expect_word("SLIDE")?;
            Some(self.parse_duration()?)
        } else {
            None
        };
        self.expect(&TokenKind::RightParen)?;
        Ok((duration, slide))
    }

    /// `n MILLISECONDS|SECONDS|MINUTES` in milliseconds.
    fn parse_duration(&mut self) -> Result<u64, ParseError> {
        let token = self.current().clone();
        let TokenKind::Number(text) = &token.kind else {
            return Err(self.error_here("duration"));
        };
        let value: u64 = text.parse().map_err(|_| {
            ParseError::new(format!("Invalid window duration {text}"), token.span)
        })?;
        self.advance();

        let unit_span = self.current().span;
        let unit = self.word_at(0).unwrap_or("").to_ascii_uppercase();
        let scale = match unit.as_str() {
            "MILLISECOND" | "MILLISECONDS" | "MS" => 1,
            "SECOND" | "SECONDS" => 1_000,
            "MINUTE" | "MINUTES" => 60_000,
            _ => return Err(self.error_here("MILLISECONDS, SECONDS or MINUTES")),
        };
        self.advance();
        value
            .checked_mul(scale)
            .ok_or_else(|| ParseError::semantic("Window duration is too large", unit_span))
    }

    /// `LATERAL VIEW [OUTER] generator(args) alias [AS col, ...]`
    fn parse_lateral_view(&mut self, child: LogicalPlan) -> Result<LogicalPlan, ParseError> {
        self.expect_keyword(Keyword::Lateral)?;
        self.expect_keyword(Keyword::View)?;
        let outer = self.consume_keyword(Keyword::Outer);
        let name = self.identifier()?;
        let generator = self.parse_call(name)?;
        let table_alias = self.strict_identifier()?;
        let column_aliases = if self.consume_keyword(Keyword::As) {
            let mut names = vec![self.strict_identifier()?];
            while self.consume(&TokenKind::Comma) {
                names.push(self.strict_identifier()?);
            }
            names
        } else {
            vec![]
        };
        Ok(LogicalPlan::Generate {
            generator,
            outer,
            table_alias,
            column_aliases,
            child: Box::new(child),
        })
    }

    // --- GROUP BY ---

    /// Grouping after `GROUP BY`.
    fn parse_group_by(&mut self) -> Result<GroupBy, ParseError> {
        for (keyword, cube) in [(Keyword::Cube, true), (Keyword::Rollup, false)] {
            if self.check_keyword(keyword) && matches!(self.peek(1).kind, TokenKind::LeftParen) {
                self.advance();
                self.advance();
                let exprs = self.parse_expr_list()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(if cube {
                    GroupBy::Cube(exprs)
                } else {
                    GroupBy::Rollup(exprs)
                });
            }
        }

        let exprs = self.parse_expr_list()?;
        if self.consume_pair(Keyword::With, Keyword::Cube) {
            return Ok(GroupBy::Cube(exprs));
        }
        if self.consume_pair(Keyword::With, Keyword::Rollup) {
            return Ok(GroupBy::Rollup(exprs));
        }
        if self.check_keyword(Keyword::Grouping) && self.peek_keyword(1, Keyword::Sets) {
            return self.parse_grouping_sets(exprs);
        }
        Ok(GroupBy::Exprs(exprs))
    }

    /// `GROUPING SETS ((a, b), (a), ())` over the GROUP BY list.
    fn parse_grouping_sets(&mut self, exprs: Vec<Expr>) -> Result<GroupBy, ParseError> {
        let start = self.current().span;
        self.expect_keyword(Keyword::Grouping)?;
        self.expect_keyword(Keyword::Sets)?;
        let n = exprs.len();
        if n > MAX_GROUPING_COLUMNS {
            return Err(ParseError::semantic(
                format!("Grouping sets support at most {MAX_GROUPING_COLUMNS} columns, got {n}"),
                start,
            ));
        }
        let full = if n == MAX_GROUPING_COLUMNS {
            u64::MAX
        } else {
            (1u64 << n) - 1
        };

        self.expect(&TokenKind::LeftParen)?;
        let mut bitmasks = vec![];
        loop {
            let span = self.current().span;
            let members = if self.consume(&TokenKind::LeftParen) {
                let members = if self.check(&TokenKind::RightParen) {
                    vec![]
                } else {
                    self.parse_expr_list()?
                };
                self.expect(&TokenKind::RightParen)?;
                members
            } else {
                vec![self.parse_expr(0)?]
            };

            let mut mask = full;
            for member in &members {
                let Some(index) = exprs.iter().position(|e| e == member) else {
                    return Err(ParseError::semantic(
                        format!("{member} doesn't show up in the GROUP BY list"),
                        span,
                    ));
                };
                mask &= !(1u64 << (n - 1 - index));
            }
            bitmasks.push(mask);

            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;
        Ok(GroupBy::GroupingSets { exprs, bitmasks })
    }

    // --- WINDOW clause ---

    /// `WINDOW name AS (spec) | name AS other [, ...]`
    fn parse_window_definitions(&mut self) -> Result<Vec<(String, Window, Span)>, ParseError> {
        self.expect_keyword(Keyword::Window)?;
        let mut definitions = vec![];
        loop {
            let span = self.current().span;
            let name = self.identifier()?;
            self.expect_keyword(Keyword::As)?;
            let window = if self.consume(&TokenKind::LeftParen) {
                let spec = self.parse_window_spec()?;
                self.expect(&TokenKind::RightParen)?;
                Window::Spec(spec)
            } else {
                Window::Named(self.identifier()?)
            };
            definitions.push((name, window, span));
            if !self.consume(&TokenKind::Comma) {
                break;
            }
        }
        Ok(definitions)
    }
}

fn filter(child: LogicalPlan, predicate: Expr) -> LogicalPlan {
    LogicalPlan::Filter {
        predicate,
        child: Box::new(child),
    }
}

fn sort(child: LogicalPlan, order: Vec<SortOrder>, global: bool) -> LogicalPlan {
    LogicalPlan::Sort {
        order,
        global,
        child: Box::new(child),
    }
}

fn repartition(child: LogicalPlan, partition_by: Vec<Expr>) -> LogicalPlan {
    LogicalPlan::Repartition {
        partition_by,
        child: Box::new(child),
    }
}

fn limit(child: LogicalPlan, count: Expr) -> LogicalPlan {
    LogicalPlan::Limit {
        count,
        child: Box::new(child),
    }
}

/// Resolves one level of `name AS other` indirection between definitions.
fn resolve_window_definitions(
    definitions: Vec<(String, Window, Span)>,
) -> Result<WindowDefinitions, ParseError> {
    let mut specs = HashMap::new();
    for (name, window, _) in &definitions {
        if let Window::Spec(spec) = window {
            specs.insert(name.clone(), spec.clone());
        }
    }
    // references resolve against inline definitions only
    let inline = specs.clone();
    for (name, window, span) in definitions {
        let Window::Named(target) = window else {
            continue;
        };
        if target == name {
            return Err(ParseError::semantic(
                format!("Window specification {name} references itself"),
                span,
            ));
        }
        match inline.get(&target) {
            Some(spec) => {
                specs.insert(name, spec.clone());
            }
            None => {
                return Err(ParseError::semantic(
                    format!(
                        "Window specification {target} referenced by {name} is not defined or is itself a reference"
                    ),
                    span,
                ));
            }
        }
    }
    Ok(specs)
}

fn resolve_sort_windows(
    order: Vec<SortOrder>,
    windows: &WindowDefinitions,
    span: Span,
) -> Result<Vec<SortOrder>, ParseError> {
    order
        .into_iter()
        .map(|item| {
            Ok(SortOrder {
                expr: resolve_named_window(item.expr, windows, span)?,
                ..item
            })
        })
        .collect()
}

fn resolve_named_windows(
    exprs: Vec<Expr>,
    windows: &WindowDefinitions,
    span: Span,
) -> Result<Vec<Expr>, ParseError> {
    exprs
        .into_iter()
        .map(|e| resolve_named_window(e, windows, span))
        .collect()
}

/// Replaces `OVER name` with the definition it names.
fn resolve_named_window(
    expr: Expr,
    windows: &WindowDefinitions,
    span: Span,
) -> Result<Expr, ParseError> {
    let mut missing = None;
    let expr = expr.transform(&mut |e| match e {
        Expr::Function(FunctionCall {
            name,
            args,
            distinct,
            over: Some(Window::Named(window)),
        }) => {
            let over = match windows.get(&window) {
                Some(spec) => Window::Spec(spec.clone()),
                None => {
                    missing.get_or_insert_with(|| window.clone());
                    Window::Named(window)
                }
            };
            Expr::Function(FunctionCall {
                name,
                args,
                distinct,
                over: Some(over),
            })
        }
        other => other,
    });
    match missing {
        Some(window) => Err(ParseError::semantic(
            format!("Window specification {window} is not defined in the WINDOW clause"),
            span,
        )),
        None => Ok(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;
    use crate::parser::parser::ParameterMode;

    fn query(sql: &str) -> Result<LogicalPlan, ParseError> {
        let config = ParserConfig::default();
        let mut parser = Parser::new(sql, &config, ParameterMode::Unbound);
        parser.parse_statement()
    }

    #[test]
    fn test_grouping_set_masks() {
        let plan = query("SELECT a FROM t GROUP BY a, b, c GROUPING SETS ((a), (b, c), ())").unwrap();
        let LogicalPlan::Aggregate { group_by, .. } = plan else {
            panic!("expected aggregate");
        };
        let GroupBy::GroupingSets { bitmasks, .. } = group_by else {
            panic!("expected grouping sets");
        };
        assert_eq!(bitmasks, vec![0b011, 0b100, 0b111]);
    }

    #[test]
    fn test_grouping_set_member_must_be_grouped() {
        let err = query("SELECT a FROM t GROUP BY a GROUPING SETS ((b))").unwrap_err();
        assert!(err.is_semantic());
    }

    #[test]
    fn test_window_indirection() {
        let plan =
            query("SELECT sum(x) OVER w2 FROM t WINDOW w1 AS (PARTITION BY a), w2 AS w1").unwrap();
        let LogicalPlan::Project { exprs, .. } = plan else {
            panic!("expected project");
        };
        let Expr::Function(call) = &exprs[0] else {
            panic!("expected call");
        };
        assert!(matches!(call.over, Some(Window::Spec(_))));
    }

    #[test]
    fn test_window_self_reference() {
        assert!(query("SELECT 1 FROM t WINDOW w AS w").unwrap_err().is_semantic());
    }

    #[test]
    fn test_undefined_window() {
        assert!(query("SELECT rank() OVER w FROM t").unwrap_err().is_semantic());
    }

    #[test]
    fn test_stream_window_duration() {
        let plan = query("SELECT * FROM s WINDOW (DURATION 10 SECONDS, SLIDE 5 SECONDS) x").unwrap();
        let LogicalPlan::Project { child, .. } = plan else {
            panic!("expected project");
        };
        assert!(matches!(
            *child,
            LogicalPlan::StreamWindow {
                duration_ms: 10_000,
                slide_ms: Some(5_000),
                ..
            }
        ));
    }
}
