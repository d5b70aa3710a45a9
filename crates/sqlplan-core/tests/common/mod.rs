#![allow(dead_code)]

use sqlplan_core::ast::{Expr, LogicalPlan};
use sqlplan_core::{LiteralValue, ParseError, ParsedStatement, ParserConfig, SqlParser};

pub fn parse(sql: &str) -> ParsedStatement {
    parse_with(ParserConfig::default(), sql)
}

pub fn parse_with(config: ParserConfig, sql: &str) -> ParsedStatement {
    SqlParser::new(config)
        .parse(sql)
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e}"))
}

pub fn prepare(sql: &str) -> ParsedStatement {
    SqlParser::default()
        .prepare(sql)
        .unwrap_or_else(|e| panic!("Failed to prepare: {sql}\nError: {e}"))
}

pub fn parse_bound(sql: &str, values: &[LiteralValue]) -> ParsedStatement {
    SqlParser::default()
        .parse_with_parameters(sql, values)
        .unwrap_or_else(|e| panic!("Failed to parse: {sql}\nError: {e}"))
}

pub fn parse_err(sql: &str) -> ParseError {
    SqlParser::default()
        .parse(sql)
        .expect_err(&format!("Expected parse error for: {sql}"))
}

pub fn parse_err_with(config: ParserConfig, sql: &str) -> ParseError {
    SqlParser::new(config)
        .parse(sql)
        .expect_err(&format!("Expected parse error for: {sql}"))
}

/// The plan with literals kept as constants.
pub fn constant_plan(sql: &str) -> LogicalPlan {
    parse_with(ParserConfig::default().with_tokenize_literals(false), sql).plan
}

/// The rendered plan tree with literals kept as constants.
pub fn tree(sql: &str) -> String {
    constant_plan(sql).to_string()
}

pub fn expr(sql: &str) -> Expr {
    SqlParser::default()
        .parse_expression(sql)
        .unwrap_or_else(|e| panic!("Failed to parse expression: {sql}\nError: {e}"))
}

pub fn expr_str(sql: &str) -> String {
    expr(sql).to_string()
}

pub fn expr_err(sql: &str) -> ParseError {
    SqlParser::default()
        .parse_expression(sql)
        .expect_err(&format!("Expected expression error for: {sql}"))
}

/// Projection list of a plain `SELECT ... [FROM ...]`.
pub fn projection(plan: &LogicalPlan) -> &[Expr] {
    match plan {
        LogicalPlan::Project { exprs, .. } | LogicalPlan::Aggregate { exprs, .. } => exprs,
        other => panic!("Expected Project or Aggregate, got {other:?}"),
    }
}

/// Single projected expression of `SELECT <expr> ...` with constants kept.
pub fn select_expr(sql: &str) -> Expr {
    let plan = constant_plan(sql);
    let exprs = projection(&plan);
    assert_eq!(exprs.len(), 1, "Expected one projected expression in: {sql}");
    exprs[0].clone()
}

/// Predicate of the outermost Filter directly under the projection.
pub fn where_predicate(plan: &LogicalPlan) -> &Expr {
    let child = match plan {
        LogicalPlan::Project { child, .. } | LogicalPlan::Aggregate { child, .. } => child,
        other => panic!("Expected Project or Aggregate, got {other:?}"),
    };
    match child.as_ref() {
        LogicalPlan::Filter { predicate, .. } => predicate,
        other => panic!("Expected Filter, got {other:?}"),
    }
}

/// Captured parameter values in ordinal order.
pub fn values(parsed: &ParsedStatement) -> Vec<LiteralValue> {
    parsed.parameters.iter().map(|p| p.value.clone()).collect()
}
