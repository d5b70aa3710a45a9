//! Rewriting of LIKE predicates with constant patterns.
//!
//! Patterns made only of `%` around plain text become string predicates;
//! everything else stays a general LIKE.

use std::sync::LazyLock;

use regex::Regex;

use crate::ast::{BinaryOp, Expr, LiteralValue};

static STARTS_WITH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^_%]+)%$").expect("valid starts-with regex"));
static ENDS_WITH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%([^_%]+)$").expect("valid ends-with regex"));
static STARTS_AND_ENDS_WITH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^_%]+)%([^_%]+)$").expect("valid starts-and-ends regex"));
static CONTAINS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^%([^_%]+)%$").expect("valid contains regex"));
static EQUAL_TO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^_%]*$").expect("valid equal-to regex"));

/// Default LIKE escape character.
pub(crate) const DEFAULT_ESCAPE: char = '\\';

/// Builds the predicate for `expr LIKE pattern [ESCAPE escape]`.
///
/// `pattern` must already be a constant when rewriting is wanted; a
/// placeholder or any other expression yields a general LIKE.
pub(crate) fn rewrite_like(expr: Expr, pattern: Expr, escape: char) -> Expr {
    let text = match pattern.as_literal() {
        Some(LiteralValue::String(text)) if escape == DEFAULT_ESCAPE => text.clone(),
        _ => return general(expr, pattern, escape),
    };

    if text.contains(DEFAULT_ESCAPE) {
        return match unescape_plain(&text) {
            Some(plain) => expr.eq(Expr::string(plain)),
            None => general(expr, pattern, escape),
        };
    }

    let capture = |re: &Regex, group: usize| {
        re.captures(&text)
            .and_then(|c| c.get(group))
            .map(|m| String::from(m.as_str()))
    };

    if let Some(prefix) = capture(&STARTS_WITH, 1) {
        expr.binary(BinaryOp::StartsWith, Expr::string(prefix))
    } else if let Some(suffix) = capture(&ENDS_WITH, 1) {
        expr.binary(BinaryOp::EndsWith, Expr::string(suffix))
    } else if let Some(infix) = capture(&CONTAINS, 1) {
        expr.binary(BinaryOp::Contains, Expr::string(infix))
    } else if let (Some(prefix), Some(suffix)) = (
        capture(&STARTS_AND_ENDS_WITH, 1),
        capture(&STARTS_AND_ENDS_WITH, 2),
    ) {
        let min_len = prefix.chars().count() + suffix.chars().count();
        let min_len = i32::try_from(min_len).unwrap_or(i32::MAX);
        Expr::function("length", vec![expr.clone()])
            .binary(BinaryOp::GtEq, Expr::int(min_len))
            .and(expr.clone().binary(BinaryOp::StartsWith, Expr::string(prefix)))
            .and(expr.binary(BinaryOp::EndsWith, Expr::string(suffix)))
    } else if EQUAL_TO.is_match(&text) {
        expr.eq(Expr::string(text))
    } else {
        general(expr, pattern, escape)
    }
}

fn general(expr: Expr, pattern: Expr, escape: char) -> Expr {
    Expr::Like {
        expr: Box::new(expr),
        pattern: Box::new(pattern),
        escape,
    }
}

/// Resolves backslash escapes of a pattern without live wildcards.
/// Returns `None` when an unescaped `%` or `_` remains or the pattern ends
/// in a dangling escape.
fn unescape_plain(pattern: &str) -> Option<String> {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            DEFAULT_ESCAPE => out.push(chars.next()?),
            '%' | '_' => return None,
            other => out.push(other),
        }
    }
    Some(out)
}
