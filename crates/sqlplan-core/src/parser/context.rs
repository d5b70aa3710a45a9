//! Literal tokenization state for one parse.
//!
//! A literal becomes a placeholder only when tokenization is enabled for the
//! statement kind and the grammar region producing it is active. Placeholders
//! may later be demoted back to constants; demotion is keyed by ordinal so an
//! unrelated literal with an equal value is never touched.

use serde::Serialize;
use tracing::debug;

use crate::ast::{DataType, Expr, LiteralValue};

/// A literal captured as a statement parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenizedLiteral {
    /// Ordinal referenced by the matching [`Expr::Placeholder`].
    pub ordinal: usize,
    /// The captured constant.
    pub value: LiteralValue,
}

impl TokenizedLiteral {
    /// Type of the captured value.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.value.data_type()
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TokenizationContext {
    enabled: bool,
    regions: Vec<bool>,
    records: Vec<TokenizedLiteral>,
    next_ordinal: usize,
    caching_disabled: Option<String>,
}

impl TokenizationContext {
    /// Decides, once per statement, whether anything may be tokenized.
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// True when a literal produced right now would become a placeholder.
    pub(crate) fn is_tokenizing(&self) -> bool {
        self.enabled && self.regions.last().copied().unwrap_or(false)
    }

    pub(crate) fn push_region(&mut self, active: bool) {
        self.regions.push(active);
    }

    pub(crate) fn pop_region(&mut self) {
        self.regions.pop();
    }

    /// Produces either a placeholder registered under a fresh ordinal or a
    /// plain constant.
    pub(crate) fn emit(&mut self, value: LiteralValue) -> Expr {
        if !self.is_tokenizing() {
            return Expr::Literal(value);
        }
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        let data_type = value.data_type();
        self.records.push(TokenizedLiteral { ordinal, value });
        Expr::Placeholder { ordinal, data_type }
    }

    /// Turns a placeholder back into its constant, dropping its record.
    /// Any other expression is returned unchanged.
    pub(crate) fn demote(&mut self, expr: Expr) -> Expr {
        let Expr::Placeholder { ordinal, .. } = expr else {
            return expr;
        };
        match self.records.iter().position(|r| r.ordinal == ordinal) {
            Some(index) => {
                let record = self.records.remove(index);
                debug!(ordinal, value = %record.value, "demoted tokenized literal");
                Expr::Literal(record.value)
            }
            None => expr,
        }
    }

    /// Demotes every placeholder anywhere inside `expr`.
    pub(crate) fn demote_all(&mut self, expr: Expr) -> Expr {
        expr.transform(&mut |e| self.demote(e))
    }

    /// A copy of `expr` with each pending placeholder replaced by its value.
    pub(crate) fn materialized(&self, expr: &Expr) -> Expr {
        expr.clone().transform(&mut |e| match e {
            Expr::Placeholder { ordinal, data_type } => {
                match self.records.iter().find(|r| r.ordinal == ordinal) {
                    Some(record) => Expr::Literal(record.value.clone()),
                    None => Expr::Placeholder { ordinal, data_type },
                }
            }
            other => other,
        })
    }

    /// Marks the statement as unsafe to cache; the first reason wins.
    pub(crate) fn disable_caching(&mut self, reason: &str) {
        if self.caching_disabled.is_none() {
            debug!(reason, "plan caching disabled");
            self.caching_disabled = Some(String::from(reason));
        }
    }

    pub(crate) fn caching_disabled(&self) -> Option<&str> {
        self.caching_disabled.as_deref()
    }

    /// Hands over the captured records in ordinal order.
    pub(crate) fn take_records(&mut self) -> Vec<TokenizedLiteral> {
        std::mem::take(&mut self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizing() -> TokenizationContext {
        let mut ctx = TokenizationContext::default();
        ctx.set_enabled(true);
        ctx.push_region(true);
        ctx
    }

    #[test]
    fn test_requires_both_flags() {
        let mut ctx = TokenizationContext::default();
        ctx.push_region(true);
        assert!(matches!(ctx.emit(LiteralValue::Int(1)), Expr::Literal(_)));

        ctx.set_enabled(true);
        ctx.push_region(false);
        assert!(matches!(ctx.emit(LiteralValue::Int(1)), Expr::Literal(_)));
        ctx.pop_region();
        assert!(matches!(
            ctx.emit(LiteralValue::Int(1)),
            Expr::Placeholder { ordinal: 0, .. }
        ));
    }

    #[test]
    fn test_demote_by_identity() {
        let mut ctx = tokenizing();
        let first = ctx.emit(LiteralValue::Int(5));
        let second = ctx.emit(LiteralValue::Int(5));
        assert_eq!(ctx.demote(second), Expr::Literal(LiteralValue::Int(5)));
        let records = ctx.take_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ordinal, 0);
        assert!(matches!(first, Expr::Placeholder { ordinal: 0, .. }));
    }

    #[test]
    fn test_demote_all_nested() {
        let mut ctx = tokenizing();
        let arg = ctx.emit(LiteralValue::String(String::from("yyyy")));
        let call = Expr::function("upper", vec![arg]);
        let out = ctx.demote_all(call);
        assert_eq!(out.to_string(), "upper('yyyy')");
        assert!(ctx.take_records().is_empty());
    }

    #[test]
    fn test_materialized_keeps_records() {
        let mut ctx = tokenizing();
        let arg = ctx.emit(LiteralValue::Int(3));
        let call = Expr::function("substr", vec![Expr::column("a"), arg]);
        assert_eq!(ctx.materialized(&call).to_string(), "substr(a, 3)");
        assert_eq!(ctx.take_records().len(), 1);
    }

    #[test]
    fn test_first_disable_reason_wins() {
        let mut ctx = tokenizing();
        ctx.disable_caching("scalar subquery");
        ctx.disable_caching("from_json");
        assert_eq!(ctx.caching_disabled(), Some("scalar subquery"));
    }
}
