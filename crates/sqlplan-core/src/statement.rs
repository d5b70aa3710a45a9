//! The result of parsing one statement.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::ast::{DataType, Expr, LiteralValue, LogicalPlan};
use crate::parser::TokenizedLiteral;

/// Query hints keyed by name, or by name plus relation alias for hints
/// attached to a table.
pub type QueryHints = BTreeMap<String, String>;

/// A parsed statement with its captured parameters and hints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedStatement {
    /// The plan; literals that were tokenized appear as placeholders.
    pub plan: LogicalPlan,
    /// Hints found in `/*+ ... */` and `--+` comments.
    pub hints: QueryHints,
    /// Captured literals, with ordinals `0..len`.
    pub parameters: Vec<TokenizedLiteral>,
    /// Number of `?` markers seen.
    pub positional_parameters: usize,
    /// Whether the plan may be cached and rebound with other literals.
    pub cacheable: bool,
}

/// Values supplied to [`ParsedStatement::rebind`] do not fit the plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RebindError {
    #[error("statement is not cacheable")]
    NotCacheable,
    #[error("expected {expected} parameter values, got {found}")]
    CountMismatch { expected: usize, found: usize },
    #[error("parameter {ordinal} has type {expected}, got {found}")]
    TypeMismatch {
        ordinal: usize,
        expected: DataType,
        found: DataType,
    },
}

impl ParsedStatement {
    /// Types of the captured parameters in ordinal order.
    #[must_use]
    pub fn parameter_types(&self) -> Vec<DataType> {
        self.parameters.iter().map(TokenizedLiteral::data_type).collect()
    }

    /// The plan with every placeholder replaced by its captured value.
    #[must_use]
    pub fn materialize(&self) -> LogicalPlan {
        materialize_plan(self.plan.clone(), &self.parameters)
    }

    /// Reuses the plan with new literal values of the same types.
    ///
    /// # Errors
    ///
    /// Fails if the statement is not cacheable, or if the number or types
    /// of `values` differ from the captured parameters.
    pub fn rebind(&self, values: &[LiteralValue]) -> Result<Self, RebindError> {
        if !self.cacheable {
            return Err(RebindError::NotCacheable);
        }
        if values.len() != self.parameters.len() {
            return Err(RebindError::CountMismatch {
                expected: self.parameters.len(),
                found: values.len(),
            });
        }
        let parameters = self
            .parameters
            .iter()
            .zip(values)
            .map(|(old, value)| {
                let expected = old.data_type();
                let found = value.data_type();
                if expected == found {
                    Ok(TokenizedLiteral {
                        ordinal: old.ordinal,
                        value: value.clone(),
                    })
                } else {
                    Err(RebindError::TypeMismatch {
                        ordinal: old.ordinal,
                        expected,
                        found,
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            parameters,
            ..self.clone()
        })
    }
}

/// Substitutes captured values for placeholders.
pub(crate) fn materialize_plan(plan: LogicalPlan, parameters: &[TokenizedLiteral]) -> LogicalPlan {
    plan.transform_expressions(&mut |e| match e {
        Expr::Placeholder { ordinal, data_type } => {
            match parameters.iter().find(|p| p.ordinal == ordinal) {
                Some(p) => Expr::Literal(p.value.clone()),
                None => Expr::Placeholder { ordinal, data_type },
            }
        }
        other => other,
    })
}
