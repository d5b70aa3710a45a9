//! Attaching hint comments to relations.

use std::ops::RangeInclusive;

use tracing::trace;

use super::error::ParseError;
use crate::lexer::HintComment;
use crate::statement::QueryHints;

/// Tokens after a relation name whose hints bind to that relation.
#[derive(Debug, Clone)]
pub(crate) struct HintTarget {
    pub(crate) tokens: RangeInclusive<usize>,
    /// Appended to the hint name; `None` marks a derived table.
    pub(crate) suffix: Option<String>,
}

/// Builds the statement's hint map. Later hints overwrite earlier ones with
/// the same key.
pub(crate) fn resolve_hints(
    comments: &[HintComment],
    targets: &[HintTarget],
) -> Result<QueryHints, ParseError> {
    let mut hints = QueryHints::new();
    for comment in comments {
        let target = targets
            .iter()
            .rev()
            .find(|t| t.tokens.contains(&comment.token_index));
        let key = match target {
            Some(HintTarget {
                suffix: Some(suffix),
                ..
            }) => format!("{}{suffix}", comment.name),
            Some(HintTarget { suffix: None, .. }) => {
                return Err(ParseError::semantic(
                    format!(
                        "Query hint '{}' cannot be applied to a derived table",
                        comment.name
                    ),
                    comment.span,
                ));
            }
            None => comment.name.clone(),
        };
        trace!(key = %key, value = %comment.value, "query hint");
        hints.insert(key, comment.value.clone());
    }
    Ok(hints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Span;

    fn comment(name: &str, value: &str, token_index: usize) -> HintComment {
        HintComment {
            name: String::from(name),
            value: String::from(value),
            token_index,
            span: Span::default(),
        }
    }

    #[test]
    fn test_statement_and_relation_hints() {
        let targets = [HintTarget {
            tokens: 4..=5,
            suffix: Some(String::from("t")),
        }];
        let hints = resolve_hints(
            &[comment("joinOrder", "fixed", 1), comment("index", "i1", 5)],
            &targets,
        )
        .unwrap();
        assert_eq!(hints.get("joinOrder").map(String::as_str), Some("fixed"));
        assert_eq!(hints.get("indext").map(String::as_str), Some("i1"));
    }

    #[test]
    fn test_last_write_wins() {
        let hints =
            resolve_hints(&[comment("a", "1", 0), comment("a", "2", 3)], &[]).unwrap();
        assert_eq!(hints.get("a").map(String::as_str), Some("2"));
    }

    #[test]
    fn test_derived_table_hint_rejected() {
        let targets = [HintTarget {
            tokens: 7..=8,
            suffix: None,
        }];
        let err = resolve_hints(&[comment("index", "i", 7)], &targets).unwrap_err();
        assert!(err.is_semantic());
    }
}
