//! Parser error types.

use thiserror::Error;

use crate::lexer::{Span, TokenKind};

/// Whether an error came from the grammar or from a semantic check.
///
/// Syntax errors let an ordered alternative fall through to the next one;
/// semantic errors always abort the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Semantic,
}

/// A parse error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}{}", render_location(.span, .context.as_deref()))]
pub struct ParseError {
    /// Syntax or semantic.
    pub kind: ErrorKind,
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
    /// Expected tokens (if applicable).
    pub expected: Option<String>,
    /// The actual token found.
    pub found: Option<TokenKind>,
    /// `line:column`, source line and caret; set by the top-level entry point.
    pub context: Option<String>,
}

fn render_location(span: &Span, context: Option<&str>) -> String {
    match context {
        Some(ctx) => format!(" at {ctx}"),
        None => format!(" at position {}..{}", span.start, span.end),
    }
}

impl ParseError {
    /// Creates a new syntax error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: message.into(),
            span,
            expected: None,
            found: None,
            context: None,
        }
    }

    /// Creates a semantic error, which is never recovered by backtracking.
    #[must_use]
    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: ErrorKind::Semantic,
            ..Self::new(message, span)
        }
    }

    /// Creates an "unexpected token" error.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        let expected: String = expected.into();
        if matches!(found, TokenKind::Eof) {
            return Self::unexpected_eof(expected, span);
        }
        if let TokenKind::Error(message) = &found {
            return Self {
                expected: Some(expected),
                found: Some(found.clone()),
                ..Self::new(message.clone(), span)
            };
        }
        Self {
            message: format!(
                "Unexpected token: expected {expected}, found {}",
                found.describe()
            ),
            expected: Some(expected),
            found: Some(found),
            ..Self::new("", span)
        }
    }

    /// Creates an "unexpected end of input" error.
    #[must_use]
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        let expected: String = expected.into();
        Self {
            message: format!("Unexpected end of input: expected {expected}"),
            expected: Some(expected),
            found: Some(TokenKind::Eof),
            ..Self::new("", span)
        }
    }

    /// Returns true for errors raised by semantic checks.
    #[must_use]
    pub fn is_semantic(&self) -> bool {
        self.kind == ErrorKind::Semantic
    }

    /// Attaches the source position and an excerpt with a caret.
    #[must_use]
    pub fn with_context(mut self, source: &str) -> Self {
        let (line, column) = self.span.line_col(source);
        let text = source.lines().nth(line - 1).unwrap_or("");
        let caret = format!("{}^", " ".repeat(column.saturating_sub(1)));
        self.context = Some(format!("{line}:{column}\n{text}\n{caret}"));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Keyword;

    #[test]
    fn test_unexpected_message() {
        let err = ParseError::unexpected(
            "identifier",
            TokenKind::Keyword(Keyword::From),
            Span::new(7, 11),
        );
        assert_eq!(
            err.to_string(),
            "Unexpected token: expected identifier, found keyword FROM at position 7..11"
        );
        assert_eq!(err.kind, ErrorKind::Syntax);
    }

    #[test]
    fn test_lexical_error_keeps_lexer_message() {
        let err = ParseError::unexpected(
            "expression",
            TokenKind::Error(String::from("Unterminated string literal")),
            Span::new(0, 4),
        );
        assert_eq!(err.message, "Unterminated string literal");
    }

    #[test]
    fn test_context_rendering() {
        let sql = "SELECT a\nFROM WHERE";
        let err = ParseError::new("boom", Span::new(14, 19)).with_context(sql);
        assert_eq!(err.to_string(), "boom at 2:6\nFROM WHERE\n     ^");
    }

    #[test]
    fn test_semantic_kind() {
        assert!(ParseError::semantic("bad", Span::default()).is_semantic());
        assert!(!ParseError::new("bad", Span::default()).is_semantic());
    }
}
