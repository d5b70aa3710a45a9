//! Token types for the SQL lexer.

use super::{Keyword, Span};

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal text, including any type suffix (e.g. `42`, `3.14`, `10L`, `1.5BD`).
    Number(String),
    /// String literal with `''` escapes resolved (e.g. 'hello')
    String(String),
    /// Binary literal (e.g. X'1234')
    Blob(Vec<u8>),

    // Identifiers and keywords
    /// Unquoted identifier, as written
    Identifier(String),
    /// Backtick or double-quote delimited identifier with doubled delimiters resolved
    QuotedIdentifier(String),
    /// SQL keyword
    Keyword(Keyword),

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// = or ==
    Eq,
    /// != or <>
    NotEq,
    /// <=>
    NullSafeEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// ||
    Concat,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ^
    BitXor,
    /// ~
    BitNot,
    /// !
    Bang,
    /// <<
    LeftShift,
    /// >>
    RightShift,
    /// >>>
    UnsignedRightShift,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// [
    LeftBracket,
    /// ]
    RightBracket,
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// :
    Colon,
    /// ?
    Question,

    // Special
    /// End of input
    Eof,
    /// Lexical error (unterminated literal, malformed number, bad hint...)
    Error(String),
}

impl TokenKind {
    /// Short human readable description used in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number {n}"),
            Self::String(s) => format!("string '{s}'"),
            Self::Blob(_) => String::from("binary literal"),
            Self::Identifier(name) => format!("identifier {name}"),
            Self::QuotedIdentifier(name) => format!("identifier `{name}`"),
            Self::Keyword(kw) => format!("keyword {}", kw.as_str()),
            Self::Eof => String::from("end of input"),
            Self::Error(msg) => msg.clone(),
            other => format!("{other:?}"),
        }
    }
}

/// A token with its span in the source code.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source code.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns true if this is a keyword.
    #[must_use]
    pub const fn is_keyword(&self) -> bool {
        matches!(self.kind, TokenKind::Keyword(_))
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}
