//! SQL Lexer/Tokenizer
//!
//! A hand-written scanner producing the token stream the grammar consumes.
//! Query hints embedded in `/*+ ... */` and `--+ ...` comments are collected
//! on the side while comments are skipped.

mod keyword;
mod span;
mod token;
mod tokenizer;

pub use keyword::{registry, Keyword, KeywordClass, KeywordRegistry};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use tokenizer::{HintComment, Lexer, Scanned};
