//! # sqlplan-core
//!
//! A SQL grammar engine that turns statements into logical plan trees.
//!
//! This crate provides:
//! - A lexer with a keyword registry and hint comment capture
//! - A hand-written recursive descent parser with Pratt expression parsing
//! - Literal tokenization, so that statements differing only in constants
//!   share one cacheable plan
//! - Prepared statement support with `?` markers
//!
//! ## Parsing
//!
//! ```rust
//! use sqlplan_core::{ParserConfig, SqlParser};
//!
//! let mut parser = SqlParser::new(ParserConfig::default());
//! let parsed = parser.parse("SELECT a FROM t WHERE b = 5").unwrap();
//!
//! assert!(parsed.cacheable);
//! assert_eq!(parsed.parameters.len(), 1);
//! println!("{}", parsed.plan);
//! ```
//!
//! ## Rebinding a cached plan
//!
//! ```rust
//! use sqlplan_core::{LiteralValue, ParserConfig, SqlParser};
//!
//! let mut parser = SqlParser::new(ParserConfig::default());
//! let parsed = parser.parse("SELECT a FROM t WHERE b = 5").unwrap();
//! let rebound = parsed.rebind(&[LiteralValue::Int(7)]).unwrap();
//!
//! assert_eq!(rebound.plan, parsed.plan);
//! ```

pub mod ast;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod statement;

pub use ast::{DataType, Expr, LiteralValue, LogicalPlan, TableIdentifier};
pub use config::{ConfigError, ParserConfig};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{ParseError, SqlParser, TokenizedLiteral};
pub use statement::{ParsedStatement, QueryHints, RebindError};
