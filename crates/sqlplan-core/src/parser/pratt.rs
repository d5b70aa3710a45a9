//! Binding powers for the Pratt expression parser.
//!
//! From loosest to tightest: OR, AND, prefix NOT, comparisons (including
//! BETWEEN, IN, LIKE, IS and shifts), additive, multiplicative (including
//! bitwise and `||`), unary minus and `~`, then subscripts and field access.

use crate::ast::{BinaryOp, UnaryOp};
use crate::lexer::{Keyword, TokenKind};

/// Binding power of prefix NOT, between AND and the comparisons.
pub const NOT_BINDING_POWER: u8 = 5;

/// Binding power of unary minus, plus and `~`.
pub const UNARY_BINDING_POWER: u8 = 13;

/// Returns the prefix binding power for a token.
///
/// Returns `None` if the token is not a prefix operator.
#[must_use]
pub const fn prefix_binding_power(kind: &TokenKind) -> Option<u8> {
    match kind {
        TokenKind::Minus | TokenKind::Plus | TokenKind::BitNot => Some(UNARY_BINDING_POWER),
        TokenKind::Keyword(Keyword::Not) | TokenKind::Bang => Some(NOT_BINDING_POWER),
        _ => None,
    }
}

/// Returns the infix binding power for a token.
///
/// Returns `(left_bp, right_bp)`; every infix operator is left associative.
/// `NOT` only counts as infix when it introduces a negated predicate, which
/// the caller checks.
#[must_use]
pub const fn infix_binding_power(kind: &TokenKind) -> Option<(u8, u8)> {
    match kind {
        TokenKind::Keyword(Keyword::Or) => Some((1, 2)),
        TokenKind::Keyword(Keyword::And) => Some((3, 4)),

        TokenKind::Eq
        | TokenKind::NotEq
        | TokenKind::NullSafeEq
        | TokenKind::Lt
        | TokenKind::LtEq
        | TokenKind::Gt
        | TokenKind::GtEq
        | TokenKind::LeftShift
        | TokenKind::RightShift
        | TokenKind::UnsignedRightShift => Some((7, 8)),

        TokenKind::Keyword(
            Keyword::Is
            | Keyword::In
            | Keyword::Between
            | Keyword::Like
            | Keyword::Rlike
            | Keyword::Regexp
            | Keyword::Not,
        ) => Some((7, 8)),

        TokenKind::Plus | TokenKind::Minus => Some((9, 10)),

        TokenKind::Star
        | TokenKind::Slash
        | TokenKind::Percent
        | TokenKind::BitAnd
        | TokenKind::BitOr
        | TokenKind::BitXor
        | TokenKind::Concat => Some((11, 12)),

        _ => None,
    }
}

/// Returns the postfix binding power for a token.
///
/// Returns `None` if the token is not a postfix operator.
#[must_use]
pub const fn postfix_binding_power(kind: &TokenKind) -> Option<u8> {
    match kind {
        // a[i], a.field
        TokenKind::LeftBracket | TokenKind::Dot => Some(15),
        _ => None,
    }
}

/// Converts a token to a binary operator.
#[must_use]
pub const fn token_to_binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        TokenKind::Eq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::NotEq),
        TokenKind::NullSafeEq => Some(BinaryOp::NullSafeEq),
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::LtEq => Some(BinaryOp::LtEq),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::GtEq => Some(BinaryOp::GtEq),
        TokenKind::Keyword(Keyword::And) => Some(BinaryOp::And),
        TokenKind::Keyword(Keyword::Or) => Some(BinaryOp::Or),
        TokenKind::Concat => Some(BinaryOp::Concat),
        TokenKind::BitAnd => Some(BinaryOp::BitAnd),
        TokenKind::BitOr => Some(BinaryOp::BitOr),
        TokenKind::BitXor => Some(BinaryOp::BitXor),
        TokenKind::LeftShift => Some(BinaryOp::ShiftLeft),
        TokenKind::RightShift => Some(BinaryOp::ShiftRight),
        TokenKind::UnsignedRightShift => Some(BinaryOp::ShiftRightUnsigned),
        _ => None,
    }
}

/// Converts a token to a unary operator.
#[must_use]
pub const fn token_to_unary_op(kind: &TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Minus => Some(UnaryOp::Neg),
        TokenKind::Keyword(Keyword::Not) | TokenKind::Bang => Some(UnaryOp::Not),
        TokenKind::BitNot => Some(UnaryOp::BitNot),
        _ => None,
    }
}
