//! Plan and expression trees produced by the parser.

mod expression;
mod literal;
mod plan;
mod types;

pub use expression::{
    BinaryOp, Expr, FrameBound, FrameUnits, FunctionCall, NullOrdering, SortDirection, SortOrder,
    UnaryOp, Window, WindowFrame, WindowSpec,
};
pub use literal::{
    Interval, LiteralValue, MICROS_PER_DAY, MICROS_PER_HOUR, MICROS_PER_MILLISECOND,
    MICROS_PER_MINUTE, MICROS_PER_SECOND, MICROS_PER_WEEK,
};
pub use plan::{
    Command, GroupBy, JoinConstraint, JoinType, LogicalPlan, SetOpKind, TableIdentifier,
};
pub use types::{DataType, StructField, DEFAULT_DECIMAL, MAX_DECIMAL_PRECISION};
