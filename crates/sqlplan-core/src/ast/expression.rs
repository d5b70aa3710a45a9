//! Expression tree types.

use core::fmt;

use serde::Serialize;

use super::{DataType, LiteralValue, LogicalPlan};

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    NotEq,
    NullSafeEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical
    And,
    Or,

    // String
    Concat,
    StartsWith,
    EndsWith,
    Contains,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    ShiftLeft,
    ShiftRight,
    ShiftRightUnsigned,
}

impl BinaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::NullSafeEq => "<=>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Concat => "||",
            Self::StartsWith => "startswith",
            Self::EndsWith => "endswith",
            Self::Contains => "contains",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::ShiftRightUnsigned => ">>>",
        }
    }

    /// String predicates produced by LIKE rewriting render as calls.
    const fn is_call_like(&self) -> bool {
        matches!(self, Self::StartsWith | Self::EndsWith | Self::Contains)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
    /// Logical NOT
    Not,
    /// Bitwise NOT (~)
    BitNot,
}

impl UnaryOp {
    /// Returns the SQL representation of the operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "NOT ",
            Self::BitNot => "~",
        }
    }
}

/// Sort direction of an ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Placement of NULLs in an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NullOrdering {
    NullsFirst,
    NullsLast,
}

/// An ordering key (ORDER BY, SORT BY, window ORDER BY).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortOrder {
    pub expr: Expr,
    pub direction: SortDirection,
    /// Defaults to NULLS FIRST for ascending and NULLS LAST for descending.
    pub nulls: NullOrdering,
}

impl SortOrder {
    /// Ascending key with the default null placement.
    #[must_use]
    pub const fn ascending(expr: Expr) -> Self {
        Self {
            expr,
            direction: SortDirection::Ascending,
            nulls: NullOrdering::NullsFirst,
        }
    }
}

/// ROWS or RANGE frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameUnits {
    Rows,
    Range,
}

/// One end of a window frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(Box<Expr>),
    CurrentRow,
    Following(Box<Expr>),
    UnboundedFollowing,
}

/// A window frame clause.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: FrameBound,
}

/// PARTITION/ORDER/frame definition of a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<SortOrder>,
    pub frame: Option<WindowFrame>,
}

/// The OVER clause of a function call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Window {
    /// Reference to a window defined in the WINDOW clause.
    Named(String),
    /// Inline definition.
    Spec(WindowSpec),
}

/// A function call expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionCall {
    /// The function name.
    pub name: String,
    /// The arguments.
    pub args: Vec<Expr>,
    /// Whether DISTINCT was specified.
    pub distinct: bool,
    /// Window, if called as an analytic function.
    pub over: Option<Window>,
}

/// An SQL expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// A constant.
    Literal(LiteralValue),

    /// A tokenized literal whose value lives in the statement's parameter list.
    Placeholder {
        /// Index into the parameter list.
        ordinal: usize,
        /// Type of the captured value.
        data_type: DataType,
    },

    /// A `?` marker of a prepared statement (1-based).
    Parameter {
        position: usize,
    },

    /// An unresolved, possibly qualified, name.
    Attribute(Vec<String>),

    /// `*` or `qualifier.*`.
    Star(Option<Vec<String>>),

    /// A unary expression.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },

    /// A binary expression.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
    },

    /// IS NULL expression.
    IsNull {
        /// The expression to check.
        expr: Box<Expr>,
        /// Whether this is IS NOT NULL.
        negated: bool,
    },

    /// BETWEEN expression.
    Between {
        /// The expression to check.
        expr: Box<Expr>,
        /// Lower bound.
        low: Box<Expr>,
        /// Upper bound.
        high: Box<Expr>,
        /// Whether this is NOT BETWEEN.
        negated: bool,
    },

    /// IN with a value list.
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },

    /// IN with a subquery.
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<LogicalPlan>,
        negated: bool,
    },

    /// A LIKE that could not be rewritten into simpler string predicates.
    Like {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        escape: char,
    },

    /// Regular expression match (RLIKE, REGEXP).
    RLike {
        expr: Box<Expr>,
        pattern: Box<Expr>,
    },

    /// A function call.
    Function(FunctionCall),

    /// CASE expression, searched (`operand` is `None`) or simple.
    Case {
        operand: Option<Box<Expr>>,
        branches: Vec<(Expr, Expr)>,
        else_expr: Option<Box<Expr>>,
    },

    /// CAST expression.
    Cast {
        /// Expression to cast.
        expr: Box<Expr>,
        /// Target type.
        data_type: DataType,
    },

    /// EXISTS (subquery).
    Exists(Box<LogicalPlan>),

    /// A subquery used as a value.
    ScalarSubquery(Box<LogicalPlan>),

    /// Anonymous struct built from a parenthesized list.
    Struct(Vec<Expr>),

    /// `expr.name` on a non-attribute expression.
    Field {
        expr: Box<Expr>,
        name: String,
    },

    /// `expr[index]`.
    Index {
        expr: Box<Expr>,
        index: Box<Expr>,
    },

    /// `expr AS name`.
    Alias {
        expr: Box<Expr>,
        name: String,
    },

    CurrentDate,
    CurrentTimestamp,
}

impl Expr {
    /// Creates an unqualified attribute.
    #[must_use]
    pub fn column(name: impl Into<String>) -> Self {
        Self::Attribute(vec![name.into()])
    }

    /// Creates a constant.
    #[must_use]
    pub const fn literal(value: LiteralValue) -> Self {
        Self::Literal(value)
    }

    /// Creates a 32-bit integer constant.
    #[must_use]
    pub const fn int(value: i32) -> Self {
        Self::Literal(LiteralValue::Int(value))
    }

    /// Creates a string constant.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(LiteralValue::String(value.into()))
    }

    /// Creates a plain function call.
    #[must_use]
    pub fn function(name: impl Into<String>, args: Vec<Self>) -> Self {
        Self::Function(FunctionCall {
            name: name.into(),
            args,
            distinct: false,
            over: None,
        })
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    /// Creates an AND expression.
    #[must_use]
    pub fn and(self, right: Self) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// Creates an equality expression.
    #[must_use]
    pub fn eq(self, right: Self) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    /// Wraps the expression in a logical NOT.
    #[must_use]
    pub fn not(self) -> Self {
        Self::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// Returns the constant value if this is a plain literal.
    #[must_use]
    pub const fn as_literal(&self) -> Option<&LiteralValue> {
        match self {
            Self::Literal(v) => Some(v),
            _ => None,
        }
    }

    /// Rewrites the tree bottom-up: children first, then `f` on the node.
    ///
    /// Subquery plans are rewritten too, so `f` reaches every expression
    /// of the statement.
    #[must_use]
    pub fn transform(self, f: &mut dyn FnMut(Self) -> Self) -> Self {
        let mapped = self.map_children(f);
        f(mapped)
    }

    /// Applies `f` to each direct child, leaving this node in place.
    pub(crate) fn map_children(self, f: &mut dyn FnMut(Self) -> Self) -> Self {
        match self {
            Self::Literal(_)
            | Self::Placeholder { .. }
            | Self::Parameter { .. }
            | Self::Attribute(_)
            | Self::Star(_)
            | Self::CurrentDate
            | Self::CurrentTimestamp => self,
            Self::Unary { op, operand } => Self::Unary {
                op,
                operand: boxed(operand, f),
            },
            Self::Binary { left, op, right } => Self::Binary {
                left: boxed(left, f),
                op,
                right: boxed(right, f),
            },
            Self::IsNull { expr, negated } => Self::IsNull {
                expr: boxed(expr, f),
                negated,
            },
            Self::Between {
                expr,
                low,
                high,
                negated,
            } => Self::Between {
                expr: boxed(expr, f),
                low: boxed(low, f),
                high: boxed(high, f),
                negated,
            },
            Self::InList {
                expr,
                list,
                negated,
            } => Self::InList {
                expr: boxed(expr, f),
                list: all(list, f),
                negated,
            },
            Self::InSubquery {
                expr,
                subquery,
                negated,
            } => Self::InSubquery {
                expr: boxed(expr, f),
                subquery: Box::new(subquery.transform_expressions(f)),
                negated,
            },
            Self::Like {
                expr,
                pattern,
                escape,
            } => Self::Like {
                expr: boxed(expr, f),
                pattern: boxed(pattern, f),
                escape,
            },
            Self::RLike { expr, pattern } => Self::RLike {
                expr: boxed(expr, f),
                pattern: boxed(pattern, f),
            },
            Self::Function(call) => Self::Function(FunctionCall {
                name: call.name,
                args: all(call.args, f),
                distinct: call.distinct,
                over: call.over.map(|w| match w {
                    Window::Spec(spec) => Window::Spec(spec.transform(f)),
                    named @ Window::Named(_) => named,
                }),
            }),
            Self::Case {
                operand,
                branches,
                else_expr,
            } => Self::Case {
                operand: operand.map(|e| boxed(e, f)),
                branches: branches
                    .into_iter()
                    .map(|(w, t)| (w.transform(f), t.transform(f)))
                    .collect(),
                else_expr: else_expr.map(|e| boxed(e, f)),
            },
            Self::Cast { expr, data_type } => Self::Cast {
                expr: boxed(expr, f),
                data_type,
            },
            Self::Exists(plan) => Self::Exists(Box::new(plan.transform_expressions(f))),
            Self::ScalarSubquery(plan) => {
                Self::ScalarSubquery(Box::new(plan.transform_expressions(f)))
            }
            Self::Struct(fields) => Self::Struct(all(fields, f)),
            Self::Field { expr, name } => Self::Field {
                expr: boxed(expr, f),
                name,
            },
            Self::Index { expr, index } => Self::Index {
                expr: boxed(expr, f),
                index: boxed(index, f),
            },
            Self::Alias { expr, name } => Self::Alias {
                expr: boxed(expr, f),
                name,
            },
        }
    }
}

fn boxed(expr: Box<Expr>, f: &mut dyn FnMut(Expr) -> Expr) -> Box<Expr> {
    Box::new((*expr).transform(f))
}

pub(crate) fn all(exprs: Vec<Expr>, f: &mut dyn FnMut(Expr) -> Expr) -> Vec<Expr> {
    exprs.into_iter().map(|e| e.transform(f)).collect()
}

impl SortOrder {
    pub(crate) fn transform(self, f: &mut dyn FnMut(Expr) -> Expr) -> Self {
        Self {
            expr: self.expr.transform(f),
            ..self
        }
    }
}

impl FrameBound {
    fn transform(self, f: &mut dyn FnMut(Expr) -> Expr) -> Self {
        match self {
            Self::Preceding(e) => Self::Preceding(boxed(e, f)),
            Self::Following(e) => Self::Following(boxed(e, f)),
            other => other,
        }
    }
}

impl WindowSpec {
    pub(crate) fn transform(self, f: &mut dyn FnMut(Expr) -> Expr) -> Self {
        Self {
            partition_by: all(self.partition_by, f),
            order_by: self.order_by.into_iter().map(|o| o.transform(f)).collect(),
            frame: self.frame.map(|frame| WindowFrame {
                units: frame.units,
                start: frame.start.transform(f),
                end: frame.end.transform(f),
            }),
        }
    }
}

/// Writes a name part, backquoting it unless it is a plain lower-case word.
pub(crate) fn write_ident(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        f.write_str(name)
    } else {
        write!(f, "`{}`", name.replace('`', "``"))
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_path(f: &mut fmt::Formatter<'_>, parts: &[String]) -> fmt::Result {
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(".")?;
        }
        write_ident(f, part)?;
    }
    Ok(())
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        let nulls = match self.nulls {
            NullOrdering::NullsFirst => "NULLS FIRST",
            NullOrdering::NullsLast => "NULLS LAST",
        };
        write!(f, "{} {dir} {nulls}", self.expr)
    }
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnboundedPreceding => f.write_str("UNBOUNDED PRECEDING"),
            Self::Preceding(e) => write!(f, "{e} PRECEDING"),
            Self::CurrentRow => f.write_str("CURRENT ROW"),
            Self::Following(e) => write!(f, "{e} FOLLOWING"),
            Self::UnboundedFollowing => f.write_str("UNBOUNDED FOLLOWING"),
        }
    }
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if !self.partition_by.is_empty() {
            f.write_str("PARTITION BY ")?;
            write_list(f, &self.partition_by)?;
            sep = " ";
        }
        if !self.order_by.is_empty() {
            write!(f, "{sep}ORDER BY ")?;
            write_list(f, &self.order_by)?;
            sep = " ";
        }
        if let Some(frame) = &self.frame {
            let units = match frame.units {
                FrameUnits::Rows => "ROWS",
                FrameUnits::Range => "RANGE",
            };
            write!(
                f,
                "{sep}{units} BETWEEN {} AND {}",
                frame.start, frame.end
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.args)?;
        f.write_str(")")?;
        match &self.over {
            Some(Window::Named(name)) => write!(f, " OVER {name}"),
            Some(Window::Spec(spec)) => write!(f, " OVER ({spec})"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = |negated: bool| if negated { "NOT " } else { "" };
        match self {
            Self::Literal(value) => write!(f, "{value}"),
            Self::Placeholder { ordinal, data_type } => write!(f, "${ordinal}:{data_type}"),
            Self::Parameter { position } => write!(f, "?{position}"),
            Self::Attribute(parts) => write_path(f, parts),
            Self::Star(None) => f.write_str("*"),
            Self::Star(Some(qualifier)) => {
                write_path(f, qualifier)?;
                f.write_str(".*")
            }
            Self::Unary { op, operand } => write!(f, "({}{operand})", op.as_str()),
            Self::Binary { left, op, right } if op.is_call_like() => {
                write!(f, "{}({left}, {right})", op.as_str())
            }
            Self::Binary { left, op, right } => write!(f, "({left} {} {right})", op.as_str()),
            Self::IsNull { expr, negated } => write!(f, "({expr} IS {}NULL)", not(*negated)),
            Self::Between {
                expr,
                low,
                high,
                negated,
            } => write!(f, "({expr} {}BETWEEN {low} AND {high})", not(*negated)),
            Self::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "({expr} {}IN (", not(*negated))?;
                write_list(f, list)?;
                f.write_str("))")
            }
            Self::InSubquery { expr, negated, .. } => {
                write!(f, "({expr} {}IN (<subquery>))", not(*negated))
            }
            Self::Like {
                expr,
                pattern,
                escape,
            } => {
                write!(f, "({expr} LIKE {pattern}")?;
                if *escape != '\\' {
                    write!(f, " ESCAPE '{escape}'")?;
                }
                f.write_str(")")
            }
            Self::RLike { expr, pattern } => write!(f, "({expr} RLIKE {pattern})"),
            Self::Function(call) => write!(f, "{call}"),
            Self::Case {
                operand,
                branches,
                else_expr,
            } => {
                f.write_str("CASE")?;
                if let Some(op) = operand {
                    write!(f, " {op}")?;
                }
                for (when, then) in branches {
                    write!(f, " WHEN {when} THEN {then}")?;
                }
                if let Some(e) = else_expr {
                    write!(f, " ELSE {e}")?;
                }
                f.write_str(" END")
            }
            Self::Cast { expr, data_type } => write!(f, "CAST({expr} AS {data_type})"),
            Self::Exists(_) => f.write_str("EXISTS (<subquery>)"),
            Self::ScalarSubquery(_) => f.write_str("(<subquery>)"),
            Self::Struct(fields) => {
                f.write_str("struct(")?;
                write_list(f, fields)?;
                f.write_str(")")
            }
            Self::Field { expr, name } => {
                write!(f, "{expr}.")?;
                write_ident(f, name)
            }
            Self::Index { expr, index } => write!(f, "{expr}[{index}]"),
            Self::Alias { expr, name } => {
                write!(f, "{expr} AS ")?;
                write_ident(f, name)
            }
            Self::CurrentDate => f.write_str("CURRENT_DATE"),
            Self::CurrentTimestamp => f.write_str("CURRENT_TIMESTAMP"),
        }
    }
}
