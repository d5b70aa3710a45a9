//! Logical plan tree produced for each statement.

use core::fmt;

use serde::Serialize;

use super::expression::{all, write_ident};
use super::{Expr, SortOrder};

/// A possibly database-qualified table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TableIdentifier {
    pub database: Option<String>,
    pub table: String,
}

impl TableIdentifier {
    /// Unqualified table.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            database: None,
            table: table.into(),
        }
    }

    /// Database-qualified table.
    #[must_use]
    pub fn qualified(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: Some(database.into()),
            table: table.into(),
        }
    }

    /// Renders every part backquoted, with embedded backquotes doubled.
    #[must_use]
    pub fn quoted(&self) -> String {
        let quote = |s: &str| format!("`{}`", s.replace('`', "``"));
        match &self.database {
            Some(db) => format!("{}.{}", quote(db), quote(&self.table)),
            None => quote(&self.table),
        }
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(db) = &self.database {
            write_ident(f, db)?;
            f.write_str(".")?;
        }
        write_ident(f, &self.table)
    }
}

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JoinType {
    Inner,
    Cross,
    LeftOuter,
    RightOuter,
    FullOuter,
    LeftSemi,
    LeftAnti,
}

impl JoinType {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "Inner",
            Self::Cross => "Cross",
            Self::LeftOuter => "LeftOuter",
            Self::RightOuter => "RightOuter",
            Self::FullOuter => "FullOuter",
            Self::LeftSemi => "LeftSemi",
            Self::LeftAnti => "LeftAnti",
        }
    }
}

/// How the two sides of a join are matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JoinConstraint {
    /// No condition (cross product or comma join).
    None,
    On(Expr),
    Using(Vec<String>),
    Natural,
}

/// Grouping of an aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GroupBy {
    /// Plain GROUP BY list.
    Exprs(Vec<Expr>),
    /// GROUP BY ... WITH CUBE.
    Cube(Vec<Expr>),
    /// GROUP BY ... WITH ROLLUP.
    Rollup(Vec<Expr>),
    /// GROUP BY ... GROUPING SETS (...).
    ///
    /// One mask per set over `exprs`; bit `n - 1 - i` is cleared when
    /// `exprs[i]` participates in the set.
    GroupingSets { exprs: Vec<Expr>, bitmasks: Vec<u64> },
}

impl GroupBy {
    /// The grouping expressions.
    #[must_use]
    pub fn exprs(&self) -> &[Expr] {
        match self {
            Self::Exprs(e) | Self::Cube(e) | Self::Rollup(e) => e,
            Self::GroupingSets { exprs, .. } => exprs,
        }
    }

    fn transform(self, f: &mut dyn FnMut(Expr) -> Expr) -> Self {
        match self {
            Self::Exprs(e) => Self::Exprs(all(e, f)),
            Self::Cube(e) => Self::Cube(all(e, f)),
            Self::Rollup(e) => Self::Rollup(all(e, f)),
            Self::GroupingSets { exprs, bitmasks } => Self::GroupingSets {
                exprs: all(exprs, f),
                bitmasks,
            },
        }
    }
}

/// Set operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SetOpKind {
    Union,
    Intersect,
    Except,
}

/// Statements that are not planned further but forwarded as commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Command {
    /// `SET key = value`; both absent lists all settings.
    Set {
        key: Option<String>,
        value: Option<String>,
    },
    /// `CACHE [LAZY] TABLE t [AS query]`.
    CacheTable {
        table: TableIdentifier,
        lazy: bool,
        query: Option<Box<LogicalPlan>>,
    },
    /// `UNCACHE TABLE [IF EXISTS] t`.
    UncacheTable {
        table: TableIdentifier,
        if_exists: bool,
    },
    /// `DESCRIBE [EXTENDED] t`.
    Describe {
        table: TableIdentifier,
        extended: bool,
    },
    /// `EXPLAIN [EXTENDED] statement`.
    Explain {
        statement: Box<LogicalPlan>,
        extended: bool,
    },
    /// DDL text handed verbatim to the external DDL parser.
    Ddl { sql: String },
}

/// A node of the logical plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LogicalPlan {
    /// Source of a SELECT without FROM.
    OneRow,
    Relation {
        table: TableIdentifier,
        alias: Option<String>,
    },
    /// Windowed stream relation; durations in milliseconds.
    StreamWindow {
        duration_ms: u64,
        slide_ms: Option<u64>,
        child: Box<LogicalPlan>,
    },
    SubqueryAlias {
        alias: String,
        child: Box<LogicalPlan>,
    },
    /// VALUES rows.
    InlineTable {
        columns: Vec<String>,
        rows: Vec<Vec<Expr>>,
    },
    /// Table-valued function call in FROM.
    TableFunction {
        name: String,
        args: Vec<Expr>,
        alias: Option<String>,
    },
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        join_type: JoinType,
        constraint: JoinConstraint,
    },
    /// LATERAL VIEW.
    Generate {
        generator: Expr,
        outer: bool,
        table_alias: String,
        column_aliases: Vec<String>,
        child: Box<LogicalPlan>,
    },
    Filter {
        predicate: Expr,
        child: Box<LogicalPlan>,
    },
    Project {
        exprs: Vec<Expr>,
        child: Box<LogicalPlan>,
    },
    Aggregate {
        group_by: GroupBy,
        exprs: Vec<Expr>,
        child: Box<LogicalPlan>,
    },
    Distinct {
        child: Box<LogicalPlan>,
    },
    /// ORDER BY (global) or SORT BY (per partition).
    Sort {
        order: Vec<SortOrder>,
        global: bool,
        child: Box<LogicalPlan>,
    },
    /// DISTRIBUTE BY, and the distribution half of CLUSTER BY.
    Repartition {
        partition_by: Vec<Expr>,
        child: Box<LogicalPlan>,
    },
    Limit {
        count: Expr,
        child: Box<LogicalPlan>,
    },
    SetOp {
        kind: SetOpKind,
        distinct: bool,
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
    },
    /// Common table expressions bound around a body.
    With {
        ctes: Vec<(String, LogicalPlan)>,
        body: Box<LogicalPlan>,
    },
    Insert {
        table: TableIdentifier,
        columns: Vec<String>,
        overwrite: bool,
        source: Box<LogicalPlan>,
    },
    Put {
        table: TableIdentifier,
        columns: Vec<String>,
        source: Box<LogicalPlan>,
    },
    Update {
        table: TableIdentifier,
        alias: Option<String>,
        assignments: Vec<(Vec<String>, Expr)>,
        from: Option<Box<LogicalPlan>>,
        predicate: Option<Expr>,
    },
    Delete {
        table: TableIdentifier,
        alias: Option<String>,
        predicate: Option<Expr>,
    },
    /// INSERT/PUT against an externally routed table, kept as raw text.
    ExternalDml {
        table: TableIdentifier,
        sql: String,
    },
    Command(Command),
}

impl LogicalPlan {
    /// Direct children in display order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match self {
            Self::OneRow
            | Self::Relation { .. }
            | Self::InlineTable { .. }
            | Self::TableFunction { .. }
            | Self::Delete { .. }
            | Self::ExternalDml { .. } => vec![],
            Self::StreamWindow { child, .. }
            | Self::SubqueryAlias { child, .. }
            | Self::Generate { child, .. }
            | Self::Filter { child, .. }
            | Self::Project { child, .. }
            | Self::Aggregate { child, .. }
            | Self::Distinct { child }
            | Self::Sort { child, .. }
            | Self::Repartition { child, .. }
            | Self::Limit { child, .. } => vec![child.as_ref()],
            Self::Join { left, right, .. } | Self::SetOp { left, right, .. } => {
                vec![left.as_ref(), right.as_ref()]
            }
            Self::With { ctes, body } => {
                let mut out: Vec<&Self> = ctes.iter().map(|(_, plan)| plan).collect();
                out.push(body.as_ref());
                out
            }
            Self::Insert { source, .. } | Self::Put { source, .. } => vec![source.as_ref()],
            Self::Update { from, .. } => from.iter().map(|p| &**p).collect(),
            Self::Command(Command::CacheTable { query, .. }) => {
                query.iter().map(|q| &**q).collect()
            }
            Self::Command(Command::Explain { statement, .. }) => vec![statement.as_ref()],
            Self::Command(_) => vec![],
        }
    }

    /// Rewrites every expression of the tree, including those inside
    /// subqueries, with [`Expr::transform`].
    #[must_use]
    pub fn transform_expressions(self, f: &mut dyn FnMut(Expr) -> Expr) -> Self {
        match self {
            Self::OneRow | Self::Relation { .. } | Self::ExternalDml { .. } => self,
            Self::StreamWindow {
                duration_ms,
                slide_ms,
                child: c,
            } => Self::StreamWindow {
                duration_ms,
                slide_ms,
                child: boxed_plan(c, f),
            },
            Self::SubqueryAlias { alias, child: c } => Self::SubqueryAlias {
                alias,
                child: boxed_plan(c, f),
            },
            Self::InlineTable { columns, rows } => Self::InlineTable {
                columns,
                rows: rows.into_iter().map(|row| all(row, f)).collect(),
            },
            Self::TableFunction { name, args, alias } => Self::TableFunction {
                name,
                args: all(args, f),
                alias,
            },
            Self::Join {
                left,
                right,
                join_type,
                constraint,
            } => Self::Join {
                left: boxed_plan(left, f),
                right: boxed_plan(right, f),
                join_type,
                constraint: match constraint {
                    JoinConstraint::On(e) => JoinConstraint::On(e.transform(f)),
                    other => other,
                },
            },
            Self::Generate {
                generator,
                outer,
                table_alias,
                column_aliases,
                child: c,
            } => Self::Generate {
                generator: generator.transform(f),
                outer,
                table_alias,
                column_aliases,
                child: boxed_plan(c, f),
            },
            Self::Filter { predicate, child: c } => Self::Filter {
                predicate: predicate.transform(f),
                child: boxed_plan(c, f),
            },
            Self::Project { exprs, child: c } => Self::Project {
                exprs: all(exprs, f),
                child: boxed_plan(c, f),
            },
            Self::Aggregate {
                group_by,
                exprs,
                child: c,
            } => Self::Aggregate {
                group_by: group_by.transform(f),
                exprs: all(exprs, f),
                child: boxed_plan(c, f),
            },
            Self::Distinct { child: c } => Self::Distinct { child: boxed_plan(c, f) },
            Self::Sort {
                order,
                global,
                child: c,
            } => Self::Sort {
                order: order.into_iter().map(|o| o.transform(f)).collect(),
                global,
                child: boxed_plan(c, f),
            },
            Self::Repartition {
                partition_by,
                child: c,
            } => Self::Repartition {
                partition_by: all(partition_by, f),
                child: boxed_plan(c, f),
            },
            Self::Limit { count, child: c } => Self::Limit {
                count: count.transform(f),
                child: boxed_plan(c, f),
            },
            Self::SetOp {
                kind,
                distinct,
                left,
                right,
            } => Self::SetOp {
                kind,
                distinct,
                left: boxed_plan(left, f),
                right: boxed_plan(right, f),
            },
            Self::With { ctes, body } => Self::With {
                ctes: ctes
                    .into_iter()
                    .map(|(name, plan)| (name, plan.transform_expressions(f)))
                    .collect(),
                body: boxed_plan(body, f),
            },
            Self::Insert {
                table,
                columns,
                overwrite,
                source,
            } => Self::Insert {
                table,
                columns,
                overwrite,
                source: boxed_plan(source, f),
            },
            Self::Put {
                table,
                columns,
                source,
            } => Self::Put {
                table,
                columns,
                source: boxed_plan(source, f),
            },
            Self::Update {
                table,
                alias,
                assignments,
                from,
                predicate,
            } => Self::Update {
                table,
                alias,
                assignments: assignments
                    .into_iter()
                    .map(|(col, e)| (col, e.transform(f)))
                    .collect(),
                from: from.map(|p| boxed_plan(p, f)),
                predicate: predicate.map(|p| p.transform(f)),
            },
            Self::Delete {
                table,
                alias,
                predicate,
            } => Self::Delete {
                table,
                alias,
                predicate: predicate.map(|p| p.transform(f)),
            },
            Self::Command(Command::CacheTable { table, lazy, query }) => {
                Self::Command(Command::CacheTable {
                    table,
                    lazy,
                    query: query.map(|q| boxed_plan(q, f)),
                })
            }
            Self::Command(Command::Explain {
                statement,
                extended,
            }) => Self::Command(Command::Explain {
                statement: boxed_plan(statement, f),
                extended,
            }),
            Self::Command(_) => self,
        }
    }

    fn write_header(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneRow => f.write_str("OneRowRelation"),
            Self::Relation { table, alias } => {
                write!(f, "Relation {table}")?;
                write_alias(f, alias.as_deref())
            }
            Self::StreamWindow {
                duration_ms,
                slide_ms,
                ..
            } => {
                write!(f, "StreamWindow duration={duration_ms}ms")?;
                if let Some(slide) = slide_ms {
                    write!(f, " slide={slide}ms")?;
                }
                Ok(())
            }
            Self::SubqueryAlias { alias, .. } => write!(f, "SubqueryAlias {alias}"),
            Self::InlineTable { columns, rows } => {
                write!(f, "InlineTable [{}]", columns.join(", "))?;
                for row in rows {
                    f.write_str(" (")?;
                    write_exprs(f, row)?;
                    f.write_str(")")?;
                }
                Ok(())
            }
            Self::TableFunction { name, args, alias } => {
                write!(f, "TableFunction {name}(")?;
                write_exprs(f, args)?;
                f.write_str(")")?;
                write_alias(f, alias.as_deref())
            }
            Self::Join {
                join_type,
                constraint,
                ..
            } => {
                write!(f, "Join {}", join_type.as_str())?;
                match constraint {
                    JoinConstraint::None => Ok(()),
                    JoinConstraint::On(e) => write!(f, ", {e}"),
                    JoinConstraint::Using(cols) => write!(f, ", USING ({})", cols.join(", ")),
                    JoinConstraint::Natural => f.write_str(", NATURAL"),
                }
            }
            Self::Generate {
                generator,
                outer,
                table_alias,
                column_aliases,
                ..
            } => {
                write!(f, "Generate {generator}")?;
                if *outer {
                    f.write_str(" OUTER")?;
                }
                write!(f, " AS {table_alias}")?;
                if !column_aliases.is_empty() {
                    write!(f, " [{}]", column_aliases.join(", "))?;
                }
                Ok(())
            }
            Self::Filter { predicate, .. } => write!(f, "Filter {predicate}"),
            Self::Project { exprs, .. } => {
                f.write_str("Project [")?;
                write_exprs(f, exprs)?;
                f.write_str("]")
            }
            Self::Aggregate {
                group_by, exprs, ..
            } => {
                let label = match group_by {
                    GroupBy::Exprs(_) => "",
                    GroupBy::Cube(_) => "CUBE ",
                    GroupBy::Rollup(_) => "ROLLUP ",
                    GroupBy::GroupingSets { .. } => "GROUPING SETS ",
                };
                write!(f, "Aggregate {label}[")?;
                write_exprs(f, group_by.exprs())?;
                f.write_str("]")?;
                if let GroupBy::GroupingSets { bitmasks, .. } = group_by {
                    let masks: Vec<String> = bitmasks.iter().map(|m| format!("{m:#b}")).collect();
                    write!(f, " masks=[{}]", masks.join(", "))?;
                }
                f.write_str(", [")?;
                write_exprs(f, exprs)?;
                f.write_str("]")
            }
            Self::Distinct { .. } => f.write_str("Distinct"),
            Self::Sort { order, global, .. } => {
                f.write_str("Sort [")?;
                for (i, o) in order.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{o}")?;
                }
                write!(f, "], {}", if *global { "global" } else { "local" })
            }
            Self::Repartition { partition_by, .. } => {
                f.write_str("Repartition [")?;
                write_exprs(f, partition_by)?;
                f.write_str("]")
            }
            Self::Limit { count, .. } => write!(f, "Limit {count}"),
            Self::SetOp { kind, distinct, .. } => {
                let name = match kind {
                    SetOpKind::Union => "Union",
                    SetOpKind::Intersect => "Intersect",
                    SetOpKind::Except => "Except",
                };
                write!(f, "{name}{}", if *distinct { " Distinct" } else { " All" })
            }
            Self::With { ctes, .. } => {
                let names: Vec<&str> = ctes.iter().map(|(name, _)| name.as_str()).collect();
                write!(f, "With [{}]", names.join(", "))
            }
            Self::Insert {
                table,
                columns,
                overwrite,
                ..
            } => {
                let verb = if *overwrite { "InsertOverwrite" } else { "Insert" };
                write!(f, "{verb} {table}")?;
                write_columns(f, columns)
            }
            Self::Put { table, columns, .. } => {
                write!(f, "Put {table}")?;
                write_columns(f, columns)
            }
            Self::Update {
                table,
                alias,
                assignments,
                predicate,
                ..
            } => {
                write!(f, "Update {table}")?;
                write_alias(f, alias.as_deref())?;
                f.write_str(" SET ")?;
                for (i, (col, value)) in assignments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {value}", col.join("."))?;
                }
                if let Some(p) = predicate {
                    write!(f, " WHERE {p}")?;
                }
                Ok(())
            }
            Self::Delete {
                table,
                alias,
                predicate,
            } => {
                write!(f, "Delete {table}")?;
                write_alias(f, alias.as_deref())?;
                if let Some(p) = predicate {
                    write!(f, " WHERE {p}")?;
                }
                Ok(())
            }
            Self::ExternalDml { table, sql } => write!(f, "ExternalDml {table}: {sql}"),
            Self::Command(cmd) => match cmd {
                Command::Set { key, value } => write!(
                    f,
                    "SetCommand {} = {}",
                    key.as_deref().unwrap_or("*"),
                    value.as_deref().unwrap_or("<none>")
                ),
                Command::CacheTable { table, lazy, .. } => {
                    write!(f, "CacheTable {table}{}", if *lazy { " LAZY" } else { "" })
                }
                Command::UncacheTable { table, if_exists } => write!(
                    f,
                    "UncacheTable {table}{}",
                    if *if_exists { " IF EXISTS" } else { "" }
                ),
                Command::Describe { table, extended } => write!(
                    f,
                    "Describe {table}{}",
                    if *extended { " EXTENDED" } else { "" }
                ),
                Command::Explain { extended, .. } => {
                    write!(f, "Explain{}", if *extended { " EXTENDED" } else { "" })
                }
                Command::Ddl { sql } => write!(f, "Ddl {sql}"),
            },
        }
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if depth > 0 {
            write!(f, "{}+- ", "   ".repeat(depth - 1))?;
        }
        self.write_header(f)?;
        f.write_str("\n")?;
        for child in self.children() {
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

fn boxed_plan(plan: Box<LogicalPlan>, f: &mut dyn FnMut(Expr) -> Expr) -> Box<LogicalPlan> {
    Box::new((*plan).transform_expressions(f))
}

fn write_exprs(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (i, e) in exprs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{e}")?;
    }
    Ok(())
}

fn write_alias(f: &mut fmt::Formatter<'_>, alias: Option<&str>) -> fmt::Result {
    match alias {
        Some(a) => write!(f, " AS {a}"),
        None => Ok(()),
    }
}

fn write_columns(f: &mut fmt::Formatter<'_>, columns: &[String]) -> fmt::Result {
    if columns.is_empty() {
        Ok(())
    } else {
        write!(f, " ({})", columns.join(", "))
    }
}

/// Renders the plan as an indented tree, one node per line.
impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0)
    }
}
