mod common;
use common::*;

use sqlplan_core::ast::{Expr, LogicalPlan, SetOpKind, TableIdentifier, Window};

// ===================================================================
// Projection and source
// ===================================================================

#[test]
fn select_without_from() {
    assert_eq!(tree("SELECT 1"), "Project [1]\n+- OneRowRelation\n");
}

#[test]
fn select_with_filter() {
    assert_eq!(
        tree("SELECT a, b AS c FROM t WHERE a > 1"),
        "Project [a, b AS c]\n+- Filter (a > 1)\n   +- Relation t\n"
    );
}

#[test]
fn alias_without_as() {
    assert_eq!(
        tree("SELECT a total FROM t"),
        "Project [a AS total]\n+- Relation t\n"
    );
}

#[test]
fn quoted_alias_is_folded() {
    let e = select_expr("SELECT a AS `Total` FROM t");
    assert_eq!(
        e,
        Expr::Alias {
            expr: Box::new(Expr::column("a")),
            name: String::from("total"),
        }
    );
}

#[test]
fn reserved_word_alias_is_rejected() {
    let err = parse_err("SELECT a AS from FROM t");
    assert!(err.message.contains("reserved keyword FROM"), "{}", err.message);
}

#[test]
fn qualified_table() {
    let plan = constant_plan("SELECT a FROM db.t AS x");
    let LogicalPlan::Project { child, .. } = plan else {
        panic!("Expected Project");
    };
    assert_eq!(
        *child,
        LogicalPlan::Relation {
            table: TableIdentifier::qualified("db", "t"),
            alias: Some(String::from("x")),
        }
    );
}

#[test]
fn select_distinct() {
    assert_eq!(
        tree("SELECT DISTINCT a FROM t"),
        "Distinct\n+- Project [a]\n   +- Relation t\n"
    );
}

#[test]
fn select_all_is_plain_select() {
    assert_eq!(tree("SELECT ALL a FROM t"), tree("SELECT a FROM t"));
}

#[test]
fn trailing_semicolon() {
    assert_eq!(tree("SELECT a FROM t;"), "Project [a]\n+- Relation t\n");
}

// ===================================================================
// Query modifiers
// ===================================================================

#[test]
fn order_by() {
    assert_eq!(
        tree("SELECT a FROM t ORDER BY a DESC, b"),
        "Sort [a DESC NULLS LAST, b ASC NULLS FIRST], global\n+- Project [a]\n   +- Relation t\n"
    );
}

#[test]
fn order_by_explicit_nulls() {
    assert_eq!(
        tree("SELECT a FROM t ORDER BY a ASC NULLS LAST"),
        "Sort [a ASC NULLS LAST], global\n+- Project [a]\n   +- Relation t\n"
    );
}

#[test]
fn limit() {
    assert_eq!(
        tree("SELECT a FROM t LIMIT 10"),
        "Limit 10\n+- Project [a]\n   +- Relation t\n"
    );
}

#[test]
fn fetch_first_rows_only() {
    assert_eq!(
        tree("SELECT a FROM t FETCH FIRST 5 ROWS ONLY"),
        "Limit 5\n+- Project [a]\n   +- Relation t\n"
    );
    assert_eq!(
        tree("SELECT a FROM t FETCH FIRST 1 ROW ONLY"),
        "Limit 1\n+- Project [a]\n   +- Relation t\n"
    );
}

#[test]
fn cluster_by() {
    assert_eq!(
        tree("SELECT a FROM t CLUSTER BY a"),
        "Sort [a ASC NULLS FIRST], local\n+- Repartition [a]\n   +- Project [a]\n      +- Relation t\n"
    );
}

#[test]
fn distribute_and_sort_by() {
    assert_eq!(
        tree("SELECT a FROM t DISTRIBUTE BY a SORT BY b DESC"),
        "Sort [b DESC NULLS LAST], local\n+- Repartition [a]\n   +- Project [a]\n      +- Relation t\n"
    );
}

#[test]
fn order_and_limit_together() {
    assert_eq!(
        tree("SELECT a FROM t ORDER BY a LIMIT 3"),
        "Limit 3\n+- Sort [a ASC NULLS FIRST], global\n   +- Project [a]\n      +- Relation t\n"
    );
}

// ===================================================================
// Set operations
// ===================================================================

#[test]
fn union_all() {
    assert_eq!(
        tree("SELECT a FROM t UNION ALL SELECT a FROM u"),
        "Union All\n+- Project [a]\n   +- Relation t\n+- Project [a]\n   +- Relation u\n"
    );
}

#[test]
fn union_defaults_to_distinct() {
    let plan = constant_plan("SELECT a FROM t UNION SELECT a FROM u");
    assert!(matches!(
        plan,
        LogicalPlan::SetOp {
            kind: SetOpKind::Union,
            distinct: true,
            ..
        }
    ));
}

#[test]
fn set_operations_fold_left() {
    let plan = constant_plan("SELECT a FROM t EXCEPT SELECT a FROM u INTERSECT SELECT a FROM v");
    let LogicalPlan::SetOp { kind, left, .. } = plan else {
        panic!("Expected set operation");
    };
    assert_eq!(kind, SetOpKind::Intersect);
    assert!(matches!(
        *left,
        LogicalPlan::SetOp {
            kind: SetOpKind::Except,
            ..
        }
    ));
}

#[test]
fn order_by_applies_to_whole_set_operation() {
    let plan = constant_plan("SELECT a FROM t UNION ALL SELECT a FROM u ORDER BY a");
    let LogicalPlan::Sort { child, global, .. } = plan else {
        panic!("Expected Sort");
    };
    assert!(global);
    assert!(matches!(*child, LogicalPlan::SetOp { .. }));
}

#[test]
fn parenthesized_query() {
    assert_eq!(tree("(SELECT a FROM t)"), tree("SELECT a FROM t"));
}

// ===================================================================
// Common table expressions and derived tables
// ===================================================================

#[test]
fn with_clause() {
    assert_eq!(
        tree("WITH x AS (SELECT a FROM t) SELECT a FROM x"),
        "With [x]\n+- SubqueryAlias x\n   +- Project [a]\n      +- Relation t\n+- Project [a]\n   +- Relation x\n"
    );
}

#[test]
fn multiple_ctes() {
    let plan = constant_plan("WITH x AS (SELECT 1), y AS (SELECT 2) SELECT * FROM x, y");
    let LogicalPlan::With { ctes, .. } = plan else {
        panic!("Expected With");
    };
    let names: Vec<&str> = ctes.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn derived_table() {
    assert_eq!(
        tree("SELECT s.a FROM (SELECT a FROM t) AS s"),
        "Project [s.a]\n+- SubqueryAlias s\n   +- Project [a]\n      +- Relation t\n"
    );
}

#[test]
fn derived_table_without_alias() {
    assert_eq!(
        tree("SELECT a FROM (SELECT a FROM t)"),
        "Project [a]\n+- Project [a]\n   +- Relation t\n"
    );
}

// ===================================================================
// VALUES
// ===================================================================

#[test]
fn values_statement() {
    assert_eq!(
        tree("VALUES (1, 2), (3, 4)"),
        "InlineTable [col1, col2] (1, 2) (3, 4)\n"
    );
}

#[test]
fn values_single_column_rows() {
    assert_eq!(tree("VALUES 1, 2"), "InlineTable [col1] (1) (2)\n");
}

#[test]
fn values_in_from_with_column_aliases() {
    assert_eq!(
        tree("SELECT x FROM VALUES (1, 'a'), (2, 'b') AS v(x, y)"),
        "Project [x]\n+- SubqueryAlias v\n   +- InlineTable [x, y] (1, 'a') (2, 'b')\n"
    );
}

#[test]
fn values_rows_must_have_equal_width() {
    let err = parse_err("VALUES (1, 2), (3)");
    assert!(err.is_semantic());
    assert!(err.message.contains("same number of columns"));
}

#[test]
fn values_alias_count_must_match() {
    let err = parse_err("SELECT * FROM VALUES (1, 2) AS v(x)");
    assert!(err.is_semantic());
    assert!(err.message.contains("column aliases"), "{}", err.message);
}

// ===================================================================
// Table functions, lateral views and stream windows
// ===================================================================

#[test]
fn table_function() {
    assert_eq!(
        tree("SELECT * FROM range(10) r"),
        "Project [*]\n+- TableFunction range(10) AS r\n"
    );
}

#[test]
fn qualified_table_function() {
    let plan = constant_plan("SELECT * FROM sys.gen(1, 2)");
    let LogicalPlan::Project { child, .. } = plan else {
        panic!("Expected Project");
    };
    let LogicalPlan::TableFunction { name, args, alias } = *child else {
        panic!("Expected TableFunction");
    };
    assert_eq!(name, "sys.gen");
    assert_eq!(args.len(), 2);
    assert_eq!(alias, None);
}

#[test]
fn lateral_view() {
    assert_eq!(
        tree("SELECT c FROM t LATERAL VIEW OUTER explode(arr) e AS c"),
        "Project [c]\n+- Generate explode(arr) OUTER AS e [c]\n   +- Relation t\n"
    );
}

#[test]
fn stacked_lateral_views() {
    assert_eq!(
        tree("SELECT * FROM t LATERAL VIEW explode(a) x LATERAL VIEW explode(b) y AS k, v"),
        "Project [*]\n+- Generate explode(b) AS y [k, v]\n   +- Generate explode(a) AS x\n      +- Relation t\n"
    );
}

#[test]
fn stream_window() {
    assert_eq!(
        tree("SELECT * FROM s WINDOW (DURATION 10 SECONDS) w"),
        "Project [*]\n+- StreamWindow duration=10000ms\n   +- Relation s AS w\n"
    );
}

#[test]
fn stream_window_with_slide() {
    assert_eq!(
        tree("SELECT * FROM s WINDOW (DURATION 2 MINUTES, SLIDE 500 MILLISECONDS)"),
        "Project [*]\n+- StreamWindow duration=120000ms slide=500ms\n   +- Relation s\n"
    );
}

#[test]
fn stream_window_unknown_unit() {
    let err = parse_err("SELECT * FROM s WINDOW (DURATION 2 DAYS)");
    assert!(err.message.contains("MILLISECONDS, SECONDS or MINUTES"), "{}", err.message);
}

// ===================================================================
// WINDOW clause
// ===================================================================

#[test]
fn named_window_is_inlined() {
    let e = select_expr("SELECT sum(x) OVER w FROM t WINDOW w AS (PARTITION BY a)");
    assert_eq!(e.to_string(), "sum(x) OVER (PARTITION BY a)");
}

#[test]
fn named_window_in_having_is_inlined() {
    let plan = constant_plan(
        "SELECT a FROM t GROUP BY a HAVING max(b) OVER w > 1 WINDOW w AS (ORDER BY a)",
    );
    let LogicalPlan::Filter { predicate, .. } = plan else {
        panic!("Expected Filter");
    };
    let Expr::Binary { left, .. } = predicate else {
        panic!("Expected comparison");
    };
    let Expr::Function(call) = *left else {
        panic!("Expected call");
    };
    assert!(matches!(call.over, Some(Window::Spec(_))));
}

#[test]
fn window_reference_chain_is_limited_to_one_level() {
    let err = parse_err(
        "SELECT rank() OVER w3 FROM t WINDOW w1 AS (ORDER BY a), w2 AS w1, w3 AS w2",
    );
    assert!(err.is_semantic());
}

#[test]
fn undefined_window_is_error() {
    let err = parse_err("SELECT rank() OVER nope FROM t");
    assert!(err.is_semantic());
    assert!(err.message.contains("nope"));
}

#[test]
fn named_window_in_order_by_is_inlined() {
    let plan = constant_plan(
        "SELECT a FROM t WINDOW w AS (PARTITION BY a) ORDER BY rank() OVER w",
    );
    let LogicalPlan::Sort { order, .. } = plan else {
        panic!("Expected Sort");
    };
    let Expr::Function(call) = &order[0].expr else {
        panic!("Expected call");
    };
    assert!(matches!(call.over, Some(Window::Spec(_))));
    assert_eq!(order[0].expr.to_string(), "rank() OVER (PARTITION BY a)");
}

#[test]
fn named_window_in_sort_by_is_inlined() {
    let plan = constant_plan("SELECT a FROM t WINDOW w AS (ORDER BY a) SORT BY rank() OVER w");
    let LogicalPlan::Sort { order, global, .. } = plan else {
        panic!("Expected Sort");
    };
    assert!(!global);
    assert_eq!(
        order[0].expr.to_string(),
        "rank() OVER (ORDER BY a ASC NULLS FIRST)"
    );
}

#[test]
fn undefined_window_in_order_by_is_error() {
    let err = parse_err("SELECT a FROM t WINDOW w AS (PARTITION BY a) ORDER BY rank() OVER nosuch");
    assert!(err.is_semantic());
    assert!(err.message.contains("nosuch"));
}

// ===================================================================
// Subqueries
// ===================================================================

#[test]
fn in_subquery_in_where() {
    let plan = constant_plan("SELECT a FROM t WHERE b IN (SELECT b FROM u)");
    assert!(matches!(where_predicate(&plan), Expr::InSubquery { .. }));
}

#[test]
fn exists_in_where() {
    let plan = constant_plan("SELECT a FROM t WHERE NOT EXISTS (SELECT 1 FROM u)");
    assert_eq!(where_predicate(&plan).to_string(), "(NOT EXISTS (<subquery>))");
}
