mod common;
use common::*;

fn hint(sql: &str, key: &str) -> Option<String> {
    parse(sql).hints.get(key).cloned()
}

// ===================================================================
// Statement hints
// ===================================================================

#[test]
fn no_hints_by_default() {
    assert!(parse("SELECT a FROM t /* index(i) */").hints.is_empty());
}

#[test]
fn block_hint_is_keyed_by_name() {
    assert_eq!(
        hint("SELECT /*+ joinType(hash) */ a FROM t", "joinType").as_deref(),
        Some("hash")
    );
}

#[test]
fn line_hint() {
    assert_eq!(
        hint("SELECT a --+ columnStore(true)\nFROM t", "columnStore").as_deref(),
        Some("true")
    );
}

#[test]
fn several_hints_in_one_comment() {
    let parsed = parse("SELECT /*+ joinType(hash), joinOrder(fixed) */ a FROM t");
    assert_eq!(parsed.hints.len(), 2);
    assert_eq!(parsed.hints["joinType"], "hash");
    assert_eq!(parsed.hints["joinOrder"], "fixed");
}

#[test]
fn hint_value_keeps_nested_parentheses() {
    assert_eq!(
        hint("SELECT /*+ index( f(a, b) ) */ a FROM t", "index").as_deref(),
        Some("f(a, b)")
    );
}

#[test]
fn later_hint_overwrites_earlier() {
    assert_eq!(
        hint(
            "SELECT /*+ joinType(hash) */ a /*+ joinType(merge) */ FROM t",
            "joinType"
        )
        .as_deref(),
        Some("merge")
    );
}

#[test]
fn hints_do_not_affect_caching() {
    let parsed = parse("SELECT /*+ joinType(hash) */ a FROM t WHERE b = 1");
    assert!(parsed.cacheable);
    assert_eq!(parsed.parameters.len(), 1);
    assert_eq!(
        parsed.plan,
        parse("SELECT a FROM t WHERE b = 2").plan
    );
}

// ===================================================================
// Relation hints
// ===================================================================

#[test]
fn relation_hint_is_keyed_by_alias() {
    let parsed = parse("SELECT * FROM t /*+ index(idx1) */ x WHERE x.a = 1");
    assert_eq!(parsed.hints.len(), 1);
    assert_eq!(parsed.hints["indexx"], "idx1");
}

#[test]
fn relation_hint_without_alias_uses_table_name() {
    assert_eq!(
        hint("SELECT * FROM t /*+ index(idx1) */ WHERE a = 1", "indext").as_deref(),
        Some("idx1")
    );
    assert_eq!(
        hint("SELECT * FROM db.t /*+ index(idx1) */", "indext").as_deref(),
        Some("idx1")
    );
}

#[test]
fn hint_after_alias_binds_to_relation() {
    assert_eq!(
        hint(
            "SELECT * FROM t x /*+ index(ix) */ JOIN u ON x.a = u.a",
            "indexx"
        )
        .as_deref(),
        Some("ix")
    );
}

#[test]
fn hints_on_each_side_of_a_join() {
    let parsed = parse(
        "SELECT /*+ joinType(hash) */ * FROM a /*+ index(ia) */ JOIN b /*+ index(ib) */ ON a.x = b.x",
    );
    assert_eq!(parsed.hints.len(), 3);
    assert_eq!(parsed.hints["joinType"], "hash");
    assert_eq!(parsed.hints["indexa"], "ia");
    assert_eq!(parsed.hints["indexb"], "ib");
}

#[test]
fn relation_hint_survives_backtracking() {
    assert_eq!(
        hint(
            "SELECT * FROM (t /*+ index(i) */ JOIN u ON t.a = u.a)",
            "indext"
        )
        .as_deref(),
        Some("i")
    );
}

#[test]
fn derived_table_hint_is_rejected() {
    let err = parse_err("SELECT * FROM (SELECT 1) /*+ index(i) */ s");
    assert!(err.is_semantic());
    assert!(err.message.contains("derived table"), "{}", err.message);
}

// ===================================================================
// Malformed hints
// ===================================================================

#[test]
fn hint_without_value_is_error() {
    let err = parse_err("SELECT a FROM t /*+ index */");
    assert!(
        err.message.contains("Expected '(' after query hint index"),
        "{}",
        err.message
    );
}

#[test]
fn unclosed_hint_value_is_error() {
    let err = parse_err("SELECT a FROM t --+ index(i");
    assert!(err.message.contains("Unclosed value"), "{}", err.message);
}
