mod common;
use common::*;

use serde_json::json;
use sqlplan_core::ast::{DataType, Expr, LogicalPlan, StructField, TableIdentifier};
use sqlplan_core::{LiteralValue, ParseError, ParserConfig, SqlParser};

fn data_type(sql: &str) -> Result<DataType, ParseError> {
    SqlParser::default().parse_data_type(sql)
}

fn table(sql: &str) -> Result<TableIdentifier, ParseError> {
    SqlParser::default().parse_table_identifier(sql)
}

// ===================================================================
// Data types
// ===================================================================

#[test]
fn primitive_types() {
    assert_eq!(data_type("int").unwrap(), DataType::Integer);
    assert_eq!(data_type("BIGINT").unwrap(), DataType::Long);
    assert_eq!(data_type("Boolean").unwrap(), DataType::Boolean);
    assert_eq!(data_type("string").unwrap(), DataType::String);
    assert_eq!(data_type("timestamp").unwrap(), DataType::Timestamp);
}

#[test]
fn decimal_defaults_and_bounds() {
    assert_eq!(data_type("decimal").unwrap(), DataType::decimal(10, 0));
    assert_eq!(data_type("decimal(5)").unwrap(), DataType::decimal(5, 0));
    assert_eq!(data_type("numeric(38, 38)").unwrap(), DataType::decimal(38, 38));

    let err = data_type("decimal(39, 2)").unwrap_err();
    assert!(err.is_semantic());
    assert!(err.message.contains("maximum is 38"), "{}", err.message);
    assert!(data_type("decimal(5, 6)").unwrap_err().is_semantic());
}

#[test]
fn character_types() {
    assert_eq!(data_type("varchar(10)").unwrap(), DataType::Varchar(10));
    assert_eq!(data_type("char(3)").unwrap(), DataType::Char(3));
    assert_eq!(data_type("varchar").unwrap(), DataType::String);
}

#[test]
fn nested_types_close_with_shift_tokens() {
    assert_eq!(
        data_type("array<array<bigint>>").unwrap(),
        DataType::Array(Box::new(DataType::Array(Box::new(DataType::Long))))
    );
    assert_eq!(
        data_type("map<string, array<int>>").unwrap().to_string(),
        "MAP<STRING,ARRAY<INT>>"
    );
    assert_eq!(
        data_type("struct<a:int, b:array<map<string,int>>>").unwrap(),
        DataType::Struct(vec![
            StructField {
                name: String::from("a"),
                data_type: DataType::Integer,
            },
            StructField {
                name: String::from("b"),
                data_type: DataType::Array(Box::new(DataType::Map(
                    Box::new(DataType::String),
                    Box::new(DataType::Integer),
                ))),
            },
        ])
    );
}

#[test]
fn unknown_type_is_rejected() {
    let err = data_type("widget").unwrap_err();
    assert_eq!(err.message, "DataType widget is not supported");
}

#[test]
fn data_type_must_span_input() {
    let err = data_type("int extra").unwrap_err();
    assert!(err.message.contains("expected end of input"), "{}", err.message);
    assert!(data_type("array<int").is_err());
}

// ===================================================================
// Table identifiers
// ===================================================================

#[test]
fn table_identifiers() {
    assert_eq!(table("t").unwrap(), TableIdentifier::new("t"));
    assert_eq!(table("db.t").unwrap(), TableIdentifier::qualified("db", "t"));
    assert_eq!(table("`my table`").unwrap(), TableIdentifier::new("my table"));
}

#[test]
fn table_identifier_folds_case() {
    assert_eq!(table("DB.Events").unwrap(), TableIdentifier::qualified("db", "events"));

    let mut parser = SqlParser::new(ParserConfig::default().with_case_sensitive(true));
    assert_eq!(
        parser.parse_table_identifier("DB.Events").unwrap(),
        TableIdentifier::qualified("DB", "Events")
    );
}

#[test]
fn table_identifier_rejects_trailing_tokens() {
    let err = table("db.t x").unwrap_err();
    assert!(err.message.contains("expected end of input"), "{}", err.message);
    assert!(table("db.").is_err());
}

// ===================================================================
// Expressions
// ===================================================================

#[test]
fn standalone_expression_keeps_constants() {
    assert_eq!(
        expr("a = 1"),
        Expr::column("a").eq(Expr::Literal(LiteralValue::Int(1)))
    );
}

#[test]
fn standalone_expression_must_span_input() {
    let err = expr_err("a + 1 FROM t");
    assert!(err.message.contains("expected end of input"), "{}", err.message);
}

// ===================================================================
// Configuration
// ===================================================================

#[test]
fn parser_exposes_its_config() {
    let config = ParserConfig::default().with_external_dml_fallback(false);
    let parser = SqlParser::new(config.clone());
    assert_eq!(parser.config(), &config);
}

#[test]
fn config_from_json_drives_parsing() {
    let config = ParserConfig::from_json(r#"{"tokenize_literals": false}"#).unwrap();
    assert!(config.external_dml_fallback);
    let parsed = parse_with(config, "SELECT a FROM t WHERE b = 1");
    assert!(!parsed.cacheable);
    assert!(parsed.parameters.is_empty());
}

#[test]
fn case_sensitive_identifiers() {
    let sql = "SELECT Col FROM Tbl";
    assert_eq!(tree(sql), "Project [col]\n+- Relation tbl\n");

    let parsed = parse_with(
        ParserConfig::default()
            .with_case_sensitive(true)
            .with_tokenize_literals(false),
        sql,
    );
    assert_eq!(
        parsed.plan,
        LogicalPlan::Project {
            exprs: vec![Expr::column("Col")],
            child: Box::new(LogicalPlan::Relation {
                table: TableIdentifier::new("Tbl"),
                alias: None,
            }),
        }
    );
}

// ===================================================================
// Serialization
// ===================================================================

#[test]
fn parsed_statement_serializes_to_json() {
    let parsed = parse("SELECT /*+ joinType(hash) */ a FROM t WHERE b = 5");
    let value = serde_json::to_value(&parsed).unwrap();
    assert_eq!(value["cacheable"], json!(true));
    assert_eq!(value["positional_parameters"], json!(0));
    assert_eq!(value["hints"], json!({ "joinType": "hash" }));
    assert_eq!(
        value["parameters"],
        json!([{ "ordinal": 0, "value": { "Int": 5 } }])
    );
}
