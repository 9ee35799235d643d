//! Tests for formula compilation against the shop schema.

#[path = "../common/fixtures.rs"]
mod fixtures;

use virtcol::compile::{compile_formula, compile_formula_column, validate_formula_column, CompileContext};
use virtcol::formula::{parse_formula, FormulaNode};
use virtcol::sql::{Dialect, Literal};
use virtcol::CompileError;

fn formula_sql(dialect: Dialect, source: &str) -> String {
    let schema = fixtures::shop(dialect);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    let node = parse_formula(source).unwrap();
    compile_formula(&mut ctx, &node).unwrap().to_sql(dialect)
}

#[test]
fn test_empty_string_comparison_in_every_dialect() {
    assert_eq!(
        formula_sql(Dialect::Postgres, "{Title} = ''"),
        "CASE WHEN (\"orders\".\"title\" IS NULL OR CAST(\"orders\".\"title\" AS TEXT) = '') \
         THEN true ELSE false END"
    );
    assert_eq!(
        formula_sql(Dialect::Sqlite, "{Title} = ''"),
        "CASE WHEN (\"orders\".\"title\" IS NULL OR CAST(\"orders\".\"title\" AS TEXT) = '') \
         THEN true ELSE false END"
    );
    assert_eq!(
        formula_sql(Dialect::MsSql, "{Title} = ''"),
        "CASE WHEN ([orders].[title] IS NULL OR CAST([orders].[title] AS NVARCHAR(MAX)) = '') \
         THEN 1 ELSE 0 END"
    );
    assert_eq!(
        formula_sql(Dialect::MySql, "{Title} = ''"),
        "IFNULL((`orders`.`title` IS NULL OR CAST(`orders`.`title` AS CHAR) = ''), 1)"
    );
}

#[test]
fn test_division_is_floating_point() {
    assert_eq!(
        formula_sql(Dialect::Sqlite, "{Price} / {Quantity}"),
        "CAST(\"orders\".\"price\" AS REAL) / CAST(\"orders\".\"quantity\" AS REAL)"
    );
    assert_eq!(
        formula_sql(Dialect::MySql, "{Price} / {Quantity}"),
        "CAST(`orders`.`price` AS DOUBLE) / CAST(`orders`.`quantity` AS DOUBLE)"
    );
}

#[test]
fn test_stored_formula_column() {
    let schema = fixtures::shop(Dialect::Postgres);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    assert_eq!(
        compile_formula_column(&mut ctx, "Total").unwrap().to_sql(Dialect::Postgres),
        "\"orders\".\"price\" * \"orders\".\"quantity\""
    );
}

#[test]
fn test_formula_referencing_formula_twice() {
    assert_eq!(
        formula_sql(Dialect::Postgres, "{Total} + {Total}"),
        "(\"orders\".\"price\" * \"orders\".\"quantity\") + (\"orders\".\"price\" * \"orders\".\"quantity\")"
    );
}

#[test]
fn test_lookup_in_formula_is_scalar_subquery() {
    assert_eq!(
        formula_sql(Dialect::Postgres, "{CustomerName}"),
        "(SELECT \"__nc0\".\"name\" FROM \"customers\" AS \"__nc0\" \
         WHERE \"__nc0\".\"id\" = \"orders\".\"customer_id\")"
    );
    assert_eq!(
        formula_sql(Dialect::Postgres, "{CustomerRegionSales} * 2"),
        "(SELECT (SELECT (SELECT SUM(\"__nc2\".\"amount\") FROM \"sales\" AS \"__nc2\" \
         WHERE \"__nc2\".\"region_id\" = \"__nc1\".\"id\") \
         FROM \"regions\" AS \"__nc1\" WHERE \"__nc1\".\"id\" = \"__nc0\".\"region_id\") \
         FROM \"customers\" AS \"__nc0\" WHERE \"__nc0\".\"id\" = \"orders\".\"customer_id\") * 2"
    );
}

#[test]
fn test_concat_with_lookup() {
    let schema = fixtures::shop(Dialect::Postgres);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    assert_eq!(
        compile_formula_column(&mut ctx, "Label").unwrap().to_sql(Dialect::Postgres),
        "CONCAT(\"orders\".\"title\", ' for ', (SELECT \"__nc0\".\"name\" FROM \"customers\" AS \"__nc0\" \
         WHERE \"__nc0\".\"id\" = \"orders\".\"customer_id\"))"
    );
}

#[test]
fn test_literals_are_bound() {
    let schema = fixtures::shop(Dialect::Postgres);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    let node = parse_formula("{Title} & '!'").unwrap();
    let rendered = compile_formula(&mut ctx, &node).unwrap().render(Dialect::Postgres);
    assert_eq!(rendered.sql, "CONCAT(\"orders\".\"title\", $1)");
    assert_eq!(rendered.params, vec![Literal::String("!".into())]);
}

#[test]
fn test_json_tree() {
    let node = FormulaNode::from_json(
        r#"{
            "type": "BinaryExpression",
            "operator": "+",
            "left": {"type": "Identifier", "name": "Quantity"},
            "right": {"type": "Literal", "value": 1}
        }"#,
    )
    .unwrap();
    let schema = fixtures::shop(Dialect::MsSql);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    assert_eq!(
        compile_formula(&mut ctx, &node).unwrap().to_sql(Dialect::MsSql),
        "[orders].[quantity] + 1"
    );
}

#[test]
fn test_stored_formulas_dry_run_in_every_dialect() {
    for dialect in Dialect::ALL {
        let schema = fixtures::shop(dialect);
        for column in ["Total", "Label"] {
            let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
            assert!(
                validate_formula_column(&mut ctx, column).is_ok(),
                "{} failed on {}",
                column,
                dialect
            );
        }
    }
}

#[test]
fn test_unknown_identifier() {
    let schema = fixtures::shop(Dialect::Postgres);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    let node = parse_formula("{Discount} * 2").unwrap();
    assert_eq!(
        compile_formula(&mut ctx, &node),
        Err(CompileError::ColumnNotFound("Discount".into()))
    );
}

#[test]
fn test_nested_multi_valued_lookup_aggregates_once() {
    let schema = fixtures::geo(Dialect::MsSql);
    let mut ctx = CompileContext::new(&schema, "t_gc").unwrap();
    let node = parse_formula("SUM({RegionTotals})").unwrap();
    assert_eq!(
        compile_formula(&mut ctx, &node).unwrap().to_sql(Dialect::MsSql),
        "(SELECT SUM([__nc1].[amount]) FROM [regions] AS [__nc0] \
         INNER JOIN [sales] AS [__nc1] ON [__nc1].[region_id] = [__nc0].[id] \
         WHERE [__nc0].[country_id] = [countries].[id])"
    );

    let schema = fixtures::geo(Dialect::Postgres);
    let mut ctx = CompileContext::new(&schema, "t_gc").unwrap();
    let node = parse_formula("{Amounts}").unwrap();
    assert_eq!(
        compile_formula(&mut ctx, &node).unwrap().to_sql(Dialect::Postgres),
        "(SELECT STRING_AGG(CAST(\"__nc1\".\"amount\" AS TEXT), ',') FROM \"regions\" AS \"__nc0\" \
         INNER JOIN \"sales\" AS \"__nc1\" ON \"__nc1\".\"region_id\" = \"__nc0\".\"id\" \
         WHERE \"__nc0\".\"country_id\" = \"countries\".\"id\")"
    );
}
