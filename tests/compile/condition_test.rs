//! Tests for filter compilation over physical columns.

#[path = "../common/fixtures.rs"]
mod fixtures;

use chrono::NaiveDate;
use virtcol::compile::{compile_filter, compile_where, CompileContext};
use virtcol::filter::{ComparisonOp, Filter, FilterValue};
use virtcol::sql::{Dialect, Literal};
use virtcol::CompileError;

fn where_sql(dialect: Dialect, source: &str) -> String {
    let schema = fixtures::shop(dialect);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    compile_where(&mut ctx, source)
        .unwrap()
        .to_sql(dialect)
        .unwrap_or_default()
}

#[test]
fn test_dsl_matches_direct_tree() {
    let schema = fixtures::shop(Dialect::Postgres);

    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    let from_dsl = compile_where(&mut ctx, "(Quantity,gt,18)~and((Title,like,John))").unwrap();

    let tree = vec![
        Filter::leaf("Quantity", ComparisonOp::Gt, FilterValue::text("18")),
        Filter::group(vec![Filter::leaf(
            "Title",
            ComparisonOp::Like,
            FilterValue::text("John"),
        )]),
    ];
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    let from_tree = compile_filter(&mut ctx, &tree).unwrap();

    assert_eq!(from_dsl, from_tree);
    assert_eq!(
        from_dsl.to_sql(Dialect::Postgres).unwrap(),
        "\"orders\".\"quantity\" > 18 AND CAST(\"orders\".\"title\" AS TEXT) ILIKE '%John%'"
    );
    assert!(from_dsl.joins.is_empty());
}

#[test]
fn test_json_tree() {
    let tree: Vec<Filter> = serde_json::from_str(
        r#"[
            {"fk_column_id": "o_qty", "comparison_op": "gte", "value": 5},
            {"logical_op": "or", "children": [
                {"fk_column_id": "o_status", "comparison_op": "eq", "value": "open"}
            ]}
        ]"#,
    )
    .unwrap();
    let schema = fixtures::shop(Dialect::Sqlite);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    assert_eq!(
        compile_filter(&mut ctx, &tree).unwrap().to_sql(Dialect::Sqlite).unwrap(),
        "\"orders\".\"quantity\" >= 5 OR \"orders\".\"status\" = 'open'"
    );
}

#[test]
fn test_zero_includes_null() {
    assert_eq!(
        where_sql(Dialect::MsSql, "(Quantity,eq,0)"),
        "([orders].[quantity] = 0 OR [orders].[quantity] IS NULL)"
    );
    assert_eq!(
        where_sql(Dialect::MsSql, "(Quantity,neq,0)"),
        "([orders].[quantity] <> 0 AND [orders].[quantity] IS NOT NULL)"
    );
    assert_eq!(
        where_sql(Dialect::MsSql, "(Quantity,neq,2)"),
        "([orders].[quantity] <> 2 OR [orders].[quantity] IS NULL)"
    );
}

#[test]
fn test_checkbox() {
    assert_eq!(where_sql(Dialect::Postgres, "(Paid,checked)"), "\"orders\".\"paid\" = true");
    assert_eq!(
        where_sql(Dialect::Sqlite, "(Paid,notchecked)"),
        "(\"orders\".\"paid\" = false OR \"orders\".\"paid\" IS NULL)"
    );
    assert_eq!(
        where_sql(Dialect::MySql, "(Paid,eq,true)"),
        "`orders`.`paid` = 1"
    );
}

#[test]
fn test_in_list() {
    assert_eq!(
        where_sql(Dialect::Postgres, "(Status,in,open,closed)"),
        "\"orders\".\"status\" IN ('open', 'closed')"
    );
    assert_eq!(where_sql(Dialect::Postgres, "(Status,in,)"), "");
}

#[test]
fn test_placeholders_follow_dialect() {
    let schema = fixtures::shop(Dialect::Postgres);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    let compiled = compile_where(&mut ctx, "(Title,eq,Bob)~or(Quantity,ge,3)").unwrap();

    let pg = compiled.render(Dialect::Postgres).unwrap();
    assert_eq!(pg.sql, "\"orders\".\"title\" = $1 OR \"orders\".\"quantity\" >= $2");
    assert_eq!(pg.params, vec![Literal::String("Bob".into()), Literal::Int(3)]);

    let mssql = compiled.render(Dialect::MsSql).unwrap();
    assert_eq!(mssql.sql, "[orders].[title] = @p1 OR [orders].[quantity] >= @p2");
}

#[test]
fn test_date_sub_ops_use_context_now() {
    let schema = fixtures::shop(Dialect::Postgres);
    let now = NaiveDate::from_ymd_opt(2024, 3, 10)
        .unwrap()
        .and_hms_opt(9, 30, 0)
        .unwrap();

    let mut ctx = CompileContext::new(&schema, "t_o").unwrap().with_now(now);
    assert_eq!(
        compile_where(&mut ctx, "(Created,eq,daysAgo,3)")
            .unwrap()
            .to_sql(Dialect::Postgres)
            .unwrap(),
        "\"orders\".\"created_at\" = '2024-03-07'"
    );

    let mut ctx = CompileContext::new(&schema, "t_o").unwrap().with_now(now);
    assert_eq!(
        compile_where(&mut ctx, "(Created,isWithin,pastWeek)")
            .unwrap()
            .to_sql(Dialect::Postgres)
            .unwrap(),
        "\"orders\".\"created_at\" BETWEEN '2024-03-03' AND '2024-03-10'"
    );
}

#[test]
fn test_formula_column_filter() {
    assert_eq!(
        where_sql(Dialect::Postgres, "(Total,gt,100)"),
        "\"orders\".\"price\" * \"orders\".\"quantity\" > 100"
    );
}

#[test]
fn test_formula_filter_kind_follows_the_formula() {
    // A text formula compares as text whatever the value looks like.
    assert_eq!(
        where_sql(Dialect::Postgres, "(Label,eq,0)"),
        "CONCAT(\"orders\".\"title\", ' for ', (SELECT \"__nc0\".\"name\" FROM \"customers\" AS \"__nc0\" \
         WHERE \"__nc0\".\"id\" = \"orders\".\"customer_id\")) = '0'"
    );
    assert_eq!(
        where_sql(Dialect::Postgres, "(Total,eq,0)"),
        "(\"orders\".\"price\" * \"orders\".\"quantity\" = 0 \
         OR \"orders\".\"price\" * \"orders\".\"quantity\" IS NULL)"
    );
}

#[test]
fn test_unknown_column() {
    let schema = fixtures::shop(Dialect::Postgres);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    assert_eq!(
        compile_where(&mut ctx, "(Nope,eq,1)"),
        Err(CompileError::ColumnNotFound("Nope".into()))
    );
}

#[test]
fn test_parse_errors_surface() {
    let schema = fixtures::shop(Dialect::Postgres);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    assert!(matches!(
        compile_where(&mut ctx, "(Quantity,gt"),
        Err(CompileError::WhereParse { .. })
    ));
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    assert!(compile_where(&mut ctx, "").unwrap().is_empty());
}
