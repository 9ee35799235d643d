//! Tests for dialect rendering of the SQL builder.

use virtcol::sql::{
    func, lit_bool, lit_str, param, table_col, Dialect, ExprExt, Literal, Query, TableRef,
};

fn order_query() -> Query {
    Query::new()
        .select(vec![table_col("o", "id")])
        .from(TableRef::new("orders").with_alias("o"))
        .inner_join(
            TableRef::new("customers").with_alias("c"),
            table_col("c", "id").eq(table_col("o", "customer_id")),
        )
        .filter(table_col("c", "name").eq(param("Ann")))
        .filter(
            table_col("o", "qty")
                .gt(param(3i64))
                .or(table_col("o", "qty").is_null()),
        )
}

#[test]
fn test_query_inlines_literals() {
    assert_eq!(
        order_query().to_sql(Dialect::Postgres),
        "SELECT \"o\".\"id\" FROM \"orders\" AS \"o\" \
         INNER JOIN \"customers\" AS \"c\" ON \"c\".\"id\" = \"o\".\"customer_id\" \
         WHERE \"c\".\"name\" = 'Ann' AND (\"o\".\"qty\" > 3 OR \"o\".\"qty\" IS NULL)"
    );
}

#[test]
fn test_query_placeholders_per_dialect() {
    let mssql = order_query().render(Dialect::MsSql);
    assert_eq!(
        mssql.sql,
        "SELECT [o].[id] FROM [orders] AS [o] \
         INNER JOIN [customers] AS [c] ON [c].[id] = [o].[customer_id] \
         WHERE [c].[name] = @p1 AND ([o].[qty] > @p2 OR [o].[qty] IS NULL)"
    );
    assert_eq!(mssql.params, vec![Literal::String("Ann".into()), Literal::Int(3)]);

    let mysql = order_query().render(Dialect::MySql);
    assert!(mysql.sql.contains("`c`.`name` = ? AND (`o`.`qty` > ? OR"));
    assert_eq!(mysql.params.len(), 2);

    let pg = order_query().render(Dialect::Postgres);
    assert!(pg.sql.contains("= $1 AND (\"o\".\"qty\" > $2"));
}

#[test]
fn test_params_serialize_as_plain_json() {
    let rendered = table_col("t", "x")
        .eq(param("a"))
        .and(table_col("t", "y").eq(param(1.5)))
        .render(Dialect::Sqlite);
    assert_eq!(serde_json::to_string(&rendered.params).unwrap(), r#"["a",1.5]"#);
}

#[test]
fn test_booleans() {
    let rendered: Vec<String> = Dialect::ALL.iter().map(|d| lit_bool(true).to_sql(*d)).collect();
    assert_eq!(rendered, vec!["true", "1", "true", "1"]);
}

#[test]
fn test_function_remapping() {
    let len = func("LEN", vec![table_col("t", "x")]);
    assert_eq!(len.to_sql(Dialect::Postgres), "LENGTH(\"t\".\"x\")");
    assert_eq!(len.to_sql(Dialect::MySql), "CHAR_LENGTH(`t`.`x`)");
    assert_eq!(len.to_sql(Dialect::Sqlite), "LENGTH(\"t\".\"x\")");
    assert_eq!(len.to_sql(Dialect::MsSql), "LEN([t].[x])");

    let ifnull = func("IFNULL", vec![table_col("t", "x"), lit_str("")]);
    assert_eq!(ifnull.to_sql(Dialect::Postgres), "COALESCE(\"t\".\"x\", '')");
    assert_eq!(ifnull.to_sql(Dialect::MsSql), "ISNULL([t].[x], '')");

    assert_eq!(func("NOW", vec![]).to_sql(Dialect::MsSql), "GETDATE()");
    assert_eq!(
        func("GREATEST", vec![table_col("t", "a"), table_col("t", "b")]).to_sql(Dialect::Sqlite),
        "MAX(\"t\".\"a\", \"t\".\"b\")"
    );
}

#[test]
fn test_concat_operator() {
    let expr = lit_str("a").concat(table_col("t", "x"));
    assert_eq!(expr.to_sql(Dialect::Postgres), "'a' || \"t\".\"x\"");
    assert_eq!(expr.to_sql(Dialect::MsSql), "'a' + [t].[x]");
    assert_eq!(expr.to_sql(Dialect::MySql), "CONCAT('a', `t`.`x`)");
}

#[test]
fn test_quoting_escapes() {
    assert_eq!(lit_str("O'Brien").to_sql(Dialect::Postgres), "'O''Brien'");
    assert_eq!(lit_str("café").to_sql(Dialect::MsSql), "N'café'");
    assert_eq!(table_col("t", "we\"ird").to_sql(Dialect::Sqlite), "\"t\".\"we\"\"ird\"");
    assert_eq!(table_col("t", "a]b").to_sql(Dialect::MsSql), "[t].[a]]b]");
}

#[test]
fn test_empty_in_list_is_constant() {
    assert_eq!(table_col("t", "x").in_list(vec![]).to_sql(Dialect::Postgres), "1 = 0");
    assert_eq!(table_col("t", "x").not_in_list(vec![]).to_sql(Dialect::Postgres), "1 = 1");
}

#[test]
fn test_subquery_membership() {
    let sub = Query::new()
        .select(vec![table_col("s", "id")])
        .from(TableRef::new("sales").with_alias("s"));
    assert_eq!(
        table_col("r", "id").in_subquery(sub, true).to_sql(Dialect::Sqlite),
        "\"r\".\"id\" NOT IN (SELECT \"s\".\"id\" FROM \"sales\" AS \"s\")"
    );
}
