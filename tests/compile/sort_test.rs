//! Tests for sort compilation.

#[path = "../common/fixtures.rs"]
mod fixtures;

use virtcol::compile::{compile_sort, compile_sort_str, CompileContext};
use virtcol::filter::SortSpec;
use virtcol::sql::Dialect;

fn sort_sql(dialect: Dialect, table_id: &str, source: &str) -> Vec<String> {
    let schema = fixtures::shop(dialect);
    let mut ctx = CompileContext::new(&schema, table_id).unwrap();
    compile_sort_str(&mut ctx, source)
        .unwrap()
        .iter()
        .map(|o| o.to_sql(dialect))
        .collect()
}

#[test]
fn test_plain_columns_keep_order() {
    assert_eq!(
        sort_sql(Dialect::Postgres, "t_o", "-Created,Title"),
        vec!["\"orders\".\"created_at\" DESC", "\"orders\".\"title\" ASC"]
    );
}

#[test]
fn test_select_column_sort() {
    assert_eq!(
        sort_sql(Dialect::MsSql, "t_o", "Status"),
        vec!["CAST([orders].[status] AS VARCHAR(MAX)) ASC"]
    );
}

#[test]
fn test_belongs_to_sorts_by_display_value() {
    assert_eq!(
        sort_sql(Dialect::Postgres, "t_o", "Customer"),
        vec![
            "(SELECT \"__nc0\".\"name\" FROM \"customers\" AS \"__nc0\" \
             WHERE \"__nc0\".\"id\" = \"orders\".\"customer_id\") ASC"
        ]
    );
}

#[test]
fn test_rollup_sort() {
    assert_eq!(
        sort_sql(Dialect::Postgres, "t_r", "-SalesTotal"),
        vec![
            "(SELECT SUM(\"__nc0\".\"amount\") FROM \"sales\" AS \"__nc0\" \
             WHERE \"__nc0\".\"region_id\" = \"regions\".\"id\") DESC"
        ]
    );
}

#[test]
fn test_formula_sort() {
    assert_eq!(
        sort_sql(Dialect::MsSql, "t_o", "-Total"),
        vec!["[orders].[price] * [orders].[quantity] DESC"]
    );
}

#[test]
fn test_multi_valued_relations_are_skipped() {
    assert_eq!(
        sort_sql(Dialect::Sqlite, "t_o", "Tags,Id"),
        vec!["\"orders\".\"id\" ASC"]
    );
    assert_eq!(
        sort_sql(Dialect::Sqlite, "t_r", "Sales"),
        Vec::<String>::new()
    );
}

#[test]
fn test_sort_specs_from_json() {
    let specs: Vec<SortSpec> = serde_json::from_str(
        r#"[{"fk_column_id": "o_qty", "direction": "desc"}, {"column": "Title"}]"#,
    )
    .unwrap();
    let schema = fixtures::shop(Dialect::MySql);
    let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
    let order: Vec<String> = compile_sort(&mut ctx, &specs)
        .unwrap()
        .iter()
        .map(|o| o.to_sql(Dialect::MySql))
        .collect();
    assert_eq!(order, vec!["`orders`.`quantity` DESC", "`orders`.`title` ASC"]);
}

#[test]
fn test_sort_on_nested_multi_valued_lookup() {
    let schema = fixtures::geo(Dialect::MsSql);
    let mut ctx = CompileContext::new(&schema, "t_gc").unwrap();
    let order: Vec<String> = compile_sort_str(&mut ctx, "Amounts,-RegionSales")
        .unwrap()
        .iter()
        .map(|o| o.to_sql(Dialect::MsSql))
        .collect();
    assert_eq!(
        order,
        vec![
            "(SELECT STRING_AGG(CAST([__nc1].[amount] AS NVARCHAR(MAX)), ',') FROM [regions] AS [__nc0] \
             INNER JOIN [sales] AS [__nc1] ON [__nc1].[region_id] = [__nc0].[id] \
             WHERE [__nc0].[country_id] = [countries].[id]) ASC",
            "(SELECT STRING_AGG(CAST([__nc3].[code] AS NVARCHAR(MAX)), ',') FROM [regions] AS [__nc2] \
             INNER JOIN [sales] AS [__nc3] ON [__nc3].[region_id] = [__nc2].[id] \
             WHERE [__nc2].[country_id] = [countries].[id]) DESC",
        ]
    );
}
