//! Tests for filters across relations, lookups and rollups.

#[path = "../common/fixtures.rs"]
mod fixtures;

use virtcol::compile::{compile_where, CompileContext, CompileOptions};
use virtcol::model::{
    Column, ColumnKind, LookupOptions, Relation, RelationType, RollupFunction, RollupOptions,
    Schema, Table, UiType,
};
use virtcol::sql::Dialect;
use virtcol::CompileError;

fn compile(schema: &Schema, table_id: &str, source: &str) -> Result<String, CompileError> {
    let mut ctx = CompileContext::new(schema, table_id)?;
    Ok(compile_where(&mut ctx, source)?
        .to_sql(schema.dialect())
        .unwrap_or_default())
}

fn orders_where(dialect: Dialect, source: &str) -> String {
    compile(&fixtures::shop(dialect), "t_o", source).unwrap()
}

#[test]
fn test_belongs_to_eq() {
    assert_eq!(
        orders_where(Dialect::Postgres, "(Customer,eq,Ann)"),
        "\"orders\".\"customer_id\" IN (SELECT \"__nc0\".\"id\" FROM \"customers\" AS \"__nc0\" \
         WHERE \"__nc0\".\"name\" = 'Ann')"
    );
}

#[test]
fn test_belongs_to_neq_keeps_unlinked_rows() {
    assert_eq!(
        orders_where(Dialect::MySql, "(Customer,neq,Ann)"),
        "(`orders`.`customer_id` NOT IN (SELECT `__nc0`.`id` FROM `customers` AS `__nc0` \
         WHERE CAST(`__nc0`.`name` AS BINARY) = 'Ann' AND `__nc0`.`id` IS NOT NULL) \
         OR `orders`.`customer_id` IS NULL)"
    );
}

#[test]
fn test_belongs_to_emptiness_checks_foreign_key() {
    assert_eq!(
        orders_where(Dialect::Sqlite, "(Customer,notblank)"),
        "\"orders\".\"customer_id\" IS NOT NULL"
    );
}

#[test]
fn test_has_many_membership_and_emptiness() {
    let schema = fixtures::shop(Dialect::Postgres);
    assert_eq!(
        compile(&schema, "t_r", "(Sales,eq,5)").unwrap(),
        "\"regions\".\"id\" IN (SELECT \"__nc0\".\"region_id\" FROM \"sales\" AS \"__nc0\" \
         WHERE \"__nc0\".\"amount\" = 5)"
    );
    assert_eq!(
        compile(&schema, "t_r", "(Sales,blank)").unwrap(),
        "(SELECT COUNT(*) FROM \"sales\" AS \"__nc0\" WHERE \"__nc0\".\"region_id\" = \"regions\".\"id\") = 0"
    );
    assert_eq!(
        compile(&schema, "t_r", "(Sales,notblank)").unwrap(),
        "(SELECT COUNT(*) FROM \"sales\" AS \"__nc0\" WHERE \"__nc0\".\"region_id\" = \"regions\".\"id\") <> 0"
    );
}

#[test]
fn test_many_to_many_goes_through_junction() {
    assert_eq!(
        orders_where(Dialect::Postgres, "(Tags,eq,urgent)"),
        "\"orders\".\"id\" IN (SELECT \"__nc0\".\"order_id\" FROM \"order_tags\" AS \"__nc0\" \
         INNER JOIN \"tags\" AS \"__nc1\" ON \"__nc1\".\"id\" = \"__nc0\".\"tag_id\" \
         WHERE \"__nc1\".\"label\" = 'urgent')"
    );
    assert_eq!(
        orders_where(Dialect::Postgres, "(Tags,notempty)"),
        "(SELECT COUNT(*) FROM \"order_tags\" AS \"__nc0\" WHERE \"__nc0\".\"order_id\" = \"orders\".\"id\") <> 0"
    );
}

#[test]
fn test_many_to_many_negation_has_no_null_branch() {
    assert_eq!(
        orders_where(Dialect::Postgres, "(Tags,neq,urgent)"),
        "\"orders\".\"id\" NOT IN (SELECT \"__nc0\".\"order_id\" FROM \"order_tags\" AS \"__nc0\" \
         INNER JOIN \"tags\" AS \"__nc1\" ON \"__nc1\".\"id\" = \"__nc0\".\"tag_id\" \
         WHERE \"__nc1\".\"label\" = 'urgent' AND \"__nc0\".\"order_id\" IS NOT NULL)"
    );
}

#[test]
fn test_lookup_blank_is_negated_membership() {
    assert_eq!(
        orders_where(Dialect::Postgres, "(CustomerName,blank)"),
        "(\"orders\".\"customer_id\" NOT IN (SELECT \"__nc0\".\"id\" FROM \"customers\" AS \"__nc0\" \
         WHERE (\"__nc0\".\"name\" IS NOT NULL AND \"__nc0\".\"name\" <> '') \
         AND \"__nc0\".\"id\" IS NOT NULL) OR \"orders\".\"customer_id\" IS NULL)"
    );
}

#[test]
fn test_lookup_of_lookup_of_rollup() {
    assert_eq!(
        orders_where(Dialect::Postgres, "(CustomerRegionSales,gt,100)"),
        "\"orders\".\"customer_id\" IN (SELECT \"__nc0\".\"id\" FROM \"customers\" AS \"__nc0\" \
         INNER JOIN \"regions\" AS \"__nc1\" ON \"__nc1\".\"id\" = \"__nc0\".\"region_id\" \
         WHERE (SELECT SUM(\"__nc2\".\"amount\") FROM \"sales\" AS \"__nc2\" \
         WHERE \"__nc2\".\"region_id\" = \"__nc1\".\"id\") > 100)"
    );
}

#[test]
fn test_lookup_chain_aliases_are_distinct() {
    assert_eq!(
        compile(&fixtures::lookup_chain(Dialect::Postgres, 2), "n0", "(Deep,eq,x)").unwrap(),
        "\"level_0\".\"next_id\" IN (SELECT \"__nc0\".\"id\" FROM \"level_1\" AS \"__nc0\" \
         INNER JOIN \"level_2\" AS \"__nc1\" ON \"__nc1\".\"id\" = \"__nc0\".\"next_id\" \
         WHERE \"__nc1\".\"name\" = 'x')"
    );

    for depth in 1..=5 {
        let schema = fixtures::lookup_chain(Dialect::Postgres, depth);
        let sql = compile(&schema, "n0", "(Deep,eq,x)").unwrap();
        for hop in 0..depth {
            let alias = format!("AS \"__nc{}\"", hop);
            assert_eq!(sql.matches(&alias).count(), 1, "depth {}: {}", depth, sql);
        }
        assert!(!sql.contains(&format!("__nc{}", depth)), "depth {}: {}", depth, sql);
        assert!(sql.ends_with(&format!("WHERE \"__nc{}\".\"name\" = 'x')", depth - 1)));
    }
}

#[test]
fn test_alias_prefix_option() {
    let schema = fixtures::shop(Dialect::MsSql);
    let mut ctx = CompileContext::new(&schema, "t_o")
        .unwrap()
        .with_options(CompileOptions::default().with_alias_prefix("_j"));
    assert_eq!(
        compile_where(&mut ctx, "(Customer,eq,Ann)")
            .unwrap()
            .to_sql(Dialect::MsSql)
            .unwrap(),
        "[orders].[customer_id] IN (SELECT [_j0].[id] FROM [customers] AS [_j0] WHERE [_j0].[name] = 'Ann')"
    );
}

fn with_customer_column(column: Column) -> Schema {
    let base = fixtures::shop(Dialect::Postgres);
    let tables = base
        .tables()
        .iter()
        .cloned()
        .map(|t| if t.id == "t_c" { t.with_column(column.clone()) } else { t })
        .collect();
    Schema::new(base.dialect(), tables)
}

#[test]
fn test_rollup_over_belongs_to_is_rejected() {
    let schema = with_customer_column(Column::virtual_column(
        "c_bad",
        "RegionRollup",
        UiType::Rollup,
        ColumnKind::Rollup(RollupOptions {
            relation_column_id: "c_region_rel".into(),
            rollup_column_id: "r_name".into(),
            function: RollupFunction::Count,
        }),
    ));
    assert_eq!(
        compile(&schema, "t_c", "(RegionRollup,gt,1)"),
        Err(CompileError::UnsupportedRelationType {
            column: "RegionRollup".into(),
            relation_type: "bt".into(),
        })
    );
}

#[test]
fn test_unsupported_relation_kind() {
    let mut relation = Relation::belongs_to("c_region", "r_id", "t_r");
    relation.relation_type = RelationType::Unsupported("oo".into());
    let schema = with_customer_column(Column::virtual_column(
        "c_oo",
        "OneToOne",
        UiType::LinkToAnotherRecord,
        ColumnKind::Relation(relation),
    ));
    assert!(matches!(
        compile(&schema, "t_c", "(OneToOne,eq,x)"),
        Err(CompileError::UnsupportedRelationType { .. })
    ));
}

#[test]
fn test_circular_lookup() {
    let people = Table::new("t_p", "People", "people")
        .with_column(Column::plain("p_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(Column::plain("p_parent", "ParentId", "parent_id", UiType::ForeignKey))
        .with_column(Column::virtual_column(
            "p_parent_rel",
            "Parent",
            UiType::LinkToAnotherRecord,
            ColumnKind::Relation(Relation::belongs_to("p_parent", "p_id", "t_p")),
        ))
        .with_column(Column::virtual_column(
            "p_loop",
            "Loop",
            UiType::Lookup,
            ColumnKind::Lookup(LookupOptions {
                relation_column_id: "p_parent_rel".into(),
                lookup_column_id: "p_loop".into(),
            }),
        ));
    let schema = Schema::new(Dialect::Postgres, vec![people]);
    assert_eq!(
        compile(&schema, "t_p", "(Loop,eq,x)"),
        Err(CompileError::CircularLookupReference("Loop".into()))
    );
}

#[test]
fn test_lookups_sharing_a_relation_take_distinct_aliases() {
    assert_eq!(
        orders_where(Dialect::Postgres, "(CustomerName,eq,a)~and(CustomerRegion,eq,b)"),
        "\"orders\".\"customer_id\" IN (SELECT \"__nc0\".\"id\" FROM \"customers\" AS \"__nc0\" \
         WHERE \"__nc0\".\"name\" = 'a') \
         AND \"orders\".\"customer_id\" IN (SELECT \"__nc1\".\"id\" FROM \"customers\" AS \"__nc1\" \
         INNER JOIN \"regions\" AS \"__nc2\" ON \"__nc2\".\"id\" = \"__nc1\".\"region_id\" \
         WHERE \"__nc2\".\"name\" = 'b')"
    );
}

#[test]
fn test_lookup_across_two_has_many_hops() {
    assert_eq!(
        compile(&fixtures::geo(Dialect::Sqlite), "t_gc", "(Amounts,gt,5)").unwrap(),
        "\"countries\".\"id\" IN (SELECT \"__nc0\".\"country_id\" FROM \"regions\" AS \"__nc0\" \
         INNER JOIN \"sales\" AS \"__nc1\" ON \"__nc1\".\"region_id\" = \"__nc0\".\"id\" \
         WHERE \"__nc1\".\"amount\" > 5)"
    );
}

mod snapshot_tests {
    use super::*;
    use insta::assert_snapshot;
    use virtcol::compile::{compile_value, dry_run};
    use virtcol::sql::TableRef;

    /// Compile on `orders` and make sure the result parses as a predicate.
    fn checked(dialect: Dialect, source: &str) -> String {
        let schema = fixtures::shop(dialect);
        let mut ctx = CompileContext::new(&schema, "t_o").unwrap();
        let compiled = compile_where(&mut ctx, source).unwrap();
        let predicate = compiled.predicate.as_ref().unwrap();
        dry_run(predicate, TableRef::new("orders"), dialect).unwrap();
        compiled.to_sql(dialect).unwrap()
    }

    #[test]
    fn many_to_many_mssql() {
        assert_snapshot!(
            checked(Dialect::MsSql, "(Tags,eq,urgent)"),
            @"[orders].[id] IN (SELECT [__nc0].[order_id] FROM [order_tags] AS [__nc0] INNER JOIN [tags] AS [__nc1] ON [__nc1].[id] = [__nc0].[tag_id] WHERE [__nc1].[label] = 'urgent')"
        );
    }

    #[test]
    fn many_to_many_mysql() {
        assert_snapshot!(
            checked(Dialect::MySql, "(Tags,eq,urgent)"),
            @"`orders`.`id` IN (SELECT `__nc0`.`order_id` FROM `order_tags` AS `__nc0` INNER JOIN `tags` AS `__nc1` ON `__nc1`.`id` = `__nc0`.`tag_id` WHERE CAST(`__nc1`.`label` AS BINARY) = 'urgent')"
        );
    }

    #[test]
    fn nested_multi_valued_values_mssql() {
        let schema = fixtures::geo(Dialect::MsSql);
        for (column, expected) in [
            (
                "RegionTotals",
                "(SELECT SUM([__nc1].[amount]) FROM [regions] AS [__nc0] INNER JOIN [sales] AS [__nc1] ON [__nc1].[region_id] = [__nc0].[id] WHERE [__nc0].[country_id] = [countries].[id])",
            ),
            (
                "RegionSales",
                "(SELECT STRING_AGG(CAST([__nc1].[code] AS NVARCHAR(MAX)), ',') FROM [regions] AS [__nc0] INNER JOIN [sales] AS [__nc1] ON [__nc1].[region_id] = [__nc0].[id] WHERE [__nc0].[country_id] = [countries].[id])",
            ),
        ] {
            let mut ctx = CompileContext::new(&schema, "t_gc").unwrap();
            let value = compile_value(&mut ctx, column).unwrap();
            dry_run(&value, TableRef::new("countries"), Dialect::MsSql).unwrap();
            assert_eq!(value.to_sql(Dialect::MsSql), expected);
        }

        let mut ctx = CompileContext::new(&schema, "t_gc").unwrap();
        let value = compile_value(&mut ctx, "Amounts").unwrap();
        dry_run(&value, TableRef::new("countries"), Dialect::MsSql).unwrap();
        assert_snapshot!(
            value.to_sql(Dialect::MsSql),
            @"(SELECT STRING_AGG(CAST([__nc1].[amount] AS NVARCHAR(MAX)), ',') FROM [regions] AS [__nc0] INNER JOIN [sales] AS [__nc1] ON [__nc1].[region_id] = [__nc0].[id] WHERE [__nc0].[country_id] = [countries].[id])"
        );
    }

    #[test]
    fn belongs_to_sqlite() {
        assert_snapshot!(
            checked(Dialect::Sqlite, "(Customer,eq,Ann)"),
            @r#""orders"."customer_id" IN (SELECT "__nc0"."id" FROM "customers" AS "__nc0" WHERE "__nc0"."name" = 'Ann')"#
        );
    }
}
