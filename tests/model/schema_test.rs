//! Tests for schema loading, lookup helpers and validation.

#[path = "../common/fixtures.rs"]
mod fixtures;

use virtcol::compile::{compile_where, CompileContext};
use virtcol::model::{
    Association, Column, ColumnKind, FormulaOptions, LookupOptions, Relation, RelationType,
    RollupFunction, Schema, SchemaDef, Table, UiType,
};
use virtcol::sql::Dialect;
use virtcol::validation;
use virtcol::CompileError;

const CRM: &str = r#"{
    "dialect": "sqlite",
    "tables": [
        {
            "id": "t_people", "title": "People", "table_name": "people",
            "columns": [
                {"id": "p_id", "title": "Id", "column_name": "id", "uidt": "ID", "pk": true},
                {"id": "p_name", "title": "Name", "column_name": "name", "pv": true},
                {"id": "p_team", "title": "TeamId", "column_name": "team_id", "uidt": "ForeignKey"},
                {"id": "p_team_rel", "title": "Team", "uidt": "LinkToAnotherRecord",
                 "kind": {"type": "relation", "relation_type": "bt",
                          "fk_child_column_id": "p_team", "fk_parent_column_id": "t_id",
                          "fk_related_model_id": "t_teams"}},
                {"id": "p_team_name", "title": "TeamName", "uidt": "Lookup",
                 "kind": {"type": "lookup", "fk_relation_column_id": "p_team_rel",
                          "fk_lookup_column_id": "t_name"}},
                {"id": "p_greeting", "title": "Greeting", "uidt": "Formula",
                 "kind": {"type": "formula", "formula_raw": "CONCAT('Hi ', {Name})"}}
            ]
        },
        {
            "id": "t_teams", "title": "Teams", "table_name": "teams",
            "columns": [
                {"id": "t_id", "title": "Id", "column_name": "id", "uidt": "ID", "pk": true},
                {"id": "t_name", "title": "Name", "column_name": "name"},
                {"id": "t_members", "title": "Members", "uidt": "Links",
                 "kind": {"type": "relation", "relation_type": "hm",
                          "child_column_id": "p_team", "parent_column_id": "t_id",
                          "related_table_id": "t_people"}},
                {"id": "t_size", "title": "Size", "uidt": "Rollup",
                 "kind": {"type": "rollup", "fk_relation_column_id": "t_members",
                          "fk_rollup_column_id": "p_id", "rollup_function": "count"}}
            ]
        }
    ]
}"#;

#[test]
fn test_load_json_schema() {
    let schema = Schema::from_json(CRM).unwrap();
    assert_eq!(schema.dialect(), Dialect::Sqlite);
    assert_eq!(schema.tables().len(), 2);

    let team = schema.column_by_id("p_team_rel").unwrap();
    assert_eq!(team.table_id, "t_people");
    match &team.kind {
        ColumnKind::Relation(relation) => {
            assert_eq!(relation.relation_type, RelationType::BelongsTo);
            assert_eq!(relation.related_table_id, "t_teams");
        }
        other => panic!("expected relation, got {:?}", other),
    }
    match &schema.column_by_id("t_size").unwrap().kind {
        ColumnKind::Rollup(opts) => assert_eq!(opts.function, RollupFunction::Count),
        other => panic!("expected rollup, got {:?}", other),
    }

    assert!(validation::validate(&schema).is_ok());
}

#[test]
fn test_loaded_schema_compiles() {
    let schema = Schema::from_json(CRM).unwrap();
    let mut ctx = CompileContext::new(&schema, "t_people").unwrap();
    assert_eq!(
        compile_where(&mut ctx, "(TeamName,eq,Core)")
            .unwrap()
            .to_sql(Dialect::Sqlite)
            .unwrap(),
        "\"people\".\"team_id\" IN (SELECT \"__nc0\".\"id\" FROM \"teams\" AS \"__nc0\" \
         WHERE \"__nc0\".\"name\" = 'Core')"
    );

    let mut ctx = CompileContext::new(&schema, "t_teams").unwrap();
    assert_eq!(
        compile_where(&mut ctx, "(Size,ge,3)")
            .unwrap()
            .to_sql(Dialect::Sqlite)
            .unwrap(),
        "(SELECT COUNT(\"__nc0\".\"id\") FROM \"people\" AS \"__nc0\" \
         WHERE \"__nc0\".\"team_id\" = \"teams\".\"id\") >= 3"
    );
}

#[test]
fn test_serialized_form_round_trips() {
    let schema = fixtures::shop(Dialect::MsSql);
    let json = serde_json::to_string(&SchemaDef::from(&schema)).unwrap();
    let back = Schema::from_json(&json).unwrap();
    assert_eq!(back.dialect(), Dialect::MsSql);
    assert_eq!(back.tables(), schema.tables());
}

#[test]
fn test_table_lookup_helpers() {
    let schema = fixtures::shop(Dialect::Postgres);
    assert_eq!(schema.find_table("Orders").unwrap().id, "t_o");
    assert_eq!(schema.find_table("order_tags").unwrap().id, "t_ot");
    assert!(schema.find_table("nope").is_none());

    let tags = schema.table_by_id("t_tg").unwrap();
    assert_eq!(tags.primary_key().unwrap().id, "tg_id");
    // No flagged display column: first physical non-key column.
    assert_eq!(tags.display_column().unwrap().id, "tg_label");
    // Lookup by id, title, then physical name.
    let orders = schema.table_by_id("t_o").unwrap();
    assert_eq!(orders.column("created_at").unwrap().id, "o_created");
    assert_eq!(orders.column("Created").unwrap().id, "o_created");
}

#[test]
fn test_fixtures_validate() {
    assert!(validation::validate(&fixtures::shop(Dialect::Postgres)).is_ok());
    assert!(validation::validate(&fixtures::lookup_chain(Dialect::Postgres, 5)).is_ok());
    assert!(validation::validate(&fixtures::geo(Dialect::MsSql)).is_ok());
}

#[test]
fn test_validation_collects_every_problem() {
    let mut broken = Relation::many_to_many(
        "a_id",
        "b_id",
        "t_b",
        Association {
            table_id: "t_ab".into(),
            child_column_id: "ab_a".into(),
            parent_column_id: "ab_b".into(),
        },
    );
    broken.association = None;

    let a = Table::new("t_a", "A", "a")
        .with_column(Column::plain("a_id", "Id", "id", UiType::Id).with_primary_key())
        .with_column(Column::virtual_column(
            "a_bs",
            "Bs",
            UiType::Links,
            ColumnKind::Relation(broken),
        ))
        .with_column(Column::virtual_column(
            "a_dangling",
            "Dangling",
            UiType::Lookup,
            ColumnKind::Lookup(LookupOptions {
                relation_column_id: "a_bs".into(),
                lookup_column_id: "missing".into(),
            }),
        ))
        .with_column(Column::virtual_column(
            "a_x",
            "X",
            UiType::Formula,
            ColumnKind::Formula(FormulaOptions::from_text("{Y} + 1")),
        ))
        .with_column(Column::virtual_column(
            "a_y",
            "Y",
            UiType::Formula,
            ColumnKind::Formula(FormulaOptions::from_text("{X} + 1")),
        ));
    let b = Table::new("t_b", "B", "b")
        .with_column(Column::plain("b_id", "Id", "id", UiType::Id).with_primary_key());

    let errors = validation::validate(&Schema::new(Dialect::Postgres, vec![a, b])).unwrap_err();
    assert_eq!(errors.len(), 3, "{:?}", errors);
    assert!(errors
        .iter()
        .any(|e| matches!(e, CompileError::InvalidSchema(m) if m.contains("junction"))));
    assert!(errors
        .iter()
        .any(|e| matches!(e, CompileError::InvalidSchema(m) if m.contains("missing"))));
    assert!(errors
        .iter()
        .any(|e| matches!(e, CompileError::CircularFormulaReference(path) if path.len() == 3)));
}

#[test]
fn test_unparseable_formula_is_reported_unless_flagged() {
    let table = |options: FormulaOptions| {
        Table::new("t", "T", "t")
            .with_column(Column::plain("id", "Id", "id", UiType::Id).with_primary_key())
            .with_column(Column::virtual_column(
                "f",
                "F",
                UiType::Formula,
                ColumnKind::Formula(options),
            ))
    };
    let schema = Schema::new(Dialect::Postgres, vec![table(FormulaOptions::from_text("{Id} +"))]);
    assert!(validation::validate(&schema).is_err());

    let flagged = FormulaOptions::from_text("{Id} +").with_error("syntax error");
    let schema = Schema::new(Dialect::Postgres, vec![table(flagged)]);
    assert!(validation::validate(&schema).is_ok());
}
