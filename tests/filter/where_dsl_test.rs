//! Tests for the where-clause DSL and the JSON filter tree it produces.

use virtcol::filter::{parse_where, ComparisonOp, ComparisonSubOp, Filter, FilterValue, LogicalOp};
use virtcol::CompileError;

#[test]
fn test_dsl_equals_direct_tree() {
    let parsed = parse_where("(Age,gt,18)~and((Name,like,John))").unwrap();
    let expected = vec![
        Filter::leaf("Age", ComparisonOp::Gt, FilterValue::text("18")),
        Filter::group(vec![Filter::leaf(
            "Name",
            ComparisonOp::Like,
            FilterValue::text("John"),
        )]),
    ];
    assert_eq!(parsed, expected);
}

#[test]
fn test_connectives_attach_to_following_term() {
    let parsed = parse_where("(A,eq,1) ~or (B,eq,2) ~not (C,eq,3)").unwrap();
    let ops: Vec<LogicalOp> = parsed.iter().map(Filter::logical_op).collect();
    assert_eq!(ops, vec![LogicalOp::And, LogicalOp::Or, LogicalOp::Not]);
}

#[test]
fn test_every_operator_name_parses() {
    let names = [
        ("eq", ComparisonOp::Eq),
        ("neq", ComparisonOp::Neq),
        ("like", ComparisonOp::Like),
        ("nlike", ComparisonOp::Nlike),
        ("in", ComparisonOp::In),
        ("gt", ComparisonOp::Gt),
        ("ge", ComparisonOp::Ge),
        ("gte", ComparisonOp::Ge),
        ("lt", ComparisonOp::Lt),
        ("lte", ComparisonOp::Le),
        ("btw", ComparisonOp::Btw),
        ("nbtw", ComparisonOp::Nbtw),
        ("allof", ComparisonOp::Allof),
        ("nanyof", ComparisonOp::Nanyof),
        ("blank", ComparisonOp::Blank),
        ("notempty", ComparisonOp::Notempty),
        ("checked", ComparisonOp::Checked),
        ("isnot", ComparisonOp::Isnot),
    ];
    for (name, op) in names {
        let parsed = parse_where(&format!("(Col,{},x)", name)).unwrap();
        match &parsed[0] {
            Filter::Leaf(leaf) => assert_eq!(leaf.op, op, "{}", name),
            other => panic!("expected leaf for {}, got {:?}", name, other),
        }
    }
}

#[test]
fn test_values_keep_commas_and_spaces() {
    let parsed = parse_where("(Tags,anyof,red, green,blue)").unwrap();
    let Filter::Leaf(leaf) = &parsed[0] else {
        panic!("expected leaf");
    };
    assert_eq!(leaf.value.items(), vec!["red", "green", "blue"]);
}

#[test]
fn test_sub_op_only_for_date_operators() {
    let parsed = parse_where("(Due,lt,oneWeekAgo)~and(Note,like,today)").unwrap();
    assert_eq!(
        parsed[0],
        Filter::date_leaf("Due", ComparisonOp::Lt, ComparisonSubOp::OneWeekAgo, FilterValue::Null)
    );
    assert_eq!(
        parsed[1],
        Filter::leaf("Note", ComparisonOp::Like, FilterValue::text("today"))
    );
}

#[test]
fn test_json_round_trip() {
    let parsed = parse_where("(Age,gt,18)~or((Created,eq,daysAgo,3)~not(Name,blank))").unwrap();
    let json = serde_json::to_string(&parsed).unwrap();
    let back: Vec<Filter> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, parsed);
}

#[test]
fn test_malformed_input() {
    for source in ["(Age,gt,18", "Age,gt,18", "(Age,gt,18)~and", "(,eq,1)", "(Age)"] {
        assert!(
            matches!(parse_where(source), Err(CompileError::WhereParse { .. })),
            "{} should not parse",
            source
        );
    }
}
