//! Filter tree compilation.
//!
//! Groups fold their children left to right with each child's logical
//! operator. Leaves dispatch on the column kind:
//!
//! | Column   | Predicate                                                |
//! |----------|----------------------------------------------------------|
//! | plain    | comparison on the column                                 |
//! | relation | `key [NOT] IN (SELECT key FROM related WHERE display op)` |
//! | lookup   | membership over the joined hop chain                     |
//! | rollup   | comparison on the aggregate subquery                     |
//! | formula  | comparison on the compiled formula                       |

use super::context::{CompileContext, Scope};
use super::date;
use super::formula;
use super::lookup::display_column;
use crate::error::{CompileError, CompileResult};
use crate::filter::{parse_where, ComparisonOp, Filter, FilterLeaf, FilterValue, LogicalOp, Number};
use crate::formula::{BinaryOp, FormulaNode, LiteralValue, UnaryOp};
use crate::model::{Column, ColumnKind, RollupFunction, UiType};
use crate::planner::{build_rollup_expr, plan_traversal, Traversal};
use crate::resolve::{ColumnDescriptor, ColumnResolver};
use crate::sql::{
    cast, func, lit_bool, lit_int, lit_str, param, table_col, BinaryOperator, Dialect, Expr,
    ExprExt, Join, Query, RenderedSql, SqlDialect,
};

/// A compiled filter tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFilter {
    /// `None` when every leaf was skipped.
    pub predicate: Option<Expr>,
    /// Joins to splice into the outer query. Traversals compile to
    /// correlated subqueries, so this is currently always empty.
    pub joins: Vec<Join>,
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        self.predicate.is_none()
    }

    pub fn to_sql(&self, dialect: Dialect) -> Option<String> {
        self.predicate.as_ref().map(|p| p.to_sql(dialect))
    }

    pub fn render(&self, dialect: Dialect) -> Option<RenderedSql> {
        self.predicate.as_ref().map(|p| p.render(dialect))
    }
}

/// Compile a filter list against the context's table.
pub fn compile_filter(ctx: &mut CompileContext, filters: &[Filter]) -> CompileResult<CompiledFilter> {
    let scope = ctx.root_scope();
    let predicate = compile_list(ctx, &scope, filters)?;
    Ok(CompiledFilter {
        predicate,
        joins: Vec::new(),
    })
}

/// Parse a `where` DSL string and compile it.
pub fn compile_where(ctx: &mut CompileContext, source: &str) -> CompileResult<CompiledFilter> {
    let filters = parse_where(source)?;
    compile_filter(ctx, &filters)
}

// ============================================================================
// Fields
// ============================================================================

/// How a compared value behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    Text,
    Numeric,
    Boolean,
    Date,
    DateTime,
    Select,
}

impl FieldKind {
    pub fn of(uidt: &UiType) -> Self {
        if uidt.is_date() {
            FieldKind::Date
        } else if uidt.is_datetime() {
            FieldKind::DateTime
        } else if uidt.is_numeric() {
            FieldKind::Numeric
        } else if uidt.is_boolean() {
            FieldKind::Boolean
        } else if uidt.is_select() {
            FieldKind::Select
        } else {
            FieldKind::Text
        }
    }

    fn is_textual(self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Select)
    }
}

/// The left-hand side of a comparison.
#[derive(Debug, Clone)]
pub(crate) struct Field {
    pub expr: Expr,
    pub kind: FieldKind,
    /// Column title, for error messages.
    pub name: String,
}

impl Field {
    pub fn new(expr: Expr, kind: FieldKind, name: &str) -> Self {
        Self {
            expr,
            kind,
            name: name.to_string(),
        }
    }

    fn column(scope: &Scope, column: &Column) -> Self {
        Self::new(
            table_col(&scope.qualifier, &column.column_name),
            FieldKind::of(&column.uidt),
            &column.title,
        )
    }

    fn unsupported(&self, op: ComparisonOp) -> CompileError {
        CompileError::UnsupportedOperator {
            op: op.to_string(),
            column: self.name.clone(),
        }
    }
}

// ============================================================================
// Tree walk
// ============================================================================

pub(crate) fn compile_list<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    filters: &[Filter],
) -> CompileResult<Option<Expr>> {
    let mut acc: Option<Expr> = None;
    for filter in filters {
        let Some(expr) = compile_node(ctx, scope, filter)? else {
            continue;
        };
        acc = Some(match (acc, filter.logical_op()) {
            (None, LogicalOp::Not) => negate(expr),
            (None, _) => expr,
            (Some(prev), LogicalOp::And) => prev.and_grouped(expr),
            (Some(prev), LogicalOp::Or) => prev.or_grouped(expr),
            (Some(prev), LogicalOp::Not) => prev.and_grouped(negate(expr)),
        });
    }
    Ok(acc)
}

fn compile_node<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    filter: &Filter,
) -> CompileResult<Option<Expr>> {
    match filter {
        Filter::Group(group) => compile_list(ctx, scope, &group.children),
        Filter::Leaf(leaf) => {
            let column = ctx.resolver().column(&scope.table.id, &leaf.column)?;
            compile_column_leaf(ctx, scope, column, leaf)
        }
    }
}

fn negate(expr: Expr) -> Expr {
    expr.paren().not()
}

/// Compile one leaf against `column`, which lives on `scope`'s table.
pub(crate) fn compile_column_leaf<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    column: &'a Column,
    leaf: &FilterLeaf,
) -> CompileResult<Option<Expr>> {
    let resolver = ctx.resolver();
    let op = normalize(leaf)?;

    match resolver.describe(column)? {
        ColumnDescriptor::Plain(column) => compare(ctx, &Field::column(scope, column), op, leaf),
        ColumnDescriptor::Relation { column, .. } => relation_leaf(ctx, scope, column, op, leaf),
        ColumnDescriptor::Lookup { column, .. } => lookup_leaf(ctx, scope, column, op, leaf),
        ColumnDescriptor::Rollup {
            column,
            target,
            function,
            ..
        } => {
            let expr = build_rollup_expr(resolver, column, &scope.qualifier, ctx.aliases())?;
            let kind = match function {
                RollupFunction::Min | RollupFunction::Max => FieldKind::of(&target.uidt),
                f if f.is_numeric() => FieldKind::Numeric,
                _ => FieldKind::Text,
            };
            compare(ctx, &Field::new(expr, kind, &column.title), op, leaf)
        }
        ColumnDescriptor::Formula { column, options } => {
            let expr = if options.error.is_some() {
                ctx.error_literal()
            } else {
                formula::compile_column(ctx, scope, column)?
            };
            let kind = options
                .ast()
                .ok()
                .filter(|_| options.error.is_none())
                .and_then(|tree| {
                    formula_kind(resolver, &scope.table.id, &tree, &mut vec![column.id.clone()])
                })
                .unwrap_or(if leaf.value.as_number().is_some() {
                    FieldKind::Numeric
                } else {
                    FieldKind::Text
                });
            compare(ctx, &Field::new(expr, kind, &column.title), op, leaf)
        }
    }
}

/// Kind of a formula's value, read from the root of its tree. `None` when
/// the root does not settle it.
///
/// `seen` holds the formula columns already followed through identifiers.
fn formula_kind(
    resolver: &dyn ColumnResolver,
    table_id: &str,
    node: &FormulaNode,
    seen: &mut Vec<String>,
) -> Option<FieldKind> {
    match node {
        FormulaNode::Literal { value } => match value {
            LiteralValue::Int(_) | LiteralValue::Float(_) => Some(FieldKind::Numeric),
            LiteralValue::Text(_) => Some(FieldKind::Text),
            _ => None,
        },
        FormulaNode::BinaryExpression { operator, .. } => match operator {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                Some(FieldKind::Numeric)
            }
            BinaryOp::Concat => Some(FieldKind::Text),
            _ => None,
        },
        FormulaNode::UnaryExpression {
            operator: UnaryOp::Minus | UnaryOp::Plus,
            ..
        } => Some(FieldKind::Numeric),
        FormulaNode::UnaryExpression { .. } => None,
        FormulaNode::CallExpression { callee, .. } => match callee.name.to_uppercase().as_str() {
            "ADD" | "SUM" | "MOD" | "AVG" | "INT" | "VALUE" | "LEN" | "ABS" | "FLOOR" | "ROUND"
            | "SQRT" | "EXP" | "LOG" | "POWER" | "CEILING" | "SEARCH" | "WEEKDAY"
            | "DATETIME_DIFF" => Some(FieldKind::Numeric),
            "CONCAT" | "URL" | "UPPER" | "LOWER" | "TRIM" | "REPLACE" | "MID" | "SUBSTR"
            | "LEFT" | "RIGHT" | "REPEAT" => Some(FieldKind::Text),
            _ => None,
        },
        FormulaNode::Identifier { name } => {
            let column = resolver.column(table_id, name).ok()?;
            match &column.kind {
                ColumnKind::Plain => Some(FieldKind::of(&column.uidt)),
                ColumnKind::Formula(options) if !seen.contains(&column.id) => {
                    seen.push(column.id.clone());
                    formula_kind(resolver, table_id, &options.ast().ok()?, seen)
                }
                _ => None,
            }
        }
    }
}

// ============================================================================
// Operator normalization
// ============================================================================

/// Rewrite `is`/`isnot` into the emptiness operator their value names.
fn normalize(leaf: &FilterLeaf) -> CompileResult<ComparisonOp> {
    match leaf.op {
        ComparisonOp::Is | ComparisonOp::Isnot => {
            let value = leaf.value.as_text().unwrap_or_default().trim().to_lowercase();
            let op = match value.as_str() {
                "null" => ComparisonOp::Null,
                "notnull" => ComparisonOp::Notnull,
                "empty" => ComparisonOp::Empty,
                "notempty" => ComparisonOp::Notempty,
                "blank" => ComparisonOp::Blank,
                "notblank" => ComparisonOp::Notblank,
                other => {
                    return Err(CompileError::InvalidFilter(format!(
                        "'{}' is not a valid value for {} on column {}",
                        other, leaf.op, leaf.column
                    )))
                }
            };
            Ok(if leaf.op == ComparisonOp::Isnot {
                invert_emptiness(op)
            } else {
                op
            })
        }
        op => Ok(op),
    }
}

fn invert_emptiness(op: ComparisonOp) -> ComparisonOp {
    match op {
        ComparisonOp::Null => ComparisonOp::Notnull,
        ComparisonOp::Notnull => ComparisonOp::Null,
        ComparisonOp::Empty => ComparisonOp::Notempty,
        ComparisonOp::Notempty => ComparisonOp::Empty,
        ComparisonOp::Blank => ComparisonOp::Notblank,
        ComparisonOp::Notblank => ComparisonOp::Blank,
        other => other,
    }
}

fn is_emptiness(op: ComparisonOp) -> bool {
    matches!(
        op,
        ComparisonOp::Null
            | ComparisonOp::Notnull
            | ComparisonOp::Empty
            | ComparisonOp::Notempty
            | ComparisonOp::Blank
            | ComparisonOp::Notblank
    )
}

/// Positive operator and whether the result must be negated.
///
/// Negative operators on traversed columns mean "no related row matches",
/// so they compile as `NOT IN` over the positive form.
fn positive_form(op: ComparisonOp) -> (ComparisonOp, bool) {
    match op {
        ComparisonOp::Neq => (ComparisonOp::Eq, true),
        ComparisonOp::Nlike => (ComparisonOp::Like, true),
        ComparisonOp::Nanyof => (ComparisonOp::Anyof, true),
        ComparisonOp::Nallof => (ComparisonOp::Allof, true),
        ComparisonOp::Nbtw => (ComparisonOp::Btw, true),
        ComparisonOp::Notchecked => (ComparisonOp::Checked, true),
        ComparisonOp::Blank => (ComparisonOp::Notblank, true),
        ComparisonOp::Empty => (ComparisonOp::Notempty, true),
        ComparisonOp::Null => (ComparisonOp::Notnull, true),
        other => (other, false),
    }
}

/// SQL operator of an ordering or equality comparison.
pub(crate) fn comparison_operator(op: ComparisonOp) -> Option<BinaryOperator> {
    match op {
        ComparisonOp::Eq => Some(BinaryOperator::Eq),
        ComparisonOp::Neq => Some(BinaryOperator::Ne),
        ComparisonOp::Gt => Some(BinaryOperator::Gt),
        ComparisonOp::Ge => Some(BinaryOperator::Gte),
        ComparisonOp::Lt => Some(BinaryOperator::Lt),
        ComparisonOp::Le => Some(BinaryOperator::Lte),
        _ => None,
    }
}

// ============================================================================
// Comparisons
// ============================================================================

/// Compare a field with a leaf's value. `None` when the leaf is skipped.
pub(crate) fn compare(
    ctx: &CompileContext,
    field: &Field,
    op: ComparisonOp,
    leaf: &FilterLeaf,
) -> CompileResult<Option<Expr>> {
    if matches!(field.kind, FieldKind::Date | FieldKind::DateTime) {
        return date::compare_date(ctx, field, op, leaf);
    }

    // A sub-operator on a non-date column stands in for the value.
    let value = match (&leaf.sub_op, leaf.value.is_empty()) {
        (Some(sub_op), true) => FilterValue::text(sub_op.as_str()),
        _ => leaf.value.clone(),
    };
    let dialect = ctx.dialect();
    let f = field.expr.clone();
    let numeric = field.kind == FieldKind::Numeric;

    let expr = match op {
        ComparisonOp::Eq => {
            if value.is_empty() {
                blank(field)
            } else if numeric {
                let n = number(&value, field)?;
                if n.is_zero() {
                    f.clone().eq(number_param(n)).or(f.is_null()).paren()
                } else {
                    f.eq(number_param(n))
                }
            } else if field.kind == FieldKind::Boolean {
                if boolean(&value, field)? {
                    f.eq(lit_bool(true))
                } else {
                    f.clone().eq(lit_bool(false)).or(f.is_null()).paren()
                }
            } else if dialect == Dialect::MySql {
                // Case-sensitive equality
                cast(f, "BINARY").eq(text_param(&value))
            } else {
                f.eq(text_param(&value))
            }
        }
        ComparisonOp::Neq => {
            if value.is_empty() {
                not_blank(field)
            } else if numeric {
                let n = number(&value, field)?;
                if n.is_zero() {
                    f.clone().ne(number_param(n)).and(f.is_not_null()).paren()
                } else {
                    f.clone().ne(number_param(n)).or(f.is_null()).paren()
                }
            } else if field.kind == FieldKind::Boolean {
                let b = boolean(&value, field)?;
                f.clone().ne(lit_bool(b)).or(f.is_null()).paren()
            } else {
                f.clone().ne(text_param(&value)).or(f.is_null()).paren()
            }
        }
        ComparisonOp::Like | ComparisonOp::Nlike => {
            let negated = op == ComparisonOp::Nlike;
            if value.is_empty() {
                match (field.kind.is_textual(), negated) {
                    (true, false) => f.eq(lit_str("")),
                    (true, true) => f.clone().ne(lit_str("")).and(f.is_not_null()).paren(),
                    (false, false) => f.is_null(),
                    (false, true) => f.is_not_null(),
                }
            } else {
                let text = text_value(&value);
                let pattern = if text.contains('%') {
                    text
                } else {
                    format!("%{}%", text)
                };
                let target = if numeric || dialect == Dialect::Postgres {
                    cast(f.clone(), dialect.text_type())
                } else {
                    f.clone()
                };
                let like = like_expr(target, param(pattern), negated);
                if negated {
                    like.or(f.is_null()).paren()
                } else {
                    like
                }
            }
        }
        ComparisonOp::In => {
            let items = value.items();
            if items.is_empty() {
                return Ok(None);
            }
            let values = items
                .iter()
                .map(|item| item_param(item, numeric, field))
                .collect::<CompileResult<Vec<_>>>()?;
            f.in_list(values)
        }
        ComparisonOp::Null => f.is_null(),
        ComparisonOp::Notnull => f.is_not_null(),
        ComparisonOp::Empty => {
            if field.kind.is_textual() {
                f.eq(lit_str(""))
            } else {
                f.is_null()
            }
        }
        ComparisonOp::Notempty => {
            if field.kind.is_textual() {
                f.clone().ne(lit_str("")).and(f.is_not_null()).paren()
            } else {
                f.is_not_null()
            }
        }
        ComparisonOp::Blank => blank(field),
        ComparisonOp::Notblank => not_blank(field),
        ComparisonOp::Checked => f.eq(lit_bool(true)),
        ComparisonOp::Notchecked => f.clone().eq(lit_bool(false)).or(f.is_null()).paren(),
        ComparisonOp::Btw | ComparisonOp::Nbtw => {
            let items = value.items();
            let [low, high] = items.as_slice() else {
                return Err(CompileError::InvalidFilter(format!(
                    "{} on column {} expects two values, got {}",
                    op,
                    field.name,
                    items.len()
                )));
            };
            let low = item_param(low, numeric, field)?;
            let high = item_param(high, numeric, field)?;
            if op == ComparisonOp::Btw {
                f.between(low, high)
            } else {
                f.not_between(low, high)
            }
        }
        ComparisonOp::Allof | ComparisonOp::Anyof | ComparisonOp::Nallof | ComparisonOp::Nanyof => {
            let padded = padded_list(dialect, f.clone());
            let matches = value.items().into_iter().map(|item| {
                like_expr(padded.clone(), param(format!("%,{},%", item)), false)
            });
            let combined = match op {
                ComparisonOp::Allof | ComparisonOp::Nallof => Expr::and_all(matches),
                _ => Expr::or_all(matches),
            };
            let Some(combined) = combined else {
                return Ok(None);
            };
            match op {
                ComparisonOp::Allof | ComparisonOp::Anyof => combined,
                _ => negate(combined).or(f.is_null()).paren(),
            }
        }
        ComparisonOp::Gt | ComparisonOp::Ge | ComparisonOp::Lt | ComparisonOp::Le => {
            if value.is_empty() {
                return Ok(None);
            }
            let rhs = if numeric {
                number_param(number(&value, field)?)
            } else {
                text_param(&value)
            };
            match comparison_operator(op) {
                Some(operator) => f.binary(operator, rhs),
                None => return Err(field.unsupported(op)),
            }
        }
        ComparisonOp::IsWithin | ComparisonOp::Is | ComparisonOp::Isnot => {
            return Err(field.unsupported(op))
        }
    };

    Ok(Some(expr))
}

fn blank(field: &Field) -> Expr {
    let f = field.expr.clone();
    if field.kind.is_textual() {
        f.clone().is_null().or(f.eq(lit_str(""))).paren()
    } else {
        f.is_null()
    }
}

fn not_blank(field: &Field) -> Expr {
    let f = field.expr.clone();
    if field.kind.is_textual() {
        f.clone().is_not_null().and(f.ne(lit_str(""))).paren()
    } else {
        f.is_not_null()
    }
}

fn like_expr(target: Expr, pattern: Expr, negated: bool) -> Expr {
    if negated {
        target.not_ilike(pattern)
    } else {
        target.ilike(pattern)
    }
}

/// `',' || col || ','`, so `%,item,%` matches whole list items.
fn padded_list(dialect: Dialect, f: Expr) -> Expr {
    match dialect {
        Dialect::Postgres | Dialect::Sqlite => lit_str(",")
            .concat(cast(f, dialect.text_type()))
            .concat(lit_str(","))
            .paren(),
        Dialect::MySql | Dialect::MsSql => func("CONCAT", vec![lit_str(","), f, lit_str(",")]),
    }
}

fn text_value(value: &FilterValue) -> String {
    value
        .as_text()
        .unwrap_or_else(|| value.items().join(","))
}

fn text_param(value: &FilterValue) -> Expr {
    param(text_value(value))
}

fn number(value: &FilterValue, field: &Field) -> CompileResult<Number> {
    value.as_number().ok_or_else(|| {
        CompileError::InvalidFilter(format!(
            "'{}' is not a number for column {}",
            text_value(value),
            field.name
        ))
    })
}

fn number_param(n: Number) -> Expr {
    match n {
        Number::Int(i) => param(i),
        Number::Float(f) => param(f),
    }
}

fn item_param(item: &str, numeric: bool, field: &Field) -> CompileResult<Expr> {
    if numeric {
        Number::parse(item).map(number_param).ok_or_else(|| {
            CompileError::InvalidFilter(format!(
                "'{}' is not a number for column {}",
                item, field.name
            ))
        })
    } else {
        Ok(param(item.to_string()))
    }
}

fn boolean(value: &FilterValue, field: &Field) -> CompileResult<bool> {
    let parsed = match value {
        FilterValue::Bool(b) => Some(*b),
        FilterValue::Int(n) => Some(*n != 0),
        other => match text_value(other).trim().to_lowercase().as_str() {
            "true" | "1" | "checked" => Some(true),
            "false" | "0" | "unchecked" => Some(false),
            _ => None,
        },
    };
    parsed.ok_or_else(|| {
        CompileError::InvalidFilter(format!(
            "'{}' is not a boolean for column {}",
            text_value(value),
            field.name
        ))
    })
}

// ============================================================================
// Traversed columns
// ============================================================================

/// `outer_key [NOT] IN (query WHERE cond)`.
///
/// The negated form excludes NULL keys from the subquery and, for
/// single-valued traversals, keeps outer rows without a related row.
fn membership(traversal: &Traversal, query: Query, cond: Expr, negated: bool) -> Expr {
    let outer = traversal.outer_key.clone();
    if !negated {
        return outer.in_subquery(query.filter(cond), false);
    }
    let query = query
        .filter(cond)
        .filter(traversal.inner_key.clone().is_not_null());
    let not_in = outer.clone().in_subquery(query, true);
    if traversal.multi_valued() {
        not_in
    } else {
        not_in.or(outer.is_null()).paren()
    }
}

fn relation_leaf<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    column: &'a Column,
    op: ComparisonOp,
    leaf: &FilterLeaf,
) -> CompileResult<Option<Expr>> {
    let resolver = ctx.resolver();
    let traversal = plan_traversal(resolver, column, &scope.qualifier, ctx.aliases())?;

    if is_emptiness(op) {
        let empty = matches!(
            op,
            ComparisonOp::Null | ComparisonOp::Empty | ComparisonOp::Blank
        );
        let expr = if traversal.multi_valued() {
            let related = Expr::Subquery(Box::new(traversal.count_query()));
            if empty {
                related.eq(lit_int(0))
            } else {
                related.ne(lit_int(0))
            }
        } else if empty {
            traversal.outer_key.clone().is_null()
        } else {
            traversal.outer_key.clone().is_not_null()
        };
        return Ok(Some(expr));
    }

    let (positive, negated) = positive_form(op);
    let related = resolver.table(&traversal.related_table_id)?;
    let display = display_column(related)?;
    let inner = Scope::new(related, traversal.qualifier());
    let positive_leaf = FilterLeaf {
        op: positive,
        ..leaf.clone()
    };

    let Some(cond) = compile_column_leaf(ctx, &inner, display, &positive_leaf)? else {
        return Ok(None);
    };
    Ok(Some(membership(&traversal, traversal.key_query(), cond, negated)))
}

fn lookup_leaf<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    column: &'a Column,
    op: ComparisonOp,
    leaf: &FilterLeaf,
) -> CompileResult<Option<Expr>> {
    let resolver = ctx.resolver();
    let (positive, negated) = positive_form(op);

    let (relation_column, mut target) = resolver.lookup_target(column)?;
    let first = plan_traversal(resolver, relation_column, &scope.qualifier, ctx.aliases())?;
    let mut query = first.key_query();
    let mut qualifier = first.qualifier().to_string();
    let mut table = resolver.table(&first.related_table_id)?;
    let mut visited = vec![column.id.clone()];

    // Later hops join onto the first one's subquery.
    while matches!(target.kind, ColumnKind::Lookup(_)) {
        if visited.contains(&target.id) {
            return Err(CompileError::CircularLookupReference(target.title.clone()));
        }
        visited.push(target.id.clone());

        let (hop_relation, next) = resolver.lookup_target(target)?;
        let hop = plan_traversal(resolver, hop_relation, &qualifier, ctx.aliases())?;
        query = hop.append_joins(query);
        qualifier = hop.qualifier().to_string();
        table = resolver.table(&hop.related_table_id)?;
        target = next;
    }

    let inner = Scope::new(table, &qualifier);
    let positive_leaf = FilterLeaf {
        op: positive,
        ..leaf.clone()
    };
    let Some(cond) = compile_column_leaf(ctx, &inner, target, &positive_leaf)? else {
        return Ok(None);
    };
    Ok(Some(membership(&first, query, cond, negated)))
}
