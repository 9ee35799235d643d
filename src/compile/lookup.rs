//! Scalar values of virtual columns.
//!
//! A lookup or relation used as a value (in a sort key or a formula)
//! compiles to one correlated scalar subquery per single-valued hop, each
//! nested inside the previous one. From the first multi-valued hop on, the
//! rest of the chain is joined into that hop's subquery and the final value
//! is aggregated once, with the [`AggregateHint`] of the surrounding
//! expression. An aggregate never wraps a subquery.

use super::context::{CompileContext, Scope};
use super::formula;
use crate::error::{CompileError, CompileResult};
use crate::model::{Column, ColumnKind, Table};
use crate::planner::{build_rollup_expr, plan_traversal};
use crate::resolve::ColumnDescriptor;
use crate::sql::{avg, max, min, sum, table_col, Dialect, Expr, Query, SqlDialect};

/// Aggregate that collapses a multi-valued traversal to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateHint {
    Min,
    Max,
    Sum,
    Avg,
    /// Delimited string of all values.
    #[default]
    Concat,
}

impl AggregateHint {
    /// Hint implied by the function a value is an argument of.
    pub fn for_function(name: &str) -> Self {
        match name.to_uppercase().as_str() {
            "MIN" => AggregateHint::Min,
            "MAX" => AggregateHint::Max,
            "SUM" | "ADD" | "FLOAT" | "NUMBER" | "ARITH" => AggregateHint::Sum,
            "AVG" => AggregateHint::Avg,
            _ => AggregateHint::Concat,
        }
    }

    pub fn apply(self, expr: Expr, dialect: Dialect) -> Expr {
        match self {
            AggregateHint::Min => min(expr),
            AggregateHint::Max => max(expr),
            AggregateHint::Sum => sum(expr),
            AggregateHint::Avg => avg(expr),
            AggregateHint::Concat => dialect.string_agg(expr),
        }
    }
}

/// Compile the value of any column of the context's table.
pub fn compile_value(ctx: &mut CompileContext, reference: &str) -> CompileResult<Expr> {
    let scope = ctx.root_scope();
    let column = ctx.resolver().column(&scope.table.id, reference)?;
    column_value(ctx, &scope, column, AggregateHint::default(), &mut Vec::new())
}

/// Display column of a related table.
pub(crate) fn display_column(table: &Table) -> CompileResult<&Column> {
    table.display_column().ok_or_else(|| {
        CompileError::InvalidSchema(format!("table '{}' has no display column", table.title))
    })
}

/// Value of `column` on rows qualified by `scope`.
///
/// `path` holds the lookup and relation columns being expanded.
pub(crate) fn column_value<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    column: &'a Column,
    hint: AggregateHint,
    path: &mut Vec<String>,
) -> CompileResult<Expr> {
    let resolver = ctx.resolver();
    match resolver.describe(column)? {
        ColumnDescriptor::Plain(column) => Ok(table_col(&scope.qualifier, &column.column_name)),
        ColumnDescriptor::Relation { column, .. } => {
            enter(path, column)?;
            let value = hop_value(ctx, scope, column, None, hint, path);
            path.pop();
            value
        }
        ColumnDescriptor::Lookup {
            column,
            relation_column,
            target,
        } => {
            enter(path, column)?;
            let value = hop_value(ctx, scope, relation_column, Some(target), hint, path);
            path.pop();
            value
        }
        ColumnDescriptor::Rollup { column, .. } => {
            build_rollup_expr(resolver, column, &scope.qualifier, ctx.aliases())
        }
        ColumnDescriptor::Formula { column, .. } => formula::compile_column(ctx, scope, column),
    }
}

fn enter(path: &mut Vec<String>, column: &Column) -> CompileResult<()> {
    if path.contains(&column.id) {
        return Err(CompileError::CircularLookupReference(column.title.clone()));
    }
    path.push(column.id.clone());
    Ok(())
}

/// `(SELECT value FROM related WHERE <correlated>)` across one relation.
/// Without a target the related table's display column is the value.
fn hop_value<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    relation_column: &'a Column,
    target: Option<&'a Column>,
    hint: AggregateHint,
    path: &mut Vec<String>,
) -> CompileResult<Expr> {
    let resolver = ctx.resolver();
    let traversal = plan_traversal(resolver, relation_column, &scope.qualifier, ctx.aliases())?;
    let related = resolver.table(&traversal.related_table_id)?;
    let target = match target {
        Some(target) => target,
        None => display_column(related)?,
    };

    let inner = Scope::new(related, traversal.qualifier());
    let query = if traversal.multi_valued() {
        let (query, value) = flat_value(ctx, traversal.correlated_query(vec![]), inner, target, hint, path)?;
        query.select(vec![value])
    } else {
        let value = column_value(ctx, &inner, target, hint, path)?;
        traversal.correlated_query(vec![value])
    };
    Ok(Expr::Subquery(Box::new(query)))
}

/// Join the rest of a chain below a multi-valued hop onto `query` and
/// aggregate its final value.
///
/// A rollup at the end of the chain applies its own function to the raw
/// target column instead of the hint.
fn flat_value<'a>(
    ctx: &mut CompileContext<'a>,
    mut query: Query,
    mut scope: Scope<'a>,
    mut column: &'a Column,
    hint: AggregateHint,
    path: &mut Vec<String>,
) -> CompileResult<(Query, Expr)> {
    let resolver = ctx.resolver();
    let dialect = ctx.dialect();
    let depth = path.len();

    let value = loop {
        match resolver.describe(column)? {
            ColumnDescriptor::Plain(column) => {
                break hint.apply(table_col(&scope.qualifier, &column.column_name), dialect);
            }
            ColumnDescriptor::Relation {
                column: relation_column,
                related,
                ..
            } => {
                enter(path, relation_column)?;
                let hop = plan_traversal(resolver, relation_column, &scope.qualifier, ctx.aliases())?;
                query = hop.append_joins(query);
                scope = Scope::new(related, hop.qualifier());
                column = display_column(related)?;
            }
            ColumnDescriptor::Lookup {
                column: lookup,
                relation_column,
                target,
            } => {
                enter(path, lookup)?;
                let hop = plan_traversal(resolver, relation_column, &scope.qualifier, ctx.aliases())?;
                query = hop.append_joins(query);
                scope = Scope::new(resolver.table(&hop.related_table_id)?, hop.qualifier());
                column = target;
            }
            ColumnDescriptor::Rollup {
                column: rollup,
                relation_column,
                target,
                function,
            } => {
                let hop = plan_traversal(resolver, relation_column, &scope.qualifier, ctx.aliases())?;
                if !hop.multi_valued() {
                    return Err(CompileError::unsupported_relation(&rollup.title, &hop.relation_type));
                }
                if !matches!(target.kind, ColumnKind::Plain) {
                    return Err(CompileError::InvalidSchema(format!(
                        "rollup '{}' targets {} column '{}'",
                        rollup.title,
                        target.kind.name(),
                        target.title
                    )));
                }
                query = hop.append_joins(query);
                break function.apply(table_col(hop.qualifier(), &target.column_name), dialect);
            }
            ColumnDescriptor::Formula { column, .. } => {
                let value = formula::compile_column(ctx, &scope, column)?;
                break hint.apply(value, dialect);
            }
        }
    };

    path.truncate(depth);
    Ok((query, value))
}
