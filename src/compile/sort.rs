//! Sort compilation.

use log::debug;

use super::context::{CompileContext, Scope};
use super::formula;
use super::lookup::{column_value, AggregateHint};
use crate::error::{CompileError, CompileResult};
use crate::filter::{parse_sort, SortSpec};
use crate::model::{Column, RelationType};
use crate::planner::build_rollup_expr;
use crate::resolve::ColumnDescriptor;
use crate::sql::{table_col, Expr, OrderByExpr, SortDir, SqlDialect};

/// Compile sort specs into ORDER BY items.
///
/// Sorts on multi-valued relations and on formulas with a persisted error
/// are skipped.
pub fn compile_sort(ctx: &mut CompileContext, specs: &[SortSpec]) -> CompileResult<Vec<OrderByExpr>> {
    let scope = ctx.root_scope();
    let resolver = ctx.resolver();
    let mut order = Vec::with_capacity(specs.len());

    for spec in specs {
        let column = resolver.column(&scope.table.id, &spec.column)?;
        let Some(expr) = sort_expr(ctx, &scope, column)? else {
            continue;
        };
        order.push(match spec.direction {
            SortDir::Asc => OrderByExpr::asc(expr),
            SortDir::Desc => OrderByExpr::desc(expr),
        });
    }

    Ok(order)
}

/// Parse a sort string such as `-Created,Name` and compile it.
pub fn compile_sort_str(ctx: &mut CompileContext, source: &str) -> CompileResult<Vec<OrderByExpr>> {
    compile_sort(ctx, &parse_sort(source))
}

fn sort_expr<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    column: &'a Column,
) -> CompileResult<Option<Expr>> {
    let resolver = ctx.resolver();
    let expr = match resolver.describe(column)? {
        ColumnDescriptor::Plain(column) => {
            let expr = table_col(&scope.qualifier, &column.column_name);
            if column.uidt.is_select() {
                ctx.dialect().option_sort_expr(expr)
            } else {
                expr
            }
        }
        ColumnDescriptor::Relation {
            column, relation, ..
        } => match &relation.relation_type {
            RelationType::BelongsTo => {
                column_value(ctx, scope, column, AggregateHint::default(), &mut Vec::new())?
            }
            RelationType::HasMany | RelationType::ManyToMany => {
                debug!("skipping sort on multi-valued relation {}", column.title);
                return Ok(None);
            }
            RelationType::Unsupported(other) => {
                return Err(CompileError::unsupported_relation(&column.title, other))
            }
        },
        ColumnDescriptor::Lookup { column, .. } => {
            column_value(ctx, scope, column, AggregateHint::default(), &mut Vec::new())?
        }
        ColumnDescriptor::Rollup { column, .. } => {
            build_rollup_expr(resolver, column, &scope.qualifier, ctx.aliases())?
        }
        ColumnDescriptor::Formula { column, options } => {
            if let Some(error) = &options.error {
                debug!("skipping sort on formula {}: {}", column.title, error);
                return Ok(None);
            }
            formula::compile_column(ctx, scope, column)?
        }
    };
    Ok(Some(expr))
}
