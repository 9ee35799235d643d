//! Rollup aggregation subqueries.

use super::alias::AliasCounter;
use super::join::plan_traversal;
use crate::error::{CompileError, CompileResult};
use crate::model::{Column, ColumnKind, RelationType};
use crate::resolve::ColumnResolver;
use crate::sql::{table_col, Expr};

/// Build the correlated scalar subquery aggregating a rollup column's target
/// over the related rows of the outer row qualified by `outer`.
///
/// Only has-many and many-to-many relations can be rolled up.
pub fn build_rollup_expr(
    resolver: &dyn ColumnResolver,
    rollup_column: &Column,
    outer: &str,
    aliases: &mut AliasCounter,
) -> CompileResult<Expr> {
    let (relation_column, target, function) = resolver.rollup_target(rollup_column)?;
    let relation = resolver.relation(relation_column)?;

    match &relation.relation_type {
        RelationType::HasMany | RelationType::ManyToMany => {}
        other => return Err(CompileError::unsupported_relation(&rollup_column.title, other)),
    }

    if !matches!(target.kind, ColumnKind::Plain) {
        return Err(CompileError::InvalidSchema(format!(
            "rollup '{}' targets {} column '{}'",
            rollup_column.title,
            target.kind.name(),
            target.title
        )));
    }

    let traversal = plan_traversal(resolver, relation_column, outer, aliases)?;
    let value = table_col(traversal.qualifier(), &target.column_name);
    let aggregate = function.apply(value, resolver.dialect());

    Ok(Expr::Subquery(Box::new(
        traversal.correlated_query(vec![aggregate]),
    )))
}
