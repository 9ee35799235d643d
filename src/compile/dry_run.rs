//! Formula validation.
//!
//! A compiled formula is wrapped in a `SELECT` and parsed with sqlparser in
//! the target dialect before it is accepted. The outcome is reported to the
//! context's [`FormulaErrorSink`](super::FormulaErrorSink).

use log::warn;
use sqlparser::dialect::{MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use super::context::CompileContext;
use super::formula::compile_definition;
use crate::error::{CompileError, CompileResult};
use crate::model::ColumnKind;
use crate::sql::{Dialect, Expr, Query, SelectExpr, TableRef};

/// Check that `SELECT expr FROM table` parses in `dialect`.
pub fn dry_run(expr: &Expr, from: TableRef, dialect: Dialect) -> Result<(), String> {
    let sql = Query::new()
        .select(vec![SelectExpr::new(expr.clone()).with_alias("v")])
        .from(from)
        .to_sql(dialect);

    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::MsSql => Box::new(MsSqlDialect {}),
    };

    Parser::parse_sql(&*parser_dialect, &sql)
        .map(|_| ())
        .map_err(|e| format!("invalid SQL for {}: {}\nSQL: {}", dialect, e, sql))
}

/// Compile a formula column's definition and dry-run it.
///
/// Failures are recorded on the column through the error sink and returned
/// as [`CompileError::FormulaCompileError`]. Success clears any recorded
/// error.
pub fn validate_formula_column(ctx: &mut CompileContext, reference: &str) -> CompileResult<Expr> {
    let scope = ctx.root_scope();
    let column = ctx.resolver().column(&scope.table.id, reference)?;
    if !matches!(column.kind, ColumnKind::Formula(_)) {
        return Err(CompileError::InvalidSchema(format!(
            "column '{}' is not a formula column",
            column.title
        )));
    }

    let dialect = ctx.dialect();
    let outcome = compile_definition(ctx, &scope, column).and_then(|expr| {
        if ctx.options().dry_run {
            let from = if scope.qualifier == scope.table.table_name {
                TableRef::new(&scope.table.table_name)
            } else {
                TableRef::new(&scope.table.table_name).with_alias(&scope.qualifier)
            };
            dry_run(&expr, from, dialect).map_err(CompileError::InvalidFormula)?;
        }
        Ok(expr)
    });

    match outcome {
        Ok(expr) => {
            if let Some(sink) = ctx.error_sink() {
                sink.clear_error(column);
            }
            Ok(expr)
        }
        Err(err) => {
            let message = err.to_string();
            warn!("formula column {} failed validation: {}", column.title, message);
            if let Some(sink) = ctx.error_sink() {
                sink.record_error(column, &message);
            }
            Err(CompileError::FormulaCompileError {
                column: column.title.clone(),
                message,
            })
        }
    }
}
