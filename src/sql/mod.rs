//! SQL generation module.
//!
//! This module provides a type-safe SQL builder that renders fragments for
//! Postgres, MySQL, SQLite and MSSQL. It includes:
//!
//! - [`query`] - SELECT query builder used for correlated subqueries
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types, inline serialization and placeholder rendering
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;

// Re-export commonly used types at the sql module level
pub use dialect::{DateUnit, Dialect, SqlDialect};
pub use expr::{
    avg, avg_distinct, cast, coalesce, col, count, count_distinct, func, lit_bool, lit_float,
    lit_int, lit_null, lit_str, max, min, param, star, sum, sum_distinct, table_col,
    BinaryOperator, Expr, ExprExt, Literal, UnaryOperator,
};
pub use query::{Join, OrderByExpr, Query, SelectExpr, SortDir, TableRef};
pub use token::{RenderedSql, Token, TokenStream};
