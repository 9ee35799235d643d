//! # virtcol
//!
//! Compiles filters, sorts and formulas over tables with virtual columns
//! into dialect-specific SQL fragments.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │   Filter tree / where DSL   Sort specs   Formula tree    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [compile]
//! ┌─────────────────────────────────────────────────────────┐
//! │   CompileContext: alias counter, formula memo, cycles    │
//! │   resolve::ColumnResolver (schema metadata)              │
//! │   planner: relation traversals, rollup subqueries        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Expr / OrderByExpr rendered for pg, mysql, sqlite,     │
//! │   mssql with inline literals or bound parameters         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is executed: the output is SQL text plus bound values.

pub mod compile;
pub mod config;
pub mod error;
pub mod filter;
pub mod formula;
pub mod model;
pub mod planner;
pub mod resolve;
pub mod sql;
pub mod validation;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compile::{
        compile_filter, compile_formula, compile_formula_column, compile_sort, compile_sort_str,
        compile_value, compile_where, validate_formula_column, CompileContext, CompileOptions,
        CompiledFilter, FormulaErrorSink,
    };
    pub use crate::error::{CompileError, CompileResult};
    pub use crate::filter::{
        parse_sort, parse_where, ComparisonOp, ComparisonSubOp, Filter, FilterGroup, FilterLeaf,
        FilterValue, LogicalOp, SortSpec,
    };
    pub use crate::formula::{parse_formula, FormulaNode};
    pub use crate::model::{
        Column, ColumnKind, FormulaOptions, LookupOptions, Relation, RelationType, RollupFunction,
        RollupOptions, Schema, Table, UiType,
    };
    pub use crate::resolve::{load_schema, ColumnResolver, MetadataSource};
    pub use crate::sql::{Dialect, Expr, OrderByExpr, Query, RenderedSql, SqlDialect};
}

pub use error::{CompileError, CompileResult};
pub use sql::Dialect;
