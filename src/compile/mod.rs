//! Compilers from filters, sorts and formulas to SQL fragments.
//!
//! ```text
//! Filter tree / where DSL ──┐
//! Sort specs ───────────────┼─→ CompileContext ─→ Expr / OrderByExpr
//! Formula tree ─────────────┘        │
//!                                    ├─ ColumnResolver (metadata)
//!                                    └─ AliasCounter (one per call)
//! ```
//!
//! Every public entry point takes a [`CompileContext`], which owns the
//! per-call state: alias counter, formula memo and cycle tracking.

mod condition;
mod context;
mod date;
mod dry_run;
mod formula;
mod functions;
mod lookup;
mod sort;

pub use condition::{compile_filter, compile_where, CompiledFilter};
pub use context::{
    CompileContext, CompileOptions, FormulaErrorSink, DEFAULT_DATE_FORMAT, DEFAULT_ERROR_LITERAL,
};
pub use dry_run::{dry_run, validate_formula_column};
pub use formula::{compile_formula, compile_formula_column};
pub use lookup::{compile_value, AggregateHint};
pub use sort::{compile_sort, compile_sort_str};
