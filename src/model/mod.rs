//! Table, column and relation metadata consumed by the compilers.

pub mod column;
pub mod relation;
pub mod schema;
pub mod table;

pub use column::{
    Column, ColumnKind, FormulaOptions, LookupOptions, RollupFunction, RollupOptions, UiType,
};
pub use relation::{Association, Relation, RelationType};
pub use schema::{Schema, SchemaDef};
pub use table::Table;
