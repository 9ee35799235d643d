//! Error types shared by the resolver, planner and compilers.

use thiserror::Error;

/// Errors that can occur while compiling filters, sorts and formulas.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Unsupported relation type '{relation_type}' on column {column}")]
    UnsupportedRelationType {
        column: String,
        relation_type: String,
    },

    #[error("Circular lookup reference through column {0}")]
    CircularLookupReference(String),

    #[error("Circular formula reference: {}", .0.join(" -> "))]
    CircularFormulaReference(Vec<String>),

    #[error("Formula column {column} failed to compile: {message}")]
    FormulaCompileError { column: String, message: String },

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Operator '{op}' is not supported on column {column}")]
    UnsupportedOperator { op: String, column: String },

    #[error("Invalid formula: {0}")]
    InvalidFormula(String),

    #[error("Invalid where clause at {start}..{end}: {message}")]
    WhereParse {
        start: usize,
        end: usize,
        message: String,
    },

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),
}

pub type CompileResult<T> = Result<T, CompileError>;

impl CompileError {
    pub(crate) fn unsupported_relation(column: &str, relation_type: impl ToString) -> Self {
        CompileError::UnsupportedRelationType {
            column: column.to_string(),
            relation_type: relation_type.to_string(),
        }
    }
}
