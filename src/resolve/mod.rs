//! Column metadata resolution.
//!
//! The compilers never touch a [`Schema`] directly; they ask a
//! [`ColumnResolver`] what a column is. Resolution is a pure lookup with
//! no SQL knowledge.

mod source;

pub use source::{load_schema, MetadataError, MetadataResult, MetadataSource};

use crate::error::{CompileError, CompileResult};
use crate::formula::FormulaNode;
use crate::model::{
    Column, ColumnKind, FormulaOptions, Relation, RollupFunction, Schema, Table,
};
use crate::sql::Dialect;

/// What a column is, with the metadata its kind depends on already resolved.
#[derive(Debug, Clone, Copy)]
pub enum ColumnDescriptor<'a> {
    Plain(&'a Column),
    Relation {
        column: &'a Column,
        relation: &'a Relation,
        related: &'a Table,
    },
    Lookup {
        column: &'a Column,
        relation_column: &'a Column,
        target: &'a Column,
    },
    Rollup {
        column: &'a Column,
        relation_column: &'a Column,
        target: &'a Column,
        function: RollupFunction,
    },
    Formula {
        column: &'a Column,
        options: &'a FormulaOptions,
    },
}

impl<'a> ColumnDescriptor<'a> {
    pub fn column(&self) -> &'a Column {
        match self {
            ColumnDescriptor::Plain(column)
            | ColumnDescriptor::Relation { column, .. }
            | ColumnDescriptor::Lookup { column, .. }
            | ColumnDescriptor::Rollup { column, .. }
            | ColumnDescriptor::Formula { column, .. } => column,
        }
    }
}

/// Read access to table and column metadata.
///
/// Implementors provide the three primitive lookups; everything else has a
/// default built on them.
pub trait ColumnResolver: Send + Sync {
    /// Dialect fragments are compiled for.
    fn dialect(&self) -> Dialect;

    fn table(&self, table_id: &str) -> CompileResult<&Table>;

    fn column_by_id(&self, column_id: &str) -> CompileResult<&Column>;

    /// Find a column of `table_id` by id, title or physical name.
    fn column(&self, table_id: &str, reference: &str) -> CompileResult<&Column> {
        self.table(table_id)?
            .column(reference)
            .ok_or_else(|| CompileError::ColumnNotFound(reference.to_string()))
    }

    /// The relation descriptor of a relation column.
    fn relation<'a>(&'a self, column: &'a Column) -> CompileResult<&'a Relation> {
        match &column.kind {
            ColumnKind::Relation(relation) => Ok(relation),
            other => Err(CompileError::InvalidSchema(format!(
                "column '{}' is a {} column, not a relation",
                column.title,
                other.name()
            ))),
        }
    }

    /// Relation column and far-side target of a lookup column.
    fn lookup_target(&self, column: &Column) -> CompileResult<(&Column, &Column)> {
        let ColumnKind::Lookup(opts) = &column.kind else {
            return Err(not_kind(column, "lookup"));
        };
        let relation_column = self.column_by_id(&opts.relation_column_id)?;
        let target = self.column_by_id(&opts.lookup_column_id)?;
        check_far_side(self, column, relation_column, target)?;
        Ok((relation_column, target))
    }

    /// Relation column, far-side target and aggregate of a rollup column.
    fn rollup_target(&self, column: &Column) -> CompileResult<(&Column, &Column, RollupFunction)> {
        let ColumnKind::Rollup(opts) = &column.kind else {
            return Err(not_kind(column, "rollup"));
        };
        let relation_column = self.column_by_id(&opts.relation_column_id)?;
        let target = self.column_by_id(&opts.rollup_column_id)?;
        check_far_side(self, column, relation_column, target)?;
        Ok((relation_column, target, opts.function))
    }

    /// Parsed formula of a formula column.
    fn formula_ast(&self, column: &Column) -> CompileResult<FormulaNode> {
        match &column.kind {
            ColumnKind::Formula(opts) => opts.ast(),
            _ => Err(not_kind(column, "formula")),
        }
    }

    /// Describe a column together with the metadata its kind depends on.
    fn describe<'a>(&'a self, column: &'a Column) -> CompileResult<ColumnDescriptor<'a>> {
        Ok(match &column.kind {
            ColumnKind::Plain => ColumnDescriptor::Plain(column),
            ColumnKind::Relation(relation) => ColumnDescriptor::Relation {
                column,
                relation,
                related: self.table(&relation.related_table_id)?,
            },
            ColumnKind::Lookup(_) => {
                let (relation_column, target) = self.lookup_target(column)?;
                ColumnDescriptor::Lookup {
                    column,
                    relation_column,
                    target,
                }
            }
            ColumnKind::Rollup(_) => {
                let (relation_column, target, function) = self.rollup_target(column)?;
                ColumnDescriptor::Rollup {
                    column,
                    relation_column,
                    target,
                    function,
                }
            }
            ColumnKind::Formula(options) => ColumnDescriptor::Formula { column, options },
        })
    }

    /// Resolve a column reference of `table_id` and describe it.
    fn resolve<'a>(&'a self, table_id: &str, reference: &str) -> CompileResult<ColumnDescriptor<'a>> {
        let column = self.column(table_id, reference)?;
        self.describe(column)
    }
}

fn not_kind(column: &Column, expected: &str) -> CompileError {
    CompileError::InvalidSchema(format!(
        "column '{}' is a {} column, not a {}",
        column.title,
        column.kind.name(),
        expected
    ))
}

/// The relation must live on the column's table and the target on the
/// relation's far side.
fn check_far_side<R: ColumnResolver + ?Sized>(
    resolver: &R,
    column: &Column,
    relation_column: &Column,
    target: &Column,
) -> CompileResult<()> {
    let relation = resolver.relation(relation_column)?;
    if relation_column.table_id != column.table_id {
        return Err(CompileError::InvalidSchema(format!(
            "column '{}' uses relation '{}' of another table",
            column.title, relation_column.title
        )));
    }
    if target.table_id != relation.related_table_id {
        return Err(CompileError::InvalidSchema(format!(
            "column '{}' targets '{}', which is not on the far side of '{}'",
            column.title, target.title, relation_column.title
        )));
    }
    Ok(())
}

impl ColumnResolver for Schema {
    fn dialect(&self) -> Dialect {
        Schema::dialect(self)
    }

    fn table(&self, table_id: &str) -> CompileResult<&Table> {
        self.table_by_id(table_id)
            .ok_or_else(|| CompileError::TableNotFound(table_id.to_string()))
    }

    fn column_by_id(&self, column_id: &str) -> CompileResult<&Column> {
        Schema::column_by_id(self, column_id)
            .ok_or_else(|| CompileError::ColumnNotFound(column_id.to_string()))
    }
}
