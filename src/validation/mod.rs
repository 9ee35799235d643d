//! Validation of schema snapshots.
//!
//! Catches what would otherwise surface mid-compile: dangling ids,
//! many-to-many relations without a junction table, and cycles through
//! lookups or formulas.

use std::collections::HashSet;

use crate::error::CompileError;
use crate::model::{Column, ColumnKind, RelationType, Schema};

/// Validate a schema, collecting every problem found.
pub fn validate(schema: &Schema) -> Result<(), Vec<CompileError>> {
    let mut errors = Vec::new();

    validate_references(schema, &mut errors);
    validate_lookup_cycles(schema, &mut errors);
    validate_formula_cycles(schema, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require_column(schema: &Schema, owner: &Column, id: &str, errors: &mut Vec<CompileError>) {
    if schema.column_by_id(id).is_none() {
        errors.push(CompileError::InvalidSchema(format!(
            "column '{}' references missing column '{}'",
            owner.title, id
        )));
    }
}

fn validate_references(schema: &Schema, errors: &mut Vec<CompileError>) {
    for column in schema.columns() {
        match &column.kind {
            ColumnKind::Plain => {}
            ColumnKind::Relation(relation) => {
                if schema.table_by_id(&relation.related_table_id).is_none() {
                    errors.push(CompileError::InvalidSchema(format!(
                        "relation '{}' references missing table '{}'",
                        column.title, relation.related_table_id
                    )));
                }
                require_column(schema, column, &relation.child_column_id, errors);
                require_column(schema, column, &relation.parent_column_id, errors);

                match (&relation.relation_type, &relation.association) {
                    (RelationType::ManyToMany, None) => {
                        errors.push(CompileError::InvalidSchema(format!(
                            "many-to-many relation '{}' has no junction table",
                            column.title
                        )));
                    }
                    (RelationType::ManyToMany, Some(assoc)) => {
                        if schema.table_by_id(&assoc.table_id).is_none() {
                            errors.push(CompileError::InvalidSchema(format!(
                                "relation '{}' references missing junction table '{}'",
                                column.title, assoc.table_id
                            )));
                        }
                        require_column(schema, column, &assoc.child_column_id, errors);
                        require_column(schema, column, &assoc.parent_column_id, errors);
                    }
                    (_, Some(_)) => {
                        errors.push(CompileError::InvalidSchema(format!(
                            "{} relation '{}' must not have a junction table",
                            relation.relation_type, column.title
                        )));
                    }
                    (_, None) => {}
                }
            }
            ColumnKind::Lookup(opts) => {
                require_column(schema, column, &opts.relation_column_id, errors);
                require_column(schema, column, &opts.lookup_column_id, errors);
            }
            ColumnKind::Rollup(opts) => {
                require_column(schema, column, &opts.relation_column_id, errors);
                require_column(schema, column, &opts.rollup_column_id, errors);
            }
            ColumnKind::Formula(opts) => {
                if opts.error.is_none() {
                    if let Err(e) = opts.ast() {
                        errors.push(e);
                    }
                }
            }
        }
    }
}

fn validate_lookup_cycles(schema: &Schema, errors: &mut Vec<CompileError>) {
    for column in schema.columns() {
        if !matches!(column.kind, ColumnKind::Lookup(_)) {
            continue;
        }

        let mut seen = HashSet::new();
        let mut current = column;
        while let ColumnKind::Lookup(opts) = &current.kind {
            if !seen.insert(current.id.as_str()) {
                errors.push(CompileError::CircularLookupReference(column.title.clone()));
                break;
            }
            match schema.column_by_id(&opts.lookup_column_id) {
                Some(next) => current = next,
                None => break,
            }
        }
    }
}

/// Formula columns a column depends on directly: formulas it names, and
/// formulas at the end of lookups and rollups it names.
fn formula_dependencies<'a>(schema: &'a Schema, column: &'a Column) -> Vec<&'a Column> {
    let ColumnKind::Formula(opts) = &column.kind else {
        return Vec::new();
    };
    let Ok(ast) = opts.ast() else {
        return Vec::new();
    };
    let Some(table) = schema.table_by_id(&column.table_id) else {
        return Vec::new();
    };

    let mut deps = Vec::new();
    for name in ast.identifiers() {
        let mut current = table.column(name);
        let mut hops = 0;
        while let Some(referent) = current {
            match &referent.kind {
                ColumnKind::Formula(_) => {
                    deps.push(referent);
                    break;
                }
                ColumnKind::Lookup(o) if hops < 32 => {
                    current = schema.column_by_id(&o.lookup_column_id);
                }
                ColumnKind::Rollup(o) if hops < 32 => {
                    current = schema.column_by_id(&o.rollup_column_id);
                }
                _ => break,
            }
            hops += 1;
        }
    }
    deps
}

fn validate_formula_cycles(schema: &Schema, errors: &mut Vec<CompileError>) {
    let mut reported: HashSet<&str> = HashSet::new();

    for column in schema.columns() {
        if !matches!(column.kind, ColumnKind::Formula(_)) || reported.contains(column.id.as_str()) {
            continue;
        }
        let mut path = Vec::new();
        if let Some(cycle) = find_formula_cycle(schema, column, &mut path) {
            for c in &cycle {
                reported.insert(c.id.as_str());
            }
            errors.push(CompileError::CircularFormulaReference(
                cycle.iter().map(|c| c.title.clone()).collect(),
            ));
        }
    }
}

fn find_formula_cycle<'a>(
    schema: &'a Schema,
    column: &'a Column,
    path: &mut Vec<&'a Column>,
) -> Option<Vec<&'a Column>> {
    if let Some(start) = path.iter().position(|c| c.id == column.id) {
        let mut cycle = path[start..].to_vec();
        cycle.push(column);
        return Some(cycle);
    }

    path.push(column);
    for dep in formula_dependencies(schema, column) {
        if let Some(cycle) = find_formula_cycle(schema, dep, path) {
            return Some(cycle);
        }
    }
    path.pop();
    None
}
