//! Async metadata sources.
//!
//! Compilation is synchronous, so metadata held behind an async API is
//! snapshotted into a [`Schema`] first: [`load_schema`] fetches the
//! requested tables plus everything their relations reach.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::CompileError;
use crate::model::{ColumnKind, Schema, Table};
use crate::sql::Dialect;
use crate::validation;

/// Errors raised while loading metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("Metadata source unavailable: {0}")]
    Unavailable(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Invalid schema: {}", format_errors(.0))]
    Invalid(Vec<CompileError>),
}

fn format_errors(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Trait for fetching table metadata from wherever it lives.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Dialect of the database the tables live in.
    async fn dialect(&self) -> MetadataResult<Dialect>;

    /// Ids of every table the source knows.
    async fn list_table_ids(&self) -> MetadataResult<Vec<String>>;

    /// Complete metadata for one table.
    async fn get_table(&self, table_id: &str) -> MetadataResult<Table>;

    /// Batch fetch multiple tables.
    ///
    /// Default implementation fetches tables in parallel using `join_all`.
    async fn get_tables_batch(&self, table_ids: &[String]) -> MetadataResult<Vec<Table>> {
        let futures: Vec<_> = table_ids.iter().map(|id| self.get_table(id)).collect();

        let results = futures::future::join_all(futures).await;

        results.into_iter().collect()
    }
}

/// Snapshot `roots` and every table reachable through their relations.
///
/// An empty `roots` loads every table the source lists. The snapshot is
/// validated before it is returned.
pub async fn load_schema(source: &dyn MetadataSource, roots: &[String]) -> MetadataResult<Schema> {
    let dialect = source.dialect().await?;

    let mut pending: Vec<String> = if roots.is_empty() {
        source.list_table_ids().await?
    } else {
        roots.to_vec()
    };
    let mut seen: HashSet<String> = pending.iter().cloned().collect();
    let mut tables = Vec::new();

    while !pending.is_empty() {
        log::debug!("fetching {} table(s)", pending.len());
        let batch = source.get_tables_batch(&pending).await?;

        pending = Vec::new();
        for table in &batch {
            for id in referenced_tables(table) {
                if seen.insert(id.to_string()) {
                    pending.push(id.to_string());
                }
            }
        }
        tables.extend(batch);
    }

    let schema = Schema::new(dialect, tables);
    validation::validate(&schema).map_err(MetadataError::Invalid)?;
    Ok(schema)
}

/// Tables a table's relation columns point at, junction tables included.
fn referenced_tables(table: &Table) -> Vec<&str> {
    let mut ids = Vec::new();
    for column in &table.columns {
        if let ColumnKind::Relation(relation) = &column.kind {
            ids.push(relation.related_table_id.as_str());
            if let Some(assoc) = &relation.association {
                ids.push(assoc.table_id.as_str());
            }
        }
    }
    ids
}
