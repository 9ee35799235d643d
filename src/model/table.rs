//! Table metadata.

use serde::{Deserialize, Serialize};

use super::column::{Column, ColumnKind};

/// A table and its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub title: String,
    /// Physical table name.
    pub table_name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(id: &str, title: &str, table_name: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            table_name: table_name.to_string(),
            columns: Vec::new(),
        }
    }

    /// Add a column (builder pattern).
    pub fn with_column(mut self, mut column: Column) -> Self {
        column.table_id = self.id.clone();
        self.columns.push(column);
        self
    }

    /// Find a column by id, title or physical name, in that order.
    pub fn column(&self, reference: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.id == reference)
            .or_else(|| self.columns.iter().find(|c| c.title == reference))
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| !c.column_name.is_empty() && c.column_name == reference)
            })
    }

    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Column shown when rows of this table are referenced from elsewhere.
    ///
    /// The flagged display column wins; otherwise the first physical
    /// non-key column, falling back to the primary key.
    pub fn display_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.display_value)
            .or_else(|| {
                self.columns
                    .iter()
                    .find(|c| matches!(c.kind, ColumnKind::Plain) && !c.primary_key)
            })
            .or_else(|| self.primary_key())
    }
}
