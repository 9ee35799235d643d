//! An immutable snapshot of table and column metadata.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::column::Column;
use super::table::Table;
use crate::sql::Dialect;

/// Serialized form of a [`Schema`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDef {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default)]
    pub tables: Vec<Table>,
}

/// Metadata for every table a compile may touch, indexed by id.
///
/// A schema is read-only once built and can be shared between threads.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "SchemaDef")]
pub struct Schema {
    dialect: Dialect,
    tables: Vec<Table>,
    table_index: HashMap<String, usize>,
    column_index: HashMap<String, (usize, usize)>,
}

impl Schema {
    pub fn new(dialect: Dialect, tables: Vec<Table>) -> Self {
        let mut tables = tables;
        let mut table_index = HashMap::new();
        let mut column_index = HashMap::new();

        for (ti, table) in tables.iter_mut().enumerate() {
            table_index.insert(table.id.clone(), ti);
            for (ci, column) in table.columns.iter_mut().enumerate() {
                column.table_id = table.id.clone();
                column_index.insert(column.id.clone(), (ti, ci));
            }
        }

        log::debug!(
            "schema built: {} tables, {} columns",
            tables.len(),
            column_index.len()
        );

        Self {
            dialect,
            tables,
            table_index,
            column_index,
        }
    }

    /// Parse a schema from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Same metadata, compiled for another dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table_by_id(&self, id: &str) -> Option<&Table> {
        self.table_index.get(id).map(|&i| &self.tables[i])
    }

    /// Find a table by id, title or physical name.
    pub fn find_table(&self, reference: &str) -> Option<&Table> {
        self.table_by_id(reference).or_else(|| {
            self.tables
                .iter()
                .find(|t| t.title == reference || t.table_name == reference)
        })
    }

    pub fn column_by_id(&self, id: &str) -> Option<&Column> {
        self.column_index
            .get(id)
            .map(|&(ti, ci)| &self.tables[ti].columns[ci])
    }

    /// Iterate over every column of every table.
    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.tables.iter().flat_map(|t| t.columns.iter())
    }
}

impl From<SchemaDef> for Schema {
    fn from(def: SchemaDef) -> Self {
        Schema::new(def.dialect, def.tables)
    }
}

impl From<&Schema> for SchemaDef {
    fn from(schema: &Schema) -> Self {
        SchemaDef {
            dialect: schema.dialect,
            tables: schema.tables.clone(),
        }
    }
}
