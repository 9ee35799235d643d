//! Relation (link) column descriptors.
//!
//! Key columns follow the grid's convention, which is relative to the
//! foreign key rather than to the column's owner:
//!
//! | type | `child_column_id` | `parent_column_id` |
//! |------|-------------------|--------------------|
//! | bt   | fk on the owner table | pk of the related table |
//! | hm   | fk on the related table | pk of the owner table |
//! | mm   | pk of the owner table | pk of the related table |
//!
//! Many-to-many relations also carry the junction table, whose
//! `child_column_id` points at the owner and `parent_column_id` at the
//! related table.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationType {
    BelongsTo,
    HasMany,
    ManyToMany,
    /// A relation kind this crate cannot traverse, e.g. one-to-one.
    Unsupported(String),
}

impl RelationType {
    pub fn as_str(&self) -> &str {
        match self {
            RelationType::BelongsTo => "bt",
            RelationType::HasMany => "hm",
            RelationType::ManyToMany => "mm",
            RelationType::Unsupported(other) => other,
        }
    }

    /// Whether traversing yields more than one row per outer row.
    pub fn is_multi_valued(&self) -> bool {
        matches!(self, RelationType::HasMany | RelationType::ManyToMany)
    }
}

impl From<String> for RelationType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "bt" => RelationType::BelongsTo,
            "hm" => RelationType::HasMany,
            "mm" => RelationType::ManyToMany,
            _ => RelationType::Unsupported(s),
        }
    }
}

impl From<RelationType> for String {
    fn from(rt: RelationType) -> Self {
        rt.as_str().to_string()
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A relation column's link to another table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub relation_type: RelationType,
    #[serde(alias = "fk_child_column_id")]
    pub child_column_id: String,
    #[serde(alias = "fk_parent_column_id")]
    pub parent_column_id: String,
    #[serde(alias = "fk_related_model_id")]
    pub related_table_id: String,
    #[serde(default)]
    pub association: Option<Association>,
}

/// Junction table of a many-to-many relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    #[serde(alias = "fk_mm_model_id")]
    pub table_id: String,
    #[serde(alias = "fk_mm_child_column_id")]
    pub child_column_id: String,
    #[serde(alias = "fk_mm_parent_column_id")]
    pub parent_column_id: String,
}

impl Relation {
    pub fn belongs_to(fk_column_id: &str, related_pk_id: &str, related_table_id: &str) -> Self {
        Self {
            relation_type: RelationType::BelongsTo,
            child_column_id: fk_column_id.to_string(),
            parent_column_id: related_pk_id.to_string(),
            related_table_id: related_table_id.to_string(),
            association: None,
        }
    }

    pub fn has_many(related_fk_id: &str, owner_pk_id: &str, related_table_id: &str) -> Self {
        Self {
            relation_type: RelationType::HasMany,
            child_column_id: related_fk_id.to_string(),
            parent_column_id: owner_pk_id.to_string(),
            related_table_id: related_table_id.to_string(),
            association: None,
        }
    }

    pub fn many_to_many(
        owner_pk_id: &str,
        related_pk_id: &str,
        related_table_id: &str,
        association: Association,
    ) -> Self {
        Self {
            relation_type: RelationType::ManyToMany,
            child_column_id: owner_pk_id.to_string(),
            parent_column_id: related_pk_id.to_string(),
            related_table_id: related_table_id.to_string(),
            association: Some(association),
        }
    }
}
