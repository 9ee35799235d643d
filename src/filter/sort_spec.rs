//! Sort specifications.

use serde::{Deserialize, Serialize};

use crate::sql::SortDir;

/// Sort on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column id, title or physical name.
    #[serde(alias = "fk_column_id")]
    pub column: String,
    #[serde(default)]
    pub direction: SortDir,
}

impl SortSpec {
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDir::Asc,
        }
    }

    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: SortDir::Desc,
        }
    }
}

/// Parse a comma-separated sort list such as `-Created,Name,+Id`.
///
/// A `-` prefix sorts descending, `+` or no prefix ascending. Empty
/// segments are ignored.
pub fn parse_sort(source: &str) -> Vec<SortSpec> {
    source
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| {
            let (direction, column) = match segment.strip_prefix('-') {
                Some(rest) => (SortDir::Desc, rest),
                None => (SortDir::Asc, segment.strip_prefix('+').unwrap_or(segment)),
            };
            let column = column.trim();
            (!column.is_empty()).then(|| SortSpec {
                column: column.to_string(),
                direction,
            })
        })
        .collect()
}
