//! Column metadata: UI data types and virtual column descriptors.

use serde::{Deserialize, Serialize};

use super::relation::Relation;
use crate::error::CompileResult;
use crate::formula::{parse_formula, FormulaNode};
use crate::sql::{avg, avg_distinct, count, count_distinct, max, min, sum, sum_distinct};
use crate::sql::{Dialect, Expr, SqlDialect};

/// UI data type of a column.
///
/// Names follow the grid's `uidt` strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UiType {
    #[serde(rename = "ID")]
    Id,
    ForeignKey,
    #[default]
    SingleLineText,
    LongText,
    Email,
    PhoneNumber,
    #[serde(rename = "URL")]
    Url,
    Attachment,
    Checkbox,
    SingleSelect,
    MultiSelect,
    User,
    Number,
    Decimal,
    Currency,
    Percent,
    Duration,
    Rating,
    Year,
    AutoNumber,
    Count,
    Date,
    DateTime,
    CreatedTime,
    LastModifiedTime,
    Time,
    #[serde(rename = "JSON")]
    Json,
    Barcode,
    QrCode,
    Button,
    Formula,
    Rollup,
    Lookup,
    Links,
    LinkToAnotherRecord,
    #[serde(other)]
    SpecificDbType,
}

impl UiType {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            UiType::Number
                | UiType::Decimal
                | UiType::Currency
                | UiType::Percent
                | UiType::Duration
                | UiType::Rating
                | UiType::Year
                | UiType::AutoNumber
                | UiType::Count
        )
    }

    pub fn is_date(&self) -> bool {
        matches!(self, UiType::Date)
    }

    pub fn is_datetime(&self) -> bool {
        matches!(
            self,
            UiType::DateTime | UiType::CreatedTime | UiType::LastModifiedTime
        )
    }

    pub fn is_select(&self) -> bool {
        matches!(self, UiType::SingleSelect | UiType::MultiSelect)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, UiType::Checkbox)
    }
}

/// A column of a table, physical or virtual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: String,
    pub title: String,
    /// Physical column name. Empty for virtual columns.
    #[serde(default)]
    pub column_name: String,
    /// Owning table id. Filled in when the schema is assembled.
    #[serde(default)]
    pub table_id: String,
    #[serde(default)]
    pub uidt: UiType,
    #[serde(default, alias = "pk")]
    pub primary_key: bool,
    /// Marks the column shown when rows of this table are referenced.
    #[serde(default, alias = "pv")]
    pub display_value: bool,
    #[serde(default)]
    pub kind: ColumnKind,
}

impl Column {
    pub fn plain(id: &str, title: &str, column_name: &str, uidt: UiType) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            column_name: column_name.to_string(),
            table_id: String::new(),
            uidt,
            primary_key: false,
            display_value: false,
            kind: ColumnKind::Plain,
        }
    }

    pub fn virtual_column(id: &str, title: &str, uidt: UiType, kind: ColumnKind) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            column_name: String::new(),
            table_id: String::new(),
            uidt,
            primary_key: false,
            display_value: false,
            kind,
        }
    }

    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn with_display_value(mut self) -> Self {
        self.display_value = true;
        self
    }

    pub fn is_virtual(&self) -> bool {
        !matches!(self.kind, ColumnKind::Plain)
    }

    /// Whether `reference` names this column by id, title or physical name.
    pub fn matches(&self, reference: &str) -> bool {
        self.id == reference
            || self.title == reference
            || (!self.column_name.is_empty() && self.column_name == reference)
    }
}

/// What a column is, beyond its UI type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    #[default]
    Plain,
    Relation(Relation),
    Lookup(LookupOptions),
    Rollup(RollupOptions),
    Formula(FormulaOptions),
}

impl ColumnKind {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Plain => "plain",
            ColumnKind::Relation(_) => "relation",
            ColumnKind::Lookup(_) => "lookup",
            ColumnKind::Rollup(_) => "rollup",
            ColumnKind::Formula(_) => "formula",
        }
    }
}

/// A lookup: the value of `lookup_column_id` reached through `relation_column_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOptions {
    #[serde(alias = "fk_relation_column_id")]
    pub relation_column_id: String,
    #[serde(alias = "fk_lookup_column_id")]
    pub lookup_column_id: String,
}

/// A rollup: `function` over `rollup_column_id` of the rows reached through
/// `relation_column_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupOptions {
    #[serde(alias = "fk_relation_column_id")]
    pub relation_column_id: String,
    #[serde(alias = "fk_rollup_column_id")]
    pub rollup_column_id: String,
    #[serde(alias = "rollup_function")]
    pub function: RollupFunction,
}

/// Aggregate applied by a rollup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RollupFunction {
    Min,
    Max,
    Sum,
    Avg,
    Count,
    CountDistinct,
    SumDistinct,
    AvgDistinct,
    Concat,
}

impl RollupFunction {
    /// Wrap `expr` in this aggregate.
    pub fn apply(&self, expr: Expr, dialect: Dialect) -> Expr {
        match self {
            RollupFunction::Min => min(expr),
            RollupFunction::Max => max(expr),
            RollupFunction::Sum => sum(expr),
            RollupFunction::Avg => avg(expr),
            RollupFunction::Count => count(expr),
            RollupFunction::CountDistinct => count_distinct(expr),
            RollupFunction::SumDistinct => sum_distinct(expr),
            RollupFunction::AvgDistinct => avg_distinct(expr),
            RollupFunction::Concat => dialect.string_agg(expr),
        }
    }

    /// Whether the aggregate yields a number.
    pub fn is_numeric(&self) -> bool {
        !matches!(self, RollupFunction::Concat)
    }
}

/// A formula column.
///
/// The tree is stored pre-parsed; when only the text is present it is
/// parsed on demand.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FormulaOptions {
    #[serde(default, alias = "formula_raw")]
    pub formula: Option<String>,
    #[serde(default, alias = "parsed_tree")]
    pub tree: Option<FormulaNode>,
    /// Persisted compile error, set by a failed validation.
    #[serde(default)]
    pub error: Option<String>,
}

impl FormulaOptions {
    pub fn from_tree(tree: FormulaNode) -> Self {
        Self {
            formula: None,
            tree: Some(tree),
            error: None,
        }
    }

    pub fn from_text(formula: &str) -> Self {
        Self {
            formula: Some(formula.to_string()),
            tree: None,
            error: None,
        }
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    /// The formula tree, parsing the text form when no tree is stored.
    pub fn ast(&self) -> CompileResult<FormulaNode> {
        match (&self.tree, &self.formula) {
            (Some(tree), _) => Ok(tree.clone()),
            (None, Some(text)) => parse_formula(text),
            (None, None) => Err(crate::error::CompileError::InvalidFormula(
                "formula column has neither a tree nor text".into(),
            )),
        }
    }
}
