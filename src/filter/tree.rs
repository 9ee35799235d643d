//! Filter trees.
//!
//! A filter is a list of siblings. Each sibling carries the logical
//! operator joining it to the siblings before it, so `a ~or b ~and c`
//! folds left to right as `(a OR b) AND c`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a filter joins the siblings before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalOp {
    #[default]
    And,
    Or,
    /// `AND NOT`
    Not,
}

/// Comparison applied by a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonOp {
    Eq,
    Neq,
    Like,
    Nlike,
    In,
    Is,
    Isnot,
    Blank,
    Notblank,
    Empty,
    Notempty,
    Null,
    Notnull,
    Checked,
    Notchecked,
    Btw,
    Nbtw,
    Allof,
    Anyof,
    Nallof,
    Nanyof,
    Gt,
    #[serde(alias = "gte")]
    Ge,
    Lt,
    #[serde(alias = "lte")]
    Le,
    #[serde(rename = "isWithin")]
    IsWithin,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Neq => "neq",
            ComparisonOp::Like => "like",
            ComparisonOp::Nlike => "nlike",
            ComparisonOp::In => "in",
            ComparisonOp::Is => "is",
            ComparisonOp::Isnot => "isnot",
            ComparisonOp::Blank => "blank",
            ComparisonOp::Notblank => "notblank",
            ComparisonOp::Empty => "empty",
            ComparisonOp::Notempty => "notempty",
            ComparisonOp::Null => "null",
            ComparisonOp::Notnull => "notnull",
            ComparisonOp::Checked => "checked",
            ComparisonOp::Notchecked => "notchecked",
            ComparisonOp::Btw => "btw",
            ComparisonOp::Nbtw => "nbtw",
            ComparisonOp::Allof => "allof",
            ComparisonOp::Anyof => "anyof",
            ComparisonOp::Nallof => "nallof",
            ComparisonOp::Nanyof => "nanyof",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Ge => "ge",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Le => "le",
            ComparisonOp::IsWithin => "isWithin",
        }
    }

    /// Whether the value may be preceded by a date sub-operator.
    pub fn takes_sub_op(&self) -> bool {
        matches!(
            self,
            ComparisonOp::Eq
                | ComparisonOp::Neq
                | ComparisonOp::Gt
                | ComparisonOp::Ge
                | ComparisonOp::Lt
                | ComparisonOp::Le
                | ComparisonOp::IsWithin
        )
    }
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "eq" => ComparisonOp::Eq,
            "neq" | "ne" => ComparisonOp::Neq,
            "like" => ComparisonOp::Like,
            "nlike" => ComparisonOp::Nlike,
            "in" => ComparisonOp::In,
            "is" => ComparisonOp::Is,
            "isnot" => ComparisonOp::Isnot,
            "blank" => ComparisonOp::Blank,
            "notblank" => ComparisonOp::Notblank,
            "empty" => ComparisonOp::Empty,
            "notempty" => ComparisonOp::Notempty,
            "null" => ComparisonOp::Null,
            "notnull" => ComparisonOp::Notnull,
            "checked" => ComparisonOp::Checked,
            "notchecked" => ComparisonOp::Notchecked,
            "btw" => ComparisonOp::Btw,
            "nbtw" => ComparisonOp::Nbtw,
            "allof" => ComparisonOp::Allof,
            "anyof" => ComparisonOp::Anyof,
            "nallof" => ComparisonOp::Nallof,
            "nanyof" => ComparisonOp::Nanyof,
            "gt" => ComparisonOp::Gt,
            "ge" | "gte" => ComparisonOp::Ge,
            "lt" => ComparisonOp::Lt,
            "le" | "lte" => ComparisonOp::Le,
            "iswithin" => ComparisonOp::IsWithin,
            other => return Err(format!("unknown comparison operator '{}'", other)),
        })
    }
}

/// Date sub-operator: which date a date comparison is made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonSubOp {
    Today,
    Tomorrow,
    Yesterday,
    OneWeekAgo,
    OneWeekFromNow,
    OneMonthAgo,
    OneMonthFromNow,
    #[serde(alias = "number_of_days_ago")]
    DaysAgo,
    #[serde(alias = "number_of_days_from_now")]
    DaysFromNow,
    ExactDate,
    PastWeek,
    PastMonth,
    PastYear,
    NextWeek,
    NextMonth,
    NextYear,
    PastNumberOfDays,
    NextNumberOfDays,
}

impl ComparisonSubOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonSubOp::Today => "today",
            ComparisonSubOp::Tomorrow => "tomorrow",
            ComparisonSubOp::Yesterday => "yesterday",
            ComparisonSubOp::OneWeekAgo => "oneWeekAgo",
            ComparisonSubOp::OneWeekFromNow => "oneWeekFromNow",
            ComparisonSubOp::OneMonthAgo => "oneMonthAgo",
            ComparisonSubOp::OneMonthFromNow => "oneMonthFromNow",
            ComparisonSubOp::DaysAgo => "daysAgo",
            ComparisonSubOp::DaysFromNow => "daysFromNow",
            ComparisonSubOp::ExactDate => "exactDate",
            ComparisonSubOp::PastWeek => "pastWeek",
            ComparisonSubOp::PastMonth => "pastMonth",
            ComparisonSubOp::PastYear => "pastYear",
            ComparisonSubOp::NextWeek => "nextWeek",
            ComparisonSubOp::NextMonth => "nextMonth",
            ComparisonSubOp::NextYear => "nextYear",
            ComparisonSubOp::PastNumberOfDays => "pastNumberOfDays",
            ComparisonSubOp::NextNumberOfDays => "nextNumberOfDays",
        }
    }

    /// Whether this sub-operator names a range, for `isWithin`.
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            ComparisonSubOp::PastWeek
                | ComparisonSubOp::PastMonth
                | ComparisonSubOp::PastYear
                | ComparisonSubOp::NextWeek
                | ComparisonSubOp::NextMonth
                | ComparisonSubOp::NextYear
                | ComparisonSubOp::PastNumberOfDays
                | ComparisonSubOp::NextNumberOfDays
        )
    }
}

impl FromStr for ComparisonSubOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "today" => ComparisonSubOp::Today,
            "tomorrow" => ComparisonSubOp::Tomorrow,
            "yesterday" => ComparisonSubOp::Yesterday,
            "oneWeekAgo" => ComparisonSubOp::OneWeekAgo,
            "oneWeekFromNow" => ComparisonSubOp::OneWeekFromNow,
            "oneMonthAgo" => ComparisonSubOp::OneMonthAgo,
            "oneMonthFromNow" => ComparisonSubOp::OneMonthFromNow,
            "daysAgo" | "number_of_days_ago" => ComparisonSubOp::DaysAgo,
            "daysFromNow" | "number_of_days_from_now" => ComparisonSubOp::DaysFromNow,
            "exactDate" => ComparisonSubOp::ExactDate,
            "pastWeek" => ComparisonSubOp::PastWeek,
            "pastMonth" => ComparisonSubOp::PastMonth,
            "pastYear" => ComparisonSubOp::PastYear,
            "nextWeek" => ComparisonSubOp::NextWeek,
            "nextMonth" => ComparisonSubOp::NextMonth,
            "nextYear" => ComparisonSubOp::NextYear,
            "pastNumberOfDays" => ComparisonSubOp::PastNumberOfDays,
            "nextNumberOfDays" => ComparisonSubOp::NextNumberOfDays,
            other => return Err(format!("unknown date sub-operator '{}'", other)),
        })
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<FilterValue>),
}

impl FilterValue {
    pub fn text(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }

    /// Whether the value is absent or the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            FilterValue::Null => true,
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Textual form, `None` for null and lists.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FilterValue::Null | FilterValue::List(_) => None,
            FilterValue::Bool(b) => Some(b.to_string()),
            FilterValue::Int(n) => Some(n.to_string()),
            FilterValue::Float(f) => Some(f.to_string()),
            FilterValue::Text(s) => Some(s.clone()),
        }
    }

    /// Numeric form. Strings are parsed; non-finite numbers are rejected.
    pub fn as_number(&self) -> Option<Number> {
        match self {
            FilterValue::Int(n) => Some(Number::Int(*n)),
            FilterValue::Float(f) if f.is_finite() => Some(Number::Float(*f)),
            FilterValue::Text(s) => Number::parse(s),
            _ => None,
        }
    }

    /// Items of a list value; text is split on commas.
    pub fn items(&self) -> Vec<String> {
        match self {
            FilterValue::List(items) => items.iter().filter_map(|v| v.as_text()).collect(),
            FilterValue::Text(s) => s
                .split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
            FilterValue::Null => Vec::new(),
            other => other.as_text().into_iter().collect(),
        }
    }
}

/// A finite number taken from a filter value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn parse(s: &str) -> Option<Number> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Some(Number::Int(n));
        }
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Number::Float)
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Int(n) => *n == 0,
            Number::Float(f) => *f == 0.0,
        }
    }
}

/// A single comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterLeaf {
    #[serde(default)]
    pub logical_op: LogicalOp,
    /// Column id, title or physical name.
    #[serde(alias = "fk_column_id")]
    pub column: String,
    #[serde(alias = "comparison_op")]
    pub op: ComparisonOp,
    #[serde(default, alias = "comparison_sub_op")]
    pub sub_op: Option<ComparisonSubOp>,
    #[serde(default)]
    pub value: FilterValue,
}

/// A parenthesized list of filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub logical_op: LogicalOp,
    pub children: Vec<Filter>,
}

/// A node of a filter tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filter {
    Group(FilterGroup),
    Leaf(FilterLeaf),
}

impl Filter {
    /// A leaf comparing `column` with `value`.
    pub fn leaf(column: &str, op: ComparisonOp, value: FilterValue) -> Self {
        Filter::Leaf(FilterLeaf {
            logical_op: LogicalOp::And,
            column: column.to_string(),
            op,
            sub_op: None,
            value,
        })
    }

    /// A date leaf with a sub-operator.
    pub fn date_leaf(column: &str, op: ComparisonOp, sub_op: ComparisonSubOp, value: FilterValue) -> Self {
        Filter::Leaf(FilterLeaf {
            logical_op: LogicalOp::And,
            column: column.to_string(),
            op,
            sub_op: Some(sub_op),
            value,
        })
    }

    pub fn group(children: Vec<Filter>) -> Self {
        Filter::Group(FilterGroup {
            logical_op: LogicalOp::And,
            children,
        })
    }

    pub fn logical_op(&self) -> LogicalOp {
        match self {
            Filter::Group(g) => g.logical_op,
            Filter::Leaf(l) => l.logical_op,
        }
    }

    /// Set how this filter joins its preceding siblings.
    pub fn with_logical_op(mut self, op: LogicalOp) -> Self {
        match &mut self {
            Filter::Group(g) => g.logical_op = op,
            Filter::Leaf(l) => l.logical_op = op,
        }
        self
    }
}
