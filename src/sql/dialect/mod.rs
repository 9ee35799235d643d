//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to handle its specific syntax:
//!
//! - Identifier quoting: `"` (Postgres/SQLite), `` ` `` (MySQL), `[]` (MSSQL)
//! - Bind placeholders: `$n` (Postgres), `@pn` (MSSQL), `?` (MySQL/SQLite)
//! - Boolean literals: true/false vs 1/0
//! - String concatenation: `||` vs `+` vs CONCAT()
//! - Aggregated string lists: STRING_AGG vs GROUP_CONCAT
//! - Date truncation and formatting
//!
//! # Usage
//!
//! ```ignore
//! use virtcol::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::MySql;
//! let quoted = dialect.quote_identifier("user");  // `user`
//! ```
//!
//! # Feature Matrix
//!
//! | Feature | Postgres | MySQL | SQLite | MSSQL |
//! |---------|----------|-------|--------|-------|
//! | `\|\|` concat | ✓ | ❌ | ✓ | `+` |
//! | Variadic CONCAT() | ✓ | ✓ | ❌ | ✓ |
//! | ILIKE | ✓ | ❌ | ❌ | ❌ |
//! | STRING_AGG | ✓ | ❌ (GROUP_CONCAT) | ❌ (GROUP_CONCAT) | 2017+ |
//! | LEAST/GREATEST | ✓ | ✓ | ❌ (MIN/MAX) | 2022+ |

pub mod helpers;
mod mssql;
mod mysql;
mod postgres;
mod sqlite;

pub use mssql::MsSql;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::expr::{cast, func, lit_int, lit_str, Expr, ExprExt};

/// Calendar unit used by date arithmetic helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl DateUnit {
    /// Keyword form used by `DATEADD`/`TIMESTAMPDIFF` style functions.
    pub fn keyword(&self) -> &'static str {
        match self {
            DateUnit::Second => "SECOND",
            DateUnit::Minute => "MINUTE",
            DateUnit::Hour => "HOUR",
            DateUnit::Day => "DAY",
            DateUnit::Week => "WEEK",
            DateUnit::Month => "MONTH",
            DateUnit::Year => "YEAR",
        }
    }

    /// Length in seconds for fixed-size units.
    pub fn seconds(&self) -> Option<i64> {
        match self {
            DateUnit::Second => Some(1),
            DateUnit::Minute => Some(60),
            DateUnit::Hour => Some(3_600),
            DateUnit::Day => Some(86_400),
            DateUnit::Week => Some(604_800),
            DateUnit::Month | DateUnit::Year => None,
        }
    }
}

impl FromStr for DateUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "s" | "second" | "seconds" => Ok(DateUnit::Second),
            "m" | "minute" | "minutes" => Ok(DateUnit::Minute),
            "h" | "hour" | "hours" => Ok(DateUnit::Hour),
            "d" | "day" | "days" => Ok(DateUnit::Day),
            "w" | "week" | "weeks" => Ok(DateUnit::Week),
            "month" | "months" => Ok(DateUnit::Month),
            "y" | "year" | "years" => Ok(DateUnit::Year),
            other => Err(format!("unknown date unit '{}'", other)),
        }
    }
}

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow Postgres where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    ///
    /// - Postgres/SQLite: `"identifier"`
    /// - MySQL: `` `identifier` ``
    /// - MSSQL: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    /// Override for Unicode prefix (MSSQL N'...').
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    ///
    /// - Postgres/SQLite: `true`/`false`
    /// - MySQL/MSSQL: `1`/`0`
    fn format_bool(&self, b: bool) -> &'static str;

    /// Bind placeholder for the 1-based parameter `index`.
    fn placeholder(&self, index: usize) -> String {
        let _ = index;
        "?".into()
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// String concatenation operator.
    ///
    /// - Postgres/SQLite: `||`
    /// - MSSQL: `+`
    /// - MySQL: `CONCAT()` (|| is OR by default)
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Whether this dialect supports the concat operator.
    fn supports_concat_operator(&self) -> bool {
        true
    }

    /// Whether `CONCAT(a, b, ...)` is available.
    ///
    /// SQLite has no CONCAT function before 3.44, so folding to `||` is required.
    fn supports_variadic_concat(&self) -> bool {
        true
    }

    /// Whether a case-insensitive `ILIKE` exists.
    fn supports_ilike(&self) -> bool {
        false
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Type used when a value must be compared or matched as text.
    fn text_type(&self) -> &'static str {
        "TEXT"
    }

    /// Type used for floating point division.
    fn float_type(&self) -> &'static str {
        "DOUBLE PRECISION"
    }

    /// Type used for integer truncation.
    fn integer_type(&self) -> &'static str {
        "INTEGER"
    }

    // =========================================================================
    // Expression Shapes
    // =========================================================================

    /// Aggregate that joins values of a multi-valued traversal into one string.
    fn string_agg(&self, expr: Expr) -> Expr {
        helpers::string_agg_cast(expr, self.text_type())
    }

    /// Truncate a date-time expression to its date part.
    fn truncate_to_date(&self, expr: Expr) -> Expr {
        cast(expr, "DATE")
    }

    /// Render a date column as `YYYY-MM-DD` text inside a concatenation.
    fn date_format_for_concat(&self, expr: Expr) -> Expr {
        func("TO_CHAR", vec![expr, lit_str("YYYY-MM-DD")])
    }

    /// Expression a single/multi select column is ordered by.
    ///
    /// MySQL stores selects as ENUM/SET and sorts them by ordinal unless coerced.
    fn option_sort_expr(&self, expr: Expr) -> Expr {
        expr
    }

    /// Position of `needle` in `haystack`, 1-based, 0 when absent.
    fn position(&self, haystack: Expr, needle: Expr) -> Expr {
        func("STRPOS", vec![haystack, needle])
    }

    /// First `count` characters.
    fn left(&self, s: Expr, count: Expr) -> Expr {
        func("LEFT", vec![s, count])
    }

    /// Last `count` characters.
    fn right(&self, s: Expr, count: Expr) -> Expr {
        func("RIGHT", vec![s, count])
    }

    /// Current timestamp.
    fn now(&self) -> Expr {
        func("NOW", vec![])
    }

    /// Day of week, 0 for Monday through 6 for Sunday.
    fn weekday(&self, date: Expr) -> Expr {
        Expr::Paren(Box::new(
            func("DATE_PART", vec![lit_str("isodow"), date]).sub(lit_int(1)),
        ))
    }

    /// `s` repeated `count` times.
    fn repeat(&self, s: Expr, count: Expr) -> Expr {
        func("REPEAT", vec![s, count])
    }

    /// `date` shifted by `amount` units.
    fn date_add(&self, date: Expr, amount: Expr, unit: DateUnit) -> Expr {
        let interval = Expr::Raw(format!("INTERVAL '1 {}'", unit.keyword().to_lowercase()));
        Expr::Paren(Box::new(date.add(amount.mul(interval))))
    }

    /// `end - start` expressed in `unit`, or `None` when the unit has no
    /// fixed length for this dialect.
    fn datetime_diff(&self, end: Expr, start: Expr, unit: DateUnit) -> Option<Expr> {
        let secs = unit.seconds()?;
        let delta = cast(end, "TIMESTAMP").sub(cast(start, "TIMESTAMP"));
        let epoch = func("DATE_PART", vec![lit_str("epoch"), delta]);
        Some(if secs == 1 { epoch } else { epoch.div(lit_int(secs)) })
    }

    // =========================================================================
    // Function Remapping
    // =========================================================================

    /// Remap a function name for this dialect.
    ///
    /// Different databases use different names for the same functions:
    /// - `LEN` → `LENGTH` (Postgres/SQLite) / `CHAR_LENGTH` (MySQL)
    /// - `NOW` → `GETDATE` (MSSQL)
    /// - `IFNULL` → `COALESCE` (Postgres) / `ISNULL` (MSSQL)
    ///
    /// Returns `Some(new_name)` if the function should be remapped, `None` to keep original.
    /// The input is matched case-insensitively.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    Sqlite,
    MsSql,
}

impl Dialect {
    /// All supported dialects, in a stable order.
    pub const ALL: [Dialect; 4] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::Sqlite,
        Dialect::MsSql,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::Sqlite => &Sqlite,
            Dialect::MsSql => &MsSql,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn placeholder(&self, index: usize) -> String {
        self.dialect().placeholder(index)
    }

    fn concat_operator(&self) -> &'static str {
        self.dialect().concat_operator()
    }

    fn supports_concat_operator(&self) -> bool {
        self.dialect().supports_concat_operator()
    }

    fn supports_variadic_concat(&self) -> bool {
        self.dialect().supports_variadic_concat()
    }

    fn supports_ilike(&self) -> bool {
        self.dialect().supports_ilike()
    }

    fn text_type(&self) -> &'static str {
        self.dialect().text_type()
    }

    fn float_type(&self) -> &'static str {
        self.dialect().float_type()
    }

    fn integer_type(&self) -> &'static str {
        self.dialect().integer_type()
    }

    fn string_agg(&self, expr: Expr) -> Expr {
        self.dialect().string_agg(expr)
    }

    fn truncate_to_date(&self, expr: Expr) -> Expr {
        self.dialect().truncate_to_date(expr)
    }

    fn date_format_for_concat(&self, expr: Expr) -> Expr {
        self.dialect().date_format_for_concat(expr)
    }

    fn option_sort_expr(&self, expr: Expr) -> Expr {
        self.dialect().option_sort_expr(expr)
    }

    fn position(&self, haystack: Expr, needle: Expr) -> Expr {
        self.dialect().position(haystack, needle)
    }

    fn left(&self, s: Expr, count: Expr) -> Expr {
        self.dialect().left(s, count)
    }

    fn right(&self, s: Expr, count: Expr) -> Expr {
        self.dialect().right(s, count)
    }

    fn now(&self) -> Expr {
        self.dialect().now()
    }

    fn weekday(&self, date: Expr) -> Expr {
        self.dialect().weekday(date)
    }

    fn repeat(&self, s: Expr, count: Expr) -> Expr {
        self.dialect().repeat(s, count)
    }

    fn date_add(&self, date: Expr, amount: Expr, unit: DateUnit) -> Expr {
        self.dialect().date_add(date, amount, unit)
    }

    fn datetime_diff(&self, end: Expr, start: Expr, unit: DateUnit) -> Option<Expr> {
        self.dialect().datetime_diff(end, start, unit)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" | "mysql2" => Ok(Dialect::MySql),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mssql" | "tsql" | "sqlserver" => Ok(Dialect::MsSql),
            other => Err(format!(
                "unknown dialect '{}' (expected pg, mysql, sqlite or mssql)",
                other
            )),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dialect> for String {
    fn from(dialect: Dialect) -> Self {
        dialect.name().to_string()
    }
}
