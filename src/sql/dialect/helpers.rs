//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use crate::sql::expr::{cast, func, lit_str, Expr};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, SQLite
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: MSSQL
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with N prefix for Unicode.
/// Used by: MSSQL for non-ASCII strings
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: Postgres, SQLite
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: MSSQL, MySQL
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// Expression Building Blocks
// =============================================================================

/// `STRING_AGG(CAST(expr AS ty), ',')`.
/// Used by: Postgres (TEXT), MSSQL (NVARCHAR(MAX))
pub fn string_agg_cast(expr: Expr, ty: &str) -> Expr {
    func("STRING_AGG", vec![cast(expr, ty), lit_str(",")])
}

/// `GROUP_CONCAT(expr)`.
/// Used by: MySQL, SQLite
pub fn group_concat(expr: Expr) -> Expr {
    func("GROUP_CONCAT", vec![expr])
}

// =============================================================================
// Function Remapping
// =============================================================================

/// Remap functions for Postgres dialect.
pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LEN" => Some("LENGTH"),
        "NVL" => Some("COALESCE"),
        "IFNULL" => Some("COALESCE"),
        "ISNULL" => Some("COALESCE"),
        _ => None,
    }
}

/// Remap functions for MySQL dialect.
pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LEN" => Some("CHAR_LENGTH"),
        "NVL" => Some("IFNULL"),
        "ISNULL" => Some("IFNULL"),
        _ => None,
    }
}

/// Remap functions for SQLite dialect.
pub fn remap_function_sqlite(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LEN" => Some("LENGTH"),
        "NVL" => Some("IFNULL"),
        "ISNULL" => Some("IFNULL"),
        "LEAST" => Some("MIN"),
        "GREATEST" => Some("MAX"),
        _ => None,
    }
}

/// Remap functions for MSSQL dialect.
pub fn remap_function_mssql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LENGTH" => Some("LEN"),
        "SUBSTR" => Some("SUBSTRING"),
        "NOW" => Some("GETDATE"),
        "CURRENT_TIMESTAMP" => Some("GETDATE"),
        "NVL" => Some("ISNULL"),
        "IFNULL" => Some("ISNULL"),
        "CEIL" => Some("CEILING"),
        "POW" => Some("POWER"),
        "REPEAT" => Some("REPLICATE"),
        _ => None,
    }
}
