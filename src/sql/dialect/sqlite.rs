//! SQLite dialect.
//!
//! SQLite differences from ANSI:
//! - Double-quote identifier quoting
//! - No CONCAT() before 3.44, so concatenation folds to `||`
//! - GROUP_CONCAT instead of STRING_AGG
//! - Date handling through DATE()/STRFTIME()/JULIANDAY() on text values
//! - Scalar MIN()/MAX() stand in for LEAST/GREATEST

use super::helpers;
use super::{DateUnit, SqlDialect};
use crate::sql::expr::{cast, func, lit_int, lit_str, Expr, ExprExt};

/// SQLite dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn supports_variadic_concat(&self) -> bool {
        false
    }

    fn float_type(&self) -> &'static str {
        "REAL"
    }

    fn string_agg(&self, expr: Expr) -> Expr {
        helpers::group_concat(expr)
    }

    fn truncate_to_date(&self, expr: Expr) -> Expr {
        func("DATE", vec![expr])
    }

    fn date_format_for_concat(&self, expr: Expr) -> Expr {
        func("STRFTIME", vec![lit_str("%Y-%m-%d"), expr])
    }

    fn position(&self, haystack: Expr, needle: Expr) -> Expr {
        func("INSTR", vec![haystack, needle])
    }

    fn left(&self, s: Expr, count: Expr) -> Expr {
        func("SUBSTR", vec![s, lit_int(1), count])
    }

    fn right(&self, s: Expr, count: Expr) -> Expr {
        func("SUBSTR", vec![s, Expr::negate(count)])
    }

    fn now(&self) -> Expr {
        func("DATETIME", vec![lit_str("now")])
    }

    fn weekday(&self, date: Expr) -> Expr {
        // %w counts from Sunday
        let dow = cast(func("STRFTIME", vec![lit_str("%w"), date]), "INTEGER");
        Expr::Paren(Box::new(
            Expr::Paren(Box::new(dow.add(lit_int(6)))).modulo(lit_int(7)),
        ))
    }

    fn repeat(&self, s: Expr, count: Expr) -> Expr {
        let blanks = func("HEX", vec![func("ZEROBLOB", vec![count])]);
        func("REPLACE", vec![blanks, lit_str("00"), s])
    }

    fn date_add(&self, date: Expr, amount: Expr, unit: DateUnit) -> Expr {
        // Modifiers have no week unit
        let (amount, modifier) = match unit {
            DateUnit::Week => (Expr::Paren(Box::new(amount.mul(lit_int(7)))), "days"),
            DateUnit::Second => (amount, "seconds"),
            DateUnit::Minute => (amount, "minutes"),
            DateUnit::Hour => (amount, "hours"),
            DateUnit::Day => (amount, "days"),
            DateUnit::Month => (amount, "months"),
            DateUnit::Year => (amount, "years"),
        };
        let modifier = amount.concat(lit_str(&format!(" {}", modifier)));
        func("DATETIME", vec![date, modifier])
    }

    fn datetime_diff(&self, end: Expr, start: Expr, unit: DateUnit) -> Option<Expr> {
        let days = Expr::Paren(Box::new(
            func("JULIANDAY", vec![end]).sub(func("JULIANDAY", vec![start])),
        ));
        Some(match unit {
            DateUnit::Second => days.mul(lit_int(86_400)),
            DateUnit::Minute => days.mul(lit_int(1_440)),
            DateUnit::Hour => days.mul(lit_int(24)),
            DateUnit::Day => days,
            DateUnit::Week => days.div(lit_int(7)),
            DateUnit::Month | DateUnit::Year => return None,
        })
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlite(name)
    }
}
