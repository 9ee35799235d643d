//! MySQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Boolean is TINYINT(1), returns 1/0
//! - `||` is logical OR by default (use CONCAT())
//! - Text casts target CHAR, floats DOUBLE, integers SIGNED
//! - GROUP_CONCAT instead of STRING_AGG
//! - ENUM/SET columns sort by ordinal unless coerced to a string

use super::helpers;
use super::{DateUnit, SqlDialect};
use crate::sql::expr::{func, lit_str, Expr};

/// MySQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn supports_concat_operator(&self) -> bool {
        // MySQL || is OR by default, use CONCAT() instead
        false
    }

    fn text_type(&self) -> &'static str {
        "CHAR"
    }

    fn float_type(&self) -> &'static str {
        "DOUBLE"
    }

    fn integer_type(&self) -> &'static str {
        "SIGNED"
    }

    fn string_agg(&self, expr: Expr) -> Expr {
        helpers::group_concat(expr)
    }

    fn truncate_to_date(&self, expr: Expr) -> Expr {
        func("DATE", vec![expr])
    }

    fn date_format_for_concat(&self, expr: Expr) -> Expr {
        func("DATE_FORMAT", vec![expr, lit_str("%Y-%m-%d")])
    }

    fn option_sort_expr(&self, expr: Expr) -> Expr {
        func("CONCAT", vec![expr])
    }

    fn position(&self, haystack: Expr, needle: Expr) -> Expr {
        func("LOCATE", vec![needle, haystack])
    }

    fn weekday(&self, date: Expr) -> Expr {
        func("WEEKDAY", vec![date])
    }

    fn date_add(&self, date: Expr, amount: Expr, unit: DateUnit) -> Expr {
        func(
            "DATE_ADD",
            vec![
                date,
                Expr::Interval {
                    value: Box::new(amount),
                    unit: unit.keyword().into(),
                },
            ],
        )
    }

    fn datetime_diff(&self, end: Expr, start: Expr, unit: DateUnit) -> Option<Expr> {
        Some(func(
            "TIMESTAMPDIFF",
            vec![Expr::Raw(unit.keyword().into()), start, end],
        ))
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }
}
