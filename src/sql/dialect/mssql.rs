//! MSSQL (SQL Server / Azure SQL) dialect.
//!
//! MSSQL differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - No native boolean in SELECT, BIT compares against 1/0
//! - `@pN` named placeholders
//! - N'...' prefix for Unicode strings
//! - String concatenation with `+`
//! - TEXT columns cannot be compared or sorted, cast to NVARCHAR(MAX)/VARCHAR(MAX)

use super::helpers;
use super::{DateUnit, SqlDialect};
use crate::sql::expr::{cast, func, lit_int, lit_str, Expr, ExprExt};

/// MSSQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MsSql;

impl SqlDialect for MsSql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        // N'...' keeps non-ASCII text intact
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("@p{}", index)
    }

    fn concat_operator(&self) -> &'static str {
        "+"
    }

    fn text_type(&self) -> &'static str {
        "NVARCHAR(MAX)"
    }

    fn float_type(&self) -> &'static str {
        "FLOAT"
    }

    fn integer_type(&self) -> &'static str {
        "INT"
    }

    fn date_format_for_concat(&self, expr: Expr) -> Expr {
        func("FORMAT", vec![expr, lit_str("yyyy-MM-dd")])
    }

    fn option_sort_expr(&self, expr: Expr) -> Expr {
        cast(expr, "VARCHAR(MAX)")
    }

    fn position(&self, haystack: Expr, needle: Expr) -> Expr {
        func("CHARINDEX", vec![needle, haystack])
    }

    fn weekday(&self, date: Expr) -> Expr {
        // Independent of SET DATEFIRST
        let dow = func("DATEPART", vec![Expr::Raw("weekday".into()), date]);
        Expr::Paren(Box::new(
            Expr::Paren(Box::new(dow.add(Expr::Raw("@@DATEFIRST".into())).add(lit_int(5))))
                .modulo(lit_int(7)),
        ))
    }

    fn date_add(&self, date: Expr, amount: Expr, unit: DateUnit) -> Expr {
        func(
            "DATEADD",
            vec![Expr::Raw(unit.keyword().to_lowercase()), amount, date],
        )
    }

    fn datetime_diff(&self, end: Expr, start: Expr, unit: DateUnit) -> Option<Expr> {
        Some(func(
            "DATEDIFF",
            vec![Expr::Raw(unit.keyword().to_lowercase()), start, end],
        ))
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mssql(name)
    }
}
