//! PostgreSQL dialect.
//!
//! PostgreSQL is close to ANSI and is the reference for the trait defaults:
//! - Double-quote identifier quoting
//! - Native boolean type (true/false)
//! - `$n` numbered placeholders
//! - ILIKE for case-insensitive matching
//! - STRING_AGG for aggregated string lists

use super::helpers;
use super::SqlDialect;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "pg"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_postgres(name)
    }
}
