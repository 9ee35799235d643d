//! Per-call compile state.

use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};

use crate::error::CompileResult;
use crate::model::{Column, Table};
use crate::planner::{AliasCounter, DEFAULT_ALIAS_PREFIX};
use crate::resolve::ColumnResolver;
use crate::sql::{Dialect, Expr};

/// Literal a formula column with a persisted error compiles to.
pub const DEFAULT_ERROR_LITERAL: &str = "ERR!";

/// Format dates are bound with.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Options for compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Parse compiled formulas with sqlparser before accepting them.
    pub dry_run: bool,
    pub error_literal: String,
    /// chrono format string for bound date values.
    pub date_format: String,
    pub alias_prefix: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            error_literal: DEFAULT_ERROR_LITERAL.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            alias_prefix: DEFAULT_ALIAS_PREFIX.to_string(),
        }
    }
}

impl CompileOptions {
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_error_literal(mut self, literal: &str) -> Self {
        self.error_literal = literal.to_string();
        self
    }

    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = format.to_string();
        self
    }

    pub fn with_alias_prefix(mut self, prefix: &str) -> Self {
        self.alias_prefix = prefix.to_string();
        self
    }
}

/// Receives the outcome of formula validation so it can be persisted on
/// the owning column.
pub trait FormulaErrorSink: Send + Sync {
    fn record_error(&self, column: &Column, message: &str);

    fn clear_error(&self, column: &Column);
}

/// A table and the name its columns are qualified with.
#[derive(Debug, Clone)]
pub(crate) struct Scope<'a> {
    pub table: &'a Table,
    pub qualifier: String,
}

impl<'a> Scope<'a> {
    pub fn new(table: &'a Table, qualifier: &str) -> Self {
        Self {
            table,
            qualifier: qualifier.to_string(),
        }
    }
}

/// State owned by one compile call: the target table, the alias counter,
/// the formula memo and the set of formulas being compiled.
pub struct CompileContext<'a> {
    resolver: &'a dyn ColumnResolver,
    table: &'a Table,
    qualifier: String,
    aliases: AliasCounter,
    now: NaiveDateTime,
    options: CompileOptions,
    error_sink: Option<&'a dyn FormulaErrorSink>,
    formula_memo: HashMap<(String, String), Expr>,
    visiting: Vec<(String, String)>,
}

impl<'a> CompileContext<'a> {
    /// Context for compiling against `table_id`, qualified by its physical
    /// name.
    pub fn new(resolver: &'a dyn ColumnResolver, table_id: &str) -> CompileResult<Self> {
        let table = resolver.table(table_id)?;
        Ok(Self {
            resolver,
            table,
            qualifier: table.table_name.clone(),
            aliases: AliasCounter::new(),
            now: Utc::now().naive_utc(),
            options: CompileOptions::default(),
            error_sink: None,
            formula_memo: HashMap::new(),
            visiting: Vec::new(),
        })
    }

    /// Qualify the target table's columns with `alias` instead of its name.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.qualifier = alias.to_string();
        self
    }

    /// Fix "now" for date sub-operators.
    pub fn with_now(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.aliases = AliasCounter::with_prefix(&options.alias_prefix);
        self.options = options;
        self
    }

    pub fn with_error_sink(mut self, sink: &'a dyn FormulaErrorSink) -> Self {
        self.error_sink = Some(sink);
        self
    }

    pub fn resolver(&self) -> &'a dyn ColumnResolver {
        self.resolver
    }

    pub fn dialect(&self) -> Dialect {
        self.resolver.dialect()
    }

    pub fn table(&self) -> &'a Table {
        self.table
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub(crate) fn error_sink(&self) -> Option<&'a dyn FormulaErrorSink> {
        self.error_sink
    }

    pub(crate) fn aliases(&mut self) -> &mut AliasCounter {
        &mut self.aliases
    }

    pub(crate) fn root_scope(&self) -> Scope<'a> {
        Scope::new(self.table, &self.qualifier)
    }

    pub(crate) fn error_literal(&self) -> Expr {
        crate::sql::lit_str(&self.options.error_literal)
    }

    pub(crate) fn memoized(&self, column_id: &str, qualifier: &str) -> Option<Expr> {
        self.formula_memo
            .get(&(column_id.to_string(), qualifier.to_string()))
            .cloned()
    }

    pub(crate) fn memoize(&mut self, column_id: &str, qualifier: &str, expr: Expr) {
        self.formula_memo
            .insert((column_id.to_string(), qualifier.to_string()), expr);
    }

    /// Mark a formula column as being compiled. Returns the reference path
    /// when it already is.
    pub(crate) fn enter_formula(&mut self, column: &Column) -> Result<(), Vec<String>> {
        if let Some(pos) = self.visiting.iter().position(|(id, _)| *id == column.id) {
            let mut path: Vec<String> = self.visiting[pos..]
                .iter()
                .map(|(_, title)| title.clone())
                .collect();
            path.push(column.title.clone());
            return Err(path);
        }
        self.visiting.push((column.id.clone(), column.title.clone()));
        Ok(())
    }

    pub(crate) fn leave_formula(&mut self) {
        self.visiting.pop();
    }
}
