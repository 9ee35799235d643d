//! Formula compilation.
//!
//! A formula tree compiles to one scalar expression. Identifiers resolve
//! against the table in scope; virtual referents are compiled recursively,
//! formula referents are memoized per compile call.
//!
//! Comparisons are null-safe: MySQL wraps them in `IFNULL`, the other
//! dialects turn them into a `CASE` yielding a boolean unless they sit
//! directly under AND/OR.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;

use super::context::{CompileContext, Scope};
use super::functions;
use super::lookup::{column_value, AggregateHint};
use crate::error::{CompileError, CompileResult};
use crate::formula::{BinaryOp, FormulaNode, LiteralValue, UnaryOp};
use crate::model::{Column, ColumnKind};
use crate::resolve::ColumnDescriptor;
use crate::sql::{
    cast, func, lit_bool, lit_int, lit_null, lit_str, param, BinaryOperator, Dialect, Expr,
    ExprExt, SqlDialect,
};

/// Compile a formula tree against the context's table.
pub fn compile_formula(ctx: &mut CompileContext, node: &FormulaNode) -> CompileResult<Expr> {
    let scope = ctx.root_scope();
    compile_node(ctx, &scope, node, AggregateHint::Concat, false)
}

/// Compile the stored formula of a formula column of the context's table.
pub fn compile_formula_column(ctx: &mut CompileContext, reference: &str) -> CompileResult<Expr> {
    let scope = ctx.root_scope();
    let column = ctx.resolver().column(&scope.table.id, reference)?;
    if !matches!(column.kind, ColumnKind::Formula(_)) {
        return Err(CompileError::InvalidSchema(format!(
            "column '{}' is not a formula column",
            column.title
        )));
    }
    compile_column(ctx, &scope, column)
}

/// Compile a formula column on rows qualified by `scope`.
///
/// A column carrying a persisted error compiles to the error literal.
pub(crate) fn compile_column<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    column: &'a Column,
) -> CompileResult<Expr> {
    if let ColumnKind::Formula(options) = &column.kind {
        if options.error.is_some() {
            return Ok(ctx.error_literal());
        }
    }
    if let Some(expr) = ctx.memoized(&column.id, &scope.qualifier) {
        debug!("formula memo hit for {} at {}", column.title, scope.qualifier);
        return Ok(expr);
    }

    let expr = compile_definition(ctx, scope, column)?;
    ctx.memoize(&column.id, &scope.qualifier, expr.clone());
    Ok(expr)
}

/// Compile the stored tree of a formula column, ignoring any persisted
/// error.
pub(crate) fn compile_definition<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    column: &'a Column,
) -> CompileResult<Expr> {
    ctx.enter_formula(column)
        .map_err(CompileError::CircularFormulaReference)?;
    let compiled = ctx
        .resolver()
        .formula_ast(column)
        .and_then(|ast| compile_node(ctx, scope, &ast, AggregateHint::Concat, false));
    ctx.leave_formula();
    compiled
}

/// Compile one node.
///
/// `hint` aggregates multi-valued identifiers. `logical` is set when the
/// node is an operand of AND/OR, where bare predicates are expected.
pub(crate) fn compile_node<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    node: &FormulaNode,
    hint: AggregateHint,
    logical: bool,
) -> CompileResult<Expr> {
    match node {
        FormulaNode::Literal { value } => literal(value),
        FormulaNode::Identifier { name } => {
            let column = ctx.resolver().column(&scope.table.id, name)?;
            column_value(ctx, scope, column, hint, &mut Vec::new())
        }
        FormulaNode::CallExpression { callee, arguments } => {
            functions::compile_call(ctx, scope, &callee.name, arguments, logical)
        }
        FormulaNode::BinaryExpression {
            operator,
            left,
            right,
        } => binary(ctx, scope, *operator, left, right, hint, logical),
        FormulaNode::UnaryExpression { operator, argument } => {
            unary(ctx, scope, *operator, argument, hint, logical)
        }
    }
}

fn literal(value: &LiteralValue) -> CompileResult<Expr> {
    Ok(match value {
        LiteralValue::Int(n) => param(*n),
        LiteralValue::Float(f) if f.is_finite() => param(*f),
        LiteralValue::Float(f) => {
            return Err(CompileError::InvalidFormula(format!(
                "number {} is out of range",
                f
            )))
        }
        LiteralValue::Text(s) => param(s.as_str()),
        LiteralValue::Bool(b) => lit_bool(*b),
        LiteralValue::Null => lit_null(),
    })
}

/// Whether `node` names a plain date or date-time column.
pub(crate) fn is_date_identifier(
    ctx: &CompileContext,
    scope: &Scope,
    node: &FormulaNode,
) -> CompileResult<bool> {
    let FormulaNode::Identifier { name } = node else {
        return Ok(false);
    };
    let resolver = ctx.resolver();
    let column = resolver.column(&scope.table.id, name)?;
    Ok(match resolver.describe(column)? {
        ColumnDescriptor::Plain(column) => column.uidt.is_date() || column.uidt.is_datetime(),
        _ => false,
    })
}

// ============================================================================
// Binary expressions
// ============================================================================

fn binary<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    op: BinaryOp,
    left: &FormulaNode,
    right: &FormulaNode,
    hint: AggregateHint,
    logical: bool,
) -> CompileResult<Expr> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            let l = compile_node(ctx, scope, left, hint, true)?;
            let r = compile_node(ctx, scope, right, hint, true)?;
            let expr = if op == BinaryOp::And {
                l.and_grouped(r)
            } else {
                l.or_grouped(r)
            };
            Ok(if logical {
                expr
            } else {
                boolean_value(ctx.dialect(), expr)
            })
        }
        BinaryOp::Concat => functions::concat(ctx, scope, &[left, right]),
        BinaryOp::Div => {
            let float = ctx.dialect().float_type();
            let l = compile_node(ctx, scope, left, AggregateHint::Sum, false)?;
            let r = compile_node(ctx, scope, right, AggregateHint::Sum, false)?;
            Ok(cast(l, float).div(cast(r, float)))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Mod => {
            let sql_op = sql_operator(op);
            let l = compile_node(ctx, scope, left, AggregateHint::Sum, false)?;
            let r = compile_node(ctx, scope, right, AggregateHint::Sum, false)?;
            Ok(arithmetic_operand(l, sql_op, false).binary(sql_op, arithmetic_operand(r, sql_op, true)))
        }
        BinaryOp::Eq
        | BinaryOp::Ne
        | BinaryOp::Lt
        | BinaryOp::Lte
        | BinaryOp::Gt
        | BinaryOp::Gte => comparison(ctx, scope, op, left, right, logical),
    }
}

/// Parenthesize an operand whose own operator would bind differently.
fn arithmetic_operand(expr: Expr, parent: BinaryOperator, right: bool) -> Expr {
    let associative = matches!(parent, BinaryOperator::Plus | BinaryOperator::Mul);
    let wrap = match &expr {
        Expr::BinaryOp { op, .. } => *op != parent || (right && !associative),
        Expr::UnaryOp { .. } => true,
        _ => false,
    };
    if wrap {
        expr.paren()
    } else {
        expr
    }
}

fn comparison<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    op: BinaryOp,
    left: &FormulaNode,
    right: &FormulaNode,
    logical: bool,
) -> CompileResult<Expr> {
    let dialect = ctx.dialect();
    let equality = matches!(op, BinaryOp::Eq | BinaryOp::Ne);
    let hint = if equality {
        AggregateHint::Concat
    } else {
        AggregateHint::Sum
    };

    if equality && (left.is_empty_string() || right.is_empty_string()) {
        let other = if right.is_empty_string() { left } else { right };
        let value = operand(compile_node(ctx, scope, other, hint, false)?);
        let text = cast(value.clone(), dialect.text_type());
        let cmp = if op == BinaryOp::Eq {
            value.is_null().or(text.eq(lit_str(""))).paren()
        } else {
            value.is_not_null().and(text.ne(lit_str(""))).paren()
        };
        return Ok(wrap_comparison(dialect, cmp, op == BinaryOp::Eq, logical));
    }

    for (date_side, other) in [(left, right), (right, left)] {
        if is_date_identifier(ctx, scope, date_side)? && is_non_date_literal(other) {
            debug!(
                "comparing date column with non-date literal {:?}, falling back to a null check",
                other
            );
            let value = operand(compile_node(ctx, scope, date_side, hint, false)?);
            return Ok(wrap_comparison(dialect, value.is_not_null(), false, logical));
        }
    }

    let l = operand(compile_node(ctx, scope, left, hint, false)?);
    let r = operand(compile_node(ctx, scope, right, hint, false)?);
    let cmp = l.binary(sql_operator(op), r);
    Ok(wrap_comparison(dialect, cmp, false, logical))
}

/// Parenthesize a compound operand of a comparison or null check.
fn operand(expr: Expr) -> Expr {
    match expr {
        Expr::BinaryOp { .. } => expr.paren(),
        other => other,
    }
}

fn is_non_date_literal(node: &FormulaNode) -> bool {
    match node {
        FormulaNode::Literal {
            value: LiteralValue::Text(s),
        } => !is_date_text(s),
        FormulaNode::Literal {
            value: LiteralValue::Null,
        } => false,
        FormulaNode::Literal { .. } => true,
        _ => false,
    }
}

fn is_date_text(s: &str) -> bool {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || DateTime::parse_from_rfc3339(s).is_ok()
}

/// Make a comparison null-safe for a value position.
fn wrap_comparison(dialect: Dialect, cmp: Expr, null_default: bool, logical: bool) -> Expr {
    match dialect {
        Dialect::MySql => func("IFNULL", vec![cmp, lit_int(i64::from(null_default))]),
        _ if logical => cmp,
        _ => boolean_value(dialect, cmp),
    }
}

/// `CASE WHEN predicate THEN true ELSE false END`.
pub(crate) fn boolean_value(dialect: Dialect, predicate: Expr) -> Expr {
    if dialect == Dialect::MySql {
        return predicate;
    }
    Expr::Case {
        operand: None,
        when_clauses: vec![(predicate, lit_bool(true))],
        else_clause: Some(Box::new(lit_bool(false))),
    }
}

// ============================================================================
// Unary expressions
// ============================================================================

fn unary<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    op: UnaryOp,
    argument: &FormulaNode,
    hint: AggregateHint,
    logical: bool,
) -> CompileResult<Expr> {
    match op {
        UnaryOp::Minus => {
            let value = compile_node(ctx, scope, argument, AggregateHint::Sum, false)?;
            Ok(Expr::negate(operand(value)))
        }
        UnaryOp::Plus => compile_node(ctx, scope, argument, hint, logical),
        UnaryOp::Not => {
            let value = compile_node(ctx, scope, argument, hint, true)?;
            let negated = value.paren().not();
            Ok(if logical {
                negated
            } else {
                boolean_value(ctx.dialect(), negated)
            })
        }
    }
}

pub(crate) fn sql_operator(op: BinaryOp) -> BinaryOperator {
    match op {
        BinaryOp::Add => BinaryOperator::Plus,
        BinaryOp::Sub => BinaryOperator::Minus,
        BinaryOp::Mul => BinaryOperator::Mul,
        BinaryOp::Div => BinaryOperator::Div,
        BinaryOp::Mod => BinaryOperator::Mod,
        BinaryOp::Concat => BinaryOperator::Concat,
        BinaryOp::Eq => BinaryOperator::Eq,
        BinaryOp::Ne => BinaryOperator::Ne,
        BinaryOp::Lt => BinaryOperator::Lt,
        BinaryOp::Lte => BinaryOperator::Lte,
        BinaryOp::Gt => BinaryOperator::Gt,
        BinaryOp::Gte => BinaryOperator::Gte,
        BinaryOp::And => BinaryOperator::And,
        BinaryOp::Or => BinaryOperator::Or,
    }
}
