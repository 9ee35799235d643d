//! Formula function table.
//!
//! Names are matched case-insensitively. Functions with a dialect-specific
//! spelling go through [`SqlDialect`]; names that differ only in spelling
//! are remapped when the expression is rendered.

use once_cell::sync::Lazy;
use regex::Regex;

use super::context::{CompileContext, Scope};
use super::formula::{boolean_value, compile_node, is_date_identifier};
use super::lookup::AggregateHint;
use crate::error::{CompileError, CompileResult};
use crate::formula::{FormulaNode, LiteralValue};
use crate::sql::{
    cast, coalesce, func, lit_bool, lit_int, lit_null, lit_str, DateUnit, Dialect, Expr, ExprExt,
    SqlDialect,
};

static FUNCTION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid function name pattern"));

/// Compile a call of function `name`.
pub(crate) fn compile_call<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    name: &str,
    args: &[FormulaNode],
    logical: bool,
) -> CompileResult<Expr> {
    let upper = name.to_uppercase();
    let hint = AggregateHint::for_function(&upper);
    let dialect = ctx.dialect();

    match upper.as_str() {
        "CONCAT" => {
            let parts: Vec<&FormulaNode> = args.iter().collect();
            concat(ctx, scope, &parts)
        }
        "URL" => {
            arity(&upper, args, 1)?;
            let value = compile_node(ctx, scope, &args[0], hint, false)?;
            Ok(concat_exprs(
                dialect,
                vec![lit_str("URI::("), value, lit_str(")")],
            ))
        }
        "ADD" | "SUM" => {
            let values = compile_args(ctx, scope, args, hint)?;
            values
                .into_iter()
                .map(grouped)
                .rev()
                .reduce(|acc, value| value.add(acc))
                .ok_or_else(|| too_few(&upper, 1))
        }
        "MOD" => {
            arity(&upper, args, 2)?;
            let values = compile_args(ctx, scope, args, AggregateHint::Sum)?;
            let [value, divisor]: [Expr; 2] = pair(values)?;
            Ok(grouped(value).modulo(grouped(divisor)))
        }
        "MIN" | "MAX" => {
            let mut values = compile_args(ctx, scope, args, hint)?;
            match values.len() {
                0 => Err(too_few(&upper, 1)),
                1 => Ok(values.remove(0)),
                _ => {
                    let name = if upper == "MIN" { "LEAST" } else { "GREATEST" };
                    Ok(func(name, values))
                }
            }
        }
        "AVG" => {
            let values = compile_args(ctx, scope, args, hint)?;
            let count = values.len() as i64;
            if count == 1 {
                return values.into_iter().next().ok_or_else(|| too_few(&upper, 1));
            }
            let total = values
                .into_iter()
                .map(grouped)
                .reduce(|acc, value| acc.add(value))
                .ok_or_else(|| too_few(&upper, 1))?;
            Ok(cast(total.paren(), dialect.float_type())
                .div(lit_int(count))
                .paren())
        }
        "INT" => {
            arity(&upper, args, 1)?;
            let value = compile_node(ctx, scope, &args[0], AggregateHint::Sum, false)?;
            Ok(cast(value, dialect.integer_type()))
        }
        "VALUE" => {
            arity(&upper, args, 1)?;
            let value = compile_node(ctx, scope, &args[0], AggregateHint::Sum, false)?;
            Ok(cast(value, dialect.float_type()))
        }
        "LEN" | "UPPER" | "LOWER" | "TRIM" | "REPLACE" | "ABS" | "FLOOR" | "ROUND" | "SQRT"
        | "EXP" | "LOG" | "POWER" | "CEILING" => {
            let values = compile_args(ctx, scope, args, hint)?;
            Ok(func(&upper, values))
        }
        "MID" | "SUBSTR" => {
            let values = compile_args(ctx, scope, args, hint)?;
            Ok(func("SUBSTR", values))
        }
        "LEFT" | "RIGHT" | "REPEAT" => {
            arity(&upper, args, 2)?;
            let values = compile_args(ctx, scope, args, hint)?;
            let [s, count] = pair(values)?;
            Ok(match upper.as_str() {
                "LEFT" => dialect.left(s, count),
                "RIGHT" => dialect.right(s, count),
                _ => dialect.repeat(s, count),
            })
        }
        "SEARCH" => {
            arity(&upper, args, 2)?;
            let values = compile_args(ctx, scope, args, hint)?;
            let [haystack, needle] = pair(values)?;
            Ok(dialect.position(haystack, needle))
        }
        "NOW" => {
            arity(&upper, args, 0)?;
            Ok(dialect.now())
        }
        "WEEKDAY" => {
            arity(&upper, args, 1)?;
            let date = compile_node(ctx, scope, &args[0], hint, false)?;
            Ok(dialect.weekday(date))
        }
        "DATEADD" => {
            arity(&upper, args, 3)?;
            let unit = unit_arg(&upper, &args[2])?;
            let date = compile_node(ctx, scope, &args[0], hint, false)?;
            let amount = compile_node(ctx, scope, &args[1], AggregateHint::Sum, false)?;
            Ok(dialect.date_add(date, amount, unit))
        }
        "DATETIME_DIFF" => {
            if !(2..=3).contains(&args.len()) {
                return Err(CompileError::InvalidFormula(format!(
                    "{} expects 2 or 3 arguments, got {}",
                    upper,
                    args.len()
                )));
            }
            let unit = match args.get(2) {
                Some(arg) => unit_arg(&upper, arg)?,
                None => DateUnit::Second,
            };
            let end = compile_node(ctx, scope, &args[0], hint, false)?;
            let start = compile_node(ctx, scope, &args[1], hint, false)?;
            dialect.datetime_diff(end, start, unit).ok_or_else(|| {
                CompileError::InvalidFormula(format!(
                    "{} in {} is not supported by {}",
                    upper,
                    unit.keyword().to_lowercase(),
                    dialect
                ))
            })
        }
        "IF" => {
            if !(2..=3).contains(&args.len()) {
                return Err(CompileError::InvalidFormula(format!(
                    "IF expects 2 or 3 arguments, got {}",
                    args.len()
                )));
            }
            let condition = compile_node(ctx, scope, &args[0], hint, true)?;
            let then = compile_node(ctx, scope, &args[1], hint, false)?;
            let otherwise = match args.get(2) {
                Some(arg) => compile_node(ctx, scope, arg, hint, false)?,
                None => lit_null(),
            };
            Ok(Expr::Case {
                operand: None,
                when_clauses: vec![(condition, then)],
                else_clause: Some(Box::new(otherwise)),
            })
        }
        "SWITCH" => {
            if args.len() < 3 {
                return Err(too_few(&upper, 3));
            }
            let operand = compile_node(ctx, scope, &args[0], hint, false)?;
            let mut rest = compile_args(ctx, scope, &args[1..], hint)?;
            let default = if rest.len() % 2 == 1 { rest.pop() } else { None };
            let mut when_clauses = Vec::with_capacity(rest.len() / 2);
            let mut pairs = rest.into_iter();
            while let (Some(when), Some(then)) = (pairs.next(), pairs.next()) {
                when_clauses.push((when, then));
            }
            Ok(Expr::Case {
                operand: Some(Box::new(operand)),
                when_clauses,
                else_clause: default.map(Box::new),
            })
        }
        "AND" | "OR" => {
            let mut predicates = Vec::with_capacity(args.len());
            for arg in args {
                predicates.push(compile_node(ctx, scope, arg, hint, true)?);
            }
            let combined = if upper == "AND" {
                Expr::and_all(predicates)
            } else {
                Expr::or_all(predicates)
            }
            .ok_or_else(|| too_few(&upper, 1))?;
            Ok(if logical {
                combined
            } else {
                boolean_value(dialect, combined)
            })
        }
        "TRUE" | "FALSE" => {
            arity(&upper, args, 0)?;
            Ok(lit_bool(upper == "TRUE"))
        }
        "BLANK" => {
            arity(&upper, args, 0)?;
            Ok(lit_null())
        }
        _ if FUNCTION_NAME.is_match(&upper) => {
            let values = compile_args(ctx, scope, args, hint)?;
            Ok(func(&upper, values))
        }
        _ => Err(CompileError::InvalidFormula(format!(
            "'{}' is not a valid function name",
            name
        ))),
    }
}

/// Concatenate formula nodes as text, formatting date columns.
pub(crate) fn concat<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    args: &[&FormulaNode],
) -> CompileResult<Expr> {
    let dialect = ctx.dialect();
    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        let value = compile_node(ctx, scope, arg, AggregateHint::Concat, false)?;
        parts.push(if is_date_identifier(ctx, scope, arg)? {
            dialect.date_format_for_concat(value)
        } else {
            value
        });
    }
    if parts.is_empty() {
        return Err(too_few("CONCAT", 1));
    }
    Ok(concat_exprs(dialect, parts))
}

/// Null-tolerant text concatenation of `parts`.
pub(crate) fn concat_exprs(dialect: Dialect, parts: Vec<Expr>) -> Expr {
    if !dialect.supports_variadic_concat() {
        let folded = parts
            .into_iter()
            .map(|part| coalesce(vec![part, lit_str("")]))
            .reduce(|acc, part| acc.concat(part));
        return match folded {
            Some(expr) => expr.paren(),
            None => lit_str(""),
        };
    }
    if dialect == Dialect::MySql {
        let parts = parts
            .into_iter()
            .map(|part| func("IFNULL", vec![part, lit_str("")]))
            .collect();
        return func("CONCAT", parts);
    }
    func("CONCAT", parts)
}

fn compile_args<'a>(
    ctx: &mut CompileContext<'a>,
    scope: &Scope<'a>,
    args: &[FormulaNode],
    hint: AggregateHint,
) -> CompileResult<Vec<Expr>> {
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        values.push(compile_node(ctx, scope, arg, hint, false)?);
    }
    Ok(values)
}

fn grouped(expr: Expr) -> Expr {
    match expr {
        Expr::BinaryOp { .. } => expr.paren(),
        other => other,
    }
}

fn pair(values: Vec<Expr>) -> CompileResult<[Expr; 2]> {
    values
        .try_into()
        .map_err(|values: Vec<Expr>| {
            CompileError::InvalidFormula(format!("expected 2 arguments, got {}", values.len()))
        })
}

fn arity(name: &str, args: &[FormulaNode], expected: usize) -> CompileResult<()> {
    if args.len() != expected {
        return Err(CompileError::InvalidFormula(format!(
            "{} expects {} argument{}, got {}",
            name,
            expected,
            if expected == 1 { "" } else { "s" },
            args.len()
        )));
    }
    Ok(())
}

fn too_few(name: &str, minimum: usize) -> CompileError {
    CompileError::InvalidFormula(format!("{} expects at least {} argument(s)", name, minimum))
}

/// Date unit given as a text literal. `M` is months, `m` minutes.
fn unit_arg(name: &str, node: &FormulaNode) -> CompileResult<DateUnit> {
    let FormulaNode::Literal {
        value: LiteralValue::Text(unit),
    } = node
    else {
        return Err(CompileError::InvalidFormula(format!(
            "{} expects a text unit",
            name
        )));
    };
    if unit.trim() == "M" {
        return Ok(DateUnit::Month);
    }
    unit.parse().map_err(CompileError::InvalidFormula)
}
