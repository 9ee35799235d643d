//! Date comparisons and date sub-operators.
//!
//! Sub-operators are offsets from the context's "now", computed at compile
//! time and bound as formatted date strings. DateTime columns are truncated
//! to their date part first.

use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime};

use super::condition::{comparison_operator, Field, FieldKind};
use super::context::CompileContext;
use crate::error::{CompileError, CompileResult};
use crate::filter::{ComparisonOp, ComparisonSubOp, FilterLeaf, FilterValue};
use crate::sql::{param, BinaryOperator, Expr, ExprExt, SqlDialect};

pub(crate) fn compare_date(
    ctx: &CompileContext,
    field: &Field,
    op: ComparisonOp,
    leaf: &FilterLeaf,
) -> CompileResult<Option<Expr>> {
    let raw = field.expr.clone();
    let f = if field.kind == FieldKind::DateTime {
        ctx.dialect().truncate_to_date(raw.clone())
    } else {
        raw.clone()
    };
    let today = ctx.now().date();
    let bind = |date: NaiveDate| param(date.format(&ctx.options().date_format).to_string());

    if let Some(operator) = comparison_operator(op) {
        let date = match leaf.sub_op {
            Some(sub_op) if sub_op.is_range() => {
                return Err(CompileError::UnsupportedOperator {
                    op: format!("{} {}", op, sub_op.as_str()),
                    column: field.name.clone(),
                })
            }
            Some(sub_op) => resolve_sub_op(today, sub_op, &leaf.value, &field.name)?,
            None if leaf.value.is_empty() => {
                return Ok(match op {
                    ComparisonOp::Eq => Some(raw.is_null()),
                    ComparisonOp::Neq => Some(raw.is_not_null()),
                    _ => None,
                })
            }
            None => Some(parse_date(&leaf.value, &field.name)?),
        };
        let Some(date) = date else {
            return Ok(None);
        };

        let cmp = f.binary(operator, bind(date));
        return Ok(Some(if operator == BinaryOperator::Ne {
            cmp.or(raw.is_null()).paren()
        } else {
            cmp
        }));
    }

    let expr = match op {
        ComparisonOp::Null | ComparisonOp::Empty | ComparisonOp::Blank => raw.is_null(),
        ComparisonOp::Notnull | ComparisonOp::Notempty | ComparisonOp::Notblank => raw.is_not_null(),
        ComparisonOp::IsWithin => {
            let sub_op = leaf.sub_op.filter(|s| s.is_range()).ok_or_else(|| {
                CompileError::InvalidFilter(format!(
                    "isWithin on column {} needs a range such as pastWeek",
                    field.name
                ))
            })?;
            let Some((from, to)) = range(today, sub_op, &leaf.value, &field.name)? else {
                return Ok(None);
            };
            f.between(bind(from), bind(to))
        }
        ComparisonOp::Btw | ComparisonOp::Nbtw => {
            let items = leaf.value.items();
            let [low, high] = items.as_slice() else {
                return Err(CompileError::InvalidFilter(format!(
                    "{} on column {} expects two dates",
                    op, field.name
                )));
            };
            let low = bind(parse_date(&FilterValue::text(low), &field.name)?);
            let high = bind(parse_date(&FilterValue::text(high), &field.name)?);
            if op == ComparisonOp::Btw {
                f.between(low, high)
            } else {
                f.not_between(low, high)
            }
        }
        other => {
            return Err(CompileError::UnsupportedOperator {
                op: other.to_string(),
                column: field.name.clone(),
            })
        }
    };
    Ok(Some(expr))
}

/// The date a point sub-operator names. `None` when a day count is missing.
fn resolve_sub_op(
    today: NaiveDate,
    sub_op: ComparisonSubOp,
    value: &FilterValue,
    column: &str,
) -> CompileResult<Option<NaiveDate>> {
    let date = match sub_op {
        ComparisonSubOp::Today => today,
        ComparisonSubOp::Tomorrow => shift_days(today, 1)?,
        ComparisonSubOp::Yesterday => shift_days(today, -1)?,
        ComparisonSubOp::OneWeekAgo => shift_days(today, -7)?,
        ComparisonSubOp::OneWeekFromNow => shift_days(today, 7)?,
        ComparisonSubOp::OneMonthAgo => shift_months(today, -1)?,
        ComparisonSubOp::OneMonthFromNow => shift_months(today, 1)?,
        ComparisonSubOp::DaysAgo => match day_count(value, column)? {
            Some(n) => shift_days(today, -n)?,
            None => return Ok(None),
        },
        ComparisonSubOp::DaysFromNow => match day_count(value, column)? {
            Some(n) => shift_days(today, n)?,
            None => return Ok(None),
        },
        ComparisonSubOp::ExactDate => {
            if value.is_empty() {
                return Ok(None);
            }
            parse_date(value, column)?
        }
        range => {
            return Err(CompileError::InvalidFilter(format!(
                "{} names a range, not a date",
                range.as_str()
            )))
        }
    };
    Ok(Some(date))
}

/// `(from, to)` of a range sub-operator.
fn range(
    today: NaiveDate,
    sub_op: ComparisonSubOp,
    value: &FilterValue,
    column: &str,
) -> CompileResult<Option<(NaiveDate, NaiveDate)>> {
    let bounds = match sub_op {
        ComparisonSubOp::PastWeek => (shift_days(today, -7)?, today),
        ComparisonSubOp::PastMonth => (shift_months(today, -1)?, today),
        ComparisonSubOp::PastYear => (shift_months(today, -12)?, today),
        ComparisonSubOp::NextWeek => (today, shift_days(today, 7)?),
        ComparisonSubOp::NextMonth => (today, shift_months(today, 1)?),
        ComparisonSubOp::NextYear => (today, shift_months(today, 12)?),
        ComparisonSubOp::PastNumberOfDays => match day_count(value, column)? {
            Some(n) => (shift_days(today, -n)?, today),
            None => return Ok(None),
        },
        ComparisonSubOp::NextNumberOfDays => match day_count(value, column)? {
            Some(n) => (today, shift_days(today, n)?),
            None => return Ok(None),
        },
        point => {
            return Err(CompileError::InvalidFilter(format!(
                "{} is not a range",
                point.as_str()
            )))
        }
    };
    Ok(Some(bounds))
}

fn out_of_range() -> CompileError {
    CompileError::InvalidFilter("date out of range".into())
}

fn shift_days(date: NaiveDate, days: i64) -> CompileResult<NaiveDate> {
    let shifted = if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    };
    shifted.ok_or_else(out_of_range)
}

fn shift_months(date: NaiveDate, months: i32) -> CompileResult<NaiveDate> {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.unsigned_abs()))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.ok_or_else(out_of_range)
}

fn day_count(value: &FilterValue, column: &str) -> CompileResult<Option<i64>> {
    if value.is_empty() {
        return Ok(None);
    }
    match value.as_number() {
        Some(crate::filter::Number::Int(n)) => Ok(Some(n)),
        Some(crate::filter::Number::Float(f)) => Ok(Some(f.trunc() as i64)),
        None => Err(CompileError::InvalidFilter(format!(
            "'{}' is not a number of days for column {}",
            value.as_text().unwrap_or_default(),
            column
        ))),
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339 into a date.
fn parse_date(value: &FilterValue, column: &str) -> CompileResult<NaiveDate> {
    let text = value.as_text().unwrap_or_default();
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| DateTime::parse_from_rfc3339(text).map(|dt| dt.date_naive()))
        .map_err(|_| {
            CompileError::InvalidFilter(format!("'{}' is not a date for column {}", text, column))
        })
}
