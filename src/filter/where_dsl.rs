//! Parser for the `where` query-string DSL using chumsky.
//!
//! ```text
//! (Age,gt,18)~and((Name,like,John)~or(Name,like,Jane))
//! ~not(Status,eq,archived)
//! (Created,eq,daysAgo,3)
//! ```
//!
//! A leaf is `(column,op[,value])`; for date operators the first value
//! segment may name a sub-operator. Leaves and parenthesized groups are
//! joined by `~and`, `~or` and `~not`.

use chumsky::prelude::*;

use super::tree::{ComparisonOp, ComparisonSubOp, Filter, FilterLeaf, FilterValue, LogicalOp};
use crate::error::{CompileError, CompileResult};

/// Create the where-clause parser.
pub fn parser<'src>() -> impl Parser<'src, &'src str, Vec<Filter>, extra::Err<Rich<'src, char>>> {
    let connective = just('~')
        .ignore_then(choice((
            just("and").to(LogicalOp::And),
            just("or").to(LogicalOp::Or),
            just("not").to(LogicalOp::Not),
        )))
        .padded()
        .labelled("~and, ~or or ~not");

    recursive(|filters| {
        let column = none_of(",()~")
            .repeated()
            .at_least(1)
            .to_slice()
            .map(|s: &str| s.trim().to_string())
            .labelled("column");

        let op = none_of(",)")
            .repeated()
            .at_least(1)
            .to_slice()
            .try_map(|s: &str, span| s.parse::<ComparisonOp>().map_err(|e| Rich::custom(span, e)))
            .labelled("comparison operator");

        let rest = just(',')
            .ignore_then(none_of(")").repeated().to_slice())
            .or_not();

        let leaf = column
            .then_ignore(just(','))
            .then(op)
            .then(rest)
            .delimited_by(just('('), just(')'))
            .map(|((column, op), rest): ((String, ComparisonOp), Option<&str>)| {
                Filter::Leaf(build_leaf(column, op, rest))
            });

        let group = filters
            .delimited_by(just('('), just(')'))
            .map(Filter::group);

        let term = choice((group, leaf)).padded();

        connective
            .clone()
            .or_not()
            .then(term.clone())
            .map(|(op, filter)| filter.with_logical_op(op.unwrap_or_default()))
            .then(
                connective
                    .clone()
                    .then(term)
                    .map(|(op, filter)| filter.with_logical_op(op))
                    .repeated()
                    .collect::<Vec<_>>(),
            )
            .map(|(first, rest)| {
                let mut all = Vec::with_capacity(rest.len() + 1);
                all.push(first);
                all.extend(rest);
                all
            })
    })
    .then_ignore(end())
}

fn build_leaf(column: String, op: ComparisonOp, rest: Option<&str>) -> FilterLeaf {
    let mut sub_op = None;
    let mut value = rest.map(str::trim).unwrap_or("");

    if op.takes_sub_op() {
        let (head, tail) = match value.split_once(',') {
            Some((head, tail)) => (head, tail),
            None => (value, ""),
        };
        if let Ok(parsed) = head.parse::<ComparisonSubOp>() {
            sub_op = Some(parsed);
            value = tail.trim();
        }
    }

    FilterLeaf {
        logical_op: LogicalOp::And,
        column,
        op,
        sub_op,
        value: if value.is_empty() {
            FilterValue::Null
        } else {
            FilterValue::text(value)
        },
    }
}

/// Parse a where-clause string into a filter list.
///
/// An empty or blank string yields no filters.
pub fn parse_where(source: &str) -> CompileResult<Vec<Filter>> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }

    parser().parse(source).into_result().map_err(|errors| {
        let first = errors.into_iter().next();
        match first {
            Some(e) => {
                let span = e.span();
                CompileError::WhereParse {
                    start: span.start(),
                    end: span.end(),
                    message: e.to_string(),
                }
            }
            None => CompileError::WhereParse {
                start: 0,
                end: source.len(),
                message: "invalid where clause".into(),
            },
        }
    })
}
