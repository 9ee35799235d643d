//! Text parser for formulas using chumsky.
//!
//! Operator precedence, loosest first:
//! `||`, `&&`, `&`, `== != = <>`, `< <= > >=`, `+ -`, `* / %`, prefix `- + !`.
//! Column references are bare identifiers or `{Column Title}`.

use chumsky::prelude::*;

use super::ast::{BinaryOp, FormulaNode, LiteralValue, UnaryOp};
use crate::error::{CompileError, CompileResult};

/// Create the formula parser.
pub fn parser<'src>() -> impl Parser<'src, &'src str, FormulaNode, extra::Err<Rich<'src, char>>> {
    recursive(|expr| {
        let number = text::int(10)
            .then(just('.').then(text::digits(10)).or_not())
            .to_slice()
            .try_map(|s: &str, span| {
                if let Ok(n) = s.parse::<i64>() {
                    return Ok(LiteralValue::Int(n));
                }
                s.parse::<f64>()
                    .map(LiteralValue::Float)
                    .map_err(|e| Rich::custom(span, e.to_string()))
            })
            .labelled("number");

        let escape = just('\\').ignore_then(any());
        let double_quoted = none_of("\\\"")
            .or(escape.clone())
            .repeated()
            .collect::<String>()
            .delimited_by(just('"'), just('"'));
        let single_quoted = none_of("\\'")
            .or(escape)
            .repeated()
            .collect::<String>()
            .delimited_by(just('\''), just('\''));
        let string = double_quoted
            .or(single_quoted)
            .map(LiteralValue::Text)
            .labelled("string");

        let braced = none_of('}')
            .repeated()
            .at_least(1)
            .to_slice()
            .delimited_by(just('{'), just('}'))
            .map(|name: &str| FormulaNode::ident(name.trim()))
            .labelled("column reference");

        let arguments = expr
            .clone()
            .separated_by(just(',').padded())
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just('(').padded(), just(')').padded());

        let name_or_call = text::ident()
            .then(arguments.or_not())
            .map(|(name, args): (&str, Option<Vec<FormulaNode>>)| match args {
                Some(args) => FormulaNode::call(name, args),
                None => match name {
                    "true" => FormulaNode::Literal {
                        value: LiteralValue::Bool(true),
                    },
                    "false" => FormulaNode::Literal {
                        value: LiteralValue::Bool(false),
                    },
                    "null" => FormulaNode::Literal {
                        value: LiteralValue::Null,
                    },
                    _ => FormulaNode::ident(name),
                },
            });

        let atom = choice((
            number.map(|value| FormulaNode::Literal { value }),
            string.map(|value| FormulaNode::Literal { value }),
            braced,
            name_or_call,
            expr.clone().delimited_by(just('('), just(')')),
        ))
        .padded();

        let prefix = choice((
            just('-').to(UnaryOp::Minus),
            just('+').to(UnaryOp::Plus),
            just('!').then_ignore(just('=').not()).to(UnaryOp::Not),
        ))
        .padded();

        let unary = prefix
            .repeated()
            .foldr(atom, |op, argument| FormulaNode::unary(op, argument));

        let product = unary.clone().foldl(
            choice((
                just('*').to(BinaryOp::Mul),
                just('/').to(BinaryOp::Div),
                just('%').to(BinaryOp::Mod),
            ))
            .padded()
            .then(unary)
            .repeated(),
            |left, (op, right)| FormulaNode::binary(op, left, right),
        );

        let sum = product.clone().foldl(
            choice((just('+').to(BinaryOp::Add), just('-').to(BinaryOp::Sub)))
                .padded()
                .then(product)
                .repeated(),
            |left, (op, right)| FormulaNode::binary(op, left, right),
        );

        let relational = sum.clone().foldl(
            choice((
                just("<=").to(BinaryOp::Lte),
                just(">=").to(BinaryOp::Gte),
                just('<').then_ignore(just('>').not()).to(BinaryOp::Lt),
                just('>').to(BinaryOp::Gt),
            ))
            .padded()
            .then(sum)
            .repeated(),
            |left, (op, right)| FormulaNode::binary(op, left, right),
        );

        let equality = relational.clone().foldl(
            choice((
                just("==").to(BinaryOp::Eq),
                just("!=").to(BinaryOp::Ne),
                just("<>").to(BinaryOp::Ne),
                just('=').to(BinaryOp::Eq),
            ))
            .padded()
            .then(relational)
            .repeated(),
            |left, (op, right)| FormulaNode::binary(op, left, right),
        );

        let concat = equality.clone().foldl(
            just('&')
                .then_ignore(just('&').not())
                .to(BinaryOp::Concat)
                .padded()
                .then(equality)
                .repeated(),
            |left, (op, right)| FormulaNode::binary(op, left, right),
        );

        let conjunction = concat.clone().foldl(
            just("&&")
                .to(BinaryOp::And)
                .padded()
                .then(concat)
                .repeated(),
            |left, (op, right)| FormulaNode::binary(op, left, right),
        );

        conjunction.clone().foldl(
            just("||")
                .to(BinaryOp::Or)
                .padded()
                .then(conjunction)
                .repeated(),
            |left, (op, right)| FormulaNode::binary(op, left, right),
        )
    })
    .then_ignore(end())
}

/// Parse formula text into a tree.
pub fn parse_formula(source: &str) -> CompileResult<FormulaNode> {
    parser().parse(source).into_result().map_err(|errors| {
        let message = errors
            .into_iter()
            .map(|e| {
                let span = e.span();
                format!("{}..{}: {}", span.start(), span.end(), e)
            })
            .collect::<Vec<_>>()
            .join("; ");
        CompileError::InvalidFormula(message)
    })
}
