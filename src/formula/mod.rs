//! Formula trees: the JSON shape stored on formula columns and a parser
//! for the textual form users type.

pub mod ast;
pub mod parser;

pub use ast::{BinaryOp, Callee, FormulaNode, LiteralValue, UnaryOp};
pub use parser::parse_formula;
