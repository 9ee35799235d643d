//! Formula expression tree.
//!
//! The shape mirrors the JSON produced by JSEP-style expression parsers:
//! every node carries a `type` tag and identifiers refer to columns by id,
//! title or physical name.

use serde::{Deserialize, Serialize};

/// A node of a parsed formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FormulaNode {
    Literal {
        value: LiteralValue,
    },
    Identifier {
        name: String,
    },
    CallExpression {
        callee: Callee,
        #[serde(default)]
        arguments: Vec<FormulaNode>,
    },
    BinaryExpression {
        operator: BinaryOp,
        left: Box<FormulaNode>,
        right: Box<FormulaNode>,
    },
    UnaryExpression {
        operator: UnaryOp,
        argument: Box<FormulaNode>,
    },
}

/// Function being called. Only the name is meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callee {
    pub name: String,
}

/// Literal value of a formula node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl LiteralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Binary operators accepted in formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "&")]
    Concat,
    #[serde(rename = "==", alias = "=")]
    Eq,
    #[serde(rename = "!=", alias = "<>")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

/// Prefix operators accepted in formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "!")]
    Not,
}

impl FormulaNode {
    pub fn int(n: i64) -> Self {
        FormulaNode::Literal {
            value: LiteralValue::Int(n),
        }
    }

    pub fn float(f: f64) -> Self {
        FormulaNode::Literal {
            value: LiteralValue::Float(f),
        }
    }

    pub fn text(s: &str) -> Self {
        FormulaNode::Literal {
            value: LiteralValue::Text(s.to_string()),
        }
    }

    pub fn ident(name: &str) -> Self {
        FormulaNode::Identifier {
            name: name.to_string(),
        }
    }

    pub fn call(name: &str, arguments: Vec<FormulaNode>) -> Self {
        FormulaNode::CallExpression {
            callee: Callee {
                name: name.to_string(),
            },
            arguments,
        }
    }

    pub fn binary(operator: BinaryOp, left: FormulaNode, right: FormulaNode) -> Self {
        FormulaNode::BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(operator: UnaryOp, argument: FormulaNode) -> Self {
        FormulaNode::UnaryExpression {
            operator,
            argument: Box::new(argument),
        }
    }

    /// Parse the JSON form of a formula tree.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Names of every identifier referenced by this tree, in visit order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            FormulaNode::Literal { .. } => {}
            FormulaNode::Identifier { name } => names.push(name),
            FormulaNode::CallExpression { arguments, .. } => {
                for arg in arguments {
                    arg.collect_identifiers(names);
                }
            }
            FormulaNode::BinaryExpression { left, right, .. } => {
                left.collect_identifiers(names);
                right.collect_identifiers(names);
            }
            FormulaNode::UnaryExpression { argument, .. } => argument.collect_identifiers(names),
        }
    }

    /// Whether this node is the literal empty string.
    pub fn is_empty_string(&self) -> bool {
        matches!(self, FormulaNode::Literal { value: LiteralValue::Text(s) } if s.is_empty())
    }
}
