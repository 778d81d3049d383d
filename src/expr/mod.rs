mod eval;
mod lexer;
mod parser;
mod token;

pub use eval::{evaluate, evaluate_to_bool};

use crate::position::Position;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Literal { value: Value, pos: Position },
    Identifier { name: String, pos: Position },
    Unary { op: UnaryOp, right: Box<Expr>, pos: Position },
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr>, pos: Position },
    Call { name: String, args: Vec<Expr>, pos: Position },
}

impl Expr {
    pub fn pos(&self) -> Position {
        match self {
            Expr::Literal { pos, .. }
            | Expr::Identifier { pos, .. }
            | Expr::Unary { pos, .. }
            | Expr::Binary { pos, .. }
            | Expr::Call { pos, .. } => *pos,
        }
    }
}

/// Parse an expression string into a tree, ready for repeated evaluation.
pub fn parse(src: &str) -> crate::error::Result<Expr> {
    let tokens = lexer::tokenize(src)?;
    parser::parse_expr(&tokens)
}
