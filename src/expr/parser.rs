use super::token::{ExprToken, ExprTokenKind};
use super::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, Result};
use crate::value::Value;

struct ExprParser<'t> {
    tokens: &'t [ExprToken],
    pos: usize,
}

pub fn parse_expr(tokens: &[ExprToken]) -> Result<Expr> {
    let mut p = ExprParser { tokens, pos: 0 };
    let expr = p.parse_or()?;
    if p.peek().kind != ExprTokenKind::Eof {
        return Err(Error::ExprUnexpectedToken(p.peek().pos));
    }
    Ok(expr)
}

impl<'t> ExprParser<'t> {
    fn peek(&self) -> &ExprToken {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> ExprToken {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.peek().kind == ExprTokenKind::Or {
            let pos = self.advance().pos;
            let right = self.parse_and()?;
            left = Expr::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_equality()?;
        while self.peek().kind == ExprTokenKind::And {
            let pos = self.advance().pos;
            let right = self.parse_equality()?;
            left = Expr::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek().kind {
                ExprTokenKind::Eq => BinaryOp::Eq,
                ExprTokenKind::Neq => BinaryOp::Neq,
                _ => break,
            };
            let pos = self.advance().pos;
            let right = self.parse_comparison()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek().kind {
                ExprTokenKind::Lt => BinaryOp::Lt,
                ExprTokenKind::Gt => BinaryOp::Gt,
                ExprTokenKind::Lte => BinaryOp::Lte,
                ExprTokenKind::Gte => BinaryOp::Gte,
                _ => break,
            };
            let pos = self.advance().pos;
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                pos,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.peek().kind == ExprTokenKind::Not {
            let pos = self.advance().pos;
            let right = self.parse_unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                right: Box::new(right),
                pos,
            });
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let tok = self.peek().clone();
        match tok.kind {
            ExprTokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Str(s),
                    pos: tok.pos,
                })
            }
            ExprTokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Float(n),
                    pos: tok.pos,
                })
            }
            ExprTokenKind::True => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Bool(true),
                    pos: tok.pos,
                })
            }
            ExprTokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Bool(false),
                    pos: tok.pos,
                })
            }
            ExprTokenKind::Nil => {
                self.advance();
                Ok(Expr::Literal {
                    value: Value::Nil,
                    pos: tok.pos,
                })
            }
            ExprTokenKind::LParen => {
                self.advance();
                let inner = self.parse_or()?;
                if self.peek().kind != ExprTokenKind::RParen {
                    return Err(Error::ExprExpectedRParen(self.peek().pos));
                }
                self.advance();
                Ok(inner)
            }
            ExprTokenKind::Ident => {
                self.advance();
                if self.peek().kind == ExprTokenKind::LParen {
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek().kind != ExprTokenKind::RParen {
                        loop {
                            args.push(self.parse_or()?);
                            if self.peek().kind == ExprTokenKind::Comma {
                                self.advance();
                                continue;
                            }
                            break;
                        }
                    }
                    if self.peek().kind != ExprTokenKind::RParen {
                        return Err(Error::ExprExpectedRParen(self.peek().pos));
                    }
                    self.advance();
                    Ok(Expr::Call {
                        name: tok.text,
                        args,
                        pos: tok.pos,
                    })
                } else {
                    Ok(Expr::Identifier {
                        name: tok.text,
                        pos: tok.pos,
                    })
                }
            }
            _ => Err(Error::ExprUnexpectedToken(tok.pos)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::*;

    #[test]
    fn precedence_and_before_or() {
        let tokens = tokenize("true || false && false").unwrap();
        let expr = parse_expr(&tokens).unwrap();
        match expr {
            Expr::Binary { op: BinaryOp::Or, .. } => {}
            _ => panic!("expected top-level or"),
        }
    }

    #[test]
    fn call_with_args() {
        let tokens = tokenize("contains(items, x)").unwrap();
        let expr = parse_expr(&tokens).unwrap();
        match expr {
            Expr::Call { name, args, .. } => {
                assert_eq!(name, "contains");
                assert_eq!(args.len(), 2);
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn parenthesized_grouping() {
        let tokens = tokenize("!(a == b)").unwrap();
        let expr = parse_expr(&tokens).unwrap();
        assert!(matches!(expr, Expr::Unary { .. }));
    }
}
