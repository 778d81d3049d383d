use super::Parser;
use crate::error::{Error, Result};
use crate::lexer::TokenKind;
use crate::node::{Attributes, Branch, Node};
use crate::position::Position;

impl<'t> Parser<'t> {
    /// `prompty.if`'s own open tag (name + attributes) has already been
    /// consumed; `attrs` are its attributes and `pos` its position.
    pub(super) fn parse_conditional(&mut self, attrs: Attributes, pos: Position) -> Result<Node> {
        self.expect_block_open(pos)?;
        let condition = require_eval(&attrs, pos, "`prompty.if`")?;
        let children = self.parse_branch_body()?;
        let mut branches = vec![Branch {
            condition: Some(condition),
            is_else: false,
            children,
            pos,
        }];

        loop {
            match self.peek_sibling_tag() {
                Some("prompty.elseif") => {
                    let (branch_pos, branch_attrs) = self.consume_branch_open()?;
                    let cond = require_eval(&branch_attrs, branch_pos, "`prompty.elseif`")?;
                    let children = self.parse_branch_body()?;
                    branches.push(Branch {
                        condition: Some(cond),
                        is_else: false,
                        children,
                        pos: branch_pos,
                    });
                }
                Some("prompty.else") => {
                    let (branch_pos, branch_attrs) = self.consume_branch_open()?;
                    if branch_attrs.contains_key("eval") {
                        return Err(Error::CondInvalidElse(branch_pos));
                    }
                    let children = self.parse_branch_body()?;
                    branches.push(Branch {
                        condition: None,
                        is_else: true,
                        children,
                        pos: branch_pos,
                    });
                    if self
                        .peek_sibling_tag()
                        .is_some_and(|n| n == "prompty.elseif" || n == "prompty.else")
                    {
                        return Err(Error::CondElseNotLast(self.peek().pos));
                    }
                    break;
                }
                _ => break,
            }
        }

        self.consume_block_close("prompty.if")?;
        Ok(Node::Conditional { branches })
    }

    fn expect_block_open(&mut self, pos: Position) -> Result<()> {
        match self.peek_kind() {
            TokenKind::CloseTag => {
                self.advance();
                Ok(())
            }
            _ => Err(Error::CondNotClosed(pos)),
        }
    }

    /// True-returning peek for an upcoming `{~prompty.X ...` sibling tag
    /// without consuming any tokens.
    fn peek_sibling_tag(&self) -> Option<&'t str> {
        if self.peek_kind() != TokenKind::OpenTag {
            return None;
        }
        self.tokens
            .get(self.pos + 1)
            .filter(|t| t.kind == TokenKind::TagName)
            .map(|t| t.value.as_str())
    }

    fn consume_branch_open(&mut self) -> Result<(Position, Attributes)> {
        self.advance(); // OpenTag
        let name_tok = self.expect(TokenKind::TagName)?;
        let pos = name_tok.pos;
        let attrs = self.parse_attributes()?;
        self.expect_block_open(pos)?;
        Ok((pos, attrs))
    }

    /// Parse sibling nodes until the next `prompty.elseif`/`prompty.else`
    /// sibling tag or the closing `{~/prompty.if~}`.
    fn parse_branch_body(&mut self) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            if self.at_eof() {
                return Err(Error::CondNotClosed(self.peek().pos));
            }
            if self.at_block_close_named("prompty.if") {
                return Ok(nodes);
            }
            if self.peek_sibling_tag().is_some_and(|n| n == "prompty.elseif" || n == "prompty.else")
            {
                return Ok(nodes);
            }
            nodes.push(self.parse_node()?);
        }
    }
}

fn require_eval(attrs: &Attributes, pos: Position, tag: &'static str) -> Result<String> {
    attrs
        .get("eval")
        .cloned()
        .ok_or(Error::CondMissingEval { pos, tag })
}
