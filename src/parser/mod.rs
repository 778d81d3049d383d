mod conditional;
mod for_loop;
mod inheritance;
mod switch;

pub use inheritance::{InheritanceInfo, extract_inheritance, merge_blocks};

use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};
use crate::node::{Attributes, Node};
use crate::position::Position;

/// Parse a lexed template into a `Root` node.
pub fn parse(source: &str, tokens: &[Token]) -> Result<Node> {
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let children = parser.parse_nodes(None)?;
    Ok(Node::Root { children })
}

pub(crate) struct Parser<'t> {
    pub(crate) source: &'t str,
    pub(crate) tokens: &'t [Token],
    pub(crate) pos: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn at_eof(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    /// True when the next tokens form `{~/ ~}` (any closing tag), without
    /// consuming them.
    fn at_block_close(&self) -> bool {
        self.peek_kind() == TokenKind::BlockClose
    }

    /// True when the upcoming close tag matches `name`.
    fn at_block_close_named(&self, name: &str) -> bool {
        self.at_block_close()
            && self
                .tokens
                .get(self.pos + 1)
                .map(|t| t.kind == TokenKind::TagName && t.value == name)
                .unwrap_or(false)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.peek_kind() == kind {
            Ok(self.advance())
        } else {
            Err(Error::UnclosedTag(self.peek().pos))
        }
    }

    /// Consume `{~/name~}`.
    fn consume_block_close(&mut self, name: &str) -> Result<()> {
        self.expect(TokenKind::BlockClose)?;
        let tag_name = self.expect(TokenKind::TagName)?;
        if tag_name.value != name {
            return Err(Error::UnclosedTag(tag_name.pos));
        }
        self.expect(TokenKind::CloseTag)?;
        Ok(())
    }

    fn raw_source(&self, start: usize, end: usize) -> String {
        self.source[start.min(self.source.len())..end.min(self.source.len())].to_string()
    }

    /// Parse a sequence of sibling nodes until EOF or, when `stop_at` is
    /// set, the matching close tag for that name.
    fn parse_nodes(&mut self, stop_at: Option<&str>) -> Result<Vec<Node>> {
        let mut nodes = Vec::new();
        loop {
            if self.at_eof() {
                if let Some(name) = stop_at {
                    return Err(Error::UnclosedTag(self.peek().pos).context_tag(name));
                }
                return Ok(nodes);
            }
            if let Some(name) = stop_at {
                if self.at_block_close_named(name) {
                    return Ok(nodes);
                }
            }
            nodes.push(self.parse_node()?);
        }
    }

    fn parse_node(&mut self) -> Result<Node> {
        match self.peek_kind() {
            TokenKind::Text => {
                let t = self.advance();
                Ok(Node::Text {
                    content: t.value,
                    pos: t.pos,
                })
            }
            TokenKind::OpenTag => self.parse_open_tag(),
            _ => Err(Error::UnclosedTag(self.peek().pos)),
        }
    }

    fn parse_attributes(&mut self) -> Result<Attributes> {
        let mut attrs = Attributes::new();
        loop {
            match self.peek_kind() {
                TokenKind::AttrName => {
                    let name_tok = self.advance();
                    let value = if self.peek_kind() == TokenKind::Equals {
                        self.advance();
                        let v = self.expect(TokenKind::AttrValue)?;
                        v.value
                    } else {
                        "true".to_string()
                    };
                    attrs.insert(name_tok.value, value);
                }
                _ => return Ok(attrs),
            }
        }
    }

    fn parse_open_tag(&mut self) -> Result<Node> {
        let open_pos = self.peek().pos;
        let open_start = open_pos.offset;
        self.advance(); // OpenTag
        let name_tok = self.expect(TokenKind::TagName)?;
        let name = name_tok.value;
        let attributes = self.parse_attributes()?;

        match name.as_str() {
            "prompty.raw" => self.parse_raw(open_start, attributes, name_tok.pos),
            "prompty.if" => self.parse_conditional(attributes, name_tok.pos),
            "prompty.for" => self.parse_for(attributes, name_tok.pos),
            "prompty.switch" => self.parse_switch(open_start, attributes, name_tok.pos),
            "prompty.block" => self.parse_block(open_start, attributes, name_tok.pos),
            "prompty.comment" => self.parse_comment(),
            "prompty.elseif" | "prompty.else" | "prompty.case" | "prompty.casedefault" => {
                Err(Error::UnclosedTag(name_tok.pos))
            }
            _ => self.parse_generic_tag(open_start, name, attributes, name_tok.pos),
        }
    }

    fn parse_generic_tag(
        &mut self,
        open_start: usize,
        name: String,
        attributes: Attributes,
        pos: Position,
    ) -> Result<Node> {
        let self_close = match self.peek_kind() {
            TokenKind::SelfClose => {
                self.advance();
                true
            }
            TokenKind::CloseTag => {
                self.advance();
                false
            }
            _ => return Err(Error::UnclosedTag(pos)),
        };
        let children = if self_close {
            Vec::new()
        } else {
            let children = self.parse_nodes(Some(&name))?;
            self.consume_block_close(&name)?;
            children
        };
        let end = self.tokens[self.pos.saturating_sub(1)].pos.offset
            + self.tokens[self.pos.saturating_sub(1)].value.len();
        Ok(Node::Tag {
            name,
            attributes,
            self_close,
            children,
            raw_content: None,
            raw_source: self.raw_source(open_start, end),
            pos,
        })
    }

    fn parse_raw(
        &mut self,
        open_start: usize,
        attributes: Attributes,
        pos: Position,
    ) -> Result<Node> {
        let self_close = match self.peek_kind() {
            TokenKind::SelfClose => {
                self.advance();
                true
            }
            TokenKind::CloseTag => {
                self.advance();
                false
            }
            _ => return Err(Error::UnclosedTag(pos)),
        };
        let raw_content = if self_close {
            String::new()
        } else {
            let content = if self.peek_kind() == TokenKind::Text {
                self.advance().value
            } else {
                String::new()
            };
            self.consume_block_close("prompty.raw")?;
            content
        };
        let end = self.tokens[self.pos.saturating_sub(1)].pos.offset
            + self.tokens[self.pos.saturating_sub(1)].value.len();
        Ok(Node::Tag {
            name: "prompty.raw".to_string(),
            attributes,
            self_close,
            children: Vec::new(),
            raw_content: Some(raw_content),
            raw_source: self.raw_source(open_start, end),
            pos,
        })
    }

    fn parse_comment(&mut self) -> Result<Node> {
        let pos = self.peek().pos;
        match self.peek_kind() {
            TokenKind::SelfClose => {
                self.advance();
            }
            TokenKind::CloseTag => {
                self.advance();
                self.parse_nodes(Some("prompty.comment"))?;
                self.consume_block_close("prompty.comment")?;
            }
            _ => return Err(Error::UnclosedTag(pos)),
        }
        Ok(Node::Text {
            content: String::new(),
            pos,
        })
    }
}

trait ContextualizeTag {
    fn context_tag(self, name: &str) -> Self;
}

impl ContextualizeTag for Error {
    fn context_tag(self, name: &str) -> Self {
        match name {
            "prompty.if" => Error::CondNotClosed(self.position().unwrap_or(Position::new(0, 1, 1))),
            "prompty.for" => Error::ForNotClosed(self.position().unwrap_or(Position::new(0, 1, 1))),
            "prompty.block" => {
                Error::BlockNotClosed(self.position().unwrap_or(Position::new(0, 1, 1)))
            }
            "prompty.case" | "prompty.casedefault" => {
                Error::SwitchCaseNotClosed(self.position().unwrap_or(Position::new(0, 1, 1)))
            }
            _ => self,
        }
    }
}
