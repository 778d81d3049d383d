use super::Parser;
use crate::error::{Error, Result};
use crate::lexer::TokenKind;
use crate::node::{Attributes, Node};
use crate::position::Position;

impl<'t> Parser<'t> {
    pub(super) fn parse_for(&mut self, attrs: Attributes, pos: Position) -> Result<Node> {
        let item_var = attrs
            .get("item")
            .cloned()
            .ok_or(Error::ForMissingItem(pos))?;
        let source = attrs.get("in").cloned().ok_or(Error::ForMissingIn(pos))?;
        let index_var = attrs.get("index").cloned();
        let limit = match attrs.get("limit") {
            Some(s) => Some(s.parse::<usize>().map_err(|_| Error::ForInvalidLimit(pos))?),
            None => None,
        };

        let self_close = match self.peek_kind() {
            TokenKind::SelfClose => {
                self.advance();
                true
            }
            TokenKind::CloseTag => {
                self.advance();
                false
            }
            _ => return Err(Error::ForNotClosed(pos)),
        };

        let children = if self_close {
            Vec::new()
        } else {
            let children = self.parse_nodes(Some("prompty.for"))?;
            self.consume_block_close("prompty.for")?;
            children
        };

        Ok(Node::For {
            item_var,
            index_var,
            source,
            limit,
            children,
            pos,
        })
    }
}
