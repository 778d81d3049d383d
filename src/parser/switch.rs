use super::Parser;
use crate::error::{Error, Result};
use crate::lexer::TokenKind;
use crate::node::{Attributes, Case, Node};
use crate::position::Position;

impl<'t> Parser<'t> {
    pub(super) fn parse_switch(
        &mut self,
        _open_start: usize,
        attrs: Attributes,
        pos: Position,
    ) -> Result<Node> {
        let expression = attrs.get("eval").cloned().ok_or(Error::SwitchMissingEval(pos))?;
        match self.peek_kind() {
            TokenKind::CloseTag => {
                self.advance();
            }
            _ => return Err(Error::SwitchCaseNotClosed(pos)),
        }

        let mut cases = Vec::new();
        let mut default: Option<Case> = None;

        loop {
            self.skip_whitespace_text()?;
            if self.at_block_close_named("prompty.switch") {
                break;
            }
            if self.at_eof() {
                return Err(Error::SwitchCaseNotClosed(pos));
            }
            let (name, case_pos, case_attrs) = self.expect_case_open()?;
            match name.as_str() {
                "prompty.case" => {
                    if default.is_some() {
                        return Err(Error::SwitchDefaultNotLast(case_pos));
                    }
                    let case = self.parse_case_body(case_attrs, case_pos, "prompty.case")?;
                    cases.push(case);
                }
                "prompty.casedefault" => {
                    if default.is_some() {
                        return Err(Error::SwitchDuplicateDefault(case_pos));
                    }
                    let case = self.parse_case_body(case_attrs, case_pos, "prompty.casedefault")?;
                    default = Some(case);
                }
                _ => return Err(Error::SwitchInvalidCaseTag(case_pos)),
            }
        }
        self.consume_block_close("prompty.switch")?;

        Ok(Node::Switch {
            expression,
            cases,
            default,
            pos,
        })
    }

    /// Whitespace-only text between cases is ignored; anything else is an
    /// error (checked by the caller failing to find a case open tag next).
    fn skip_whitespace_text(&mut self) -> Result<()> {
        while self.peek_kind() == TokenKind::Text {
            if self.peek().value.trim().is_empty() {
                self.advance();
            } else {
                return Err(Error::SwitchInvalidCaseTag(self.peek().pos));
            }
        }
        Ok(())
    }

    fn expect_case_open(&mut self) -> Result<(String, Position, Attributes)> {
        if self.peek_kind() != TokenKind::OpenTag {
            return Err(Error::SwitchInvalidCaseTag(self.peek().pos));
        }
        self.advance();
        let name_tok = self.expect(TokenKind::TagName)?;
        let attrs = self.parse_attributes()?;
        match self.peek_kind() {
            TokenKind::CloseTag => {
                self.advance();
            }
            _ => return Err(Error::SwitchCaseNotClosed(name_tok.pos)),
        }
        Ok((name_tok.value, name_tok.pos, attrs))
    }

    fn parse_case_body(&mut self, attrs: Attributes, pos: Position, tag: &str) -> Result<Case> {
        let value = attrs.get("value").cloned();
        let eval = attrs.get("eval").cloned();
        // `prompty.case` needs exactly one matcher; `prompty.casedefault`
        // matches unconditionally and carries neither.
        if tag == "prompty.case" && value.is_some() == eval.is_some() {
            return Err(Error::SwitchCaseMissingMatcher(pos));
        }
        let children = self.parse_nodes(Some(tag))?;
        self.consume_block_close(tag)?;
        Ok(Case {
            value,
            eval,
            children,
            pos,
        })
    }
}
