use crate::error::{Error, Result};
use crate::position::Position;
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    OpenTag,
    CloseTag,
    SelfClose,
    BlockClose,
    TagName,
    AttrName,
    AttrValue,
    Equals,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub pos: Position,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>, pos: Position) -> Self {
        Self {
            kind,
            value: value.into(),
            pos,
        }
    }
}

static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*").unwrap());

/// Tokenize a template body (frontmatter already stripped) into a flat
/// token stream, terminated by a single `Eof` token.
pub fn lex(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer<'s> {
    src: &'s str,
    bytes: &'s [u8],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'s> Lexer<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            src: source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn position_at(&self, offset: usize) -> Position {
        Position::from_offset(self.bytes, offset)
    }

    fn run(mut self) -> Result<Vec<Token>> {
        self.scan_text()?;
        let eof_pos = self.position_at(self.bytes.len());
        self.tokens.push(Token::new(TokenKind::Eof, "", eof_pos));
        Ok(self.tokens)
    }

    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    /// Scan TEXT until an unescaped `{~` or end of input.
    fn scan_text(&mut self) -> Result<()> {
        loop {
            if self.pos >= self.bytes.len() {
                return Ok(());
            }
            let rest = self.rest();
            let rel = match rest.find("{~") {
                Some(r) => r,
                None => {
                    self.emit_text(self.src.len());
                    return Ok(());
                }
            };
            let open_at = self.pos + rel;

            // Escaped `\{~` → literal `{~`, swallow the backslash. The
            // backslash must belong to the current text run; a byte already
            // consumed by an earlier token (e.g. a raw body ending in `\`)
            // does not escape anything.
            if open_at > self.pos && self.bytes[open_at - 1] == b'\\' {
                self.emit_text(open_at - 1);
                self.push_raw_text("{~", self.position_at(open_at - 1));
                self.pos = open_at + 2;
                continue;
            }

            self.emit_text(open_at);
            self.scan_tag()?;
        }
    }

    fn emit_text(&mut self, end: usize) {
        if end > self.pos {
            let content = self.src[self.pos..end].to_string();
            let pos = self.position_at(self.pos);
            self.pos = end;
            self.push_raw_text(&content, pos);
        }
    }

    fn push_raw_text(&mut self, content: &str, pos: Position) {
        if let Some(Token {
            kind: TokenKind::Text,
            value,
            ..
        }) = self.tokens.last_mut()
        {
            value.push_str(content);
        } else {
            self.tokens.push(Token::new(TokenKind::Text, content, pos));
        }
    }

    /// `self.pos` sits at the start of `{~`. Scan a full tag (name,
    /// attributes, closer) and, for `prompty.raw`, the raw body too.
    fn scan_tag(&mut self) -> Result<()> {
        let tag_start = self.pos;
        let block_close = self.bytes[self.pos..].starts_with(b"{~/");
        let open_pos = self.position_at(tag_start);
        if block_close {
            self.tokens.push(Token::new(TokenKind::BlockClose, "{~/", open_pos));
            self.pos += 3;
        } else {
            self.tokens.push(Token::new(TokenKind::OpenTag, "{~", open_pos));
            self.pos += 2;
        }

        self.skip_ws();
        let name_start = self.pos;
        let name = match IDENT_RE.find(self.rest()) {
            Some(m) => m.as_str().to_string(),
            None => return Err(Error::InvalidTagName(self.position_at(name_start))),
        };
        self.pos += name.len();
        self.tokens
            .push(Token::new(TokenKind::TagName, name.clone(), self.position_at(name_start)));

        if block_close {
            self.skip_ws();
            self.expect_close_tag()?;
            return Ok(());
        }

        loop {
            self.skip_ws();
            if self.bytes[self.pos..].starts_with(b"/~}") {
                let pos = self.position_at(self.pos);
                self.tokens.push(Token::new(TokenKind::SelfClose, "/~}", pos));
                self.pos += 3;
                return Ok(());
            }
            if self.bytes[self.pos..].starts_with(b"~}") {
                let pos = self.position_at(self.pos);
                self.tokens.push(Token::new(TokenKind::CloseTag, "~}", pos));
                self.pos += 2;
                if name == "prompty.raw" {
                    self.scan_raw_body()?;
                }
                return Ok(());
            }
            if self.pos >= self.bytes.len() {
                return Err(Error::UnclosedTag(self.position_at(tag_start)));
            }
            self.scan_attribute(tag_start)?;
        }
    }

    fn expect_close_tag(&mut self) -> Result<()> {
        if self.bytes[self.pos..].starts_with(b"~}") {
            let pos = self.position_at(self.pos);
            self.tokens.push(Token::new(TokenKind::CloseTag, "~}", pos));
            self.pos += 2;
            Ok(())
        } else {
            Err(Error::UnclosedTag(self.position_at(self.pos)))
        }
    }

    fn scan_attribute(&mut self, tag_start: usize) -> Result<()> {
        let name_start = self.pos;
        let name = match attr_ident(self.rest()) {
            Some(n) => n,
            None => return Err(Error::UnclosedTag(self.position_at(tag_start))),
        };
        self.pos += name.len();
        self.tokens
            .push(Token::new(TokenKind::AttrName, name, self.position_at(name_start)));

        self.skip_ws();
        if self.bytes.get(self.pos) == Some(&b'=') {
            let eq_pos = self.position_at(self.pos);
            self.tokens.push(Token::new(TokenKind::Equals, "=", eq_pos));
            self.pos += 1;
            self.skip_ws();
            self.scan_attr_value(tag_start)?;
        }
        Ok(())
    }

    fn scan_attr_value(&mut self, tag_start: usize) -> Result<()> {
        let quote = match self.bytes.get(self.pos) {
            Some(b @ (b'"' | b'\'')) => *b,
            _ => return Err(Error::UnterminatedAttributeValue(self.position_at(tag_start))),
        };
        let value_start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            match self.bytes.get(self.pos) {
                None => return Err(Error::UnterminatedAttributeValue(self.position_at(value_start))),
                Some(b) if *b == quote => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    let esc = self.bytes.get(self.pos + 1).copied();
                    match esc {
                        Some(b'"') => out.push('"'),
                        Some(b'\'') => out.push('\''),
                        Some(b'\\') => out.push('\\'),
                        Some(b'n') => out.push('\n'),
                        Some(b't') => out.push('\t'),
                        Some(b'r') => out.push('\r'),
                        Some(c) => {
                            out.push('\\');
                            out.push(c as char);
                        }
                        None => {
                            return Err(Error::UnterminatedAttributeValue(
                                self.position_at(value_start),
                            ))
                        }
                    }
                    self.pos += 2;
                }
                Some(_) => {
                    let ch_len = utf8_char_len(self.bytes[self.pos]);
                    out.push_str(&self.src[self.pos..self.pos + ch_len]);
                    self.pos += ch_len;
                }
            }
        }
        self.tokens
            .push(Token::new(TokenKind::AttrValue, out, self.position_at(value_start)));
        Ok(())
    }

    fn scan_raw_body(&mut self) -> Result<()> {
        const CLOSER: &str = "{~/prompty.raw~}";
        let start = self.pos;
        match self.src[self.pos..].find(CLOSER) {
            Some(rel) => {
                let end = self.pos + rel;
                if end > start {
                    let content = self.src[start..end].to_string();
                    self.tokens
                        .push(Token::new(TokenKind::Text, content, self.position_at(start)));
                }
                self.pos = end;
                Ok(())
            }
            None => Err(Error::UnclosedTag(self.position_at(start))),
        }
    }

    fn skip_ws(&mut self) {
        while let Some(b) = self.bytes.get(self.pos) {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }
}

fn attr_ident(s: &str) -> Option<String> {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return None,
    }
    let mut end = 1;
    for (i, c) in chars {
        if c.is_ascii_alphanumeric() || c == '_' {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    Some(s[..end].to_string())
}

fn utf8_char_len(b: u8) -> usize {
    if b & 0x80 == 0 {
        1
    } else if b & 0xE0 == 0xC0 {
        2
    } else if b & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn text_only() {
        let toks = lex("hello world").unwrap();
        assert_eq!(kinds(&toks), vec![TokenKind::Text, TokenKind::Eof]);
    }

    #[test]
    fn self_closing_tag_with_attrs() {
        let toks = lex(r#"{~prompty.var name="x" /~}"#).unwrap();
        use TokenKind::*;
        assert_eq!(
            kinds(&toks),
            vec![OpenTag, TagName, AttrName, Equals, AttrValue, SelfClose, Eof]
        );
        assert_eq!(toks[1].value, "prompty.var");
        assert_eq!(toks[4].value, "x");
    }

    #[test]
    fn block_tag_close() {
        let toks = lex("{~prompty.if eval=\"a\"~}x{~/prompty.if~}").unwrap();
        let kinds = kinds(&toks);
        assert!(kinds.contains(&TokenKind::BlockClose));
    }

    #[test]
    fn escape_passes_through_literal() {
        let toks = lex(r#"\{~prompty.var name="x"/~}"#).unwrap();
        assert_eq!(toks.len(), 2);
        assert_eq!(toks[0].kind, TokenKind::Text);
        assert_eq!(toks[0].value, "{~prompty.var name=\"x\"/~}");
    }

    #[test]
    fn boolean_attribute_has_no_equals() {
        let toks = lex(r#"{~x.y isolate /~}"#).unwrap();
        let kinds = kinds(&toks);
        assert_eq!(
            kinds,
            vec![
                TokenKind::OpenTag,
                TokenKind::TagName,
                TokenKind::AttrName,
                TokenKind::SelfClose,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn raw_block_preserves_inner_directives() {
        let src = "{~prompty.raw~}{~prompty.var name=\"x\"/~}{~/prompty.raw~}";
        let toks = lex(src).unwrap();
        let text = toks.iter().find(|t| t.kind == TokenKind::Text).unwrap();
        assert_eq!(text.value, "{~prompty.var name=\"x\"/~}");
    }

    #[test]
    fn raw_body_ending_in_backslash_still_closes() {
        let src = "{~prompty.raw~}abc\\{~/prompty.raw~}";
        let toks = lex(src).unwrap();
        let text = toks.iter().find(|t| t.kind == TokenKind::Text).unwrap();
        assert_eq!(text.value, "abc\\");
        assert!(kinds(&toks).contains(&TokenKind::BlockClose));
    }

    #[test]
    fn text_after_an_escape_stays_one_run() {
        let toks = lex(r#"a\{~b{~x.y/~}c"#).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Text);
        assert_eq!(toks[0].value, "a{~b");
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn unclosed_tag_errors() {
        let err = lex("{~prompty.var name=\"x\"").unwrap_err();
        assert!(matches!(err, Error::UnclosedTag(_) | Error::UnterminatedAttributeValue(_)));
    }
}
