use super::Parser;
use crate::error::{Error, Result};
use crate::lexer::TokenKind;
use crate::node::{Attributes, Branch, Case, Node};
use crate::position::Position;
use indexmap::IndexMap;

impl<'t> Parser<'t> {
    pub(super) fn parse_block(
        &mut self,
        open_start: usize,
        attrs: Attributes,
        pos: Position,
    ) -> Result<Node> {
        let name = attrs.get("name").cloned().ok_or(Error::BlockMissingName(pos))?;
        match self.peek_kind() {
            TokenKind::CloseTag => {
                self.advance();
            }
            _ => return Err(Error::BlockNotClosed(pos)),
        }
        let children = self.parse_nodes(Some("prompty.block"))?;
        self.consume_block_close("prompty.block")?;
        let end = self.tokens[self.pos.saturating_sub(1)].pos.offset
            + self.tokens[self.pos.saturating_sub(1)].value.len();
        Ok(Node::Block {
            name,
            children,
            raw_source: self.raw_source(open_start, end),
            pos,
        })
    }
}

/// Information extracted from a parsed root about template inheritance:
/// an optional `extends` target and the named `block` overrides it
/// defines.
#[derive(Debug, Clone, Default)]
pub struct InheritanceInfo {
    pub extends: Option<(String, Position)>,
    pub blocks: IndexMap<String, Vec<Node>>,
}

/// Walk a parsed `Root`'s direct children, validating and extracting
/// `prompty.extends`/`prompty.block` per the inheritance rules.
pub fn extract_inheritance(root: &Node) -> Result<InheritanceInfo> {
    let children = match root {
        Node::Root { children } => children,
        _ => return Ok(InheritanceInfo::default()),
    };

    let mut info = InheritanceInfo::default();
    let mut seen_significant = false;

    for child in children {
        match child {
            Node::Tag {
                name, attributes, pos, ..
            } if name == "prompty.extends" => {
                if info.extends.is_some() {
                    return Err(Error::ExtendsMultiple(*pos));
                }
                if seen_significant {
                    return Err(Error::ExtendsNotFirst(*pos));
                }
                let template = attributes
                    .get("template")
                    .cloned()
                    .ok_or(Error::ExtendsMissingTemplate(*pos))?;
                info.extends = Some((template, *pos));
            }
            Node::Text { content, .. } if content.trim().is_empty() => {}
            Node::Block { name, children, pos, .. } => {
                seen_significant = true;
                if info.blocks.contains_key(name) {
                    return Err(Error::BlockDuplicateName {
                        pos: *pos,
                        name: name.clone(),
                    });
                }
                info.blocks.insert(name.clone(), children.clone());
            }
            _ => {
                seen_significant = true;
            }
        }
    }

    check_parent_placement(children, false)?;
    Ok(info)
}

/// `prompty.parent` is only meaningful inside a `prompty.block`; recurse
/// and reject any occurrence outside of one.
fn check_parent_placement(nodes: &[Node], inside_block: bool) -> Result<()> {
    for node in nodes {
        match node {
            Node::Tag { name, pos, children, .. } => {
                if name == "prompty.parent" && !inside_block {
                    return Err(Error::ParentOutsideBlock(*pos));
                }
                check_parent_placement(children, inside_block)?;
            }
            Node::Block { children, .. } => {
                check_parent_placement(children, true)?;
            }
            Node::Conditional { branches } => {
                for b in branches {
                    check_parent_placement(&b.children, inside_block)?;
                }
            }
            Node::For { children, .. } => check_parent_placement(children, inside_block)?,
            Node::Switch { cases, default, .. } => {
                for c in cases {
                    check_parent_placement(&c.children, inside_block)?;
                }
                if let Some(d) = default {
                    check_parent_placement(&d.children, inside_block)?;
                }
            }
            Node::Root { children } => check_parent_placement(children, inside_block)?,
            Node::Text { .. } => {}
        }
    }
    Ok(())
}

/// Graft a child template's block overrides onto its parent's tree,
/// recursively so nested constructs (conditionals, loops, blocks inside
/// blocks) are searched too. Blocks the child doesn't override keep the
/// parent's original content.
pub fn merge_blocks(nodes: Vec<Node>, overrides: &IndexMap<String, Vec<Node>>) -> Vec<Node> {
    nodes.into_iter().map(|n| merge_node(n, overrides)).collect()
}

fn merge_node(node: Node, overrides: &IndexMap<String, Vec<Node>>) -> Node {
    match node {
        Node::Block { name, children, raw_source, pos } => {
            let merged = match overrides.get(&name) {
                Some(override_children) => expand_parent_refs(override_children.clone(), &children, overrides),
                None => merge_blocks(children, overrides),
            };
            Node::Block { name, children: merged, raw_source, pos }
        }
        Node::Tag { name, attributes, self_close, children, raw_content, raw_source, pos } => Node::Tag {
            name,
            attributes,
            self_close,
            children: merge_blocks(children, overrides),
            raw_content,
            raw_source,
            pos,
        },
        Node::Conditional { branches } => Node::Conditional {
            branches: branches
                .into_iter()
                .map(|b| Branch { children: merge_blocks(b.children, overrides), ..b })
                .collect(),
        },
        Node::For { item_var, index_var, source, limit, children, pos } => Node::For {
            item_var,
            index_var,
            source,
            limit,
            children: merge_blocks(children, overrides),
            pos,
        },
        Node::Switch { expression, cases, default, pos } => Node::Switch {
            expression,
            cases: cases
                .into_iter()
                .map(|c| Case { children: merge_blocks(c.children, overrides), ..c })
                .collect(),
            default: default.map(|d| Case { children: merge_blocks(d.children, overrides), ..d }),
            pos,
        },
        Node::Root { children } => Node::Root { children: merge_blocks(children, overrides) },
        Node::Text { .. } => node,
    }
}

/// Splice a parent block's original content in place of each
/// `prompty.parent` marker inside a child's override body.
fn expand_parent_refs(
    override_children: Vec<Node>,
    parent_children: &[Node],
    overrides: &IndexMap<String, Vec<Node>>,
) -> Vec<Node> {
    let mut out = Vec::new();
    for n in override_children {
        match &n {
            Node::Tag { name, self_close, .. } if name == "prompty.parent" && *self_close => {
                out.extend(merge_blocks(parent_children.to_vec(), overrides));
            }
            _ => out.push(merge_node(n, overrides)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    fn parse_src(src: &str) -> Node {
        let tokens = lex(src).unwrap();
        parse(src, &tokens).unwrap()
    }

    #[test]
    fn extends_must_be_first() {
        let root = parse_src("hi {~prompty.extends template=\"base\" /~}");
        let err = extract_inheritance(&root).unwrap_err();
        assert!(matches!(err, Error::ExtendsNotFirst(_)));
    }

    #[test]
    fn blocks_collected_by_name() {
        let root = parse_src("{~prompty.block name=\"body\"~}hi{~/prompty.block~}");
        let info = extract_inheritance(&root).unwrap();
        assert!(info.blocks.contains_key("body"));
    }

    #[test]
    fn duplicate_block_name_errors() {
        let root = parse_src(
            "{~prompty.block name=\"b\"~}1{~/prompty.block~}{~prompty.block name=\"b\"~}2{~/prompty.block~}",
        );
        assert!(matches!(
            extract_inheritance(&root),
            Err(Error::BlockDuplicateName { .. })
        ));
    }

    #[test]
    fn parent_outside_block_errors() {
        let root = parse_src("{~prompty.parent /~}");
        assert!(matches!(
            extract_inheritance(&root),
            Err(Error::ParentOutsideBlock(_))
        ));
    }

    #[test]
    fn override_replaces_parent_block_content() {
        let parent = parse_src("A{~prompty.block name=\"body\"~}base{~/prompty.block~}B");
        let parent_children = match parent {
            Node::Root { children } => children,
            _ => unreachable!(),
        };
        let mut overrides = IndexMap::new();
        overrides.insert(
            "body".to_string(),
            vec![Node::Text { content: "child".to_string(), pos: Position::new(0, 1, 1) }],
        );
        let merged = merge_blocks(parent_children, &overrides);
        let rendered: String = merged
            .iter()
            .map(|n| match n {
                Node::Text { content, .. } => content.clone(),
                Node::Block { children, .. } => children
                    .iter()
                    .map(|c| match c {
                        Node::Text { content, .. } => content.clone(),
                        _ => String::new(),
                    })
                    .collect(),
                _ => String::new(),
            })
            .collect();
        assert_eq!(rendered, "Achild" .to_string() + "B");
    }

    #[test]
    fn parent_marker_is_replaced_with_original_block_content() {
        let parent = parse_src("{~prompty.block name=\"body\"~}base{~/prompty.block~}");
        let parent_children = match parent {
            Node::Root { children } => children,
            _ => unreachable!(),
        };
        let mut overrides = IndexMap::new();
        overrides.insert(
            "body".to_string(),
            vec![
                Node::Text { content: "before-".to_string(), pos: Position::new(0, 1, 1) },
                Node::Tag {
                    name: "prompty.parent".to_string(),
                    attributes: Attributes::new(),
                    self_close: true,
                    children: Vec::new(),
                    raw_content: None,
                    raw_source: "{~prompty.parent/~}".to_string(),
                    pos: Position::new(0, 1, 1),
                },
                Node::Text { content: "-after".to_string(), pos: Position::new(0, 1, 1) },
            ],
        );
        let merged = merge_blocks(parent_children, &overrides);
        if let Node::Block { children, .. } = &merged[0] {
            let rendered: String = children
                .iter()
                .map(|c| match c {
                    Node::Text { content, .. } => content.clone(),
                    _ => String::new(),
                })
                .collect();
            assert_eq!(rendered, "before-base-after");
        } else {
            panic!("expected block");
        }
    }
}
