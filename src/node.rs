use crate::position::Position;
use indexmap::IndexMap;
use ptree::TreeItem;
use std::borrow::Cow;

/// Attribute mapping for a tag: insertion-ordered, last write wins on
/// duplicate names.
pub type Attributes = IndexMap<String, String>;

/// A compiled template tree node.
#[derive(Debug, Clone)]
pub enum Node {
    Text {
        content: String,
        pos: Position,
    },
    Tag {
        name: String,
        attributes: Attributes,
        self_close: bool,
        children: Vec<Node>,
        raw_content: Option<String>,
        raw_source: String,
        pos: Position,
    },
    Conditional {
        branches: Vec<Branch>,
    },
    For {
        item_var: String,
        index_var: Option<String>,
        source: String,
        limit: Option<usize>,
        children: Vec<Node>,
        pos: Position,
    },
    Switch {
        expression: String,
        cases: Vec<Case>,
        default: Option<Case>,
        pos: Position,
    },
    Block {
        name: String,
        children: Vec<Node>,
        raw_source: String,
        pos: Position,
    },
    Root {
        children: Vec<Node>,
    },
}

#[derive(Debug, Clone)]
pub struct Branch {
    pub condition: Option<String>,
    pub is_else: bool,
    pub children: Vec<Node>,
    pub pos: Position,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub value: Option<String>,
    pub eval: Option<String>,
    pub children: Vec<Node>,
    pub pos: Position,
}

impl Node {
    pub fn pos(&self) -> Position {
        match self {
            Node::Text { pos, .. }
            | Node::Tag { pos, .. }
            | Node::For { pos, .. }
            | Node::Switch { pos, .. }
            | Node::Block { pos, .. } => *pos,
            Node::Conditional { branches } => {
                branches.first().map(|b| b.pos).unwrap_or(Position::new(0, 1, 1))
            }
            Node::Root { .. } => Position::new(0, 1, 1),
        }
    }

    fn label(&self) -> String {
        match self {
            Node::Text { content, .. } => {
                let preview: String = content.chars().take(24).collect();
                format!("Text({:?})", preview)
            }
            Node::Tag { name, self_close, .. } => {
                format!("Tag({}{})", name, if *self_close { " /" } else { "" })
            }
            Node::Conditional { .. } => "Conditional".to_string(),
            Node::For { item_var, source, .. } => format!("For({} in {})", item_var, source),
            Node::Switch { expression, .. } => format!("Switch({})", expression),
            Node::Block { name, .. } => format!("Block({})", name),
            Node::Root { .. } => "Root".to_string(),
        }
    }

    fn tree_children(&self) -> Vec<Node> {
        match self {
            Node::Tag { children, .. } => children.clone(),
            Node::For { children, .. } => children.clone(),
            Node::Block { children, .. } => children.clone(),
            Node::Root { children } => children.clone(),
            Node::Conditional { branches } => branches
                .iter()
                .flat_map(|b| b.children.clone())
                .collect(),
            Node::Switch { cases, default, .. } => {
                let mut all: Vec<Node> = cases.iter().flat_map(|c| c.children.clone()).collect();
                if let Some(d) = default {
                    all.extend(d.children.clone());
                }
                all
            }
            Node::Text { .. } => Vec::new(),
        }
    }
}

impl TreeItem for Node {
    type Child = Node;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label())
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::from(self.tree_children())
    }
}

impl Node {
    pub fn print(&self) -> std::io::Result<()> {
        ptree::print_tree(self)
    }
}
