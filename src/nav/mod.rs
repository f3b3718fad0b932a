//! Unified node model
//!
//! Element-attached text is surfaced as synthetic `TextRun` values so that
//! elements and text can be walked as one sequence:
//! - the leading text of an element is a run owned by that element
//! - the trailing text of a child is a run owned by the parent, anchored
//!   on the child it follows
//!
//! Runs are never stored in the tree. They are built on demand and compare
//! by (text, owner, anchor), so two runs describing the same place and
//! content are the same run.

pub mod axes;

use crate::dom::{NodeId, XmlTree};
use std::fmt;

pub use axes::{
    all_child_nodes, following, following_nodes, preceding, AllChildNodes, Following,
    FollowingNodes, Preceding,
};

/// Which text of a node: its leading text or its trailing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Text before the first child of an element
    Text,
    /// Text after a node, before its next sibling
    Tail,
}

/// A view of one run of text in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextRun {
    text: Option<String>,
    owner: NodeId,
    anchor: Option<NodeId>,
}

impl TextRun {
    pub fn new(text: Option<String>, owner: NodeId, anchor: Option<NodeId>) -> Self {
        TextRun {
            text,
            owner,
            anchor,
        }
    }

    /// The leading text of `element`
    pub fn leading(tree: &XmlTree, element: NodeId) -> Self {
        Self::new(tree.text(element).map(str::to_owned), element, None)
    }

    /// The trailing text of an attached node; `None` for detached nodes
    pub fn trailing(tree: &XmlTree, node: NodeId) -> Option<Self> {
        let parent = tree.parent(node)?;
        Some(Self::new(
            tree.tail(node).map(str::to_owned),
            parent,
            Some(node),
        ))
    }

    /// Element the text belongs to (the parent in XPath terms)
    #[inline]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// The node this run trails, `None` for leading text
    #[inline]
    pub fn anchor(&self) -> Option<NodeId> {
        self.anchor
    }

    /// Text content; an absent run reads as the empty string
    #[inline]
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// True when the tree holds no text at all here (as opposed to `""`)
    #[inline]
    pub fn is_absent(&self) -> bool {
        self.text.is_none()
    }

    /// Length in characters
    #[inline]
    pub fn char_len(&self) -> usize {
        self.text().chars().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    /// Where this run is stored: (element, Text) or (anchor, Tail)
    #[inline]
    pub fn location(&self) -> (NodeId, Slot) {
        match self.anchor {
            None => (self.owner, Slot::Text),
            Some(anchor) => (anchor, Slot::Tail),
        }
    }

    /// The tree node that follows this run inside its owner
    pub fn next(&self, tree: &XmlTree) -> Option<NodeId> {
        match self.anchor {
            None => tree.first_child(self.owner),
            Some(anchor) => tree.next_sibling(anchor),
        }
    }
}

impl fmt::Display for TextRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// One unit of the unified sequence: a tree node or a text run
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Element, comment or processing instruction
    Tree(NodeId),
    Text(TextRun),
}

impl Node {
    /// Parent element; for a run this is its owner
    pub fn parent(&self, tree: &XmlTree) -> Option<NodeId> {
        match self {
            Node::Tree(id) => tree.parent(*id),
            Node::Text(run) => Some(run.owner),
        }
    }

    pub fn as_tree(&self) -> Option<NodeId> {
        match self {
            Node::Tree(id) => Some(*id),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextRun> {
        match self {
            Node::Tree(_) => None,
            Node::Text(run) => Some(run),
        }
    }
}

impl From<NodeId> for Node {
    fn from(id: NodeId) -> Self {
        Node::Tree(id)
    }
}

impl From<TextRun> for Node {
    fn from(run: TextRun) -> Self {
        Node::Text(run)
    }
}
