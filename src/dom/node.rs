//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.
//! Text is not stored as separate nodes: every element carries its leading
//! text, and every node carries the text that trails it inside its parent.

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Element node
    Element,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for the root and for detached nodes)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Previous sibling
    pub prev_sibling: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Index into string pool for the tag (elements) or target (PIs), 0 for comments
    pub name_id: u32,
    /// Text before the first child (elements only)
    pub text: Option<String>,
    /// Text after this node, before the next sibling
    pub tail: Option<String>,
    /// Comment text or PI data
    pub value: Option<String>,
    /// Attributes in document order
    pub attributes: Vec<XmlAttribute>,
}

impl XmlNode {
    fn detached(kind: NodeKind, name_id: u32) -> Self {
        XmlNode {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            name_id,
            text: None,
            tail: None,
            value: None,
            attributes: Vec::new(),
        }
    }

    /// Create a new detached element node
    pub fn element(name_id: u32) -> Self {
        Self::detached(NodeKind::Element, name_id)
    }

    /// Create a new detached comment node
    pub fn comment(text: Option<String>) -> Self {
        let mut node = Self::detached(NodeKind::Comment, 0);
        node.value = text;
        node
    }

    /// Create a detached processing instruction node
    pub fn processing_instruction(target_id: u32, data: Option<String>) -> Self {
        let mut node = Self::detached(NodeKind::ProcessingInstruction, target_id);
        node.value = data;
        node
    }

    /// Check if this is an element node
    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    /// Check if this node has children
    #[inline]
    pub fn has_children(&self) -> bool {
        self.first_child.is_some()
    }

    /// Check if this node has attributes
    #[inline]
    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }
}

/// Stored attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    /// Index into string pool for attribute name
    pub name_id: u32,
    /// Attribute value
    pub value: String,
}

impl XmlAttribute {
    pub fn new(name_id: u32, value: impl Into<String>) -> Self {
        XmlAttribute {
            name_id,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node() {
        let elem = XmlNode::element(1);
        assert_eq!(elem.kind, NodeKind::Element);
        assert!(elem.parent.is_none());
        assert!(elem.text.is_none());
        assert!(elem.tail.is_none());
        assert_eq!(elem.name_id, 1);
        assert!(!elem.has_children());
    }

    #[test]
    fn test_comment_keeps_value_apart_from_text() {
        let comment = XmlNode::comment(Some("note".to_string()));
        assert!(!comment.is_element());
        assert_eq!(comment.value.as_deref(), Some("note"));
        assert!(comment.text.is_none());
    }
}
