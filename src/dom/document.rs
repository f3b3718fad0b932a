//! XML Tree - Arena-based mutable DOM
//!
//! Storage for the editing engine:
//! - Arena allocation for nodes, addressed by NodeId
//! - Linked parent/child/sibling structure for O(1) relinking
//! - String interning for element/attribute names
//! - Leading text on elements, trailing text on every node
//!
//! Removing a node only unlinks it. Its slot stays valid (and reusable by
//! the caller) for as long as the tree lives.

use super::namespace;
use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use super::strings::StringPool;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An XML tree stored in arena format
#[derive(Debug, Clone, Default)]
pub struct XmlTree {
    /// Arena of nodes
    nodes: Vec<XmlNode>,
    /// Interned names
    pub strings: StringPool,
    /// Root element node ID
    root: Option<NodeId>,
    /// Comments and PIs in front of the root element, in document order
    front: Vec<NodeId>,
}

/// Owned copy of a single node's content, used to copy within and across trees
#[derive(Debug, Clone)]
struct NodeParts {
    kind: NodeKind,
    name: String,
    text: Option<String>,
    tail: Option<String>,
    value: Option<String>,
    attributes: Vec<(String, String)>,
}

impl XmlTree {
    /// Create an empty tree without a root element
    pub fn new() -> Self {
        XmlTree {
            nodes: Vec::with_capacity(64),
            strings: StringPool::new(),
            root: None,
            front: Vec::new(),
        }
    }

    /// Create a tree whose root is a fresh element with the given tag
    pub fn with_root(tag: &str) -> Self {
        let mut tree = Self::new();
        let root = tree.create_element(tag);
        tree.root = Some(root);
        tree
    }

    // === Construction ===

    fn push(&mut self, node: XmlNode) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name_id = self.strings.intern(tag);
        self.push(XmlNode::element(name_id))
    }

    /// Create a detached element with attributes (kept in the given order)
    pub fn create_element_with<I, K, V>(&mut self, tag: &str, attributes: I) -> NodeId
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let id = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(id, name.as_ref(), value);
        }
        id
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(XmlNode::comment(Some(text.to_string())))
    }

    /// Create a detached processing instruction
    pub fn create_pi(&mut self, target: &str, data: &str) -> NodeId {
        let target_id = self.strings.intern(target);
        let data = (!data.is_empty()).then(|| data.to_string());
        self.push(XmlNode::processing_instruction(target_id, data))
    }

    // === Node access ===

    /// IDs must come from this tree; a foreign ID is a caller bug.
    #[inline]
    fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id as usize]
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut XmlNode {
        &mut self.nodes[id as usize]
    }

    /// Total number of nodes ever created (attached or not)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    #[inline]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).is_element()
    }

    /// Tag of an element, target of a PI, empty for comments
    #[inline]
    pub fn tag(&self, id: NodeId) -> &str {
        self.strings.get_str(self.node(id).name_id).unwrap_or("")
    }

    /// Tag without namespace prefix or Clark URI
    #[inline]
    pub fn local_name(&self, id: NodeId) -> &str {
        namespace::local_name(self.tag(id))
    }

    pub fn set_tag(&mut self, id: NodeId, tag: &str) {
        let name_id = self.strings.intern(tag);
        self.node_mut(id).name_id = name_id;
    }

    /// Comment text or PI data
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.node(id).value.as_deref()
    }

    // === Document level ===

    /// Root element ID
    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Make a detached element the root element
    pub fn set_root(&mut self, id: NodeId) {
        self.unlink(id);
        self.node_mut(id).tail = None;
        self.root = Some(id);
    }

    /// Comments and PIs in front of the root element
    pub fn front_nodes(&self) -> &[NodeId] {
        &self.front
    }

    /// Append a node to the front nodes (it ends up right before the root)
    pub fn push_front_node(&mut self, id: NodeId) {
        self.unlink(id);
        self.front.push(id);
    }

    // === Navigation ===

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[inline]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    #[inline]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    #[inline]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    #[inline]
    pub fn has_children(&self, id: NodeId) -> bool {
        self.node(id).has_children()
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_> {
        ChildIter {
            tree: self,
            next: self.first_child(id),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Child at a position, counting comments and PIs
    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).nth(index)
    }

    /// Position of a node among its siblings
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        self.parent(id)?;
        let mut index = 0;
        let mut prev = self.prev_sibling(id);
        while let Some(p) = prev {
            index += 1;
            prev = self.prev_sibling(p);
        }
        Some(index)
    }

    /// Iterate over ancestors, nearest first
    pub fn ancestors(&self, id: NodeId) -> AncestorIter<'_> {
        AncestorIter {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Iterate over all descendants in document order
    pub fn descendants(&self, id: NodeId) -> DescendantIter<'_> {
        let mut stack = Vec::new();
        let mut child_id = self.last_child(id);
        while let Some(cid) = child_id {
            stack.push(cid);
            child_id = self.prev_sibling(cid);
        }
        DescendantIter { tree: self, stack }
    }

    /// Is `ancestor` a strict ancestor of `node`?
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    // === Text storage ===

    /// Leading text of an element
    #[inline]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.node(id).text.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, text: Option<String>) {
        self.node_mut(id).text = text;
    }

    /// Trailing text of a node
    #[inline]
    pub fn tail(&self, id: NodeId) -> Option<&str> {
        self.node(id).tail.as_deref()
    }

    /// Set the trailing text of an attached node
    ///
    /// Detached nodes own no trailing text; setting one is ignored.
    pub fn set_tail(&mut self, id: NodeId, tail: Option<String>) {
        if self.parent(id).is_some() {
            self.node_mut(id).tail = tail;
        }
    }

    /// Append to the leading text of an element
    pub fn append_text(&mut self, id: NodeId, extra: &str) {
        if extra.is_empty() {
            return;
        }
        self.node_mut(id)
            .text
            .get_or_insert_with(String::new)
            .push_str(extra);
    }

    /// Append to the trailing text of an attached node
    pub fn append_tail(&mut self, id: NodeId, extra: &str) {
        if extra.is_empty() || self.parent(id).is_none() {
            return;
        }
        self.node_mut(id)
            .tail
            .get_or_insert_with(String::new)
            .push_str(extra);
    }

    // === Attributes ===

    /// Iterate over attribute names and values in document order
    pub fn attributes(&self, id: NodeId) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.node(id).attributes.iter().map(move |attr| {
            (
                self.strings.get_str(attr.name_id).unwrap_or(""),
                attr.value.as_str(),
            )
        })
    }

    /// Get attribute value by name
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        let name_id = self.strings.lookup(name)?;
        self.node(id)
            .attributes
            .iter()
            .find(|attr| attr.name_id == name_id)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, keeping the position of an existing one
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let name_id = self.strings.intern(name);
        let value = value.into();
        let attrs = &mut self.node_mut(id).attributes;
        match attrs.iter_mut().find(|attr| attr.name_id == name_id) {
            Some(attr) => attr.value = value,
            None => attrs.push(XmlAttribute::new(name_id, value)),
        }
    }

    /// Remove an attribute, returning its value if it was present
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        let name_id = self.strings.lookup(name)?;
        let attrs = &mut self.node_mut(id).attributes;
        let pos = attrs.iter().position(|attr| attr.name_id == name_id)?;
        Some(attrs.remove(pos).value)
    }

    pub fn clear_attributes(&mut self, id: NodeId) {
        self.node_mut(id).attributes.clear();
    }

    // === Mutation ===

    /// Link an unlinked node into `parent`, before `before` (or last)
    fn link(&mut self, parent: NodeId, before: Option<NodeId>, child: NodeId) {
        debug_assert!(
            child != parent && !self.is_ancestor(child, parent),
            "linking a node below itself"
        );
        let prev = match before {
            Some(b) => self.prev_sibling(b),
            None => self.last_child(parent),
        };
        {
            let node = self.node_mut(child);
            node.parent = Some(parent);
            node.prev_sibling = prev;
            node.next_sibling = before;
        }
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(child),
            None => self.node_mut(parent).first_child = Some(child),
        }
        match before {
            Some(b) => self.node_mut(b).prev_sibling = Some(child),
            None => self.node_mut(parent).last_child = Some(child),
        }
    }

    /// Remove a node from its parent's child list (tail stays with the node)
    fn unlink(&mut self, id: NodeId) {
        if self.root == Some(id) {
            self.root = None;
        }
        if let Some(pos) = self.front.iter().position(|&f| f == id) {
            self.front.remove(pos);
        }
        let Some(parent) = self.parent(id) else {
            return;
        };
        let prev = self.prev_sibling(id);
        let next = self.next_sibling(id);
        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }
        let node = self.node_mut(id);
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
    }

    /// Detach a node from the tree, carrying its trailing text along
    pub fn detach(&mut self, id: NodeId) {
        self.unlink(id);
    }

    /// Insert `child` into `parent` at `index` (appends when past the end)
    ///
    /// An attached `child` is moved together with its trailing text; the
    /// index counts positions after it has been taken out.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.unlink(child);
        let before = self.child(parent, index);
        self.link(parent, before, child);
    }

    /// Append `child` as the last child of `parent`
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.unlink(child);
        self.link(parent, None, child);
    }

    /// Insert `node` as the previous sibling of the attached node `anchor`
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) {
        debug_assert_ne!(anchor, node);
        self.unlink(node);
        match self.parent(anchor) {
            Some(parent) => self.link(parent, Some(anchor), node),
            None => debug_assert!(false, "insert_before on a detached anchor"),
        }
    }

    /// Insert `node` as the next sibling of the attached node `anchor`
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) {
        debug_assert_ne!(anchor, node);
        self.unlink(node);
        match self.parent(anchor) {
            Some(parent) => {
                let before = self.next_sibling(anchor);
                self.link(parent, before, node);
            }
            None => debug_assert!(false, "insert_after on a detached anchor"),
        }
    }

    // === Copying ===

    fn parts(&self, id: NodeId) -> NodeParts {
        let node = self.node(id);
        NodeParts {
            kind: node.kind,
            name: self.tag(id).to_string(),
            text: node.text.clone(),
            tail: node.tail.clone(),
            value: node.value.clone(),
            attributes: self
                .attributes(id)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn create_from_parts(&mut self, parts: NodeParts) -> NodeId {
        let name_id = self.strings.intern(&parts.name);
        let mut node = match parts.kind {
            NodeKind::Element => XmlNode::element(name_id),
            NodeKind::Comment => XmlNode::comment(parts.value),
            NodeKind::ProcessingInstruction => {
                XmlNode::processing_instruction(name_id, parts.value)
            }
        };
        node.text = parts.text;
        let id = self.push(node);
        for (name, value) in parts.attributes {
            self.set_attribute(id, &name, value);
        }
        id
    }

    /// Pre-order copy plan: each entry is a source node and the plan index of its parent
    fn subtree_parts(&self, id: NodeId) -> Vec<(NodeParts, Option<usize>)> {
        let mut plan = Vec::new();
        let mut stack = vec![(id, None)];
        while let Some((src, parent_pos)) = stack.pop() {
            let pos = plan.len();
            plan.push((self.parts(src), parent_pos));
            let mut child = self.last_child(src);
            while let Some(c) = child {
                stack.push((c, Some(pos)));
                child = self.prev_sibling(c);
            }
        }
        plan
    }

    fn build_from_parts(&mut self, plan: Vec<(NodeParts, Option<usize>)>) -> NodeId {
        let mut created: Vec<NodeId> = Vec::with_capacity(plan.len());
        for (mut parts, parent_pos) in plan {
            let tail = parts.tail.take();
            let id = self.create_from_parts(parts);
            if let Some(parent) = parent_pos.and_then(|p| created.get(p).copied()) {
                self.link(parent, None, id);
                self.node_mut(id).tail = tail;
            }
            created.push(id);
        }
        // The plan always starts with the copied node itself.
        created[0]
    }

    /// Deep copy of a node and its content, without its trailing text
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let plan = self.subtree_parts(id);
        self.build_from_parts(plan)
    }

    /// Deep copy of a node from another tree, without its trailing text
    pub fn import(&mut self, other: &XmlTree, id: NodeId) -> NodeId {
        let plan = other.subtree_parts(id);
        self.build_from_parts(plan)
    }

    /// Copy of an element's tag and attributes only
    pub fn shallow_copy(&mut self, id: NodeId) -> NodeId {
        let mut parts = self.parts(id);
        parts.text = None;
        parts.tail = None;
        self.create_from_parts(parts)
    }

    // === Loading ===

    /// Build a tree from well-formed markup
    ///
    /// Character data becomes leading/trailing text. Comments and PIs in
    /// front of the root become front nodes; anything after the root element
    /// and the DOCTYPE are dropped.
    pub fn parse(input: &str) -> Result<Self> {
        let mut reader = Reader::from_str(input);
        let mut tree = XmlTree::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root_closed = false;

        loop {
            match reader.read_event()? {
                Event::Start(elem) => {
                    let id = tree.element_from_event(&elem)?;
                    // Elements after the root stay detached but still collect their content.
                    tree.attach_parsed(&stack, id, root_closed);
                    stack.push(id);
                }
                Event::Empty(elem) => {
                    let id = tree.element_from_event(&elem)?;
                    tree.attach_parsed(&stack, id, root_closed);
                    if stack.is_empty() && tree.root == Some(id) {
                        root_closed = true;
                    }
                }
                Event::End(_) => {
                    if let Some(id) = stack.pop() {
                        if stack.is_empty() && tree.root == Some(id) {
                            root_closed = true;
                        }
                    }
                }
                Event::Text(content) => {
                    let text = content.unescape()?;
                    tree.append_parsed_text(&stack, &text);
                }
                Event::CData(content) => {
                    let text = String::from_utf8_lossy(&content).into_owned();
                    tree.append_parsed_text(&stack, &text);
                }
                Event::Comment(content) => {
                    let text = String::from_utf8_lossy(&content).into_owned();
                    let id = tree.create_comment(&text);
                    tree.attach_parsed(&stack, id, root_closed);
                }
                Event::PI(pi) => {
                    let target = String::from_utf8_lossy(pi.target()).into_owned();
                    let data = String::from_utf8_lossy(pi.content()).into_owned();
                    let id = tree.create_pi(&target, data.trim_start());
                    tree.attach_parsed(&stack, id, root_closed);
                }
                Event::Decl(_) | Event::DocType(_) => {}
                Event::Eof => break,
            }
        }

        if tree.root.is_none() {
            return Err(Error::NoRootElement);
        }
        tracing::trace!(nodes = tree.node_count(), "parsed markup");
        Ok(tree)
    }

    fn element_from_event(&mut self, elem: &BytesStart<'_>) -> Result<NodeId> {
        let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
        let id = self.create_element(&name);
        for attr in elem.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            self.set_attribute(id, &key, value);
        }
        Ok(id)
    }

    /// Attach a freshly parsed node at the current position
    fn attach_parsed(&mut self, stack: &[NodeId], id: NodeId, root_closed: bool) {
        match stack.last() {
            Some(&parent) => self.link(parent, None, id),
            None if root_closed => {}
            None if self.is_element(id) => self.root = Some(id),
            None => self.front.push(id),
        }
    }

    fn append_parsed_text(&mut self, stack: &[NodeId], text: &str) {
        let Some(&parent) = stack.last() else {
            return;
        };
        match self.last_child(parent) {
            Some(last) => self.append_tail(last, text),
            None => self.append_text(parent, text),
        }
    }
}

/// Iterator over child nodes
pub struct ChildIter<'a> {
    tree: &'a XmlTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for ChildIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Iterator over ancestors, nearest first
pub struct AncestorIter<'a> {
    tree: &'a XmlTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Iterator over descendant nodes in document order
pub struct DescendantIter<'a> {
    tree: &'a XmlTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        let mut child_id = self.tree.last_child(current);
        while let Some(id) = child_id {
            self.stack.push(id);
            child_id = self.tree.prev_sibling(id);
        }
        Some(current)
    }
}
