//! Axis iterators
//!
//! Lazy, single-pass walks over document order:
//! - `Following`: elements after a node, its own subtree excluded
//! - `Preceding`: elements before a node in reverse order, ancestors excluded
//! - `AllChildNodes`: leading run, then each child followed by its trailing run
//! - `FollowingNodes`: the unified sequence of tree nodes and text runs
//!
//! All walks are loops over the sibling links, so tree depth never turns into
//! call-stack depth. Once exhausted, an iterator keeps returning `None`.

use super::{Node, TextRun};
use crate::dom::{NodeId, XmlTree};
use std::collections::HashSet;
use std::iter::FusedIterator;

/// Elements after `start` in document order
pub fn following(tree: &XmlTree, start: NodeId) -> Following<'_> {
    Following {
        tree,
        start,
        current: start,
        elements_only: true,
        done: false,
    }
}

/// Tree nodes of every kind after `start` in document order
pub(crate) fn following_any(tree: &XmlTree, start: NodeId) -> Following<'_> {
    Following {
        elements_only: false,
        ..following(tree, start)
    }
}

/// Elements before `start` in reverse document order, ancestors excluded
pub fn preceding(tree: &XmlTree, start: NodeId) -> Preceding<'_> {
    Preceding {
        tree,
        current: start,
        ancestors: tree.ancestors(start).collect(),
        done: false,
    }
}

/// Leading run, then each child followed by its trailing run
pub fn all_child_nodes(tree: &XmlTree, element: NodeId) -> AllChildNodes<'_> {
    AllChildNodes {
        tree,
        element,
        next: Some(Node::Text(TextRun::leading(tree, element))),
    }
}

/// Everything after `start` in the unified sequence of nodes and runs
pub fn following_nodes(tree: &XmlTree, start: Node) -> FollowingNodes<'_> {
    FollowingNodes {
        tree,
        current: start,
        started: false,
        done: false,
    }
}

/// following:: axis restricted to elements
pub struct Following<'a> {
    tree: &'a XmlTree,
    start: NodeId,
    current: NodeId,
    elements_only: bool,
    done: bool,
}

impl Following<'_> {
    /// Next tree node of any kind
    fn step(&mut self) -> Option<NodeId> {
        let tree = self.tree;
        if self.current != self.start {
            if let Some(child) = tree.first_child(self.current) {
                self.current = child;
                return Some(child);
            }
        }
        let mut node = self.current;
        loop {
            if let Some(next) = tree.next_sibling(node) {
                self.current = next;
                return Some(next);
            }
            node = tree.parent(node)?;
        }
    }
}

impl Iterator for Following<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.step() {
                Some(id) if !self.elements_only || self.tree.is_element(id) => return Some(id),
                Some(_) => continue,
                None => self.done = true,
            }
        }
        None
    }
}

impl FusedIterator for Following<'_> {}

/// preceding:: axis restricted to elements
pub struct Preceding<'a> {
    tree: &'a XmlTree,
    current: NodeId,
    ancestors: HashSet<NodeId>,
    done: bool,
}

impl Preceding<'_> {
    fn step(&mut self) -> Option<NodeId> {
        let tree = self.tree;
        loop {
            if let Some(mut prev) = tree.prev_sibling(self.current) {
                // Dive to the deepest last descendant
                while let Some(last) = tree.last_child(prev) {
                    prev = last;
                }
                self.current = prev;
                return Some(prev);
            }
            let parent = tree.parent(self.current)?;
            self.current = parent;
            if !self.ancestors.contains(&parent) {
                return Some(parent);
            }
        }
    }
}

impl Iterator for Preceding<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.step() {
                Some(id) if self.tree.is_element(id) => return Some(id),
                Some(_) => continue,
                None => self.done = true,
            }
        }
        None
    }
}

impl FusedIterator for Preceding<'_> {}

/// Children of one element interleaved with the text runs around them
pub struct AllChildNodes<'a> {
    tree: &'a XmlTree,
    element: NodeId,
    next: Option<Node>,
}

impl Iterator for AllChildNodes<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = match &current {
            Node::Text(run) => run.next(self.tree).map(Node::Tree),
            Node::Tree(child) => Some(Node::Text(TextRun::new(
                self.tree.tail(*child).map(str::to_owned),
                self.element,
                Some(*child),
            ))),
        };
        Some(current)
    }
}

impl FusedIterator for AllChildNodes<'_> {}

/// following:: over the unified sequence, including text runs
pub struct FollowingNodes<'a> {
    tree: &'a XmlTree,
    current: Node,
    started: bool,
    done: bool,
}

impl FollowingNodes<'_> {
    /// Unit after `node` on the same level, without descending
    fn sibling_unit(tree: &XmlTree, node: &Node) -> Option<Node> {
        match node {
            Node::Text(run) => run.next(tree).map(Node::Tree),
            Node::Tree(id) => TextRun::trailing(tree, *id).map(Node::Text),
        }
    }

    fn step(&mut self) -> Option<Node> {
        let tree = self.tree;
        let descend = match &self.current {
            Node::Tree(id) if self.started && tree.is_element(*id) => Some(*id),
            _ => None,
        };
        self.started = true;
        if let Some(element) = descend {
            return Some(Node::Text(TextRun::leading(tree, element)));
        }
        let mut climb = self.current.clone();
        loop {
            if let Some(next) = Self::sibling_unit(tree, &climb) {
                return Some(next);
            }
            climb = Node::Tree(climb.parent(tree)?);
        }
    }
}

impl Iterator for FollowingNodes<'_> {
    type Item = Node;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Some(node) => {
                self.current = node.clone();
                Some(node)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl FusedIterator for FollowingNodes<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tags(tree: &XmlTree, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| tree.tag(id).to_string()).collect()
    }

    fn find(tree: &XmlTree, tag: &str) -> NodeId {
        let root = tree.root().unwrap();
        std::iter::once(root)
            .chain(tree.descendants(root))
            .find(|&id| tree.tag(id) == tag)
            .unwrap()
    }

    #[test]
    fn test_following_skips_own_subtree() {
        let tree = XmlTree::parse("<r><a><a1/></a><b><b1/><!--c--></b><c/></r>").unwrap();
        let a = find(&tree, "a");
        assert_eq!(tags(&tree, following(&tree, a)), vec!["b", "b1", "c"]);
    }

    #[test]
    fn test_following_from_deep_leaf_climbs() {
        let tree = XmlTree::parse("<r><a><x><y/></x></a><b/></r>").unwrap();
        let y = find(&tree, "y");
        assert_eq!(tags(&tree, following(&tree, y)), vec!["b"]);
    }

    #[test]
    fn test_following_is_fused() {
        let tree = XmlTree::parse("<r><a/></r>").unwrap();
        let a = find(&tree, "a");
        let mut iter = following(&tree, a);
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_preceding_excludes_ancestors() {
        let tree = XmlTree::parse("<r><a><a1/></a><b><b1/><b2><x/></b2></b></r>").unwrap();
        let x = find(&tree, "x");
        assert_eq!(tags(&tree, preceding(&tree, x)), vec!["b1", "a1", "a"]);
    }

    #[test]
    fn test_preceding_from_root_is_empty() {
        let tree = XmlTree::parse("<r><a/></r>").unwrap();
        assert_eq!(preceding(&tree, tree.root().unwrap()).count(), 0);
    }

    #[test]
    fn test_preceding_on_deep_narrow_tree() {
        let mut tree = XmlTree::with_root("r");
        let mut parent = tree.root().unwrap();
        for _ in 0..10_000 {
            let child = tree.create_element("d");
            tree.append_child(parent, child);
            parent = child;
        }
        let sibling = tree.create_element("s");
        tree.append_child(parent, sibling);
        let leaf = tree.create_element("leaf");
        tree.append_child(parent, leaf);
        assert_eq!(tags(&tree, preceding(&tree, leaf)), vec!["s"]);
    }

    #[test]
    fn test_all_child_nodes_interleaves_runs() {
        let tree = XmlTree::parse("<a>1<b/>2<c/></a>").unwrap();
        let a = tree.root().unwrap();
        let units: Vec<Node> = all_child_nodes(&tree, a).collect();
        assert_eq!(units.len(), 5);
        assert_eq!(units[0].as_text().unwrap().text(), "1");
        assert_eq!(tree.tag(units[1].as_tree().unwrap()), "b");
        assert_eq!(units[2].as_text().unwrap().text(), "2");
        assert!(units[4].as_text().unwrap().is_absent());
    }

    #[test]
    fn test_following_nodes_routes_through_runs() {
        let tree = XmlTree::parse("<r>a<b>c</b>d<e/></r>").unwrap();
        let r = tree.root().unwrap();
        let start = Node::Text(TextRun::leading(&tree, r));
        let rendered: Vec<String> = following_nodes(&tree, start)
            .map(|node| match node {
                Node::Tree(id) => format!("<{}>", tree.tag(id)),
                Node::Text(run) => format!("'{}'", run.text()),
            })
            .collect();
        assert_eq!(
            rendered,
            vec!["<b>", "'c'", "'d'", "<e>", "''", "''"]
        );
    }

    #[test]
    fn test_following_nodes_from_element_skips_content() {
        let tree = XmlTree::parse("<r><b>inner</b>after</r>").unwrap();
        let b = find(&tree, "b");
        let first = following_nodes(&tree, Node::Tree(b)).next().unwrap();
        assert_eq!(first.as_text().unwrap().text(), "after");
    }
}
