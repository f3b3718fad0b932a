//! Whitespace trimming through element content
//!
//! Trimming walks the runs of an element in document order (or in reverse
//! for trailing whitespace) and stops at the first run that keeps a visible
//! character. Skipped elements are never entered, so their own whitespace
//! survives. The walk uses an explicit stack.

use crate::dom::{NodeId, XmlTree};
use crate::nav::Slot;
use crate::text::SkipSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Leading,
    Trailing,
}

enum Step {
    Content(NodeId),
    Run(NodeId, Slot),
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn enters(tree: &XmlTree, id: NodeId, skip: &SkipSet) -> bool {
    tree.is_element(id) && !skip.skips(tree.tag(id))
}

/// Queue the runs of `id` so that they pop in walk order
fn push_content(tree: &XmlTree, id: NodeId, skip: &SkipSet, edge: Edge, stack: &mut Vec<Step>) {
    let children: Vec<NodeId> = tree.children(id).collect();
    match edge {
        Edge::Leading => {
            for &child in children.iter().rev() {
                stack.push(Step::Run(child, Slot::Tail));
                if enters(tree, child, skip) {
                    stack.push(Step::Content(child));
                }
            }
            stack.push(Step::Run(id, Slot::Text));
        }
        Edge::Trailing => {
            stack.push(Step::Run(id, Slot::Text));
            for &child in &children {
                if enters(tree, child, skip) {
                    stack.push(Step::Content(child));
                }
                stack.push(Step::Run(child, Slot::Tail));
            }
        }
    }
}

/// Trim one run; true when a visible character is left in it
fn trim_run(tree: &mut XmlTree, node: NodeId, slot: Slot, edge: Edge) -> bool {
    let current = match slot {
        Slot::Text => tree.text(node),
        Slot::Tail => tree.tail(node),
    };
    let Some(current) = current else {
        return false;
    };
    let trimmed = match edge {
        Edge::Leading => non_empty(current.trim_start()),
        Edge::Trailing => non_empty(current.trim_end()),
    };
    let visible = trimmed.is_some();
    match slot {
        Slot::Text => tree.set_text(node, trimmed),
        Slot::Tail => tree.set_tail(node, trimmed),
    }
    visible
}

fn trim_edge(tree: &mut XmlTree, el: NodeId, skip: &SkipSet, edge: Edge) {
    let mut stack = vec![Step::Content(el)];
    while let Some(step) = stack.pop() {
        match step {
            Step::Content(id) => push_content(tree, id, skip, edge, &mut stack),
            Step::Run(node, slot) => {
                if trim_run(tree, node, slot, edge) {
                    return;
                }
            }
        }
    }
}

/// Remove leading whitespace from the content of `el`
pub fn lstrip(tree: &mut XmlTree, el: NodeId, skip: &SkipSet) {
    trim_edge(tree, el, skip, Edge::Leading);
}

/// Remove trailing whitespace from the content of `el`
pub fn rstrip(tree: &mut XmlTree, el: NodeId, skip: &SkipSet) {
    trim_edge(tree, el, skip, Edge::Trailing);
}

/// `lstrip` followed by `rstrip`
pub fn strip(tree: &mut XmlTree, el: NodeId, skip: &SkipSet) {
    lstrip(tree, el, skip);
    rstrip(tree, el, skip);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::serialize_text;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("<p>  a b  </p>", "<p>a b</p>")]
    #[case("<p> <i> x </i> y </p>", "<p><i>x </i> y</p>")]
    #[case("<p> <i> </i> y<b/> </p>", "<p><i/>y<b/></p>")]
    #[case("<p>\n  <i>one</i> two <!--c-->\n</p>", "<p><i>one</i> two<!--c--></p>")]
    #[case("<p>a</p>", "<p>a</p>")]
    fn test_strip(#[case] src: &str, #[case] expected: &str) {
        let mut tree = XmlTree::parse(src).unwrap();
        let p = tree.root().unwrap();
        strip(&mut tree, p, &SkipSet::none());
        assert_eq!(tree.to_markup(p), expected);
        strip(&mut tree, p, &SkipSet::none());
        assert_eq!(tree.to_markup(p), expected);
    }

    #[test]
    fn test_skipped_content_keeps_whitespace() {
        let mut tree = XmlTree::parse("<p> <n> x </n> a <n> y </n> </p>").unwrap();
        let p = tree.root().unwrap();
        strip(&mut tree, p, &SkipSet::tags(["n"]));
        assert_eq!(tree.to_markup(p), "<p><n> x </n>a<n> y </n></p>");
    }

    #[test]
    fn test_rstrip_stops_at_visible_character() {
        let mut tree = XmlTree::parse("<p>a <b>c </b></p>").unwrap();
        let p = tree.root().unwrap();
        rstrip(&mut tree, p, &SkipSet::none());
        assert_eq!(tree.to_markup(p), "<p>a <b>c</b></p>");
    }

    #[test]
    fn test_lstrip_only_leading() {
        let mut tree = XmlTree::parse("<p> <b> </b> c </p>").unwrap();
        let p = tree.root().unwrap();
        lstrip(&mut tree, p, &SkipSet::none());
        assert_eq!(tree.to_markup(p), "<p><b/>c </p>");
    }

    #[test]
    fn test_strip_deep_narrow_tree() {
        let mut tree = XmlTree::with_root("r");
        let root = tree.root().unwrap();
        let mut parent = root;
        for _ in 0..10_000 {
            let child = tree.create_element("d");
            tree.append_child(parent, child);
            tree.set_tail(child, Some(" ".to_string()));
            parent = child;
        }
        tree.set_text(parent, Some(" x ".to_string()));
        strip(&mut tree, root, &SkipSet::none());
        assert_eq!(tree.text(parent), Some("x"));
        assert_eq!(tree.tail(tree.first_child(root).unwrap()), None);
        assert_eq!(serialize_text(&tree, root, &SkipSet::none(), &[]), "x");
    }
}
