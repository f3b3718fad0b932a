//! Insertion at character positions

use super::{parent_of, tag_of};
use crate::dom::{NodeId, XmlTree};
use crate::error::{Result, StructuralError};
use crate::nav::Slot;
use crate::text::{char_split, locate, SkipSet};
use tracing::debug;

fn check_not_within(tree: &XmlTree, new: NodeId, host: NodeId) -> Result<()> {
    if new == host || tree.is_ancestor(new, host) {
        return Err(StructuralError::CyclicMove {
            src: tag_of(tree, new),
            target: tag_of(tree, host),
        }
        .into());
    }
    Ok(())
}

/// Split `text` at `pos`, keep the left part and return the right part
fn split_off(text: Option<&str>, pos: usize) -> (Option<String>, String) {
    match text {
        Some(t) if !t.is_empty() => {
            let (left, right) = char_split(t, pos);
            ((!left.is_empty()).then(|| left.to_string()), right.to_string())
        }
        _ => (None, String::new()),
    }
}

/// Insert `new` as first child of `el`, splitting `el`'s leading text at `pos`
///
/// The right part of the split is appended to `new`'s trailing text.
pub fn insert_into_text(tree: &mut XmlTree, el: NodeId, new: NodeId, pos: usize) -> Result<NodeId> {
    check_not_within(tree, new, el)?;
    debug!(host = tree.tag(el), tag = tree.tag(new), pos, "insert into text");
    let (left, rest) = split_off(tree.text(el), pos);
    tree.set_text(el, left);
    tree.insert_child(el, 0, new);
    tree.append_tail(new, &rest);
    Ok(new)
}

/// Insert `new` right after `el`, splitting `el`'s trailing text at `pos`
///
/// The right part of the split is appended to `new`'s trailing text.
pub fn insert_into_tail(tree: &mut XmlTree, el: NodeId, new: NodeId, pos: usize) -> Result<NodeId> {
    let parent = parent_of(tree, el)?;
    check_not_within(tree, new, parent)?;
    if new == el {
        return Err(StructuralError::CyclicMove {
            src: tag_of(tree, new),
            target: tag_of(tree, el),
        }
        .into());
    }
    debug!(host = tree.tag(el), tag = tree.tag(new), pos, "insert into tail");
    let (left, rest) = split_off(tree.tail(el), pos);
    tree.set_tail(el, left);
    tree.insert_after(el, new);
    tree.append_tail(new, &rest);
    Ok(new)
}

/// Insert `new` at character position `pos` of `root`'s visible text
pub fn insert_at(
    tree: &mut XmlTree,
    root: NodeId,
    new: NodeId,
    pos: usize,
    skip: &SkipSet,
) -> Result<NodeId> {
    let location = locate(tree, root, pos, skip)?;
    match location.slot {
        Slot::Text => insert_into_text(tree, location.node, new, location.offset),
        Slot::Tail => insert_into_tail(tree, location.node, new, location.offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::tests::find;
    use crate::text::serialize_text;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_at_run_boundary() {
        let mut tree = XmlTree::parse("<root>abc<x/>def</root>").unwrap();
        let root = tree.root().unwrap();
        let n = tree.create_element("n");
        insert_at(&mut tree, root, n, 3, &SkipSet::none()).unwrap();
        assert_eq!(tree.to_markup(root), "<root>abc<n/><x/>def</root>");
    }

    #[test]
    fn test_insert_at_inside_tail() {
        let mut tree = XmlTree::parse("<root>abc<x/>def</root>").unwrap();
        let root = tree.root().unwrap();
        let n = tree.create_element("n");
        insert_at(&mut tree, root, n, 4, &SkipSet::none()).unwrap();
        assert_eq!(tree.to_markup(root), "<root>abc<x/>d<n/>ef</root>");
    }

    #[test]
    fn test_insert_at_start_of_empty_element() {
        let mut tree = XmlTree::parse("<root/>").unwrap();
        let root = tree.root().unwrap();
        let n = tree.create_element("n");
        insert_at(&mut tree, root, n, 0, &SkipSet::none()).unwrap();
        assert_eq!(tree.to_markup(root), "<root><n/></root>");
    }

    #[test]
    fn test_insert_at_end() {
        let mut tree = XmlTree::parse("<root>ab<x>c</x></root>").unwrap();
        let root = tree.root().unwrap();
        let n = tree.create_element("n");
        insert_at(&mut tree, root, n, 3, &SkipSet::none()).unwrap();
        assert_eq!(tree.to_markup(root), "<root>ab<x>c<n/></x></root>");
    }

    #[test]
    fn test_insert_at_out_of_range_leaves_tree() {
        let mut tree = XmlTree::parse("<root>ab</root>").unwrap();
        let root = tree.root().unwrap();
        let n = tree.create_element("n");
        assert!(insert_at(&mut tree, root, n, 3, &SkipSet::none()).is_err());
        assert_eq!(tree.to_markup(root), "<root>ab</root>");
        assert_eq!(tree.parent(n), None);
    }

    #[test]
    fn test_insert_keeps_text_of_new_element() {
        let mut tree = XmlTree::parse("<root>abcd</root>").unwrap();
        let root = tree.root().unwrap();
        let n = tree.create_element("n");
        tree.set_text(n, Some("XY".to_string()));
        insert_at(&mut tree, root, n, 2, &SkipSet::none()).unwrap();
        assert_eq!(
            serialize_text(&tree, root, &SkipSet::none(), &[]),
            "abXYcd"
        );
    }

    #[test]
    fn test_insert_into_tail_appends_rest_after_existing_tail() {
        let mut tree = XmlTree::parse("<r><a/>12<b/>34</r>").unwrap();
        let a = find(&tree, "a");
        let b = find(&tree, "b");
        insert_into_tail(&mut tree, a, b, 1).unwrap();
        assert_eq!(tree.to_markup(tree.root().unwrap()), "<r><a/>1<b/>342</r>");
    }

    #[test]
    fn test_insert_into_own_descendant_fails() {
        let mut tree = XmlTree::parse("<r><a><b/></a></r>").unwrap();
        let a = find(&tree, "a");
        let b = find(&tree, "b");
        let err = insert_into_text(&mut tree, b, a, 0).unwrap_err();
        assert!(matches!(
            err.as_structural(),
            Some(StructuralError::CyclicMove { .. })
        ));
    }
}
