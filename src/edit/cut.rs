//! Removal of a document-order span

use super::{delete, remove_tags, tag_of};
use crate::dom::{NodeId, XmlTree};
use crate::error::{Result, StructuralError};
use crate::nav::axes::following_any;
use tracing::debug;

/// Remove everything from `from` through `to` in document order
///
/// Both endpoints go, together with their trailing text. Elements strictly
/// between them are unwrapped and emptied, except ancestors of `to`, which
/// stay in place with their leading text cleared. Ancestors of `from` that
/// end inside the span lose their trailing text.
///
/// Fails unless `to` follows `from` outside of `from`'s subtree.
pub fn cut(tree: &mut XmlTree, from: NodeId, to: NodeId) -> Result<()> {
    let mut between = Vec::new();
    let mut reached = false;
    for id in following_any(tree, from) {
        if id == to {
            reached = true;
            break;
        }
        between.push(id);
    }
    if !reached {
        return Err(StructuralError::NotInDocumentOrder {
            from: tag_of(tree, from),
            to: tag_of(tree, to),
        }
        .into());
    }
    debug!(from = tree.tag(from), to = tree.tag(to), inner = between.len(), "cut");

    tree.set_tail(from, None);
    for id in between {
        if tree.is_ancestor(id, to) {
            tree.set_text(id, None);
        } else if tree.is_element(id) {
            tree.set_text(id, None);
            tree.set_tail(id, None);
            remove_tags(tree, id)?;
        } else {
            tree.set_tail(id, None);
            tree.detach(id);
        }
    }
    let ancestors: Vec<NodeId> = tree.ancestors(from).collect();
    for ancestor in ancestors {
        if !tree.is_ancestor(ancestor, to) {
            tree.set_tail(ancestor, None);
        }
    }
    tree.set_tail(to, None);
    delete(tree, from)?;
    delete(tree, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::tests::find;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cut_between_siblings() {
        let mut tree = XmlTree::parse("<a>1<b/>2<c/>3</a>").unwrap();
        let b = find(&tree, "b");
        let c = find(&tree, "c");
        cut(&mut tree, b, c).unwrap();
        assert_eq!(tree.to_markup(tree.root().unwrap()), "<a>1</a>");
    }

    #[test]
    fn test_cut_unwraps_and_empties_inner_elements() {
        let mut tree =
            XmlTree::parse("<a>1<b/>2<i>x<u>y</u>z</i>w<!--note-->v<c/>3<d/></a>").unwrap();
        let b = find(&tree, "b");
        let c = find(&tree, "c");
        cut(&mut tree, b, c).unwrap();
        assert_eq!(tree.to_markup(tree.root().unwrap()), "<a>1<d/></a>");
    }

    #[test]
    fn test_cut_across_levels() {
        let mut tree = XmlTree::parse("<r><p>x<f/>y</p>w<q>k<t/>v</q>z</r>").unwrap();
        let f = find(&tree, "f");
        let t = find(&tree, "t");
        cut(&mut tree, f, t).unwrap();
        assert_eq!(tree.to_markup(tree.root().unwrap()), "<r><p>x</p><q/>z</r>");
    }

    #[test]
    fn test_cut_in_wrong_order_fails_untouched() {
        let src = "<a>1<b/>2<c/>3</a>";
        let mut tree = XmlTree::parse(src).unwrap();
        let b = find(&tree, "b");
        let c = find(&tree, "c");
        let err = cut(&mut tree, c, b).unwrap_err();
        assert!(matches!(
            err.as_structural(),
            Some(StructuralError::NotInDocumentOrder { .. })
        ));
        assert_eq!(tree.to_markup(tree.root().unwrap()), src);
    }

    #[test]
    fn test_cut_into_own_subtree_fails() {
        let mut tree = XmlTree::parse("<a><b><c/></b></a>").unwrap();
        let b = find(&tree, "b");
        let c = find(&tree, "c");
        assert!(cut(&mut tree, b, c).is_err());
    }
}
