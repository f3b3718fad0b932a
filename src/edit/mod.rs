//! Structural editing primitives
//!
//! Every edit keeps text attached to its left neighbour: when a node leaves
//! its place, the text that trailed it is handed to the previous sibling's
//! trailing text, or to the parent's leading text when nothing precedes it.
//!
//! Preconditions are checked before the tree is touched.

mod cut;
mod insert;
mod restructure;
mod strip;
mod xpath;

pub use cut::cut;
pub use insert::{insert_at, insert_into_text, insert_into_tail};
pub use restructure::{
    collect, move_element, move_element_to_pos, move_element_to_textpos, span, span_with, split,
    switch, wrap,
};
pub use strip::{lstrip, rstrip, strip};
pub use xpath::{get_xpath, get_xpath_index};

use crate::dom::{NodeId, XmlTree};
use crate::error::{Result, StructuralError};
use tracing::debug;

pub(crate) fn tag_of(tree: &XmlTree, id: NodeId) -> String {
    tree.tag(id).to_string()
}

pub(crate) fn parent_of(tree: &XmlTree, id: NodeId) -> Result<NodeId> {
    tree.parent(id).ok_or_else(|| {
        StructuralError::NoParent {
            tag: tag_of(tree, id),
        }
        .into()
    })
}

/// Append `s` to whatever text precedes the attached node `id`
pub(crate) fn append_preceding(tree: &mut XmlTree, parent: NodeId, id: NodeId, s: &str) {
    match tree.prev_sibling(id) {
        Some(prev) => tree.append_tail(prev, s),
        None => tree.append_text(parent, s),
    }
}

/// Hand the trailing text of `id` to its left neighbour and unlink it
fn fold_tail_and_detach(tree: &mut XmlTree, parent: NodeId, id: NodeId) {
    if let Some(tail) = tree.tail(id).map(str::to_owned) {
        append_preceding(tree, parent, id, &tail);
    }
    tree.set_tail(id, None);
    tree.detach(id);
}

/// Remove an element, keeping the text that follows it
pub fn delete(tree: &mut XmlTree, el: NodeId) -> Result<()> {
    let parent = tree.parent(el).ok_or_else(|| StructuralError::RootElement {
        op: "delete",
        tag: tag_of(tree, el),
    })?;
    debug!(tag = tree.tag(el), "delete");
    fold_tail_and_detach(tree, parent, el);
    Ok(())
}

/// Detach an element, leaving its trailing text in place; returns `el`
pub fn cut_element(tree: &mut XmlTree, el: NodeId) -> Result<NodeId> {
    let parent = parent_of(tree, el)?;
    debug!(tag = tree.tag(el), "cut element");
    fold_tail_and_detach(tree, parent, el);
    Ok(el)
}

/// Replace an element by its content
pub fn remove_tags(tree: &mut XmlTree, el: NodeId) -> Result<()> {
    let parent = parent_of(tree, el)?;
    debug!(tag = tree.tag(el), "remove tags");
    if let Some(text) = tree.text(el).map(str::to_owned) {
        append_preceding(tree, parent, el, &text);
    }
    tree.set_text(el, None);
    while let Some(child) = tree.first_child(el) {
        tree.insert_before(el, child);
    }
    fold_tail_and_detach(tree, parent, el);
    Ok(())
}

/// Remove an attribute; missing attributes are ignored
pub fn delat(tree: &mut XmlTree, el: NodeId, name: &str) {
    tree.remove_attribute(el, name);
}

/// Is `inner` a descendant of `outer`?
pub fn contains(tree: &XmlTree, outer: NodeId, inner: NodeId) -> bool {
    tree.is_ancestor(outer, inner)
}
