//! Moving, wrapping, splitting and switching elements

use super::{cut_element, delete, insert_into_tail, insert_into_text, parent_of, tag_of};
use crate::dom::{NodeId, XmlTree};
use crate::error::{Result, StructuralError};
use crate::nav::Slot;
use crate::text::{locate, Location, SkipSet};
use tracing::debug;

/// Tag of the placeholder created by the positional move helpers
const PLACEHOLDER: &str = "target";

fn cyclic(tree: &XmlTree, src: NodeId, target: NodeId) -> StructuralError {
    StructuralError::CyclicMove {
        src: tag_of(tree, src),
        target: tag_of(tree, target),
    }
}

/// Overwrite `target` with the content of `src`, then delete `src`
///
/// `target` takes `src`'s tag, attributes, leading text and children; its
/// own attributes and children are dropped. Its trailing text is kept.
/// Fails when either element contains the other, or when `src` is the root.
pub fn move_element(tree: &mut XmlTree, src: NodeId, target: NodeId) -> Result<()> {
    if src == target || tree.is_ancestor(src, target) || tree.is_ancestor(target, src) {
        return Err(cyclic(tree, src, target).into());
    }
    if tree.parent(src).is_none() {
        return Err(StructuralError::RootElement {
            op: "move",
            tag: tag_of(tree, src),
        }
        .into());
    }
    debug!(src = tree.tag(src), target = tree.tag(target), "move element");

    tree.clear_attributes(target);
    let tag = tag_of(tree, src);
    tree.set_tag(target, &tag);
    while let Some(child) = tree.first_child(target) {
        tree.detach(child);
    }
    tree.set_text(target, tree.text(src).map(str::to_owned));
    while let Some(child) = tree.first_child(src) {
        tree.append_child(target, child);
    }
    let attributes: Vec<(String, String)> = tree
        .attributes(src)
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    for (name, value) in attributes {
        tree.set_attribute(target, &name, value);
    }
    delete(tree, src)
}

/// Refuse destinations that would end up inside `src`
fn check_destination(tree: &XmlTree, src: NodeId, location: &Location) -> Result<()> {
    let host = match location.slot {
        Slot::Text => Some(location.node),
        Slot::Tail => tree.parent(location.node),
    };
    if let Some(host) = host {
        if host == src || tree.is_ancestor(src, host) {
            return Err(cyclic(tree, src, location.node).into());
        }
    }
    if tree.parent(src).is_none() {
        return Err(StructuralError::RootElement {
            op: "move",
            tag: tag_of(tree, src),
        }
        .into());
    }
    Ok(())
}

fn move_to_location(tree: &mut XmlTree, src: NodeId, location: Location) -> Result<NodeId> {
    check_destination(tree, src, &location)?;
    let placeholder = tree.create_element(PLACEHOLDER);
    match location.slot {
        Slot::Text => insert_into_text(tree, location.node, placeholder, location.offset)?,
        Slot::Tail => insert_into_tail(tree, location.node, placeholder, location.offset)?,
    };
    move_element(tree, src, placeholder)?;
    Ok(placeholder)
}

/// Move `src` to an offset in the leading or trailing text of `target`
///
/// Returns the element now holding `src`'s content.
pub fn move_element_to_pos(
    tree: &mut XmlTree,
    src: NodeId,
    target: NodeId,
    slot: Slot,
    pos: usize,
) -> Result<NodeId> {
    if slot == Slot::Tail {
        parent_of(tree, target)?;
    }
    move_to_location(tree, src, Location::new(target, slot, pos))
}

/// Move `src` to character position `textpos` of `target`'s visible text
///
/// Returns the element now holding `src`'s content.
pub fn move_element_to_textpos(
    tree: &mut XmlTree,
    src: NodeId,
    target: NodeId,
    textpos: usize,
    skip: &SkipSet,
) -> Result<NodeId> {
    let location = locate(tree, target, textpos, skip)?;
    move_to_location(tree, src, location)
}

/// Put `new` in `target`'s place and make `target` its only child
///
/// `new` takes over `target`'s trailing text.
pub fn wrap(tree: &mut XmlTree, new: NodeId, target: NodeId) -> Result<()> {
    let parent = parent_of(tree, target)?;
    if new == target || new == parent || tree.is_ancestor(new, parent) {
        return Err(cyclic(tree, new, target).into());
    }
    debug!(wrapper = tree.tag(new), tag = tree.tag(target), "wrap");
    let tail = tree.tail(target).map(str::to_owned);
    tree.insert_before(target, new);
    tree.set_tail(new, tail);
    tree.set_tail(target, None);
    tree.append_child(new, target);
    Ok(())
}

/// Move `targets` into `new`, which takes the place of the first target
///
/// All but the last target move with their trailing text; the last one
/// leaves its trailing text behind.
pub fn collect(tree: &mut XmlTree, new: NodeId, targets: &[NodeId]) -> Result<()> {
    let (Some(&first), Some(&last)) = (targets.first(), targets.last()) else {
        return Err(StructuralError::EmptyTargets.into());
    };
    parent_of(tree, first)?;
    parent_of(tree, last)?;
    if targets
        .iter()
        .any(|&t| t == new || tree.is_ancestor(new, t))
    {
        return Err(cyclic(tree, new, first).into());
    }
    debug!(wrapper = tree.tag(new), count = targets.len(), "collect");

    tree.insert_before(first, new);
    for &target in &targets[..targets.len() - 1] {
        tree.append_child(new, target);
    }
    let last = cut_element(tree, last)?;
    tree.append_child(new, last);
    Ok(())
}

/// Wrap a new `span` element around the siblings `start` through `end`
pub fn span(tree: &mut XmlTree, start: NodeId, end: Option<NodeId>) -> Result<NodeId> {
    let wrapper = tree.create_element("span");
    span_with(tree, wrapper, start, end)
}

/// Wrap `wrapper` around the siblings `start` through `end`
///
/// Without `end`, this is `wrap`. The text between the siblings moves into
/// the wrapper; the text after `end` stays outside. Returns `wrapper`.
pub fn span_with(
    tree: &mut XmlTree,
    wrapper: NodeId,
    start: NodeId,
    end: Option<NodeId>,
) -> Result<NodeId> {
    let Some(end) = end else {
        wrap(tree, wrapper, start)?;
        return Ok(wrapper);
    };
    let parent = parent_of(tree, start)?;
    if tree.parent(end) != Some(parent) {
        return Err(StructuralError::NotSiblings {
            start: tag_of(tree, start),
            end: tag_of(tree, end),
        }
        .into());
    }
    if tree.index_of(start) > tree.index_of(end) {
        return Err(StructuralError::ReversedOrder {
            start: tag_of(tree, start),
            end: tag_of(tree, end),
        }
        .into());
    }
    let leading: Vec<NodeId> = tree
        .children(parent)
        .skip_while(|&c| c != start)
        .take_while(|&c| c != end)
        .collect();
    if wrapper == end
        || leading.contains(&wrapper)
        || wrapper == parent
        || tree.is_ancestor(wrapper, parent)
    {
        return Err(cyclic(tree, wrapper, start).into());
    }
    debug!(wrapper = tree.tag(wrapper), start = tree.tag(start), end = tree.tag(end), "span");

    tree.insert_before(start, wrapper);
    for node in leading {
        tree.append_child(wrapper, node);
    }
    let end = cut_element(tree, end)?;
    tree.append_child(wrapper, end);
    Ok(wrapper)
}

/// Lift `el` one level up by splitting its parent around it
///
/// `<a>1<b/>2</a>` becomes `<a>1</a><b/><a>2</a>`. The second half is a copy
/// of the parent's tag and attributes and takes over the parent's trailing
/// text.
pub fn split(tree: &mut XmlTree, el: NodeId) -> Result<()> {
    let parent = parent_of(tree, el)?;
    if tree.parent(parent).is_none() {
        return Err(StructuralError::NoGrandparent {
            tag: tag_of(tree, el),
        }
        .into());
    }
    debug!(tag = tree.tag(el), parent = tree.tag(parent), "split");

    let second = tree.shallow_copy(parent);
    tree.set_text(second, tree.tail(el).map(str::to_owned));
    let parent_tail = tree.tail(parent).map(str::to_owned);
    tree.set_tail(parent, None);
    while let Some(next) = tree.next_sibling(el) {
        tree.append_child(second, next);
    }
    tree.set_tail(el, None);
    tree.insert_after(parent, el);
    tree.insert_after(el, second);
    tree.set_tail(second, parent_tail);
    Ok(())
}

/// Exchange the places of two elements
///
/// The text runs stay where they are: whatever followed `a`'s old place
/// now follows `b`, and the other way round.
pub fn switch(tree: &mut XmlTree, a: NodeId, b: NodeId) -> Result<()> {
    if a == b {
        return Ok(());
    }
    for id in [a, b] {
        if tree.parent(id).is_none() {
            return Err(StructuralError::RootElement {
                op: "switch",
                tag: tag_of(tree, id),
            }
            .into());
        }
    }
    if tree.is_ancestor(a, b) || tree.is_ancestor(b, a) {
        return Err(StructuralError::NestedSwitch {
            first: tag_of(tree, a),
            second: tag_of(tree, b),
        }
        .into());
    }
    debug!(first = tree.tag(a), second = tree.tag(b), "switch");

    let (parent_a, next_a) = (parent_of(tree, a)?, tree.next_sibling(a));
    let (parent_b, next_b) = (parent_of(tree, b)?, tree.next_sibling(b));
    if next_a == Some(b) {
        tree.insert_before(a, b);
    } else if next_b == Some(a) {
        tree.insert_before(b, a);
    } else {
        match next_b {
            Some(anchor) => tree.insert_before(anchor, a),
            None => tree.append_child(parent_b, a),
        }
        match next_a {
            Some(anchor) => tree.insert_before(anchor, b),
            None => tree.append_child(parent_a, b),
        }
    }
    let tail_a = tree.tail(a).map(str::to_owned);
    let tail_b = tree.tail(b).map(str::to_owned);
    tree.set_tail(a, tail_b);
    tree.set_tail(b, tail_a);
    Ok(())
}
