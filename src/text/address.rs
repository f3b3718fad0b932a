//! Character addressing
//!
//! Maps offsets in the visible text of an element to the run that holds
//! them, and back.

use super::{count_characters, walk, Piece, SkipSet};
use crate::dom::{NodeId, XmlTree};
use crate::error::{AddressingError, Result, StructuralError};
use crate::nav::Slot;
use std::ops::ControlFlow;
use tracing::trace;

/// A place in the tree: a run and a character offset into it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    pub node: NodeId,
    pub slot: Slot,
    pub offset: usize,
}

impl Location {
    pub fn new(node: NodeId, slot: Slot, offset: usize) -> Self {
        Location { node, slot, offset }
    }
}

fn run_text(tree: &XmlTree, node: NodeId, slot: Slot) -> &str {
    match slot {
        Slot::Text => tree.text(node),
        Slot::Tail => tree.tail(node),
    }
    .unwrap_or("")
}

/// Resolve a character offset in the visible text of `el`
///
/// - position 0 is the start of `el`'s own leading text, even when it is absent
/// - a position on the boundary between two runs belongs to the end of the
///   earlier run
/// - the total count is the end of the last non-empty run
/// - anything larger fails with the number of available characters
pub fn locate(tree: &XmlTree, el: NodeId, pos: usize, skip: &SkipSet) -> Result<Location> {
    if pos == 0 {
        return Ok(Location::new(el, Slot::Text, 0));
    }
    let mut start = 0usize;
    let found = walk(tree, el, skip, |piece| {
        let Piece::Run(part) = piece else {
            return ControlFlow::Continue(());
        };
        let len = part.char_len();
        if len == 0 {
            return ControlFlow::Continue(());
        }
        let end = start + len;
        if pos <= end {
            return ControlFlow::Break(Location::new(part.node, part.slot, pos - start));
        }
        start = end;
        ControlFlow::Continue(())
    });
    match found {
        ControlFlow::Break(location) => {
            trace!(pos, node = location.node, offset = location.offset, "located");
            Ok(location)
        }
        ControlFlow::Continue(()) => Err(AddressingError::PositionOutOfRange {
            requested: pos,
            available: start,
            tag: tree.tag(el).to_string(),
        }
        .into()),
    }
}

/// Offset at which `el` starts in the visible text of its parent
pub fn element_position(tree: &XmlTree, el: NodeId, skip: &SkipSet) -> Result<usize> {
    let parent = tree.parent(el).ok_or_else(|| StructuralError::NoParent {
        tag: tree.tag(el).to_string(),
    })?;
    let mut pos = tree.text(parent).map_or(0, |t| t.chars().count());
    for sibling in tree.children(parent) {
        if sibling == el {
            break;
        }
        if tree.is_element(sibling) && !skip.skips(tree.tag(sibling)) {
            pos += count_characters(tree, sibling, skip);
        }
        pos += tree.tail(sibling).map_or(0, |t| t.chars().count());
    }
    Ok(pos)
}

/// First position at or after (`node`, `slot`, `pos`) that holds a character
///
/// The walk never leaves `container`: its trailing text is out of bounds.
/// Skipped elements are stepped over, their trailing text is not.
/// `None` means no character is left inside the container.
pub fn advance_to_next_character(
    tree: &XmlTree,
    node: NodeId,
    slot: Slot,
    pos: usize,
    container: NodeId,
    skip: &SkipSet,
) -> Result<Option<Location>> {
    if node != container && !tree.is_ancestor(container, node) {
        return Err(StructuralError::NotInContainer {
            tag: tree.tag(node).to_string(),
            container: tree.tag(container).to_string(),
        }
        .into());
    }

    let entry = |id: NodeId| {
        if tree.is_element(id) && !skip.skips(tree.tag(id)) {
            (id, Slot::Text)
        } else {
            (id, Slot::Tail)
        }
    };

    let (mut node, mut slot, mut offset) = (node, slot, pos);
    loop {
        if slot == Slot::Tail && node == container {
            return Ok(None);
        }
        if offset < run_text(tree, node, slot).chars().count() {
            trace!(node, ?slot, offset, "next character");
            return Ok(Some(Location::new(node, slot, offset)));
        }
        offset = 0;
        (node, slot) = match slot {
            Slot::Text => match tree.first_child(node) {
                Some(child) => entry(child),
                None => (node, Slot::Tail),
            },
            Slot::Tail => match tree.next_sibling(node) {
                Some(next) => entry(next),
                None => match tree.parent(node) {
                    Some(parent) if parent != container => (parent, Slot::Tail),
                    _ => return Ok(None),
                },
            },
        };
    }
}
