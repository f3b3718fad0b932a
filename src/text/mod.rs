//! Character view of a subtree
//!
//! The visible text of an element is its leading text, then for each child
//! the child's visible text followed by the child's trailing text. Elements
//! in a skip set are opaque: their content is left out (or replaced), while
//! their trailing text still counts. Comments and processing instructions
//! contribute nothing but their trailing text.
//!
//! All lengths and offsets are counted in `char`s.

pub mod address;

use crate::dom::{NodeId, XmlTree};
use crate::nav::Slot;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

pub use address::{advance_to_next_character, element_position, locate, Location};

/// Tags whose subtrees are opaque to counting and addressing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipSet {
    /// Skip elements with one of these tags
    Tags(Vec<String>),
    /// Skip every child element
    All,
}

impl Default for SkipSet {
    fn default() -> Self {
        SkipSet::Tags(Vec::new())
    }
}

impl SkipSet {
    /// Skip nothing
    pub fn none() -> Self {
        Self::default()
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SkipSet::Tags(tags.into_iter().map(Into::into).collect())
    }

    pub fn all() -> Self {
        SkipSet::All
    }

    #[inline]
    pub fn skips(&self, tag: &str) -> bool {
        match self {
            SkipSet::All => true,
            SkipSet::Tags(tags) => tags.iter().any(|t| t == tag),
        }
    }

    /// Replacement text for a skipped tag
    ///
    /// `repl` lines up with the tag list (missing entries read as `""`);
    /// with `All`, the first entry stands for every tag.
    pub fn replacement<'r>(&self, tag: &str, repl: &[&'r str]) -> &'r str {
        let index = match self {
            SkipSet::All => Some(0),
            SkipSet::Tags(tags) => tags.iter().position(|t| t == tag),
        };
        index.and_then(|i| repl.get(i).copied()).unwrap_or("")
    }
}

/// One text-bearing slot in serialization order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPart<'a> {
    pub node: NodeId,
    pub slot: Slot,
    pub text: &'a str,
}

impl TextPart<'_> {
    #[inline]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

pub(crate) enum Piece<'a> {
    Run(TextPart<'a>),
    Skipped(NodeId),
}

enum Step {
    Enter(NodeId),
    Tail(NodeId),
}

fn push_children(tree: &XmlTree, parent: NodeId, stack: &mut Vec<Step>) {
    let mut child = tree.last_child(parent);
    while let Some(c) = child {
        stack.push(Step::Tail(c));
        stack.push(Step::Enter(c));
        child = tree.prev_sibling(c);
    }
}

/// Visit the runs under `el` in serialization order
///
/// `el` itself is always entered; the skip set applies to its descendants.
pub(crate) fn walk<'a, B>(
    tree: &'a XmlTree,
    el: NodeId,
    skip: &SkipSet,
    mut visit: impl FnMut(Piece<'a>) -> ControlFlow<B>,
) -> ControlFlow<B> {
    visit(Piece::Run(TextPart {
        node: el,
        slot: Slot::Text,
        text: tree.text(el).unwrap_or(""),
    }))?;
    let mut stack = Vec::new();
    push_children(tree, el, &mut stack);
    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                if !tree.is_element(id) {
                    continue;
                }
                if skip.skips(tree.tag(id)) {
                    visit(Piece::Skipped(id))?;
                    continue;
                }
                visit(Piece::Run(TextPart {
                    node: id,
                    slot: Slot::Text,
                    text: tree.text(id).unwrap_or(""),
                }))?;
                push_children(tree, id, &mut stack);
            }
            Step::Tail(id) => visit(Piece::Run(TextPart {
                node: id,
                slot: Slot::Tail,
                text: tree.tail(id).unwrap_or(""),
            }))?,
        }
    }
    ControlFlow::Continue(())
}

/// Text parts under `el` in order, empty ones included
pub fn text_parts<'a>(tree: &'a XmlTree, el: NodeId, skip: &SkipSet) -> Vec<TextPart<'a>> {
    let mut parts = Vec::new();
    let _ = walk::<()>(tree, el, skip, |piece| {
        if let Piece::Run(part) = piece {
            parts.push(part);
        }
        ControlFlow::Continue(())
    });
    parts
}

/// Visible text of `el`, with skipped subtrees replaced by `repl`
pub fn serialize_text(tree: &XmlTree, el: NodeId, skip: &SkipSet, repl: &[&str]) -> String {
    let mut out = String::new();
    let _ = walk::<()>(tree, el, skip, |piece| {
        match piece {
            Piece::Run(part) => out.push_str(part.text),
            Piece::Skipped(id) => out.push_str(skip.replacement(tree.tag(id), repl)),
        }
        ControlFlow::Continue(())
    });
    out
}

/// Length of `serialize_text(el, skip, &[])` without building the string
pub fn count_characters(tree: &XmlTree, el: NodeId, skip: &SkipSet) -> usize {
    let mut count = 0;
    let _ = walk::<()>(tree, el, skip, |piece| {
        if let Piece::Run(part) = piece {
            count += part.char_len();
        }
        ControlFlow::Continue(())
    });
    count
}

/// Split `s` at a character offset (clamped to its length)
pub(crate) fn char_split(s: &str, offset: usize) -> (&str, &str) {
    let byte = s
        .char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(byte)
}
