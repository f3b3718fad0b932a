//! Indentation formatter
//!
//! Rewrites whitespace in place, never structure:
//! - runs of spaces collapse to one space
//! - whitespace containing line breaks becomes one newline plus indentation
//! - block-level tags raise the indentation level and get line breaks
//!   around them
//! - `xml:space="preserve"` suspends all of this for a subtree

use crate::dom::{NodeId, XmlTree, XML_SPACE};
use memchr::memchr;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(" +").expect("valid space pattern"));
static LINEBREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\n+\s*").expect("valid linebreak pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentOptions {
    /// Block-level tags
    pub block: Vec<String>,
    /// Spaces per level
    pub shiftwidth: usize,
    pub initial_level: usize,
    /// Leave `xml:space="preserve"` subtrees alone
    pub honor_xml_space: bool,
}

impl Default for IndentOptions {
    fn default() -> Self {
        IndentOptions {
            block: Vec::new(),
            shiftwidth: 2,
            initial_level: 0,
            honor_xml_space: true,
        }
    }
}

/// Indent the root element of `tree`
///
/// Recurses once per element level; documents nested thousands of levels
/// deep can exhaust the thread's stack.
pub fn indent(tree: &mut XmlTree, options: IndentOptions) {
    if let Some(root) = tree.root() {
        Indenter::new(options).indent_element(tree, root);
    }
}

/// Stateful formatter; the level and `xml:space` mode follow the walk
#[derive(Debug, Clone)]
pub struct Indenter {
    options: IndentOptions,
    level: usize,
    preserve: bool,
}

impl Indenter {
    pub fn new(options: IndentOptions) -> Self {
        let level = options.initial_level;
        Indenter {
            options,
            level,
            preserve: false,
        }
    }

    fn is_block(&self, tree: &XmlTree, id: NodeId) -> bool {
        tree.is_element(id) && self.options.block.iter().any(|b| b == tree.tag(id))
    }

    fn indentation(&self, level: usize) -> String {
        " ".repeat(level * self.options.shiftwidth)
    }

    fn normalize(&self, s: Option<&str>, last: bool) -> Option<String> {
        let s = s?;
        let collapsed = SPACES.replace_all(s, NoExpand(" "));
        if memchr(b'\n', collapsed.as_bytes()).is_none() {
            return Some(collapsed.into_owned());
        }
        let level = if last {
            self.level.saturating_sub(1)
        } else {
            self.level
        };
        let linebreak = format!("\n{}", self.indentation(level));
        Some(
            LINEBREAKS
                .replace_all(&collapsed, NoExpand(&linebreak))
                .into_owned(),
        )
    }

    fn starts_with_linebreak(text: &str) -> bool {
        for c in text.chars() {
            if c == '\n' {
                return true;
            }
            if !c.is_whitespace() {
                return false;
            }
        }
        false
    }

    fn is_next_block(&self, tree: &XmlTree, id: NodeId) -> bool {
        tree.next_sibling(id)
            .is_some_and(|next| self.is_block(tree, next))
    }

    fn indent_children(&mut self, tree: &mut XmlTree, children: &[NodeId]) {
        for &child in children {
            if tree.is_element(child) {
                let saved = self.preserve;
                self.indent_element(tree, child);
                self.preserve = saved;
            }
        }
    }

    /// Indent `el` and everything below it, one call per element level
    pub fn indent_element(&mut self, tree: &mut XmlTree, el: NodeId) {
        if let Some(space) = tree.attribute(el, XML_SPACE) {
            self.preserve = space == "preserve";
        }
        let block = self.is_block(tree, el);
        if block {
            self.level += 1;
        }
        let children: Vec<NodeId> = tree.children(el).collect();

        if self.preserve && self.options.honor_xml_space {
            debug!(tag = tree.tag(el), "xml:space preserved");
            self.indent_children(tree, &children);
            if block {
                self.level -= 1;
            }
            return;
        }

        let text = self.normalize(tree.text(el), false);
        tree.set_text(el, text);
        let mut linebreak_at_end = Self::starts_with_linebreak(tree.text(el).unwrap_or(""));
        if !linebreak_at_end {
            if let Some(&first) = children.first() {
                if self.is_block(tree, first) && tree.text(el).unwrap_or("").trim().is_empty() {
                    let text = format!("\n{}", self.indentation(self.level));
                    tree.set_text(el, Some(text));
                    linebreak_at_end = true;
                }
            }
        }

        for &child in &children {
            if tree.is_element(child) {
                let saved = self.preserve;
                self.indent_element(tree, child);
                self.preserve = saved;
            }
            if tree.tail(child).unwrap_or("").trim().is_empty() && self.is_next_block(tree, child) {
                tree.set_tail(child, Some("\n".to_string()));
            }
            let last = tree.next_sibling(child).is_none();
            let tail = self.normalize(tree.tail(child), last);
            tree.set_tail(child, tail);
        }

        if linebreak_at_end {
            let closing = format!("\n{}", self.indentation(self.level.saturating_sub(1)));
            match children.last() {
                None => {
                    let text = tree.text(el).unwrap_or("").trim_end().to_string() + &closing;
                    tree.set_text(el, Some(text));
                }
                Some(&last) => {
                    let tail = tree.tail(last).unwrap_or("").trim_end().to_string() + &closing;
                    tree.set_tail(last, Some(tail));
                }
            }
        }

        if block {
            self.level -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn indented(src: &str, block: &[&str]) -> String {
        let mut tree = XmlTree::parse(src).unwrap();
        let options = IndentOptions {
            block: block.iter().map(|b| b.to_string()).collect(),
            ..Default::default()
        };
        indent(&mut tree, options);
        tree.to_string()
    }

    #[test]
    fn test_block_children_on_own_lines() {
        assert_eq!(
            indented("<doc><p>a</p><p>b</p></doc>", &["p"]),
            "<doc>\n<p>a</p>\n<p>b</p>\n</doc>"
        );
    }

    #[test]
    fn test_nested_blocks() {
        let src = "<list><item>a</item><item><list><item>b</item></list></item></list>";
        let expected = "<list>\n  <item>a</item>\n  <item>\n    <list>\n      <item>b</item>\n    </list>\n  </item>\n</list>";
        assert_eq!(indented(src, &["list", "item"]), expected);
    }

    #[test]
    fn test_whitespace_collapses() {
        assert_eq!(indented("<p>a   b\n\n   c</p>", &[]), "<p>a b\nc</p>");
    }

    #[test]
    fn test_inline_tail_is_normalized() {
        assert_eq!(
            indented("<p>x<i>y</i>   z<!--c-->  w</p>", &[]),
            "<p>x<i>y</i> z<!--c--> w</p>"
        );
    }

    #[test]
    fn test_preserve_suspends_and_keeps_level() {
        let src = "<list><item xml:space=\"preserve\"> a  </item><item>b</item></list>";
        let expected =
            "<list>\n  <item xml:space=\"preserve\"> a  </item>\n  <item>b</item>\n</list>";
        assert_eq!(indented(src, &["list", "item"]), expected);
    }

    #[test]
    fn test_preserve_is_scoped_to_subtree() {
        let src = "<doc><pre xml:space=\"preserve\">  x   y  </pre><p>a    b</p></doc>";
        assert_eq!(
            indented(src, &[]),
            "<doc><pre xml:space=\"preserve\">  x   y  </pre><p>a b</p></doc>"
        );
    }

    #[test]
    fn test_preserve_can_be_ignored() {
        let mut tree = XmlTree::parse("<p xml:space=\"preserve\">a   b</p>").unwrap();
        let options = IndentOptions {
            honor_xml_space: false,
            ..Default::default()
        };
        indent(&mut tree, options);
        assert_eq!(tree.to_string(), "<p xml:space=\"preserve\">a b</p>");
    }

    #[test]
    fn test_nested_chain() {
        let mut tree = XmlTree::with_root("d");
        let mut parent = tree.root().unwrap();
        for _ in 0..200 {
            let child = tree.create_element("d");
            tree.append_child(parent, child);
            parent = child;
        }
        tree.set_text(parent, Some("a    b".to_string()));
        indent(&mut tree, IndentOptions::default());
        assert_eq!(tree.text(parent), Some("a b"));
    }

    #[test]
    fn test_options_from_json() {
        let options: IndentOptions =
            serde_json::from_str(r#"{"block": ["p"], "shiftwidth": 4}"#).unwrap();
        assert_eq!(options.block, vec!["p".to_string()]);
        assert_eq!(options.shiftwidth, 4);
        assert_eq!(options.initial_level, 0);
        assert!(options.honor_xml_space);
    }
}
