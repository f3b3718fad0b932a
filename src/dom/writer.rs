//! Markup writer
//!
//! Serializes subtrees back to markup. Iterative so that deep trees do not
//! exhaust the call stack.

use super::document::XmlTree;
use super::node::{NodeId, NodeKind};
use quick_xml::escape::{escape, partial_escape};
use std::fmt;

enum Step {
    Open(NodeId),
    Close(NodeId),
}

impl XmlTree {
    /// Serialize a node and its content, without its trailing text
    pub fn to_markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    /// Serialize a node, its content and its trailing text
    pub fn to_markup_with_tail(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, true, &mut out);
        out
    }

    /// Serialize the front nodes followed by the root element
    pub fn document_markup(&self) -> String {
        let mut out = String::new();
        for &front in self.front_nodes() {
            self.write_node(front, false, &mut out);
        }
        if let Some(root) = self.root() {
            self.write_node(root, false, &mut out);
        }
        out
    }

    fn write_node(&self, top: NodeId, with_tail: bool, out: &mut String) {
        let mut stack = vec![Step::Open(top)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Open(id) => match self.kind(id) {
                    NodeKind::Comment => {
                        out.push_str("<!--");
                        out.push_str(self.value(id).unwrap_or(""));
                        out.push_str("-->");
                        self.write_tail(id, top, with_tail, out);
                    }
                    NodeKind::ProcessingInstruction => {
                        out.push_str("<?");
                        out.push_str(self.tag(id));
                        if let Some(data) = self.value(id) {
                            out.push(' ');
                            out.push_str(data);
                        }
                        out.push_str("?>");
                        self.write_tail(id, top, with_tail, out);
                    }
                    NodeKind::Element => {
                        out.push('<');
                        out.push_str(self.tag(id));
                        for (name, value) in self.attributes(id) {
                            out.push(' ');
                            out.push_str(name);
                            out.push_str("=\"");
                            out.push_str(&escape(value));
                            out.push('"');
                        }
                        let text = self.text(id).unwrap_or("");
                        if text.is_empty() && !self.has_children(id) {
                            out.push_str("/>");
                            self.write_tail(id, top, with_tail, out);
                            continue;
                        }
                        out.push('>');
                        out.push_str(&partial_escape(text));
                        stack.push(Step::Close(id));
                        let mut child = self.last_child(id);
                        while let Some(c) = child {
                            stack.push(Step::Open(c));
                            child = self.prev_sibling(c);
                        }
                    }
                },
                Step::Close(id) => {
                    out.push_str("</");
                    out.push_str(self.tag(id));
                    out.push('>');
                    self.write_tail(id, top, with_tail, out);
                }
            }
        }
    }

    #[inline]
    fn write_tail(&self, id: NodeId, top: NodeId, with_tail: bool, out: &mut String) {
        if id != top || with_tail {
            if let Some(tail) = self.tail(id) {
                out.push_str(&partial_escape(tail));
            }
        }
    }
}

impl fmt::Display for XmlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.document_markup())
    }
}
