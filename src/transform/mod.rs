//! Tree transformation engine
//!
//! A `Transformer` walks an input tree and builds a new output tree:
//! 1. optional preprocessing hook
//! 2. indexing: every element with an `xml:id` goes into the id index, and
//!    an optional per-element hook can build further indexes
//! 3. dispatch from the root: text runs, comments and PIs go to their hooks,
//!    elements to the handler registered for their local name, or else to
//!    the default element transformation (a copy with transformed children)
//! 4. optional postprocessing hook
//!
//! Hooks return `Output` values. When appended to an element, texts merge
//! into the leading text or the last child's trailing text, so the output
//! never holds text outside the text/tail slots.

mod output;

pub use output::{Output, Transformed};

use crate::dom::namespace::is_namespace_declaration;
use crate::dom::{local_name, NodeId, NodeKind, XmlTree, XML_ID, XML_ID_CLARK};
use crate::error::{AddressingError, Error, Result};
use crate::nav::{all_child_nodes, Node, TextRun};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Engine-level switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Drop comments instead of copying them
    pub skip_comments: bool,
    /// Drop processing instructions instead of copying them
    pub skip_pis: bool,
    /// Output elements get the local name only, without namespace declarations
    pub strip_namespaces: bool,
}

/// Hook for elements, comments and processing instructions of the input
pub type NodeHandler<'a> = Rc<dyn Fn(&mut Transformer<'a>, NodeId) -> Result<Output> + 'a>;
/// Hook for text runs of the input
pub type TextHandler<'a> = Rc<dyn Fn(&mut Transformer<'a>, &TextRun) -> Result<Output> + 'a>;
type IndexHandler<'a> = Rc<dyn Fn(&mut Transformer<'a>, NodeId) + 'a>;
type PreHandler<'a> = Rc<dyn Fn(&mut Transformer<'a>) -> Result<()> + 'a>;
type PostHandler<'a> = Rc<dyn Fn(&mut Transformer<'a>, Output) -> Result<Output> + 'a>;

/// Builds a new tree from an input tree, node by node
pub struct Transformer<'a> {
    input: &'a XmlTree,
    output: XmlTree,
    options: TransformOptions,
    ids: HashMap<String, NodeId>,
    index: HashMap<String, Vec<NodeId>>,
    skip_nodes: HashSet<Node>,
    handlers: HashMap<String, NodeHandler<'a>>,
    on_text: Option<TextHandler<'a>>,
    on_comment: Option<NodeHandler<'a>>,
    on_pi: Option<NodeHandler<'a>>,
    on_index: Option<IndexHandler<'a>>,
    on_preprocess: Option<PreHandler<'a>>,
    on_postprocess: Option<PostHandler<'a>>,
}

impl fmt::Debug for Transformer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.handlers.keys().collect();
        tags.sort();
        f.debug_struct("Transformer")
            .field("options", &self.options)
            .field("handlers", &tags)
            .field("ids", &self.ids.len())
            .field("skip_nodes", &self.skip_nodes.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Transformer<'a> {
    pub fn new(input: &'a XmlTree, options: TransformOptions) -> Self {
        Transformer {
            input,
            output: XmlTree::new(),
            options,
            ids: HashMap::new(),
            index: HashMap::new(),
            skip_nodes: HashSet::new(),
            handlers: HashMap::new(),
            on_text: None,
            on_comment: None,
            on_pi: None,
            on_index: None,
            on_preprocess: None,
            on_postprocess: None,
        }
    }

    // === Registration ===

    /// Handle elements with the given local name
    pub fn on_tag<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&mut Transformer<'a>, NodeId) -> Result<Output> + 'a,
    {
        self.handlers.insert(name.to_string(), Rc::new(handler));
        self
    }

    pub fn on_text<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Transformer<'a>, &TextRun) -> Result<Output> + 'a,
    {
        self.on_text = Some(Rc::new(handler));
        self
    }

    pub fn on_comment<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Transformer<'a>, NodeId) -> Result<Output> + 'a,
    {
        self.on_comment = Some(Rc::new(handler));
        self
    }

    pub fn on_pi<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Transformer<'a>, NodeId) -> Result<Output> + 'a,
    {
        self.on_pi = Some(Rc::new(handler));
        self
    }

    /// Extra indexing, called for every input element after the id index
    pub fn on_index<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Transformer<'a>, NodeId) + 'a,
    {
        self.on_index = Some(Rc::new(handler));
        self
    }

    pub fn on_preprocess<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Transformer<'a>) -> Result<()> + 'a,
    {
        self.on_preprocess = Some(Rc::new(handler));
        self
    }

    pub fn on_postprocess<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Transformer<'a>, Output) -> Result<Output> + 'a,
    {
        self.on_postprocess = Some(Rc::new(handler));
        self
    }

    // === Accessors ===

    #[inline]
    pub fn input(&self) -> &'a XmlTree {
        self.input
    }

    #[inline]
    pub fn output(&self) -> &XmlTree {
        &self.output
    }

    /// The tree results are built in; create new nodes here
    #[inline]
    pub fn output_mut(&mut self) -> &mut XmlTree {
        &mut self.output
    }

    #[inline]
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Leave `node` out when transforming its parent's children
    pub fn skip_node(&mut self, node: impl Into<Node>) {
        self.skip_nodes.insert(node.into());
    }

    // === Indexes ===

    /// Input element carrying the given `xml:id` (prefixed or Clark form)
    pub fn element_by_id(&self, id: &str) -> Result<NodeId> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| AddressingError::UnknownId(id.to_string()).into())
    }

    pub fn add_to_index(&mut self, key: impl Into<String>, el: NodeId) {
        self.index.entry(key.into()).or_default().push(el);
    }

    /// Elements stored under `key`, in insertion order
    pub fn lookup(&self, key: &str) -> &[NodeId] {
        self.index.get(key).map_or(&[], Vec::as_slice)
    }

    fn add_to_id_index(&mut self, el: NodeId) {
        let input = self.input;
        let id = input
            .attribute(el, XML_ID)
            .or_else(|| input.attribute(el, XML_ID_CLARK));
        if let Some(id) = id {
            self.ids.insert(id.to_string(), el);
        }
    }

    fn build_indexes(&mut self) {
        let input = self.input;
        let Some(root) = input.root() else {
            return;
        };
        let hook = self.on_index.clone();
        for el in std::iter::once(root).chain(input.descendants(root)) {
            if !input.is_element(el) {
                continue;
            }
            self.add_to_id_index(el);
            if let Some(hook) = &hook {
                hook(self, el);
            }
        }
        trace!(ids = self.ids.len(), "indexed input");
    }

    // === Driver ===

    /// Run preprocessing, indexing, the transformation and postprocessing
    ///
    /// A single root element comes back as a document, with the input's
    /// front nodes in front of it. Anything else is serialized to markup.
    ///
    /// Dispatch recurses once per element level of the input, through the
    /// handlers. Inputs nested thousands of levels deep can exhaust the
    /// thread's stack; run those on a thread with a larger stack.
    pub fn transform(&mut self) -> Result<Transformed> {
        let input = self.input;
        let root = input.root().ok_or(Error::NoRootElement)?;
        debug!(root = input.tag(root), options = ?self.options, "transform");

        if let Some(hook) = self.on_preprocess.clone() {
            hook(self)?;
        }
        self.build_indexes();
        let mut result = self.transform_node(&Node::Tree(root))?;
        if let Some(hook) = self.on_postprocess.clone() {
            result = hook(self, result)?;
        }
        let front = self.copy_front_nodes();
        Ok(self.materialize(result, front))
    }

    fn copy_front_nodes(&mut self) -> Vec<NodeId> {
        let input = self.input;
        let (skip_comments, skip_pis) = (self.options.skip_comments, self.options.skip_pis);
        let kept: Vec<NodeId> = input
            .front_nodes()
            .iter()
            .copied()
            .filter(|&id| match input.kind(id) {
                NodeKind::Comment => !skip_comments,
                NodeKind::ProcessingInstruction => !skip_pis,
                NodeKind::Element => false,
            })
            .collect();
        kept.into_iter()
            .map(|id| self.output.import(input, id))
            .collect()
    }

    fn materialize(&mut self, result: Output, front: Vec<NodeId>) -> Transformed {
        let mut output = std::mem::take(&mut self.output);
        match result {
            Output::Node(id) if output.is_element(id) => {
                output.set_root(id);
                for node in front {
                    output.push_front_node(node);
                }
                Transformed::Document(output)
            }
            Output::Empty => {
                for node in front {
                    output.push_front_node(node);
                }
                Transformed::Document(output)
            }
            other => {
                let items = Output::List(front.into_iter().map(Output::Node).chain([other]).collect());
                let mut markup = String::new();
                for item in items.flatten() {
                    match item {
                        Output::Text(text) => markup.push_str(&text),
                        Output::Node(id) => markup.push_str(&output.to_markup_with_tail(id)),
                        Output::Empty | Output::List(_) => {}
                    }
                }
                Transformed::Markup(markup)
            }
        }
    }

    // === Dispatch ===

    /// Transform one unit of the input; default element handling recurses
    /// into the children
    pub fn transform_node(&mut self, node: &Node) -> Result<Output> {
        match node {
            Node::Text(run) => match self.on_text.clone() {
                Some(hook) => hook(self, run),
                None => Ok(Self::default_text(run)),
            },
            Node::Tree(id) => {
                let id = *id;
                match self.input.kind(id) {
                    NodeKind::Element => self.transform_element(id),
                    NodeKind::Comment if self.options.skip_comments => Ok(Output::Empty),
                    NodeKind::Comment => match self.on_comment.clone() {
                        Some(hook) => hook(self, id),
                        None => Ok(self.copy_node(id)),
                    },
                    NodeKind::ProcessingInstruction if self.options.skip_pis => Ok(Output::Empty),
                    NodeKind::ProcessingInstruction => match self.on_pi.clone() {
                        Some(hook) => hook(self, id),
                        None => Ok(self.copy_node(id)),
                    },
                }
            }
        }
    }

    /// Registered handler for the element's local name, or the default
    pub fn transform_element(&mut self, el: NodeId) -> Result<Output> {
        let input = self.input;
        let name = local_name(input.tag(el));
        match self.handlers.get(name).cloned() {
            Some(handler) => {
                trace!(tag = name, "handler");
                handler(self, el)
            }
            None => self.default_element(el),
        }
    }

    /// Copy of the element with its attributes and transformed children
    pub fn default_element(&mut self, el: NodeId) -> Result<Output> {
        let target = self.create_target_element(el);
        self.copy_attributes(el, target);
        let children = self.transform_children(el)?;
        self.append_to(target, children);
        Ok(Output::Node(target))
    }

    /// Transformed children of `el`, text runs included, skip set honored
    pub fn transform_children(&mut self, el: NodeId) -> Result<Output> {
        let input = self.input;
        let mut results = Vec::new();
        for unit in all_child_nodes(input, el) {
            if self.skip_nodes.contains(&unit) {
                continue;
            }
            match self.transform_node(&unit)? {
                Output::Empty => {}
                Output::List(items) => results.extend(items),
                item => results.push(item),
            }
        }
        Ok(Output::List(results))
    }

    /// Fresh output element named after `el`
    pub fn create_target_element(&mut self, el: NodeId) -> NodeId {
        let tag = self.input.tag(el);
        if self.options.strip_namespaces {
            self.output.create_element(local_name(tag))
        } else {
            self.output.create_element(tag)
        }
    }

    /// Copy the attributes of input element `el` onto output element `target`
    pub fn copy_attributes(&mut self, el: NodeId, target: NodeId) {
        let strip = self.options.strip_namespaces;
        for (name, value) in self.input.attributes(el) {
            if strip && is_namespace_declaration(name) {
                continue;
            }
            self.output.set_attribute(target, name, value);
        }
    }

    /// Append results to an output element
    ///
    /// Texts go to the leading text of `target` while it has no children,
    /// and to the trailing text of its last child afterwards.
    pub fn append_to(&mut self, target: NodeId, stuff: Output) {
        for item in stuff.flatten() {
            match item {
                Output::Text(text) => match self.output.last_child(target) {
                    Some(last) => self.output.append_tail(last, &text),
                    None => self.output.append_text(target, &text),
                },
                Output::Node(id) => self.output.append_child(target, id),
                Output::Empty | Output::List(_) => {}
            }
        }
    }

    fn default_text(run: &TextRun) -> Output {
        if run.is_absent() {
            Output::Empty
        } else {
            Output::Text(run.text().to_string())
        }
    }

    fn copy_node(&mut self, id: NodeId) -> Output {
        Output::Node(self.output.import(self.input, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(src: &str, options: TransformOptions) -> String {
        let input = XmlTree::parse(src).unwrap();
        let mut transformer = Transformer::new(&input, options);
        transformer.transform().unwrap().to_string()
    }

    #[test]
    fn test_identity_transform() {
        let src = "<!--head--><?pi x?><a k=\"v\">1<b>2</b>3<!--c-->4<?p d?>5</a>";
        assert_eq!(run(src, TransformOptions::default()), src);
    }

    #[test]
    fn test_suppression_toggles() {
        let src = "<!--head--><?pi x?><a>1<!--c-->2<?p d?>3</a>";
        let options = TransformOptions {
            skip_comments: true,
            ..Default::default()
        };
        assert_eq!(run(src, options), "<?pi x?><a>12<?p d?>3</a>");
        let options = TransformOptions {
            skip_pis: true,
            ..Default::default()
        };
        assert_eq!(run(src, options), "<!--head--><a>1<!--c-->23</a>");
    }

    #[test]
    fn test_strip_namespaces() {
        let src = "<t:a xmlns:t=\"urn:t\" t:k=\"v\"><t:b/></t:a>";
        let options = TransformOptions {
            strip_namespaces: true,
            ..Default::default()
        };
        assert_eq!(run(src, options), "<a t:k=\"v\"><b/></a>");
    }

    #[test]
    fn test_tag_handler_and_text_merge() {
        let input = XmlTree::parse("<doc>x<hi>bold</hi>y<del>gone</del>z</doc>").unwrap();
        let mut transformer = Transformer::new(&input, TransformOptions::default())
            .on_tag("hi", |t, el| {
                let b = t.output_mut().create_element("b");
                let children = t.transform_children(el)?;
                t.append_to(b, children);
                Ok(Output::Node(b))
            })
            .on_tag("del", |_, _| Ok(Output::Empty));
        let result = transformer.transform().unwrap();
        assert_eq!(result.to_string(), "<doc>x<b>bold</b>yz</doc>");
    }

    #[test]
    fn test_handler_returning_text_merges_into_runs() {
        let input = XmlTree::parse("<doc>a<br/>b</doc>").unwrap();
        let mut transformer = Transformer::new(&input, TransformOptions::default())
            .on_tag("br", |_, _| Ok(Output::List(vec!["[".into(), "]".into()])));
        let result = transformer.transform().unwrap();
        let tree = result.document().unwrap();
        let root = tree.root().unwrap();
        assert_eq!(tree.text(root), Some("a[]b"));
        assert!(!tree.has_children(root));
    }

    #[test]
    fn test_handlers_use_local_names() {
        let input = XmlTree::parse("<tei:p xmlns:tei=\"urn:tei\">x</tei:p>").unwrap();
        let mut transformer = Transformer::new(&input, TransformOptions::default())
            .on_tag("p", |t, el| {
                let para = t.output_mut().create_element("para");
                let children = t.transform_children(el)?;
                t.append_to(para, children);
                Ok(para.into())
            });
        assert_eq!(transformer.transform().unwrap().to_string(), "<para>x</para>");
    }

    #[test]
    fn test_list_result_becomes_markup() {
        let input = XmlTree::parse("<!--c--><doc><a>1</a>t<b/></doc>").unwrap();
        let mut transformer = Transformer::new(&input, TransformOptions::default())
            .on_tag("doc", |t, el| t.transform_children(el));
        match transformer.transform().unwrap() {
            Transformed::Markup(markup) => assert_eq!(markup, "<!--c--><a>1</a>t<b/>"),
            Transformed::Document(_) => panic!("expected markup"),
        }
    }

    #[test]
    fn test_id_index_and_custom_index() {
        let input =
            XmlTree::parse("<doc><p xml:id=\"p1\"/><note target=\"p1\"/><note target=\"p1\"/></doc>")
                .unwrap();
        let mut transformer = Transformer::new(&input, TransformOptions::default())
            .on_index(|t, el| {
                if let Some(target) = t.input().attribute(el, "target") {
                    t.add_to_index(target.to_string(), el);
                }
            })
            .on_tag("p", |t, el| {
                let count = t.lookup("p1").len();
                let p = t.default_element(el)?;
                Ok(Output::List(vec![p, format!("({count})").into()]))
            })
            .on_tag("note", |_, _| Ok(Output::Empty));
        let result = transformer.transform().unwrap();
        assert_eq!(result.to_string(), "<doc><p xml:id=\"p1\"/>(2)</doc>");

        let p = transformer.element_by_id("p1").unwrap();
        assert_eq!(input.tag(p), "p");
        let err = transformer.element_by_id("nope").unwrap_err();
        assert!(matches!(err, Error::Addressing(AddressingError::UnknownId(_))));
    }

    #[test]
    fn test_nested_chain_round_trips() {
        let src = format!("{}x{}", "<d>".repeat(200), "</d>".repeat(200));
        assert_eq!(run(&src, TransformOptions::default()), src);
    }

    #[test]
    fn test_clark_form_id_is_indexed() {
        let mut input = XmlTree::with_root("doc");
        let root = input.root().unwrap();
        let p = input.create_element_with("p", [(XML_ID_CLARK, "p9")]);
        input.append_child(root, p);
        let mut transformer = Transformer::new(&input, TransformOptions::default());
        transformer.transform().unwrap();
        assert_eq!(transformer.element_by_id("p9").unwrap(), p);
    }

    #[test]
    fn test_skip_nodes() {
        let input = XmlTree::parse("<doc>keep<a/>drop<b/></doc>").unwrap();
        let a = input.first_child(input.root().unwrap()).unwrap();
        let mut transformer = Transformer::new(&input, TransformOptions::default())
            .on_preprocess(move |t| {
                let tail = TextRun::trailing(t.input(), a).unwrap();
                t.skip_node(tail);
                t.skip_node(a);
                Ok(())
            });
        assert_eq!(transformer.transform().unwrap().to_string(), "<doc>keep<b/></doc>");
    }

    #[test]
    fn test_postprocess_sees_result() {
        let input = XmlTree::parse("<doc/>").unwrap();
        let mut transformer = Transformer::new(&input, TransformOptions::default())
            .on_postprocess(|t, result| {
                if let Output::Node(root) = &result {
                    t.output_mut().set_attribute(*root, "done", "yes");
                }
                Ok(result)
            });
        assert_eq!(transformer.transform().unwrap().to_string(), "<doc done=\"yes\"/>");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: TransformOptions = serde_json::from_str(r#"{"skip_pis": true}"#).unwrap();
        assert_eq!(
            options,
            TransformOptions {
                skip_pis: true,
                ..Default::default()
            }
        );
    }
}
