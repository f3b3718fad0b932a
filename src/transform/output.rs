//! Transformation results

use crate::dom::{NodeId, XmlTree};
use std::fmt;

/// What a transformation hook produces
///
/// `Node` ids refer to nodes of the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Output {
    /// Contributes nothing
    #[default]
    Empty,
    Text(String),
    Node(NodeId),
    /// Any mix of the above, nested as deep as the hooks like
    List(Vec<Output>),
}

impl Output {
    pub fn is_empty(&self) -> bool {
        matches!(self, Output::Empty)
    }

    /// Flat sequence of nodes and texts, adjacent texts merged
    ///
    /// `Empty` items and empty strings disappear.
    pub fn flatten(self) -> Vec<Output> {
        let mut flat: Vec<Output> = Vec::new();
        let mut stack = vec![self];
        while let Some(item) = stack.pop() {
            match item {
                Output::Empty => {}
                Output::List(items) => stack.extend(items.into_iter().rev()),
                Output::Text(text) if text.is_empty() => {}
                Output::Text(text) => match flat.last_mut() {
                    Some(Output::Text(prev)) => prev.push_str(&text),
                    _ => flat.push(Output::Text(text)),
                },
                node @ Output::Node(_) => flat.push(node),
            }
        }
        flat
    }
}

impl From<String> for Output {
    fn from(text: String) -> Self {
        Output::Text(text)
    }
}

impl From<&str> for Output {
    fn from(text: &str) -> Self {
        Output::Text(text.to_string())
    }
}

impl From<NodeId> for Output {
    fn from(id: NodeId) -> Self {
        Output::Node(id)
    }
}

impl From<Vec<Output>> for Output {
    fn from(items: Vec<Output>) -> Self {
        Output::List(items)
    }
}

impl<T: Into<Output>> From<Option<T>> for Output {
    fn from(value: Option<T>) -> Self {
        value.map_or(Output::Empty, Into::into)
    }
}

/// Final result of a transformation
#[derive(Debug, Clone)]
pub enum Transformed {
    /// The result had a single root element
    Document(XmlTree),
    /// The result was a sequence; items serialized and concatenated
    Markup(String),
}

impl Transformed {
    pub fn document(&self) -> Option<&XmlTree> {
        match self {
            Transformed::Document(tree) => Some(tree),
            Transformed::Markup(_) => None,
        }
    }

    pub fn into_document(self) -> Option<XmlTree> {
        match self {
            Transformed::Document(tree) => Some(tree),
            Transformed::Markup(_) => None,
        }
    }
}

impl fmt::Display for Transformed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformed::Document(tree) => write!(f, "{tree}"),
            Transformed::Markup(markup) => f.write_str(markup),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flatten_merges_adjacent_text() {
        let nested = Output::List(vec![
            "a".into(),
            Output::List(vec![Output::Empty, "b".into(), Output::List(vec!["c".into()])]),
            Output::Node(7),
            Output::Text(String::new()),
            "d".into(),
            Output::List(vec![]),
            "e".into(),
        ]);
        assert_eq!(
            nested.flatten(),
            vec![Output::Text("abc".into()), Output::Node(7), Output::Text("de".into())]
        );
    }

    #[test]
    fn test_flatten_deep_nesting() {
        let mut deep = Output::Text("x".into());
        for _ in 0..10_000 {
            deep = Output::List(vec![deep]);
        }
        assert_eq!(deep.flatten(), vec![Output::Text("x".into())]);
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Output::from(None::<String>), Output::Empty);
        assert_eq!(Output::from(Some("t")), Output::Text("t".into()));
    }
}
