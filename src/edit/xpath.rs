//! Positional paths

use crate::dom::{NodeKind, XmlTree};
use crate::error::{Result, StructuralError};
use crate::nav::{all_child_nodes, Node};

fn same_kind(tree: &XmlTree, a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Text(x), Node::Text(_)) => !x.is_absent(),
        (Node::Tree(x), Node::Tree(y)) => {
            let kind = tree.kind(*x);
            kind == tree.kind(*y) && (kind != NodeKind::Element || tree.tag(*x) == tree.tag(*y))
        }
        _ => false,
    }
}

/// 1-based position of `node` among its parent's units of the same kind
///
/// Elements count same-tag siblings, text runs count the present runs.
/// Nodes without a parent are at position 1.
pub fn get_xpath_index(tree: &XmlTree, node: &Node) -> Result<usize> {
    if matches!(node, Node::Text(run) if run.is_absent()) {
        return Err(StructuralError::EmptyTextRun.into());
    }
    let Some(parent) = node.parent(tree) else {
        return Ok(1);
    };
    let mut index = 1;
    for unit in all_child_nodes(tree, parent) {
        if &unit == node {
            return Ok(index);
        }
        if same_kind(tree, &unit, node) {
            index += 1;
        }
    }
    Err(StructuralError::StaleTextRun.into())
}

fn step_name(tree: &XmlTree, node: &Node) -> String {
    match node {
        Node::Text(_) => "text()".to_string(),
        Node::Tree(id) => match tree.kind(*id) {
            NodeKind::Element => tree.tag(*id).to_string(),
            NodeKind::Comment => "comment()".to_string(),
            NodeKind::ProcessingInstruction => "processing-instruction()".to_string(),
        },
    }
}

/// Absolute positional path from the root element down to `node`
pub fn get_xpath(tree: &XmlTree, node: &Node) -> Result<String> {
    let mut steps = Vec::new();
    let mut current = node.clone();
    while let Some(parent) = current.parent(tree) {
        let index = get_xpath_index(tree, &current)?;
        steps.push(format!("{}[{}]", step_name(tree, &current), index));
        current = Node::Tree(parent);
    }
    steps.push(format!("{}[1]", step_name(tree, &current)));
    steps.reverse();
    Ok(format!("/{}", steps.join("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::tests::find;
    use crate::nav::TextRun;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_element_paths() {
        let tree = XmlTree::parse("<r><p/><q/><p><i/><p/></p></r>").unwrap();
        let r = tree.root().unwrap();
        let second_p = tree.child(r, 2).unwrap();
        let inner = tree.child(second_p, 1).unwrap();
        assert_eq!(get_xpath(&tree, &Node::Tree(r)).unwrap(), "/r[1]");
        assert_eq!(get_xpath(&tree, &Node::Tree(second_p)).unwrap(), "/r[1]/p[2]");
        assert_eq!(
            get_xpath(&tree, &Node::Tree(inner)).unwrap(),
            "/r[1]/p[2]/p[1]"
        );
        assert_eq!(get_xpath_index(&tree, &Node::Tree(find(&tree, "q"))).unwrap(), 1);
    }

    #[test]
    fn test_text_run_paths() {
        let tree = XmlTree::parse("<r>a<b/><c/>d</r>").unwrap();
        let c = find(&tree, "c");
        let run = TextRun::trailing(&tree, c).unwrap();
        assert_eq!(get_xpath(&tree, &Node::Text(run)).unwrap(), "/r[1]/text()[2]");
    }

    #[test]
    fn test_comment_paths() {
        let tree = XmlTree::parse("<r><!--x--><a/><!--y--></r>").unwrap();
        let r = tree.root().unwrap();
        let second = tree.last_child(r).unwrap();
        assert_eq!(
            get_xpath(&tree, &Node::Tree(second)).unwrap(),
            "/r[1]/comment()[2]"
        );
    }

    #[test]
    fn test_absent_run_has_no_path() {
        let tree = XmlTree::parse("<r><b/></r>").unwrap();
        let b = find(&tree, "b");
        let run = TextRun::trailing(&tree, b).unwrap();
        let err = get_xpath_index(&tree, &Node::Text(run)).unwrap_err();
        assert_eq!(err.as_structural(), Some(&StructuralError::EmptyTextRun));
    }

    #[test]
    fn test_stale_run_is_reported() {
        let tree = XmlTree::parse("<r>now</r>").unwrap();
        let r = tree.root().unwrap();
        let stale = TextRun::new(Some("then".to_string()), r, None);
        let err = get_xpath_index(&tree, &Node::Text(stale)).unwrap_err();
        assert_eq!(err.as_structural(), Some(&StructuralError::StaleTextRun));
    }
}
