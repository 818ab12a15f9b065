//! Tags raw analyzer nodes as files, functions or classes.

use std::collections::HashMap;
use umbra_core::naming::has_class_marker;
use umbra_core::{GraphNode, NodeId, NodeKind, RawNode};

/// A node without a parent is a file; with a parent it is a class when the id
/// carries the class marker and a function otherwise.
pub fn classify_node(raw: &RawNode) -> NodeKind {
    if !has_parent(raw) {
        NodeKind::File
    } else if has_class_marker(raw.id.as_str()) {
        NodeKind::Class
    } else {
        NodeKind::Function
    }
}

pub fn classify<I>(raw: I) -> Vec<GraphNode>
where
    I: IntoIterator<Item = RawNode>,
{
    raw.into_iter()
        .map(|mut node| {
            let kind = classify_node(&node);
            if !has_parent(&node) {
                // An empty parent string counts as "no parent".
                node.parent = None;
            }
            GraphNode::from_raw(node, kind)
        })
        .collect()
}

fn has_parent(raw: &RawNode) -> bool {
    raw.parent.as_ref().is_some_and(|p| !p.as_str().is_empty())
}

/// Positions of member nodes keyed by their parent id, in input order.
#[derive(Debug, Default)]
pub struct ChildGroups {
    by_parent: HashMap<NodeId, Vec<usize>>,
}

impl ChildGroups {
    pub fn get(&self, parent: &NodeId) -> Option<&[usize]> {
        self.by_parent.get(parent).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.by_parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_parent.is_empty()
    }
}

pub fn group_children(nodes: &[GraphNode]) -> ChildGroups {
    let mut by_parent: HashMap<NodeId, Vec<usize>> = HashMap::new();
    for (i, node) in nodes.iter().enumerate() {
        if let Some(parent) = &node.parent {
            by_parent.entry(parent.clone()).or_default().push(i);
        }
    }
    ChildGroups { by_parent }
}
