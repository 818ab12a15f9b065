use crate::classifier::group_children;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Add, Index, Sub};
use umbra_core::{GraphEdge, GraphNode, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn half(self) -> Self {
        Self::new(self.x / 2.0, self.y / 2.0)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Axis-aligned rectangle, `min` inclusive and `max` exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min: Vec2::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Vec2::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// Classified nodes and edges of one snapshot, indexed for layout.
///
/// File nodes are the containers; every other node is attached to the file
/// named by its `parent`. Nodes whose parent is missing or is not a file end up
/// in `orphans` and are placed outside any container.
#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    node_map: HashMap<NodeId, NodeIndex>,
    files: Vec<NodeIndex>,
    children: HashMap<NodeIndex, Vec<NodeIndex>>,
    orphans: Vec<NodeIndex>,
}

impl GraphModel {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut seen = HashSet::with_capacity(nodes.len());
        let mut unique = Vec::with_capacity(nodes.len());
        for node in nodes {
            if seen.insert(node.id.clone()) {
                unique.push(node);
            } else {
                tracing::warn!("Dropping duplicate node id {}", node.id);
            }
        }

        let node_map: HashMap<NodeId, NodeIndex> = unique
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), NodeIndex(i)))
            .collect();

        let files: Vec<NodeIndex> = unique
            .iter()
            .enumerate()
            .filter(|(_, node)| node.kind.is_container())
            .map(|(i, _)| NodeIndex(i))
            .collect();

        let mut children: HashMap<NodeIndex, Vec<NodeIndex>> = HashMap::new();
        let mut attached = HashSet::new();
        let groups = group_children(&unique);
        for &file_idx in &files {
            if let Some(members) = groups.get(&unique[file_idx.0].id) {
                let members: Vec<NodeIndex> = members
                    .iter()
                    .copied()
                    .filter(|&i| !unique[i].kind.is_container())
                    .map(NodeIndex)
                    .collect();
                attached.extend(members.iter().copied());
                children.insert(file_idx, members);
            }
        }

        let orphans: Vec<NodeIndex> = unique
            .iter()
            .enumerate()
            .map(|(i, _)| NodeIndex(i))
            .filter(|idx| !unique[idx.0].kind.is_container() && !attached.contains(idx))
            .collect();
        for idx in &orphans {
            tracing::warn!(
                "Node {} has no resolvable parent file (parent: {:?})",
                unique[idx.0].id,
                unique[idx.0].parent
            );
        }

        Self {
            nodes: unique,
            edges,
            node_map,
            files,
            children,
            orphans,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        (0..self.nodes.len()).map(NodeIndex)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    pub fn get_node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index_of(id).map(|idx| &self.nodes[idx.0])
    }

    /// File nodes, in input order.
    pub fn files(&self) -> &[NodeIndex] {
        &self.files
    }

    pub fn children_of(&self, file: NodeIndex) -> &[NodeIndex] {
        self.children.get(&file).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn orphans(&self) -> &[NodeIndex] {
        &self.orphans
    }

    /// The file that contains `idx`: itself for files, the parent for members.
    pub fn owner_file(&self, idx: NodeIndex) -> Option<NodeIndex> {
        let node = &self.nodes[idx.0];
        if node.kind == NodeKind::File {
            return Some(idx);
        }
        let parent_idx = node.parent.as_ref().and_then(|p| self.index_of(p))?;
        if self.nodes[parent_idx.0].kind.is_container() {
            Some(parent_idx)
        } else {
            None
        }
    }

    /// Edges lifted to file level. Edges inside a single file and edges with an
    /// endpoint that has no owning file are left out.
    pub fn macro_edges(&self) -> Vec<(NodeIndex, NodeIndex)> {
        let mut result = Vec::new();
        for edge in &self.edges {
            let source = self.index_of(&edge.source).and_then(|i| self.owner_file(i));
            let target = self.index_of(&edge.target).and_then(|i| self.owner_file(i));
            match (source, target) {
                (Some(s), Some(t)) if s != t => result.push((s, t)),
                (Some(_), Some(_)) => {}
                _ => tracing::debug!(
                    "Edge {} -> {} has an unresolved endpoint; skipped for file placement",
                    edge.source,
                    edge.target
                ),
            }
        }
        result
    }
}

impl Index<NodeIndex> for GraphModel {
    type Output = GraphNode;
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use umbra_core::RawNode;

    fn model(raw: Vec<RawNode>, edges: Vec<GraphEdge>) -> GraphModel {
        GraphModel::new(classify(raw), edges)
    }

    #[test]
    fn test_graph_model_groups_members_under_files() {
        let m = model(
            vec![
                RawNode::file("a.py"),
                RawNode::member("a.py", "f"),
                RawNode::member("a.py", "g"),
                RawNode::file("b.py"),
            ],
            vec![],
        );

        assert_eq!(m.node_count(), 4);
        assert_eq!(m.files().len(), 2);
        let a = m.index_of(&NodeId::from("a.py")).unwrap();
        let names: Vec<&str> = m.children_of(a).iter().map(|&i| m[i].label.as_str()).collect();
        assert_eq!(names, vec!["f", "g"]);
        assert!(m.orphans().is_empty());
    }

    #[test]
    fn test_macro_edges_skip_same_file_and_unresolved() {
        let m = model(
            vec![
                RawNode::file("a.py"),
                RawNode::member("a.py", "f"),
                RawNode::member("a.py", "g"),
                RawNode::file("b.py"),
                RawNode::member("b.py", "h"),
            ],
            vec![
                GraphEdge::new("a.py::f", "a.py::g"),
                GraphEdge::new("a.py::f", "b.py::h"),
                GraphEdge::new("a.py", "b.py::h"),
                GraphEdge::new("a.py::f", "missing.py::x"),
            ],
        );

        let a = m.index_of(&NodeId::from("a.py")).unwrap();
        let b = m.index_of(&NodeId::from("b.py")).unwrap();
        assert_eq!(m.macro_edges(), vec![(a, b), (a, b)]);
        assert_eq!(m.edge_count(), 4);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut dup = RawNode::file("a.py");
        dup.label = "second".to_string();
        let m = model(vec![RawNode::file("a.py"), dup], vec![]);
        assert_eq!(m.node_count(), 1);
        assert_eq!(m[NodeIndex(0)].label, "a.py");
    }

    #[test]
    fn test_member_with_missing_parent_is_orphan() {
        let m = model(
            vec![RawNode::file("a.py"), RawNode::member("gone.py", "f")],
            vec![],
        );
        assert_eq!(m.orphans().len(), 1);
        assert_eq!(m.owner_file(m.orphans()[0]), None);
    }

    #[test]
    fn test_rect_intersection_is_half_open() {
        let a = Rect::from_pos_size(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Rect::from_pos_size(Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(!a.intersects(&b));
        assert!(a.union(&b).contains_rect(&b));
    }
}
