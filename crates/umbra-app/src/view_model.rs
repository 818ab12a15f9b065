use serde::Serialize;
use umbra_core::{GraphNode, GraphSnapshot, NodeId, NodeKind};
use umbra_graph::{
    LayoutConfig, LayoutResult, PathTreeNode, build_tree, classify, dependency_names, layout_with,
};

/// Everything derived from one snapshot. Built off-lock and swapped in whole.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ViewModel {
    pub generation: u64,
    pub snapshot: GraphSnapshot,
    pub nodes: Vec<GraphNode>,
    pub layout: LayoutResult,
    pub tree: Vec<PathTreeNode>,
    pub dependencies: Vec<String>,
}

impl ViewModel {
    pub fn build(generation: u64, snapshot: GraphSnapshot, config: &LayoutConfig) -> Self {
        let nodes = classify(snapshot.nodes.iter().cloned());
        let layout = layout_with(config, &nodes, &snapshot.edges);

        // Members live inside their file in the graph; the explorer only lists files.
        let tree = build_tree(
            nodes
                .iter()
                .filter(|n| n.kind == NodeKind::File)
                .map(|n| n.id.as_str()),
        );
        let dependencies = dependency_names(
            snapshot.identifiers().chain(
                snapshot
                    .edges
                    .iter()
                    .flat_map(|e| [e.source.as_str(), e.target.as_str()]),
            ),
        );

        tracing::info!(
            "Built view {}: {} nodes, {} edges, {} tree roots, {} dependencies",
            generation,
            nodes.len(),
            snapshot.edges.len(),
            tree.len(),
            dependencies.len()
        );

        Self {
            generation,
            snapshot,
            nodes,
            layout,
            tree,
            dependencies,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    /// Path of the file that holds `id`: the node itself for files, its parent
    /// for members. Unknown members fall back to the path part of the id.
    pub fn owning_file(&self, id: &NodeId) -> String {
        match self.node(id) {
            Some(node) if node.kind == NodeKind::File => node.id.to_string(),
            Some(GraphNode {
                parent: Some(parent),
                ..
            }) => parent.to_string(),
            _ => umbra_core::naming::file_part(id.as_str()).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::{GraphEdge, RawNode};

    fn snapshot() -> GraphSnapshot {
        GraphSnapshot {
            nodes: vec![
                RawNode::file("src/main.py"),
                RawNode::member("src/main.py", "run"),
                RawNode::file("module:os"),
            ],
            edges: vec![
                GraphEdge::new("src/main.py::run", "module:os"),
                GraphEdge::new("src/main.py::run", "module:sys"),
            ],
        }
    }

    #[test]
    fn test_tree_lists_files_only() {
        let view = ViewModel::build(1, snapshot(), &LayoutConfig::default());
        assert_eq!(view.tree.len(), 1);
        assert_eq!(view.tree[0].name, "src");
        assert_eq!(view.tree[0].children().len(), 1);
        assert_eq!(view.tree[0].children()[0].path, "src/main.py");
    }

    #[test]
    fn test_dependencies_include_edge_endpoints() {
        let view = ViewModel::build(1, snapshot(), &LayoutConfig::default());
        assert_eq!(view.dependencies, vec!["os".to_string(), "sys".to_string()]);
    }

    #[test]
    fn test_owning_file() {
        let view = ViewModel::build(1, snapshot(), &LayoutConfig::default());
        assert_eq!(view.owning_file(&NodeId::from("src/main.py::run")), "src/main.py");
        assert_eq!(view.owning_file(&NodeId::from("src/main.py")), "src/main.py");
        assert_eq!(view.owning_file(&NodeId::from("other.py::gone")), "other.py");
    }
}
