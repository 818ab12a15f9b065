use umbra_core::{GraphEdge, GraphNode, RawNode};
use umbra_graph::classify;

/// A synthetic project of `file_count` files with `members_per_file` functions
/// each. Every function calls the first function of the next two files, and
/// the last file calls back into the first so the file graph has a cycle.
pub fn synthetic_graph(file_count: usize, members_per_file: usize) -> (Vec<GraphNode>, Vec<GraphEdge>) {
    let mut raw = Vec::with_capacity(file_count * (members_per_file + 1));
    let mut edges = Vec::new();

    for f in 0..file_count {
        let path = format!("pkg/mod_{}/file_{}.py", f % 16, f);
        raw.push(RawNode::file(&path));
        for m in 0..members_per_file {
            let name = if m == 0 {
                format!("Model_{f}::class")
            } else {
                format!("func_{m}")
            };
            let member = RawNode::member(&path, &name);
            for step in 1..=2 {
                let target = (f + step) % file_count;
                if target != f {
                    edges.push(GraphEdge::new(
                        member.id.clone(),
                        format!("pkg/mod_{}/file_{}.py::func_1", target % 16, target),
                    ));
                }
            }
            raw.push(member);
        }
    }

    (classify(raw), edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_graph_shape() {
        let (nodes, edges) = synthetic_graph(10, 4);
        assert_eq!(nodes.len(), 50);
        assert_eq!(edges.len(), 80);
    }
}
