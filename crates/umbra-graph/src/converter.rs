//! Turns a [`LayoutResult`] into absolute rectangles for renderers that do not
//! support nested coordinate spaces.

use crate::graph::{Rect, Vec2};
use crate::layout::{CoordinateSpace, LayoutResult};
use crate::style::NodeStyle;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use umbra_core::{NodeId, NodeKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalBox {
    pub id: NodeId,
    pub kind: NodeKind,
    pub rect: Rect,
    pub z_index: i32,
    pub style: NodeStyle,
}

/// Resolves every node to global coordinates, in layout order.
///
/// A parent-local node whose container is absent from the result is left at
/// its local position.
pub fn resolve_global(result: &LayoutResult) -> Vec<GlobalBox> {
    let origins: HashMap<&NodeId, Vec2> = result
        .nodes
        .iter()
        .filter(|p| p.space == CoordinateSpace::Global)
        .map(|p| (&p.node.id, p.position))
        .collect();

    result
        .nodes
        .iter()
        .map(|p| {
            let origin = match &p.space {
                CoordinateSpace::Global => Vec2::ZERO,
                CoordinateSpace::ParentLocal(parent) => {
                    origins.get(parent).copied().unwrap_or_else(|| {
                        tracing::warn!("Container {} of {} was not laid out", parent, p.node.id);
                        Vec2::ZERO
                    })
                }
            };
            GlobalBox {
                id: p.node.id.clone(),
                kind: p.node.kind,
                rect: Rect::from_pos_size(origin + p.position, p.size),
                z_index: p.z_index,
                style: p.style,
            }
        })
        .collect()
}

/// Topmost box under `point`, if any.
pub fn hit_test(boxes: &[GlobalBox], point: Vec2) -> Option<&GlobalBox> {
    boxes
        .iter()
        .filter(|b| {
            point.x >= b.rect.min.x
                && point.x < b.rect.max.x
                && point.y >= b.rect.min.y
                && point.y < b.rect.max.y
        })
        .max_by_key(|b| b.z_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::layout::layout;
    use umbra_core::RawNode;

    #[test]
    fn test_members_are_offset_by_their_file() {
        let nodes = classify(vec![
            RawNode::file("a.py"),
            RawNode::member("a.py", "f"),
            RawNode::member("a.py", "g"),
        ]);
        let result = layout(&nodes, &[]);
        let boxes = resolve_global(&result);

        let file = boxes.iter().find(|b| b.id.as_str() == "a.py").unwrap();
        let g = boxes.iter().find(|b| b.id.as_str() == "a.py::g").unwrap();
        assert_eq!(g.rect.min, file.rect.min + Vec2::new(24.0, 165.0));
        assert_eq!(g.kind, NodeKind::Function);
    }

    #[test]
    fn test_hit_test_prefers_members_over_files() {
        let nodes = classify(vec![RawNode::file("a.py"), RawNode::member("a.py", "f")]);
        let boxes = resolve_global(&layout(&nodes, &[]));
        let member = boxes.iter().find(|b| b.id.as_str() == "a.py::f").unwrap();

        let hit = hit_test(&boxes, member.rect.center()).unwrap();
        assert_eq!(hit.id.as_str(), "a.py::f");

        let padding = hit_test(&boxes, Vec2::new(2.0, 2.0)).unwrap();
        assert_eq!(padding.id.as_str(), "a.py");

        assert!(hit_test(&boxes, Vec2::new(-5.0, -5.0)).is_none());
    }
}
