//! Hover highlighting.
//!
//! Highlighting is a restyle of the edge list and nothing else: positions are
//! never touched, so hovering can't trigger a layout.

use crate::style::EdgeStyle;
use serde::{Deserialize, Serialize};
use umbra_core::{GraphEdge, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HighlightState {
    #[default]
    Neutral,
    Focused(NodeId),
}

impl HighlightState {
    pub fn focus(&self) -> Option<&NodeId> {
        match self {
            HighlightState::Neutral => None,
            HighlightState::Focused(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverEvent {
    Enter(NodeId),
    Leave,
}

/// `Enter` always focuses the entered node and `Leave` always clears, whatever
/// the current state is.
pub fn reduce(_state: &HighlightState, event: HoverEvent) -> HighlightState {
    match event {
        HoverEvent::Enter(id) => HighlightState::Focused(id),
        HoverEvent::Leave => HighlightState::Neutral,
    }
}

pub fn edge_styles(edges: &[GraphEdge], state: &HighlightState) -> Vec<EdgeStyle> {
    edges
        .iter()
        .map(|edge| match state.focus() {
            Some(id) if edge.touches(id) => EdgeStyle::highlighted(),
            _ => EdgeStyle::neutral(),
        })
        .collect()
}

/// Indices of the edges `edge_styles` would promote.
pub fn promoted_edges(edges: &[GraphEdge], state: &HighlightState) -> Vec<usize> {
    let Some(id) = state.focus() else {
        return Vec::new();
    };
    edges
        .iter()
        .enumerate()
        .filter(|(_, edge)| edge.touches(id))
        .map(|(i, _)| i)
        .collect()
}

/// Highlight state plus the derived style of every edge.
#[derive(Debug, Clone, Default)]
pub struct HighlightOverlay {
    edges: Vec<GraphEdge>,
    state: HighlightState,
    styles: Vec<EdgeStyle>,
}

impl HighlightOverlay {
    pub fn new(edges: Vec<GraphEdge>) -> Self {
        let state = HighlightState::Neutral;
        let styles = edge_styles(&edges, &state);
        Self {
            edges,
            state,
            styles,
        }
    }

    pub fn state(&self) -> &HighlightState {
        &self.state
    }

    pub fn styles(&self) -> &[EdgeStyle] {
        &self.styles
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn on_enter(&mut self, id: NodeId) {
        self.apply(HoverEvent::Enter(id));
    }

    pub fn on_leave(&mut self) {
        self.apply(HoverEvent::Leave);
    }

    pub fn apply(&mut self, event: HoverEvent) {
        self.state = reduce(&self.state, event);
        self.styles = edge_styles(&self.edges, &self.state);
        tracing::trace!(
            "Highlight state {:?}: {} promoted edges",
            self.state,
            self.styles.iter().filter(|s| s.is_highlighted()).count()
        );
    }

    pub fn is_promoted(&self, edge_index: usize) -> bool {
        self.styles
            .get(edge_index)
            .is_some_and(EdgeStyle::is_highlighted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges() -> Vec<GraphEdge> {
        vec![
            GraphEdge::new("a.py::f", "b.py::g"),
            GraphEdge::new("b.py::g", "c.py::h"),
            GraphEdge::new("c.py::h", "a.py::f"),
            GraphEdge::new("c.py::h", "c.py::h"),
        ]
    }

    #[test]
    fn test_reduce_ignores_current_state() {
        let focused = HighlightState::Focused(NodeId::from("x"));
        assert_eq!(
            reduce(&focused, HoverEvent::Enter(NodeId::from("y"))),
            HighlightState::Focused(NodeId::from("y"))
        );
        assert_eq!(reduce(&focused, HoverEvent::Leave), HighlightState::Neutral);
        assert_eq!(
            reduce(&HighlightState::Neutral, HoverEvent::Leave),
            HighlightState::Neutral
        );
    }

    #[test]
    fn test_incoming_and_outgoing_edges_are_promoted() {
        let state = HighlightState::Focused(NodeId::from("a.py::f"));
        let styles = edge_styles(&edges(), &state);
        let promoted: Vec<bool> = styles.iter().map(EdgeStyle::is_highlighted).collect();
        assert_eq!(promoted, vec![true, false, true, false]);
        assert_eq!(promoted_edges(&edges(), &state), vec![0, 2]);
    }

    #[test]
    fn test_self_loop_is_promoted_once() {
        let state = HighlightState::Focused(NodeId::from("c.py::h"));
        assert_eq!(promoted_edges(&edges(), &state), vec![1, 2, 3]);
    }

    #[test]
    fn test_enter_then_leave_restores_neutral_styles() {
        let mut overlay = HighlightOverlay::new(edges());
        let before = overlay.styles().to_vec();

        overlay.on_enter(NodeId::from("b.py::g"));
        assert!(overlay.is_promoted(0));
        assert!(overlay.is_promoted(1));
        assert!(!overlay.is_promoted(2));

        overlay.on_leave();
        assert_eq!(overlay.styles(), before.as_slice());
        assert_eq!(overlay.state(), &HighlightState::Neutral);
        assert!(!overlay.is_promoted(99));
    }

    #[test]
    fn test_unknown_node_promotes_nothing() {
        let mut overlay = HighlightOverlay::new(edges());
        overlay.on_enter(NodeId::from("nowhere"));
        assert!(overlay.styles().iter().all(|s| !s.is_highlighted()));
    }
}
