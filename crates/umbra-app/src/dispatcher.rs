//! Routes clicks and hovers from the graph, the explorer and the dependency
//! list onto the event bus.

use crate::view_model::ViewModel;
use std::collections::HashSet;
use umbra_core::naming::dependency_name;
use umbra_core::{GraphEdge, NodeId};
use umbra_events::{ActivationOrigin, Event, EventBus};
use umbra_graph::{HighlightOverlay, HighlightState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationTarget {
    GraphNode(NodeId),
    TreeFolder(String),
    TreeFile(String),
    /// Entry of the dependency list, prefix already stripped.
    Dependency(String),
}

pub struct Dispatcher {
    bus: EventBus,
    expanded: HashSet<String>,
    selection: Option<String>,
    overlay: HighlightOverlay,
}

impl Dispatcher {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            expanded: HashSet::new(),
            selection: None,
            overlay: HighlightOverlay::default(),
        }
    }

    /// A new snapshot resets hover state. Expanded folders are kept so the
    /// explorer doesn't collapse on every refresh.
    pub fn reset(&mut self, edges: Vec<GraphEdge>) {
        self.overlay = HighlightOverlay::new(edges);
    }

    pub fn expanded(&self) -> &HashSet<String> {
        &self.expanded
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    pub fn overlay(&self) -> &HighlightOverlay {
        &self.overlay
    }

    pub fn highlight(&self) -> &HighlightState {
        self.overlay.state()
    }

    pub fn on_activate(&mut self, target: ActivationTarget, view: &ViewModel) {
        match target {
            ActivationTarget::GraphNode(id) => {
                self.bus.publish(Event::ActivateNode {
                    id: id.clone(),
                    origin: ActivationOrigin::Graph,
                });
                if let Some(name) = dependency_name(id.as_str()) {
                    self.open_module(name);
                } else {
                    let path = view.owning_file(&id);
                    self.open_file(path, Some(id));
                }
            }
            ActivationTarget::TreeFolder(path) => {
                let expanded = if self.expanded.remove(&path) {
                    false
                } else {
                    self.expanded.insert(path.clone());
                    true
                };
                self.bus
                    .publish(Event::TreeFolderToggled { path, expanded });
            }
            ActivationTarget::TreeFile(path) => {
                self.bus.publish(Event::ActivateNode {
                    id: NodeId::new(path.as_str()),
                    origin: ActivationOrigin::FileTree,
                });
                match dependency_name(&path) {
                    Some(name) => self.open_module(name),
                    None => self.open_file(path, None),
                }
            }
            ActivationTarget::Dependency(name) => {
                self.bus.publish(Event::ActivateNode {
                    id: NodeId::new(format!("{}{}", umbra_core::DEPENDENCY_PREFIX, name)),
                    origin: ActivationOrigin::Dependencies,
                });
                self.open_module(&name);
            }
        }
    }

    fn open_file(&mut self, path: String, focus: Option<NodeId>) {
        self.selection = Some(path.clone());
        self.bus.publish(Event::OpenFile { path, focus });
    }

    fn open_module(&mut self, name: &str) {
        self.selection = Some(format!("{}{}", umbra_core::DEPENDENCY_PREFIX, name));
        self.bus.publish(Event::OpenModule {
            name: name.to_string(),
        });
    }

    pub fn on_enter(&mut self, id: NodeId) {
        self.overlay.on_enter(id.clone());
        self.bus.publish(Event::NodeHoverEnter { id });
    }

    pub fn on_leave(&mut self) {
        self.overlay.on_leave();
        self.bus.publish(Event::NodeHoverLeave);
    }
}
