use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use umbra_core::NodeId;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivationOrigin {
    Graph,
    FileTree,
    Dependencies,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    // Activation
    ActivateNode {
        id: NodeId,
        origin: ActivationOrigin,
    },
    /// Ask the content collaborator to show a file. `focus` names the graph
    /// node that triggered the request, when there was one.
    OpenFile {
        path: String,
        focus: Option<NodeId>,
    },
    /// Third-party module; no content fetch happens for these.
    OpenModule {
        name: String,
    },

    // File tree
    TreeFolderToggled {
        path: String,
        expanded: bool,
    },

    // Hover
    NodeHoverEnter {
        id: NodeId,
    },
    NodeHoverLeave,

    // Snapshot lifecycle
    SnapshotApplied {
        generation: u64,
        node_count: usize,
        edge_count: usize,
    },
    SnapshotUnchanged {
        generation: u64,
    },
    SnapshotUnavailable {
        reason: String,
    },
    StaleSnapshotDiscarded {
        ticket: u64,
    },

    // Analyzer
    AnalyzerStatus {
        backend_online: bool,
        llm_online: bool,
    },

    // Content viewer
    FileContentLoaded {
        path: String,
        bytes: usize,
    },
    FileContentFailed {
        path: String,
        error: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<Event> {
        self.rx.clone()
    }

    pub fn publish(&self, event: Event) {
        tracing::trace!("publish {:?}", event);
        let _ = self.tx.send(event);
    }

    /// Events published but not yet drained.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Drain everything queued so far without blocking.
    pub fn drain(&self) -> Vec<Event> {
        self.rx.try_iter().collect()
    }

    /// Dispatch all pending events to a listener.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }
}

/// Implement this to receive events from the EventBus.
pub trait EventListener {
    fn handle_event(&mut self, event: &Event);
}
