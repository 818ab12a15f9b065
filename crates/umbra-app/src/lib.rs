pub mod analyzer;
pub mod content;
pub mod dispatcher;
pub mod poller;
pub mod settings;
pub mod view_model;
pub mod wire;

pub use analyzer::{AnalyzerClient, AnalyzerError, HealthStatus, HttpAnalyzer};
pub use content::{ContentKind, ContentTicket, ContentView, ContentViewer};
pub use dispatcher::{ActivationTarget, Dispatcher};
pub use poller::Poller;
pub use settings::{AnalyzerSettings, AppSettings, PollSettings, SettingsError};
pub use view_model::ViewModel;

use parking_lot::Mutex;
use std::sync::Arc;
use umbra_core::{GraphSnapshot, NodeId};
use umbra_events::{Event, EventBus};
use umbra_graph::{EdgeStyle, HighlightState, LayoutConfig, TreeRow, visible_rows};

/// Issued by [`AppController::begin_refresh`]; only the newest one may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { generation: u64 },
    /// Same payload as the current view; nothing was rebuilt.
    Unchanged,
    /// A newer refresh was issued or completed first.
    Stale,
    /// The analyzer is offline, so no fetch was attempted.
    Skipped,
    /// The fetch failed; the previous view stays.
    Failed(AnalyzerError),
}

struct AppState {
    view: Arc<ViewModel>,
    layout: LayoutConfig,
    issued: u64,
    completed: u64,
    status: HealthStatus,
    content: ContentViewer,
    dispatcher: Dispatcher,
}

impl AppState {
    fn is_stale(&self, ticket: RefreshTicket) -> bool {
        ticket.0 < self.issued || ticket.0 <= self.completed
    }
}

/// Headless orchestrator: owns the current view, the code panel and the
/// interaction state. Any shell (CLI, desktop, editor plugin) drives it and
/// listens on [`AppController::events`].
#[derive(Clone)]
pub struct AppController {
    state: Arc<Mutex<AppState>>,
    bus: EventBus,
}

impl Default for AppController {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl AppController {
    pub fn new(layout: LayoutConfig) -> Self {
        let bus = EventBus::new();
        Self {
            state: Arc::new(Mutex::new(AppState {
                view: Arc::new(ViewModel::default()),
                layout,
                issued: 0,
                completed: 0,
                status: HealthStatus::offline(),
                content: ContentViewer::new(),
                dispatcher: Dispatcher::new(bus.clone()),
            })),
            bus,
        }
    }

    /// The bus is unbounded and keeps its own receiver, so every hover and
    /// refresh stays queued until someone drains it. Embedders must call
    /// `drain` or `dispatch_to` once per frame or tick.
    pub fn events(&self) -> EventBus {
        self.bus.clone()
    }

    /// The current view. Callers keep their `Arc` for as long as they like;
    /// refreshes replace it rather than mutate it.
    pub fn view(&self) -> Arc<ViewModel> {
        self.state.lock().view.clone()
    }

    pub fn status(&self) -> HealthStatus {
        self.state.lock().status
    }

    pub fn set_status(&self, status: HealthStatus) {
        let changed = {
            let mut s = self.state.lock();
            let changed = s.status != status;
            s.status = status;
            changed
        };
        if changed {
            tracing::info!(
                "Analyzer {}, assistant {}",
                if status.backend_online { "online" } else { "offline" },
                if status.llm_online { "online" } else { "offline" }
            );
            self.bus.publish(Event::AnalyzerStatus {
                backend_online: status.backend_online,
                llm_online: status.llm_online,
            });
        }
    }

    // --- Snapshot lifecycle ---

    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut s = self.state.lock();
        s.issued += 1;
        RefreshTicket(s.issued)
    }

    pub fn complete_refresh(
        &self,
        ticket: RefreshTicket,
        result: Result<GraphSnapshot, AnalyzerError>,
    ) -> RefreshOutcome {
        let (snapshot, layout, generation) = {
            let mut s = self.state.lock();
            if s.is_stale(ticket) {
                drop(s);
                return self.discard(ticket);
            }
            let snapshot = match result {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    s.completed = ticket.0;
                    tracing::warn!("Refresh {} failed, keeping current view: {}", ticket.0, err);
                    self.bus.publish(Event::SnapshotUnavailable {
                        reason: err.to_string(),
                    });
                    return RefreshOutcome::Failed(err);
                }
            };
            if s.view.snapshot == snapshot {
                s.completed = ticket.0;
                self.bus.publish(Event::SnapshotUnchanged {
                    generation: s.view.generation,
                });
                return RefreshOutcome::Unchanged;
            }
            (snapshot, s.layout, s.view.generation + 1)
        };

        // Classification and layout run without the lock.
        let view = ViewModel::build(generation, snapshot, &layout);

        let mut s = self.state.lock();
        if s.is_stale(ticket) {
            drop(s);
            return self.discard(ticket);
        }
        s.completed = ticket.0;
        s.dispatcher.reset(view.snapshot.edges.clone());
        let node_count = view.snapshot.nodes.len();
        let edge_count = view.snapshot.edges.len();
        s.view = Arc::new(view);
        drop(s);

        self.bus.publish(Event::SnapshotApplied {
            generation,
            node_count,
            edge_count,
        });
        RefreshOutcome::Applied { generation }
    }

    fn discard(&self, ticket: RefreshTicket) -> RefreshOutcome {
        tracing::debug!("Discarding result of stale refresh {}", ticket.0);
        self.bus
            .publish(Event::StaleSnapshotDiscarded { ticket: ticket.0 });
        RefreshOutcome::Stale
    }

    pub fn apply_snapshot(&self, snapshot: GraphSnapshot) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        self.complete_refresh(ticket, Ok(snapshot))
    }

    pub async fn check_health(&self, client: &dyn AnalyzerClient) -> HealthStatus {
        let status = client.health().await;
        self.set_status(status);
        status
    }

    pub async fn refresh(&self, client: &dyn AnalyzerClient) -> RefreshOutcome {
        if !self.status().backend_online {
            tracing::debug!("Analyzer offline, skipping snapshot fetch");
            return RefreshOutcome::Skipped;
        }
        let ticket = self.begin_refresh();
        let result = client.fetch_snapshot().await;
        self.complete_refresh(ticket, result)
    }

    // --- Interaction ---

    pub fn activate(&self, target: ActivationTarget) {
        let mut s = self.state.lock();
        let view = s.view.clone();
        s.dispatcher.on_activate(target, &view);
    }

    pub fn hover_enter(&self, id: NodeId) {
        self.state.lock().dispatcher.on_enter(id);
    }

    pub fn hover_leave(&self) {
        self.state.lock().dispatcher.on_leave();
    }

    pub fn highlight(&self) -> HighlightState {
        self.state.lock().dispatcher.highlight().clone()
    }

    pub fn edge_styles(&self) -> Vec<EdgeStyle> {
        self.state.lock().dispatcher.overlay().styles().to_vec()
    }

    pub fn selection(&self) -> Option<String> {
        self.state.lock().dispatcher.selection().map(str::to_string)
    }

    pub fn tree_rows(&self) -> Vec<TreeRow> {
        let s = self.state.lock();
        visible_rows(&s.view.tree, s.dispatcher.expanded())
    }

    // --- Code panel ---

    pub fn content(&self) -> Option<ContentView> {
        self.state.lock().content.current().cloned()
    }

    pub fn begin_content(&self, path: &str, focus: Option<NodeId>) -> ContentTicket {
        self.state.lock().content.begin(path, focus)
    }

    pub fn complete_content(&self, ticket: ContentTicket, result: Result<String, AnalyzerError>) -> bool {
        let (shown, path) = {
            let mut s = self.state.lock();
            let path = s.content.selected_path().map(str::to_string);
            let ok = result.as_ref().map(String::len).map_err(ToString::to_string);
            let shown = s.content.complete(ticket, result);
            (shown.then_some(ok), path)
        };
        match (shown, path) {
            (Some(Ok(bytes)), Some(path)) => {
                self.bus.publish(Event::FileContentLoaded { path, bytes })
            }
            (Some(Err(error)), Some(path)) => {
                self.bus.publish(Event::FileContentFailed { path, error })
            }
            _ => return false,
        }
        true
    }

    pub fn show_module(&self, name: &str) {
        self.state.lock().content.show_module(name);
    }

    /// Fetches `path` into the code panel. Nothing is fetched while the
    /// analyzer is offline; returns whether the panel changed.
    pub async fn load_file(
        &self,
        client: &dyn AnalyzerClient,
        path: &str,
        focus: Option<NodeId>,
    ) -> bool {
        if !self.status().backend_online {
            tracing::debug!("Analyzer offline, not opening {}", path);
            return false;
        }
        let ticket = self.begin_content(path, focus);
        let result = client.read_file(path).await;
        self.complete_content(ticket, result)
    }

    /// Carries out the side of an event that needs the analyzer: file opens
    /// load content, module opens show the library placeholder.
    pub async fn follow(&self, client: &dyn AnalyzerClient, event: &Event) {
        match event {
            Event::OpenFile { path, focus } => {
                self.load_file(client, path, focus.clone()).await;
            }
            Event::OpenModule { name } => self.show_module(name),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::{GraphEdge, RawNode};

    fn snapshot(files: &[&str]) -> GraphSnapshot {
        GraphSnapshot {
            nodes: files.iter().map(|f| RawNode::file(f)).collect(),
            edges: Vec::new(),
        }
    }

    #[test]
    fn test_events_queue_until_drained() {
        let controller = AppController::default();
        for _ in 0..3 {
            controller.hover_enter(NodeId::from("a.py"));
            controller.hover_leave();
        }
        assert_eq!(controller.events().pending(), 6);

        controller.events().drain();
        assert_eq!(controller.events().pending(), 0);
    }

    #[test]
    fn test_apply_replaces_view_atomically() {
        let controller = AppController::default();
        let before = controller.view();

        let outcome = controller.apply_snapshot(snapshot(&["a.py"]));
        assert_eq!(outcome, RefreshOutcome::Applied { generation: 1 });

        // Readers holding the old view still see it intact.
        assert!(before.nodes.is_empty());
        assert_eq!(controller.view().nodes.len(), 1);
        assert_eq!(controller.view().generation, 1);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let controller = AppController::default();
        let older = controller.begin_refresh();
        let newer = controller.begin_refresh();

        assert_eq!(
            controller.complete_refresh(newer, Ok(snapshot(&["new.py"]))),
            RefreshOutcome::Applied { generation: 1 }
        );
        assert_eq!(
            controller.complete_refresh(older, Ok(snapshot(&["old.py"]))),
            RefreshOutcome::Stale
        );
        assert_eq!(controller.view().nodes[0].id.as_str(), "new.py");

        let events = controller.events().drain();
        assert!(events.contains(&Event::StaleSnapshotDiscarded { ticket: older.value() }));
    }

    #[test]
    fn test_failed_refresh_keeps_previous_view() {
        let controller = AppController::default();
        controller.apply_snapshot(snapshot(&["a.py"]));

        let ticket = controller.begin_refresh();
        let outcome =
            controller.complete_refresh(ticket, Err(AnalyzerError::Unavailable("down".into())));
        assert!(matches!(outcome, RefreshOutcome::Failed(_)));
        assert_eq!(controller.view().generation, 1);
        assert_eq!(controller.view().nodes.len(), 1);
    }

    #[test]
    fn test_identical_snapshot_is_unchanged() {
        let controller = AppController::default();
        controller.apply_snapshot(snapshot(&["a.py"]));
        let view = controller.view();

        assert_eq!(
            controller.apply_snapshot(snapshot(&["a.py"])),
            RefreshOutcome::Unchanged
        );
        assert!(Arc::ptr_eq(&view, &controller.view()));
    }

    #[test]
    fn test_new_snapshot_resets_highlight_but_keeps_expansion() {
        let controller = AppController::default();
        controller.apply_snapshot(GraphSnapshot {
            nodes: vec![
                RawNode::file("src/a.py"),
                RawNode::member("src/a.py", "f"),
                RawNode::file("src/b.py"),
                RawNode::member("src/b.py", "g"),
            ],
            edges: vec![GraphEdge::new("src/a.py::f", "src/b.py::g")],
        });
        controller.activate(ActivationTarget::TreeFolder("src".to_string()));
        controller.hover_enter(NodeId::from("src/a.py::f"));
        assert!(controller.edge_styles()[0].is_highlighted());
        assert_eq!(controller.tree_rows().len(), 3);

        controller.apply_snapshot(snapshot(&["src/a.py", "src/c.py"]));
        assert_eq!(controller.highlight(), HighlightState::Neutral);
        assert!(controller.edge_styles().is_empty());
        let rows: Vec<String> = controller.tree_rows().into_iter().map(|r| r.name).collect();
        assert_eq!(rows, vec!["src", "a.py", "c.py"]);
    }

    #[test]
    fn test_content_events_follow_completion() {
        let controller = AppController::default();
        let ticket = controller.begin_content("a.py", None);
        assert!(controller.complete_content(ticket, Ok("print(1)".into())));
        assert_eq!(controller.content().unwrap().text, "print(1)");

        let events = controller.events().drain();
        assert_eq!(
            events,
            vec![Event::FileContentLoaded {
                path: "a.py".to_string(),
                bytes: 8
            }]
        );

        let stale = controller.begin_content("b.py", None);
        controller.show_module("os");
        assert!(!controller.complete_content(stale, Ok("late".into())));
        assert!(controller.events().drain().is_empty());
    }
}
