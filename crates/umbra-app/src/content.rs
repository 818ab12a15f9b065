//! State of the code panel.
//!
//! Every request takes a ticket and only the newest ticket may write, so a
//! slow answer for a file the user already left can't overwrite the current one.

use crate::analyzer::AnalyzerError;
use serde::{Deserialize, Serialize};
use umbra_core::NodeId;

pub fn module_placeholder(name: &str) -> String {
    format!("\"\"\"\nEXTERNAL LIBRARY: {name}\nBinary content not available.\n\"\"\"")
}

pub fn error_placeholder(message: &str) -> String {
    format!("# Error loading file\n{message}")
}

pub fn connection_placeholder() -> String {
    "# Error\nCould not connect to file server.".to_string()
}

/// Text shown in place of a file that could not be loaded.
pub fn placeholder_for(error: &AnalyzerError) -> String {
    match error {
        AnalyzerError::Unavailable(_) => connection_placeholder(),
        AnalyzerError::NotFound(msg) | AnalyzerError::Remote(msg) | AnalyzerError::Decode(msg) => {
            error_placeholder(msg)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    Source,
    Module,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentView {
    pub path: String,
    pub text: String,
    pub kind: ContentKind,
    pub focus: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentTicket(u64);

#[derive(Debug, Clone, Default)]
pub struct ContentViewer {
    latest: u64,
    pending: Option<(String, Option<NodeId>)>,
    current: Option<ContentView>,
}

impl ContentViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ContentView> {
        self.current.as_ref()
    }

    pub fn selected_path(&self) -> Option<&str> {
        self.pending
            .as_ref()
            .map(|(path, _)| path.as_str())
            .or_else(|| self.current.as_ref().map(|c| c.path.as_str()))
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts loading `path`; any earlier request becomes stale.
    pub fn begin(&mut self, path: &str, focus: Option<NodeId>) -> ContentTicket {
        self.latest += 1;
        self.pending = Some((path.to_string(), focus));
        ContentTicket(self.latest)
    }

    /// Returns `false` when the ticket was superseded and the result dropped.
    pub fn complete(&mut self, ticket: ContentTicket, result: Result<String, AnalyzerError>) -> bool {
        if ticket.0 != self.latest {
            tracing::debug!("Dropping content for superseded request {}", ticket.0);
            return false;
        }
        let Some((path, focus)) = self.pending.take() else {
            return false;
        };

        self.current = Some(match result {
            Ok(text) => ContentView {
                path,
                text,
                kind: ContentKind::Source,
                focus,
            },
            Err(err) => {
                tracing::warn!("Failed to load {}: {}", path, err);
                ContentView {
                    text: placeholder_for(&err),
                    path,
                    kind: ContentKind::Failed,
                    focus,
                }
            }
        });
        true
    }

    /// Third-party modules have no source; their placeholder is shown at once.
    pub fn show_module(&mut self, name: &str) {
        self.latest += 1;
        self.pending = None;
        self.current = Some(ContentView {
            path: format!("{}{}", umbra_core::DEPENDENCY_PREFIX, name),
            text: module_placeholder(name),
            kind: ContentKind::Module,
            focus: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_match_panel_text() {
        assert_eq!(
            module_placeholder("requests"),
            "\"\"\"\nEXTERNAL LIBRARY: requests\nBinary content not available.\n\"\"\""
        );
        assert_eq!(error_placeholder("boom"), "# Error loading file\nboom");
        assert_eq!(
            placeholder_for(&AnalyzerError::Unavailable("refused".into())),
            "# Error\nCould not connect to file server."
        );
        assert_eq!(
            placeholder_for(&AnalyzerError::NotFound("gone".into())),
            "# Error loading file\ngone"
        );
    }

    #[test]
    fn test_later_request_supersedes_earlier() {
        let mut viewer = ContentViewer::new();
        let first = viewer.begin("a.py", None);
        let second = viewer.begin("b.py", Some(NodeId::from("b.py::f")));
        assert_eq!(viewer.selected_path(), Some("b.py"));

        assert!(!viewer.complete(first, Ok("a".into())));
        assert!(viewer.current().is_none());
        assert!(viewer.is_loading());

        assert!(viewer.complete(second, Ok("b".into())));
        let view = viewer.current().unwrap();
        assert_eq!(view.path, "b.py");
        assert_eq!(view.text, "b");
        assert_eq!(view.focus, Some(NodeId::from("b.py::f")));
        assert!(!viewer.is_loading());
    }

    #[test]
    fn test_module_supersedes_pending_load() {
        let mut viewer = ContentViewer::new();
        let ticket = viewer.begin("a.py", None);
        viewer.show_module("numpy");
        assert!(!viewer.complete(ticket, Ok("late".into())));
        let view = viewer.current().unwrap();
        assert_eq!(view.kind, ContentKind::Module);
        assert_eq!(view.path, "module:numpy");
    }

    #[test]
    fn test_failure_shows_placeholder() {
        let mut viewer = ContentViewer::new();
        let ticket = viewer.begin("a.py", None);
        assert!(viewer.complete(ticket, Err(AnalyzerError::Remote("denied".into()))));
        let view = viewer.current().unwrap();
        assert_eq!(view.kind, ContentKind::Failed);
        assert_eq!(view.text, "# Error loading file\ndenied");
    }
}
