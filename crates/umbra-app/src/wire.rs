//! JSON shapes spoken by the analyzer service.
//!
//! `/analyze` returns nodes and edges already shaped for a flow-chart widget;
//! these types decode that payload and lower it into the core model.

use serde::{Deserialize, Serialize};
use umbra_core::{GraphEdge, GraphSnapshot, NodeId, RawNode};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDataDto {
    pub label: Option<String>,
    pub args: Option<Vec<String>>,
    pub returns: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
    #[serde(default)]
    pub data: NodeDataDto,
    #[serde(rename = "parentNode", default)]
    pub parent_node: Option<String>,
    #[serde(default)]
    pub extent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeDto {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub animated: Option<bool>,
    #[serde(rename = "type", default)]
    pub edge_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzePayload {
    #[serde(default)]
    pub nodes: Vec<NodeDto>,
    #[serde(default)]
    pub edges: Vec<EdgeDto>,
}

impl From<NodeDto> for RawNode {
    fn from(dto: NodeDto) -> Self {
        RawNode {
            label: dto.data.label.unwrap_or_default(),
            args: dto.data.args.unwrap_or_default(),
            returns: dto.data.returns.unwrap_or_default(),
            parent: dto.parent_node.filter(|p| !p.is_empty()).map(NodeId::from),
            id: NodeId::from(dto.id),
        }
    }
}

impl From<EdgeDto> for GraphEdge {
    fn from(dto: EdgeDto) -> Self {
        GraphEdge {
            id: dto.id,
            source: NodeId::from(dto.source),
            target: NodeId::from(dto.target),
            label: dto.label.filter(|l| !l.is_empty()),
        }
    }
}

impl From<AnalyzePayload> for GraphSnapshot {
    fn from(payload: AnalyzePayload) -> Self {
        GraphSnapshot {
            nodes: payload.nodes.into_iter().map(RawNode::from).collect(),
            edges: payload.edges.into_iter().map(GraphEdge::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthDto {
    pub status: Option<String>,
    pub system: Option<String>,
    pub llm: Option<String>,
}

impl HealthDto {
    pub fn llm_connected(&self) -> bool {
        self.llm.as_deref() == Some("connected")
    }
}

/// `/read-file` answers with the content or with an `error` message, both
/// under HTTP 200.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadFileDto {
    Content { path: String, content: String },
    Failure { error: String },
}

/// Body of a non-2xx answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorDetailDto {
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYZE: &str = r#"{
        "nodes": [
            {"id": "main.py", "type": "file", "data": {"label": "main.py", "args": [], "returns": ""}, "parentNode": null, "extent": null},
            {"id": "main.py::run", "type": "function", "data": {"label": "run", "args": ["cfg"], "returns": "None"}, "parentNode": "main.py", "extent": "parent"},
            {"id": "module:os", "type": "default", "data": {"label": "module:os"}, "parentNode": null}
        ],
        "edges": [
            {"id": "main.py::run-module:os", "source": "main.py::run", "target": "module:os", "animated": true, "type": "smoothstep", "label": "calls"},
            {"id": "a-b", "source": "a", "target": "b", "label": ""}
        ]
    }"#;

    #[test]
    fn test_analyze_payload_lowers_to_snapshot() {
        let payload: AnalyzePayload = serde_json::from_str(ANALYZE).unwrap();
        let snapshot = GraphSnapshot::from(payload);

        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.nodes[0].parent, None);
        assert_eq!(snapshot.nodes[1].parent, Some(NodeId::from("main.py")));
        assert_eq!(snapshot.nodes[1].args, vec!["cfg".to_string()]);
        assert_eq!(snapshot.nodes[1].returns, "None");
        assert!(snapshot.nodes[2].args.is_empty());

        assert_eq!(snapshot.edges[0].label.as_deref(), Some("calls"));
        assert_eq!(snapshot.edges[1].label, None);
    }

    #[test]
    fn test_null_fields_are_tolerated() {
        let payload: AnalyzePayload = serde_json::from_str(
            r#"{"nodes": [{"id": "x", "data": {"label": null, "args": null, "returns": null}}]}"#,
        )
        .unwrap();
        let snapshot = GraphSnapshot::from(payload);
        assert!(snapshot.nodes[0].label.is_empty());
        assert!(snapshot.edges.is_empty());
    }

    #[test]
    fn test_read_file_variants() {
        let ok: ReadFileDto = serde_json::from_str(r#"{"path": "a.py", "content": "x = 1"}"#).unwrap();
        assert_eq!(
            ok,
            ReadFileDto::Content {
                path: "a.py".to_string(),
                content: "x = 1".to_string()
            }
        );
        let err: ReadFileDto = serde_json::from_str(r#"{"error": "denied"}"#).unwrap();
        assert_eq!(err, ReadFileDto::Failure { error: "denied".to_string() });
    }

    #[test]
    fn test_health_llm_flag() {
        let dto: HealthDto =
            serde_json::from_str(r#"{"status": "active", "system": "core", "llm": "connected"}"#)
                .unwrap();
        assert!(dto.llm_connected());
        let dto: HealthDto = serde_json::from_str(r#"{"llm": "disconnected"}"#).unwrap();
        assert!(!dto.llm_connected());
    }
}
