use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod naming;

pub use error::KindParseError;
pub use naming::{CLASS_MARKER, DEPENDENCY_PREFIX, MEMBER_SEPARATOR};

/// Identifier shared by graph nodes, file-tree leaves and content lookups.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Function,
    /// Drawn exactly like `Function`; kept as its own tag for consumers that
    /// want to tell them apart.
    Class,
}

impl NodeKind {
    pub fn is_container(self) -> bool {
        matches!(self, NodeKind::File)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Function => "function",
            NodeKind::Class => "class",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(NodeKind::File),
            "function" => Ok(NodeKind::Function),
            "class" => Ok(NodeKind::Class),
            other => Err(KindParseError::UnknownNodeKind(other.to_string())),
        }
    }
}

/// A node as delivered by the analyzer, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RawNode {
    pub id: NodeId,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub returns: String,
    #[serde(default, alias = "parentId")]
    pub parent: Option<NodeId>,
}

impl RawNode {
    pub fn file(path: &str) -> Self {
        Self {
            id: NodeId::from(path),
            label: naming::last_segment(path).to_string(),
            ..Default::default()
        }
    }

    pub fn member(parent: &str, name: &str) -> Self {
        Self {
            id: NodeId::new(format!("{parent}{MEMBER_SEPARATOR}{name}")),
            label: name.to_string(),
            parent: Some(NodeId::from(parent)),
            ..Default::default()
        }
    }
}

/// A node after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub args: Vec<String>,
    pub returns: String,
    pub parent: Option<NodeId>,
}

impl GraphNode {
    pub fn from_raw(raw: RawNode, kind: NodeKind) -> Self {
        let label = if raw.label.is_empty() {
            raw.id.0.clone()
        } else {
            raw.label
        };
        Self {
            id: raw.id,
            kind,
            label,
            args: raw.args,
            returns: raw.returns,
            parent: raw.parent,
        }
    }

    /// Parameter list as shown on a function card.
    pub fn args_display(&self) -> String {
        if self.args.is_empty() {
            naming::VOID.to_string()
        } else {
            self.args.join(", ")
        }
    }

    /// Return shape as shown on a function card.
    pub fn returns_display(&self) -> &str {
        if self.returns.is_empty() || self.returns == naming::NONE_LITERAL {
            naming::VOID
        } else {
            &self.returns
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl GraphEdge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

/// One full analyzer payload. Snapshots are replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphSnapshot {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutDirection {
    /// Ranks advance along x.
    #[default]
    Horizontal,
    /// Ranks advance along y.
    Vertical,
}
