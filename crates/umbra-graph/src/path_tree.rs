//! Builds the explorer tree from the flat identifiers of a snapshot.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use umbra_core::KindParseError;
use umbra_core::naming::{PATH_SEPARATOR, dependency_name, is_dependency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    Folder,
    File,
}

impl PathKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PathKind::Folder => "folder",
            PathKind::File => "file",
        }
    }

    // Folders first.
    fn rank(self) -> u8 {
        match self {
            PathKind::Folder => 0,
            PathKind::File => 1,
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "folder" => Ok(PathKind::Folder),
            "file" => Ok(PathKind::File),
            other => Err(KindParseError::UnknownEntryKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: PathKind,
    /// Present for folders only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PathTreeNode>>,
}

impl PathTreeNode {
    fn folder(name: &str, path: String) -> Self {
        Self {
            name: name.to_string(),
            path,
            kind: PathKind::Folder,
            children: Some(Vec::new()),
        }
    }

    fn file(name: &str, path: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind: PathKind::File,
            children: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == PathKind::Folder
    }

    pub fn children(&self) -> &[PathTreeNode] {
        self.children.as_deref().unwrap_or(&[])
    }

    /// Number of entries in this subtree, including itself.
    pub fn len(&self) -> usize {
        1 + self.children().iter().map(PathTreeNode::len).sum::<usize>()
    }
}

fn compare_entries(a: &PathTreeNode, b: &PathTreeNode) -> Ordering {
    a.kind
        .rank()
        .cmp(&b.kind.rank())
        .then_with(|| a.name.cmp(&b.name))
}

/// Folders before files, then by name; applied to every level.
pub fn sort_tree(nodes: &mut [PathTreeNode]) {
    nodes.sort_by(compare_entries);
    for node in nodes.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            sort_tree(children);
        }
    }
}

fn insert(level: &mut Vec<PathTreeNode>, identifier: &str, segments: &[&str], depth: usize) {
    let Some((&name, rest)) = segments.split_first() else {
        return;
    };

    if rest.is_empty() {
        let exists = level
            .iter()
            .any(|n| n.kind == PathKind::File && n.name == name);
        if !exists {
            level.push(PathTreeNode::file(name, identifier));
        }
        return;
    }

    let position = level
        .iter()
        .position(|n| n.kind == PathKind::Folder && n.name == name);
    let folder = match position {
        Some(i) => &mut level[i],
        None => {
            let path = segments_path(identifier, depth);
            level.push(PathTreeNode::folder(name, path));
            let last = level.len() - 1;
            &mut level[last]
        }
    };
    let children = folder.children.get_or_insert_with(Vec::new);
    insert(children, identifier, rest, depth + 1);
}

/// The first `depth + 1` segments of `identifier`, joined again.
fn segments_path(identifier: &str, depth: usize) -> String {
    identifier
        .split(PATH_SEPARATOR)
        .take(depth + 1)
        .collect::<Vec<_>>()
        .join(&PATH_SEPARATOR.to_string())
}

/// Builds a sorted folder/file tree. Dependency identifiers are skipped and
/// repeated identifiers collapse into a single entry.
pub fn build_tree<I, S>(identifiers: I) -> Vec<PathTreeNode>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut roots = Vec::new();
    let mut skipped = 0usize;
    for identifier in identifiers {
        let identifier = identifier.as_ref();
        if is_dependency(identifier) {
            skipped += 1;
            continue;
        }
        let segments: Vec<&str> = identifier.split(PATH_SEPARATOR).collect();
        insert(&mut roots, identifier, &segments, 0);
    }
    sort_tree(&mut roots);

    tracing::debug!(
        "Built path tree: {} roots, {} entries, {} dependencies skipped",
        roots.len(),
        roots.iter().map(PathTreeNode::len).sum::<usize>(),
        skipped
    );
    roots
}

/// Names of the third-party modules among `identifiers`, prefix stripped, in
/// first-seen order.
pub fn dependency_names<I, S>(identifiers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    identifiers
        .into_iter()
        .filter_map(|id| dependency_name(id.as_ref()).map(str::to_string))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeRow {
    pub depth: usize,
    pub name: String,
    pub path: String,
    pub kind: PathKind,
    pub expanded: bool,
}

/// Flattens the tree into display rows. A folder's children are listed only
/// when its path is in `expanded`.
pub fn visible_rows(tree: &[PathTreeNode], expanded: &HashSet<String>) -> Vec<TreeRow> {
    fn walk(nodes: &[PathTreeNode], depth: usize, expanded: &HashSet<String>, out: &mut Vec<TreeRow>) {
        for node in nodes {
            let is_open = node.is_folder() && expanded.contains(&node.path);
            out.push(TreeRow {
                depth,
                name: node.name.clone(),
                path: node.path.clone(),
                kind: node.kind,
                expanded: is_open,
            });
            if is_open {
                walk(node.children(), depth + 1, expanded, out);
            }
        }
    }

    let mut rows = Vec::new();
    walk(tree, 0, expanded, &mut rows);
    rows
}
