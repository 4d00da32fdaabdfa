use serde::{Deserialize, Serialize};
use std::fmt;

pub mod input;
pub mod issue;

pub use input::JsonInput;
pub use issue::{Diagnostic, GraphIssue, IssueKind};

/// Label carried by the synthetic node that stands for the whole document.
pub const ROOT_LABEL: &str = "root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub i64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The JSON kind a node represents. `undefined` inputs classify as `Null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
    Null,
}

impl ValueKind {
    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Object | ValueKind::Array)
    }

    pub fn label(self) -> &'static str {
        match self {
            ValueKind::Object => "object",
            ValueKind::Array => "array",
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Boolean => "boolean",
            ValueKind::Null => "null",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EdgeKind {
    #[default]
    Normal,
    /// Edge into (or below) a metadata field; renderers style these apart.
    MetadataLink,
}

/// What a node stands for beyond its JSON kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeRole {
    Root,
    #[default]
    Field,
    /// Leaf emitted in place of a subtree cut off by the depth guard.
    DepthPlaceholder,
    /// Leaf emitted in place of a subtree whose traversal failed.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LayoutDirection {
    /// Levels advance along x, siblings stack along y.
    #[default]
    Horizontal,
    /// Levels advance along y, siblings stack along x.
    Vertical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub kind: ValueKind,
    pub field_name: String,
    pub depth: usize,
    /// e.g. `root.categories[2].name`. Only for tracing and layout reuse.
    pub path: String,
    /// Display-only summary. Never read back by the reconstructor.
    pub display_value: String,
    #[serde(default)]
    pub position: Option<Position>,
    /// Literal for primitive nodes; containers only own their edges.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub is_metadata: bool,
    #[serde(default)]
    pub role: NodeRole,
}

impl GraphNode {
    pub fn is_root(&self) -> bool {
        self.role == NodeRole::Root
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn new(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self { nodes, edges }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn root(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.is_root())
    }

    pub fn find_by_path(&self, path: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.path == path)
    }
}
