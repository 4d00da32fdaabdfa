use crate::NodeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classes of degradation. None of them abort a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    StructuralGuardTriggered,
    FormattingFailure,
    TraversalFailure,
    ReconstructionGap,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphIssue {
    #[error("maximum depth {max_depth} reached, subtree replaced by a placeholder")]
    DepthLimit { max_depth: usize },
    #[error("value could not be formatted for display: {reason}")]
    Unformattable { reason: String },
    #[error("traversal failed, subtree replaced by an error node: {reason}")]
    SubtreeFailed { reason: String },
    #[error("no root node found in graph")]
    MissingRoot,
    #[error("edge {source_id} -> {target_id} points at a node that does not exist")]
    DanglingEdge { source_id: NodeId, target_id: NodeId },
    #[error("node {node} was reached more than once, extra reference ignored")]
    SharedChild { node: NodeId },
    #[error("duplicate key `{key}` under node {parent}, last value kept")]
    DuplicateKey { parent: NodeId, key: String },
}

impl GraphIssue {
    pub fn kind(&self) -> IssueKind {
        match self {
            GraphIssue::DepthLimit { .. } => IssueKind::StructuralGuardTriggered,
            GraphIssue::Unformattable { .. } => IssueKind::FormattingFailure,
            GraphIssue::SubtreeFailed { .. } => IssueKind::TraversalFailure,
            GraphIssue::MissingRoot
            | GraphIssue::DanglingEdge { .. }
            | GraphIssue::SharedChild { .. }
            | GraphIssue::DuplicateKey { .. } => IssueKind::ReconstructionGap,
        }
    }
}

/// Side-channel report attached to a best-effort result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub issue: GraphIssue,
    /// Document path of the affected node, when one exists.
    pub path: Option<String>,
}

impl Diagnostic {
    pub fn new(issue: GraphIssue) -> Self {
        Self { issue, path: None }
    }

    pub fn at(issue: GraphIssue, path: impl Into<String>) -> Self {
        Self {
            issue,
            path: Some(path.into()),
        }
    }

    pub fn kind(&self) -> IssueKind {
        self.issue.kind()
    }
}
