pub mod builder;
pub mod classify;
mod index;
pub mod layout;
pub mod metadata;
pub mod reconstruct;
pub mod settings;

pub use builder::{BuildOutput, TreeBuilder};
pub use classify::{
    DefaultFormatter, DisplayFormatter, FormatError, UNFORMATTABLE_SENTINEL, classify,
    classify_value, format_display_value,
};
pub use layout::{Layouter, LevelLayouter, TraversalLayouter, layout_with, relayout_preserving};
pub use metadata::{DEFAULT_METADATA_FIELDS, FieldSetPredicate, MetadataPredicate};
pub use reconstruct::{Reconstruction, reconstruct_with_diagnostics};
pub use settings::{
    ArrayLabelStyle, BuildOptions, EngineSettings, LayoutAlgorithm, LayoutSettings,
};

use jsongraph_core::{GraphEdge, GraphNode};
use serde_json::Value;

/// Builds a graph from `json` with default options. Never panics on data;
/// degradations are listed in [`BuildOutput::diagnostics`].
pub fn build(json: &Value) -> BuildOutput {
    TreeBuilder::default().build(json)
}

/// Positions every node with the default breadth-first level layout.
pub fn layout(nodes: &[GraphNode], edges: &[GraphEdge]) -> Vec<GraphNode> {
    layout_with(&LevelLayouter::default(), nodes, edges)
}

/// Rebuilds the JSON document a graph describes. The synthetic root is not
/// re-emitted; a graph without a root yields `{}`.
pub fn reconstruct(nodes: &[GraphNode], edges: &[GraphEdge]) -> Value {
    reconstruct_with_diagnostics(nodes, edges).value
}
