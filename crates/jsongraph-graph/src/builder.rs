//! JSON document → node/edge tree.
//!
//! The walk is a pre-order depth-first traversal driven by an explicit work
//! stack, so documents nested far past the depth guard never touch the native
//! stack. Node and edge order match what a recursive walk would emit: a parent
//! is created before its children, children in key order (objects) or index
//! order (arrays), and each edge is created together with its child node.

use crate::classify::{DefaultFormatter, DisplayFormatter, UNFORMATTABLE_SENTINEL, classify};
use crate::metadata::{FieldSetPredicate, MetadataPredicate};
use crate::settings::BuildOptions;
use jsongraph_core::{
    Diagnostic, EdgeId, EdgeKind, Graph, GraphEdge, GraphIssue, GraphNode, JsonInput, NodeId,
    NodeRole, ROOT_LABEL, ValueKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildOutput {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    /// Everything that degraded during the build. Empty on a clean run.
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutput {
    pub fn into_graph(self) -> Graph {
        Graph::new(self.nodes, self.edges)
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[derive(Clone, Copy)]
enum Cursor<'i> {
    Input(&'i JsonInput<'i>),
    Json(&'i Value),
}

impl<'i> Cursor<'i> {
    fn from_input(input: &'i JsonInput<'i>) -> Self {
        match input {
            JsonInput::Value(value) => Cursor::Json(value),
            other => Cursor::Input(other),
        }
    }

    fn with_input<R>(self, f: impl FnOnce(&JsonInput<'_>) -> R) -> R {
        match self {
            Cursor::Input(input) => f(input),
            Cursor::Json(value) => f(&JsonInput::Value(value)),
        }
    }

    /// Literal kept on primitive nodes for reconstruction.
    fn literal(self) -> Option<Value> {
        match self {
            Cursor::Json(Value::Object(_) | Value::Array(_)) => None,
            Cursor::Json(value) => Some(value.clone()),
            Cursor::Input(input) if input.is_undefined() => Some(Value::Null),
            Cursor::Input(_) => None,
        }
    }
}

struct Child<'i> {
    field_name: String,
    segment: String,
    keyed: bool,
    cursor: Cursor<'i>,
}

struct Pending<'i> {
    parent: Option<NodeId>,
    field_name: String,
    path: String,
    depth: usize,
    /// Object key (as opposed to an array slot or the root).
    keyed: bool,
    inherited_metadata: bool,
    cursor: Cursor<'i>,
}

struct Described {
    kind: ValueKind,
    display: Result<String, String>,
    is_metadata: bool,
}

/// Per-invocation id source; nothing is shared between builds.
#[derive(Default)]
struct IdCounter {
    next_node: i64,
    next_edge: i64,
}

impl IdCounter {
    fn node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    fn edge(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        id
    }
}

pub struct TreeBuilder {
    options: BuildOptions,
    predicate: Box<dyn MetadataPredicate>,
    formatter: Box<dyn DisplayFormatter>,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

impl TreeBuilder {
    pub fn new(options: BuildOptions) -> Self {
        let predicate = FieldSetPredicate::new(options.metadata_fields.iter().cloned());
        let formatter = DefaultFormatter::new(options.safe_display, options.max_display_chars);
        Self {
            options,
            predicate: Box::new(predicate),
            formatter: Box::new(formatter),
        }
    }

    pub fn with_metadata_predicate(mut self, predicate: impl MetadataPredicate + 'static) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    pub fn with_formatter(mut self, formatter: impl DisplayFormatter + 'static) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    pub fn build(&self, value: &Value) -> BuildOutput {
        self.walk(Cursor::Json(value))
    }

    pub fn build_input(&self, input: &JsonInput<'_>) -> BuildOutput {
        self.walk(Cursor::from_input(input))
    }

    fn children<'i>(&self, cursor: Cursor<'i>) -> Vec<Child<'i>> {
        let labels = self.options.array_label;
        match cursor {
            Cursor::Json(Value::Object(map)) => map
                .iter()
                .map(|(key, value)| Child {
                    field_name: key.clone(),
                    segment: key_segment(key),
                    keyed: true,
                    cursor: Cursor::Json(value),
                })
                .collect(),
            Cursor::Json(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, value)| Child {
                    field_name: labels.label(i),
                    segment: format!("[{}]", i),
                    keyed: false,
                    cursor: Cursor::Json(value),
                })
                .collect(),
            Cursor::Input(JsonInput::Object(entries)) => entries
                .iter()
                .map(|(key, input)| Child {
                    field_name: key.clone(),
                    segment: key_segment(key),
                    keyed: true,
                    cursor: Cursor::from_input(input),
                })
                .collect(),
            Cursor::Input(JsonInput::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, input)| Child {
                    field_name: labels.label(i),
                    segment: format!("[{}]", i),
                    keyed: false,
                    cursor: Cursor::from_input(input),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn describe(&self, item: &Pending<'_>) -> Described {
        let is_metadata = item.inherited_metadata
            || (item.keyed && self.predicate.is_metadata(&item.field_name));
        let (kind, display) = item.cursor.with_input(|input| {
            let kind = classify(input);
            let display = self
                .formatter
                .format(input, kind)
                .map_err(|e| e.to_string());
            (kind, display)
        });
        Described {
            kind,
            display,
            is_metadata,
        }
    }

    fn walk(&self, root: Cursor<'_>) -> BuildOutput {
        let mut ids = IdCounter::default();
        let mut out = BuildOutput::default();
        let mut stack = vec![Pending {
            parent: None,
            field_name: ROOT_LABEL.to_string(),
            path: ROOT_LABEL.to_string(),
            depth: 0,
            keyed: false,
            inherited_metadata: false,
            cursor: root,
        }];

        while let Some(item) = stack.pop() {
            let id = ids.node();

            if item.depth > 0 && item.depth >= self.options.max_depth {
                tracing::warn!(
                    "Maximum depth ({}) reached at {}, inserting placeholder",
                    self.options.max_depth,
                    item.path
                );
                out.diagnostics.push(Diagnostic::at(
                    GraphIssue::DepthLimit {
                        max_depth: self.options.max_depth,
                    },
                    item.path.clone(),
                ));
                let is_metadata = item.inherited_metadata;
                let display = format!("[max depth {} reached]", self.options.max_depth);
                self.emit(
                    &mut out,
                    &mut ids,
                    item,
                    id,
                    ValueKind::Null,
                    NodeRole::DepthPlaceholder,
                    display,
                    None,
                    is_metadata,
                );
                continue;
            }

            let described = match panic::catch_unwind(AssertUnwindSafe(|| self.describe(&item))) {
                Ok(described) => described,
                Err(payload) => {
                    let reason = panic_reason(payload.as_ref());
                    tracing::warn!("Traversal failed at {}: {}", item.path, reason);
                    out.diagnostics.push(Diagnostic::at(
                        GraphIssue::SubtreeFailed {
                            reason: reason.clone(),
                        },
                        item.path.clone(),
                    ));
                    let is_metadata = item.inherited_metadata;
                    let display = format!("[error: {}]", reason);
                    self.emit(
                        &mut out,
                        &mut ids,
                        item,
                        id,
                        ValueKind::Null,
                        NodeRole::Error,
                        display,
                        None,
                        is_metadata,
                    );
                    continue;
                }
            };

            let display = match described.display {
                Ok(text) => text,
                Err(reason) => {
                    tracing::warn!("Could not format value at {}: {}", item.path, reason);
                    out.diagnostics.push(Diagnostic::at(
                        GraphIssue::Unformattable { reason },
                        item.path.clone(),
                    ));
                    UNFORMATTABLE_SENTINEL.to_string()
                }
            };

            let role = if item.parent.is_none() {
                NodeRole::Root
            } else {
                NodeRole::Field
            };
            let value = if described.kind.is_container() {
                None
            } else {
                item.cursor.literal()
            };

            let children = if described.kind.is_container() {
                self.children(item.cursor)
            } else {
                Vec::new()
            };
            let child_depth = item.depth + 1;
            let parent_path = item.path.clone();

            self.emit(
                &mut out,
                &mut ids,
                item,
                id,
                described.kind,
                role,
                display,
                value,
                described.is_metadata,
            );

            // Reversed so the first child is popped first.
            for child in children.into_iter().rev() {
                stack.push(Pending {
                    parent: Some(id),
                    path: format!("{}{}", parent_path, child.segment),
                    field_name: child.field_name,
                    depth: child_depth,
                    keyed: child.keyed,
                    inherited_metadata: described.is_metadata,
                    cursor: child.cursor,
                });
            }
        }

        tracing::debug!(
            "Built graph with {} nodes, {} edges, {} diagnostics",
            out.nodes.len(),
            out.edges.len(),
            out.diagnostics.len()
        );
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        &self,
        out: &mut BuildOutput,
        ids: &mut IdCounter,
        item: Pending<'_>,
        id: NodeId,
        kind: ValueKind,
        role: NodeRole,
        display_value: String,
        value: Option<Value>,
        is_metadata: bool,
    ) {
        out.nodes.push(GraphNode {
            id,
            kind,
            field_name: item.field_name,
            depth: item.depth,
            path: item.path,
            display_value,
            position: None,
            value,
            is_metadata,
            role,
        });

        if let Some(parent) = item.parent {
            out.edges.push(GraphEdge {
                id: ids.edge(),
                source: parent,
                target: id,
                kind: if is_metadata {
                    EdgeKind::MetadataLink
                } else {
                    EdgeKind::Normal
                },
            });
        }
    }
}

/// Path segment for an object key. Keys that would read as path syntax are
/// written quoted, so `root["a.b"]` and `root.a.b` stay distinct.
fn key_segment(key: &str) -> String {
    if !key.is_empty() && !key.contains(['.', '[', ']', '"']) {
        return format!(".{}", key);
    }
    let escaped = key.replace('\\', "\\\\").replace('"', "\\\"");
    format!("[\"{}\"]", escaped)
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FormatError;
    use crate::settings::ArrayLabelStyle;
    use jsongraph_core::IssueKind;
    use serde_json::json;
    use std::collections::HashSet;

    fn node<'a>(out: &'a BuildOutput, path: &str) -> &'a GraphNode {
        out.nodes
            .iter()
            .find(|n| n.path == path)
            .unwrap_or_else(|| panic!("no node at {}", path))
    }

    #[test]
    fn test_object_with_array_counts() {
        let doc = json!({"a": 1, "b": [true, null]});
        let out = TreeBuilder::default().build(&doc);

        assert_eq!(out.nodes.len(), 5);
        assert_eq!(out.edges.len(), 4);
        assert!(out.is_clean());

        let root = &out.nodes[0];
        assert_eq!(root.role, NodeRole::Root);
        assert_eq!(root.field_name, "root");
        assert_eq!(root.kind, ValueKind::Object);
        assert_eq!(root.display_value, "Object{2 fields}");
        assert!(root.value.is_none());

        let b = node(&out, "root.b");
        assert_eq!(b.kind, ValueKind::Array);
        assert_eq!(b.display_value, "Array[2 items]");
        assert_eq!(node(&out, "root.b[0]").field_name, "[0]");
        assert_eq!(node(&out, "root.b[1]").value, Some(Value::Null));
        assert_eq!(node(&out, "root.a").value, Some(json!(1)));
    }

    #[test]
    fn test_scalar_root_is_single_node() {
        let doc = json!("just a string");
        let out = TreeBuilder::default().build(&doc);
        assert_eq!(out.nodes.len(), 1);
        assert!(out.edges.is_empty());
        assert_eq!(out.nodes[0].display_value, "\"just a string\"");
        assert_eq!(out.nodes[0].role, NodeRole::Root);
    }

    #[test]
    fn test_preorder_ids_and_edge_order() {
        let doc = json!({"a": {"x": 1, "y": 2}, "b": [3, 4]});
        let out = TreeBuilder::default().build(&doc);

        let paths: Vec<_> = out.nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["root", "root.a", "root.a.x", "root.a.y", "root.b", "root.b[0]", "root.b[1]"]
        );
        let ids: HashSet<_> = out.nodes.iter().map(|n| n.id).collect();
        assert_eq!(ids.len(), out.nodes.len());

        let b = node(&out, "root.b").id;
        let b_children: Vec<_> = out
            .edges
            .iter()
            .filter(|e| e.source == b)
            .map(|e| e.target)
            .collect();
        assert_eq!(b_children, vec![node(&out, "root.b[0]").id, node(&out, "root.b[1]").id]);
    }

    #[test]
    fn test_depth_guard_inserts_placeholder() {
        let doc = json!({"l1": {"l2": {"l3": {"l4": 1}}}});
        let options = BuildOptions {
            max_depth: 2,
            ..Default::default()
        };
        let out = TreeBuilder::new(options).build(&doc);

        // root, l1, placeholder for l2
        assert_eq!(out.nodes.len(), 3);
        let placeholder = node(&out, "root.l1.l2");
        assert_eq!(placeholder.role, NodeRole::DepthPlaceholder);
        assert_eq!(placeholder.depth, 2);
        assert_eq!(placeholder.kind, ValueKind::Null);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind(), IssueKind::StructuralGuardTriggered);
        assert_eq!(out.diagnostics[0].path.as_deref(), Some("root.l1.l2"));
    }

    #[test]
    fn test_metadata_propagates_to_descendants() {
        let doc = json!({"meta": {"tags": ["a", "b"]}, "name": "x"});
        let out = TreeBuilder::default().build(&doc);

        for n in &out.nodes {
            let expect = n.path.starts_with("root.meta");
            assert_eq!(n.is_metadata, expect, "{}", n.path);
        }
        for e in &out.edges {
            let target = out.nodes.iter().find(|n| n.id == e.target).unwrap();
            let expect = if target.path.starts_with("root.meta") {
                EdgeKind::MetadataLink
            } else {
                EdgeKind::Normal
            };
            assert_eq!(e.kind, expect, "{}", target.path);
        }
    }

    #[test]
    fn test_custom_metadata_predicate() {
        let doc = json!({"x-hint": {"a": 1}, "meta": 2});
        let out = TreeBuilder::default()
            .with_metadata_predicate(|name: &str| name.starts_with("x-"))
            .build(&doc);
        assert!(node(&out, "root.x-hint.a").is_metadata);
        assert!(!node(&out, "root.meta").is_metadata);
    }

    #[test]
    fn test_array_labels_never_match_predicate() {
        let doc = json!([1]);
        let out = TreeBuilder::default()
            .with_metadata_predicate(|_: &str| true)
            .build(&doc);
        assert!(out.edges.iter().all(|e| e.kind == EdgeKind::Normal));
    }

    #[test]
    fn test_ordinal_array_labels() {
        let doc = json!({"list": ["a"]});
        let options = BuildOptions {
            array_label: ArrayLabelStyle::Ordinal,
            ..Default::default()
        };
        let out = TreeBuilder::new(options).build(&doc);
        let item = node(&out, "root.list[0]");
        assert_eq!(item.field_name, "item 0");
    }

    struct RejectNumbers;

    impl DisplayFormatter for RejectNumbers {
        fn format(&self, input: &JsonInput<'_>, kind: ValueKind) -> Result<String, FormatError> {
            if kind == ValueKind::Number {
                return Err(FormatError::Rejected {
                    kind,
                    reason: "no numbers".to_string(),
                });
            }
            DefaultFormatter::default().format(input, kind)
        }
    }

    #[test]
    fn test_format_failure_uses_sentinel() {
        let doc = json!({"n": 1, "s": "ok"});
        let out = TreeBuilder::default().with_formatter(RejectNumbers).build(&doc);

        assert_eq!(out.nodes.len(), 3);
        let n = node(&out, "root.n");
        assert_eq!(n.display_value, UNFORMATTABLE_SENTINEL);
        assert_eq!(n.value, Some(json!(1)));
        assert_eq!(node(&out, "root.s").display_value, "\"ok\"");
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind(), IssueKind::FormattingFailure);
    }

    #[test]
    fn test_panicking_hook_is_isolated_to_subtree() {
        let doc = json!({"boom": {"deep": [1, 2, 3]}, "fine": 1, "also": [true]});
        let out = TreeBuilder::default()
            .with_metadata_predicate(|name: &str| {
                if name == "boom" {
                    panic!("predicate exploded");
                }
                false
            })
            .build(&doc);

        // root, also, also[0], error node for boom, fine
        assert_eq!(out.nodes.len(), 5);
        let boom = node(&out, "root.boom");
        assert_eq!(boom.role, NodeRole::Error);
        assert!(boom.display_value.contains("predicate exploded"));
        assert!(out.nodes.iter().all(|n| !n.path.starts_with("root.boom.")));
        assert_eq!(node(&out, "root.fine").value, Some(json!(1)));
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind(), IssueKind::TraversalFailure);
    }

    struct Explodes;

    impl DisplayFormatter for Explodes {
        fn format(&self, _: &JsonInput<'_>, _: ValueKind) -> Result<String, FormatError> {
            panic!("formatter exploded")
        }
    }

    #[test]
    fn test_failed_root_yields_single_error_node() {
        let doc = json!({"a": 1});
        let out = TreeBuilder::default().with_formatter(Explodes).build(&doc);
        assert_eq!(out.nodes.len(), 1);
        assert!(out.edges.is_empty());
        assert_eq!(out.nodes[0].role, NodeRole::Error);
        assert_eq!(out.nodes[0].field_name, "root");
    }

    #[test]
    fn test_undefined_fields_build_as_null() {
        let name = json!("n");
        let input = JsonInput::Object(vec![
            ("gone".to_string(), JsonInput::Undefined),
            ("name".to_string(), JsonInput::Value(&name)),
            (
                "list".to_string(),
                JsonInput::Array(vec![JsonInput::Undefined]),
            ),
        ]);
        let out = TreeBuilder::default().build_input(&input);

        assert_eq!(out.nodes.len(), 5);
        let gone = node(&out, "root.gone");
        assert_eq!(gone.kind, ValueKind::Null);
        assert_eq!(gone.display_value, "null");
        assert_eq!(gone.value, Some(Value::Null));
        assert_eq!(node(&out, "root.list").display_value, "Array[1 item]");
        assert_eq!(node(&out, "root.list[0]").kind, ValueKind::Null);
    }

    #[test]
    fn test_builds_do_not_share_ids() {
        let doc = json!({"a": [1, 2]});
        let builder = TreeBuilder::default();
        let first = builder.build(&doc);
        let second = builder.build(&doc);
        assert_eq!(first.nodes[0].id, second.nodes[0].id);
        assert_eq!(first.nodes.len(), second.nodes.len());
    }

    #[test]
    fn test_keys_with_path_syntax_get_distinct_paths() {
        let doc = json!({
            "a": {"b": 1},
            "a.b": 2,
            "x[0]": 3,
            "": 4,
            "say \"hi\"": 5,
        });
        let out = TreeBuilder::default().build(&doc);

        let paths: HashSet<_> = out.nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths.len(), out.nodes.len());

        assert_eq!(node(&out, "root.a.b").value, Some(json!(1)));
        assert_eq!(node(&out, "root[\"a.b\"]").value, Some(json!(2)));
        assert_eq!(node(&out, "root[\"x[0]\"]").value, Some(json!(3)));
        assert_eq!(node(&out, "root[\"\"]").value, Some(json!(4)));
        assert_eq!(node(&out, "root[\"say \\\"hi\\\"\"]").value, Some(json!(5)));
        assert_eq!(node(&out, "root[\"a.b\"]").field_name, "a.b");
    }
}
