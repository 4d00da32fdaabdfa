//! Node/edge tree → JSON document.
//!
//! Children are taken in edge order, which is what keeps arrays stable. The
//! walk is an explicit post-order so hand-edited graphs of any depth are safe,
//! and every malformed shape degrades to a diagnostic instead of an error.

use crate::index::GraphIndex;
use jsongraph_core::{Diagnostic, GraphEdge, GraphIssue, GraphNode, NodeId, ValueKind};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub value: Value,
    pub diagnostics: Vec<Diagnostic>,
}

enum Step {
    Enter(NodeId),
    Exit(NodeId),
}

pub fn reconstruct_with_diagnostics(nodes: &[GraphNode], edges: &[GraphEdge]) -> Reconstruction {
    let index = GraphIndex::new(nodes, edges);
    let mut diagnostics = Vec::new();

    for edge in &index.dangling {
        tracing::warn!(
            "Ignoring edge {} ({} -> {}) with a missing endpoint",
            edge.id,
            edge.source,
            edge.target
        );
        diagnostics.push(Diagnostic::new(GraphIssue::DanglingEdge {
            source_id: edge.source,
            target_id: edge.target,
        }));
    }

    let Some(root) = index.root() else {
        tracing::warn!(
            "No root node in graph of {} nodes, returning empty object",
            nodes.len()
        );
        diagnostics.push(Diagnostic::new(GraphIssue::MissingRoot));
        return Reconstruction {
            value: Value::Object(Map::new()),
            diagnostics,
        };
    };

    let mut done: HashMap<NodeId, Value> = HashMap::new();
    let mut adopted: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    let mut entered: HashSet<NodeId> = HashSet::from([root.id]);
    let mut stack = vec![Step::Enter(root.id)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Enter(id) => {
                let Some(node) = index.node(id) else {
                    continue;
                };

                if !node.kind.is_container() {
                    if !index.children_of(id).is_empty() {
                        tracing::debug!("Ignoring children of primitive node {}", node.path);
                    }
                    done.insert(id, node.value.clone().unwrap_or(Value::Null));
                    continue;
                }

                let mut accepted = Vec::new();
                for &child in index.children_of(id) {
                    if !entered.insert(child) {
                        tracing::warn!("Node {} reached more than once, skipping", child);
                        diagnostics.push(Diagnostic::at(
                            GraphIssue::SharedChild { node: child },
                            node.path.clone(),
                        ));
                        continue;
                    }
                    accepted.push(child);
                }

                stack.push(Step::Exit(id));
                for &child in accepted.iter().rev() {
                    stack.push(Step::Enter(child));
                }
                adopted.insert(id, accepted);
            }
            Step::Exit(id) => {
                let Some(node) = index.node(id) else {
                    continue;
                };
                let children = adopted.remove(&id).unwrap_or_default();
                let value = match node.kind {
                    ValueKind::Array => Value::Array(
                        children
                            .iter()
                            .map(|child| done.remove(child).unwrap_or(Value::Null))
                            .collect(),
                    ),
                    _ => {
                        let mut map = Map::new();
                        for child in &children {
                            let value = done.remove(child).unwrap_or(Value::Null);
                            let Some(child_node) = index.node(*child) else {
                                continue;
                            };
                            let key = child_node.field_name.clone();
                            if map.insert(key.clone(), value).is_some() {
                                tracing::warn!("Duplicate key `{}` under {}", key, node.path);
                                diagnostics.push(Diagnostic::at(
                                    GraphIssue::DuplicateKey { parent: id, key },
                                    node.path.clone(),
                                ));
                            }
                        }
                        Value::Object(map)
                    }
                };
                done.insert(id, value);
            }
        }
    }

    let value = done
        .remove(&root.id)
        .unwrap_or_else(|| Value::Object(Map::new()));
    Reconstruction { value, diagnostics }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::settings::BuildOptions;
    use jsongraph_core::{EdgeId, EdgeKind, IssueKind, JsonInput, NodeRole};
    use serde_json::json;

    fn round_trip(doc: &Value) -> Value {
        let out = TreeBuilder::default().build(doc);
        reconstruct_with_diagnostics(&out.nodes, &out.edges).value
    }

    fn node(
        id: i64,
        kind: ValueKind,
        name: &str,
        role: NodeRole,
        value: Option<Value>,
    ) -> GraphNode {
        GraphNode {
            id: NodeId(id),
            kind,
            field_name: name.to_string(),
            depth: 0,
            path: name.to_string(),
            display_value: String::new(),
            position: None,
            value,
            is_metadata: false,
            role,
        }
    }

    fn edge(id: i64, source: i64, target: i64) -> GraphEdge {
        GraphEdge {
            id: EdgeId(id),
            source: NodeId(source),
            target: NodeId(target),
            kind: EdgeKind::Normal,
        }
    }

    #[test]
    fn test_round_trip_nested_document() {
        let doc = json!({
            "name": "shop",
            "categories": [
                {"name": "a", "items": [1, 2.5, -3], "active": true},
                {"name": "b", "items": [], "extra": null},
            ],
            "meta": {"tags": ["x"], "empty": {}},
        });
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn test_scalar_root_round_trips() {
        let doc = json!("just a string");
        assert_eq!(round_trip(&doc), doc);
        assert_eq!(round_trip(&json!(null)), json!(null));
        assert_eq!(round_trip(&json!([])), json!([]));
    }

    #[test]
    fn test_childless_array_is_empty_array() {
        let nodes = vec![node(1, ValueKind::Array, "root", NodeRole::Root, None)];
        let result = reconstruct_with_diagnostics(&nodes, &[]);
        assert_eq!(result.value, json!([]));
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_long_strings_use_stored_value() {
        let doc = json!({"bio": "z".repeat(500)});
        assert_eq!(round_trip(&doc), doc);
    }

    #[test]
    fn test_stray_children_of_primitives_are_ignored() {
        let nodes = vec![
            node(1, ValueKind::Object, "root", NodeRole::Root, None),
            node(2, ValueKind::Number, "n", NodeRole::Field, Some(json!(7))),
            node(3, ValueKind::String, "stray", NodeRole::Field, Some(json!("s"))),
        ];
        let edges = vec![edge(1, 1, 2), edge(2, 2, 3)];
        let result = reconstruct_with_diagnostics(&nodes, &edges);
        assert_eq!(result.value, json!({"n": 7}));
    }

    #[test]
    fn test_missing_root_yields_empty_object() {
        let nodes = vec![node(1, ValueKind::Number, "n", NodeRole::Field, Some(json!(1)))];
        let result = reconstruct_with_diagnostics(&nodes, &[]);
        assert_eq!(result.value, json!({}));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind(), IssueKind::ReconstructionGap);
    }

    #[test]
    fn test_dangling_edges_are_reported() {
        let nodes = vec![
            node(1, ValueKind::Array, "root", NodeRole::Root, None),
            node(2, ValueKind::Boolean, "[0]", NodeRole::Field, Some(json!(true))),
        ];
        let edges = vec![edge(1, 1, 2), edge(2, 1, 42)];
        let result = reconstruct_with_diagnostics(&nodes, &edges);
        assert_eq!(result.value, json!([true]));
        assert_eq!(
            result.diagnostics[0].issue,
            GraphIssue::DanglingEdge {
                source_id: NodeId(1),
                target_id: NodeId(42)
            }
        );
    }

    #[test]
    fn test_cycles_and_shared_children_are_cut() {
        let nodes = vec![
            node(1, ValueKind::Object, "root", NodeRole::Root, None),
            node(2, ValueKind::Array, "a", NodeRole::Field, None),
            node(3, ValueKind::Number, "[0]", NodeRole::Field, Some(json!(1))),
            node(4, ValueKind::Object, "b", NodeRole::Field, None),
        ];
        // a -> root closes a cycle, b -> [0] shares a's child.
        let edges = vec![
            edge(1, 1, 2),
            edge(2, 2, 3),
            edge(3, 2, 1),
            edge(4, 1, 4),
            edge(5, 4, 3),
        ];
        let result = reconstruct_with_diagnostics(&nodes, &edges);
        assert_eq!(result.value, json!({"a": [1], "b": {}}));
        assert_eq!(result.diagnostics.len(), 2);
        assert!(
            result
                .diagnostics
                .iter()
                .all(|d| d.kind() == IssueKind::ReconstructionGap)
        );
    }

    #[test]
    fn test_duplicate_keys_keep_last() {
        let nodes = vec![
            node(1, ValueKind::Object, "root", NodeRole::Root, None),
            node(2, ValueKind::Number, "k", NodeRole::Field, Some(json!(1))),
            node(3, ValueKind::Number, "k", NodeRole::Field, Some(json!(2))),
        ];
        let edges = vec![edge(1, 1, 2), edge(2, 1, 3)];
        let result = reconstruct_with_diagnostics(&nodes, &edges);
        assert_eq!(result.value, json!({"k": 2}));
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_edited_values_flow_back() {
        let doc = json!({"price": 10, "tags": ["a", "b"]});
        let mut out = TreeBuilder::default().build(&doc);
        for n in &mut out.nodes {
            if n.path == "root.price" {
                n.value = Some(json!(12));
            }
        }
        // Swap the two array edges.
        let tags = out.nodes.iter().find(|n| n.path == "root.tags").unwrap().id;
        let positions: Vec<usize> = out
            .edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.source == tags)
            .map(|(i, _)| i)
            .collect();
        out.edges.swap(positions[0], positions[1]);

        let result = reconstruct_with_diagnostics(&out.nodes, &out.edges);
        assert_eq!(result.value, json!({"price": 12, "tags": ["b", "a"]}));
    }

    #[test]
    fn test_undefined_reconstructs_as_null() {
        let input = JsonInput::Object(vec![("gone".to_string(), JsonInput::Undefined)]);
        let out = TreeBuilder::default().build_input(&input);
        let result = reconstruct_with_diagnostics(&out.nodes, &out.edges);
        assert_eq!(result.value, json!({"gone": null}));
    }

    #[test]
    fn test_placeholder_reconstructs_as_null() {
        let doc = json!({"a": {"b": {"c": 1}}});
        let options = BuildOptions {
            max_depth: 2,
            ..Default::default()
        };
        let out = TreeBuilder::new(options).build(&doc);
        let result = reconstruct_with_diagnostics(&out.nodes, &out.edges);
        assert_eq!(result.value, json!({"a": {"b": null}}));
    }
}
