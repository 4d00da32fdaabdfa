use jsongraph_core::{GraphEdge, GraphNode, NodeId, ROOT_LABEL};
use std::collections::{HashMap, HashSet};

/// Adjacency view over a node/edge list, shared by layout and reconstruction.
pub(crate) struct GraphIndex<'g> {
    pub nodes: &'g [GraphNode],
    pub node_map: HashMap<NodeId, usize>,
    /// Children per parent, in edge order.
    pub children: HashMap<NodeId, Vec<NodeId>>,
    pub dangling: Vec<&'g GraphEdge>,
    has_parent: HashSet<NodeId>,
}

impl<'g> GraphIndex<'g> {
    pub fn new(nodes: &'g [GraphNode], edges: &'g [GraphEdge]) -> Self {
        let node_map: HashMap<NodeId, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.id, i)).collect();
        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut has_parent = HashSet::new();
        let mut dangling = Vec::new();

        for edge in edges {
            if !node_map.contains_key(&edge.source) || !node_map.contains_key(&edge.target) {
                dangling.push(edge);
                continue;
            }
            children.entry(edge.source).or_default().push(edge.target);
            has_parent.insert(edge.target);
        }

        Self {
            nodes,
            node_map,
            children,
            dangling,
            has_parent,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&'g GraphNode> {
        self.node_map.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The node flagged as root, else a parentless node labeled `root`.
    pub fn root(&self) -> Option<&'g GraphNode> {
        self.nodes.iter().find(|n| n.is_root()).or_else(|| {
            self.nodes
                .iter()
                .find(|n| n.field_name == ROOT_LABEL && !self.has_parent.contains(&n.id))
        })
    }
}
