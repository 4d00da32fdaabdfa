use crate::index::GraphIndex;
use crate::settings::{LayoutAlgorithm, LayoutSettings};
use jsongraph_core::{GraphEdge, GraphNode, LayoutDirection, NodeId, Position};
use std::collections::{HashMap, HashSet, VecDeque};

pub trait Layouter {
    fn execute(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> HashMap<NodeId, Position>;

    /// Offset of one sibling slot along the cross axis.
    fn sibling_step(&self) -> Position;
}

fn place(direction: LayoutDirection, main: f32, cross: f32) -> Position {
    match direction {
        LayoutDirection::Horizontal => Position::new(main, cross),
        LayoutDirection::Vertical => Position::new(cross, main),
    }
}

/// Breadth-first banding: one band per level, siblings stacked across it in
/// discovery order and centred on the main axis.
pub struct LevelLayouter {
    pub level_spacing: f32,
    pub node_spacing: f32,
    pub direction: LayoutDirection,
}

impl Default for LevelLayouter {
    fn default() -> Self {
        let settings = LayoutSettings::default();
        Self {
            level_spacing: settings.level_spacing,
            node_spacing: settings.node_spacing,
            direction: settings.direction,
        }
    }
}

impl LevelLayouter {
    fn assign_levels(index: &GraphIndex<'_>) -> Vec<Vec<NodeId>> {
        let mut levels: Vec<Vec<NodeId>> = Vec::new();
        let mut seen = HashSet::new();

        if let Some(root) = index.root() {
            let mut queue = VecDeque::from([(root.id, 0usize)]);
            seen.insert(root.id);
            while let Some((id, level)) = queue.pop_front() {
                if levels.len() <= level {
                    levels.push(Vec::new());
                }
                levels[level].push(id);
                for &child in index.children_of(id) {
                    if seen.insert(child) {
                        queue.push_back((child, level + 1));
                    }
                }
            }
        }

        let unreachable: Vec<NodeId> = index
            .nodes
            .iter()
            .map(|n| n.id)
            .filter(|id| !seen.contains(id))
            .collect();
        if !unreachable.is_empty() {
            tracing::warn!(
                "{} nodes are not reachable from the root, placing them on a trailing band",
                unreachable.len()
            );
            levels.push(unreachable);
        }

        levels
    }

    fn band_offset(&self, position: usize, count: usize) -> f32 {
        let extent = count.saturating_sub(1) as f32 * self.node_spacing;
        position as f32 * self.node_spacing - extent / 2.0
    }
}

impl Layouter for LevelLayouter {
    fn sibling_step(&self) -> Position {
        place(self.direction, 0.0, self.node_spacing)
    }

    fn execute(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> HashMap<NodeId, Position> {
        let index = GraphIndex::new(nodes, edges);
        let levels = Self::assign_levels(&index);

        let mut positions = HashMap::with_capacity(nodes.len());
        for (level, band) in levels.iter().enumerate() {
            let main = level as f32 * self.level_spacing;
            for (i, &id) in band.iter().enumerate() {
                let cross = self.band_offset(i, band.len());
                positions.insert(id, place(self.direction, main, cross));
            }
        }
        positions
    }
}

/// Incremental placement: the main axis follows depth, the cross axis grows
/// monotonically in pre-order traversal order.
pub struct TraversalLayouter {
    pub level_spacing: f32,
    pub node_spacing: f32,
    pub direction: LayoutDirection,
}

impl Default for TraversalLayouter {
    fn default() -> Self {
        let settings = LayoutSettings::default();
        Self {
            level_spacing: settings.level_spacing,
            node_spacing: settings.node_spacing,
            direction: settings.direction,
        }
    }
}

impl Layouter for TraversalLayouter {
    fn sibling_step(&self) -> Position {
        place(self.direction, 0.0, self.node_spacing)
    }

    fn execute(&self, nodes: &[GraphNode], edges: &[GraphEdge]) -> HashMap<NodeId, Position> {
        let index = GraphIndex::new(nodes, edges);
        let mut positions = HashMap::with_capacity(nodes.len());
        let mut seen = HashSet::new();
        let mut offset = 0usize;

        if let Some(root) = index.root() {
            let mut stack = vec![(root.id, 0usize)];
            while let Some((id, depth)) = stack.pop() {
                if !seen.insert(id) {
                    continue;
                }
                let main = depth as f32 * self.level_spacing;
                let cross = offset as f32 * self.node_spacing;
                positions.insert(id, place(self.direction, main, cross));
                offset += 1;

                for &child in index.children_of(id).iter().rev() {
                    if !seen.contains(&child) {
                        stack.push((child, depth + 1));
                    }
                }
            }
        }

        for node in nodes {
            if seen.contains(&node.id) {
                continue;
            }
            let main = node.depth as f32 * self.level_spacing;
            let cross = offset as f32 * self.node_spacing;
            positions.insert(node.id, place(self.direction, main, cross));
            offset += 1;
        }

        positions
    }
}

impl LayoutSettings {
    pub fn layouter(&self) -> Box<dyn Layouter> {
        match self.algorithm {
            LayoutAlgorithm::Level => Box::new(LevelLayouter {
                level_spacing: self.level_spacing,
                node_spacing: self.node_spacing,
                direction: self.direction,
            }),
            LayoutAlgorithm::Traversal => Box::new(TraversalLayouter {
                level_spacing: self.level_spacing,
                node_spacing: self.node_spacing,
                direction: self.direction,
            }),
        }
    }
}

/// Returns a copy of `nodes` with every position set by `layouter`.
pub fn layout_with(
    layouter: &dyn Layouter,
    nodes: &[GraphNode],
    edges: &[GraphEdge],
) -> Vec<GraphNode> {
    let positions = layouter.execute(nodes, edges);
    nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            node.position = Some(positions.get(&node.id).copied().unwrap_or_default());
            node
        })
        .collect()
}

/// Hashable key for an exact position; `-0.0` and `0.0` share a slot.
fn slot(position: Position) -> (u32, u32) {
    ((position.x + 0.0).to_bits(), (position.y + 0.0).to_bits())
}

/// Lays out a rebuilt graph while keeping the positions of nodes that already
/// existed in `previous`. Nodes are matched on `path`, since ids change
/// between builds. New nodes whose slot is taken by a kept node are moved
/// along the sibling axis until they land on a free one.
pub fn relayout_preserving(
    previous: &[GraphNode],
    nodes: &[GraphNode],
    edges: &[GraphEdge],
    layouter: &dyn Layouter,
) -> Vec<GraphNode> {
    let kept: HashMap<&str, Position> = previous
        .iter()
        .filter_map(|n| n.position.map(|p| (n.path.as_str(), p)))
        .collect();

    let mut laid_out = layout_with(layouter, nodes, edges);
    let mut occupied = HashSet::new();
    let mut fresh = Vec::new();
    for (i, node) in laid_out.iter_mut().enumerate() {
        match kept.get(node.path.as_str()) {
            Some(&position) => {
                node.position = Some(position);
                occupied.insert(slot(position));
            }
            None => fresh.push(i),
        }
    }

    let reused = laid_out.len() - fresh.len();
    let step = layouter.sibling_step();
    let can_move = step.x != 0.0 || step.y != 0.0;
    let mut moved = 0usize;
    for i in fresh {
        let mut position = laid_out[i].position.unwrap_or_default();
        while can_move && occupied.contains(&slot(position)) {
            let next = Position::new(position.x + step.x, position.y + step.y);
            if slot(next) == slot(position) {
                break;
            }
            position = next;
            moved += 1;
        }
        occupied.insert(slot(position));
        laid_out[i].position = Some(position);
    }

    tracing::debug!(
        "Relayout kept {} of {} positions, {} slot moves for new nodes",
        reused,
        laid_out.len(),
        moved
    );
    laid_out
}
