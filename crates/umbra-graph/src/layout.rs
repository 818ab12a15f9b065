use crate::graph::{GraphModel, NodeIndex, Rect, Vec2};
use crate::style::{EdgeStyle, NodeStyle, get_node_style};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use umbra_core::{GraphEdge, GraphNode, LayoutDirection, NodeId};

pub trait Layouter {
    fn execute(&self, model: &GraphModel) -> LayoutResult;
}

/// Places the nodes of a macro graph. Returns one *center* per node, in the
/// order of `MacroGraph::nodes`.
pub trait MacroLayouter {
    fn place(&self, graph: &MacroGraph) -> Vec<Vec2>;
}

/// Card and container metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub card_width: f32,
    pub card_height: f32,
    pub padding_x: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub card_gap: f32,
    pub min_file_height: f32,
    /// Space between neighbours in the same rank
    pub node_separation: f32,
    /// Space between ranks
    pub rank_separation: f32,
    pub direction: LayoutDirection,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            card_width: 280.0,
            card_height: 90.0,
            padding_x: 24.0,
            padding_top: 50.0,
            padding_bottom: 24.0,
            card_gap: 25.0,
            min_file_height: 140.0,
            node_separation: 100.0,
            rank_separation: 250.0,
            direction: LayoutDirection::Horizontal,
        }
    }
}

impl LayoutConfig {
    pub fn card_size(&self) -> Vec2 {
        Vec2::new(self.card_width, self.card_height)
    }

    fn row_pitch(&self) -> f32 {
        self.card_height + self.card_gap
    }

    /// Container size for a file holding `child_count` cards.
    pub fn file_size(&self, child_count: usize) -> Vec2 {
        let width = self.card_width + self.padding_x * 2.0;
        let height =
            self.padding_top + child_count as f32 * self.row_pitch() + self.padding_bottom;
        Vec2::new(width, height.max(self.min_file_height))
    }

    /// Offset of the `index`-th card from its container's top-left corner.
    pub fn child_offset(&self, index: usize) -> Vec2 {
        Vec2::new(
            self.padding_x,
            self.padding_top + index as f32 * self.row_pitch(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "space", content = "parent")]
pub enum CoordinateSpace {
    Global,
    /// Relative to the top-left corner of the named container.
    ParentLocal(NodeId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub node: GraphNode,
    pub position: Vec2,
    pub size: Vec2,
    pub space: CoordinateSpace,
    pub z_index: i32,
    pub style: NodeStyle,
}

impl PositionedNode {
    pub fn local_rect(&self) -> Rect {
        Rect::from_pos_size(self.position, self.size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledEdge {
    pub edge: GraphEdge,
    pub style: EdgeStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<StyledEdge>,
    /// Global extent of everything that was placed.
    pub bounds: Rect,
}

impl LayoutResult {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| &n.node.id == id)
    }
}

#[derive(Debug, Clone)]
pub struct MacroNode {
    /// Stable key used for tie-breaking inside a rank.
    pub key: NodeId,
    pub size: Vec2,
}

/// Files as single units plus the file-to-file edges between them.
#[derive(Debug, Clone, Default)]
pub struct MacroGraph {
    pub nodes: Vec<MacroNode>,
    /// Indices into `nodes`; may contain duplicates and cycles.
    pub edges: Vec<(usize, usize)>,
}

impl MacroGraph {
    pub fn from_model(model: &GraphModel, sizes: &[Vec2]) -> Self {
        let slot: HashMap<NodeIndex, usize> = model
            .files()
            .iter()
            .enumerate()
            .map(|(i, &idx)| (idx, i))
            .collect();
        let nodes = model
            .files()
            .iter()
            .zip(sizes)
            .map(|(&idx, &size)| MacroNode {
                key: model[idx].id.clone(),
                size,
            })
            .collect();
        let edges = model
            .macro_edges()
            .into_iter()
            .filter_map(|(s, t)| Some((*slot.get(&s)?, *slot.get(&t)?)))
            .collect();
        Self { nodes, edges }
    }
}

/// Layered placement: cycle breaking, longest-path ranking, barycenter
/// ordering, then coordinate assignment.
#[derive(Debug, Clone)]
pub struct LayeredLayouter {
    pub node_separation: f32,
    pub rank_separation: f32,
    pub direction: LayoutDirection,
}

impl LayeredLayouter {
    const BARYCENTER_SWEEPS: usize = 4;

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self {
            node_separation: config.node_separation,
            rank_separation: config.rank_separation,
            direction: config.direction,
        }
    }

    fn rank_extent(&self, size: Vec2) -> f32 {
        match self.direction {
            LayoutDirection::Horizontal => size.x,
            LayoutDirection::Vertical => size.y,
        }
    }

    fn cross_extent(&self, size: Vec2) -> f32 {
        match self.direction {
            LayoutDirection::Horizontal => size.y,
            LayoutDirection::Vertical => size.x,
        }
    }

    fn assign_ranks(node_count: usize, dag: &[(usize, usize)]) -> Vec<usize> {
        let mut successors = vec![Vec::new(); node_count];
        let mut in_degree = vec![0usize; node_count];
        for &(s, t) in dag {
            successors[s].push(t);
            in_degree[t] += 1;
        }

        let mut ranks = vec![0usize; node_count];
        let mut queue: VecDeque<usize> = (0..node_count).filter(|&v| in_degree[v] == 0).collect();
        let mut visited = 0;
        while let Some(v) = queue.pop_front() {
            visited += 1;
            for &t in &successors[v] {
                ranks[t] = ranks[t].max(ranks[v] + 1);
                in_degree[t] -= 1;
                if in_degree[t] == 0 {
                    queue.push_back(t);
                }
            }
        }

        if visited != node_count {
            tracing::warn!(
                "Rank assignment reached {} of {} files; remaining files stay in rank 0",
                visited,
                node_count
            );
        }
        ranks
    }

    fn build_layers(graph: &MacroGraph, ranks: &[usize]) -> Vec<Vec<usize>> {
        let layer_count = ranks.iter().copied().max().map_or(0, |r| r + 1);
        let mut layers = vec![Vec::new(); layer_count];
        for (node, &rank) in ranks.iter().enumerate() {
            layers[rank].push(node);
        }
        for layer in &mut layers {
            layer.sort_by(|a, b| graph.nodes[*a].key.cmp(&graph.nodes[*b].key));
        }
        layers
    }

    fn order_layer_by_barycenter(
        layer: &mut [usize],
        coords: &[f32],
        neighbors: &[Vec<usize>],
    ) {
        let barycenters: HashMap<usize, f32> = layer
            .iter()
            .map(|&node| {
                let around = &neighbors[node];
                let value = if around.is_empty() {
                    coords[node]
                } else {
                    around.iter().map(|&n| coords[n]).sum::<f32>() / around.len() as f32
                };
                (node, value)
            })
            .collect();

        // Stable sort keeps the previous order for equal barycenters.
        layer.sort_by(|a, b| {
            barycenters[a]
                .partial_cmp(&barycenters[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    fn run_barycenter_passes(layers: &mut [Vec<usize>], dag: &[(usize, usize)], node_count: usize) {
        let mut incoming = vec![Vec::new(); node_count];
        let mut outgoing = vec![Vec::new(); node_count];
        for &(s, t) in dag {
            outgoing[s].push(t);
            incoming[t].push(s);
        }

        let mut coords = vec![0.0f32; node_count];
        let reindex = |layer: &[usize], coords: &mut [f32]| {
            for (j, &node) in layer.iter().enumerate() {
                coords[node] = j as f32;
            }
        };
        for layer in layers.iter() {
            reindex(layer, &mut coords);
        }

        for _ in 0..Self::BARYCENTER_SWEEPS {
            for layer in layers.iter_mut().skip(1) {
                Self::order_layer_by_barycenter(layer, &coords, &incoming);
                reindex(layer, &mut coords);
            }
            let upper = layers.len().saturating_sub(1);
            for layer in layers[..upper].iter_mut().rev() {
                Self::order_layer_by_barycenter(layer, &coords, &outgoing);
                reindex(layer, &mut coords);
            }
        }
    }

    fn assign_coordinates(&self, graph: &MacroGraph, layers: &[Vec<usize>]) -> Vec<Vec2> {
        let mut centers = vec![Vec2::ZERO; graph.nodes.len()];
        let mut rank_offset = 0.0f32;

        for layer in layers {
            let depth = layer
                .iter()
                .map(|&n| self.rank_extent(graph.nodes[n].size))
                .fold(0.0f32, f32::max);
            let breadth: f32 = layer
                .iter()
                .map(|&n| self.cross_extent(graph.nodes[n].size))
                .sum::<f32>()
                + layer.len().saturating_sub(1) as f32 * self.node_separation;

            let rank_center = rank_offset + depth / 2.0;
            let mut cross = -breadth / 2.0;
            for &node in layer {
                let extent = self.cross_extent(graph.nodes[node].size);
                let cross_center = cross + extent / 2.0;
                centers[node] = match self.direction {
                    LayoutDirection::Horizontal => Vec2::new(rank_center, cross_center),
                    LayoutDirection::Vertical => Vec2::new(cross_center, rank_center),
                };
                cross += extent + self.node_separation;
            }

            rank_offset += depth + self.rank_separation;
        }

        // Shift so the top-left corner of the drawing sits at the origin.
        let min_x = graph
            .nodes
            .iter()
            .zip(&centers)
            .map(|(n, c)| c.x - n.size.x / 2.0)
            .fold(f32::INFINITY, f32::min);
        let min_y = graph
            .nodes
            .iter()
            .zip(&centers)
            .map(|(n, c)| c.y - n.size.y / 2.0)
            .fold(f32::INFINITY, f32::min);
        let shift = Vec2::new(min_x, min_y);
        centers.into_iter().map(|c| c - shift).collect()
    }
}

impl MacroLayouter for LayeredLayouter {
    fn place(&self, graph: &MacroGraph) -> Vec<Vec2> {
        let node_count = graph.nodes.len();
        if node_count == 0 {
            return Vec::new();
        }

        let edges: Vec<(usize, usize)> = graph
            .edges
            .iter()
            .copied()
            .filter(|(s, t)| s != t && *s < node_count && *t < node_count)
            .collect();
        let dag = remove_cycles(node_count, &edges);
        let ranks = Self::assign_ranks(node_count, &dag);
        let mut layers = Self::build_layers(graph, &ranks);
        Self::run_barycenter_passes(&mut layers, &dag, node_count);

        tracing::debug!(
            "Layered {} files into {} ranks ({} macro edges, {} reversed)",
            node_count,
            layers.len(),
            edges.len(),
            edges.iter().zip(&dag).filter(|(a, b)| a != b).count()
        );

        self.assign_coordinates(graph, &layers)
    }
}

struct FasState {
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    in_degree: Vec<i64>,
    out_degree: Vec<i64>,
    active: Vec<bool>,
    remaining: usize,
}

impl FasState {
    fn new(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut successors = vec![Vec::new(); node_count];
        let mut predecessors = vec![Vec::new(); node_count];
        for &(s, t) in edges {
            successors[s].push(t);
            predecessors[t].push(s);
        }
        let out_degree = successors.iter().map(|v| v.len() as i64).collect();
        let in_degree = predecessors.iter().map(|v| v.len() as i64).collect();
        Self {
            successors,
            predecessors,
            in_degree,
            out_degree,
            active: vec![true; node_count],
            remaining: node_count,
        }
    }

    fn detach(&mut self, node: usize) {
        self.active[node] = false;
        self.remaining -= 1;
        for &succ in &self.successors[node] {
            if self.active[succ] {
                self.in_degree[succ] -= 1;
            }
        }
        for &pred in &self.predecessors[node] {
            if self.active[pred] {
                self.out_degree[pred] -= 1;
            }
        }
    }

    fn active_where(&self, pred: impl Fn(usize) -> bool) -> Vec<usize> {
        (0..self.active.len())
            .filter(|&v| self.active[v] && pred(v))
            .collect()
    }
}

/// Greedy feedback-arc-set ordering (Eades et al.). Ties resolve to the lowest
/// index so the ordering is reproducible.
fn greedy_fas_ordering(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut state = FasState::new(node_count, edges);
    let mut head = Vec::with_capacity(node_count);
    let mut tail = Vec::new();

    while state.remaining > 0 {
        loop {
            let sinks = state.active_where(|v| state.out_degree[v] == 0);
            if sinks.is_empty() {
                break;
            }
            for sink in sinks {
                state.detach(sink);
                tail.push(sink);
            }
        }

        loop {
            let sources = state.active_where(|v| state.in_degree[v] == 0);
            if sources.is_empty() {
                break;
            }
            for source in sources {
                state.detach(source);
                head.push(source);
            }
        }

        if state.remaining > 0 {
            let best = (0..node_count)
                .filter(|&v| state.active[v])
                .max_by_key(|&v| (state.out_degree[v] - state.in_degree[v], Reverse(v)));
            if let Some(best) = best {
                state.detach(best);
                head.push(best);
            }
        }
    }

    tail.reverse();
    head.extend(tail);
    head
}

/// Reverses every edge that points backwards in the greedy FAS ordering.
/// The result has the same length and order as `edges`.
fn remove_cycles(node_count: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let ordering = greedy_fas_ordering(node_count, edges);
    let mut position = vec![0usize; node_count];
    for (i, &node) in ordering.iter().enumerate() {
        position[node] = i;
    }
    edges
        .iter()
        .map(|&(s, t)| if position[s] > position[t] { (t, s) } else { (s, t) })
        .collect()
}

/// Two-level layout: files are placed by a [`MacroLayouter`], their members are
/// stacked inside them in input order.
pub struct NestingLayouter<M = LayeredLayouter> {
    pub config: LayoutConfig,
    pub macro_layouter: M,
}

impl NestingLayouter<LayeredLayouter> {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            macro_layouter: LayeredLayouter::from_config(&config),
            config,
        }
    }
}

impl Default for NestingLayouter<LayeredLayouter> {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl<M: MacroLayouter> NestingLayouter<M> {
    fn file_sizes(&self, model: &GraphModel) -> Vec<Vec2> {
        let config = &self.config;
        model
            .files()
            .par_iter()
            .map(|&file| config.file_size(model.children_of(file).len()))
            .collect()
    }

    fn place_files(&self, model: &GraphModel, sizes: &[Vec2]) -> HashMap<NodeIndex, Rect> {
        let macro_graph = MacroGraph::from_model(model, sizes);
        let centers = self.macro_layouter.place(&macro_graph);

        model
            .files()
            .iter()
            .zip(sizes)
            .enumerate()
            .map(|(i, (&file, &size))| {
                let center = centers.get(i).copied().unwrap_or_else(|| {
                    tracing::warn!("No position for file {}; using origin", model[file].id);
                    size.half()
                });
                (file, Rect::from_pos_size(center - size.half(), size))
            })
            .collect()
    }

    /// Members without a container go in a column under the diagram.
    fn place_orphans(&self, model: &GraphModel, bounds: Option<Rect>) -> HashMap<NodeIndex, Rect> {
        let origin = match bounds {
            Some(b) => Vec2::new(b.min.x, b.max.y + self.config.node_separation),
            None => Vec2::ZERO,
        };
        model
            .orphans()
            .iter()
            .enumerate()
            .map(|(i, &idx)| {
                let pos = origin + Vec2::new(0.0, i as f32 * self.config.row_pitch());
                (idx, Rect::from_pos_size(pos, self.config.card_size()))
            })
            .collect()
    }
}

impl<M: MacroLayouter> Layouter for NestingLayouter<M> {
    fn execute(&self, model: &GraphModel) -> LayoutResult {
        if model.is_empty() {
            return LayoutResult::default();
        }

        let sizes = self.file_sizes(model);
        let file_rects = self.place_files(model, &sizes);
        let file_bounds = file_rects.values().copied().reduce(|a, b| a.union(&b));
        let orphan_rects = self.place_orphans(model, file_bounds);
        let bounds = orphan_rects
            .values()
            .copied()
            .fold(file_bounds, |acc, r| Some(acc.map_or(r, |a| a.union(&r))))
            .unwrap_or_default();

        let mut slots: HashMap<NodeIndex, (NodeIndex, usize)> = HashMap::new();
        for &file in model.files() {
            for (i, &child) in model.children_of(file).iter().enumerate() {
                slots.insert(child, (file, i));
            }
        }

        let nodes = model
            .node_indices()
            .map(|idx| {
                let node = model[idx].clone();
                let style = get_node_style(node.kind);
                if let Some(rect) = file_rects.get(&idx) {
                    PositionedNode {
                        node,
                        position: rect.min,
                        size: rect.max - rect.min,
                        space: CoordinateSpace::Global,
                        z_index: style.z_index,
                        style,
                    }
                } else if let Some(&(file, slot)) = slots.get(&idx) {
                    PositionedNode {
                        node,
                        position: self.config.child_offset(slot),
                        size: self.config.card_size(),
                        space: CoordinateSpace::ParentLocal(model[file].id.clone()),
                        z_index: style.z_index,
                        style,
                    }
                } else {
                    let rect = orphan_rects.get(&idx).copied().unwrap_or_default();
                    PositionedNode {
                        node,
                        position: rect.min,
                        size: self.config.card_size(),
                        space: CoordinateSpace::Global,
                        z_index: style.z_index,
                        style,
                    }
                }
            })
            .collect();

        let edges = model
            .edges()
            .iter()
            .map(|edge| StyledEdge {
                edge: edge.clone(),
                style: EdgeStyle::neutral(),
            })
            .collect();

        tracing::debug!(
            "Layout complete: {} nodes ({} files, {} orphans), {} edges",
            model.node_count(),
            model.files().len(),
            model.orphans().len(),
            model.edge_count()
        );

        LayoutResult {
            nodes,
            edges,
            bounds,
        }
    }
}

/// Lays out classified nodes with the default metrics.
pub fn layout(nodes: &[GraphNode], edges: &[GraphEdge]) -> LayoutResult {
    layout_with(&LayoutConfig::default(), nodes, edges)
}

pub fn layout_with(config: &LayoutConfig, nodes: &[GraphNode], edges: &[GraphEdge]) -> LayoutResult {
    let model = GraphModel::new(nodes.to_vec(), edges.to_vec());
    NestingLayouter::new(*config).execute(&model)
}
