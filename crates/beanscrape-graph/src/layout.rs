//! Deterministic force-directed placement.
//!
//! Nodes start on a circle in insertion order and the simulation runs a
//! fixed number of steps, so the same graph always lands in the same place.

use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::graph::FlavorGraph;

/// Layout tuning
#[derive(Debug, Clone)]
pub struct LayoutParams {
    /// Simulation steps
    pub iterations: u32,
    /// Seconds advanced per step
    pub time_step: f32,
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Space kept free around the placed nodes
    pub margin: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            iterations: 400,
            time_step: 0.016,
            width: 1600.0,
            height: 1200.0,
            margin: 90.0,
        }
    }
}

/// A node with its canvas position
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    /// Flavor name
    pub name: String,
    /// Fill color
    pub color: String,
    /// Canvas x
    pub x: f64,
    /// Canvas y
    pub y: f64,
}

/// Positions for every node of a graph, fitted to the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Nodes in graph insertion order
    pub nodes: Vec<PlacedNode>,
    /// Edges as positions into `nodes`
    pub edges: Vec<(usize, usize)>,
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
}

/// Run the force simulation over `graph` and fit the result to the canvas
pub fn force_layout(graph: &FlavorGraph, params: &LayoutParams) -> Layout {
    let count = graph.node_count();
    let mut sim: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
        force_charge: 150.0,
        force_spring: 0.05,
        force_max: 100.0,
        node_speed: 3000.0,
        damping_factor: 0.9,
    });

    let seed_radius = 100.0 + 10.0 * count as f64;
    let handles: Vec<_> = (0..count)
        .map(|i| {
            let angle = (i as f64) * 2.0 * PI / count as f64;
            sim.add_node(NodeData {
                x: (seed_radius * angle.cos()) as f32,
                y: (seed_radius * angle.sin()) as f32,
                mass: 10.0,
                is_anchor: false,
                user_data: i,
            })
        })
        .collect();

    let edges: Vec<(usize, usize)> = graph.edges().map(|(a, b, _)| (a, b)).collect();
    for &(a, b) in &edges {
        sim.add_edge(handles[a], handles[b], EdgeData::default());
    }

    for _ in 0..params.iterations {
        sim.update(params.time_step);
    }

    let mut raw = vec![(0.0_f64, 0.0_f64); count];
    sim.visit_nodes(|node| {
        raw[node.data.user_data] = (node.x() as f64, node.y() as f64);
    });

    let fitted = fit_to_canvas(&raw, params);
    let nodes = graph
        .nodes()
        .zip(fitted)
        .map(|(node, (x, y))| PlacedNode {
            name: node.name.clone(),
            color: node.color.clone(),
            x,
            y,
        })
        .collect();

    Layout {
        nodes,
        edges,
        width: params.width,
        height: params.height,
    }
}

/// Scale and translate `points` into the canvas, keeping the aspect ratio
fn fit_to_canvas(points: &[(f64, f64)], params: &LayoutParams) -> Vec<(f64, f64)> {
    let (cx, cy) = (params.width / 2.0, params.height / 2.0);
    let finite = points.iter().all(|(x, y)| x.is_finite() && y.is_finite());
    if points.is_empty() || !finite {
        return vec![(cx, cy); points.len()];
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in points {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }

    let (span_x, span_y) = (max_x - min_x, max_y - min_y);
    let avail_x = (params.width - 2.0 * params.margin).max(0.0);
    let avail_y = (params.height - 2.0 * params.margin).max(0.0);
    let scale = match (span_x > f64::EPSILON, span_y > f64::EPSILON) {
        (true, true) => (avail_x / span_x).min(avail_y / span_y),
        (true, false) => avail_x / span_x,
        (false, true) => avail_y / span_y,
        (false, false) => 0.0,
    };

    let (mid_x, mid_y) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);
    points
        .iter()
        .map(|&(x, y)| (cx + (x - mid_x) * scale, cy + (y - mid_y) * scale))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_from_rows, CombinationRow};
    use crate::lookup::BeanLookup;
    use crate::tags::LiteralListParser;

    fn sample_graph() -> FlavorGraph {
        let lookup: BeanLookup = [
            ("choc", "#000"),
            ("mint", "#fff"),
            ("lime", "#0f0"),
            ("pear", "#ee0"),
        ]
        .into_iter()
        .collect();
        let rows = [
            CombinationRow::new("1", "A", "['choc','mint','lime']"),
            CombinationRow::new("2", "B", "['pear','lime']"),
        ];
        build_from_rows(&rows, &lookup, &LiteralListParser).graph
    }

    #[test]
    fn test_layout_is_deterministic() {
        let graph = sample_graph();
        let params = LayoutParams::default();
        assert_eq!(force_layout(&graph, &params), force_layout(&graph, &params));
    }

    #[test]
    fn test_nodes_fit_inside_canvas() {
        let params = LayoutParams::default();
        let layout = force_layout(&sample_graph(), &params);

        assert_eq!(layout.nodes.len(), 4);
        assert_eq!(layout.edges.len(), 4);
        for node in &layout.nodes {
            let (lo, eps) = (params.margin, 1e-6);
            assert!(node.x >= lo - eps && node.x <= params.width - lo + eps);
            assert!(node.y >= lo - eps && node.y <= params.height - lo + eps);
        }
    }

    #[test]
    fn test_empty_and_single_node_graphs() {
        let params = LayoutParams::default();
        assert!(force_layout(&FlavorGraph::new(), &params).nodes.is_empty());

        let mut graph = FlavorGraph::new();
        graph.ensure_node("choc", "#000");
        let layout = force_layout(&graph, &params);
        assert_eq!((layout.nodes[0].x, layout.nodes[0].y), (800.0, 600.0));
    }
}
