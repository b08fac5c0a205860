/// Geometric placement
///
/// Layers advance along the primary axis (x when horizontal, y when vertical)
/// by the tallest/widest member plus `LAYER_GAP`. Inside a layer nodes keep
/// their document order and are spread along the secondary axis, separated by
/// `LAYER_GAP` and centered on zero.

use crate::flow::types::{Edge, Node, Position};
use crate::layout::{
    assign_layers, detect_direction, node_dimensions, FlowDirection, GRID_COLUMNS, GRID_GAP_X,
    GRID_GAP_Y, LAYER_GAP,
};
use std::collections::BTreeMap;

/// Result of laying out the process graph, indexed like the input nodes
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    pub direction: FlowDirection,
    pub layers: Vec<usize>,
    pub positions: Vec<Position>,
}

/// Compute new positions for every process node without touching them
pub fn compute_layout(nodes: &[Node], edges: &[Edge]) -> LayoutPlan {
    let direction = detect_direction(edges);
    let layers = assign_layers(nodes, edges);
    let horizontal = direction.is_horizontal();

    // sparse layer numbers stay in ascending order; empty ones take no space
    let mut members: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &layer) in layers.iter().enumerate() {
        members.entry(layer).or_default().push(i);
    }

    let mut positions: Vec<Position> = nodes.iter().map(|n| n.position).collect();
    let mut primary = 0.0;

    for indices in members.values() {
        let sizes: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| {
                let dims = node_dimensions(&nodes[i].kind);
                if horizontal {
                    (dims.width, dims.height)
                } else {
                    (dims.height, dims.width)
                }
            })
            .collect();

        let max_primary = sizes.iter().map(|&(p, _)| p).fold(0.0, f64::max);
        let total_secondary =
            sizes.iter().map(|&(_, s)| s + LAYER_GAP).sum::<f64>() - LAYER_GAP;

        let mut secondary = -total_secondary / 2.0;
        for (&i, &(_, secondary_size)) in indices.iter().zip(&sizes) {
            positions[i] = if horizontal {
                Position::new(primary, secondary)
            } else {
                Position::new(secondary, primary)
            };
            secondary += secondary_size + LAYER_GAP;
        }

        primary += max_primary + LAYER_GAP;
    }

    tracing::debug!(
        "Computed {:?} layout: {} node(s) in {} layer(s)",
        direction,
        nodes.len(),
        members.len()
    );

    LayoutPlan {
        direction,
        layers,
        positions,
    }
}

/// Lay out the process graph in place and return the direction used
pub fn arrange_process(nodes: &mut [Node], edges: &[Edge]) -> FlowDirection {
    let plan = compute_layout(nodes, edges);
    for (node, position) in nodes.iter_mut().zip(plan.positions) {
        node.position = position;
    }
    plan.direction
}

/// Re-tile nodes row-major on the fixed module grid, in current order
pub fn arrange_grid(nodes: &mut [Node]) {
    for (i, node) in nodes.iter_mut().enumerate() {
        node.position = Position::new(
            (i % GRID_COLUMNS) as f64 * GRID_GAP_X,
            (i / GRID_COLUMNS) as f64 * GRID_GAP_Y,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::types::{NodeKind, Side};
    use proptest::prelude::*;
    use serde_json::Map;

    fn node(id: &str, kind: NodeKind) -> Node {
        Node::new(id.to_string(), kind, Position::new(999.0, -999.0)).unwrap()
    }

    fn edge(source: &str, target: &str, sides: (Side, Side)) -> Edge {
        Edge {
            id: format!("{}-{}", source, target),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: Some(sides.0),
            target_handle: Some(sides.1),
            label: None,
            data: None,
            extra: Map::new(),
        }
    }

    const DOWN: (Side, Side) = (Side::Bottom, Side::Top);
    const ACROSS: (Side, Side) = (Side::Right, Side::Left);

    #[test]
    fn empty_input_is_a_no_op() {
        let mut nodes: Vec<Node> = Vec::new();
        assert_eq!(arrange_process(&mut nodes, &[]), FlowDirection::Vertical);
        arrange_grid(&mut nodes);
        assert!(nodes.is_empty());
    }

    #[test]
    fn single_node_is_centered_at_origin_row() {
        let mut nodes = vec![node("a", NodeKind::Situation)];
        arrange_process(&mut nodes, &[]);
        assert_eq!(nodes[0].position, Position::new(-120.0, 0.0));
    }

    #[test]
    fn vertical_chain_with_branch() {
        // a (situation) -> b (decision) -> c (action), b -> d (end)
        let mut nodes = vec![
            node("a", NodeKind::Situation),
            node("b", NodeKind::Decision),
            node("c", NodeKind::Action),
            node("d", NodeKind::End),
        ];
        let edges = vec![edge("a", "b", DOWN), edge("b", "c", DOWN), edge("b", "d", DOWN)];

        assert_eq!(arrange_process(&mut nodes, &edges), FlowDirection::Vertical);

        // layer 0: situation 240 wide, height 100
        assert_eq!(nodes[0].position, Position::new(-120.0, 0.0));
        // layer 1 starts at 100 + 100; decision 220 wide
        assert_eq!(nodes[1].position, Position::new(-110.0, 200.0));
        // layer 2 starts at 200 + 140 + 100; widths 240 + 100 + 200 = 540
        assert_eq!(nodes[2].position, Position::new(-270.0, 440.0));
        assert_eq!(nodes[3].position, Position::new(70.0, 440.0));
    }

    #[test]
    fn horizontal_layers_advance_along_x() {
        let mut nodes = vec![
            node("a", NodeKind::Situation),
            node("b", NodeKind::Action),
            node("c", NodeKind::Action),
        ];
        let edges = vec![edge("a", "b", ACROSS), edge("a", "c", ACROSS)];

        assert_eq!(arrange_process(&mut nodes, &edges), FlowDirection::Horizontal);
        assert_eq!(nodes[0].position, Position::new(0.0, -50.0));
        // layer 1 at x = 240 + 100; heights 140 + 100 + 140 = 380
        assert_eq!(nodes[1].position, Position::new(340.0, -190.0));
        assert_eq!(nodes[2].position, Position::new(340.0, 50.0));
    }

    #[test]
    fn unknown_kind_uses_default_size() {
        let mut other = node("a", NodeKind::Situation);
        other.kind = NodeKind::Other("sticky".into());
        let mut nodes = vec![other];
        arrange_process(&mut nodes, &[]);
        assert_eq!(nodes[0].position, Position::new(-120.0, 0.0));
    }

    #[test]
    fn module_grid_is_row_major() {
        let mut nodes: Vec<Node> = (1..=7)
            .map(|i| node(&format!("node-{}", i), NodeKind::Module))
            .collect();
        arrange_grid(&mut nodes);

        let positions: Vec<(f64, f64)> = nodes.iter().map(|n| (n.position.x, n.position.y)).collect();
        assert_eq!(
            positions,
            [
                (0.0, 0.0),
                (400.0, 0.0),
                (800.0, 0.0),
                (0.0, 320.0),
                (400.0, 320.0),
                (800.0, 320.0),
                (0.0, 640.0),
            ]
        );
    }

    #[test]
    fn cyclic_graph_rows_have_no_gaps() {
        // root -> x <-> y
        let mut nodes = vec![
            node("root", NodeKind::Situation),
            node("x", NodeKind::Situation),
            node("y", NodeKind::Situation),
        ];
        let edges = vec![edge("root", "x", DOWN), edge("x", "y", DOWN), edge("y", "x", DOWN)];
        let plan = compute_layout(&nodes, &edges);
        assert_eq!(plan.layers, [0, 1, 2]);

        let mut distinct: Vec<usize> = plan.layers.clone();
        distinct.sort_unstable();
        distinct.dedup();
        let rows: Vec<f64> = {
            let mut ys: Vec<f64> = plan.positions.iter().map(|p| p.y).collect();
            ys.sort_by(f64::total_cmp);
            ys.dedup();
            ys
        };
        assert_eq!(rows.len(), distinct.len());
        for (i, y) in rows.iter().enumerate() {
            assert_eq!(*y, i as f64 * 200.0);
        }

        arrange_process(&mut nodes, &edges);
        assert_eq!(nodes.iter().map(|n| n.position).collect::<Vec<_>>(), plan.positions);
    }

    fn arb_kind() -> impl Strategy<Value = NodeKind> {
        prop_oneof![
            Just(NodeKind::Situation),
            Just(NodeKind::Action),
            Just(NodeKind::Decision),
            Just(NodeKind::End),
        ]
    }

    fn arb_side() -> impl Strategy<Value = Side> {
        prop_oneof![Just(Side::Top), Just(Side::Bottom), Just(Side::Left), Just(Side::Right)]
    }

    /// Arbitrary graph; `forward_only` restricts edges to i -> j with i < j (a DAG)
    fn arb_graph(forward_only: bool) -> impl Strategy<Value = (Vec<Node>, Vec<Edge>)> {
        prop::collection::vec(arb_kind(), 0..12).prop_flat_map(move |kinds| {
            let n = kinds.len().max(1);
            let edge_strategy = prop::collection::vec((0..n, 0..n, arb_side(), arb_side()), 0..20);
            (Just(kinds), edge_strategy).prop_map(move |(kinds, raw_edges)| {
                let nodes: Vec<Node> = kinds
                    .into_iter()
                    .enumerate()
                    .map(|(i, kind)| node(&format!("node-{}", i), kind))
                    .collect();
                let edges: Vec<Edge> = raw_edges
                    .into_iter()
                    .filter(|&(s, t, _, _)| s < nodes.len() && t < nodes.len())
                    .filter(|&(s, t, _, _)| !forward_only || s < t)
                    .map(|(s, t, a, b)| edge(&nodes[s].id, &nodes[t].id, (a, b)))
                    .collect();
                (nodes, edges)
            })
        })
    }

    proptest! {
        #[test]
        fn layout_is_idempotent_and_deterministic((nodes, edges) in arb_graph(false)) {
            let mut once = nodes.clone();
            arrange_process(&mut once, &edges);
            let mut twice = once.clone();
            arrange_process(&mut twice, &edges);
            prop_assert_eq!(&once, &twice);

            let mut again = nodes.clone();
            arrange_process(&mut again, &edges);
            prop_assert_eq!(&once, &again);
        }

        #[test]
        fn dag_layers_respect_edges((nodes, edges) in arb_graph(true)) {
            let layers = assign_layers(&nodes, &edges);
            let index: std::collections::HashMap<&str, usize> =
                nodes.iter().enumerate().map(|(i, n)| (n.id.as_str(), i)).collect();
            for e in &edges {
                let (u, v) = (index[e.source.as_str()], index[e.target.as_str()]);
                prop_assert!(layers[v] >= layers[u] + 1);
            }
        }

        #[test]
        fn cyclic_layers_stay_below_node_count((nodes, edges) in arb_graph(false)) {
            let layers = assign_layers(&nodes, &edges);
            prop_assert!(layers.iter().all(|&l| l < nodes.len().max(1)));
        }

        #[test]
        fn nodes_in_a_layer_never_overlap((nodes, edges) in arb_graph(false)) {
            let plan = compute_layout(&nodes, &edges);
            let horizontal = plan.direction.is_horizontal();
            let mut by_layer: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
            for (i, &l) in plan.layers.iter().enumerate() {
                by_layer.entry(l).or_default().push(i);
            }
            for members in by_layer.values() {
                for pair in members.windows(2) {
                    let (a, b) = (pair[0], pair[1]);
                    let size_a = node_dimensions(&nodes[a].kind);
                    let (start_a, start_b, extent_a) = if horizontal {
                        (plan.positions[a].y, plan.positions[b].y, size_a.height)
                    } else {
                        (plan.positions[a].x, plan.positions[b].x, size_a.width)
                    };
                    prop_assert!(start_b - start_a >= extent_a + LAYER_GAP - 1e-9);
                }
            }
        }
    }
}
