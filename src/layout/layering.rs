/// Layer assignment for the process graph
///
/// Roots (no incoming edges) start at layer 0; a breadth-first relaxation
/// pushes every successor to at least `layer + 1`, which yields longest-path
/// layers on a DAG. Before relaxing, a depth-first walk from the roots finds
/// the edges that close a cycle (back edges) and the relaxation ignores them,
/// so a loop such as a retry edge keeps its nodes in forward order. Nodes
/// never reached (isolated, or only on a rootless cycle) sit in layer 0.
///
/// The number of dequeues stays capped at `n²`. If the cap is ever reached,
/// every node still waiting in the queue falls back to layer 0.

use crate::flow::types::{Edge, Node};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{depth_first_search, DfsEvent};
use petgraph::Direction;
use std::collections::{HashMap, HashSet, VecDeque};

/// Layer per node, indexed like `nodes`
pub fn assign_layers(nodes: &[Node], edges: &[Edge]) -> Vec<usize> {
    let graph = build_graph(nodes, edges);
    let roots: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|&idx| {
            graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_none()
        })
        .collect();
    let back = back_edges(&graph, &roots);

    let mut layers: Vec<Option<usize>> = vec![None; nodes.len()];
    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    for &root in &roots {
        layers[root.index()] = Some(0);
        queue.push_back(root);
    }

    let budget = nodes.len().saturating_mul(nodes.len()).max(1);
    let mut dequeued = 0usize;

    while let Some(idx) = queue.pop_front() {
        if dequeued == budget {
            tracing::warn!(
                "Layer relaxation budget of {} exhausted; resetting {} queued node(s) to layer 0",
                budget,
                queue.len() + 1
            );
            layers[idx.index()] = Some(0);
            for pending in queue.drain(..) {
                layers[pending.index()] = Some(0);
            }
            break;
        }
        dequeued += 1;

        let current = layers[idx.index()].unwrap_or(0);
        for target in successors(&graph, idx) {
            if back.contains(&(idx, target)) {
                continue;
            }
            let slot = &mut layers[target.index()];
            if slot.map_or(true, |existing| existing < current + 1) {
                *slot = Some(current + 1);
                queue.push_back(target);
            }
        }
    }

    layers.into_iter().map(|l| l.unwrap_or(0)).collect()
}

/// Edges that close a cycle on a depth-first walk from `roots`
///
/// Removing them leaves everything reachable from the roots acyclic.
fn back_edges(graph: &DiGraph<(), ()>, roots: &[NodeIndex]) -> HashSet<(NodeIndex, NodeIndex)> {
    let mut back = HashSet::new();
    depth_first_search(graph, roots.iter().copied(), |event| {
        if let DfsEvent::BackEdge(from, to) = event {
            back.insert((from, to));
        }
    });
    if !back.is_empty() {
        tracing::debug!("Ignoring {} cycle-closing edge(s) during layering", back.len());
    }
    back
}

/// Graph over node positions; edges with a missing endpoint are skipped
fn build_graph(nodes: &[Node], edges: &[Edge]) -> DiGraph<(), ()> {
    let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
    let mut index_of: HashMap<&str, NodeIndex> = HashMap::with_capacity(nodes.len());

    for node in nodes {
        let idx = graph.add_node(());
        index_of.entry(node.id.as_str()).or_insert(idx);
    }

    for edge in edges {
        match (index_of.get(edge.source.as_str()), index_of.get(edge.target.as_str())) {
            (Some(&from), Some(&to)) => {
                graph.add_edge(from, to, ());
            }
            _ => tracing::debug!(
                "Ignoring dangling edge '{}' ({} -> {}) during layering",
                edge.id,
                edge.source,
                edge.target
            ),
        }
    }

    graph
}

/// Outgoing neighbors in edge insertion order
fn successors(graph: &DiGraph<(), ()>, idx: NodeIndex) -> Vec<NodeIndex> {
    // petgraph walks an adjacency list newest-first
    let mut targets: Vec<NodeIndex> = graph.neighbors_directed(idx, Direction::Outgoing).collect();
    targets.reverse();
    targets
}
