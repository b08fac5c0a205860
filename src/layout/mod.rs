/// Automatic diagram layout
///
/// Two on-demand arrangement modes:
/// - process graph: direction detection, longest-path layering over a petgraph
///   DiGraph, then centered placement of each layer
/// - module graph: a fixed three-column grid in current node order
///
/// Both modes are pure functions of node order, node kinds and the edge set;
/// every position is recomputed and prior coordinates are discarded.

// Flow direction heuristic from edge handle sides
pub mod direction;

// Layer assignment (BFS relaxation with a bounded budget)
pub mod layering;

// Geometric placement for layers and the module grid
pub mod placement;

pub use direction::{detect_direction, FlowDirection};
pub use layering::assign_layers;
pub use placement::{arrange_grid, arrange_process, compute_layout, LayoutPlan};

use crate::flow::types::NodeKind;

/// Spacing between nodes inside a layer and between layers
pub const LAYER_GAP: f64 = 100.0;

/// Module grid geometry
pub const GRID_COLUMNS: usize = 3;
pub const GRID_GAP_X: f64 = 400.0;
pub const GRID_GAP_Y: f64 = 320.0;

/// Nominal rendered size of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Nominal size per node kind; unknown kinds use the situation size
pub fn node_dimensions(kind: &NodeKind) -> Dimensions {
    match kind {
        NodeKind::Situation => Dimensions::new(240.0, 100.0),
        NodeKind::Action => Dimensions::new(240.0, 140.0),
        NodeKind::Decision => Dimensions::new(220.0, 140.0),
        NodeKind::End => Dimensions::new(200.0, 100.0),
        NodeKind::Module => Dimensions::new(340.0, 250.0),
        NodeKind::Other(_) => Dimensions::new(240.0, 100.0),
    }
}
