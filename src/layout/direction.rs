/// Flow direction detection
///
/// Re-arranging should keep the diagram flowing the way it is already drawn,
/// so the direction is read off the handle sides existing edges use.

use crate::flow::types::{Edge, Side};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    /// Layers advance down the y axis
    Vertical,
    /// Layers advance along the x axis
    Horizontal,
}

impl FlowDirection {
    pub fn is_horizontal(&self) -> bool {
        matches!(self, FlowDirection::Horizontal)
    }
}

/// Count edges touching top/bottom vs left/right handles; vertical wins ties
///
/// An edge counts toward a side class if either end uses it, so one edge may
/// count toward both.
pub fn detect_direction(edges: &[Edge]) -> FlowDirection {
    let mut vertical = 0usize;
    let mut horizontal = 0usize;

    for edge in edges {
        let sides = [edge.source_handle, edge.target_handle];
        if sides.iter().flatten().any(Side::is_vertical) {
            vertical += 1;
        }
        if sides.iter().flatten().any(Side::is_horizontal) {
            horizontal += 1;
        }
    }

    if horizontal > vertical {
        FlowDirection::Horizontal
    } else {
        FlowDirection::Vertical
    }
}
