//! Hover tracking and tooltip content.
//!
//! The facade hit-tests the pointer against the spatial index and reports the
//! result here; the overlay remembers the hovered node and builds its tooltip
//! on demand, so the tooltip always reflects the node's current payload.

use serde::Serialize;

use crate::canvas::Viewport;
use crate::graph::{NodeId, NodeKind, StrategyNode, TreeStore};
use crate::layout::Point;

/// Screen-space gap between a node's right edge and its tooltip.
const TOOLTIP_GAP: f32 = 12.0;

/// Tooltip content for the hovered node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub node_id: NodeId,
    pub kind: NodeKind,
    pub title: String,
    pub lines: Vec<String>,
    /// Top-left corner of the tooltip, in screen pixels.
    pub anchor: Point,
}

impl Tooltip {
    pub fn for_node(node: &StrategyNode, viewport: &Viewport) -> Self {
        let position = node.position();
        let edge = viewport.world_to_screen(Point::new(position.x + node.width(), position.y));
        Self {
            node_id: node.id().clone(),
            kind: node.kind(),
            title: node.label().to_owned(),
            lines: node.payload().summary_lines(),
            anchor: Point::new(edge.x + TOOLTIP_GAP, edge.y),
        }
    }
}

#[derive(Debug, Default)]
pub struct HoverOverlay {
    hovered: Option<NodeId>,
}

impl HoverOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<&NodeId> {
        self.hovered.as_ref()
    }

    /// Record the node under the pointer. Returns true if it changed.
    pub fn update(&mut self, hit: Option<NodeId>) -> bool {
        if self.hovered == hit {
            return false;
        }
        self.hovered = hit;
        true
    }

    pub fn clear(&mut self) {
        self.hovered = None;
    }

    /// Tooltip for the hovered node, if it still exists and is visible.
    pub fn tooltip(&self, store: &TreeStore, viewport: &Viewport) -> Option<Tooltip> {
        let id = self.hovered.as_ref()?;
        if !store.is_visible(id) {
            return None;
        }
        store.node(id).map(|node| Tooltip::for_node(node, viewport))
    }
}
