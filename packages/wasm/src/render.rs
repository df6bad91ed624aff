//! Render frames handed to the host.
//!
//! A frame is a snapshot of everything visible: node cards with their world
//! and screen rectangles, edge paths, the viewport and the active tooltip. The
//! host draws it however it likes. Cards and edges outside the viewport are
//! left out.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::canvas::Viewport;
use crate::graph::{ExpansionState, NodeId, NodeKind, NodePayload, Position, TreeStore};
use crate::layout::{Bounds, Point, TreeLayout};
use crate::overlay::Tooltip;
use crate::spatial::SpatialIndex;

/// Per-frame inputs owned by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderContext {
    /// Reference image shown on the root card (data URL or plain URL).
    pub reference_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub payload: NodePayload,
    /// Top-left corner in world units.
    pub position: Position,
    pub screen: Bounds,
    pub width: f32,
    pub height: f32,
    pub expansion: ExpansionState,
    pub has_children: bool,
    pub reference_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    pub parent: NodeId,
    pub child: NodeId,
    pub from: Point,
    pub to: Point,
    /// SVG path data in world space.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
    pub viewport: Viewport,
    pub tooltip: Option<Tooltip>,
    /// Dismissible error notice, if any.
    pub notice: Option<String>,
}

impl Frame {
    /// Assemble a frame from the last layout. Nodes appear in layout order.
    ///
    /// `spatial` must hold the rectangles of the same layout; it decides which
    /// cards intersect the visible world rectangle.
    pub fn build(
        store: &TreeStore,
        layout: &TreeLayout,
        spatial: &SpatialIndex,
        viewport: &Viewport,
        tooltip: Option<Tooltip>,
        notice: Option<String>,
        context: &RenderContext,
    ) -> Self {
        let root = store.root_id();
        let visible = viewport.visible_world_rect();
        let on_screen: HashSet<NodeId> = spatial.in_rect(&visible).into_iter().collect();

        let nodes = layout
            .order
            .iter()
            .filter(|id| on_screen.contains(*id))
            .filter_map(|id| store.node(id))
            .map(|node| {
                let position = node.position();
                let min = viewport.world_to_screen(Point::new(position.x, position.y));
                let max = viewport.world_to_screen(Point::new(
                    position.x + node.width(),
                    position.y + node.height(),
                ));
                RenderNode {
                    id: node.id().clone(),
                    kind: node.kind(),
                    label: node.label().to_owned(),
                    payload: node.payload().clone(),
                    position,
                    screen: Bounds {
                        min_x: min.x,
                        min_y: min.y,
                        max_x: max.x,
                        max_y: max.y,
                    },
                    width: node.width(),
                    height: node.height(),
                    expansion: node.expansion(),
                    has_children: store.has_children(node.id()),
                    reference_image: if Some(node.id()) == root {
                        context.reference_image.clone()
                    } else {
                        None
                    },
                }
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .filter(|edge| edge_extent(edge.from, edge.to).intersects(&visible))
            .map(|edge| RenderEdge {
                parent: edge.parent.clone(),
                child: edge.child.clone(),
                from: edge.from,
                to: edge.to,
                path: edge.svg_path(),
            })
            .collect();

        Self {
            nodes,
            edges,
            viewport: *viewport,
            tooltip,
            notice,
        }
    }
}

/// Rectangle spanned by an edge's endpoints. The curve stays inside it for
/// curvature in `[0, 1]`.
fn edge_extent(from: Point, to: Point) -> Bounds {
    Bounds {
        min_x: from.x.min(to.x),
        min_y: from.y.min(to.y),
        max_x: from.x.max(to.x),
        max_y: from.y.max(to.y),
    }
}
