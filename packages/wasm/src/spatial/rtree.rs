//! R-tree based spatial index using the rstar crate.
//!
//! Nodes are indexed by their laid-out rectangles, giving O(log n):
//! - Point hit tests (which card is under the pointer)
//! - Rectangle intersection (which cards are on screen)

use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::graph::NodeId;
use crate::layout::Bounds;

/// A node rectangle in the spatial index.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRect {
    pub id: NodeId,
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl NodeRect {
    pub fn new(id: NodeId, bounds: Bounds) -> Self {
        Self {
            id,
            min: [bounds.min_x, bounds.min_y],
            max: [bounds.max_x, bounds.max_y],
        }
    }

    fn area(&self) -> f32 {
        (self.max[0] - self.min[0]) * (self.max[1] - self.min[1])
    }
}

impl RTreeObject for NodeRect {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.min, self.max)
    }
}

impl PointDistance for NodeRect {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = (self.min[0] - point[0]).max(point[0] - self.max[0]).max(0.0);
        let dy = (self.min[1] - point[1]).max(point[1] - self.max[1]).max(0.0);
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f32; 2]) -> bool {
        point[0] >= self.min[0]
            && point[0] <= self.max[0]
            && point[1] >= self.min[1]
            && point[1] <= self.max[1]
    }
}

/// Spatial index over node rectangles.
pub struct SpatialIndex {
    tree: RTree<NodeRect>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// The node whose rectangle contains the point.
    ///
    /// Cards do not overlap after layout; if they ever do, the smallest one
    /// wins so a small card drawn over a large one stays reachable.
    pub fn at_point(&self, x: f32, y: f32) -> Option<NodeId> {
        self.tree
            .locate_all_at_point(&[x, y])
            .min_by(|a, b| a.area().total_cmp(&b.area()).then_with(|| a.id.cmp(&b.id)))
            .map(|rect| rect.id.clone())
    }

    /// All nodes whose rectangle intersects `rect`, sorted by id.
    pub fn in_rect(&self, rect: &Bounds) -> Vec<NodeId> {
        let envelope = AABB::from_corners([rect.min_x, rect.min_y], [rect.max_x, rect.max_y]);
        let mut ids: Vec<NodeId> = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|rect| rect.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Rebuild the index from a list of node rectangles.
    ///
    /// This is more efficient than incremental inserts for bulk updates.
    pub fn rebuild(&mut self, rects: Vec<(NodeId, Bounds)>) {
        let rects: Vec<NodeRect> = rects
            .into_iter()
            .map(|(id, bounds)| NodeRect::new(id, bounds))
            .collect();
        self.tree = RTree::bulk_load(rects);
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
