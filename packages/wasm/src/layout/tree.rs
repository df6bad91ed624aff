//! Horizontal mind-map layout for the strategy tree.
//!
//! The root sits on the left and each level fans out to the right. Layout is
//! a pure function of the store snapshot and the config.
//!
//! # Algorithm Overview
//!
//! 1. **Height pass (bottom-up):** a collapsed or childless node occupies its
//!    own height. An expanded node occupies `max(own height, content)`, where
//!    content stacks the regular children's subtree heights with the parent
//!    kind's vertical spacing, then the creative grid below them.
//! 2. **Position pass (top-down):** children sit one column to the right of
//!    their parent and their block is centered on the parent's center. Each
//!    regular child is centered in its band; creatives tile a fixed-width
//!    grid, row by row.
//!
//! Nodes below a collapsed ancestor are skipped entirely: they keep their
//! stale positions and do not contribute height.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::edges::{EdgeCurve, Point};
use crate::graph::{NodeId, NodeKind, Position, StrategyNode, TreeStore};

/// Configuration for the tree layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// World x of the root's left edge.
    pub anchor_x: f32,
    /// World y of the root's vertical center.
    pub anchor_y: f32,
    /// Gap between a parent's right edge and its children's left edge.
    pub horizontal_gap: f32,
    /// Gap between sibling subtrees.
    pub vertical_gap: f32,
    /// Sibling gap under static-enumeration parents (offer, trigger, format),
    /// whose many small children would otherwise spread too far.
    pub compact_vertical_gap: f32,
    pub creative_columns: usize,
    pub creative_column_gap: f32,
    pub creative_row_spacing: f32,
    /// Gap between the regular children block and the creative grid.
    pub creative_group_gap: f32,
    /// Horizontal control-point offset of edges, as a fraction of their span.
    pub edge_curvature: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            anchor_x: 100.0,
            anchor_y: 400.0,
            horizontal_gap: 120.0,
            vertical_gap: 40.0,
            compact_vertical_gap: 16.0,
            creative_columns: 3,
            creative_column_gap: 20.0,
            creative_row_spacing: 20.0,
            creative_group_gap: 40.0,
            edge_curvature: 0.5,
        }
    }
}

impl LayoutConfig {
    /// Distance from a parent's x to its children's x.
    pub fn horizontal_spacing(&self, parent: NodeKind) -> f32 {
        parent.size().0 + self.horizontal_gap
    }

    /// Gap between consecutive regular children of `parent`.
    pub fn vertical_spacing(&self, parent: NodeKind) -> f32 {
        match parent {
            NodeKind::Offer | NodeKind::Trigger | NodeKind::Format => self.compact_vertical_gap,
            _ => self.vertical_gap,
        }
    }

    fn columns(&self) -> usize {
        self.creative_columns.max(1)
    }
}

/// Axis-aligned world rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn of_node(position: Position, width: f32, height: f32) -> Self {
        Self {
            min_x: position.x,
            min_y: position.y,
            max_x: position.x + width,
            max_y: position.y + height,
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Whether the two rectangles overlap, edges included.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// Result of a layout pass.
#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    /// Top-left corner of every visible node.
    pub positions: BTreeMap<NodeId, Position>,
    /// Vertical extent of every visible node's subtree.
    pub subtree_heights: BTreeMap<NodeId, f32>,
    /// Visible nodes in pre-order.
    pub order: Vec<NodeId>,
    pub edges: Vec<EdgeCurve>,
    /// World extent of all visible nodes, `None` for an empty tree.
    pub bounds: Option<Bounds>,
}

impl TreeLayout {
    pub fn position(&self, id: &NodeId) -> Option<Position> {
        self.positions.get(id).copied()
    }

    pub fn subtree_height(&self, id: &NodeId) -> Option<f32> {
        self.subtree_heights.get(id).copied()
    }
}

/// Lay out every node reachable from the root through expanded ancestors.
pub fn layout(store: &TreeStore, config: &LayoutConfig) -> TreeLayout {
    let mut result = TreeLayout::default();
    let Some(root) = store.root() else {
        return result;
    };

    let mut pass = Pass {
        store,
        config,
        out: &mut result,
    };
    pass.measure(root);
    pass.place(root, config.anchor_x, config.anchor_y);
    result
}

/// Visible children of `node` split into (regular, creative).
fn visible_children<'a>(
    store: &'a TreeStore,
    node: &StrategyNode,
) -> (Vec<&'a StrategyNode>, Vec<&'a StrategyNode>) {
    if !node.is_expanded() {
        return (Vec::new(), Vec::new());
    }
    store
        .children(node.id())
        .into_iter()
        .partition(|child| child.kind() != NodeKind::CreativeResult)
}

struct Pass<'a> {
    store: &'a TreeStore,
    config: &'a LayoutConfig,
    out: &'a mut TreeLayout,
}

impl Pass<'_> {
    // =========================================================================
    // Height pass
    // =========================================================================

    fn measure(&mut self, node: &StrategyNode) -> f32 {
        let (regular, creatives) = visible_children(self.store, node);
        let content = self.content_height(node.kind(), &regular, &creatives);
        let height = node.height().max(content);
        self.out.subtree_heights.insert(node.id().clone(), height);
        height
    }

    /// Height of the children block, measuring each child on the way.
    fn content_height(
        &mut self,
        kind: NodeKind,
        regular: &[&StrategyNode],
        creatives: &[&StrategyNode],
    ) -> f32 {
        let mut stacked = 0.0;
        for (i, child) in regular.iter().enumerate() {
            if i > 0 {
                stacked += self.config.vertical_spacing(kind);
            }
            stacked += self.measure(child);
        }

        let grid = self.grid_height(creatives);
        for child in creatives {
            self.measure(child);
        }

        match (regular.is_empty(), creatives.is_empty()) {
            (false, false) => stacked + self.config.creative_group_gap + grid,
            (false, true) => stacked,
            (true, false) => grid,
            (true, true) => 0.0,
        }
    }

    fn grid_height(&self, creatives: &[&StrategyNode]) -> f32 {
        if creatives.is_empty() {
            return 0.0;
        }
        let rows = creatives.len().div_ceil(self.config.columns());
        let cell = creative_cell_height(creatives);
        rows as f32 * cell + (rows - 1) as f32 * self.config.creative_row_spacing
    }

    // =========================================================================
    // Position pass
    // =========================================================================

    /// Place `node` with its left edge at `x` and vertical center at `center_y`.
    fn place(&mut self, node: &StrategyNode, x: f32, center_y: f32) {
        let position = Position::new(x, center_y - node.height() / 2.0);
        self.record(node, position);

        let (regular, creatives) = visible_children(self.store, node);
        if regular.is_empty() && creatives.is_empty() {
            return;
        }

        let kind = node.kind();
        let child_x = x + self.config.horizontal_spacing(kind);
        let exit = Point::new(x + node.width(), center_y);

        let block = self.block_height(kind, &regular, &creatives);
        let mut cursor = center_y - block / 2.0;

        for child in &regular {
            let band = self.height_of(child);
            let child_center = cursor + band / 2.0;
            self.connect(node, child, exit, Point::new(child_x, child_center));
            self.place(child, child_x, child_center);
            cursor += band + self.config.vertical_spacing(kind);
        }

        if creatives.is_empty() {
            return;
        }
        if !regular.is_empty() {
            cursor += self.config.creative_group_gap - self.config.vertical_spacing(kind);
        }

        let columns = self.config.columns();
        let cell = creative_cell_height(&creatives);
        for (i, child) in creatives.iter().enumerate() {
            let (row, column) = (i / columns, i % columns);
            let left = child_x + column as f32 * (child.width() + self.config.creative_column_gap);
            let top = cursor + row as f32 * (cell + self.config.creative_row_spacing);
            self.connect(
                node,
                child,
                exit,
                Point::new(left, top + child.height() / 2.0),
            );
            self.record(child, Position::new(left, top));
        }
    }

    /// Height of the children block using the heights from the measure pass.
    fn block_height(
        &self,
        kind: NodeKind,
        regular: &[&StrategyNode],
        creatives: &[&StrategyNode],
    ) -> f32 {
        let stacked: f32 = regular.iter().map(|child| self.height_of(child)).sum::<f32>()
            + regular.len().saturating_sub(1) as f32 * self.config.vertical_spacing(kind);
        let grid = self.grid_height(creatives);
        match (regular.is_empty(), creatives.is_empty()) {
            (false, false) => stacked + self.config.creative_group_gap + grid,
            (false, true) => stacked,
            _ => grid,
        }
    }

    fn height_of(&self, node: &StrategyNode) -> f32 {
        self.out
            .subtree_heights
            .get(node.id())
            .copied()
            .unwrap_or_else(|| node.height())
    }

    fn record(&mut self, node: &StrategyNode, position: Position) {
        let rect = Bounds::of_node(position, node.width(), node.height());
        self.out.bounds = Some(match self.out.bounds {
            Some(bounds) => bounds.union(rect),
            None => rect,
        });
        self.out.positions.insert(node.id().clone(), position);
        self.out.order.push(node.id().clone());
    }

    fn connect(&mut self, parent: &StrategyNode, child: &StrategyNode, from: Point, to: Point) {
        self.out.edges.push(EdgeCurve::between(
            parent.id().clone(),
            child.id().clone(),
            from,
            to,
            self.config.edge_curvature,
        ));
    }
}

fn creative_cell_height(creatives: &[&StrategyNode]) -> f32 {
    creatives
        .iter()
        .map(|node| node.height())
        .fold(0.0, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{blueprint, payload, payloads};
    use crate::graph::ExpansionState;
    #[cfg(not(target_arch = "wasm32"))]
    use proptest::prelude::*;

    fn expand(store: &mut TreeStore, id: &NodeId) {
        store.set_expansion(id, ExpansionState::ExpandedLoaded);
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_empty_store() {
        let result = layout(&TreeStore::new(), &LayoutConfig::default());
        assert!(result.positions.is_empty());
        assert!(result.bounds.is_none());
    }

    #[test]
    fn test_root_on_anchor() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let config = LayoutConfig::default();

        let result = layout(&store, &config);
        let pos = result.position(&root).unwrap();
        assert_eq!(pos.x, config.anchor_x);
        assert_eq!(pos.y + 210.0, config.anchor_y);
        assert_eq!(result.subtree_height(&root), Some(420.0));
    }

    #[test]
    fn test_collapsed_children_are_skipped() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        store
            .insert_children(&root, payloads(NodeKind::Persona, 3))
            .unwrap();

        let result = layout(&store, &LayoutConfig::default());
        assert_eq!(result.order, vec![root]);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_children_centered_on_parent() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let personas = store
            .insert_children(&root, payloads(NodeKind::Persona, 3))
            .unwrap();
        expand(&mut store, &root);
        let config = LayoutConfig::default();

        let result = layout(&store, &config);
        // 3 * 180 + 2 * 40 = 620 > 420
        assert_eq!(result.subtree_height(&root), Some(620.0));

        let xs: Vec<f32> = personas.iter().map(|id| result.position(id).unwrap().x).collect();
        assert!(xs.iter().all(|&x| x == config.anchor_x + 300.0 + config.horizontal_gap));

        // Middle persona's center sits on the root's center.
        let mid = result.position(&personas[1]).unwrap();
        assert!(approx(mid.y + 90.0, config.anchor_y));

        let first = result.position(&personas[0]).unwrap();
        assert!(approx(mid.y - first.y, 180.0 + config.vertical_gap));
        assert_eq!(result.edges.len(), 3);
    }

    #[test]
    fn test_creative_grid_one_row_of_three() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let persona = store
            .insert_children(&root, vec![payload(NodeKind::Persona, 0)])
            .unwrap()
            .remove(0);
        let creatives = store
            .insert_children(&persona, payloads(NodeKind::CreativeResult, 3))
            .unwrap();
        expand(&mut store, &root);
        expand(&mut store, &persona);
        let config = LayoutConfig::default();

        let result = layout(&store, &config);
        let positions: Vec<Position> =
            creatives.iter().map(|id| result.position(id).unwrap()).collect();

        assert!(positions.iter().all(|p| p.y == positions[0].y));
        assert!(approx(positions[1].x - positions[0].x, 160.0 + config.creative_column_gap));
        assert!(approx(positions[2].x - positions[1].x, 160.0 + config.creative_column_gap));
        assert_eq!(result.subtree_height(&persona), Some(240.0));
    }

    #[test]
    fn test_creative_grid_wraps_rows() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let persona = store
            .insert_children(&root, vec![payload(NodeKind::Persona, 0)])
            .unwrap()
            .remove(0);
        let creatives = store
            .insert_children(&persona, payloads(NodeKind::CreativeResult, 4))
            .unwrap();
        expand(&mut store, &root);
        expand(&mut store, &persona);
        let config = LayoutConfig::default();

        let result = layout(&store, &config);
        let first = result.position(&creatives[0]).unwrap();
        let fourth = result.position(&creatives[3]).unwrap();
        assert_eq!(fourth.x, first.x);
        assert!(approx(fourth.y - first.y, 240.0 + config.creative_row_spacing));
        assert_eq!(
            result.subtree_height(&persona),
            Some(2.0 * 240.0 + config.creative_row_spacing)
        );
    }

    #[test]
    fn test_mixed_children_put_grid_below() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let persona = store
            .insert_children(&root, vec![payload(NodeKind::Persona, 0)])
            .unwrap()
            .remove(0);
        let pains = store
            .insert_children(&persona, payloads(NodeKind::PainOrDesire, 2))
            .unwrap();
        let creatives = store
            .insert_children(&persona, payloads(NodeKind::CreativeResult, 2))
            .unwrap();
        expand(&mut store, &root);
        expand(&mut store, &persona);
        let config = LayoutConfig::default();

        let result = layout(&store, &config);
        let expected = 2.0 * 130.0 + config.vertical_gap + config.creative_group_gap + 240.0;
        assert!(approx(result.subtree_height(&persona).unwrap(), expected));

        let last_pain = result.position(&pains[1]).unwrap();
        let grid_top = result.position(&creatives[0]).unwrap().y;
        assert!(approx(grid_top - (last_pain.y + 130.0), config.creative_group_gap));
    }

    #[test]
    fn test_edges_run_right_edge_to_left_edge() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let persona = store
            .insert_children(&root, vec![payload(NodeKind::Persona, 0)])
            .unwrap()
            .remove(0);
        expand(&mut store, &root);
        let result = layout(&store, &LayoutConfig::default());

        let edge = &result.edges[0];
        let root_pos = result.position(&root).unwrap();
        let persona_pos = result.position(&persona).unwrap();
        assert_eq!(edge.from, Point::new(root_pos.x + 300.0, root_pos.y + 210.0));
        assert_eq!(edge.to, Point::new(persona_pos.x, persona_pos.y + 90.0));
    }

    /// Build a tree from `ops`, expanding a node whenever it receives children.
    fn random_tree(ops: &[(usize, usize)]) -> TreeStore {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        expand(&mut store, &root);
        for (n, &(pick, count)) in ops.iter().enumerate() {
            let nodes: Vec<(NodeId, NodeKind)> =
                store.iter().map(|node| (node.id().clone(), node.kind())).collect();
            let (parent, kind) = &nodes[pick % nodes.len()];
            if let Some(child) = kind.child_kind() {
                let batch = (0..count).map(|i| payload(child, n + i)).collect();
                store.insert_children(parent, batch).unwrap();
                if n % 3 != 0 {
                    expand(&mut store, parent);
                }
            }
        }
        store
    }

    #[cfg(not(target_arch = "wasm32"))]
    proptest! {
        #[test]
        fn prop_layout_is_deterministic(ops in prop::collection::vec((0usize..64, 1usize..4), 0..30)) {
            let store = random_tree(&ops);
            let config = LayoutConfig::default();
            let a = layout(&store, &config);
            let b = layout(&store, &config);
            prop_assert_eq!(a.positions, b.positions);
            prop_assert_eq!(a.order, b.order);
        }

        #[test]
        fn prop_subtree_height_covers_node(ops in prop::collection::vec((0usize..64, 1usize..4), 0..30)) {
            let store = random_tree(&ops);
            let result = layout(&store, &LayoutConfig::default());
            for (id, height) in &result.subtree_heights {
                let node = store.node(id).unwrap();
                prop_assert!(*height >= node.height());
            }
        }

        #[test]
        fn prop_only_visible_nodes_are_placed(ops in prop::collection::vec((0usize..64, 1usize..4), 0..30)) {
            let store = random_tree(&ops);
            let result = layout(&store, &LayoutConfig::default());
            for node in store.iter() {
                prop_assert_eq!(result.positions.contains_key(node.id()), store.is_visible(node.id()));
            }
        }
    }
}
