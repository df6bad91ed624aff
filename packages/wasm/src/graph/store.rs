//! TreeStore - the strategy tree.
//!
//! Topology lives in petgraph's StableGraph with one `parent -> child` edge per
//! node, so indices survive subtree removal. A side map resolves stable
//! [`NodeId`]s to graph indices. All structural lookups are total: unknown ids
//! yield empty results rather than errors.

use std::collections::{BTreeMap, HashMap, VecDeque};

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::{Directed, Direction};

use super::node::{ExpansionState, MAX_DEPTH, NodeId, NodeKind, Position, StrategyNode};
use super::payload::{CampaignBlueprint, CreativeConcept, NodePayload};
use crate::error::{GraphError, Result};

/// Flat node collection plus derived parent/child relationships.
pub struct TreeStore {
    /// Edges point from parent to child.
    graph: StableGraph<StrategyNode, (), Directed>,

    /// Map from stable NodeId to petgraph NodeIndex
    index: HashMap<NodeId, NodeIndex>,

    root: Option<NodeIndex>,

    /// Next creation sequence number. Never rewinds, not even on `clear`.
    next_seq: u64,
}

impl TreeStore {
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            index: HashMap::new(),
            root: None,
            next_seq: 0,
        }
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Create the root brief node. A tree has exactly one root.
    pub fn insert_root(&mut self, blueprint: CampaignBlueprint) -> Result<NodeId> {
        if self.root.is_some() {
            return Err(GraphError::RootExists);
        }
        let index = self.add(None, NodePayload::RootBrief(blueprint));
        self.root = Some(index);
        Ok(self.graph[index].id.clone())
    }

    /// Insert `payloads` as children of `parent` in one batch.
    ///
    /// Every payload is checked against the adjacency table first; if any is
    /// rejected nothing is inserted.
    pub fn insert_children(
        &mut self,
        parent: &NodeId,
        payloads: Vec<NodePayload>,
    ) -> Result<Vec<NodeId>> {
        let parent_index = *self
            .index
            .get(parent)
            .ok_or_else(|| GraphError::NodeNotFound(parent.clone()))?;
        let parent_kind = self.graph[parent_index].kind();

        if let Some(bad) = payloads
            .iter()
            .map(NodePayload::kind)
            .find(|&kind| !parent_kind.permits_child(kind))
        {
            return Err(GraphError::InvalidChild {
                parent: parent_kind,
                child: bad,
            });
        }

        let ids: Vec<NodeId> = payloads
            .into_iter()
            .map(|payload| {
                let index = self.add(Some(parent.clone()), payload);
                self.graph.add_edge(parent_index, index, ());
                self.graph[index].id.clone()
            })
            .collect();

        tracing::debug!(parent = %parent, count = ids.len(), "inserted children");
        Ok(ids)
    }

    fn add(&mut self, parent_id: Option<NodeId>, payload: NodePayload) -> NodeIndex {
        let node = StrategyNode::new(self.next_seq, parent_id, payload);
        self.next_seq += 1;
        let id = node.id.clone();
        let index = self.graph.add_node(node);
        self.index.insert(id, index);
        index
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn node(&self, id: &NodeId) -> Option<&StrategyNode> {
        self.index.get(id).map(|&index| &self.graph[index])
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut StrategyNode> {
        self.index.get(id).map(|&index| &mut self.graph[index])
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn root(&self) -> Option<&StrategyNode> {
        self.root.map(|index| &self.graph[index])
    }

    pub fn root_id(&self) -> Option<&NodeId> {
        self.root().map(|node| &node.id)
    }

    pub fn parent(&self, id: &NodeId) -> Option<&StrategyNode> {
        let &index = self.index.get(id)?;
        self.parent_index(index).map(|parent| &self.graph[parent])
    }

    fn parent_index(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
    }

    /// Direct children in creation order.
    pub fn children(&self, id: &NodeId) -> Vec<&StrategyNode> {
        let Some(&index) = self.index.get(id) else {
            return Vec::new();
        };
        let mut children: Vec<&StrategyNode> = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .map(|child| &self.graph[child])
            .collect();
        children.sort_by_key(|node| node.seq);
        children
    }

    pub fn child_ids(&self, id: &NodeId) -> Vec<NodeId> {
        self.children(id).into_iter().map(|node| node.id.clone()).collect()
    }

    pub fn has_children(&self, id: &NodeId) -> bool {
        self.index.get(id).is_some_and(|&index| {
            self.graph
                .neighbors_directed(index, Direction::Outgoing)
                .next()
                .is_some()
        })
    }

    /// Ancestors ordered root first, ending with the parent.
    pub fn ancestors(&self, id: &NodeId) -> Vec<&StrategyNode> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };
        let mut chain = Vec::new();
        let mut current = start;
        while let Some(parent) = self.parent_index(current) {
            chain.push(&self.graph[parent]);
            if chain.len() > MAX_DEPTH {
                tracing::warn!(node = %id, "ancestor chain exceeds maximum depth");
                break;
            }
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// The closest ancestor of `kind`, searching from the parent upwards.
    pub fn nearest_ancestor_of_kind(&self, id: &NodeId, kind: NodeKind) -> Option<&StrategyNode> {
        self.ancestors(id)
            .into_iter()
            .rev()
            .find(|node| node.kind() == kind)
    }

    /// Number of hops to the root, or `None` for an unknown id.
    pub fn depth(&self, id: &NodeId) -> Option<usize> {
        self.contains(id).then(|| self.ancestors(id).len())
    }

    /// A node is visible when every ancestor is expanded.
    pub fn is_visible(&self, id: &NodeId) -> bool {
        self.contains(id) && self.ancestors(id).iter().all(|node| node.is_expanded())
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &StrategyNode> {
        let mut nodes: Vec<&StrategyNode> = self.graph.node_weights().collect();
        nodes.sort_by_key(|node| node.seq);
        nodes.into_iter()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Set a node's expansion state. Returns false for an unknown id.
    pub(crate) fn set_expansion(&mut self, id: &NodeId, state: ExpansionState) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.expansion = state;
                true
            }
            None => false,
        }
    }

    /// Remove `id` and every descendant. Returns the removed ids, parent
    /// before children; empty for an unknown id.
    pub fn delete_subtree(&mut self, id: &NodeId) -> Vec<NodeId> {
        let Some(&start) = self.index.get(id) else {
            return Vec::new();
        };

        let mut doomed = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(index) = queue.pop_front() {
            doomed.push(index);
            queue.extend(self.graph.neighbors_directed(index, Direction::Outgoing));
        }

        let removed: Vec<NodeId> = doomed
            .into_iter()
            .filter_map(|index| self.graph.remove_node(index))
            .map(|node| {
                self.index.remove(&node.id);
                node.id
            })
            .collect();

        if self.root == Some(start) {
            self.root = None;
        }
        tracing::debug!(node = %id, removed = removed.len(), "deleted subtree");
        removed
    }

    /// Replace the concept of a creative-result node. The label follows the
    /// new headline; structure is untouched.
    pub fn replace_creative(&mut self, id: &NodeId, concept: CreativeConcept) -> Result<()> {
        let node = self.creative_node_mut(id)?;
        node.label = concept.headline.clone();
        node.payload = NodePayload::CreativeResult(Box::new(concept));
        Ok(())
    }

    pub(crate) fn creative_mut(&mut self, id: &NodeId) -> Result<&mut CreativeConcept> {
        let node = self.creative_node_mut(id)?;
        node.payload
            .as_creative_mut()
            .ok_or_else(|| GraphError::NotCreative(id.clone()))
    }

    fn creative_node_mut(&mut self, id: &NodeId) -> Result<&mut StrategyNode> {
        let node = self
            .node_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        if node.kind() != NodeKind::CreativeResult {
            return Err(GraphError::NotCreative(id.clone()));
        }
        Ok(node)
    }

    /// Write layout output back into the nodes. Unknown ids are ignored.
    pub fn apply_positions(&mut self, positions: &BTreeMap<NodeId, Position>) {
        for (id, &position) in positions {
            if let Some(node) = self.node_mut(id) {
                node.position = position;
            }
        }
    }

    /// Drop every node. The id sequence keeps counting, so ids handed out
    /// before the clear are never minted again.
    pub fn clear(&mut self) {
        self.graph.clear();
        self.index.clear();
        self.root = None;
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}
