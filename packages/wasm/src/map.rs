//! The strategy map facade.
//!
//! `StrategyMap` owns one of everything: the tree, the expansion controller,
//! the canvas, the spatial index and the hover overlay. Every mutation goes
//! through it so the layout, the index and the tooltip never drift apart.
//!
//! Async work follows the expansion controller's two-phase protocol. The
//! `begin_*`/`finish_*` pairs never await, so a host that keeps the map behind
//! a `RefCell` can release the borrow while a collaborator works. The `async`
//! helpers at the bottom run a whole round trip for callers that own the map
//! outright.

use futures::future::join_all;
use serde::Serialize;

use crate::canvas::{CanvasController, Viewport};
use crate::config::GraphConfig;
use crate::error::{GenerationError, GraphError, Result};
use crate::expansion::{
    ConfirmationGate, CreativeRenderer, ExpansionController, ExpansionOptions, GenerationProvider,
    GenerationRequest, Merge, Toggle,
};
use crate::graph::{
    CampaignBlueprint, CreativeConcept, ExpansionState, NodeId, NodeKind, NodePayload,
    PerformanceData, PerformanceStatus, RenderStatus, StrategyNode, TargetPersona, TreeStore,
};
use crate::layout::{Bounds, LayoutConfig, Point, TreeLayout, layout};
use crate::overlay::HoverOverlay;
use crate::render::{Frame, RenderContext};
use crate::spatial::SpatialIndex;

/// Result of a confirmed destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Ids removed from the tree, parent before children.
    Deleted(Vec<NodeId>),
    /// The user declined; nothing changed.
    Declined,
}

/// Per-creative outcome of a bulk render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderSummary {
    pub rendered: Vec<NodeId>,
    pub failed: Vec<NodeId>,
}

pub struct StrategyMap {
    store: TreeStore,
    expansion: ExpansionController,
    canvas: CanvasController,
    spatial: SpatialIndex,
    overlay: HoverOverlay,
    layout_config: LayoutConfig,
    layout: TreeLayout,
    notice: Option<String>,
}

impl StrategyMap {
    /// Create a map holding only the root brief, centered on screen.
    pub fn new(blueprint: CampaignBlueprint, config: GraphConfig) -> Result<Self> {
        config.validate()?;
        let mut store = TreeStore::new();
        store.insert_root(blueprint)?;
        let mut map = Self {
            store,
            expansion: ExpansionController::new(),
            canvas: CanvasController::new(config.canvas),
            spatial: SpatialIndex::new(),
            overlay: HoverOverlay::new(),
            layout_config: config.layout,
            layout: TreeLayout::default(),
            notice: None,
        };
        map.relayout();
        map.recenter()?;
        Ok(map)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn viewport(&self) -> &Viewport {
        self.canvas.viewport()
    }

    pub fn hovered(&self) -> Option<&NodeId> {
        self.overlay.hovered()
    }

    /// Whether any generation is awaiting its response.
    pub fn is_generating(&self) -> bool {
        self.expansion.in_flight_count() > 0
    }

    /// The dismissible error notice, if any.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Snapshot of everything on screen.
    pub fn frame(&self, context: &RenderContext) -> Frame {
        let viewport = self.canvas.viewport();
        Frame::build(
            &self.store,
            &self.layout,
            &self.spatial,
            viewport,
            self.overlay.tooltip(&self.store, viewport),
            self.notice.clone(),
            context,
        )
    }

    /// Recompute the layout, write positions back and rebuild the hit index.
    pub fn relayout(&mut self) {
        self.layout = layout(&self.store, &self.layout_config);
        self.store.apply_positions(&self.layout.positions);

        let rects = self
            .layout
            .order
            .iter()
            .filter_map(|id| self.store.node(id))
            .map(|node| (node.id().clone(), node_bounds(node)))
            .collect();
        self.spatial.rebuild(rects);
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Toggle a node. A [`Toggle::Generate`] result must be answered with
    /// [`StrategyMap::finish_generation`].
    pub fn begin_toggle(&mut self, id: &NodeId, options: ExpansionOptions) -> Result<Toggle> {
        let toggle = self.expansion.begin_toggle(&mut self.store, id, options)?;
        self.relayout();
        Ok(toggle)
    }

    /// Ask for more children of a node that already has some. Personas are
    /// created in bulk this way from the root.
    pub fn begin_more(
        &mut self,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<GenerationRequest> {
        let request = self.expansion.begin_more(&mut self.store, id, options)?;
        self.relayout();
        Ok(request)
    }

    pub fn begin_persona_pack(
        &mut self,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<GenerationRequest> {
        let request = self
            .expansion
            .begin_persona_pack(&mut self.store, id, options)?;
        self.relayout();
        Ok(request)
    }

    /// Add a user-written persona under the root. The provider is not
    /// involved; the persona lands after the existing ones.
    pub fn add_persona(&mut self, persona: TargetPersona) -> Result<NodeId> {
        let root = self.store.root_id().cloned().ok_or(GraphError::NoRoot)?;
        let id = self
            .store
            .insert_children(&root, vec![NodePayload::Persona(persona)])?
            .remove(0);

        let state = self.store.node(&root).map(StrategyNode::expansion);
        if matches!(
            state,
            Some(ExpansionState::Collapsed | ExpansionState::ExpandedEmpty)
        ) {
            self.store.set_expansion(&root, ExpansionState::ExpandedLoaded);
        }
        self.relayout();
        tracing::info!(node = %id, "added custom persona");
        Ok(id)
    }

    /// Merge a provider response. Failures also set the error notice.
    pub fn finish_generation(
        &mut self,
        request: &GenerationRequest,
        response: std::result::Result<Vec<NodePayload>, GenerationError>,
    ) -> Result<Merge> {
        let merged = self.expansion.finish(&mut self.store, request, response);
        if let Err(err) = &merged {
            self.notice = Some(err.to_string());
        }
        self.relayout();
        merged
    }

    // =========================================================================
    // Destructive actions
    // =========================================================================

    /// Delete a node and its subtree after asking `gate`.
    pub fn delete_node<G>(&mut self, id: &NodeId, gate: &G) -> Result<DeleteOutcome>
    where
        G: ConfirmationGate + ?Sized,
    {
        let node = self
            .store
            .node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        if node.kind() == NodeKind::RootBrief {
            return Err(GraphError::RootDeletion);
        }

        let message = format!("Delete \"{}\" and everything below it?", node.label());
        if !gate.confirm(&message) {
            tracing::debug!(node = %id, "delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        let removed = self.store.delete_subtree(id);
        if self.overlay.hovered().is_some_and(|h| removed.contains(h)) {
            self.overlay.clear();
        }
        self.relayout();
        tracing::info!(node = %id, removed = removed.len(), "deleted node");
        Ok(DeleteOutcome::Deleted(removed))
    }

    /// Throw away the whole tree and start again from the same blueprint.
    ///
    /// The new root gets a fresh id, so responses still in flight for the old
    /// tree are dropped when they arrive.
    pub fn reset<G>(&mut self, gate: &G) -> Result<DeleteOutcome>
    where
        G: ConfirmationGate + ?Sized,
    {
        let (root, blueprint) = match self.store.root() {
            Some(root) => match root.payload() {
                NodePayload::RootBrief(blueprint) => (root.id().clone(), blueprint.clone()),
                _ => return Err(GraphError::NoRoot),
            },
            None => return Err(GraphError::NoRoot),
        };

        if !gate.confirm("Start over? The whole strategy tree will be removed.") {
            tracing::debug!("reset declined");
            return Ok(DeleteOutcome::Declined);
        }

        let removed = self.store.delete_subtree(&root);
        self.store.insert_root(blueprint)?;
        self.expansion.clear();
        self.overlay.clear();
        self.notice = None;
        self.relayout();
        self.recenter()?;
        tracing::info!(removed = removed.len(), "reset strategy tree");
        Ok(DeleteOutcome::Deleted(removed))
    }

    // =========================================================================
    // Creatives
    // =========================================================================

    /// Replace a creative's concept, e.g. after the user edited it.
    pub fn update_creative(&mut self, id: &NodeId, concept: CreativeConcept) -> Result<()> {
        self.store.replace_creative(id, concept)?;
        tracing::debug!(node = %id, "creative updated");
        Ok(())
    }

    /// Set the performance status of several creatives. Either every id is a
    /// creative and all are tagged, or nothing changes.
    pub fn tag_creatives(&mut self, ids: &[NodeId], status: PerformanceStatus) -> Result<()> {
        for id in ids {
            match self.store.node(id) {
                Some(node) if node.kind() == NodeKind::CreativeResult => {}
                Some(_) => return Err(GraphError::NotCreative(id.clone())),
                None => return Err(GraphError::NodeNotFound(id.clone())),
            }
        }
        for id in ids {
            let concept = self.store.creative_mut(id)?;
            concept
                .performance
                .get_or_insert_with(PerformanceData::default)
                .status = status;
        }
        tracing::info!(count = ids.len(), ?status, "tagged creatives");
        Ok(())
    }

    /// Mark creatives as rendering and hand back their concepts. Ids that are
    /// not creatives are skipped.
    pub fn begin_render(&mut self, ids: &[NodeId]) -> Vec<(NodeId, CreativeConcept)> {
        ids.iter()
            .filter_map(|id| match self.store.creative_mut(id) {
                Ok(concept) => {
                    concept.render = RenderStatus::Rendering;
                    Some((id.clone(), concept.clone()))
                }
                Err(err) => {
                    tracing::warn!(node = %id, error = %err, "skipping render");
                    None
                }
            })
            .collect()
    }

    /// Merge one render result into its own creative. A creative deleted in
    /// the meantime is ignored.
    pub fn finish_render(
        &mut self,
        id: &NodeId,
        result: std::result::Result<Vec<String>, GenerationError>,
    ) -> bool {
        let Ok(concept) = self.store.creative_mut(id) else {
            tracing::debug!(node = %id, "dropping render for missing creative");
            return false;
        };
        match result {
            Ok(urls) => {
                concept.image_urls = urls;
                concept.render = RenderStatus::Idle;
                true
            }
            Err(err) => {
                tracing::warn!(node = %id, error = %err, "render failed");
                concept.render = RenderStatus::Failed {
                    message: err.to_string(),
                };
                false
            }
        }
    }

    /// Merge the results of a bulk render, one creative at a time.
    pub fn finish_renders<I>(&mut self, results: I) -> RenderSummary
    where
        I: IntoIterator<Item = (NodeId, std::result::Result<Vec<String>, GenerationError>)>,
    {
        let mut summary = RenderSummary::default();
        for (id, result) in results {
            if self.finish_render(&id, result) {
                summary.rendered.push(id);
            } else {
                summary.failed.push(id);
            }
        }
        tracing::info!(
            rendered = summary.rendered.len(),
            failed = summary.failed.len(),
            "bulk render finished"
        );
        summary
    }

    // =========================================================================
    // Canvas
    // =========================================================================

    pub fn resize(&mut self, width: f32, height: f32) {
        self.canvas.resize(width, height);
    }

    /// The node under a screen point, if any.
    pub fn hit_test(&self, screen: Point) -> Option<NodeId> {
        let world = self.canvas.viewport().screen_to_world(screen);
        self.spatial.at_point(world.x, world.y)
    }

    /// Returns the node under the pointer; over empty canvas a pan starts
    /// instead.
    pub fn pointer_down(&mut self, screen: Point) -> Option<NodeId> {
        let hit = self.hit_test(screen);
        self.canvas.pointer_down(screen, hit.is_some());
        hit
    }

    /// Pan, or update the hovered node. Returns true if a redraw is needed.
    pub fn pointer_move(&mut self, screen: Point) -> bool {
        if self.canvas.pointer_move(screen) {
            self.overlay.clear();
            return true;
        }
        let hit = self.hit_test(screen);
        self.overlay.update(hit)
    }

    pub fn pointer_up(&mut self) {
        self.canvas.pointer_up();
    }

    /// The pointer left the canvas.
    pub fn pointer_leave(&mut self) {
        self.canvas.pointer_up();
        self.overlay.clear();
    }

    pub fn wheel(&mut self, delta_y: f32, cursor: Point) {
        self.canvas.wheel(delta_y, cursor);
    }

    pub fn zoom_in(&mut self) {
        self.canvas.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.canvas.zoom_out();
    }

    /// Fit every visible node on screen.
    pub fn fit_to_view(&mut self) {
        if let Some(bounds) = self.layout.bounds {
            self.canvas.fit_bounds(&bounds);
        }
    }

    /// Restore the default zoom with the root in the middle of the screen.
    pub fn recenter(&mut self) -> Result<()> {
        let root = self.store.root().ok_or(GraphError::NoRoot)?;
        self.canvas.recenter(node_bounds(root).center());
        Ok(())
    }

    // =========================================================================
    // Whole round trips
    // =========================================================================

    /// Toggle a node, generating its children if needed. Returns the node's
    /// final state.
    pub async fn toggle<P>(
        &mut self,
        provider: &P,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<ExpansionState>
    where
        P: GenerationProvider + ?Sized,
    {
        if let Toggle::Generate(request) = self.begin_toggle(id, options)? {
            let response = provider.generate(request.kind, &request.context).await;
            self.finish_generation(&request, response)?;
        }
        Ok(self
            .store
            .node(id)
            .map(StrategyNode::expansion)
            .unwrap_or_default())
    }

    pub async fn expand_more<P>(
        &mut self,
        provider: &P,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<Vec<NodeId>>
    where
        P: GenerationProvider + ?Sized,
    {
        let request = self.begin_more(id, options)?;
        self.run(provider, request).await
    }

    pub async fn generate_persona_concepts<P>(
        &mut self,
        provider: &P,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<Vec<NodeId>>
    where
        P: GenerationProvider + ?Sized,
    {
        let request = self.begin_persona_pack(id, options)?;
        self.run(provider, request).await
    }

    async fn run<P>(&mut self, provider: &P, request: GenerationRequest) -> Result<Vec<NodeId>>
    where
        P: GenerationProvider + ?Sized,
    {
        let response = provider.generate(request.kind, &request.context).await;
        match self.finish_generation(&request, response)? {
            Merge::Applied { children, .. } => Ok(children),
            Merge::Dropped => Ok(Vec::new()),
        }
    }

    /// Render several creatives concurrently. Each result lands only in its
    /// own creative; one failure does not affect the others.
    pub async fn render_creatives<R>(&mut self, renderer: &R, ids: &[NodeId]) -> RenderSummary
    where
        R: CreativeRenderer + ?Sized,
    {
        let jobs = self.begin_render(ids);
        let results = join_all(jobs.iter().map(|(_, concept)| renderer.render(concept))).await;
        self.finish_renders(jobs.into_iter().map(|(id, _)| id).zip(results))
    }
}

fn node_bounds(node: &StrategyNode) -> Bounds {
    Bounds::of_node(node.position(), node.width(), node.height())
}
