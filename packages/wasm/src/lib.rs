//! Strategy Graph - WASM Module
//!
//! This module holds the branching strategy tree (brief, personas, pains,
//! objections, offers, awareness stages, angles, triggers, formats, placements
//! and generated creatives) and computes everything needed to show it as a
//! pannable, zoomable node graph. It is compiled to WebAssembly and exposes a
//! JavaScript-friendly API via wasm-bindgen.
//!
//! # Architecture
//!
//! - `graph`: Tree store using petgraph's StableGraph
//! - `expansion`: Lazy per-node child generation
//! - `layout`: Horizontal mind-map layout and edge curves
//! - `canvas`: Pan/zoom viewport
//! - `spatial`: R-tree spatial indexing for O(log n) hit testing
//! - `overlay`: Hover tracking and tooltips
//! - `map`: The facade tying them together
//! - `bridge`: JS callbacks adapted to the collaborator traits

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use futures::future::join_all;
use js_sys::{Function, Promise};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

pub mod bridge;
pub mod canvas;
pub mod config;
pub mod error;
pub mod expansion;
pub mod graph;
pub mod layout;
pub mod map;
pub mod overlay;
pub mod render;
pub mod spatial;

pub use config::GraphConfig;
pub use error::{GenerationError, GraphError};
pub use map::{DeleteOutcome, RenderSummary, StrategyMap};

use bridge::{BrowserConfirm, JsCreativeRenderer, JsGenerationProvider};
use expansion::{CreativeRenderer, ExpansionOptions, GenerationProvider, Merge, Toggle};
use graph::{
    CampaignBlueprint, CreativeConcept, NodeId, PerformanceStatus, StrategyNode, TargetPersona,
};
use layout::Point;
use render::RenderContext;

/// Initialize the WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build(),
    );
}

/// Main entry point for the strategy graph.
///
/// Wraps a [`StrategyMap`] shared with the futures behind the returned
/// promises. The map is only borrowed between awaits, so the canvas stays
/// interactive while generations run.
#[wasm_bindgen]
pub struct StrategyGraphWasm {
    map: Rc<RefCell<StrategyMap>>,
    provider: Rc<JsGenerationProvider>,
    renderer: Option<Rc<JsCreativeRenderer>>,
}

#[wasm_bindgen]
impl StrategyGraphWasm {
    /// Create a graph holding only the root brief.
    ///
    /// # Arguments
    ///
    /// * `blueprint` - The campaign blueprint shown on the root card
    /// * `config` - Partial `GraphConfig` object, or undefined for defaults
    /// * `generate` - `(kind, context) => Promise<object[]>`
    /// * `render` - Optional `(concept) => Promise<string[]>`
    #[wasm_bindgen(constructor)]
    pub fn new(
        blueprint: JsValue,
        config: JsValue,
        generate: Function,
        render: Option<Function>,
    ) -> Result<StrategyGraphWasm, JsValue> {
        let blueprint: CampaignBlueprint =
            serde_wasm_bindgen::from_value(blueprint).map_err(JsValue::from)?;
        let config: GraphConfig = decode_or_default(config)?;
        let map = StrategyMap::new(blueprint, config).map_err(to_js)?;
        Ok(Self {
            map: Rc::new(RefCell::new(map)),
            provider: Rc::new(JsGenerationProvider::new(generate)),
            renderer: render.map(|callback| Rc::new(JsCreativeRenderer::new(callback))),
        })
    }

    #[wasm_bindgen(js_name = rootId)]
    pub fn root_id(&self) -> Option<String> {
        self.map
            .borrow()
            .store()
            .root_id()
            .map(|id| id.as_str().to_owned())
    }

    #[wasm_bindgen(js_name = nodeCount)]
    pub fn node_count(&self) -> usize {
        self.map.borrow().store().len()
    }

    #[wasm_bindgen(js_name = isGenerating)]
    pub fn is_generating(&self) -> bool {
        self.map.borrow().is_generating()
    }

    // =========================================================================
    // Expansion
    // =========================================================================

    /// Expand or collapse a node, generating its children on first expand.
    ///
    /// Resolves to the node's final expansion state.
    pub fn toggle(&self, id: String, options: JsValue) -> Promise {
        let map = Rc::clone(&self.map);
        let provider = Rc::clone(&self.provider);
        future_to_promise(async move {
            let id = NodeId::from(id);
            let options: ExpansionOptions = decode_or_default(options)?;
            let toggle = map.borrow_mut().begin_toggle(&id, options).map_err(to_js)?;
            if let Toggle::Generate(request) = toggle {
                let response = provider.generate(request.kind, &request.context).await;
                map.borrow_mut()
                    .finish_generation(&request, response)
                    .map_err(to_js)?;
            }
            let state = map
                .borrow()
                .store()
                .node(&id)
                .map(StrategyNode::expansion)
                .unwrap_or_default();
            encode(&state)
        })
    }

    /// Generate further children for a node that already has some.
    ///
    /// Resolves to the ids of the new children.
    #[wasm_bindgen(js_name = expandMore)]
    pub fn expand_more(&self, id: String, options: JsValue) -> Promise {
        let map = Rc::clone(&self.map);
        let provider = Rc::clone(&self.provider);
        future_to_promise(async move {
            let options: ExpansionOptions = decode_or_default(options)?;
            let request = map
                .borrow_mut()
                .begin_more(&NodeId::from(id), options)
                .map_err(to_js)?;
            let response = provider.generate(request.kind, &request.context).await;
            let merge = map
                .borrow_mut()
                .finish_generation(&request, response)
                .map_err(to_js)?;
            encode(&merged_ids(merge))
        })
    }

    /// Generate creatives straight from a persona.
    #[wasm_bindgen(js_name = generatePersonaConcepts)]
    pub fn generate_persona_concepts(&self, id: String, options: JsValue) -> Promise {
        let map = Rc::clone(&self.map);
        let provider = Rc::clone(&self.provider);
        future_to_promise(async move {
            let options: ExpansionOptions = decode_or_default(options)?;
            let request = map
                .borrow_mut()
                .begin_persona_pack(&NodeId::from(id), options)
                .map_err(to_js)?;
            let response = provider.generate(request.kind, &request.context).await;
            let merge = map
                .borrow_mut()
                .finish_generation(&request, response)
                .map_err(to_js)?;
            encode(&merged_ids(merge))
        })
    }

    // =========================================================================
    // Creatives
    // =========================================================================

    /// Render several creatives concurrently.
    ///
    /// Resolves to `{ rendered: string[], failed: string[] }`.
    #[wasm_bindgen(js_name = renderCreatives)]
    pub fn render_creatives(&self, ids: Vec<String>) -> Promise {
        let map = Rc::clone(&self.map);
        let renderer = self.renderer.clone();
        future_to_promise(async move {
            let renderer = renderer.ok_or_else(|| to_js("no render callback was provided"))?;
            let ids: Vec<NodeId> = ids.into_iter().map(NodeId::from).collect();
            let jobs = map.borrow_mut().begin_render(&ids);
            let results =
                join_all(jobs.iter().map(|(_, concept)| renderer.render(concept))).await;
            let summary = map
                .borrow_mut()
                .finish_renders(jobs.into_iter().map(|(id, _)| id).zip(results));
            encode(&summary)
        })
    }

    /// Add a hand-written persona under the root without calling the
    /// provider. Returns the new node's id.
    #[wasm_bindgen(js_name = addPersona)]
    pub fn add_persona(&self, persona: JsValue) -> Result<String, JsValue> {
        let persona: TargetPersona =
            serde_wasm_bindgen::from_value(persona).map_err(JsValue::from)?;
        let id = self.map.borrow_mut().add_persona(persona).map_err(to_js)?;
        Ok(id.as_str().to_owned())
    }

    #[wasm_bindgen(js_name = updateCreative)]
    pub fn update_creative(&self, id: String, concept: JsValue) -> Result<(), JsValue> {
        let concept: CreativeConcept =
            serde_wasm_bindgen::from_value(concept).map_err(JsValue::from)?;
        self.map
            .borrow_mut()
            .update_creative(&NodeId::from(id), concept)
            .map_err(to_js)
    }

    /// Set the performance status (`"Pending"`, `"Testing"`, `"Winner"`,
    /// `"Failed"`) of several creatives at once.
    #[wasm_bindgen(js_name = tagCreatives)]
    pub fn tag_creatives(&self, ids: Vec<String>, status: JsValue) -> Result<(), JsValue> {
        let status: PerformanceStatus =
            serde_wasm_bindgen::from_value(status).map_err(JsValue::from)?;
        let ids: Vec<NodeId> = ids.into_iter().map(NodeId::from).collect();
        self.map
            .borrow_mut()
            .tag_creatives(&ids, status)
            .map_err(to_js)
    }

    // =========================================================================
    // Destructive actions
    // =========================================================================

    /// Delete a node and its subtree after `window.confirm`.
    ///
    /// Returns the removed ids, or an empty array if the user declined.
    #[wasm_bindgen(js_name = deleteNode)]
    pub fn delete_node(&self, id: String) -> Result<Vec<String>, JsValue> {
        let outcome = self
            .map
            .borrow_mut()
            .delete_node(&NodeId::from(id), &BrowserConfirm)
            .map_err(to_js)?;
        Ok(removed_ids(outcome))
    }

    /// Start over from the same blueprint after `window.confirm`.
    ///
    /// Returns true if the tree was reset.
    pub fn reset(&self) -> Result<bool, JsValue> {
        let outcome = self.map.borrow_mut().reset(&BrowserConfirm).map_err(to_js)?;
        Ok(matches!(outcome, DeleteOutcome::Deleted(_)))
    }

    // =========================================================================
    // Canvas
    // =========================================================================

    pub fn resize(&self, width: f32, height: f32) {
        self.map.borrow_mut().resize(width, height);
    }

    /// Returns the id of the node under the pointer; over empty canvas a pan
    /// starts instead.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, x: f32, y: f32) -> Option<String> {
        self.map
            .borrow_mut()
            .pointer_down(Point::new(x, y))
            .map(|id| id.as_str().to_owned())
    }

    /// Returns true if the frame needs redrawing.
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f32, y: f32) -> bool {
        self.map.borrow_mut().pointer_move(Point::new(x, y))
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self) {
        self.map.borrow_mut().pointer_up();
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&self) {
        self.map.borrow_mut().pointer_leave();
    }

    pub fn wheel(&self, delta_y: f32, x: f32, y: f32) {
        self.map.borrow_mut().wheel(delta_y, Point::new(x, y));
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        self.map.borrow_mut().zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        self.map.borrow_mut().zoom_out();
    }

    #[wasm_bindgen(js_name = fitToView)]
    pub fn fit_to_view(&self) {
        self.map.borrow_mut().fit_to_view();
    }

    pub fn recenter(&self) -> Result<(), JsValue> {
        self.map.borrow_mut().recenter().map_err(to_js)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Snapshot of visible nodes, edges, viewport, tooltip and notice.
    ///
    /// `context` is `{ referenceImage?: string }`.
    pub fn frame(&self, context: JsValue) -> Result<JsValue, JsValue> {
        let context: RenderContext = decode_or_default(context)?;
        encode(&self.map.borrow().frame(&context))
    }

    pub fn notice(&self) -> Option<String> {
        self.map.borrow().notice().map(str::to_owned)
    }

    #[wasm_bindgen(js_name = dismissNotice)]
    pub fn dismiss_notice(&self) {
        self.map.borrow_mut().dismiss_notice();
    }
}

fn to_js(err: impl Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Decode an optional JS argument; `undefined` and `null` mean defaults.
fn decode_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(JsValue::from)
}

fn encode<T: serde::Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn merged_ids(merge: Merge) -> Vec<String> {
    match merge {
        Merge::Applied { children, .. } => children
            .into_iter()
            .map(|id| id.as_str().to_owned())
            .collect(),
        Merge::Dropped => Vec::new(),
    }
}

fn removed_ids(outcome: DeleteOutcome) -> Vec<String> {
    match outcome {
        DeleteOutcome::Deleted(ids) => ids.into_iter().map(|id| id.as_str().to_owned()).collect(),
        DeleteOutcome::Declined => Vec::new(),
    }
}
