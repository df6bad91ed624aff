//! Expansion state machine.
//!
//! Expanding a node is split into two synchronous halves so no borrow of the
//! store is held while the provider works:
//!
//! 1. `begin_*` performs the state transition and, when generation is
//!    needed, returns a [`GenerationRequest`] carrying the assembled context.
//! 2. [`ExpansionController::finish`] merges the provider's answer into the
//!    store, keyed by node id.
//!
//! Several nodes may be generating at once. Generation is requested at most
//! once per `(node, child kind)` while in flight, and never for a node that
//! already has children.

use std::collections::HashSet;

use super::context::{ExpansionOptions, GenerationContext};
use super::provider::GenerationProvider;
use crate::error::{GenerationError, GraphError, Result};
use crate::graph::{
    AwarenessStage, CreativeFormat, ExpansionState, NodeId, NodeKind, NodePayload, Placement,
    StrategyNode, TreeStore,
};

/// Why a generation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// First expansion of a childless node.
    Expand,
    /// "Generate more" on a node that already has children.
    More,
    /// Creatives generated straight from a persona.
    PersonaPack,
}

/// A pending call to the generation provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub node: NodeId,
    /// Kind of the children being generated.
    pub kind: NodeKind,
    pub mode: RequestMode,
    pub context: GenerationContext,
}

/// What `begin_toggle` did.
#[derive(Debug, Clone, PartialEq)]
pub enum Toggle {
    /// The node was expanded and is now collapsed.
    Collapsed,
    /// Existing children were revealed without generating.
    Revealed,
    /// A static level was filled from its fixed enumeration.
    Synthesized(Vec<NodeId>),
    /// The provider must be called, then the result passed to `finish`.
    Generate(GenerationRequest),
    /// A generation for this node is already running; its response will fill
    /// the node.
    AwaitingInFlight,
}

/// What `finish` did with a provider response.
#[derive(Debug, Clone, PartialEq)]
pub enum Merge {
    Applied {
        children: Vec<NodeId>,
        state: ExpansionState,
    },
    /// The node was deleted while the provider worked.
    Dropped,
}

/// Children synthesized without the provider, in display order.
pub fn static_children(kind: NodeKind) -> Option<Vec<NodePayload>> {
    match kind {
        NodeKind::Offer => Some(
            AwarenessStage::ALL
                .into_iter()
                .map(NodePayload::AwarenessStage)
                .collect(),
        ),
        NodeKind::Trigger => Some(
            CreativeFormat::ALL
                .into_iter()
                .map(NodePayload::Format)
                .collect(),
        ),
        NodeKind::Format => Some(
            Placement::ALL
                .into_iter()
                .map(NodePayload::Placement)
                .collect(),
        ),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct ExpansionController {
    in_flight: HashSet<(NodeId, NodeKind)>,
}

impl ExpansionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `kind` generation for `node` is awaiting its response.
    pub fn is_in_flight(&self, node: &NodeId, kind: NodeKind) -> bool {
        self.in_flight.contains(&(node.clone(), kind))
    }

    /// Whether any generation for `node` is awaiting its response.
    fn has_pending(&self, node: &NodeId) -> bool {
        self.in_flight.iter().any(|(pending, _)| pending == node)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Forget every pending request. Their responses will be dropped because
    /// the nodes they target no longer exist.
    pub fn clear(&mut self) {
        self.in_flight.clear();
    }

    // =========================================================================
    // Begin
    // =========================================================================

    /// Flip a node between collapsed and expanded.
    pub fn begin_toggle(
        &mut self,
        store: &mut TreeStore,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<Toggle> {
        let node = store
            .node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;

        if node.is_expanded() {
            store.set_expansion(id, ExpansionState::Collapsed);
            tracing::debug!(node = %id, "collapsed");
            return Ok(Toggle::Collapsed);
        }

        let kind = node.kind();
        let child = kind.child_kind().ok_or(GraphError::NotExpandable(kind))?;

        if store.has_children(id) {
            // A generate-more or shortcut pack may still be running.
            let state = if self.has_pending(id) {
                ExpansionState::Generating
            } else {
                ExpansionState::ExpandedLoaded
            };
            store.set_expansion(id, state);
            tracing::debug!(node = %id, ?state, "revealed existing children");
            return Ok(Toggle::Revealed);
        }

        if self.is_in_flight(id, child) {
            store.set_expansion(id, ExpansionState::Generating);
            return Ok(Toggle::AwaitingInFlight);
        }

        if let Some(payloads) = static_children(kind) {
            let children = store.insert_children(id, payloads)?;
            store.set_expansion(id, ExpansionState::ExpandedLoaded);
            tracing::debug!(
                node = %id,
                kind = %kind,
                count = children.len(),
                "synthesized static level"
            );
            return Ok(Toggle::Synthesized(children));
        }

        let request = self.request(store, node, child, RequestMode::Expand, options)?;
        store.set_expansion(id, ExpansionState::Generating);
        Ok(Toggle::Generate(request))
    }

    /// Ask for further children of a node's existing kind.
    pub fn begin_more(
        &mut self,
        store: &mut TreeStore,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<GenerationRequest> {
        let node = store
            .node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        let kind = node.kind();
        let child = kind.child_kind().ok_or(GraphError::NotExpandable(kind))?;
        if static_children(kind).is_some() {
            return Err(GraphError::StaticLevel(kind));
        }

        let request = self.request(store, node, child, RequestMode::More, options)?;
        store.set_expansion(id, ExpansionState::Generating);
        Ok(request)
    }

    /// Ask for creatives attached directly under a persona.
    pub fn begin_persona_pack(
        &mut self,
        store: &mut TreeStore,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<GenerationRequest> {
        let node = store
            .node(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        if node.kind() != NodeKind::Persona {
            return Err(GraphError::InvalidChild {
                parent: node.kind(),
                child: NodeKind::CreativeResult,
            });
        }

        let request = self.request(
            store,
            node,
            NodeKind::CreativeResult,
            RequestMode::PersonaPack,
            options,
        )?;
        store.set_expansion(id, ExpansionState::Generating);
        Ok(request)
    }

    fn request(
        &mut self,
        store: &TreeStore,
        node: &StrategyNode,
        child: NodeKind,
        mode: RequestMode,
        options: ExpansionOptions,
    ) -> Result<GenerationRequest> {
        let id = node.id().clone();
        if self.is_in_flight(&id, child) {
            return Err(GraphError::GenerationInFlight {
                node: id,
                kind: child,
            });
        }
        let context = GenerationContext::assemble(store, node, child, options)?;
        self.in_flight.insert((id.clone(), child));
        tracing::info!(node = %id, kind = %child, ?mode, "generation requested");
        Ok(GenerationRequest {
            node: id,
            kind: child,
            mode,
            context,
        })
    }

    // =========================================================================
    // Finish
    // =========================================================================

    /// Merge a provider response into the store.
    ///
    /// A response for a deleted node is dropped. A successful response is
    /// inserted as one batch even if the user collapsed the node meanwhile; the
    /// node then stays collapsed. On failure nothing is inserted and the node
    /// falls back to `Collapsed`, or to `ExpandedWithError` if it still shows
    /// earlier children.
    pub fn finish(
        &mut self,
        store: &mut TreeStore,
        request: &GenerationRequest,
        response: std::result::Result<Vec<NodePayload>, GenerationError>,
    ) -> Result<Merge> {
        let id = &request.node;
        self.in_flight.remove(&(id.clone(), request.kind));

        if !store.contains(id) {
            tracing::debug!(node = %id, "dropping response for deleted node");
            return Ok(Merge::Dropped);
        }

        let payloads = response.and_then(|payloads| check_kinds(request.kind, payloads));
        let inserted = match payloads {
            Ok(payloads) => store.insert_children(id, payloads),
            Err(err) => Err(err.into()),
        };

        match inserted {
            Ok(children) => {
                let state = self.settle(store, id, true);
                tracing::info!(node = %id, count = children.len(), ?state, "generation merged");
                Ok(Merge::Applied { children, state })
            }
            Err(err) => {
                let state = self.settle(store, id, false);
                tracing::warn!(node = %id, error = %err, ?state, "generation failed");
                Err(err)
            }
        }
    }

    /// Pick the node's state once a response has been handled.
    fn settle(&self, store: &mut TreeStore, id: &NodeId, succeeded: bool) -> ExpansionState {
        let Some(node) = store.node(id) else {
            return ExpansionState::Collapsed;
        };
        let expanded = node.is_expanded();
        let has_children = store.has_children(id);
        let still_generating =
            node.expansion() == ExpansionState::Generating && self.has_pending(id);

        let state = match (expanded, has_children, succeeded) {
            (false, _, _) => ExpansionState::Collapsed,
            _ if still_generating => ExpansionState::Generating,
            (true, true, true) => ExpansionState::ExpandedLoaded,
            (true, false, true) => ExpansionState::ExpandedEmpty,
            (true, true, false) => ExpansionState::ExpandedWithError,
            (true, false, false) => ExpansionState::Collapsed,
        };
        store.set_expansion(id, state);
        state
    }

    // =========================================================================
    // Convenience
    // =========================================================================

    /// Run a whole toggle against `provider`, returning the node's final state.
    ///
    /// This holds `store` across the provider call, so it is only for callers
    /// that own the store outright (native hosts, tests). The JS bridge drives
    /// `begin_toggle` and `finish` itself.
    pub async fn toggle<P>(
        &mut self,
        store: &mut TreeStore,
        provider: &P,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<ExpansionState>
    where
        P: GenerationProvider + ?Sized,
    {
        if let Toggle::Generate(request) = self.begin_toggle(store, id, options)? {
            let response = provider.generate(request.kind, &request.context).await;
            self.finish(store, &request, response)?;
        }
        Ok(store
            .node(id)
            .map(StrategyNode::expansion)
            .unwrap_or_default())
    }

    /// Run a whole "generate more" against `provider`.
    pub async fn expand_more<P>(
        &mut self,
        store: &mut TreeStore,
        provider: &P,
        id: &NodeId,
        options: ExpansionOptions,
    ) -> Result<Vec<NodeId>>
    where
        P: GenerationProvider + ?Sized,
    {
        let request = self.begin_more(store, id, options)?;
        let response = provider.generate(request.kind, &request.context).await;
        match self.finish(store, &request, response)? {
            Merge::Applied { children, .. } => Ok(children),
            Merge::Dropped => Ok(Vec::new()),
        }
    }
}

/// Reject the batch if any payload is not of the requested kind.
fn check_kinds(
    expected: NodeKind,
    payloads: Vec<NodePayload>,
) -> std::result::Result<Vec<NodePayload>, GenerationError> {
    match payloads.iter().map(NodePayload::kind).find(|&k| k != expected) {
        Some(found) => Err(GenerationError::UnexpectedPayload { expected, found }),
        None => Ok(payloads),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::{blueprint, payload, payloads};
    use async_trait::async_trait;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    /// Answers every call with `count` payloads of the requested kind, or
    /// with `fail` when set.
    struct Scripted {
        count: usize,
        fail: RefCell<Option<GenerationError>>,
        calls: RefCell<Vec<(NodeKind, NodeId)>>,
        served: Cell<usize>,
    }

    impl Scripted {
        fn new(count: usize) -> Self {
            Self {
                count,
                fail: RefCell::new(None),
                calls: RefCell::new(Vec::new()),
                served: Cell::new(0),
            }
        }

        fn failing(reason: &str) -> Self {
            let provider = Self::new(0);
            *provider.fail.borrow_mut() = Some(GenerationError::Failed(reason.into()));
            provider
        }

        fn calls(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    #[async_trait(?Send)]
    impl GenerationProvider for Scripted {
        async fn generate(
            &self,
            kind: NodeKind,
            context: &GenerationContext,
        ) -> std::result::Result<Vec<NodePayload>, GenerationError> {
            self.calls.borrow_mut().push((kind, context.node_id.clone()));
            if let Some(err) = self.fail.borrow().clone() {
                return Err(err);
            }
            let start = self.served.get();
            self.served.set(start + self.count);
            Ok((start..start + self.count).map(|n| payload(kind, n)).collect())
        }
    }

    /// root -> persona -> pain -> objection -> offer, nothing expanded.
    fn offer_path() -> (TreeStore, Vec<NodeId>) {
        let mut store = TreeStore::new();
        let mut ids = vec![store.insert_root(blueprint("Dreamy")).unwrap()];
        for kind in [
            NodeKind::Persona,
            NodeKind::PainOrDesire,
            NodeKind::Objection,
            NodeKind::Offer,
        ] {
            let parent = ids.last().unwrap().clone();
            ids.push(
                store
                    .insert_children(&parent, vec![payload(kind, 0)])
                    .unwrap()
                    .remove(0),
            );
        }
        (store, ids)
    }

    fn state(store: &TreeStore, id: &NodeId) -> ExpansionState {
        store.node(id).unwrap().expansion()
    }

    #[test]
    fn test_offer_synthesizes_awareness_stages() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let offer = &ids[4];

        let Toggle::Synthesized(children) = expansion
            .begin_toggle(&mut store, offer, ExpansionOptions::default())
            .unwrap()
        else {
            panic!("expected a static level");
        };
        let labels: Vec<&str> = children
            .iter()
            .map(|id| store.node(id).unwrap().label())
            .collect();
        assert_eq!(
            labels,
            vec!["Unaware", "Problem Aware", "Solution Aware", "Product Aware"]
        );
        assert_eq!(state(&store, offer), ExpansionState::ExpandedLoaded);
    }

    #[test]
    fn test_static_levels_never_call_the_provider() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let provider = Scripted::new(2);

        block_on(async {
            // offer -> awareness (static), awareness -> angle (generated),
            // angle -> trigger (generated), trigger -> format (static),
            // format -> placement (static).
            let mut node = ids[4].clone();
            for _ in 0..5 {
                expansion
                    .toggle(&mut store, &provider, &node, ExpansionOptions::default())
                    .await
                    .unwrap();
                node = store.child_ids(&node)[0].clone();
            }
        });

        let kinds: Vec<NodeKind> = provider.calls.borrow().iter().map(|(k, _)| *k).collect();
        assert_eq!(kinds, vec![NodeKind::Angle, NodeKind::Trigger]);
        let trigger = store
            .iter()
            .find(|n| n.kind() == NodeKind::Trigger)
            .unwrap()
            .id()
            .clone();
        assert_eq!(store.children(&trigger).len(), 16);
    }

    #[test]
    fn test_expand_collapse_expand_generates_once() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let provider = Scripted::new(3);
        let objection = &ids[3];
        store.delete_subtree(&ids[4]);

        block_on(async {
            let first = expansion
                .toggle(&mut store, &provider, objection, ExpansionOptions::default())
                .await
                .unwrap();
            assert_eq!(first, ExpansionState::ExpandedLoaded);
            let children = store.child_ids(objection);

            let collapsed = expansion
                .toggle(&mut store, &provider, objection, ExpansionOptions::default())
                .await
                .unwrap();
            assert_eq!(collapsed, ExpansionState::Collapsed);
            assert_eq!(store.child_ids(objection), children);

            expansion
                .toggle(&mut store, &provider, objection, ExpansionOptions::default())
                .await
                .unwrap();
            assert_eq!(store.child_ids(objection), children);
        });
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_reexpand_while_in_flight_does_not_call_again() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let pain = &ids[2];
        store.delete_subtree(&ids[3]);

        let Toggle::Generate(request) = expansion
            .begin_toggle(&mut store, pain, ExpansionOptions::default())
            .unwrap()
        else {
            panic!("expected a generation");
        };
        assert_eq!(request.kind, NodeKind::Objection);
        assert_eq!(state(&store, pain), ExpansionState::Generating);

        // Collapse, then expand again before the response arrives.
        expansion
            .begin_toggle(&mut store, pain, ExpansionOptions::default())
            .unwrap();
        assert_eq!(
            expansion
                .begin_toggle(&mut store, pain, ExpansionOptions::default())
                .unwrap(),
            Toggle::AwaitingInFlight
        );

        let merge = expansion
            .finish(&mut store, &request, Ok(payloads(NodeKind::Objection, 2)))
            .unwrap();
        assert!(matches!(
            merge,
            Merge::Applied {
                state: ExpansionState::ExpandedLoaded,
                ..
            }
        ));
        assert_eq!(store.children(pain).len(), 2);
        assert_eq!(expansion.in_flight_count(), 0);
    }

    #[test]
    fn test_late_response_for_collapsed_node_stays_collapsed() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let pain = &ids[2];
        store.delete_subtree(&ids[3]);

        let Toggle::Generate(request) = expansion
            .begin_toggle(&mut store, pain, ExpansionOptions::default())
            .unwrap()
        else {
            panic!("expected a generation");
        };
        expansion
            .begin_toggle(&mut store, pain, ExpansionOptions::default())
            .unwrap();

        let merge = expansion
            .finish(&mut store, &request, Ok(payloads(NodeKind::Objection, 2)))
            .unwrap();
        assert!(matches!(
            merge,
            Merge::Applied {
                state: ExpansionState::Collapsed,
                ..
            }
        ));
        assert_eq!(store.children(pain).len(), 2);
    }

    #[test]
    fn test_response_for_deleted_node_is_dropped() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let pain = ids[2].clone();
        store.delete_subtree(&ids[3]);

        let Toggle::Generate(request) = expansion
            .begin_toggle(&mut store, &pain, ExpansionOptions::default())
            .unwrap()
        else {
            panic!("expected a generation");
        };
        let before = store.len();
        store.delete_subtree(&pain);

        let merge = expansion
            .finish(&mut store, &request, Ok(payloads(NodeKind::Objection, 2)))
            .unwrap();
        assert_eq!(merge, Merge::Dropped);
        assert_eq!(store.len(), before - 1);
    }

    #[test]
    fn test_concurrent_generations_merge_independently() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let personas = store
            .insert_children(&root, payloads(NodeKind::Persona, 2))
            .unwrap();
        let mut expansion = ExpansionController::new();

        let mut requests = Vec::new();
        for persona in &personas {
            match expansion
                .begin_toggle(&mut store, persona, ExpansionOptions::default())
                .unwrap()
            {
                Toggle::Generate(request) => requests.push(request),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(expansion.in_flight_count(), 2);

        // Responses arrive out of order.
        expansion
            .finish(&mut store, &requests[1], Ok(payloads(NodeKind::PainOrDesire, 3)))
            .unwrap();
        expansion
            .finish(&mut store, &requests[0], Ok(payloads(NodeKind::PainOrDesire, 1)))
            .unwrap();

        assert_eq!(store.children(&personas[0]).len(), 1);
        assert_eq!(store.children(&personas[1]).len(), 3);
        for persona in &personas {
            assert_eq!(state(&store, persona), ExpansionState::ExpandedLoaded);
        }
    }

    #[test]
    fn test_provider_rejection_reverts_to_collapsed() {
        // Angles expand into generated triggers.
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let ok = Scripted::new(2);
        let offer = &ids[4];

        block_on(async {
            expansion
                .toggle(&mut store, &ok, offer, ExpansionOptions::default())
                .await
                .unwrap();
            let aware = store.child_ids(offer)[0].clone();
            expansion
                .toggle(&mut store, &ok, &aware, ExpansionOptions::default())
                .await
                .unwrap();
            let angles = store.child_ids(&aware);

            let failing = Scripted::failing("quota exceeded");
            let err = expansion
                .toggle(&mut store, &failing, &angles[0], ExpansionOptions::default())
                .await
                .unwrap_err();
            assert_eq!(
                err,
                GraphError::Generation(GenerationError::Failed("quota exceeded".into()))
            );
            assert_eq!(failing.calls(), 1);
            assert_eq!(state(&store, &angles[0]), ExpansionState::Collapsed);
            assert!(!store.has_children(&angles[0]));

            // The sibling is untouched and still expands normally.
            assert_eq!(state(&store, &angles[1]), ExpansionState::Collapsed);
            let state = expansion
                .toggle(&mut store, &ok, &angles[1], ExpansionOptions::default())
                .await
                .unwrap();
            assert_eq!(state, ExpansionState::ExpandedLoaded);
        });
    }

    #[test]
    fn test_wrong_payload_kind_rejects_batch() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let persona = &ids[1];
        store.delete_subtree(&ids[2]);

        let Toggle::Generate(request) = expansion
            .begin_toggle(&mut store, persona, ExpansionOptions::default())
            .unwrap()
        else {
            panic!("expected a generation");
        };
        let mixed = vec![
            payload(NodeKind::PainOrDesire, 0),
            payload(NodeKind::Objection, 1),
        ];
        let err = expansion.finish(&mut store, &request, Ok(mixed)).unwrap_err();

        assert_eq!(
            err,
            GraphError::Generation(GenerationError::UnexpectedPayload {
                expected: NodeKind::PainOrDesire,
                found: NodeKind::Objection,
            })
        );
        assert!(!store.has_children(persona));
        assert_eq!(state(&store, persona), ExpansionState::Collapsed);
    }

    #[test]
    fn test_generate_more_failure_keeps_children() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let mut expansion = ExpansionController::new();

        block_on(async {
            let ok = Scripted::new(3);
            expansion
                .toggle(&mut store, &ok, &root, ExpansionOptions::default())
                .await
                .unwrap();
            let more = expansion
                .expand_more(&mut store, &ok, &root, ExpansionOptions::default())
                .await
                .unwrap();
            assert_eq!(more.len(), 3);
            assert_eq!(store.children(&root).len(), 6);
            let existing = ok.calls.borrow().len();
            assert_eq!(existing, 2);

            let failing = Scripted::failing("timeout");
            assert!(expansion
                .expand_more(&mut store, &failing, &root, ExpansionOptions::default())
                .await
                .is_err());
        });

        assert_eq!(store.children(&root).len(), 6);
        assert_eq!(state(&store, &root), ExpansionState::ExpandedWithError);
    }

    #[test]
    fn test_reveal_during_generate_more_keeps_generating() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        let mut expansion = ExpansionController::new();

        let Toggle::Generate(first) = expansion
            .begin_toggle(&mut store, &root, ExpansionOptions::default())
            .unwrap()
        else {
            panic!("expected a generation");
        };
        expansion
            .finish(&mut store, &first, Ok(payloads(NodeKind::Persona, 2)))
            .unwrap();

        let more = expansion
            .begin_more(&mut store, &root, ExpansionOptions::default())
            .unwrap();
        assert_eq!(
            expansion.begin_toggle(&mut store, &root, ExpansionOptions::default()),
            Ok(Toggle::Collapsed)
        );
        assert_eq!(
            expansion.begin_toggle(&mut store, &root, ExpansionOptions::default()),
            Ok(Toggle::Revealed)
        );
        assert_eq!(state(&store, &root), ExpansionState::Generating);

        let merge = expansion
            .finish(&mut store, &more, Ok(payloads(NodeKind::Persona, 2)))
            .unwrap();
        assert!(matches!(
            merge,
            Merge::Applied {
                state: ExpansionState::ExpandedLoaded,
                ..
            }
        ));
        assert_eq!(store.children(&root).len(), 4);
        assert_eq!(state(&store, &root), ExpansionState::ExpandedLoaded);
    }

    #[test]
    fn test_generate_more_sends_existing_labels() {
        let mut store = TreeStore::new();
        let root = store.insert_root(blueprint("Dreamy")).unwrap();
        store
            .insert_children(&root, payloads(NodeKind::Persona, 2))
            .unwrap();
        let mut expansion = ExpansionController::new();

        let request = expansion
            .begin_more(&mut store, &root, ExpansionOptions::default())
            .unwrap();
        assert_eq!(request.mode, RequestMode::More);
        assert_eq!(request.context.existing, vec!["persona 0", "persona 1"]);
        assert_eq!(
            expansion.begin_more(&mut store, &root, ExpansionOptions::default()),
            Err(GraphError::GenerationInFlight {
                node: root.clone(),
                kind: NodeKind::Persona
            })
        );
    }

    #[test]
    fn test_generate_more_rejects_static_levels() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        assert_eq!(
            expansion.begin_more(&mut store, &ids[4], ExpansionOptions::default()),
            Err(GraphError::StaticLevel(NodeKind::Offer))
        );
    }

    #[test]
    fn test_persona_pack() {
        let (mut store, ids) = offer_path();
        let mut expansion = ExpansionController::new();
        let persona = &ids[1];

        let request = expansion
            .begin_persona_pack(&mut store, persona, ExpansionOptions::default())
            .unwrap();
        assert_eq!(request.kind, NodeKind::CreativeResult);
        assert!(request.context.pain_desire.is_none());

        let merge = expansion
            .finish(&mut store, &request, Ok(payloads(NodeKind::CreativeResult, 3)))
            .unwrap();
        assert!(matches!(
            merge,
            Merge::Applied {
                state: ExpansionState::ExpandedLoaded,
                ..
            }
        ));
        // The pain/desire child plus three creatives.
        assert_eq!(store.children(persona).len(), 4);

        assert_eq!(
            expansion.begin_persona_pack(&mut store, &ids[2], ExpansionOptions::default()),
            Err(GraphError::InvalidChild {
                parent: NodeKind::PainOrDesire,
                child: NodeKind::CreativeResult
            })
        );
    }

    #[test]
    fn test_creatives_are_not_expandable() {
        let (mut store, ids) = offer_path();
        let creative = store
            .insert_children(&ids[1], payloads(NodeKind::CreativeResult, 1))
            .unwrap()
            .remove(0);
        let mut expansion = ExpansionController::new();
        assert_eq!(
            expansion.begin_toggle(&mut store, &creative, ExpansionOptions::default()),
            Err(GraphError::NotExpandable(NodeKind::CreativeResult))
        );
    }

    #[test]
    fn test_unknown_node() {
        let mut store = TreeStore::new();
        let mut expansion = ExpansionController::new();
        let ghost = NodeId::new("angle-42");
        assert_eq!(
            expansion.begin_toggle(&mut store, &ghost, ExpansionOptions::default()),
            Err(GraphError::NodeNotFound(ghost.clone()))
        );
        assert_eq!(
            expansion.begin_more(&mut store, &ghost, ExpansionOptions::default()),
            Err(GraphError::NodeNotFound(ghost))
        );
        assert_eq!(expansion.in_flight_count(), 0);
    }
}
