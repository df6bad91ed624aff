//! Generation context assembly.
//!
//! A context carries the blueprint plus every strategic decision on the path
//! from the root to the node being expanded. Lookups go through
//! [`TreeStore::nearest_ancestor_of_kind`]; the node itself counts as part of
//! its own path.

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::graph::{
    Angle, AwarenessStage, BuyingTrigger, CampaignBlueprint, CreativeFormat, NodeId, NodeKind,
    NodePayload, Objection, Offer, PainDesire, Placement, StrategyNode, TargetPersona, TreeStore,
};

/// Per-expansion knobs forwarded verbatim to the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpansionOptions {
    /// Narrative arc to use for carousel creatives.
    pub preferred_carousel_arc: Option<String>,
    /// Ask for a pack of UGC-style concepts.
    pub ugc_pack: bool,
}

/// Everything the provider is told about the node being expanded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationContext {
    pub node_id: NodeId,
    pub blueprint: CampaignBlueprint,
    pub persona: Option<TargetPersona>,
    pub pain_desire: Option<PainDesire>,
    pub objection: Option<Objection>,
    pub offer: Option<Offer>,
    pub awareness: Option<AwarenessStage>,
    pub angle: Option<Angle>,
    pub trigger: Option<BuyingTrigger>,
    pub format: Option<CreativeFormat>,
    pub placement: Option<Placement>,
    /// Labels of children the node already has, so "generate more" can
    /// avoid duplicates.
    pub existing: Vec<String>,
    pub options: ExpansionOptions,
}

/// Kinds that must be on the path before `child` can be generated under
/// `parent`.
fn required(child: NodeKind, parent: NodeKind) -> &'static [NodeKind] {
    match child {
        NodeKind::Persona => &[NodeKind::RootBrief],
        NodeKind::PainOrDesire => &[NodeKind::Persona],
        NodeKind::Objection => &[NodeKind::Persona, NodeKind::PainOrDesire],
        NodeKind::Offer => &[NodeKind::Persona, NodeKind::Objection],
        NodeKind::Angle => &[
            NodeKind::Persona,
            NodeKind::PainOrDesire,
            NodeKind::Objection,
            NodeKind::Offer,
            NodeKind::AwarenessStage,
        ],
        NodeKind::Trigger => &[NodeKind::Persona, NodeKind::Angle, NodeKind::AwarenessStage],
        NodeKind::CreativeResult if parent == NodeKind::Persona => &[NodeKind::Persona],
        NodeKind::CreativeResult => &[
            NodeKind::Persona,
            NodeKind::Angle,
            NodeKind::Trigger,
            NodeKind::AwarenessStage,
            NodeKind::Format,
            NodeKind::Placement,
            NodeKind::Offer,
        ],
        NodeKind::RootBrief | NodeKind::AwarenessStage | NodeKind::Format | NodeKind::Placement => {
            &[]
        }
    }
}

/// Payload of the nearest node of `kind` on the path to `node`, inclusive.
fn on_path<'a>(
    store: &'a TreeStore,
    node: &'a StrategyNode,
    kind: NodeKind,
) -> Option<&'a NodePayload> {
    if node.kind() == kind {
        Some(node.payload())
    } else {
        store
            .nearest_ancestor_of_kind(node.id(), kind)
            .map(StrategyNode::payload)
    }
}

impl GenerationContext {
    /// Assemble the context for generating `child` children under `node`.
    pub fn assemble(
        store: &TreeStore,
        node: &StrategyNode,
        child: NodeKind,
        options: ExpansionOptions,
    ) -> Result<Self> {
        let find = |kind: NodeKind| on_path(store, node, kind);

        for &kind in required(child, node.kind()) {
            if find(kind).is_none() {
                return Err(GraphError::MissingContext(kind));
            }
        }

        let blueprint = match find(NodeKind::RootBrief) {
            Some(NodePayload::RootBrief(blueprint)) => blueprint.clone(),
            _ => return Err(GraphError::MissingContext(NodeKind::RootBrief)),
        };

        // Shortcut packs see the persona and nothing in between.
        let shortcut = node.kind() == NodeKind::Persona && child == NodeKind::CreativeResult;
        let strategic = |kind: NodeKind| if shortcut { None } else { find(kind) };

        Ok(Self {
            node_id: node.id().clone(),
            blueprint,
            persona: match find(NodeKind::Persona) {
                Some(NodePayload::Persona(p)) => Some(p.clone()),
                _ => None,
            },
            pain_desire: match strategic(NodeKind::PainOrDesire) {
                Some(NodePayload::PainOrDesire(p)) => Some(p.clone()),
                _ => None,
            },
            objection: match strategic(NodeKind::Objection) {
                Some(NodePayload::Objection(o)) => Some(o.clone()),
                _ => None,
            },
            offer: match strategic(NodeKind::Offer) {
                Some(NodePayload::Offer(o)) => Some(o.clone()),
                _ => None,
            },
            awareness: match strategic(NodeKind::AwarenessStage) {
                Some(NodePayload::AwarenessStage(a)) => Some(*a),
                _ => None,
            },
            angle: match strategic(NodeKind::Angle) {
                Some(NodePayload::Angle(a)) => Some(a.clone()),
                _ => None,
            },
            trigger: match strategic(NodeKind::Trigger) {
                Some(NodePayload::Trigger(t)) => Some(t.clone()),
                _ => None,
            },
            format: match strategic(NodeKind::Format) {
                Some(NodePayload::Format(f)) => Some(*f),
                _ => None,
            },
            placement: match strategic(NodeKind::Placement) {
                Some(NodePayload::Placement(p)) => Some(*p),
                _ => None,
            },
            existing: store
                .children(node.id())
                .into_iter()
                .filter(|c| c.kind() == child)
                .map(|c| c.label().to_owned())
                .collect(),
            options,
        })
    }
}
