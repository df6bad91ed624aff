//! Strategy tree data model.
//!
//! The tree is stored in petgraph's StableGraph for stable indices across
//! cascading deletes. Nodes carry a kind-tagged payload, an expansion state
//! and the position written by the layout engine.

mod node;
mod payload;
mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use node::{ExpansionState, MAX_DEPTH, NodeId, NodeKind, Position, StrategyNode};
pub use payload::{
    AdDna, Angle, AwarenessStage, BuyingTrigger, CampaignBlueprint, CarouselSlide,
    CreativeConcept, CreativeFormat, NodePayload, Objection, Offer, PainDesire, PainDesireType,
    PerformanceData, PerformanceStatus, Placement, ProductAnalysis, RenderStatus, TargetPersona,
};
pub use store::TreeStore;
