//! Node type and related structures.
//!
//! Nodes are the vertices of the strategy tree. Each node has:
//! - A stable unique identifier (survives tree mutations)
//! - A kind, fixed at creation and derived from its payload
//! - An expansion state (drives visibility of its children)
//! - Fixed per-kind layout hints (width, height)
//! - A position written only by the layout engine

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::payload::NodePayload;

/// Maximum number of `parent_id` hops from any node to the root.
pub const MAX_DEPTH: usize = 10;

/// Stable node identifier.
///
/// Minted by the store from a sequence that is never reused, so an id stays
/// unique for the lifetime of the tree even after other nodes are deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Wrap an existing id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint the id for the `seq`-th node of a store.
    pub(crate) fn minted(kind: NodeKind, seq: u64) -> Self {
        Self(format!("{}-{}", kind.slug(), seq))
    }

    /// Borrow the raw id string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The role of a node in the strategic hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    RootBrief,
    Persona,
    PainOrDesire,
    Objection,
    Offer,
    AwarenessStage,
    Angle,
    Trigger,
    Format,
    Placement,
    CreativeResult,
}

impl NodeKind {
    /// Every kind, root first.
    pub const ALL: [NodeKind; 11] = [
        NodeKind::RootBrief,
        NodeKind::Persona,
        NodeKind::PainOrDesire,
        NodeKind::Objection,
        NodeKind::Offer,
        NodeKind::AwarenessStage,
        NodeKind::Angle,
        NodeKind::Trigger,
        NodeKind::Format,
        NodeKind::Placement,
        NodeKind::CreativeResult,
    ];

    /// Wire name, as used by the JS bridge and in error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::RootBrief => "root-brief",
            NodeKind::Persona => "persona",
            NodeKind::PainOrDesire => "pain-or-desire",
            NodeKind::Objection => "objection",
            NodeKind::Offer => "offer",
            NodeKind::AwarenessStage => "awareness-stage",
            NodeKind::Angle => "angle",
            NodeKind::Trigger => "trigger",
            NodeKind::Format => "format",
            NodeKind::Placement => "placement",
            NodeKind::CreativeResult => "creative-result",
        }
    }

    /// Short prefix used when minting ids.
    fn slug(self) -> &'static str {
        match self {
            NodeKind::RootBrief => "brief",
            NodeKind::Persona => "persona",
            NodeKind::PainOrDesire => "pain",
            NodeKind::Objection => "objection",
            NodeKind::Offer => "offer",
            NodeKind::AwarenessStage => "awareness",
            NodeKind::Angle => "angle",
            NodeKind::Trigger => "trigger",
            NodeKind::Format => "format",
            NodeKind::Placement => "placement",
            NodeKind::CreativeResult => "creative",
        }
    }

    /// Level in the hierarchy (root = 0, creative results = 10).
    pub fn level(self) -> usize {
        self as usize
    }

    /// The kind produced when a node of this kind is expanded.
    pub fn child_kind(self) -> Option<NodeKind> {
        match self {
            NodeKind::CreativeResult => None,
            other => NodeKind::ALL.get(other.level() + 1).copied(),
        }
    }

    /// Adjacency table check. Personas may additionally hold creative
    /// results directly (shortcut concept packs).
    pub fn permits_child(self, child: NodeKind) -> bool {
        self.child_kind() == Some(child)
            || (self == NodeKind::Persona && child == NodeKind::CreativeResult)
    }

    /// Creative results terminate the tree.
    pub fn is_leaf(self) -> bool {
        self == NodeKind::CreativeResult
    }

    /// Fixed layout hint `(width, height)` for nodes of this kind.
    pub fn size(self) -> (f32, f32) {
        match self {
            NodeKind::RootBrief => (300.0, 420.0),
            NodeKind::Persona => (250.0, 180.0),
            NodeKind::PainOrDesire | NodeKind::Objection | NodeKind::Offer => (240.0, 130.0),
            NodeKind::AwarenessStage => (200.0, 64.0),
            NodeKind::Angle => (240.0, 110.0),
            NodeKind::Trigger => (220.0, 110.0),
            NodeKind::Format | NodeKind::Placement => (180.0, 56.0),
            NodeKind::CreativeResult => (160.0, 240.0),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown node kind: {s}"))
    }
}

/// Per-node expansion state machine.
///
/// `Collapsed` is the only state in which the node's children are hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpansionState {
    #[default]
    Collapsed,
    /// Expanded, but there is nothing to show.
    ExpandedEmpty,
    /// Expanded while the generation provider is working.
    Generating,
    ExpandedLoaded,
    /// Expanded with existing children, but the last "generate more" failed.
    ExpandedWithError,
}

impl ExpansionState {
    #[inline]
    pub fn is_expanded(self) -> bool {
        self != ExpansionState::Collapsed
    }
}

/// Top-left corner of a node in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A node of the strategy tree.
#[derive(Debug, Clone)]
pub struct StrategyNode {
    pub(crate) id: NodeId,
    pub(crate) parent_id: Option<NodeId>,
    pub(crate) label: String,
    pub(crate) payload: NodePayload,
    pub(crate) expansion: ExpansionState,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) position: Position,
    pub(crate) seq: u64,
}

impl StrategyNode {
    pub(crate) fn new(seq: u64, parent_id: Option<NodeId>, payload: NodePayload) -> Self {
        let kind = payload.kind();
        let (width, height) = kind.size();
        Self {
            id: NodeId::minted(kind, seq),
            parent_id,
            label: payload.label(),
            payload,
            expansion: ExpansionState::Collapsed,
            width,
            height,
            position: Position::default(),
            seq,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn expansion(&self) -> ExpansionState {
        self.expansion
    }

    pub fn is_expanded(&self) -> bool {
        self.expansion.is_expanded()
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Creation sequence number; siblings are ordered by it.
    pub fn seq(&self) -> u64 {
        self.seq
    }
}
