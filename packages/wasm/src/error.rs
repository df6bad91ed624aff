//! Error types.
//!
//! Nothing in this crate is fatal to the host: every failure degrades to
//! "tree unchanged, caller informed". Structural lookups on unknown ids never
//! produce errors; they return empty results instead.

use thiserror::Error;

use crate::graph::{NodeId, NodeKind};

/// Failure reported by (or while talking to) a generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The provider rejected the request. The reason is surfaced verbatim.
    #[error("generation failed: {0}")]
    Failed(String),

    /// The provider answered with payloads of the wrong kind.
    #[error("provider returned a {found} payload for a {expected} expansion")]
    UnexpectedPayload { expected: NodeKind, found: NodeKind },

    /// The provider's answer could not be decoded.
    #[error("provider response could not be decoded: {0}")]
    Decode(String),
}

/// Errors raised by tree mutations and expansion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),

    #[error("{0} nodes cannot be expanded")]
    NotExpandable(NodeKind),

    #[error("{parent} nodes cannot hold {child} children")]
    InvalidChild { parent: NodeKind, child: NodeKind },

    #[error("cannot build generation context: no {0} ancestor")]
    MissingContext(NodeKind),

    #[error("{0} children come from a fixed list and cannot be extended")]
    StaticLevel(NodeKind),

    #[error("the tree already has a root")]
    RootExists,

    #[error("the tree has no root")]
    NoRoot,

    #[error("node {0} is not a creative result")]
    NotCreative(NodeId),

    #[error("the root node can only be removed by a reset")]
    RootDeletion,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("{kind} generation for node {node} is already running")]
    GenerationInFlight { node: NodeId, kind: NodeKind },

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl GraphError {
    /// Whether the error came from the generation collaborator rather than
    /// from the caller addressing the tree incorrectly.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, GraphError::Generation(_))
    }
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_error_converts() {
        let err: GraphError = GenerationError::Failed("quota".into()).into();
        assert!(err.is_generation_failure());
        assert_eq!(err.to_string(), "generation failed: quota");
    }

    #[test]
    fn test_display_names_kinds() {
        let err = GraphError::InvalidChild {
            parent: NodeKind::Offer,
            child: NodeKind::Trigger,
        };
        assert_eq!(err.to_string(), "offer nodes cannot hold trigger children");
        assert!(!err.is_generation_failure());
    }
}
