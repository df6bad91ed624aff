//! Collaborator traits.
//!
//! The host owns content generation, image rendering and user confirmation.
//! Futures are `?Send`: everything runs on the browser's single thread.

use async_trait::async_trait;

use super::context::GenerationContext;
use crate::error::GenerationError;
use crate::graph::{CreativeConcept, NodeKind, NodePayload};

/// Produces child payloads for a node being expanded.
///
/// Every returned payload must be of `kind`; a mismatched batch is rejected
/// as a whole.
#[async_trait(?Send)]
pub trait GenerationProvider {
    async fn generate(
        &self,
        kind: NodeKind,
        context: &GenerationContext,
    ) -> Result<Vec<NodePayload>, GenerationError>;
}

/// Renders a creative concept to image URLs.
#[async_trait(?Send)]
pub trait CreativeRenderer {
    async fn render(&self, concept: &CreativeConcept) -> Result<Vec<String>, GenerationError>;
}

/// Asks the user before a destructive action.
pub trait ConfirmationGate {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}
