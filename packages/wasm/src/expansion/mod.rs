//! Lazy, per-node expansion of the strategy tree.
//!
//! Expanding a node either reveals children it already has, fills a static
//! level from a fixed enumeration, or asks the host's generation provider for
//! new children. Provider calls are async; the controller itself is
//! synchronous and merges results by node id.

mod context;
mod controller;
mod provider;

pub use context::{ExpansionOptions, GenerationContext};
pub use controller::{
    ExpansionController, GenerationRequest, Merge, RequestMode, Toggle, static_children,
};
pub use provider::{ConfirmationGate, CreativeRenderer, GenerationProvider};
