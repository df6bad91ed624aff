//! Layout for the strategy tree visualization.
//!
//! This module computes world positions for every visible node and the curve
//! geometry of the edges between them. Positions are written back into the
//! store by the facade, which then rebuilds the spatial index.

pub mod edges;
pub mod tree;

pub use edges::{EdgeCurve, Point};
pub use tree::{Bounds, LayoutConfig, TreeLayout, layout};
