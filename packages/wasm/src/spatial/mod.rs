//! Spatial indexing for O(log n) hit testing.
//!
//! This module provides an R-tree over laid-out node rectangles for pointer
//! hit tests and for culling a frame to the visible part of the canvas.

mod rtree;

pub use rtree::SpatialIndex;
