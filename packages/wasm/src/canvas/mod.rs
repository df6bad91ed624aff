//! Pannable, zoomable canvas.

mod controller;
mod viewport;

pub use controller::{CanvasController, PointerMode};
pub use viewport::{CanvasConfig, Viewport};
