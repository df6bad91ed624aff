//! Pointer and wheel handling for the canvas.
//!
//! Interaction is a two-state machine, `Idle <-> Panning`, orthogonal to
//! zoom. Node hits are decided by the caller (the facade owns the spatial
//! index); a pointer-down over a node never starts a pan.

use super::viewport::{CanvasConfig, Viewport};
use crate::layout::{Bounds, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerMode {
    Idle,
    /// Dragging the canvas; `last` is the previous pointer position.
    Panning { last: Point },
}

pub struct CanvasController {
    viewport: Viewport,
    config: CanvasConfig,
    mode: PointerMode,
}

impl CanvasController {
    pub fn new(config: CanvasConfig) -> Self {
        let viewport = Viewport {
            scale: config.clamp_scale(config.default_scale),
            ..Default::default()
        };
        Self {
            viewport,
            config,
            mode: PointerMode::Idle,
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn mode(&self) -> PointerMode {
        self.mode
    }

    pub fn is_panning(&self) -> bool {
        matches!(self.mode, PointerMode::Panning { .. })
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    // =========================================================================
    // Pointer
    // =========================================================================

    /// Start panning unless the pointer landed on a node.
    /// Returns true if a pan started.
    pub fn pointer_down(&mut self, screen: Point, over_node: bool) -> bool {
        if over_node {
            return false;
        }
        self.mode = PointerMode::Panning { last: screen };
        true
    }

    /// Returns true if the viewport moved.
    pub fn pointer_move(&mut self, screen: Point) -> bool {
        match self.mode {
            PointerMode::Panning { last } => {
                self.viewport.pan_by(screen.x - last.x, screen.y - last.y);
                self.mode = PointerMode::Panning { last: screen };
                true
            }
            PointerMode::Idle => false,
        }
    }

    pub fn pointer_up(&mut self) {
        self.mode = PointerMode::Idle;
    }

    // =========================================================================
    // Zoom
    // =========================================================================

    /// Zoom around the cursor. Positive `delta_y` (scrolling down) zooms out.
    pub fn wheel(&mut self, delta_y: f32, cursor: Point) {
        let factor = (-delta_y * self.config.wheel_sensitivity).exp();
        self.zoom_to(self.viewport.scale * factor, cursor);
    }

    pub fn zoom_in(&mut self) {
        let center = self.viewport.screen_center();
        self.zoom_to(self.viewport.scale * self.config.button_zoom_factor, center);
    }

    pub fn zoom_out(&mut self) {
        let center = self.viewport.screen_center();
        self.zoom_to(self.viewport.scale / self.config.button_zoom_factor, center);
    }

    fn zoom_to(&mut self, scale: f32, cursor: Point) {
        let scale = self.config.clamp_scale(scale);
        if scale != self.viewport.scale {
            self.viewport.zoom_at(scale, cursor);
        }
    }

    /// Scale and center so `bounds` fills the screen minus padding.
    pub fn fit_bounds(&mut self, bounds: &Bounds) {
        let padding = self.config.fit_padding * 2.0;
        let available_w = (self.viewport.width - padding).max(1.0);
        let available_h = (self.viewport.height - padding).max(1.0);
        let scale_x = available_w / bounds.width().max(1.0);
        let scale_y = available_h / bounds.height().max(1.0);
        let scale = self.config.clamp_scale(scale_x.min(scale_y));
        self.viewport.center_on(bounds.center(), scale);
    }

    /// Restore the default scale and center `root_center`.
    pub fn recenter(&mut self, root_center: Point) {
        let scale = self.config.clamp_scale(self.config.default_scale);
        self.viewport.center_on(root_center, scale);
        tracing::debug!(x = root_center.x, y = root_center.y, "recentered canvas");
    }
}

impl Default for CanvasController {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}
