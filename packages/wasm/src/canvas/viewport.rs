//! Viewport transform.
//!
//! `screen = world * scale + offset`, per axis. The viewport also knows the
//! size of the canvas element so it can center things.

use serde::{Deserialize, Serialize};

use crate::layout::{Bounds, Point};

/// Configuration for canvas interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Scale restored by recenter.
    pub default_scale: f32,
    /// Wheel delta to zoom exponent factor.
    pub wheel_sensitivity: f32,
    /// Multiplier applied by the zoom in/out buttons.
    pub button_zoom_factor: f32,
    /// Screen-space margin kept around fitted bounds.
    pub fit_padding: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.2,
            max_scale: 2.0,
            default_scale: 1.0,
            wheel_sensitivity: 0.001,
            button_zoom_factor: 1.2,
            fit_padding: 40.0,
        }
    }
}

impl CanvasConfig {
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        scale.clamp(self.min_scale, self.max_scale)
    }
}

/// Pan/zoom state of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale: f32,
    /// Canvas size in screen pixels.
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset_x: 0.0,
            offset_y: 0.0,
            scale: 1.0,
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    /// Convert world coordinates to screen coordinates.
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.offset_x,
            world.y * self.scale + self.offset_y,
        )
    }

    /// Convert screen coordinates to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.offset_x) / self.scale,
            (screen.y - self.offset_y) / self.scale,
        )
    }

    pub fn screen_center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Change the scale while keeping the world point under `cursor` fixed.
    pub fn zoom_at(&mut self, new_scale: f32, cursor: Point) {
        let ratio = new_scale / self.scale;
        self.offset_x -= (cursor.x - self.offset_x) * (ratio - 1.0);
        self.offset_y -= (cursor.y - self.offset_y) * (ratio - 1.0);
        self.scale = new_scale;
    }

    /// Translate by a screen-space delta.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Set the scale and put `world` at the center of the screen.
    pub fn center_on(&mut self, world: Point, scale: f32) {
        let center = self.screen_center();
        self.scale = scale;
        self.offset_x = center.x - world.x * scale;
        self.offset_y = center.y - world.y * scale;
    }

    /// World rectangle currently on screen.
    pub fn visible_world_rect(&self) -> Bounds {
        let min = self.screen_to_world(Point::new(0.0, 0.0));
        let max = self.screen_to_world(Point::new(self.width, self.height));
        Bounds {
            min_x: min.x,
            min_y: min.y,
            max_x: max.x,
            max_y: max.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn test_round_trip() {
        let viewport = Viewport {
            offset_x: 35.0,
            offset_y: -12.0,
            scale: 0.5,
            ..Default::default()
        };
        let world = Point::new(400.0, 250.0);
        let screen = viewport.world_to_screen(world);
        assert_eq!(screen, Point::new(235.0, 113.0));
        assert!(close(viewport.screen_to_world(screen), world));
    }

    #[test]
    fn test_zoom_at_keeps_cursor_fixed() {
        let mut viewport = Viewport::default();
        let cursor = Point::new(300.0, 200.0);
        let before = viewport.screen_to_world(cursor);

        viewport.zoom_at(1.5, cursor);
        assert!(close(viewport.world_to_screen(before), cursor));
        assert_eq!(viewport.offset_x, -150.0);
    }

    #[test]
    fn test_center_on() {
        let mut viewport = Viewport::default();
        viewport.center_on(Point::new(250.0, 610.0), 1.0);
        assert!(close(
            viewport.world_to_screen(Point::new(250.0, 610.0)),
            viewport.screen_center()
        ));
    }

    #[test]
    fn test_visible_world_rect() {
        let viewport = Viewport {
            scale: 2.0,
            width: 800.0,
            height: 600.0,
            ..Default::default()
        };
        let rect = viewport.visible_world_rect();
        assert_eq!(rect.width(), 400.0);
        assert_eq!(rect.height(), 300.0);
    }

    #[test]
    fn test_clamp_scale() {
        let config = CanvasConfig::default();
        assert_eq!(config.clamp_scale(5.0), 2.0);
        assert_eq!(config.clamp_scale(0.01), 0.2);
    }
}
