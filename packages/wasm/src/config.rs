//! Top-level configuration.
//!
//! Every field has a default, so JavaScript may pass a partial object (or
//! nothing at all). A decoded config is checked with [`GraphConfig::validate`]
//! before anything is built from it.

use serde::{Deserialize, Serialize};

use crate::canvas::CanvasConfig;
use crate::error::{GraphError, Result};
use crate::layout::LayoutConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GraphConfig {
    pub layout: LayoutConfig,
    pub canvas: CanvasConfig,
}

impl GraphConfig {
    /// Reject values that would make zooming or layout meaningless.
    pub fn validate(&self) -> Result<()> {
        let canvas = &self.canvas;
        positive("canvas.minScale", canvas.min_scale)?;
        positive("canvas.maxScale", canvas.max_scale)?;
        if canvas.min_scale > canvas.max_scale {
            return Err(GraphError::InvalidConfig(format!(
                "canvas.minScale ({}) is above canvas.maxScale ({})",
                canvas.min_scale, canvas.max_scale
            )));
        }
        positive("canvas.defaultScale", canvas.default_scale)?;
        positive("canvas.wheelSensitivity", canvas.wheel_sensitivity)?;
        positive("canvas.buttonZoomFactor", canvas.button_zoom_factor)?;
        finite("canvas.fitPadding", canvas.fit_padding)?;

        let layout = &self.layout;
        if layout.creative_columns == 0 {
            return Err(GraphError::InvalidConfig(
                "layout.creativeColumns must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("layout.anchorX", layout.anchor_x),
            ("layout.anchorY", layout.anchor_y),
            ("layout.horizontalGap", layout.horizontal_gap),
            ("layout.verticalGap", layout.vertical_gap),
            ("layout.compactVerticalGap", layout.compact_vertical_gap),
            ("layout.creativeColumnGap", layout.creative_column_gap),
            ("layout.creativeRowSpacing", layout.creative_row_spacing),
            ("layout.creativeGroupGap", layout.creative_group_gap),
            ("layout.edgeCurvature", layout.edge_curvature),
        ] {
            finite(name, value)?;
        }
        Ok(())
    }
}

fn finite(name: &str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GraphError::InvalidConfig(format!("{name} must be a finite number")))
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidConfig(format!("{name} must be above zero")))
    }
}
