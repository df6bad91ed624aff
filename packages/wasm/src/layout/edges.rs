//! Edge geometry between a visible parent and child.
//!
//! Edges leave the parent's right-edge midpoint and enter the child's
//! left-edge midpoint as a cubic Bezier whose control points are pushed
//! horizontally, giving the usual mind-map S-curve.

use serde::Serialize;

use crate::graph::NodeId;

/// A point in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Cubic curve from `from` to `to` with control points `c1`, `c2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCurve {
    pub parent: NodeId,
    pub child: NodeId,
    pub from: Point,
    pub c1: Point,
    pub c2: Point,
    pub to: Point,
}

impl EdgeCurve {
    /// Build the curve between two anchor points.
    ///
    /// `curvature` is the fraction of the horizontal distance each control
    /// point is offset by; 0 gives a straight line.
    pub fn between(parent: NodeId, child: NodeId, from: Point, to: Point, curvature: f32) -> Self {
        let dx = (to.x - from.x) * curvature;
        Self {
            parent,
            child,
            from,
            c1: Point::new(from.x + dx, from.y),
            c2: Point::new(to.x - dx, to.y),
            to,
        }
    }

    /// SVG path data, e.g. `M 0 0 C 50 0, 50 100, 100 100`.
    pub fn svg_path(&self) -> String {
        format!(
            "M {} {} C {} {}, {} {}, {} {}",
            self.from.x,
            self.from.y,
            self.c1.x,
            self.c1.y,
            self.c2.x,
            self.c2.y,
            self.to.x,
            self.to.y
        )
    }
}
