//! Grid snapping.
//!
//! Every coordinate and dimension passes through [`snap`] before it reaches
//! history, so toggling the flag only affects edits made afterwards.

use crate::geometry::{GeometryState, Point};

/// Quantize `value` to the nearest multiple of `grid_size` when `enabled`.
///
/// A non-positive or non-finite grid leaves the value untouched.
pub fn snap(value: f64, grid_size: f64, enabled: bool) -> f64 {
    if !enabled || !(grid_size > 0.0) || !grid_size.is_finite() {
        return value;
    }
    (value / grid_size).round() * grid_size
}

/// Grid settings captured at edit time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapGrid {
    pub grid_size: f64,
    pub enabled: bool,
}

impl SnapGrid {
    pub fn new(grid_size: f64, enabled: bool) -> Self {
        Self { grid_size, enabled }
    }

    pub fn value(&self, value: f64) -> f64 {
        snap(value, self.grid_size, self.enabled)
    }

    pub fn point(&self, point: Point) -> Point {
        Point::new(self.value(point.x), self.value(point.y))
    }

    pub fn geometry(&self, geometry: GeometryState) -> GeometryState {
        GeometryState::new(
            self.value(geometry.x),
            self.value(geometry.y),
            self.value(geometry.width),
            self.value(geometry.height),
        )
    }
}
