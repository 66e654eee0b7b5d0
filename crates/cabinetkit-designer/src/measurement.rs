//! Point-to-point measurement.
//!
//! While collecting, clicks are consumed in pairs: the first one becomes the
//! anchor, the second one produces a [`Measurement`] and clears the anchor so
//! the next click starts a fresh pair.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Display scale for measured distances
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementScale {
    pub pixels_per_unit: f64,
    pub unit_label: String,
}

impl MeasurementScale {
    pub fn new(pixels_per_unit: f64, unit_label: impl Into<String>) -> Self {
        Self {
            pixels_per_unit,
            unit_label: unit_label.into(),
        }
    }

    pub fn to_units(&self, pixels: f64) -> f64 {
        if self.pixels_per_unit > 0.0 {
            pixels / self.pixels_per_unit
        } else {
            pixels
        }
    }
}

impl From<&cabinetkit_settings::MeasurementSettings> for MeasurementScale {
    fn from(settings: &cabinetkit_settings::MeasurementSettings) -> Self {
        Self::new(settings.pixels_per_unit, settings.unit_label.clone())
    }
}

impl Default for MeasurementScale {
    fn default() -> Self {
        Self::from(&cabinetkit_settings::MeasurementSettings::default())
    }
}

/// A completed, read-only measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub from: Point,
    pub to: Point,
    /// Euclidean distance in canvas pixels
    pub distance_px: f64,
    /// Distance in display units
    pub distance: f64,
    pub unit: String,
}

impl std::fmt::Display for Measurement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} {}", self.distance, self.unit)
    }
}

/// Accumulated state while the measurement mode is active.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeasurementState {
    anchor: Option<Point>,
}

impl MeasurementState {
    /// Fresh collector with no points held
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points currently held (0 or 1)
    pub fn points_held(&self) -> usize {
        usize::from(self.anchor.is_some())
    }

    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// Feed one click. Returns a measurement when it completes a pair.
    pub fn click(&mut self, point: Point, scale: &MeasurementScale) -> Option<Measurement> {
        match self.anchor.take() {
            None => {
                self.anchor = Some(point);
                None
            }
            Some(from) => {
                let distance_px = from.distance_to(&point);
                Some(Measurement {
                    from,
                    to: point,
                    distance_px,
                    distance: scale.to_units(distance_px),
                    unit: scale.unit_label.clone(),
                })
            }
        }
    }
}
