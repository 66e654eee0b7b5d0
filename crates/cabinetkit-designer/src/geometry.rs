//! Geometry value types for the cabinet footprint.
//!
//! Everything here is `Copy`: an edit always produces a new value, so a
//! snapshot handed out by the history stack can never be changed behind its
//! back.

use serde::{Deserialize, Serialize};

/// A point on the drawing surface, in canvas units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Position and size of the cabinet footprint.
///
/// Committed states always satisfy `width >= min_dimension` and
/// `height >= min_dimension`; the edit session enforces that before a state
/// reaches history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryState {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl GeometryState {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same size, new top-left corner
    pub fn moved_to(self, point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            ..self
        }
    }

    /// Copy with one field replaced
    pub fn with_field(self, field: GeometryField, value: f64) -> Self {
        let mut next = self;
        match field {
            GeometryField::X => next.x = value,
            GeometryField::Y => next.y = value,
            GeometryField::Width => next.width = value,
            GeometryField::Height => next.height = value,
        }
        next
    }

    /// Raise width and height to at least `min_dimension`
    pub fn clamped_to_min(self, min_dimension: f64) -> Self {
        Self {
            width: self.width.max(min_dimension),
            height: self.height.max(min_dimension),
            ..self
        }
    }

    pub fn satisfies_min(&self, min_dimension: f64) -> bool {
        self.width >= min_dimension && self.height >= min_dimension
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl From<cabinetkit_settings::DefaultGeometry> for GeometryState {
    fn from(g: cabinetkit_settings::DefaultGeometry) -> Self {
        Self::new(g.x, g.y, g.width, g.height)
    }
}

/// A footprint update where any field may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialGeometry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl PartialGeometry {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none()
    }

    /// The fields this update carries, in `x, y, width, height` order
    pub fn fields(&self) -> impl Iterator<Item = (GeometryField, f64)> {
        [
            (GeometryField::X, self.x),
            (GeometryField::Y, self.y),
            (GeometryField::Width, self.width),
            (GeometryField::Height, self.height),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.map(|v| (field, v)))
    }
}

/// One of the four editable numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryField {
    X,
    Y,
    Width,
    Height,
}

impl GeometryField {
    /// Width and height are bounded by the minimum dimension, positions are not
    pub fn is_dimension(self) -> bool {
        matches!(self, GeometryField::Width | GeometryField::Height)
    }
}

impl std::fmt::Display for GeometryField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GeometryField::X => "x",
            GeometryField::Y => "y",
            GeometryField::Width => "width",
            GeometryField::Height => "height",
        };
        f.write_str(name)
    }
}

/// Bounds reported when a resize gesture ends.
///
/// Transformers that only change the size may leave the position out; the
/// current position is kept in that case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResizeBox {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub width: f64,
    pub height: f64,
}

impl ResizeBox {
    /// A size-only resize
    pub fn size(width: f64, height: f64) -> Self {
        Self {
            x: None,
            y: None,
            width,
            height,
        }
    }

    pub fn at(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width,
            height,
        }
    }

    /// Resolve against the geometry being resized
    pub fn applied_to(&self, current: GeometryState) -> GeometryState {
        GeometryState::new(
            self.x.unwrap_or(current.x),
            self.y.unwrap_or(current.y),
            self.width,
            self.height,
        )
    }
}

/// The unit stored in history: geometry plus the snap flag it was made with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditSnapshot {
    pub geometry: GeometryState,
    pub snap_enabled: bool,
}

impl EditSnapshot {
    pub fn new(geometry: GeometryState, snap_enabled: bool) -> Self {
        Self {
            geometry,
            snap_enabled,
        }
    }
}

/// The `{width, height}` pair a recalculation is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl From<&GeometryState> for Dimensions {
    fn from(g: &GeometryState) -> Self {
        Self {
            width: g.width,
            height: g.height,
        }
    }
}
