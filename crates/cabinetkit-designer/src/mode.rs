//! Interaction mode: editing the shape, or measuring between points.
//!
//! A single enum keeps the two modes mutually exclusive.

use serde::Serialize;

use crate::measurement::MeasurementState;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    /// Drag and resize act on the shape
    #[default]
    Editing,
    /// Pointer clicks feed the measurement collector
    Measuring(MeasurementState),
}

impl InteractionMode {
    pub fn is_measuring(&self) -> bool {
        matches!(self, InteractionMode::Measuring(_))
    }

    /// Whether drag/resize should reach the shape
    pub fn accepts_shape_edits(&self) -> bool {
        matches!(self, InteractionMode::Editing)
    }

    /// Enter measuring with no points held. Re-entering clears the anchor.
    pub fn start_measuring(&mut self) {
        *self = InteractionMode::Measuring(MeasurementState::new());
    }

    /// Back to editing, dropping any accumulated point.
    ///
    /// Returns `true` if the mode actually changed.
    pub fn stop_measuring(&mut self) -> bool {
        let was_measuring = self.is_measuring();
        *self = InteractionMode::Editing;
        was_measuring
    }

    /// Flip between the two modes, returning whether measuring is now active
    pub fn toggle(&mut self) -> bool {
        if self.is_measuring() {
            self.stop_measuring();
            false
        } else {
            self.start_measuring();
            true
        }
    }

    pub fn kind(&self) -> ModeKind {
        match self {
            InteractionMode::Editing => ModeKind::Editing,
            InteractionMode::Measuring(_) => ModeKind::Measuring,
        }
    }
}

/// Serializable tag of [`InteractionMode`] for status reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Editing,
    Measuring,
}
