//! Device-agnostic input events.
//!
//! The tagged JSON form (`{"type": "dragEnd", "x": 120, "y": 80}`) is what
//! the headless driver reads, one event per line.

use serde::{Deserialize, Serialize};

use crate::geometry::{GeometryField, Point, ResizeBox};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InputEvent {
    DragEnd {
        x: f64,
        y: f64,
    },
    ResizeEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
        width: f64,
        height: f64,
    },
    PointerClick {
        x: f64,
        y: f64,
    },
    ManualFieldChange {
        field: GeometryField,
        value: ManualValue,
    },
    UndoRequested,
    RedoRequested,
    EscapeRequested,
    ToggleMeasurement,
    ToggleSnap,
    RetryRequested,
}

impl InputEvent {
    /// Box carried by a resize event
    pub fn resize_box(&self) -> Option<ResizeBox> {
        match *self {
            InputEvent::ResizeEnd {
                x,
                y,
                width,
                height,
            } => Some(ResizeBox {
                x,
                y,
                width,
                height,
            }),
            _ => None,
        }
    }

    /// Position carried by pointer events
    pub fn point(&self) -> Option<Point> {
        match self {
            InputEvent::DragEnd { x, y } | InputEvent::PointerClick { x, y } => {
                Some(Point::new(*x, *y))
            }
            _ => None,
        }
    }
}

/// Raw value of a numeric field: either already a number or the text the
/// operator typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ManualValue {
    Number(f64),
    Text(String),
}

impl ManualValue {
    /// Numeric value; anything unparseable or non-finite becomes `0`
    pub fn coerce(&self) -> f64 {
        match self {
            ManualValue::Number(n) => coerce_number(*n),
            ManualValue::Text(text) => parse_manual(text),
        }
    }
}

/// Parse typed text the way a numeric input does: trimmed, and `0` when it
/// is not a number.
pub fn parse_manual(text: &str) -> f64 {
    text.trim().parse::<f64>().map(coerce_number).unwrap_or(0.0)
}

fn coerce_number(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
