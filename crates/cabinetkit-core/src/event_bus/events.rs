//! Event type definitions for the event bus.
//!
//! Events are grouped by category. They are cloneable and serializable so the
//! headless driver can log them as JSON lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root event enum for all engine events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AppEvent {
    /// Human-readable status messages
    Notification(Notification),
    /// Operational telemetry
    Telemetry(TelemetryRecord),
    /// Geometry and interaction-mode changes
    Geometry(GeometryEvent),
}

impl AppEvent {
    /// Get the category of this event
    pub fn category(&self) -> EventCategory {
        match self {
            AppEvent::Notification(_) => EventCategory::Notification,
            AppEvent::Telemetry(_) => EventCategory::Telemetry,
            AppEvent::Geometry(_) => EventCategory::Geometry,
        }
    }

    /// Get a short description of this event for logging
    pub fn description(&self) -> String {
        match self {
            AppEvent::Notification(n) => format!("[{}] {}", n.level, n.message),
            AppEvent::Telemetry(t) => t.event.description(),
            AppEvent::Geometry(g) => g.description(),
        }
    }
}

/// Event category for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Status messages meant for the operator.
    Notification,
    /// Operational visibility events.
    Telemetry,
    /// Geometry commits, measurements and mode changes.
    Geometry,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCategory::Notification => write!(f, "Notification"),
            EventCategory::Telemetry => write!(f, "Telemetry"),
            EventCategory::Geometry => write!(f, "Geometry"),
        }
    }
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Informational status
    Info,
    /// Non-blocking warning
    Warning,
    /// Something failed
    Error,
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationLevel::Info => write!(f, "info"),
            NotificationLevel::Warning => write!(f, "warning"),
            NotificationLevel::Error => write!(f, "error"),
        }
    }
}

/// A fire-and-forget status message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Message text shown to the operator.
    pub message: String,
}

impl Notification {
    /// Informational notification
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    /// Warning notification
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }
}

/// Where a committed geometry snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSource {
    /// Shape dragged to a new position.
    Drag,
    /// Shape resized with the transformer.
    Resize,
    /// Numeric field edited.
    Manual,
    /// Snap flag toggled.
    SnapToggle,
    /// Geometry returned by the calculation service.
    Server,
    /// History undo.
    Undo,
    /// History redo.
    Redo,
}

impl std::fmt::Display for CommitSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CommitSource::Drag => "drag",
            CommitSource::Resize => "resize",
            CommitSource::Manual => "manual",
            CommitSource::SnapToggle => "snap_toggle",
            CommitSource::Server => "server",
            CommitSource::Undo => "undo",
            CommitSource::Redo => "redo",
        };
        f.write_str(name)
    }
}

/// Telemetry event with the time it was recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// Wall-clock time the event was recorded.
    pub at: DateTime<Utc>,
    /// The event.
    pub event: TelemetryEvent,
}

impl TelemetryRecord {
    /// Stamp an event with the current time
    pub fn now(event: TelemetryEvent) -> Self {
        Self {
            at: Utc::now(),
            event,
        }
    }
}

/// Operational telemetry emitted by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    /// A snapshot was committed to history.
    EditCommitted {
        /// What produced the edit.
        source: CommitSource,
    },
    /// A debounced request fired.
    RequestFired {
        /// Request sequence number.
        request_id: u64,
    },
    /// A live request was cancelled by a newer one.
    RequestSuperseded {
        /// Request sequence number.
        request_id: u64,
    },
    /// A live request produced an envelope.
    DeriveCompleted {
        /// Request sequence number.
        request_id: u64,
        /// Round-trip latency in milliseconds.
        latency_ms: u64,
    },
    /// A live request failed.
    DeriveFailed {
        /// Request sequence number.
        request_id: u64,
        /// Error category (`validation`, `transport`, ...).
        category: String,
        /// Round-trip latency in milliseconds.
        latency_ms: u64,
    },
    /// A response arrived for a request that was no longer live.
    ResultDiscarded {
        /// Request sequence number.
        request_id: u64,
    },
    /// A point-to-point measurement completed.
    MeasurementTaken {
        /// Distance in canvas pixels.
        distance_px: f64,
    },
}

impl TelemetryEvent {
    fn description(&self) -> String {
        match self {
            TelemetryEvent::EditCommitted { source } => format!("Edit committed ({})", source),
            TelemetryEvent::RequestFired { request_id } => format!("Request #{} fired", request_id),
            TelemetryEvent::RequestSuperseded { request_id } => {
                format!("Request #{} superseded", request_id)
            }
            TelemetryEvent::DeriveCompleted {
                request_id,
                latency_ms,
            } => format!("Request #{} completed in {}ms", request_id, latency_ms),
            TelemetryEvent::DeriveFailed {
                request_id,
                category,
                latency_ms,
            } => format!(
                "Request #{} failed ({}) after {}ms",
                request_id, category, latency_ms
            ),
            TelemetryEvent::ResultDiscarded { request_id } => {
                format!("Request #{} result discarded", request_id)
            }
            TelemetryEvent::MeasurementTaken { distance_px } => {
                format!("Measured {:.2}px", distance_px)
            }
        }
    }
}

/// Geometry-related events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeometryEvent {
    /// The present snapshot changed.
    Committed {
        /// What produced the change.
        source: CommitSource,
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
        /// Whether snapping was enabled for this snapshot.
        snap_enabled: bool,
    },
    /// A point-to-point measurement completed.
    Measured {
        /// Distance in canvas pixels.
        distance_px: f64,
        /// Distance in configured units.
        distance: f64,
        /// Unit label (e.g. "in").
        unit: String,
    },
    /// The interaction mode changed.
    ModeChanged {
        /// True while the measurement sub-mode is active.
        measuring: bool,
    },
}

impl GeometryEvent {
    fn description(&self) -> String {
        match self {
            GeometryEvent::Committed {
                source,
                x,
                y,
                width,
                height,
                ..
            } => format!(
                "Geometry {} -> ({}, {}) {}x{}",
                source, x, y, width, height
            ),
            GeometryEvent::Measured { distance, unit, .. } => {
                format!("Measured {:.2} {}", distance, unit)
            }
            GeometryEvent::ModeChanged { measuring } => {
                if *measuring {
                    "Measurement mode on".to_string()
                } else {
                    "Measurement mode off".to_string()
                }
            }
        }
    }
}
