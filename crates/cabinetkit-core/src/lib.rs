//! # CabinetKit Core
//!
//! Core types shared by every CabinetKit crate: the error taxonomy,
//! cooperative cancellation tokens, and the event bus that carries
//! notifications, telemetry and geometry events.

pub mod cancellation;
pub mod error;
pub mod event_bus;
pub mod types;

pub use cancellation::{CancellationSource, CancellationToken};

pub use error::{CalcError, Error, FieldError, Result};

pub use event_bus::{
    AppEvent, CommitSource, EventBus, EventBusError, EventCategory, EventFilter, GeometryEvent,
    Notification, NotificationLevel, NotificationSink, NullSink, SubscriptionId, TelemetryEvent,
    TelemetryRecord, TelemetrySink,
};

pub use types::{thread_safe, thread_safe_rw, ThreadSafe, ThreadSafeRw};
