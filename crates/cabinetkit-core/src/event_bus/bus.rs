//! Event Bus implementation.
//!
//! Handlers are synchronous and run on the publishing thread, so a geometry
//! commit and the events it causes are observed in commit order.

use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::events::{AppEvent, EventCategory, Notification, TelemetryEvent, TelemetryRecord};

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Filter to receive only specific event types
#[derive(Debug, Clone, Default)]
pub enum EventFilter {
    /// Receive all events.
    #[default]
    All,
    /// Receive events matching any of these categories.
    Categories(Vec<EventCategory>),
}

impl EventFilter {
    /// Check if an event matches this filter
    pub fn matches(&self, event: &AppEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
        }
    }
}

type EventHandler = Box<dyn Fn(AppEvent) + Send + Sync>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum EventBusError {
    /// Nothing is subscribed at all
    #[error("No active subscribers")]
    NoSubscribers,
}

/// Central event bus for notifications, telemetry and geometry events
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<SubscriptionId, (EventFilter, EventHandler)>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every handler whose filter matches.
    ///
    /// Returns how many handlers saw it.
    pub fn publish(&self, event: AppEvent) -> Result<usize, EventBusError> {
        let handlers = self.handlers.read();
        if handlers.is_empty() {
            return Err(EventBusError::NoSubscribers);
        }

        let mut delivered = 0;
        for (filter, handler) in handlers.values() {
            if filter.matches(&event) {
                handler(event.clone());
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Subscribe with a synchronous handler.
    ///
    /// The handler must return quickly and must not publish on this bus.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(AppEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers.write().insert(id, (filter, Box::new(handler)));
        tracing::debug!("Subscription {} added", id);
        id
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }

    fn publish_quietly(&self, event: AppEvent) {
        if let Err(e) = self.publish(event) {
            tracing::trace!("Event dropped: {}", e);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Fire-and-forget channel for operator-facing status messages.
///
/// Implementations must never block or fail the caller.
pub trait NotificationSink: Send + Sync {
    /// Deliver a notification, best effort
    fn notify(&self, notification: Notification);
}

/// Best-effort channel for operational telemetry.
pub trait TelemetrySink: Send + Sync {
    /// Record an event, best effort
    fn record(&self, event: TelemetryEvent);
}

impl NotificationSink for EventBus {
    fn notify(&self, notification: Notification) {
        self.publish_quietly(AppEvent::Notification(notification));
    }
}

impl TelemetrySink for EventBus {
    fn record(&self, event: TelemetryEvent) {
        self.publish_quietly(AppEvent::Telemetry(TelemetryRecord::now(event)));
    }
}

/// Sink that drops everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _notification: Notification) {}
}

impl TelemetrySink for NullSink {
    fn record(&self, _event: TelemetryEvent) {}
}
