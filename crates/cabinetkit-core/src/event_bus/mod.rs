//! # Event Bus Module
//!
//! Publish/subscribe channel between the edit engine and whatever surface
//! hosts it. Notifications, telemetry and geometry changes all travel over
//! the same bus, filtered by [`EventCategory`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cabinetkit_core::event_bus::{AppEvent, EventBus, EventCategory, EventFilter};
//!
//! let bus = EventBus::new();
//! bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Notification]),
//!     |event| {
//!         if let AppEvent::Notification(n) = event {
//!             println!("{}", n.message);
//!         }
//!     },
//! );
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
