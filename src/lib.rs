//! # CabinetKit
//!
//! Interactive editing engine for a cabinet footprint, with engineering
//! quantities derived by a remote calculation service while the operator
//! edits.
//!
//! ## Architecture
//!
//! CabinetKit is organized as a workspace with multiple crates:
//!
//! 1. **cabinetkit-core** - Errors, cancellation tokens, event bus
//! 2. **cabinetkit-settings** - Engine configuration (TOML/JSON)
//! 3. **cabinetkit-designer** - Snap, history, scheduler, measurement, edit session
//! 4. **cabinetkit** - Headless driver that replays input events
//!
//! ## Features
//!
//! - **Debounced recalculation**: bursts of edits collapse into one request
//! - **Supersession**: stale responses never overwrite newer edits
//! - **Undo/Redo**: linear history of immutable snapshots
//! - **Grid snapping** and a point-to-point **measurement** mode

pub mod driver;

pub use cabinetkit_core::{
    AppEvent, CalcError, CancellationSource, CancellationToken, Error, EventBus, EventCategory,
    EventFilter, FieldError, GeometryEvent, Notification, NotificationLevel, NotificationSink,
    Result, TelemetryEvent, TelemetrySink,
};

pub use cabinetkit_settings::{EditorConfig, SettingsError};

pub use cabinetkit_designer::{
    CalculationService, DeriveRequest, EditSession, EditSnapshot, Envelope, EventEffect,
    GeometryField, GeometryState, HttpCalculationService, InMemoryProjectStore, InputEvent,
    OutcomeDisposition, Point, ProjectStore, SessionSinks, SessionStatus,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, keeping stdout free for the event stream
/// - RUST_LOG environment variable support (default `info`)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
