//! # CabinetKit Designer
//!
//! Interactive editing of a cabinet footprint on a drawing surface, with the
//! derived engineering quantities kept up to date by a remote calculation
//! service.
//!
//! ## Core Components
//!
//! - **Snap**: grid quantization applied to every coordinate before commit
//! - **History**: linear undo/redo over immutable [`EditSnapshot`]s
//! - **Scheduler**: debounces edits into one trailing request and cancels
//!   superseded requests
//! - **Session**: the edit controller tying the above together
//! - **Measurement**: point-to-point distance mode, independent of history
//! - **Ingestion**: maps service envelopes onto the displayed derived state
//!
//! ## Architecture
//!
//! ```text
//! InputEvent
//!   └── EditSession (snap + clamp)
//!         ├── HistoryStack (push)
//!         ├── ProjectStore (mirror)
//!         └── DeriveScheduler (debounce)
//!               └── CalculationService (remote call)
//!                     └── liveness check
//!                           └── ResultIngestor (derived state, notifications)
//! ```
//!
//! Measuring bypasses history, the store and the scheduler entirely.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cabinetkit_designer::{EditSession, HttpCalculationService, InMemoryProjectStore, Point, SessionSinks};
//!
//! let config = cabinetkit_settings::EditorConfig::default();
//! let service = Arc::new(HttpCalculationService::new(&config.service)?);
//! let mut session = EditSession::new(&config, service, Arc::new(InMemoryProjectStore::new()), SessionSinks::null());
//!
//! session.on_drag_end(Point::new(120.0, 80.0));
//! let disposition = session.next_outcome().await;
//! ```

pub mod calc;
pub mod geometry;
pub mod history;
pub mod ingestion;
pub mod input;
pub mod measurement;
pub mod mode;
pub mod scheduler;
pub mod session;
pub mod snap;
pub mod store;

pub use calc::{
    CalculationService, DeriveRequest, DerivedQuantities, Envelope, HttpCalculationService,
};
pub use geometry::{
    Dimensions, EditSnapshot, GeometryField, GeometryState, PartialGeometry, Point, ResizeBox,
};
pub use history::HistoryStack;
pub use ingestion::{DerivationResult, DerivedState, IngestEffects, ResultIngestor};
pub use input::{parse_manual, InputEvent, ManualValue};
pub use measurement::{Measurement, MeasurementScale, MeasurementState};
pub use mode::{InteractionMode, ModeKind};
pub use scheduler::{DeriveOutcome, DeriveScheduler};
pub use session::{
    EditSession, EventEffect, OutcomeDisposition, SessionSinks, SessionStats, SessionStatus,
};
pub use snap::{snap, SnapGrid};
pub use store::{InMemoryProjectStore, ProjectStore};
