//! Edit session: the geometry edit controller.
//!
//! An [`EditSession`] owns the history stack, the interaction mode, the
//! scheduler and the derived state for one editing surface. Every edit is
//! snapped, clamped, pushed to history and mirrored to the project store
//! synchronously; only then is a recalculation scheduled. Results come back
//! through [`EditSession::next_outcome`], which runs the liveness check
//! before anything reaches the derived state.

use std::sync::Arc;

use cabinetkit_core::{
    AppEvent, CalcError, CommitSource, EventBus, GeometryEvent, NotificationSink, NullSink,
    TelemetryEvent, TelemetrySink,
};
use cabinetkit_settings::EditorConfig;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::calc::CalculationService;
use crate::geometry::{Dimensions, EditSnapshot, GeometryField, GeometryState, Point, ResizeBox};
use crate::history::HistoryStack;
use crate::ingestion::{DerivationResult, DerivedState, ResultIngestor};
use crate::input::InputEvent;
use crate::measurement::{Measurement, MeasurementScale};
use crate::mode::{InteractionMode, ModeKind};
use crate::scheduler::{DeriveOutcome, DeriveScheduler};
use crate::snap::SnapGrid;
use crate::store::ProjectStore;

/// Where notifications, telemetry and geometry events go.
#[derive(Clone)]
pub struct SessionSinks {
    pub notifications: Arc<dyn NotificationSink>,
    pub telemetry: Arc<dyn TelemetrySink>,
    /// Receives geometry, measurement and mode events when set
    pub events: Option<Arc<EventBus>>,
}

impl SessionSinks {
    /// Drop everything
    pub fn null() -> Self {
        Self {
            notifications: Arc::new(NullSink),
            telemetry: Arc::new(NullSink),
            events: None,
        }
    }

    /// Route every channel through one event bus
    pub fn bus(bus: Arc<EventBus>) -> Self {
        Self {
            notifications: bus.clone(),
            telemetry: bus.clone(),
            events: Some(bus),
        }
    }
}

impl Default for SessionSinks {
    fn default() -> Self {
        Self::null()
    }
}

/// Counters for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SessionStats {
    pub edits_committed: u64,
    pub recalculations_scheduled: u64,
    pub results_applied: u64,
    pub results_discarded: u64,
    pub failures: u64,
    pub measurements: u64,
}

/// Read-only view for observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub snapshot: EditSnapshot,
    pub can_undo: bool,
    pub can_redo: bool,
    pub is_calculating: bool,
    pub mode: ModeKind,
    pub derived: DerivedState,
}

/// How a finished remote call was disposed of
#[derive(Debug, Clone, PartialEq)]
pub enum OutcomeDisposition {
    /// Live result ingested into the derived state
    Applied,
    /// Live request failed; surfaced as a warning
    Failed(CalcError),
    /// Superseded or cancelled; dropped silently
    Discarded,
}

/// Visible effect of one input event
#[derive(Debug, Clone, PartialEq)]
pub enum EventEffect {
    /// History present after the event
    Committed(EditSnapshot),
    Measured(Measurement),
    ModeChanged { measuring: bool },
    /// Suppressed by the current mode, or nothing to do
    Ignored,
}

pub struct EditSession {
    min_dimension: f64,
    grid_size: f64,
    review_threshold: f64,
    scale: MeasurementScale,
    history: HistoryStack<EditSnapshot>,
    mode: InteractionMode,
    scheduler: DeriveScheduler,
    outcomes: mpsc::UnboundedReceiver<DeriveOutcome>,
    ingestor: ResultIngestor,
    store: Arc<dyn ProjectStore>,
    telemetry: Arc<dyn TelemetrySink>,
    events: Option<Arc<EventBus>>,
    stats: SessionStats,
}

impl EditSession {
    /// Create a session seeded from `store`, or from the configured default
    /// geometry when the store is empty.
    pub fn new(
        config: &EditorConfig,
        service: Arc<dyn CalculationService>,
        store: Arc<dyn ProjectStore>,
        sinks: SessionSinks,
    ) -> Self {
        let editing = &config.editing;
        let initial = store
            .get()
            .unwrap_or_else(|| GeometryState::from(editing.default_geometry))
            .clamped_to_min(editing.min_dimension);

        let (scheduler, outcomes) = DeriveScheduler::new(
            service,
            config.derive.debounce(),
            config.cabinet.clone(),
            sinks.telemetry.clone(),
        );

        tracing::debug!(
            "Edit session started at {:?} (snap {})",
            initial,
            editing.snap_enabled
        );

        Self {
            min_dimension: editing.min_dimension,
            grid_size: editing.grid_size,
            review_threshold: config.derive.review_threshold,
            scale: MeasurementScale::from(&config.measurement),
            history: HistoryStack::with_max_depth(
                EditSnapshot::new(initial, editing.snap_enabled),
                editing.max_history,
            ),
            mode: InteractionMode::Editing,
            scheduler,
            outcomes,
            ingestor: ResultIngestor::new(sinks.notifications),
            store,
            telemetry: sinks.telemetry,
            events: sinks.events,
            stats: SessionStats::default(),
        }
    }

    pub fn snapshot(&self) -> EditSnapshot {
        *self.history.present()
    }

    pub fn geometry(&self) -> GeometryState {
        self.history.present().geometry
    }

    pub fn snap_enabled(&self) -> bool {
        self.history.present().snap_enabled
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn derived(&self) -> &DerivedState {
        self.ingestor.state()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn is_calculating(&self) -> bool {
        self.scheduler.is_calculating()
    }

    /// No timer counting down and no request live
    pub fn is_idle(&self) -> bool {
        !self.scheduler.has_pending_debounce() && !self.scheduler.is_calculating()
    }

    /// Cache key the next request will carry
    pub fn cache_key(&self) -> Option<String> {
        self.scheduler.cache_key()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            snapshot: self.snapshot(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            is_calculating: self.is_calculating(),
            mode: self.mode.kind(),
            derived: self.derived().clone(),
        }
    }

    fn grid(&self) -> SnapGrid {
        SnapGrid::new(self.grid_size, self.snap_enabled())
    }

    /// Move the shape. Suppressed while measuring.
    pub fn on_drag_end(&mut self, point: Point) -> Option<EditSnapshot> {
        if !self.mode.accepts_shape_edits() {
            tracing::debug!("Drag ignored while measuring");
            return None;
        }
        let target = self.grid().point(point);
        let geometry = self.geometry().moved_to(target);
        Some(self.commit(geometry, self.snap_enabled(), CommitSource::Drag, true))
    }

    /// Resize the shape; snapped first, then raised to the minimum
    /// dimension. Suppressed while measuring.
    pub fn on_resize_end(&mut self, bounds: ResizeBox) -> Option<EditSnapshot> {
        if !self.mode.accepts_shape_edits() {
            tracing::debug!("Resize ignored while measuring");
            return None;
        }
        let geometry = self
            .grid()
            .geometry(bounds.applied_to(self.geometry()))
            .clamped_to_min(self.min_dimension);
        Some(self.commit(geometry, self.snap_enabled(), CommitSource::Resize, true))
    }

    /// Set one numeric field. Non-finite input becomes `0`, negatives are
    /// raised to `0` before snapping, and dimensions are then raised to the
    /// minimum.
    pub fn on_manual_edit(&mut self, field: GeometryField, value: f64) -> EditSnapshot {
        let geometry = self
            .geometry()
            .with_field(field, self.entered_value(field, value));
        self.commit(geometry, self.snap_enabled(), CommitSource::Manual, true)
    }

    /// Value pipeline shared by typed and server-derived fields
    fn entered_value(&self, field: GeometryField, value: f64) -> f64 {
        let value = if value.is_finite() { value } else { 0.0 };
        let value = self.grid().value(value.max(0.0));
        if field.is_dimension() {
            value.max(self.min_dimension)
        } else {
            value
        }
    }

    /// Same as [`on_manual_edit`](Self::on_manual_edit) for typed text
    pub fn on_manual_text(&mut self, field: GeometryField, text: &str) -> EditSnapshot {
        self.on_manual_edit(field, crate::input::parse_manual(text))
    }

    /// Commit a snapshot with the flag changed and the geometry untouched.
    ///
    /// Already-committed snapshots keep the flag they were made with.
    pub fn set_snap_enabled(&mut self, enabled: bool) -> EditSnapshot {
        self.commit(self.geometry(), enabled, CommitSource::SnapToggle, false)
    }

    pub fn toggle_snap(&mut self) -> EditSnapshot {
        self.set_snap_enabled(!self.snap_enabled())
    }

    pub fn undo(&mut self) -> Option<EditSnapshot> {
        let snapshot = self.history.undo()?;
        self.restored(snapshot, CommitSource::Undo);
        Some(snapshot)
    }

    pub fn redo(&mut self) -> Option<EditSnapshot> {
        let snapshot = self.history.redo()?;
        self.restored(snapshot, CommitSource::Redo);
        Some(snapshot)
    }

    /// Recalculate the present geometry again, e.g. after a transport error
    pub fn retry(&mut self) {
        self.schedule_present();
    }

    /// Feed a pointer click to the measurement collector.
    ///
    /// Returns the measurement when the click completes a pair. Clicks in
    /// editing mode are ignored.
    pub fn on_pointer_click(&mut self, point: Point) -> Option<Measurement> {
        let InteractionMode::Measuring(state) = &mut self.mode else {
            return None;
        };
        let measurement = state.click(point, &self.scale)?;

        self.stats.measurements += 1;
        tracing::debug!("Measured {}", measurement);
        self.telemetry.record(TelemetryEvent::MeasurementTaken {
            distance_px: measurement.distance_px,
        });
        self.publish(GeometryEvent::Measured {
            distance_px: measurement.distance_px,
            distance: measurement.distance,
            unit: measurement.unit.clone(),
        });
        Some(measurement)
    }

    /// Enter or leave measuring; returns whether measuring is now active
    pub fn toggle_measurement(&mut self) -> bool {
        let measuring = self.mode.toggle();
        self.publish(GeometryEvent::ModeChanged { measuring });
        measuring
    }

    /// Leave measuring mode, if active
    pub fn escape(&mut self) -> bool {
        let changed = self.mode.stop_measuring();
        if changed {
            self.publish(GeometryEvent::ModeChanged { measuring: false });
        }
        changed
    }

    /// Dispatch one input event
    pub fn handle(&mut self, event: InputEvent) -> EventEffect {
        let committed = |snapshot: Option<EditSnapshot>| {
            snapshot.map_or(EventEffect::Ignored, EventEffect::Committed)
        };

        match event {
            InputEvent::DragEnd { x, y } => committed(self.on_drag_end(Point::new(x, y))),
            InputEvent::ResizeEnd {
                x,
                y,
                width,
                height,
            } => committed(self.on_resize_end(ResizeBox {
                x,
                y,
                width,
                height,
            })),
            InputEvent::PointerClick { x, y } => self
                .on_pointer_click(Point::new(x, y))
                .map_or(EventEffect::Ignored, EventEffect::Measured),
            InputEvent::ManualFieldChange { field, value } => {
                EventEffect::Committed(self.on_manual_edit(field, value.coerce()))
            }
            InputEvent::UndoRequested => committed(self.undo()),
            InputEvent::RedoRequested => committed(self.redo()),
            InputEvent::EscapeRequested => {
                if self.escape() {
                    EventEffect::ModeChanged { measuring: false }
                } else {
                    EventEffect::Ignored
                }
            }
            InputEvent::ToggleMeasurement => EventEffect::ModeChanged {
                measuring: self.toggle_measurement(),
            },
            InputEvent::ToggleSnap => EventEffect::Committed(self.toggle_snap()),
            InputEvent::RetryRequested => {
                self.retry();
                EventEffect::Ignored
            }
        }
    }

    /// Wait for the next finished remote call and apply it.
    ///
    /// Returns `None` once the scheduler is gone.
    pub async fn next_outcome(&mut self) -> Option<OutcomeDisposition> {
        let outcome = self.outcomes.recv().await?;
        Some(self.apply_outcome(outcome))
    }

    /// Apply every outcome that has already arrived
    pub fn drain_outcomes(&mut self) -> Vec<OutcomeDisposition> {
        let mut applied = Vec::new();
        while let Ok(outcome) = self.outcomes.try_recv() {
            applied.push(self.apply_outcome(outcome));
        }
        applied
    }

    /// Cancel the live request and stop the pending timer. Dropping the
    /// session does the same.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
    }

    fn apply_outcome(&mut self, outcome: DeriveOutcome) -> OutcomeDisposition {
        let request_id = outcome.request_id;
        let latency_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX);

        if !self.scheduler.accept(request_id) {
            self.stats.results_discarded += 1;
            tracing::debug!("Discarding result of superseded request #{}", request_id);
            self.telemetry
                .record(TelemetryEvent::ResultDiscarded { request_id });
            return OutcomeDisposition::Discarded;
        }

        match outcome.result {
            Ok(envelope) => {
                self.telemetry.record(TelemetryEvent::DeriveCompleted {
                    request_id,
                    latency_ms,
                });
                let result = DerivationResult::from_envelope(envelope, self.review_threshold);
                if let Some(effects) = self.ingestor.ingest(result, true) {
                    if let Some(partial) = effects.derived_geometry {
                        let geometry = partial
                            .fields()
                            .fold(self.geometry(), |geometry, (field, value)| {
                                geometry.with_field(field, self.entered_value(field, value))
                            });
                        self.commit(geometry, self.snap_enabled(), CommitSource::Server, false);
                    }
                    if let Some(hash) = effects.content_hash {
                        self.scheduler.set_cache_key(hash);
                    }
                }
                self.stats.results_applied += 1;
                tracing::debug!(
                    "Request #{} applied ({:.1}x{:.1}, {}ms)",
                    request_id,
                    outcome.inputs.width,
                    outcome.inputs.height,
                    latency_ms
                );
                OutcomeDisposition::Applied
            }
            Err(err) if err.is_cancellation() => {
                tracing::debug!("Request #{} cancelled", request_id);
                OutcomeDisposition::Discarded
            }
            Err(err) => {
                self.stats.failures += 1;
                self.telemetry.record(TelemetryEvent::DeriveFailed {
                    request_id,
                    category: err.category().to_string(),
                    latency_ms,
                });
                self.ingestor.ingest_failure(&err);
                OutcomeDisposition::Failed(err)
            }
        }
    }

    /// Push, mirror to the store, then optionally schedule. Returns the
    /// present snapshot; an unchanged snapshot is neither pushed nor
    /// scheduled.
    fn commit(
        &mut self,
        geometry: GeometryState,
        snap_enabled: bool,
        source: CommitSource,
        schedule: bool,
    ) -> EditSnapshot {
        let snapshot = EditSnapshot::new(geometry, snap_enabled);
        if !self.history.push(snapshot) {
            tracing::trace!("No-op {} commit", source);
            return snapshot;
        }

        self.stats.edits_committed += 1;
        self.store.set(geometry);
        tracing::debug!(
            "Committed {} edit: x={} y={} w={} h={} snap={}",
            source,
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height,
            snap_enabled
        );
        self.telemetry.record(TelemetryEvent::EditCommitted { source });
        self.publish_commit(snapshot, source);

        if schedule {
            self.schedule_present();
        }
        snapshot
    }

    fn restored(&mut self, snapshot: EditSnapshot, source: CommitSource) {
        self.store.set(snapshot.geometry);
        tracing::debug!("History {} to {:?}", source, snapshot.geometry);
        self.publish_commit(snapshot, source);
        self.schedule_present();
    }

    fn schedule_present(&mut self) {
        self.stats.recalculations_scheduled += 1;
        self.scheduler.schedule(Dimensions::from(&self.geometry()));
    }

    fn publish_commit(&self, snapshot: EditSnapshot, source: CommitSource) {
        let g = snapshot.geometry;
        self.publish(GeometryEvent::Committed {
            source,
            x: g.x,
            y: g.y,
            width: g.width,
            height: g.height,
            snap_enabled: snapshot.snap_enabled,
        });
    }

    fn publish(&self, event: GeometryEvent) {
        if let Some(bus) = &self.events {
            if let Err(e) = bus.publish(AppEvent::Geometry(event)) {
                tracing::trace!("Geometry event dropped: {}", e);
            }
        }
    }
}
