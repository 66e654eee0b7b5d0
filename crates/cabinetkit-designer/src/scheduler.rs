//! Debounce-and-supersede scheduling of recalculation requests.
//!
//! [`DeriveScheduler::schedule`] restarts a quiet-period timer on every call.
//! When the timer survives the quiet period it cancels whatever request is
//! still live, records a new one as live and spawns the remote call. Every
//! completed call is delivered as a [`DeriveOutcome`] on the channel handed
//! out by [`DeriveScheduler::new`]; the receiver must pass the request id to
//! [`DeriveScheduler::accept`] before applying anything, since cancellation
//! is cooperative and a superseded call may still complete.
//!
//! The live-request slot is owned here and nowhere else.

use std::sync::Arc;
use std::time::Duration;

use cabinetkit_core::{
    thread_safe, CalcError, CancellationSource, TelemetryEvent, TelemetrySink, ThreadSafe,
};
use cabinetkit_settings::CabinetSettings;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::calc::{CalculationService, DeriveRequest, Envelope};
use crate::geometry::Dimensions;

/// The request currently owned by the scheduler
#[derive(Debug)]
struct PendingRequest {
    id: u64,
    cancel: CancellationSource,
    inputs: Dimensions,
}

#[derive(Debug, Default)]
struct RequestSlot {
    live: Option<PendingRequest>,
    cache_key: Option<String>,
    next_id: u64,
}

/// A finished remote call, live or not.
#[derive(Debug)]
pub struct DeriveOutcome {
    pub request_id: u64,
    pub inputs: Dimensions,
    pub elapsed: Duration,
    pub result: Result<Envelope, CalcError>,
}

/// Shared pieces the timer task needs to fire a request
#[derive(Clone)]
struct FireContext {
    service: Arc<dyn CalculationService>,
    cabinet: CabinetSettings,
    slot: ThreadSafe<RequestSlot>,
    outcomes: mpsc::UnboundedSender<DeriveOutcome>,
    telemetry: Arc<dyn TelemetrySink>,
}

pub struct DeriveScheduler {
    delay: Duration,
    ctx: FireContext,
    debounce: Option<JoinHandle<()>>,
}

impl DeriveScheduler {
    /// Create a scheduler and the receiver its outcomes arrive on.
    pub fn new(
        service: Arc<dyn CalculationService>,
        delay: Duration,
        cabinet: CabinetSettings,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> (Self, mpsc::UnboundedReceiver<DeriveOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            delay,
            ctx: FireContext {
                service,
                cabinet,
                slot: thread_safe(RequestSlot {
                    next_id: 1,
                    ..Default::default()
                }),
                outcomes: tx,
                telemetry,
            },
            debounce: None,
        };
        (scheduler, rx)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the quiet period with `inputs` as the trailing value.
    ///
    /// The live request, if any, is cancelled here rather than when the
    /// timer fires, so its answer cannot land on the newer edit.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, inputs: Dimensions) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
        self.ctx.supersede_live();

        tracing::debug!(
            "Recalculation scheduled for {:.1}x{:.1} in {:?}",
            inputs.width,
            inputs.height,
            self.delay
        );

        // The window starts now, not when the timer task is first polled.
        let deadline = Instant::now() + self.delay;
        let ctx = self.ctx.clone();
        self.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            ctx.fire(inputs);
        }));
    }

    /// Liveness check. Returns `true` and releases the slot if `request_id`
    /// is the live request; `false` means the result is superseded.
    pub fn accept(&self, request_id: u64) -> bool {
        let mut slot = self.ctx.slot.lock();
        let is_live = slot
            .live
            .as_ref()
            .is_some_and(|live| live.id == request_id);
        if is_live {
            slot.live = None;
        }
        is_live
    }

    /// Whether a request is in flight and still owned
    pub fn is_calculating(&self) -> bool {
        self.ctx.slot.lock().live.is_some()
    }

    /// Whether a debounce timer is still counting down
    pub fn has_pending_debounce(&self) -> bool {
        self.debounce
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Inputs of the live request, if any
    pub fn live_inputs(&self) -> Option<Dimensions> {
        self.ctx.slot.lock().live.as_ref().map(|live| live.inputs)
    }

    /// Cache key sent with the next request
    pub fn cache_key(&self) -> Option<String> {
        self.ctx.slot.lock().cache_key.clone()
    }

    pub fn set_cache_key(&self, key: impl Into<String>) {
        self.ctx.slot.lock().cache_key = Some(key.into());
    }

    /// Stop the timer and cancel the live request
    pub fn shutdown(&mut self) {
        if let Some(timer) = self.debounce.take() {
            timer.abort();
        }
        if let Some(live) = self.ctx.slot.lock().live.take() {
            live.cancel.cancel();
            tracing::debug!("Request #{} cancelled on shutdown", live.id);
        }
    }
}

impl Drop for DeriveScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl FireContext {
    fn supersede_live(&self) {
        let previous = self.slot.lock().live.take();
        if let Some(previous) = previous {
            previous.cancel.cancel();
            tracing::debug!("Request #{} superseded", previous.id);
            self.telemetry.record(TelemetryEvent::RequestSuperseded {
                request_id: previous.id,
            });
        }
    }

    fn fire(&self, inputs: Dimensions) {
        self.supersede_live();
        let (id, token, request) = {
            let mut slot = self.slot.lock();

            let id = slot.next_id;
            slot.next_id += 1;
            let cancel = CancellationSource::new();
            let token = cancel.token();
            let request =
                DeriveRequest::for_dimensions(inputs, &self.cabinet, slot.cache_key.clone());
            slot.live = Some(PendingRequest { id, cancel, inputs });
            (id, token, request)
        };

        tracing::debug!("Request #{} fired", id);
        self.telemetry
            .record(TelemetryEvent::RequestFired { request_id: id });

        let service = Arc::clone(&self.service);
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let result = service.derive(request, token).await;
            let outcome = DeriveOutcome {
                request_id: id,
                inputs,
                elapsed: started.elapsed(),
                result,
            };
            if outcomes.send(outcome).is_err() {
                tracing::trace!("Request #{} finished after its session closed", id);
            }
        });
    }
}
