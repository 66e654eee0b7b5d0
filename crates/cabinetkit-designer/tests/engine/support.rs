//! Fakes shared by the engine tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cabinetkit_core::{
    CalcError, CancellationToken, Notification, NotificationSink, TelemetryEvent, TelemetrySink,
};
use cabinetkit_designer::{
    CalculationService, DeriveRequest, EditSession, Envelope, InMemoryProjectStore, SessionSinks,
};
use cabinetkit_settings::EditorConfig;
use parking_lot::Mutex;

/// Scripted answer for one request
pub struct Reply {
    pub delay: Duration,
    pub result: Result<Envelope, CalcError>,
    /// When false the fake keeps going after cancellation, like a transport
    /// that cannot be interrupted
    pub honour_cancel: bool,
}

impl Reply {
    pub fn ok(delay_ms: u64, envelope: Envelope) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            result: Ok(envelope),
            honour_cancel: true,
        }
    }

    pub fn err(delay_ms: u64, error: CalcError) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            result: Err(error),
            honour_cancel: true,
        }
    }

    pub fn ignoring_cancel(mut self) -> Self {
        self.honour_cancel = false;
        self
    }
}

type Script = Box<dyn Fn(&DeriveRequest) -> Reply + Send + Sync>;

pub struct ScriptedService {
    script: Script,
    calls: Mutex<Vec<DeriveRequest>>,
    cancellations: AtomicUsize,
}

impl ScriptedService {
    pub fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&DeriveRequest) -> Reply + Send + Sync + 'static,
    {
        Arc::new(Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            cancellations: AtomicUsize::new(0),
        })
    }

    /// Answers instantly with a default envelope
    pub fn immediate() -> Arc<Self> {
        Self::new(|_| Reply::ok(0, Envelope::default()))
    }

    pub fn calls(&self) -> Vec<DeriveRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn cancellations(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalculationService for ScriptedService {
    async fn derive(
        &self,
        request: DeriveRequest,
        cancel: CancellationToken,
    ) -> Result<Envelope, CalcError> {
        let reply = (self.script)(&request);
        self.calls.lock().push(request);

        if !reply.honour_cancel {
            tokio::time::sleep(reply.delay).await;
            return reply.result;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                self.cancellations.fetch_add(1, Ordering::SeqCst);
                Err(CalcError::Cancelled)
            }
            _ = tokio::time::sleep(reply.delay) => reply.result,
        }
    }
}

/// Collects notifications and telemetry
#[derive(Default)]
pub struct Recorder {
    notifications: Mutex<Vec<Notification>>,
    telemetry: Mutex<Vec<TelemetryEvent>>,
}

impl Recorder {
    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn telemetry(&self) -> Vec<TelemetryEvent> {
        self.telemetry.lock().clone()
    }

    pub fn clear(&self) {
        self.notifications.lock().clear();
        self.telemetry.lock().clear();
    }
}

impl NotificationSink for Recorder {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

impl TelemetrySink for Recorder {
    fn record(&self, event: TelemetryEvent) {
        self.telemetry.lock().push(event);
    }
}

/// Defaults with one canvas unit per inch, so requests carry canvas values
pub fn test_config() -> EditorConfig {
    let mut config = EditorConfig::default();
    config.cabinet.pixels_per_inch = 1.0;
    config
}

pub struct Harness {
    pub session: EditSession,
    pub service: Arc<ScriptedService>,
    pub recorder: Arc<Recorder>,
    pub store: Arc<InMemoryProjectStore>,
}

pub fn harness(config: &EditorConfig, service: Arc<ScriptedService>) -> Harness {
    let recorder = Arc::new(Recorder::default());
    let store = Arc::new(InMemoryProjectStore::new());
    let session = EditSession::new(
        config,
        service.clone(),
        store.clone(),
        SessionSinks {
            notifications: recorder.clone(),
            telemetry: recorder.clone(),
            events: None,
        },
    );
    Harness {
        session,
        service,
        recorder,
        store,
    }
}

pub fn envelope(confidence: f64) -> Envelope {
    Envelope {
        confidence,
        ..Default::default()
    }
}

/// Let spawned tasks run without moving the clock
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
