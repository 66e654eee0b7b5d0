use std::sync::Arc;
use std::time::Duration;

use cabinetkit_core::{NullSink, TelemetryEvent};
use cabinetkit_designer::{
    DeriveScheduler, DerivedQuantities, Dimensions, Envelope, GeometryField, OutcomeDisposition,
    PartialGeometry,
};
use cabinetkit_settings::CabinetSettings;

use crate::support::{envelope, harness, test_config, Reply, ScriptedService};

fn dims(side: f64) -> Dimensions {
    Dimensions {
        width: side,
        height: side,
    }
}

fn one_inch_per_unit() -> CabinetSettings {
    CabinetSettings {
        pixels_per_inch: 1.0,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_late_first_response_is_discarded() {
    // R1 is slow and cannot be interrupted; R2 answers quickly
    let service = ScriptedService::new(|req| {
        if req.width_in == 10.0 {
            Reply::ok(1_000, envelope(0.1)).ignoring_cancel()
        } else {
            Reply::ok(50, envelope(0.9))
        }
    });
    let (mut scheduler, mut outcomes) = DeriveScheduler::new(
        service.clone(),
        Duration::from_millis(300),
        one_inch_per_unit(),
        Arc::new(NullSink),
    );

    scheduler.schedule(dims(10.0));
    tokio::time::sleep(Duration::from_millis(301)).await;
    assert!(scheduler.is_calculating());
    assert_eq!(scheduler.live_inputs(), Some(dims(10.0)));

    scheduler.schedule(dims(20.0));

    let first = outcomes.recv().await.unwrap();
    assert_eq!(first.inputs, dims(20.0));
    assert!(scheduler.accept(first.request_id));

    let second = outcomes.recv().await.unwrap();
    assert_eq!(second.inputs, dims(10.0));
    assert!(second.result.is_ok());
    assert!(!scheduler.accept(second.request_id));
    assert_eq!(service.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_arriving_first_is_discarded() {
    // R1 lands after R2 has fired but before R2 answers
    let service = ScriptedService::new(|req| {
        if req.width_in == 10.0 {
            Reply::ok(400, envelope(0.1)).ignoring_cancel()
        } else {
            Reply::ok(500, envelope(0.9))
        }
    });
    let (mut scheduler, mut outcomes) = DeriveScheduler::new(
        service,
        Duration::from_millis(300),
        one_inch_per_unit(),
        Arc::new(NullSink),
    );

    scheduler.schedule(dims(10.0));
    tokio::time::sleep(Duration::from_millis(301)).await;
    scheduler.schedule(dims(20.0));

    let stale = outcomes.recv().await.unwrap();
    assert_eq!(stale.inputs, dims(10.0));
    assert!(!scheduler.accept(stale.request_id));
    assert!(scheduler.is_calculating());

    let live = outcomes.recv().await.unwrap();
    assert_eq!(live.inputs, dims(20.0));
    assert!(scheduler.accept(live.request_id));
    assert!(!scheduler.is_calculating());
}

#[tokio::test(start_paused = true)]
async fn test_new_debounce_window_revokes_live_request() {
    let service = ScriptedService::new(|req| {
        if req.width_in == 10.0 {
            Reply::ok(200, envelope(0.1)).ignoring_cancel()
        } else {
            Reply::ok(50, envelope(0.9))
        }
    });
    let (mut scheduler, mut outcomes) = DeriveScheduler::new(
        service.clone(),
        Duration::from_millis(300),
        one_inch_per_unit(),
        Arc::new(NullSink),
    );

    scheduler.schedule(dims(10.0));
    tokio::time::sleep(Duration::from_millis(301)).await;
    assert!(scheduler.is_calculating());

    // R2 is still debouncing when R1 answers
    scheduler.schedule(dims(20.0));
    assert!(!scheduler.is_calculating());
    assert!(scheduler.has_pending_debounce());

    let stale = outcomes.recv().await.unwrap();
    assert_eq!(stale.inputs, dims(10.0));
    assert!(!scheduler.accept(stale.request_id));
    assert!(scheduler.has_pending_debounce());
    assert_eq!(service.call_count(), 1);

    let live = outcomes.recv().await.unwrap();
    assert_eq!(live.inputs, dims(20.0));
    assert!(scheduler.accept(live.request_id));
}

#[tokio::test(start_paused = true)]
async fn test_answer_inside_new_window_never_overwrites_edit() {
    let service = ScriptedService::new(|req| {
        if req.width_in == 100.0 {
            // R1 answers with geometry of its own
            Reply::ok(
                200,
                Envelope {
                    confidence: 0.3,
                    result: Some(DerivedQuantities {
                        geometry: Some(PartialGeometry {
                            width: Some(100.0),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .ignoring_cancel()
        } else {
            Reply::ok(50, envelope(0.9))
        }
    });
    let mut h = harness(&test_config(), service);

    h.session.on_manual_edit(GeometryField::Width, 100.0);
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(h.session.is_calculating());
    h.session.on_manual_edit(GeometryField::Width, 300.0);

    // R1 lands at t=500ms, R2 only fires at t=650ms
    assert_eq!(
        h.session.next_outcome().await,
        Some(OutcomeDisposition::Discarded)
    );
    assert_eq!(h.session.geometry().width, 300.0);
    assert_eq!(h.session.derived().confidence, None);
    assert_eq!(h.service.call_count(), 1);

    assert_eq!(
        h.session.next_outcome().await,
        Some(OutcomeDisposition::Applied)
    );
    assert_eq!(h.session.geometry().width, 300.0);
    assert_eq!(h.session.derived().confidence, Some(0.9));
    assert_eq!(h.service.calls()[1].width_in, 300.0);
    assert!(h
        .recorder
        .telemetry()
        .iter()
        .any(|e| matches!(e, TelemetryEvent::RequestSuperseded { request_id: 1 })));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_request_is_cancelled() {
    let service = ScriptedService::new(|_| Reply::ok(5_000, envelope(0.9)));
    let (mut scheduler, mut outcomes) = DeriveScheduler::new(
        service.clone(),
        Duration::from_millis(300),
        one_inch_per_unit(),
        Arc::new(NullSink),
    );

    scheduler.schedule(dims(10.0));
    tokio::time::sleep(Duration::from_millis(301)).await;
    scheduler.schedule(dims(20.0));

    let cancelled = outcomes.recv().await.unwrap();
    assert!(cancelled.result.unwrap_err().is_cancellation());
    assert!(!scheduler.accept(cancelled.request_id));
    assert_eq!(service.cancellations(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_session_only_applies_newest_result() {
    let service = ScriptedService::new(|req| {
        if req.width_in == 100.0 {
            Reply::ok(1_000, envelope(0.3)).ignoring_cancel()
        } else {
            Reply::ok(50, envelope(0.9))
        }
    });
    let mut h = harness(&test_config(), service);

    h.session.on_manual_edit(GeometryField::Width, 100.0);
    tokio::time::sleep(Duration::from_millis(301)).await;
    assert!(h.session.is_calculating());
    h.session.on_manual_edit(GeometryField::Width, 150.0);

    assert_eq!(
        h.session.next_outcome().await,
        Some(OutcomeDisposition::Applied)
    );
    assert_eq!(
        h.session.next_outcome().await,
        Some(OutcomeDisposition::Discarded)
    );

    assert_eq!(h.session.derived().confidence, Some(0.9));
    assert_eq!(h.session.stats().results_applied, 1);
    assert_eq!(h.session.stats().results_discarded, 1);

    let telemetry = h.recorder.telemetry();
    assert!(telemetry
        .iter()
        .any(|e| matches!(e, TelemetryEvent::RequestSuperseded { request_id: 1 })));
    assert!(telemetry
        .iter()
        .any(|e| matches!(e, TelemetryEvent::ResultDiscarded { request_id: 1 })));
    // the stale result never produced a user-visible message of its own
    assert_eq!(
        h.recorder
            .messages()
            .iter()
            .filter(|m| m.as_str() == "Dimensions updated")
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropping_session_cancels_live_request() {
    let service = ScriptedService::new(|_| Reply::ok(10_000, envelope(0.9)));
    let mut h = harness(&test_config(), service.clone());

    h.session.on_manual_edit(GeometryField::Width, 100.0);
    tokio::time::sleep(Duration::from_millis(301)).await;
    assert!(h.session.is_calculating());

    drop(h);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(service.cancellations(), 1);
}
