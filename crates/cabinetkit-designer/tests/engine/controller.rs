use std::time::Duration;

use cabinetkit_core::{CommitSource, TelemetryEvent};
use cabinetkit_designer::{
    DerivedQuantities, EditSnapshot, Envelope, GeometryField, GeometryState, OutcomeDisposition,
    PartialGeometry, Point, ProjectStore, ResizeBox,
};

use crate::support::{envelope, harness, settle, test_config, Reply, ScriptedService};

#[tokio::test]
async fn test_session_seeds_from_default_geometry() {
    let h = harness(&test_config(), ScriptedService::immediate());
    assert_eq!(
        h.session.geometry(),
        GeometryState::new(50.0, 50.0, 200.0, 120.0)
    );
    assert!(!h.session.can_undo());
    assert!(!h.session.snap_enabled());
}

#[tokio::test]
async fn test_resize_below_minimum_is_clamped() {
    let mut h = harness(&test_config(), ScriptedService::immediate());
    let snapshot = h.session.on_resize_end(ResizeBox::size(10.0, 10.0)).unwrap();

    assert_eq!(snapshot.geometry.width, 50.0);
    assert_eq!(snapshot.geometry.height, 50.0);
    assert_eq!(h.store.get(), Some(snapshot.geometry));
}

#[tokio::test]
async fn test_resize_is_snapped_before_clamp() {
    let mut config = test_config();
    config.editing.snap_enabled = true;
    config.editing.grid_size = 40.0;
    let mut h = harness(&config, ScriptedService::immediate());

    // 55 snaps down to 40, then the floor raises it to 50
    let snapshot = h
        .session
        .on_resize_end(ResizeBox::at(0.0, 0.0, 55.0, 130.0))
        .unwrap();
    assert_eq!(snapshot.geometry, GeometryState::new(0.0, 0.0, 50.0, 120.0));
}

#[tokio::test]
async fn test_drag_snaps_to_grid() {
    let mut config = test_config();
    config.editing.snap_enabled = true;
    config.editing.grid_size = 10.0;
    let mut h = harness(&config, ScriptedService::immediate());

    let snapshot = h.session.on_drag_end(Point::new(120.0, 80.0)).unwrap();
    assert_eq!((snapshot.geometry.x, snapshot.geometry.y), (120.0, 80.0));

    let mut config = test_config();
    config.editing.snap_enabled = true;
    config.editing.grid_size = 7.0;
    let mut h = harness(&config, ScriptedService::immediate());

    let snapshot = h.session.on_drag_end(Point::new(120.0, 80.0)).unwrap();
    assert_eq!((snapshot.geometry.x, snapshot.geometry.y), (119.0, 77.0));
    // size untouched by a drag
    assert_eq!(snapshot.geometry.width, 200.0);
}

#[tokio::test]
async fn test_manual_input_is_coerced_and_clamped() {
    let mut h = harness(&test_config(), ScriptedService::immediate());

    let s = h.session.on_manual_edit(GeometryField::X, f64::NAN);
    assert_eq!(s.geometry.x, 0.0);

    let s = h.session.on_manual_edit(GeometryField::Y, -30.0);
    assert_eq!(s.geometry.y, 0.0);

    let s = h.session.on_manual_text(GeometryField::Width, "abc");
    assert_eq!(s.geometry.width, 50.0);

    let s = h.session.on_manual_text(GeometryField::Height, "  75 ");
    assert_eq!(s.geometry.height, 75.0);
}

#[tokio::test]
async fn test_snap_toggle_does_not_rewrite_history() {
    let mut h = harness(&test_config(), ScriptedService::immediate());

    h.session.on_drag_end(Point::new(123.0, 87.0));
    let before = h.session.snapshot();

    let toggled = h.session.set_snap_enabled(true);
    assert!(toggled.snap_enabled);
    assert_eq!(toggled.geometry, before.geometry);

    // undo brings back the unsnapped snapshot exactly
    assert_eq!(h.session.undo(), Some(before));
    assert_eq!(h.session.geometry().x, 123.0);
}

#[tokio::test]
async fn test_undo_redo_mirror_to_store() {
    let mut h = harness(&test_config(), ScriptedService::immediate());
    let initial = h.session.snapshot();

    h.session.on_manual_edit(GeometryField::Width, 300.0);
    let edited = h.session.snapshot();

    assert_eq!(h.session.undo(), Some(initial));
    assert_eq!(h.store.get(), Some(initial.geometry));
    assert!(h.session.can_redo());

    assert_eq!(h.session.redo(), Some(edited));
    assert_eq!(h.store.get(), Some(edited.geometry));
    assert_eq!(h.session.redo(), None);
}

#[tokio::test]
async fn test_new_edit_discards_redo_tail() {
    let mut h = harness(&test_config(), ScriptedService::immediate());

    h.session.on_manual_edit(GeometryField::Width, 300.0);
    h.session.undo();
    h.session.on_manual_edit(GeometryField::Height, 90.0);

    assert!(!h.session.can_redo());
    assert_eq!(h.session.redo(), None);
    assert_eq!(h.session.geometry().width, 200.0);
}

#[tokio::test]
async fn test_undo_on_fresh_session_is_noop() {
    let mut h = harness(&test_config(), ScriptedService::immediate());
    let before: EditSnapshot = h.session.snapshot();
    assert_eq!(h.session.undo(), None);
    assert_eq!(h.session.snapshot(), before);
    assert_eq!(h.store.get(), None);
}

#[tokio::test]
async fn test_history_depth_is_capped() {
    let mut config = test_config();
    config.editing.max_history = Some(3);
    let mut h = harness(&config, ScriptedService::immediate());

    for i in 0..10 {
        h.session.on_manual_edit(GeometryField::X, i as f64 + 1.0);
    }
    let mut undone = 0;
    while h.session.undo().is_some() {
        undone += 1;
    }
    assert_eq!(undone, 3);
    assert_eq!(h.session.geometry().x, 7.0);
}

#[tokio::test(start_paused = true)]
async fn test_undo_schedules_recalculation() {
    let mut h = harness(&test_config(), ScriptedService::immediate());

    h.session.on_manual_edit(GeometryField::Width, 300.0);
    h.session.next_outcome().await;
    h.session.undo();
    h.session.next_outcome().await;

    let calls = h.service.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].width_in, 200.0);
}

#[tokio::test(start_paused = true)]
async fn test_content_hash_becomes_next_cache_key() {
    let service = ScriptedService::new(|req| {
        Reply::ok(
            10,
            Envelope {
                content_sha256: Some(format!("hash-{}", req.width_in)),
                ..Default::default()
            },
        )
    });
    let mut h = harness(&test_config(), service);

    h.session.on_manual_edit(GeometryField::Width, 100.0);
    h.session.next_outcome().await;
    assert_eq!(h.session.cache_key().as_deref(), Some("hash-100"));

    h.session.on_manual_edit(GeometryField::Width, 110.0);
    h.session.next_outcome().await;

    let calls = h.service.calls();
    assert_eq!(calls[0].content_hash, None);
    assert_eq!(calls[1].content_hash.as_deref(), Some("hash-100"));
}

#[tokio::test(start_paused = true)]
async fn test_server_geometry_commits_without_new_request() {
    let service = ScriptedService::new(|_| {
        Reply::ok(
            10,
            Envelope {
                result: Some(DerivedQuantities {
                    area_ft2: Some(1.5),
                    geometry: Some(PartialGeometry {
                        height: Some(30.0),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
    });
    let mut h = harness(&test_config(), service);

    h.session.on_manual_edit(GeometryField::Width, 100.0);
    assert_eq!(
        h.session.next_outcome().await,
        Some(OutcomeDisposition::Applied)
    );

    // server height goes through the same floor as any edit
    assert_eq!(h.session.geometry().height, 50.0);
    assert_eq!(h.store.get(), Some(h.session.geometry()));
    assert_eq!(
        h.session.derived().quantities.as_ref().and_then(|q| q.area_ft2),
        Some(1.5)
    );
    assert!(h
        .recorder
        .telemetry()
        .contains(&TelemetryEvent::EditCommitted {
            source: CommitSource::Server
        }));

    // server commit is undoable like a manual one
    assert!(h.session.undo().is_some());
    assert_eq!(h.session.geometry().height, 120.0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    // one for the manual edit, one for the undo; none for the server commit
    assert_eq!(h.service.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_server_geometry_is_snapped_and_floored() {
    let service = ScriptedService::new(|_| {
        Reply::ok(
            10,
            Envelope {
                result: Some(DerivedQuantities {
                    geometry: Some(PartialGeometry {
                        x: Some(-13.0),
                        width: Some(123.0),
                        height: Some(13.0),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
    });
    let mut config = test_config();
    config.editing.snap_enabled = true;
    config.editing.grid_size = 10.0;
    let mut h = harness(&config, service);

    h.session.on_manual_edit(GeometryField::Y, 64.0);
    assert_eq!(h.session.geometry().y, 60.0);
    assert_eq!(
        h.session.next_outcome().await,
        Some(OutcomeDisposition::Applied)
    );

    // negative x raised to 0, width snapped, height snapped then floored
    assert_eq!(
        h.session.geometry(),
        GeometryState::new(0.0, 60.0, 120.0, 50.0)
    );
    assert!(h.session.snap_enabled());
    assert_eq!(h.store.get(), Some(h.session.geometry()));

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(h.service.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_low_confidence_flags_review() {
    let service = ScriptedService::new(|_| Reply::ok(10, envelope(0.42)));
    let mut h = harness(&test_config(), service);

    h.session.on_manual_edit(GeometryField::Width, 100.0);
    h.session.next_outcome().await;

    let status = h.session.status();
    assert_eq!(status.derived.confidence, Some(0.42));
    assert!(status.derived.requires_review);
    assert!(!status.is_calculating);
    assert!(h
        .recorder
        .messages()
        .contains(&"Engineering review recommended".to_string()));
}
