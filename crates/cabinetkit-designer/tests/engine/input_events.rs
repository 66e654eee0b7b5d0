use cabinetkit_designer::{EventEffect, GeometryState, InputEvent};

use crate::support::{harness, test_config, ScriptedService};

fn event(line: &str) -> InputEvent {
    serde_json::from_str(line).unwrap()
}

#[tokio::test]
async fn test_replayed_stream_drives_session() {
    let mut h = harness(&test_config(), ScriptedService::immediate());

    let lines = [
        r#"{"type":"dragEnd","x":100,"y":40}"#,
        r#"{"type":"resizeEnd","width":10,"height":300}"#,
        r#"{"type":"manualFieldChange","field":"x","value":"oops"}"#,
        r#"{"type":"undoRequested"}"#,
    ];
    let effects: Vec<EventEffect> = lines.iter().map(|l| h.session.handle(event(l))).collect();

    assert_eq!(
        h.session.geometry(),
        GeometryState::new(100.0, 40.0, 50.0, 300.0)
    );
    assert!(matches!(effects[2], EventEffect::Committed(s) if s.geometry.x == 0.0));
    assert!(h.session.can_redo());

    let redo = h.session.handle(event(r#"{"type":"redoRequested"}"#));
    assert!(matches!(redo, EventEffect::Committed(s) if s.geometry.x == 0.0));
}

#[tokio::test]
async fn test_mode_events() {
    let mut h = harness(&test_config(), ScriptedService::immediate());

    assert_eq!(
        h.session.handle(event(r#"{"type":"toggleMeasurement"}"#)),
        EventEffect::ModeChanged { measuring: true }
    );
    assert_eq!(
        h.session.handle(event(r#"{"type":"dragEnd","x":1,"y":1}"#)),
        EventEffect::Ignored
    );
    assert_eq!(
        h.session.handle(event(r#"{"type":"pointerClick","x":0,"y":0}"#)),
        EventEffect::Ignored
    );
    assert!(matches!(
        h.session.handle(event(r#"{"type":"pointerClick","x":30,"y":0}"#)),
        EventEffect::Measured(m) if m.distance == 3.0
    ));
    assert_eq!(
        h.session.handle(event(r#"{"type":"escapeRequested"}"#)),
        EventEffect::ModeChanged { measuring: false }
    );
    assert_eq!(
        h.session.handle(event(r#"{"type":"escapeRequested"}"#)),
        EventEffect::Ignored
    );
}

#[tokio::test]
async fn test_toggle_snap_event_commits_flag() {
    let mut h = harness(&test_config(), ScriptedService::immediate());

    let effect = h.session.handle(event(r#"{"type":"toggleSnap"}"#));
    assert!(matches!(effect, EventEffect::Committed(s) if s.snap_enabled));
    assert!(h.session.snap_enabled());
    assert!(h.session.can_undo());
}
