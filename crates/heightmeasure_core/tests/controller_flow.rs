use chrono::{TimeZone, Utc};
use heightmeasure_core::{
    ControllerConfig, ControllerError, HapticFeedback, ImageCapture, LimitedReason,
    MeasurementController, MeasurementEvent, MemoryRecordRepository, Phase, Point3D,
    RecordStore, SessionError, StatusTone, StoreError, TrackingState,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

fn new_controller() -> MeasurementController<MemoryRecordRepository> {
    MeasurementController::new(RecordStore::in_memory(), ControllerConfig::default())
}

fn recorded_events(
    controller: &mut MeasurementController<MemoryRecordRepository>,
) -> Arc<Mutex<Vec<MeasurementEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    controller.subscribe(move |event: &MeasurementEvent| {
        sink.lock().unwrap().push(event.clone());
    });
    events
}

fn measure(
    controller: &mut MeasurementController<MemoryRecordRepository>,
    height_m: f64,
    now: Instant,
) {
    controller.add_point(Some(Point3D::ORIGIN), now).unwrap();
    controller
        .add_point(Some(Point3D::new(0.0, height_m, 0.0)), now)
        .unwrap();
}

#[test]
fn full_measurement_flow_emits_events_in_order() {
    let mut controller = new_controller();
    let events = recorded_events(&mut controller);
    let now = Instant::now();

    assert_eq!(controller.instruction(), "Point at person's feet and tap +");
    controller.add_point(Some(Point3D::ORIGIN), now).unwrap();
    assert_eq!(controller.instruction(), "Now point at person's head and tap +");

    let frame = controller.on_frame(Some(Point3D::new(0.0, 0.9, 0.0)), now);
    assert_eq!(frame.phase, Phase::AwaitingSecondPoint);
    assert!(frame.preview.is_some());
    assert!(frame.committed.is_none());

    let phase = controller
        .add_point(Some(Point3D::new(0.0, 1.8, 0.0)), now)
        .unwrap();
    assert_eq!(phase, Phase::Complete);
    assert_eq!(controller.instruction(), "Tap 📷 to save measurement");
    assert_eq!(
        controller.status_line(now).text,
        "Height: 180 cm (5' 10.9\") - Tap 📷 to save"
    );

    let mut capture = || Some("measurement_1.jpg".to_string());
    let record = controller
        .save_measurement(Some(&mut capture as &mut dyn ImageCapture), None, now)
        .unwrap();
    assert_eq!(record.image_ref(), Some("measurement_1.jpg"));
    assert_eq!(
        controller.status_line(now).text,
        "Measurement saved! (1 total)"
    );

    let events = events.lock().unwrap();
    let haptics: Vec<Option<HapticFeedback>> = events.iter().map(|e| e.haptic()).collect();
    assert_eq!(
        haptics,
        vec![
            Some(HapticFeedback::ImpactMedium),
            Some(HapticFeedback::ImpactMedium),
            None,
            Some(HapticFeedback::NotificationSuccess),
        ]
    );
    assert!(matches!(
        events[3],
        MeasurementEvent::RecordSaved { id, total: 1 } if id == record.id()
    ));
}

#[test]
fn third_add_is_rejected_without_feedback() {
    let mut controller = new_controller();
    let now = Instant::now();
    measure(&mut controller, 1.0, now);
    let status_before = controller.status_line(now);

    let err = controller
        .add_point(Some(Point3D::new(1.0, 1.0, 1.0)), now)
        .unwrap_err();

    assert!(matches!(
        err,
        ControllerError::Session(SessionError::AlreadyComplete)
    ));
    assert_eq!(controller.session().points().len(), 2);
    assert_eq!(controller.status_line(now), status_before);
}

#[test]
fn no_surface_feedback_clears_after_display_window() {
    let mut controller = new_controller();
    let start = Instant::now();

    let err = controller.add_point(None, start).unwrap_err();
    assert!(matches!(err, ControllerError::NoSurfaceDetected));

    let shown = controller.status_line(start + Duration::from_secs(2));
    assert_eq!(shown.text, "Point the camera at a surface");
    assert_eq!(shown.tone, StatusTone::Error);

    let settled = controller.status_line(start + Duration::from_secs(3));
    assert_eq!(settled.text, "Move to find surfaces");
    assert_eq!(settled.tone, StatusTone::Neutral);
}

#[test]
fn auto_reset_runs_on_first_frame_after_delay() {
    let mut controller = new_controller();
    let events = recorded_events(&mut controller);
    let start = Instant::now();
    measure(&mut controller, 1.5, start);
    controller.save_measurement(None, None, start).unwrap();
    assert!(!controller.can_save());

    let early = controller.on_frame(None, start + Duration::from_millis(1_000));
    assert_eq!(early.phase, Phase::Complete);

    let due = controller.on_frame(None, start + Duration::from_millis(1_500));
    assert_eq!(due.phase, Phase::Empty);
    assert_eq!(controller.pending_reset_at(), None);
    assert_eq!(events.lock().unwrap().last(), Some(&MeasurementEvent::Reset));
}

#[test]
fn saving_twice_is_rejected() {
    let mut controller = new_controller();
    let now = Instant::now();
    measure(&mut controller, 1.2, now);

    controller.save_measurement(None, None, now).unwrap();
    let err = controller.save_measurement(None, None, now).unwrap_err();

    assert!(matches!(err, ControllerError::AlreadySaved));
    assert_eq!(controller.record_count().unwrap(), 1);
}

#[test]
fn save_then_reset_then_save_fails_with_session_not_complete() {
    let mut controller = new_controller();
    let now = Instant::now();
    measure(&mut controller, 1.2, now);

    controller.save_measurement(None, None, now).unwrap();
    controller.reset();
    let err = controller.save_measurement(None, None, now).unwrap_err();

    assert!(matches!(
        err,
        ControllerError::Store(StoreError::SessionNotComplete(Phase::Empty))
    ));
}

#[test]
fn export_writes_named_file_and_reports_success() {
    let mut controller = new_controller();
    let now = Instant::now();
    measure(&mut controller, 1.8, now);
    controller
        .save_measurement(None, Some("hall".to_string()), now)
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let wall_clock = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 1).unwrap();
    let path = controller
        .export_csv_at(dir.path(), &wall_clock, now)
        .unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "height_measurements_2026-10-16_08-00-01.csv"
    );
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
    assert!(content.lines().nth(1).unwrap().ends_with("\"hall\""));
    assert_eq!(controller.status_line(now).text, "CSV exported successfully");
}

#[test]
fn export_on_empty_store_notifies_user() {
    let mut controller = new_controller();
    let now = Instant::now();
    let dir = tempfile::tempdir().unwrap();

    let err = controller.export_csv(dir.path(), now).unwrap_err();

    assert!(matches!(err, ControllerError::Store(StoreError::EmptyStore)));
    assert_eq!(controller.status_line(now).text, "No measurements to export");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn export_failure_keeps_records_for_retry() {
    let mut controller = new_controller();
    let now = Instant::now();
    measure(&mut controller, 1.0, now);
    controller.save_measurement(None, None, now).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let err = controller.export_csv(&blocker, now).unwrap_err();

    assert!(matches!(err, ControllerError::Export(_)));
    assert!(controller
        .status_line(now)
        .text
        .starts_with("Export failed: "));
    assert_eq!(controller.record_count().unwrap(), 1);
}

#[test]
fn tracking_and_plane_events_drive_status() {
    let mut controller = new_controller();
    let now = Instant::now();
    assert_eq!(controller.status_line(now).text, "Move to find a surface");

    controller.on_tracking_state_changed(TrackingState::Limited(LimitedReason::Initializing));
    assert_eq!(controller.status_line(now).text, "Starting AR...");

    controller.on_plane_added();
    let ready = controller.status_line(now);
    assert_eq!(ready.text, "Surface detected - ready to measure");
    assert_eq!(ready.tone, StatusTone::Success);

    controller.on_session_failed("camera interrupted", now);
    assert_eq!(
        controller.status_line(now).text,
        "AR Error: camera interrupted"
    );
}

#[test]
fn frame_miss_hides_crosshair_and_drops_preview() {
    let mut controller = new_controller();
    let now = Instant::now();
    controller.add_point(Some(Point3D::ORIGIN), now).unwrap();
    controller.on_frame(Some(Point3D::new(0.0, 0.5, 0.0)), now);

    let frame = controller.on_frame(None, now);

    assert_eq!(frame.crosshair, None);
    assert_eq!(frame.preview, None);
    assert_eq!(frame.phase, Phase::AwaitingSecondPoint);
}

#[test]
fn overflowing_second_point_is_rejected_without_completing() {
    let mut controller = new_controller();
    let events = recorded_events(&mut controller);
    let now = Instant::now();
    controller.add_point(Some(Point3D::ORIGIN), now).unwrap();

    let err = controller
        .add_point(Some(Point3D::new(1e200, 0.0, 0.0)), now)
        .unwrap_err();

    assert!(matches!(
        err,
        ControllerError::Session(SessionError::InvalidGeometry(_))
    ));
    assert_eq!(controller.session().phase(), Phase::AwaitingSecondPoint);
    assert!(!controller.can_save());
    assert_eq!(controller.status_line(now).text, "Point the camera at a surface");
    assert_eq!(events.lock().unwrap().len(), 1);
}
