use chrono::Utc;
use heightmeasure_core::{
    MeasurementSession, Phase, Point3D, RecordStore, StoreError, CSV_HEADER,
};

fn complete_session(height_m: f64) -> MeasurementSession {
    let mut session = MeasurementSession::new();
    session.commit_point(Point3D::ORIGIN).unwrap();
    session.commit_point(Point3D::new(0.0, height_m, 0.0)).unwrap();
    session
}

#[test]
fn saved_record_keeps_meters_and_derives_labels() {
    let mut store = RecordStore::in_memory();
    let session = complete_session(1.8);

    let record = store
        .save(
            &session,
            Some("measurement_1.jpg".to_string()),
            Some("front door".to_string()),
        )
        .unwrap();

    assert!((record.distance().meters() - 1.8).abs() < 1e-9);
    assert_eq!(record.centimeters_label(), "180 cm");
    assert_eq!(record.feet_inches_label(), "5' 10.9\"");
    assert_eq!(record.image_ref(), Some("measurement_1.jpg"));
    assert_eq!(record.note(), Some("front door"));
    assert_eq!(store.records().unwrap(), vec![record]);
}

#[test]
fn save_after_reset_fails_with_session_not_complete() {
    let mut store = RecordStore::in_memory();
    let mut session = complete_session(1.2);

    store.save(&session, None, None).unwrap();
    session.reset();
    let err = store.save(&session, None, None).unwrap_err();

    assert!(matches!(err, StoreError::SessionNotComplete(Phase::Empty)));
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn export_on_empty_store_fails() {
    let store = RecordStore::in_memory();
    assert!(matches!(
        store.export_csv_in(&Utc),
        Err(StoreError::EmptyStore)
    ));
    assert!(matches!(store.export_csv(), Err(StoreError::EmptyStore)));
}

#[test]
fn export_with_one_record_has_header_and_one_row() {
    let mut store = RecordStore::in_memory();
    store.save(&complete_session(1.8), None, None).unwrap();

    let csv = store.export_csv_in(&Utc).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].contains("\"180.0\""));
    assert!(lines[1].contains("\"5' 10.9\"\"\""));
    assert!(csv.ends_with('\n'));
}

#[test]
fn export_preserves_insertion_order() {
    let mut store = RecordStore::in_memory();
    for height in [1.0, 1.5, 0.9] {
        store.save(&complete_session(height), None, None).unwrap();
    }

    let csv = store.export_csv_in(&Utc).unwrap();
    let centimeters: Vec<&str> = csv
        .lines()
        .skip(1)
        .map(|line| line.split(',').nth(1).unwrap())
        .collect();

    assert_eq!(centimeters, vec!["\"100.0\"", "\"150.0\"", "\"90.0\""]);
}

#[test]
fn timestamp_column_uses_second_precision_format() {
    let mut store = RecordStore::in_memory();
    let record = store.save(&complete_session(1.0), None, None).unwrap();

    let csv = store.export_csv_in(&Utc).unwrap();
    let expected = record.created_at().format("%Y-%m-%d %H:%M:%S").to_string();
    assert!(csv.lines().nth(1).unwrap().starts_with(&format!("\"{expected}\",")));
}
