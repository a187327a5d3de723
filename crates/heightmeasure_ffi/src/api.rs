//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the measurement flow to Dart via FRB as plain-data envelopes.
//! - Own the one process-global controller and its SQLite record store.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call runs under the controller mutex; calls are serialized.
//! - A failed store open is retried on the next call instead of cached.

use heightmeasure_core::db::open_db;
use heightmeasure_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    ControllerConfig, ControllerError, FrameSnapshot, MeasurementController, MeasurementRecord,
    Phase, Point3D, RecordStore, SqliteRecordRepository, StatusTone, TrackingState,
};
use log::{error, warn};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Instant;

const RECORDS_DB_FILE_NAME: &str = "heightmeasure_records.sqlite3";
static RECORDS_DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static CONTROLLER: OnceLock<Mutex<Option<MeasurementController<SqliteRecordRepository>>>> =
    OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// World-space point in meters as delivered by the host raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FfiPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<FfiPoint> for Point3D {
    fn from(value: FfiPoint) -> Self {
        Point3D::new(value.x, value.y, value.z)
    }
}

impl From<Point3D> for FfiPoint {
    fn from(value: Point3D) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }
}

/// Render state for one AR frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameResponse {
    /// Session phase (`empty|awaiting_second_point|complete`).
    pub phase: String,
    /// Crosshair position; `None` hides the crosshair.
    pub crosshair: Option<FfiPoint>,
    /// Start of the dynamic preview line, when one is drawn.
    pub preview_start: Option<FfiPoint>,
    /// Live `"<n> cm"` label for the preview line.
    pub preview_label: Option<String>,
    /// Both committed points once the measurement is complete.
    pub committed: Option<(FfiPoint, FfiPoint)>,
    /// Set when the frame could not be processed.
    pub message: String,
}

/// Action response envelope for add/save/reset/export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Session phase after the action.
    pub phase: String,
    /// `"180 cm"` once the measurement is complete.
    pub height_cm: Option<String>,
    /// `5' 10.9"` once the measurement is complete.
    pub height_feet_inches: Option<String>,
    /// Saved record ID for `measure_save`.
    pub record_id: Option<String>,
    /// Written file path for `measure_export_csv`.
    pub path: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl MeasureActionResponse {
    fn from_controller(
        controller: &MeasurementController<SqliteRecordRepository>,
        ok: bool,
        message: impl Into<String>,
    ) -> Self {
        let labels = controller.measurement_labels();
        Self {
            ok,
            phase: controller.session().phase().as_str().to_string(),
            height_cm: labels.as_ref().map(|(cm, _)| cm.clone()),
            height_feet_inches: labels.map(|(_, feet_inches)| feet_inches),
            record_id: None,
            path: None,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            phase: Phase::Empty.as_str().to_string(),
            height_cm: None,
            height_feet_inches: None,
            record_id: None,
            path: None,
            message: message.into(),
        }
    }
}

/// Status line, instruction and save/export affordances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureStatusResponse {
    pub status_text: String,
    /// `neutral|success|warning|error`.
    pub status_tone: String,
    pub instruction: String,
    pub can_save: bool,
    pub record_count: u32,
}

/// One saved measurement for history display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureRecordItem {
    pub record_id: String,
    pub created_at_ms: i64,
    pub height_cm: String,
    pub height_feet_inches: String,
    pub image_ref: Option<String>,
    pub note: Option<String>,
}

/// Saved measurement history envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasureRecordsResponse {
    pub items: Vec<MeasureRecordItem>,
    pub message: String,
}

/// Feeds the crosshair raycast result for the current frame.
///
/// # FFI contract
/// - Sync call, expected once per rendered frame.
/// - Applies a due auto-reset before updating the preview.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_frame(hit: Option<FfiPoint>) -> FrameResponse {
    match with_controller(|controller| controller.on_frame(hit.map(Point3D::from), Instant::now()))
    {
        Ok(snapshot) => to_frame_response(snapshot),
        Err(message) => FrameResponse {
            phase: Phase::Empty.as_str().to_string(),
            crosshair: None,
            preview_start: None,
            preview_label: None,
            committed: None,
            message,
        },
    }
}

/// Commits the crosshair hit as the next measurement point.
///
/// # FFI contract
/// - `hit=None` means no surface under the crosshair.
/// - Never panics; failures return `ok=false` with a message.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_add_point(hit: Option<FfiPoint>) -> MeasureActionResponse {
    action(|controller| {
        let result = controller.add_point(hit.map(Point3D::from), Instant::now());
        match result {
            Ok(Phase::Complete) => {
                MeasureActionResponse::from_controller(controller, true, "Measurement complete.")
            }
            Ok(_) => MeasureActionResponse::from_controller(controller, true, "Point added."),
            Err(err) => failure_for(controller, "measure_add_point", &err),
        }
    })
}

/// Clears the current measurement and cancels a pending auto-reset.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_reset() -> MeasureActionResponse {
    action(|controller| {
        controller.reset();
        MeasureActionResponse::from_controller(controller, true, "Measurement reset.")
    })
}

/// Saves the complete measurement.
///
/// Input semantics:
/// - `image_ref`: snapshot handle already written by the host, if any.
/// - `note`: optional free-text note; blank values are dropped.
///
/// # FFI contract
/// - DB-backed execution.
/// - Never panics; returns the new record ID on success.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_save(image_ref: Option<String>, note: Option<String>) -> MeasureActionResponse {
    action(|controller| {
        let mut snapshot = image_ref;
        let mut capture = move || snapshot.take();
        match controller.save_measurement(Some(&mut capture), note, Instant::now()) {
            Ok(record) => {
                let mut response =
                    MeasureActionResponse::from_controller(controller, true, "Measurement saved.");
                response.record_id = Some(record.id().to_string());
                response
            }
            Err(err) => failure_for(controller, "measure_save", &err),
        }
    })
}

/// Writes all saved measurements to a timestamped CSV file in `dir`.
///
/// # FFI contract
/// - Performs blocking file I/O.
/// - Never panics; returns the written path on success.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_export_csv(dir: String) -> MeasureActionResponse {
    action(|controller| {
        match controller.export_csv(Path::new(dir.trim()), Instant::now()) {
            Ok(path) => {
                let mut response =
                    MeasureActionResponse::from_controller(controller, true, "CSV exported.");
                response.path = Some(path.display().to_string());
                response
            }
            Err(err) => failure_for(controller, "measure_export_csv", &err),
        }
    })
}

/// Current status line and instruction text.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_status() -> MeasureStatusResponse {
    let result = with_controller(|controller| {
        let line = controller.status_line(Instant::now());
        MeasureStatusResponse {
            status_text: line.text,
            status_tone: tone_label(line.tone).to_string(),
            instruction: controller.instruction().to_string(),
            can_save: controller.can_save(),
            record_count: status_record_count(controller),
        }
    });
    result.unwrap_or_else(|message| MeasureStatusResponse {
        status_text: message,
        status_tone: tone_label(StatusTone::Error).to_string(),
        instruction: String::new(),
        can_save: false,
        record_count: 0,
    })
}

/// Reports an AR tracking state change (`normal`, `limited:<reason>`,
/// `not_available`).
///
/// Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_tracking_changed(state: String) -> String {
    let Some(state) = TrackingState::parse(&state) else {
        return format!("unsupported tracking state `{}`", state.trim());
    };
    match with_controller(|controller| controller.on_tracking_state_changed(state)) {
        Ok(()) => String::new(),
        Err(message) => message,
    }
}

/// Reports a newly detected plane anchor.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_plane_added() -> String {
    with_controller(|controller| controller.on_plane_added()).err().unwrap_or_default()
}

/// Reports a removed plane anchor.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_plane_removed() -> String {
    with_controller(|controller| controller.on_plane_removed()).err().unwrap_or_default()
}

/// Lists saved measurements in insertion order.
///
/// # FFI contract
/// - DB-backed execution.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn measure_records() -> MeasureRecordsResponse {
    let result = with_controller(|controller| controller.store().records())
        .and_then(|records| records.map_err(|err| format!("measure_records failed: {err}")));
    match result {
        Ok(records) => {
            let items = records.iter().map(to_record_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No measurements.".to_string()
            } else {
                format!("Found {} measurement(s).", items.len())
            };
            MeasureRecordsResponse { items, message }
        }
        Err(message) => MeasureRecordsResponse {
            items: Vec::new(),
            message,
        },
    }
}

fn status_record_count(controller: &MeasurementController<SqliteRecordRepository>) -> u32 {
    match controller.record_count() {
        Ok(count) => u32::try_from(count).unwrap_or(u32::MAX),
        Err(err) => {
            warn!("event=record_count module=ffi status=fallback error={err}");
            0
        }
    }
}

fn action(
    f: impl FnOnce(&mut MeasurementController<SqliteRecordRepository>) -> MeasureActionResponse,
) -> MeasureActionResponse {
    with_controller(f).unwrap_or_else(MeasureActionResponse::failure)
}

fn failure_for(
    controller: &MeasurementController<SqliteRecordRepository>,
    operation: &str,
    err: &ControllerError,
) -> MeasureActionResponse {
    MeasureActionResponse::from_controller(controller, false, format!("{operation} failed: {err}"))
}

fn with_controller<T>(
    f: impl FnOnce(&mut MeasurementController<SqliteRecordRepository>) -> T,
) -> Result<T, String> {
    let slot = CONTROLLER.get_or_init(|| Mutex::new(None));
    let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

    if guard.is_none() {
        *guard = Some(open_controller()?);
    }
    match guard.as_mut() {
        Some(controller) => Ok(f(controller)),
        None => Err("measurement controller unavailable".to_string()),
    }
}

fn open_controller() -> Result<MeasurementController<SqliteRecordRepository>, String> {
    let db_path = resolve_records_db_path();
    let conn = open_db(&db_path).map_err(|err| {
        error!("event=controller_open module=ffi status=error error={err}");
        format!("records DB open failed: {err}")
    })?;
    let store = RecordStore::new(SqliteRecordRepository::new(conn));
    Ok(MeasurementController::new(store, ControllerConfig::default()))
}

fn resolve_records_db_path() -> PathBuf {
    RECORDS_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("HEIGHTMEASURE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
                warn!("event=db_path module=ffi status=fallback reason=blank_env");
            }
            std::env::temp_dir().join(RECORDS_DB_FILE_NAME)
        })
        .clone()
}

fn to_frame_response(snapshot: FrameSnapshot) -> FrameResponse {
    FrameResponse {
        phase: snapshot.phase.as_str().to_string(),
        crosshair: snapshot.crosshair.map(FfiPoint::from),
        preview_start: snapshot.preview.map(|segment| segment.start.into()),
        preview_label: snapshot
            .preview_distance
            .map(heightmeasure_core::format_centimeters),
        committed: snapshot
            .committed
            .map(|segment| (segment.start.into(), segment.end.into())),
        message: String::new(),
    }
}

fn to_record_item(record: &MeasurementRecord) -> MeasureRecordItem {
    MeasureRecordItem {
        record_id: record.id().to_string(),
        created_at_ms: record.created_at().timestamp_millis(),
        height_cm: record.centimeters_label(),
        height_feet_inches: record.feet_inches_label(),
        image_ref: record.image_ref().map(str::to_string),
        note: record.note().map(str::to_string),
    }
}

fn tone_label(tone: StatusTone) -> &'static str {
    match tone {
        StatusTone::Neutral => "neutral",
        StatusTone::Success => "success",
        StatusTone::Warning => "warning",
        StatusTone::Error => "error",
    }
}
