//! Measurement controller.
//!
//! # Responsibility
//! - Feed per-frame raycast hits into the session preview.
//! - Handle add/save/reset/export actions with user-facing feedback.
//! - Schedule the automatic reset that follows a successful save.
//!
//! # Invariants
//! - A completed measurement is saved at most once.
//! - A failed save or export leaves session and store unchanged.
//! - Listeners are notified after state has been updated.

use crate::config::ControllerConfig;
use crate::controller::events::{MeasurementEvent, MeasurementListener};
use crate::controller::ports::{ImageCapture, RaycastAdapter, ScreenPoint};
use crate::controller::status::{instruction_for, StatusBoard, StatusLine, TrackingState};
use crate::export::csv::{export_file_name, write_csv_file};
use crate::model::point::{Distance, Point3D};
use crate::model::record::MeasurementRecord;
use crate::repo::record_repo::RecordRepository;
use crate::service::record_store::{RecordStore, StoreError, StoreResult};
use crate::session::measurement_session::{MeasurementSession, Phase, Segment, SessionError};
use chrono::{DateTime, Local, TimeZone};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

const NO_SURFACE_MESSAGE: &str = "Point the camera at a surface";

/// Errors returned by controller actions.
#[derive(Debug)]
pub enum ControllerError {
    /// The raycast under the crosshair found no surface.
    NoSurfaceDetected,
    /// The current measurement was already saved.
    AlreadySaved,
    Session(SessionError),
    Store(StoreError),
    /// Writing the export file failed.
    Export(io::Error),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSurfaceDetected => write!(f, "no surface detected under the crosshair"),
            Self::AlreadySaved => write!(f, "measurement already saved"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "export failed: {err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::NoSurfaceDetected | Self::AlreadySaved => None,
        }
    }
}

impl From<SessionError> for ControllerError {
    fn from(value: SessionError) -> Self {
        Self::Session(value)
    }
}

impl From<StoreError> for ControllerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Render-facing view of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub phase: Phase,
    /// Crosshair hit; `None` hides the crosshair.
    pub crosshair: Option<Point3D>,
    /// Dynamic line from the first point to the crosshair.
    pub preview: Option<Segment>,
    pub preview_distance: Option<Distance>,
    /// Final line between both committed points.
    pub committed: Option<Segment>,
}

/// Owns one session and one record store on behalf of the host UI.
pub struct MeasurementController<R: RecordRepository> {
    config: ControllerConfig,
    session: MeasurementSession,
    store: RecordStore<R>,
    status: StatusBoard,
    listeners: Vec<Box<dyn MeasurementListener>>,
    crosshair: Option<Point3D>,
    saved_current: bool,
    pending_reset_at: Option<Instant>,
}

impl<R: RecordRepository> MeasurementController<R> {
    pub fn new(store: RecordStore<R>, config: ControllerConfig) -> Self {
        let status = StatusBoard::new(config.feedback_display());
        Self {
            config,
            session: MeasurementSession::new(),
            store,
            status,
            listeners: Vec::new(),
            crosshair: None,
            saved_current: false,
            pending_reset_at: None,
        }
    }

    /// Registers a listener for commit/reset/save/export events.
    pub fn subscribe(&mut self, listener: impl MeasurementListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn session(&self) -> &MeasurementSession {
        &self.session
    }

    pub fn store(&self) -> &RecordStore<R> {
        &self.store
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.config.viewport_width = width;
        self.config.viewport_height = height;
    }

    pub fn screen_center(&self) -> ScreenPoint {
        ScreenPoint::center_of(self.config.viewport_width, self.config.viewport_height)
    }

    /// Per-frame crosshair update.
    ///
    /// Applies a due auto-reset first, then moves the preview to `hit`.
    /// A miss hides the crosshair and drops the dynamic line.
    pub fn on_frame(&mut self, hit: Option<Point3D>, now: Instant) -> FrameSnapshot {
        self.apply_due_reset(now);

        self.crosshair = hit.filter(|point| point.validate().is_ok());
        self.session.update_preview(self.crosshair);
        self.frame_snapshot()
    }

    /// Raycasts at the viewport centre and forwards to `on_frame`.
    pub fn tick(&mut self, adapter: &impl RaycastAdapter, now: Instant) -> FrameSnapshot {
        let hit = adapter.world_point(self.screen_center());
        self.on_frame(hit, now)
    }

    pub fn frame_snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            phase: self.session.phase(),
            crosshair: self.crosshair,
            preview: self.session.preview_segment(),
            preview_distance: self.session.preview_distance(),
            committed: self.session.committed_segment(),
        }
    }

    /// Commits the crosshair hit as the next measurement point.
    ///
    /// # Errors
    /// - `NoSurfaceDetected` when `hit` is `None`; shown as error feedback.
    /// - `Session(AlreadyComplete)` once two points exist; no feedback, the
    ///   UI is expected to have disabled the action.
    /// - `Session(InvalidGeometry)` for degenerate hits.
    pub fn add_point(
        &mut self,
        hit: Option<Point3D>,
        now: Instant,
    ) -> Result<Phase, ControllerError> {
        self.apply_due_reset(now);

        let Some(point) = hit else {
            warn!("event=point_commit module=controller status=rejected reason=no_surface");
            self.status.show_feedback(NO_SURFACE_MESSAGE, true, now);
            return Err(ControllerError::NoSurfaceDetected);
        };

        let phase = match self.session.commit_point(point) {
            Ok(phase) => phase,
            Err(err @ SessionError::InvalidGeometry(_)) => {
                self.status.show_feedback(NO_SURFACE_MESSAGE, true, now);
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        self.emit(MeasurementEvent::PointCommitted {
            index: self.session.points().len(),
            point,
        });

        if phase == Phase::Complete {
            self.saved_current = false;
            let distance = self.session.distance()?;
            let (centimeters, feet_inches) = self.session.display_labels()?;
            self.status.show_feedback(
                format!("Height: {centimeters} ({feet_inches}) - Tap 📷 to save"),
                false,
                now,
            );
            self.emit(MeasurementEvent::MeasurementCompleted { distance });
        }
        Ok(phase)
    }

    /// Raycasts at the viewport centre and forwards to `add_point`.
    pub fn add_point_from(
        &mut self,
        adapter: &impl RaycastAdapter,
        now: Instant,
    ) -> Result<Phase, ControllerError> {
        let hit = adapter.world_point(self.screen_center());
        self.add_point(hit, now)
    }

    /// Saves the complete measurement, optionally with a captured snapshot.
    ///
    /// On success an auto-reset is scheduled after `auto_reset_delay`.
    ///
    /// # Errors
    /// - `Store(SessionNotComplete)` before both points exist.
    /// - `AlreadySaved` when this measurement was saved already.
    /// - `Store(Repo(..))` when persistence fails.
    pub fn save_measurement(
        &mut self,
        capture: Option<&mut dyn ImageCapture>,
        note: Option<String>,
        now: Instant,
    ) -> Result<MeasurementRecord, ControllerError> {
        self.apply_due_reset(now);

        let phase = self.session.phase();
        if phase != Phase::Complete {
            return Err(StoreError::SessionNotComplete(phase).into());
        }
        if self.saved_current {
            return Err(ControllerError::AlreadySaved);
        }

        let image_ref = capture.and_then(|capture| capture.capture_snapshot());
        let record = match self.store.save(&self.session, image_ref, note) {
            Ok(record) => record,
            Err(err) => {
                self.status
                    .show_feedback(format!("Save failed: {err}"), true, now);
                return Err(err.into());
            }
        };

        self.saved_current = true;
        self.pending_reset_at = Some(now + self.config.auto_reset_delay());
        let total = self.store.len()?;
        self.status.show_feedback(
            format!("Measurement saved! ({total} total)"),
            false,
            now,
        );
        self.emit(MeasurementEvent::RecordSaved {
            id: record.id(),
            total,
        });
        Ok(record)
    }

    /// Clears the session and cancels any pending auto-reset.
    pub fn reset(&mut self) {
        self.session.reset();
        self.saved_current = false;
        self.pending_reset_at = None;
        self.emit(MeasurementEvent::Reset);
    }

    /// Writes all records to a timestamped CSV file in `dir`.
    ///
    /// Uses the local wall clock for the file name and row timestamps.
    pub fn export_csv(&mut self, dir: &Path, now: Instant) -> Result<PathBuf, ControllerError> {
        self.export_csv_at(dir, &Local::now(), now)
    }

    /// Writes all records to `dir`, naming the file after `wall_clock` and
    /// rendering timestamps in its time zone.
    ///
    /// # Errors
    /// - `Store(EmptyStore)` with no records; feedback asks for measurements.
    /// - `Export(io)` when the file cannot be written; records are kept.
    pub fn export_csv_at<Tz: TimeZone>(
        &mut self,
        dir: &Path,
        wall_clock: &DateTime<Tz>,
        now: Instant,
    ) -> Result<PathBuf, ControllerError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let csv = match self.store.export_csv_in(&wall_clock.timezone()) {
            Ok(csv) => csv,
            Err(StoreError::EmptyStore) => {
                self.status
                    .show_feedback("No measurements to export", true, now);
                return Err(StoreError::EmptyStore.into());
            }
            Err(err) => {
                self.status
                    .show_feedback(format!("Export failed: {err}"), true, now);
                return Err(err.into());
            }
        };

        let file_name = export_file_name(wall_clock);
        match write_csv_file(dir, &file_name, &csv) {
            Ok(path) => {
                let records = self.store.len()?;
                info!(
                    "event=csv_export module=controller status=ok rows={records} file={file_name}"
                );
                self.status
                    .show_feedback("CSV exported successfully", false, now);
                self.emit(MeasurementEvent::ExportWritten {
                    path: path.clone(),
                    records,
                });
                Ok(path)
            }
            Err(err) => {
                self.status
                    .show_feedback(format!("Export failed: {err}"), true, now);
                Err(ControllerError::Export(err))
            }
        }
    }

    pub fn on_tracking_state_changed(&mut self, state: TrackingState) {
        self.status.on_tracking_state_changed(state);
    }

    pub fn on_plane_added(&mut self) {
        self.status.on_plane_added();
    }

    pub fn on_plane_removed(&mut self) {
        self.status.on_plane_removed();
    }

    /// Surfaces an AR session failure as error feedback.
    pub fn on_session_failed(&mut self, message: &str, now: Instant) {
        warn!("event=ar_session module=controller status=error");
        self.status
            .show_feedback(format!("AR Error: {message}"), true, now);
    }

    pub fn status_line(&self, now: Instant) -> StatusLine {
        self.status.current(now)
    }

    pub fn instruction(&self) -> &'static str {
        instruction_for(self.session.phase())
    }

    /// `("180 cm", "5' 10.9\"")` once the measurement is complete.
    pub fn measurement_labels(&self) -> Option<(String, String)> {
        self.session.display_labels().ok()
    }

    /// Whether the save action should be offered.
    pub fn can_save(&self) -> bool {
        self.session.is_complete() && !self.saved_current
    }

    pub fn record_count(&self) -> StoreResult<usize> {
        self.store.len()
    }

    pub fn pending_reset_at(&self) -> Option<Instant> {
        self.pending_reset_at
    }

    fn apply_due_reset(&mut self, now: Instant) {
        if let Some(due_at) = self.pending_reset_at {
            if now >= due_at {
                info!("event=auto_reset module=controller status=ok");
                self.reset();
            }
        }
    }

    fn emit(&self, event: MeasurementEvent) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ControllerError, MeasurementController};
    use crate::config::ControllerConfig;
    use crate::controller::ports::ScreenPoint;
    use crate::model::point::Point3D;
    use crate::service::record_store::RecordStore;
    use crate::session::measurement_session::Phase;
    use std::time::Instant;

    #[test]
    fn tick_queries_viewport_centre() {
        let mut controller =
            MeasurementController::new(RecordStore::in_memory(), ControllerConfig::default());
        controller.set_viewport(400.0, 800.0);

        let adapter = |screen: ScreenPoint| {
            assert_eq!(screen, ScreenPoint::new(200.0, 400.0));
            Some(Point3D::ORIGIN)
        };
        let frame = controller.tick(&adapter, Instant::now());
        assert_eq!(frame.crosshair, Some(Point3D::ORIGIN));
    }

    #[test]
    fn miss_on_add_point_reports_no_surface() {
        let mut controller =
            MeasurementController::new(RecordStore::in_memory(), ControllerConfig::default());
        let now = Instant::now();
        let err = controller.add_point(None, now).unwrap_err();
        assert!(matches!(err, ControllerError::NoSurfaceDetected));
        assert_eq!(controller.session().phase(), Phase::Empty);
        assert_eq!(
            controller.status_line(now).text,
            "Point the camera at a surface"
        );
    }
}
