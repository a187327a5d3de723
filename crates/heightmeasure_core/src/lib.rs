//! Core domain logic for HeightMeasure.
//! This crate owns the two-point measurement state machine, the saved
//! record history and its CSV export. AR tracking, rendering and UI stay in
//! the host app.

pub mod config;
pub mod controller;
pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod units;

pub use config::ControllerConfig;
pub use controller::events::{HapticFeedback, MeasurementEvent, MeasurementListener};
pub use controller::measurement_controller::{ControllerError, FrameSnapshot, MeasurementController};
pub use controller::ports::{ImageCapture, RaycastAdapter, ScreenPoint};
pub use controller::status::{
    instruction_for, LimitedReason, StatusBoard, StatusLine, StatusTone, TrackingState,
};
pub use export::csv::{export_file_name, render_csv, write_csv_file, CSV_HEADER};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::point::{Distance, GeometryError, Point3D};
pub use model::record::{MeasurementRecord, RecordId, RecordValidationError};
pub use repo::record_repo::{
    MemoryRecordRepository, RecordRepository, RepoError, RepoResult, SqliteRecordRepository,
};
pub use service::record_store::{RecordStore, StoreError, StoreResult};
pub use session::measurement_session::{MeasurementSession, Phase, Segment, SessionError};
pub use units::{format_centimeters, format_feet_inches, to_centimeters, to_feet_inches};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
