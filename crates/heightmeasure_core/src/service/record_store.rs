//! Append-only store of saved measurements.
//!
//! # Responsibility
//! - Turn a complete session into an immutable `MeasurementRecord`.
//! - Serialize the history to CSV in insertion order.
//!
//! # Invariants
//! - `save` never mutates or resets the session it reads.
//! - Insertion order, chronological order and export order are the same.
//! - A failed save or export leaves previously stored records untouched.

use crate::export::csv::render_csv;
use crate::model::record::MeasurementRecord;
use crate::repo::record_repo::{MemoryRecordRepository, RecordRepository, RepoError};
use crate::session::measurement_session::{MeasurementSession, Phase, SessionError};
use chrono::{Local, TimeZone};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store errors.
#[derive(Debug)]
pub enum StoreError {
    /// `save` was called before both points were committed.
    SessionNotComplete(Phase),
    /// `export_csv` was called with no saved records.
    EmptyStore,
    /// The session's distance could not be computed.
    Session(SessionError),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionNotComplete(phase) => write!(
                f,
                "cannot save an incomplete measurement (phase={})",
                phase.as_str()
            ),
            Self::EmptyStore => write!(f, "no measurements to export"),
            Self::Session(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Session(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::SessionNotComplete(_) | Self::EmptyStore => None,
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<SessionError> for StoreError {
    fn from(value: SessionError) -> Self {
        match value {
            SessionError::NotComplete(phase) => Self::SessionNotComplete(phase),
            other => Self::Session(other),
        }
    }
}

/// Measurement history facade over a repository implementation.
pub struct RecordStore<R: RecordRepository> {
    repo: R,
}

impl RecordStore<MemoryRecordRepository> {
    /// Creates a process-local store with no persistence.
    pub fn in_memory() -> Self {
        Self::new(MemoryRecordRepository::new())
    }
}

impl<R: RecordRepository> RecordStore<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Saves a complete session as a new record.
    ///
    /// # Errors
    /// - `SessionNotComplete` unless `session.phase() == Phase::Complete`.
    /// - `Repo` when persistence fails; nothing is appended in that case.
    pub fn save(
        &mut self,
        session: &MeasurementSession,
        image_ref: Option<String>,
        note: Option<String>,
    ) -> StoreResult<MeasurementRecord> {
        let phase = session.phase();
        if phase != Phase::Complete {
            warn!(
                "event=record_save module=store status=rejected reason=session_not_complete phase={}",
                phase.as_str()
            );
            return Err(StoreError::SessionNotComplete(phase));
        }

        let distance = session.distance()?;
        let record = MeasurementRecord::new(distance, image_ref, note);
        self.repo.append_record(&record)?;

        info!(
            "event=record_save module=store status=ok record_id={} distance_m={:.4} has_image={} has_note={}",
            record.id(),
            distance.meters(),
            record.image_ref().is_some(),
            record.note().is_some()
        );
        Ok(record)
    }

    /// All records in insertion order.
    pub fn records(&self) -> StoreResult<Vec<MeasurementRecord>> {
        Ok(self.repo.list_records()?)
    }

    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.repo.count_records()?)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// CSV document with timestamps in the device's local time zone.
    ///
    /// # Errors
    /// - `EmptyStore` when no record has been saved.
    pub fn export_csv(&self) -> StoreResult<String> {
        self.export_csv_in(&Local)
    }

    /// CSV document with timestamps rendered in `tz`.
    pub fn export_csv_in<Tz: TimeZone>(&self, tz: &Tz) -> StoreResult<String>
    where
        Tz::Offset: std::fmt::Display,
    {
        let records = self.repo.list_records()?;
        if records.is_empty() {
            warn!("event=csv_export module=store status=rejected reason=empty_store");
            return Err(StoreError::EmptyStore);
        }

        let csv = render_csv(&records, tz);
        info!(
            "event=csv_export module=store status=ok rows={} bytes={}",
            records.len(),
            csv.len()
        );
        Ok(csv)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::{RecordStore, StoreError};
    use crate::model::point::Point3D;
    use crate::session::measurement_session::{MeasurementSession, Phase};

    #[test]
    fn save_rejects_empty_session() {
        let mut store = RecordStore::in_memory();
        let err = store
            .save(&MeasurementSession::new(), None, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::SessionNotComplete(Phase::Empty)));
        assert_eq!(store.len().unwrap(), 0);
    }

    #[test]
    fn save_does_not_touch_session() {
        let mut session = MeasurementSession::new();
        session.commit_point(Point3D::ORIGIN).unwrap();
        session.commit_point(Point3D::new(0.0, 1.2, 0.0)).unwrap();
        let before = session.clone();

        let mut store = RecordStore::in_memory();
        store.save(&session, None, Some("kid".to_string())).unwrap();

        assert_eq!(session, before);
        assert_eq!(store.len().unwrap(), 1);
    }
}
