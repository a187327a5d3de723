//! Measurement record repositories.
//!
//! # Responsibility
//! - Provide append/list/count over saved measurements.
//! - Offer an in-memory log and a SQLite-backed history.
//!
//! # Invariants
//! - Records are never updated or deleted through this contract.
//! - `list_records` order equals append order.

use crate::db::DbError;
use crate::model::record::{MeasurementRecord, RecordId, RecordValidationError};
use chrono::DateTime;
use log::error;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const RECORD_SELECT_SQL: &str = "SELECT
    uuid,
    created_at,
    distance_m,
    image_ref,
    note
FROM measurements";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for record persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    DuplicateId(RecordId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "measurement already stored: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted measurement data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DuplicateId(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Append-only storage contract for saved measurements.
pub trait RecordRepository {
    fn append_record(&mut self, record: &MeasurementRecord) -> RepoResult<()>;
    fn list_records(&self) -> RepoResult<Vec<MeasurementRecord>>;
    fn count_records(&self) -> RepoResult<usize>;
}

/// Process-local record log.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordRepository {
    records: Vec<MeasurementRecord>,
}

impl MemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordRepository for MemoryRecordRepository {
    fn append_record(&mut self, record: &MeasurementRecord) -> RepoResult<()> {
        if self.records.iter().any(|stored| stored.id() == record.id()) {
            return Err(RepoError::DuplicateId(record.id()));
        }
        self.records.push(record.clone());
        Ok(())
    }

    fn list_records(&self) -> RepoResult<Vec<MeasurementRecord>> {
        Ok(self.records.clone())
    }

    fn count_records(&self) -> RepoResult<usize> {
        Ok(self.records.len())
    }
}

/// SQLite-backed measurement history.
///
/// Owns its connection so it can live inside long-lived controllers.
pub struct SqliteRecordRepository {
    conn: Connection,
}

impl SqliteRecordRepository {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordRepository for SqliteRecordRepository {
    fn append_record(&mut self, record: &MeasurementRecord) -> RepoResult<()> {
        let result = self.conn.execute(
            "INSERT INTO measurements (
                uuid,
                created_at,
                distance_m,
                image_ref,
                note
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                record.id().to_string(),
                record.created_at().timestamp_millis(),
                record.distance().meters(),
                record.image_ref(),
                record.note(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(failure, _))
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(RepoError::DuplicateId(record.id()))
            }
            Err(err) => {
                error!(
                    "event=record_append module=repo status=error error_code=db_write_failed error={err}"
                );
                Err(err.into())
            }
        }
    }

    fn list_records(&self) -> RepoResult<Vec<MeasurementRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} ORDER BY seq ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn count_records(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM measurements;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<MeasurementRecord> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in measurements.uuid"
        ))
    })?;

    let created_at_ms: i64 = row.get("created_at")?;
    let created_at = DateTime::from_timestamp_millis(created_at_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{created_at_ms}` in measurements.created_at"
        ))
    })?;

    let record = MeasurementRecord::with_id(
        id,
        created_at,
        row.get("distance_m")?,
        row.get("image_ref")?,
        row.get("note")?,
    )?;
    Ok(record)
}
