//! Saved measurement record.
//!
//! # Responsibility
//! - Define the immutable history entry created when a measurement is saved.
//! - Derive display strings from the canonical meter value on demand.
//!
//! # Invariants
//! - `id` is stable, non-nil, and never reused.
//! - `distance` is the single stored representation of the height.
//! - `created_at` carries millisecond precision so it survives epoch-ms storage.

use crate::model::point::{Distance, GeometryError};
use crate::units::{centimeters_value, format_centimeters, format_feet_inches};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a saved measurement.
pub type RecordId = Uuid;

/// Validation failures for persisted or imported records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordValidationError {
    NilId,
    InvalidDistance(GeometryError),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "record id must not be nil"),
            Self::InvalidDistance(err) => write!(f, "record distance is invalid: {err}"),
        }
    }
}

impl Error for RecordValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NilId => None,
            Self::InvalidDistance(err) => Some(err),
        }
    }
}

/// One completed, saved measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    id: RecordId,
    created_at: DateTime<Utc>,
    #[serde(rename = "distance_m")]
    distance: Distance,
    /// Opaque handle or file name of a captured snapshot.
    image_ref: Option<String>,
    /// Free-text note. Never logged.
    note: Option<String>,
}

#[derive(Deserialize)]
struct RecordFields {
    id: RecordId,
    created_at: DateTime<Utc>,
    distance_m: f64,
    #[serde(default)]
    image_ref: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

impl<'de> Deserialize<'de> for MeasurementRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let fields = RecordFields::deserialize(deserializer)?;
        MeasurementRecord::with_id(
            fields.id,
            fields.created_at,
            fields.distance_m,
            fields.image_ref,
            fields.note,
        )
        .map_err(serde::de::Error::custom)
    }
}

impl MeasurementRecord {
    /// Creates a record stamped with a fresh id and the current time.
    pub fn new(distance: Distance, image_ref: Option<String>, note: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: now_millis(),
            distance,
            image_ref: normalize_optional(image_ref),
            note: normalize_optional(note),
        }
    }

    /// Rebuilds a record from persisted fields.
    ///
    /// # Errors
    /// - `NilId` when `id` is the nil UUID.
    /// - `InvalidDistance` when `distance_m` is negative or non-finite.
    pub fn with_id(
        id: RecordId,
        created_at: DateTime<Utc>,
        distance_m: f64,
        image_ref: Option<String>,
        note: Option<String>,
    ) -> Result<Self, RecordValidationError> {
        if id.is_nil() {
            return Err(RecordValidationError::NilId);
        }
        let distance =
            Distance::from_meters(distance_m).map_err(RecordValidationError::InvalidDistance)?;
        Ok(Self {
            id,
            created_at,
            distance,
            image_ref: normalize_optional(image_ref),
            note: normalize_optional(note),
        })
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn distance(&self) -> Distance {
        self.distance
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// `"180 cm"` style label.
    pub fn centimeters_label(&self) -> String {
        format_centimeters(self.distance)
    }

    /// `5' 10.9"` style label.
    pub fn feet_inches_label(&self) -> String {
        format_feet_inches(self.distance)
    }

    pub fn centimeters(&self) -> f64 {
        centimeters_value(self.distance)
    }
}

fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
