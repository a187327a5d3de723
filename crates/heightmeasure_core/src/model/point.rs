//! World-space geometry primitives.
//!
//! # Responsibility
//! - Carry raycast hit positions (meters, world space) through the core.
//! - Provide a validated `Distance` magnitude for unit conversion.
//!
//! # Invariants
//! - A `Distance` is always finite and `>= 0`.
//! - `Point3D` itself is a plain value; finiteness is checked where points
//!   enter committed state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Geometry validation errors for degenerate raycast output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    /// A coordinate or magnitude was NaN.
    NotANumber,
    /// A coordinate or magnitude was infinite.
    Infinite,
    /// A magnitude was below zero.
    Negative(f64),
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotANumber => write!(f, "invalid geometry: value is NaN"),
            Self::Infinite => write!(f, "invalid geometry: value is infinite"),
            Self::Negative(value) => {
                write!(f, "invalid geometry: distance must be >= 0, got {value}")
            }
        }
    }
}

impl Error for GeometryError {}

/// World-space position in meters, as reported by a raycast hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const ORIGIN: Point3D = Point3D::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Checks that every component is a finite number.
    pub fn validate(&self) -> Result<(), GeometryError> {
        for component in [self.x, self.y, self.z] {
            check_finite(component)?;
        }
        Ok(())
    }

    /// Euclidean distance to `other`.
    ///
    /// # Errors
    /// - Returns `GeometryError` when either point has non-finite components.
    pub fn distance_to(&self, other: &Point3D) -> Result<Distance, GeometryError> {
        self.validate()?;
        other.validate()?;
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        Distance::from_meters((dx * dx + dy * dy + dz * dz).sqrt())
    }

    /// Component-wise midpoint, used for placing the distance label.
    pub fn midpoint(&self, other: &Point3D) -> Point3D {
        Point3D::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

/// Non-negative, finite length in meters.
///
/// Canonical value for every derived display format.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Distance(f64);

impl Distance {
    pub const ZERO: Distance = Distance(0.0);

    /// Wraps a meter value after validating it.
    ///
    /// # Errors
    /// - `NotANumber` / `Infinite` for non-finite input.
    /// - `Negative` for values below zero. `-0.0` is normalized to `0.0`.
    pub fn from_meters(meters: f64) -> Result<Self, GeometryError> {
        check_finite(meters)?;
        if meters < 0.0 {
            return Err(GeometryError::Negative(meters));
        }
        Ok(Self(meters.abs()))
    }

    pub fn meters(self) -> f64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Distance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let meters = f64::deserialize(deserializer)?;
        Distance::from_meters(meters).map_err(serde::de::Error::custom)
    }
}

fn check_finite(value: f64) -> Result<(), GeometryError> {
    if value.is_nan() {
        return Err(GeometryError::NotANumber);
    }
    if value.is_infinite() {
        return Err(GeometryError::Infinite);
    }
    Ok(())
}
