//! Two-point measurement session.
//!
//! # Responsibility
//! - Accept committed points until the measurement is complete.
//! - Track the per-frame preview point while the second point is pending.
//! - Compute the Euclidean distance once both points exist.
//!
//! # Invariants
//! - `points.len()` is always in `0..=2`.
//! - `commit_point` never changes state when it returns an error.
//! - `preview` is `None` outside `Phase::AwaitingSecondPoint`.

use crate::model::point::{Distance, GeometryError, Point3D};
use crate::units::{format_centimeters, format_feet_inches};
use log::{debug, info};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_POINTS: usize = 2;

/// Discrete state of one measurement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No point committed yet.
    Empty,
    /// First point committed; the preview line follows the crosshair.
    AwaitingSecondPoint,
    /// Both points committed; distance is available.
    Complete,
}

impl Phase {
    fn from_point_count(count: usize) -> Self {
        match count {
            0 => Self::Empty,
            1 => Self::AwaitingSecondPoint,
            _ => Self::Complete,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::AwaitingSecondPoint => "awaiting_second_point",
            Self::Complete => "complete",
        }
    }
}

/// Session state machine errors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionError {
    /// `commit_point` was called after both points were committed.
    AlreadyComplete,
    /// A result that needs two points was requested early.
    NotComplete(Phase),
    /// The point or resulting magnitude was degenerate.
    InvalidGeometry(GeometryError),
}

impl Display for SessionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyComplete => write!(f, "measurement already has two points"),
            Self::NotComplete(phase) => {
                write!(f, "measurement is not complete (phase={})", phase.as_str())
            }
            Self::InvalidGeometry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SessionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidGeometry(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GeometryError> for SessionError {
    fn from(value: GeometryError) -> Self {
        Self::InvalidGeometry(value)
    }
}

/// Line segment handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point3D,
    pub end: Point3D,
}

/// State machine for one measurement attempt.
///
/// Single-writer: the frame callback and user actions must be serialized by
/// the owner before calling in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementSession {
    points: Vec<Point3D>,
    preview: Option<Point3D>,
}

impl MeasurementSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        Phase::from_point_count(self.points.len())
    }

    pub fn points(&self) -> &[Point3D] {
        &self.points
    }

    pub fn preview(&self) -> Option<Point3D> {
        self.preview
    }

    pub fn is_complete(&self) -> bool {
        self.phase() == Phase::Complete
    }

    /// Commits one point and advances the phase.
    ///
    /// Returns the phase after the commit.
    ///
    /// # Errors
    /// - `AlreadyComplete` once two points exist; state is unchanged.
    /// - `InvalidGeometry` for non-finite coordinates, or when the second
    ///   point yields a distance that is not finite; state is unchanged.
    pub fn commit_point(&mut self, point: Point3D) -> Result<Phase, SessionError> {
        if self.points.len() >= MAX_POINTS {
            debug!("event=point_commit module=session status=rejected reason=already_complete");
            return Err(SessionError::AlreadyComplete);
        }
        point.validate()?;
        if let Some(first) = self.points.first() {
            if let Err(err) = first.distance_to(&point) {
                debug!("event=point_commit module=session status=rejected reason=invalid_distance");
                return Err(err.into());
            }
        }

        self.points.push(point);
        let phase = self.phase();
        if phase != Phase::AwaitingSecondPoint {
            self.preview = None;
        }

        info!(
            "event=point_commit module=session status=ok index={} phase={}",
            self.points.len(),
            phase.as_str()
        );
        if phase == Phase::Complete {
            if let Ok(distance) = self.distance() {
                info!(
                    "event=measurement_complete module=session status=ok distance_m={:.4}",
                    distance.meters()
                );
            }
        }
        Ok(phase)
    }

    /// Stores the live preview point while the second point is pending.
    ///
    /// Ignored in every other phase. Non-finite points clear the preview.
    pub fn update_preview(&mut self, point: Option<Point3D>) {
        if self.phase() != Phase::AwaitingSecondPoint {
            return;
        }
        self.preview = point.filter(|candidate| candidate.validate().is_ok());
    }

    /// Euclidean distance between the two committed points.
    ///
    /// # Errors
    /// - `NotComplete` unless the phase is `Complete`.
    pub fn distance(&self) -> Result<Distance, SessionError> {
        match self.points.as_slice() {
            [first, second] => Ok(first.distance_to(second)?),
            _ => Err(SessionError::NotComplete(self.phase())),
        }
    }

    /// Distance from the first point to the current preview, if any.
    pub fn preview_distance(&self) -> Option<Distance> {
        let segment = self.preview_segment()?;
        segment.start.distance_to(&segment.end).ok()
    }

    /// Segment from the first point to the preview point.
    pub fn preview_segment(&self) -> Option<Segment> {
        match (self.points.as_slice(), self.preview) {
            ([start], Some(end)) => Some(Segment { start: *start, end }),
            _ => None,
        }
    }

    /// Segment between both committed points.
    pub fn committed_segment(&self) -> Option<Segment> {
        match self.points.as_slice() {
            [start, end] => Some(Segment {
                start: *start,
                end: *end,
            }),
            _ => None,
        }
    }

    /// Centimeter and feet/inch labels for a complete measurement.
    pub fn display_labels(&self) -> Result<(String, String), SessionError> {
        let distance = self.distance()?;
        Ok((format_centimeters(distance), format_feet_inches(distance)))
    }

    /// Clears points and preview. Always succeeds.
    pub fn reset(&mut self) {
        let previous = self.phase();
        self.points.clear();
        self.preview = None;
        info!(
            "event=session_reset module=session status=ok previous_phase={}",
            previous.as_str()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{MeasurementSession, Phase, SessionError};
    use crate::model::point::Point3D;

    #[test]
    fn phase_follows_point_count() {
        let mut session = MeasurementSession::new();
        assert_eq!(session.phase(), Phase::Empty);
        assert_eq!(
            session.commit_point(Point3D::ORIGIN).unwrap(),
            Phase::AwaitingSecondPoint
        );
        assert_eq!(
            session.commit_point(Point3D::new(0.0, 1.0, 0.0)).unwrap(),
            Phase::Complete
        );
    }

    #[test]
    fn preview_is_ignored_outside_awaiting_phase() {
        let mut session = MeasurementSession::new();
        session.update_preview(Some(Point3D::new(1.0, 1.0, 1.0)));
        assert_eq!(session.preview(), None);
    }

    #[test]
    fn second_commit_clears_preview() {
        let mut session = MeasurementSession::new();
        session.commit_point(Point3D::ORIGIN).unwrap();
        session.update_preview(Some(Point3D::new(0.0, 0.4, 0.0)));
        session.commit_point(Point3D::new(0.0, 0.5, 0.0)).unwrap();
        assert_eq!(session.preview(), None);
        assert!(session.preview_segment().is_none());
    }

    #[test]
    fn non_finite_commit_leaves_state_untouched() {
        let mut session = MeasurementSession::new();
        let err = session
            .commit_point(Point3D::new(f64::INFINITY, 0.0, 0.0))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidGeometry(_)));
        assert_eq!(session.phase(), Phase::Empty);
    }

    #[test]
    fn overflowing_second_point_leaves_state_untouched() {
        let mut session = MeasurementSession::new();
        session.commit_point(Point3D::ORIGIN).unwrap();

        let err = session
            .commit_point(Point3D::new(1e200, 0.0, 0.0))
            .unwrap_err();

        assert!(matches!(err, SessionError::InvalidGeometry(_)));
        assert_eq!(session.phase(), Phase::AwaitingSecondPoint);
        assert_eq!(session.points(), &[Point3D::ORIGIN]);
    }

    #[test]
    fn distance_before_completion_reports_phase() {
        let mut session = MeasurementSession::new();
        session.commit_point(Point3D::ORIGIN).unwrap();
        assert_eq!(
            session.distance().unwrap_err(),
            SessionError::NotComplete(Phase::AwaitingSecondPoint)
        );
    }
}
