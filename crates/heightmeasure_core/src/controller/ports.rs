//! Host-provided collaborators.
//!
//! The AR subsystem and the snapshot pipeline live outside the core; the
//! controller only sees these two seams.

use crate::model::point::Point3D;
use serde::{Deserialize, Serialize};

/// Screen-space query position in view points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Centre of a `width` x `height` viewport.
    pub fn center_of(width: f64, height: f64) -> Self {
        Self::new(width / 2.0, height / 2.0)
    }
}

/// Raycast from a screen point to the first detected surface.
pub trait RaycastAdapter {
    /// Returns `None` when no surface lies under `screen_point`.
    fn world_point(&self, screen_point: ScreenPoint) -> Option<Point3D>;
}

impl<F> RaycastAdapter for F
where
    F: Fn(ScreenPoint) -> Option<Point3D>,
{
    fn world_point(&self, screen_point: ScreenPoint) -> Option<Point3D> {
        self(screen_point)
    }
}

/// Snapshot capture performed before a record is saved.
pub trait ImageCapture {
    /// Captures and stores a snapshot, returning its handle or file name.
    ///
    /// Returns `None` when capture or storage failed; the record is then
    /// saved without an image.
    fn capture_snapshot(&mut self) -> Option<String>;
}

impl<F> ImageCapture for F
where
    F: FnMut() -> Option<String>,
{
    fn capture_snapshot(&mut self) -> Option<String> {
        self()
    }
}
