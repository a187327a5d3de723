//! Observable controller events and haptic mapping.

use crate::model::point::{Distance, Point3D};
use crate::model::record::RecordId;
use std::path::PathBuf;

/// Fire-and-forget notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementEvent {
    /// A point was committed; `index` is 1-based.
    PointCommitted { index: usize, point: Point3D },
    /// The second point was committed.
    MeasurementCompleted { distance: Distance },
    /// The session returned to `Empty`.
    Reset,
    /// A record was appended; `total` is the new store size.
    RecordSaved { id: RecordId, total: usize },
    /// An export file was written.
    ExportWritten { path: PathBuf, records: usize },
}

/// Haptic pattern the host should play for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticFeedback {
    ImpactMedium,
    ImpactLight,
    NotificationSuccess,
}

impl MeasurementEvent {
    pub fn haptic(&self) -> Option<HapticFeedback> {
        match self {
            Self::PointCommitted { .. } => Some(HapticFeedback::ImpactMedium),
            Self::Reset => Some(HapticFeedback::ImpactLight),
            Self::RecordSaved { .. } => Some(HapticFeedback::NotificationSuccess),
            Self::MeasurementCompleted { .. } | Self::ExportWritten { .. } => None,
        }
    }
}

/// Receives controller events. Closures implement this directly.
pub trait MeasurementListener: Send {
    fn on_event(&self, event: &MeasurementEvent);
}

impl<F> MeasurementListener for F
where
    F: Fn(&MeasurementEvent) + Send,
{
    fn on_event(&self, event: &MeasurementEvent) {
        self(event)
    }
}
