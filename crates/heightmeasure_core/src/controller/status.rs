//! Status line and instruction text.
//!
//! # Responsibility
//! - Derive the ambient status from AR tracking state and plane count.
//! - Overlay transient feedback that clears itself after a display window.
//! - Map the session phase to the instruction shown to the user.
//!
//! # Invariants
//! - `current(now)` is pure; expiry is evaluated against the given instant.
//! - When transient feedback expires the status settles on the plane-count
//!   fallback unless tracking reported something newer.

use crate::session::measurement_session::Phase;
use log::info;
use serde::Serialize;
use std::time::{Duration, Instant};

pub const STATUS_SEARCHING_INITIAL: &str = "Move to find a surface";
pub const STATUS_SEARCHING: &str = "Move to find surfaces";
pub const STATUS_SURFACE_READY: &str = "Surface detected - ready to measure";

/// Reason reported with limited tracking quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitedReason {
    ExcessiveMotion,
    InsufficientFeatures,
    Initializing,
    Relocalizing,
    Other,
}

/// Camera tracking quality as reported by the AR host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Normal,
    Limited(LimitedReason),
    NotAvailable,
}

impl TrackingState {
    /// Parses host strings such as `normal`, `limited:excessive_motion`.
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "normal" => Some(Self::Normal),
            "not_available" | "unavailable" => Some(Self::NotAvailable),
            "limited" => Some(Self::Limited(LimitedReason::Other)),
            other => {
                let reason = other.strip_prefix("limited:")?;
                let reason = match reason {
                    "excessive_motion" => LimitedReason::ExcessiveMotion,
                    "insufficient_features" => LimitedReason::InsufficientFeatures,
                    "initializing" => LimitedReason::Initializing,
                    "relocalizing" => LimitedReason::Relocalizing,
                    _ => LimitedReason::Other,
                };
                Some(Self::Limited(reason))
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Limited(_) => "limited",
            Self::NotAvailable => "not_available",
        }
    }
}

/// Presentation hint for the status line background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Neutral,
    Success,
    Warning,
    Error,
}

/// Text plus tone shown in the status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

impl StatusLine {
    pub fn new(text: impl Into<String>, tone: StatusTone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }
}

#[derive(Debug, Clone)]
enum Ambient {
    /// Derived from plane count at read time.
    Fallback,
    Explicit(StatusLine),
}

#[derive(Debug, Clone)]
struct Transient {
    line: StatusLine,
    expires_at: Instant,
}

/// Status line state machine.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    ambient: Ambient,
    transient: Option<Transient>,
    plane_count: usize,
    feedback_display: Duration,
}

impl StatusBoard {
    pub fn new(feedback_display: Duration) -> Self {
        Self {
            ambient: Ambient::Explicit(StatusLine::new(
                STATUS_SEARCHING_INITIAL,
                StatusTone::Neutral,
            )),
            transient: None,
            plane_count: 0,
            feedback_display,
        }
    }

    pub fn plane_count(&self) -> usize {
        self.plane_count
    }

    /// Shows `message` until `now + feedback_display`.
    pub fn show_feedback(&mut self, message: impl Into<String>, is_error: bool, now: Instant) {
        let tone = if is_error {
            StatusTone::Error
        } else {
            StatusTone::Success
        };
        self.transient = Some(Transient {
            line: StatusLine::new(message, tone),
            expires_at: now + self.feedback_display,
        });
        self.ambient = Ambient::Fallback;
    }

    pub fn on_plane_added(&mut self) {
        self.plane_count += 1;
        self.ambient = Ambient::Explicit(StatusLine::new(
            STATUS_SURFACE_READY,
            StatusTone::Success,
        ));
    }

    pub fn on_plane_removed(&mut self) {
        self.plane_count = self.plane_count.saturating_sub(1);
        if self.plane_count == 0 {
            if let Ambient::Explicit(line) = &self.ambient {
                if line.text == STATUS_SURFACE_READY {
                    self.ambient = Ambient::Fallback;
                }
            }
        }
    }

    pub fn on_tracking_state_changed(&mut self, state: TrackingState) {
        info!(
            "event=tracking_state module=controller status=ok state={} planes={}",
            state.label(),
            self.plane_count
        );
        let line = match state {
            TrackingState::Normal => {
                if self.plane_count > 0 {
                    return;
                }
                StatusLine::new(STATUS_SEARCHING, StatusTone::Neutral)
            }
            TrackingState::Limited(reason) => {
                let text = match reason {
                    LimitedReason::ExcessiveMotion => "Move more slowly",
                    LimitedReason::InsufficientFeatures => "Point at surfaces with more detail",
                    LimitedReason::Initializing => "Starting AR...",
                    LimitedReason::Relocalizing | LimitedReason::Other => "Limited tracking",
                };
                StatusLine::new(text, StatusTone::Warning)
            }
            TrackingState::NotAvailable => StatusLine::new("AR not available", StatusTone::Error),
        };
        self.ambient = Ambient::Explicit(line);
    }

    /// Status line visible at `now`.
    pub fn current(&self, now: Instant) -> StatusLine {
        if let Some(transient) = &self.transient {
            if now < transient.expires_at {
                return transient.line.clone();
            }
        }
        match &self.ambient {
            Ambient::Explicit(line) => line.clone(),
            Ambient::Fallback => {
                let text = if self.plane_count == 0 {
                    STATUS_SEARCHING
                } else {
                    STATUS_SURFACE_READY
                };
                StatusLine::new(text, StatusTone::Neutral)
            }
        }
    }
}

/// Instruction text for the current phase.
pub fn instruction_for(phase: Phase) -> &'static str {
    match phase {
        Phase::Empty => "Point at person's feet and tap +",
        Phase::AwaitingSecondPoint => "Now point at person's head and tap +",
        Phase::Complete => "Tap 📷 to save measurement",
    }
}

#[cfg(test)]
mod tests {
    use super::{
        LimitedReason, StatusBoard, StatusTone, TrackingState, STATUS_SEARCHING,
        STATUS_SEARCHING_INITIAL, STATUS_SURFACE_READY,
    };
    use std::time::{Duration, Instant};

    #[test]
    fn feedback_expires_into_plane_count_fallback() {
        let start = Instant::now();
        let mut board = StatusBoard::new(Duration::from_secs(3));
        assert_eq!(board.current(start).text, STATUS_SEARCHING_INITIAL);

        board.show_feedback("Point the camera at a surface", true, start);
        let shown = board.current(start + Duration::from_secs(1));
        assert_eq!(shown.tone, StatusTone::Error);

        assert_eq!(
            board.current(start + Duration::from_secs(3)).text,
            STATUS_SEARCHING
        );
        board.on_plane_added();
        assert_eq!(
            board.current(start + Duration::from_secs(4)).text,
            STATUS_SURFACE_READY
        );
    }

    #[test]
    fn limited_tracking_maps_reasons() {
        let now = Instant::now();
        let mut board = StatusBoard::new(Duration::from_secs(3));
        board.on_tracking_state_changed(TrackingState::Limited(LimitedReason::ExcessiveMotion));
        let line = board.current(now);
        assert_eq!(line.text, "Move more slowly");
        assert_eq!(line.tone, StatusTone::Warning);
    }

    #[test]
    fn normal_tracking_keeps_surface_status_when_planes_exist() {
        let now = Instant::now();
        let mut board = StatusBoard::new(Duration::from_secs(3));
        board.on_plane_added();
        board.on_tracking_state_changed(TrackingState::Normal);
        assert_eq!(board.current(now).text, STATUS_SURFACE_READY);

        board.on_plane_removed();
        assert_eq!(board.current(now).text, STATUS_SEARCHING);
    }

    #[test]
    fn parse_accepts_host_strings() {
        assert_eq!(TrackingState::parse("Normal"), Some(TrackingState::Normal));
        assert_eq!(
            TrackingState::parse("limited:insufficient_features"),
            Some(TrackingState::Limited(LimitedReason::InsufficientFeatures))
        );
        assert_eq!(TrackingState::parse("bogus"), None);
    }
}
