//! Controller configuration.
//!
//! # Responsibility
//! - Hold timing and viewport settings for the measurement controller.
//! - Accept partial JSON from hosts, filling missing keys with defaults.
//!
//! # Invariants
//! - Missing fields always fall back to `ControllerConfig::default()`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_FEEDBACK_DISPLAY_MS: u64 = 3_000;
const DEFAULT_AUTO_RESET_DELAY_MS: u64 = 1_500;

/// Timing and viewport settings for `MeasurementController`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// How long transient feedback overrides the ambient status text.
    pub feedback_display_ms: u64,
    /// Delay between a successful save and the automatic session reset.
    pub auto_reset_delay_ms: u64,
    /// Viewport size in points; the crosshair raycast targets its centre.
    pub viewport_width: f64,
    pub viewport_height: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            feedback_display_ms: DEFAULT_FEEDBACK_DISPLAY_MS,
            auto_reset_delay_ms: DEFAULT_AUTO_RESET_DELAY_MS,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }
}

impl ControllerConfig {
    /// Parses host-supplied JSON; unknown keys are ignored.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn feedback_display(&self) -> Duration {
        Duration::from_millis(self.feedback_display_ms)
    }

    pub fn auto_reset_delay(&self) -> Duration {
        Duration::from_millis(self.auto_reset_delay_ms)
    }
}
