//! Orchestration layer between the AR host and the measurement core.
//!
//! # Responsibility
//! - Own the current session, the record store and the status text.
//! - Translate host callbacks (frame tick, tracking changes, button taps)
//!   into explicit calls on the core.
//! - Publish commit/reset/save/export events to registered listeners.
//!
//! # Invariants
//! - All calls are serialized by the owner; the controller never locks.
//! - Time is passed in by the caller, never read from a global clock,
//!   except for the wall-clock convenience `export_csv`.

pub mod events;
pub mod measurement_controller;
pub mod ports;
pub mod status;
