//! Measurement session state machine.
//!
//! # Responsibility
//! - Turn raycast hits into a validated two-point measurement.
//! - Expose the current phase and the live preview used for rendering.
//!
//! # Invariants
//! - A session holds at most two committed points.
//! - Phase is derived from the committed point count, never stored.
//! - Callers serialize all access; the session performs no locking.

pub mod measurement_session;
