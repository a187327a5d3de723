//! Domain model for two-point height measurements.
//!
//! # Responsibility
//! - Define world-space geometry primitives consumed from the AR host.
//! - Define the immutable record produced when a measurement is saved.
//!
//! # Invariants
//! - Distances are stored once, in meters; display strings are derived.
//! - Every saved record is identified by a stable `RecordId`.

pub mod point;
pub mod record;
