//! Export artifacts produced from the record history.
//!
//! # Responsibility
//! - Render saved measurements as CSV text.
//! - Name and write export files for the host share flow.

pub mod csv;
