//! Core use-case services.
//!
//! # Responsibility
//! - Promote completed sessions into saved records.
//! - Keep controller and FFI layers decoupled from storage details.

pub mod record_store;
