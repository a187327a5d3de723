//! Record persistence contracts and implementations.
//!
//! # Responsibility
//! - Define the append-only storage contract behind the record store.
//! - Keep SQLite details out of the store and controller layers.
//!
//! # Invariants
//! - Listing returns records in insertion order.
//! - Read paths reject invalid persisted rows instead of masking them.

pub mod record_repo;
