//! Domain model for the people collection.
//!
//! # Responsibility
//! - Define the document shapes used by repository and service layers.
//!
//! # Invariants
//! - Every stored document is identified by a store-assigned `PersonId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod person;
