//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the collection-level data access contract.
//! - Isolate SQLite query and JSON column details from the service layer.
//!
//! # Invariants
//! - Repository writes must enforce person validation before persistence.
//! - Repository errors carry a `RepoErrorKind` (`Write`/`Query`/`NotFound`).

pub mod person_repo;
