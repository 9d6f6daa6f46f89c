//! Core people-collection logic for persondb.
//! This crate owns the document model, the store adapter and the facade.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig, StoreLocation};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::person::{
    NewPerson, Person, PersonId, PersonIdError, PersonValidationError, PersonWithoutAge,
};
pub use repo::person_repo::{
    DeleteSummary, PersonFilter, PersonLookup, PersonQuery, PersonRepository, PersonSort,
    RepoError, RepoErrorKind, RepoResult, SqlitePersonRepository,
};
pub use service::person_service::{PersonService, QUERY_CHAIN_LIMIT};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
