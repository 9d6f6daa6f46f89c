//! Environment-driven configuration.
//!
//! # Responsibility
//! - Resolve the single store connection string from the process
//!   environment (with `.env` support).
//! - Resolve optional logging settings.
//!
//! # Invariants
//! - `PERSONDB_URL` wins over `MONGO_URL`, which wins over `DATABASE_URL`.
//! - A blank connection string is a configuration error, not a default.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const URL_ENV_KEYS: [&str; 3] = ["PERSONDB_URL", "MONGO_URL", "DATABASE_URL"];
pub const LOG_LEVEL_ENV_KEY: &str = "PERSONDB_LOG_LEVEL";
pub const LOG_DIR_ENV_KEY: &str = "PERSONDB_LOG_DIR";

const MEMORY_URLS: [&str; 3] = [":memory:", "sqlite::memory:", "sqlite://:memory:"];
const SQLITE_SCHEME: &str = "sqlite://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// None of the connection-string variables is set.
    MissingUrl,
    /// A connection-string variable is set but blank or uses another scheme.
    InvalidUrl { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUrl => write!(
                f,
                "no store connection string configured; set one of {}",
                URL_ENV_KEYS.join("|")
            ),
            Self::InvalidUrl { key, value } => {
                write!(f, "invalid store connection string in {key}: `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Where the document store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub log_level: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Loads `.env` (when present) and reads configuration from the process
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let (key, url) = URL_ENV_KEYS
            .iter()
            .find_map(|key| lookup(key).map(|value| (*key, value)))
            .ok_or(ConfigError::MissingUrl)?;

        let location = parse_location(&url).ok_or_else(|| ConfigError::InvalidUrl {
            key,
            value: url.clone(),
        })?;

        Ok(Self {
            location,
            log_level: non_blank(lookup(LOG_LEVEL_ENV_KEY)),
            log_dir: non_blank(lookup(LOG_DIR_ENV_KEY)).map(PathBuf::from),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            log_level: None,
            log_dir: None,
        }
    }
}

/// Parses a connection string into a store location.
///
/// Accepts `:memory:`, `sqlite::memory:`, `sqlite://<path>` and bare paths.
/// Other URL schemes are rejected.
pub fn parse_location(url: &str) -> Option<StoreLocation> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    if MEMORY_URLS.contains(&trimmed) {
        return Some(StoreLocation::Memory);
    }
    if let Some(path) = trimmed.strip_prefix(SQLITE_SCHEME) {
        if path.is_empty() {
            return None;
        }
        return Some(StoreLocation::File(PathBuf::from(path)));
    }
    if trimmed.contains("://") {
        return None;
    }
    Some(StoreLocation::File(PathBuf::from(trimmed)))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{parse_location, ConfigError, StoreConfig, StoreLocation};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parse_location_handles_memory_and_paths() {
        assert_eq!(parse_location(":memory:"), Some(StoreLocation::Memory));
        assert_eq!(parse_location("sqlite::memory:"), Some(StoreLocation::Memory));
        assert_eq!(
            parse_location("sqlite:///var/lib/people.db"),
            Some(StoreLocation::File(PathBuf::from("/var/lib/people.db")))
        );
        assert_eq!(
            parse_location(" people.db "),
            Some(StoreLocation::File(PathBuf::from("people.db")))
        );
        assert_eq!(parse_location("mongodb+srv://cluster0.example.net/app"), None);
        assert_eq!(parse_location("  "), None);
    }

    #[test]
    fn primary_key_takes_precedence_over_fallbacks() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("MONGO_URL", "fallback.db"),
            ("PERSONDB_URL", ":memory:"),
        ]))
        .unwrap();
        assert_eq!(config.location, StoreLocation::Memory);
    }

    #[test]
    fn fallback_key_is_used_when_primary_missing() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "people.db"),
            ("PERSONDB_LOG_LEVEL", " debug "),
            ("PERSONDB_LOG_DIR", ""),
        ]))
        .unwrap();
        assert_eq!(
            config.location,
            StoreLocation::File(PathBuf::from("people.db"))
        );
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn missing_and_invalid_urls_are_errors() {
        assert_eq!(
            StoreConfig::from_lookup(lookup_from(&[])),
            Err(ConfigError::MissingUrl)
        );

        let err = StoreConfig::from_lookup(lookup_from(&[("MONGO_URL", "mongodb://host/db")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { key: "MONGO_URL", .. }));
    }
}
