//! Runtime configuration read from `LITERACY_*` environment variables.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://literacy.sqlite3";

/// Presentation delay between a quiz answer and the automatic advance.
pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(1500);

/// Longest accepted advance delay.
pub const MAX_ADVANCE_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteracyConfig {
    pub database_url: String,
    pub advance_delay: Duration,
}

impl Default for LiteracyConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            advance_delay: DEFAULT_ADVANCE_DELAY,
        }
    }
}

impl LiteracyConfig {
    /// Read `LITERACY_DB_URL` and `LITERACY_ADVANCE_DELAY_MS`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`LiteracyConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("LITERACY_DB_URL") {
            let url = url.trim();
            if url.is_empty() {
                return Err(ConfigError::EmptyDatabaseUrl);
            }
            url.clone_into(&mut config.database_url);
        }

        if let Some(raw) = lookup("LITERACY_ADVANCE_DELAY_MS") {
            let ms = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms <= MAX_ADVANCE_DELAY_MS)
                .ok_or_else(|| ConfigError::InvalidAdvanceDelay { raw: raw.clone() })?;
            config.advance_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Replace the database URL, e.g. from a `--db` flag.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }
}
