//! Ledger configuration.
//!
//! Loaded from an optional `riichi_ledger.toml` followed by environment
//! overrides such as `RIICHI_LEDGER__BACKEND=memory` or
//! `RIICHI_LEDGER__SQLITE__PATH=/var/lib/riichi/rdb.sqlite`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File stem searched by [`LedgerConfig::load`].
pub const DEFAULT_CONFIG_FILE: &str = "riichi_ledger";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "RIICHI_LEDGER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("invalid ledger config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LedgerConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

/// Which store the ledger persists into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local tables; everything is lost on exit.
    Memory,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqliteConfig {
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
    /// How long a writer waits for another process's lock before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub synchronous: Synchronous,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        SqliteConfig {
            path: default_sqlite_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            synchronous: Synchronous::default(),
        }
    }
}

impl SqliteConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

/// `PRAGMA synchronous` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Synchronous {
    /// Sync on every commit. A committed match survives power loss.
    #[default]
    Full,
    /// Faster; a committed match may be lost on power loss but never half-applied.
    Normal,
}

impl Synchronous {
    pub fn as_pragma(self) -> &'static str {
        match self {
            Synchronous::Full => "FULL",
            Synchronous::Normal => "NORMAL",
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("rdb.sqlite")
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl LedgerConfig {
    /// Load from `riichi_ledger.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(File::with_name(DEFAULT_CONFIG_FILE).required(false))
    }

    /// Load from a specific file (which must exist) and the environment.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build<F>(file: F) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == StorageBackend::Sqlite && self.sqlite.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "sqlite.path is required for the sqlite backend".to_string(),
            ));
        }
        Ok(())
    }
}
