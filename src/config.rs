//! Configuration file
//!
//! TOML, by default at `<config dir>/monty/config.toml`. Every section is
//! optional; missing keys take their defaults.

use crate::error::{Error, Result};
use crate::lock::RetryPolicy;
use crate::review::DEFAULT_LGTM_THRESHOLD;
use crate::types::{MergeMethod, MergeOrder, MissingStatusPolicy, Repository};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Repositories to sync and review, as `owner/name`
    pub repositories: Vec<String>,
    /// Review settings
    pub review: ReviewConfig,
    /// Lock settings
    pub lock: LockConfig,
    /// Store settings
    pub store: StoreConfig,
    /// Merge settings
    pub merge: MergeConfig,
    /// GitHub settings
    pub github: GitHubConfig,
}

/// `[review]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReviewConfig {
    /// Approving lines required by the LGTM check
    pub lgtm_threshold: usize,
    /// Verdict of the build-status check when no CI reported
    pub missing_status: MissingStatusPolicy,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            lgtm_threshold: DEFAULT_LGTM_THRESHOLD,
            missing_status: MissingStatusPolicy::default(),
        }
    }
}

/// Lock backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockBackend {
    /// Process-local; only safe for a single instance
    Memory,
    /// Lease table in a shared SQLite database
    #[default]
    Sqlite,
}

/// `[lock]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockConfig {
    /// Which backend to use
    pub backend: LockBackend,
    /// SQLite database path (defaults to the store database)
    pub path: Option<PathBuf>,
    /// Lease length in milliseconds
    pub lease_ms: u64,
    /// Acquisition attempts before giving up on a pull request
    pub retry_attempts: u32,
    /// Pause between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            backend: LockBackend::default(),
            path: None,
            lease_ms: 5000,
            retry_attempts: retry.attempts,
            retry_delay_ms: u64::try_from(retry.delay.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl LockConfig {
    /// Lease length
    pub const fn lease(&self) -> Duration {
        Duration::from_millis(self.lease_ms)
    }

    /// Retry policy for acquisition
    pub const fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// `[store]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// SQLite database path (defaults to the data directory)
    pub path: Option<PathBuf>,
}

/// `[merge]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeConfig {
    /// Order of the feedback comment and the merge
    pub order: MergeOrder,
    /// Merge method
    pub method: MergeMethod,
}

/// `[github]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubConfig {
    /// GitHub Enterprise host; public GitHub when unset
    pub host: Option<String>,
}

impl Config {
    /// Parse configuration text
    pub fn parse(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        config.repositories()?;
        Ok(config)
    }

    /// Load configuration from `path`
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// Configured repositories, parsed
    pub fn repositories(&self) -> Result<Vec<Repository>> {
        self.repositories.iter().map(|s| s.parse()).collect()
    }

    /// Store database location, shared by every instance
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("monty.sqlite3")),
        }
    }

    /// SQLite lock database location; the store database unless overridden
    pub fn lock_path(&self) -> Result<PathBuf> {
        match &self.lock.path {
            Some(path) => Ok(path.clone()),
            None => self.store_path(),
        }
    }
}

/// Default configuration file location
pub fn default_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
    Ok(dir.join("monty").join("config.toml"))
}

fn data_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| Error::Config("could not determine data directory".to_string()))?;
    Ok(dir.join("monty"))
}
