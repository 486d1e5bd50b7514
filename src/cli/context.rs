//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by sync, review, merge and run.

use monty::auth::get_github_auth;
use monty::config::{self, Config, LockBackend};
use monty::error::{Error, Result};
use monty::lock::{LockService, MemoryLockService, SqliteLockService};
use monty::merge::{MergeExecutor, MergeOptions};
use monty::platform::{GitHubService, PlatformService};
use monty::review::{ReviewEngine, ReviewOptions, default_checks};
use monty::store::{PullRequestStore, SqliteStore};
use monty::types::Repository;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared context for CLI commands
///
/// Holds the loaded configuration and the three services every command
/// works against: the GitHub platform, the pull request store and the lock.
pub struct CommandContext {
    /// Loaded configuration
    pub config: Config,
    /// Parsed repositories
    pub repositories: Vec<Repository>,
    /// Platform service (GitHub)
    pub platform: Arc<dyn PlatformService>,
    /// Pull request store
    pub store: Arc<dyn PullRequestStore>,
    /// Distributed lock
    pub lock: Arc<dyn LockService>,
}

impl CommandContext {
    /// Create a new command context
    ///
    /// - Load config (explicit path or the default location)
    /// - Resolve GitHub credentials
    /// - Open the store and the lock backend
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => config::default_path()?,
        };
        debug!(path = %config_path.display(), "loading config");
        let config = Config::load(&config_path)?;

        let repositories = config.repositories()?;
        if repositories.is_empty() {
            return Err(Error::Config(format!(
                "no repositories configured; add `repositories = [\"owner/name\"]` to {}",
                config_path.display()
            )));
        }

        let host = config.github.host.as_deref();
        let auth = get_github_auth(host).await?;
        debug!(source = %auth.source, "authenticated");
        let platform: Arc<dyn PlatformService> = Arc::new(GitHubService::new(&auth.token, host)?);

        let store: Arc<dyn PullRequestStore> = Arc::new(SqliteStore::open(&config.store_path()?)?);

        let lock: Arc<dyn LockService> = match config.lock.backend {
            LockBackend::Memory => {
                warn!("using in-memory lock; other instances will not be excluded");
                Arc::new(MemoryLockService::new())
            }
            LockBackend::Sqlite => Arc::new(SqliteLockService::open(&config.lock_path()?)?),
        };

        Ok(Self {
            config,
            repositories,
            platform,
            store,
            lock,
        })
    }

    /// Review engine over the configured repositories
    pub fn review_engine(&self) -> ReviewEngine {
        let review = &self.config.review;
        ReviewEngine::new(
            Arc::clone(&self.platform),
            Arc::clone(&self.store),
            Arc::clone(&self.lock),
            default_checks(review.lgtm_threshold, review.missing_status),
            ReviewOptions {
                repositories: self.repositories.clone(),
                lease: self.config.lock.lease(),
                retry: self.config.lock.retry(),
            },
        )
    }

    /// Merge executor with the configured order and method
    pub fn merge_executor(&self) -> MergeExecutor {
        MergeExecutor::new(
            Arc::clone(&self.platform),
            Arc::clone(&self.store),
            Arc::clone(&self.lock),
            MergeOptions {
                order: self.config.merge.order,
                method: self.config.merge.method,
                lease: self.config.lock.lease(),
                retry: self.config.lock.retry(),
            },
        )
    }
}
