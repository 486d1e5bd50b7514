//! Distributed lock for pull-request evaluation
//!
//! A lease grants one holder exclusive access to a key until it is released
//! or its time-to-live runs out. Every instance of the bot contends on the
//! same keys, so at most one of them evaluates or merges a given pull request
//! at any instant.

mod memory;
mod sqlite;

pub use memory::MemoryLockService;
pub use sqlite::SqliteLockService;

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::debug;

/// Default lease length for one evaluate-and-merge critical section
///
/// The merge executor renews the lease before each GitHub write, so this only
/// has to cover one remote call.
pub const DEFAULT_LEASE: Duration = Duration::from_millis(5000);

/// A held lease
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken {
    /// Locked key
    pub key: String,
    /// Unique owner token for this grant
    pub owner: String,
    /// When the lease lapses if not released
    pub expires_at: DateTime<Utc>,
}

impl LockToken {
    pub(crate) fn issue(key: &str, lease: Duration) -> Self {
        Self {
            key: key.to_string(),
            owner: uuid::Uuid::new_v4().to_string(),
            expires_at: expiry(lease),
        }
    }

    /// Same grant, expiring `lease` from now
    pub(crate) fn extended(&self, lease: Duration) -> Self {
        Self {
            expires_at: expiry(lease),
            ..self.clone()
        }
    }
}

fn expiry(lease: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(lease)
        .ok()
        .and_then(|lease| Utc::now().checked_add_signed(lease))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// How persistently to retry a contended lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts (at least one is always made)
    pub attempts: u32,
    /// Pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    /// Try exactly once
    pub const fn once() -> Self {
        Self {
            attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(200),
        }
    }
}

/// Fleet-wide mutual exclusion keyed by string
#[async_trait]
pub trait LockService: Send + Sync {
    /// Make one atomic attempt to take the lease on `key`
    ///
    /// Returns `None` when another holder has an unexpired lease.
    async fn try_acquire(&self, key: &str, lease: Duration) -> Result<Option<LockToken>>;

    /// Give the lease back before it expires
    ///
    /// Returns `false` if the lease had already lapsed or been taken over.
    async fn release(&self, token: &LockToken) -> Result<bool>;

    /// Push an unexpired lease out to `lease` from now
    ///
    /// Returns `None` if the lease had already lapsed or been taken over;
    /// the caller no longer holds the key.
    async fn renew(&self, token: &LockToken, lease: Duration) -> Result<Option<LockToken>>;

    /// Acquire `key`, retrying according to `retry`
    ///
    /// Exhausting the retry budget is `Error::LockUnavailable`.
    async fn acquire(&self, key: &str, lease: Duration, retry: RetryPolicy) -> Result<LockToken> {
        let attempts = retry.attempts.max(1);
        for attempt in 1..=attempts {
            if let Some(token) = self.try_acquire(key, lease).await? {
                debug!(key, attempt, "acquired lock");
                return Ok(token);
            }
            debug!(key, attempt, attempts, "lock busy");
            if attempt < attempts && !retry.delay.is_zero() {
                tokio::time::sleep(retry.delay).await;
            }
        }
        Err(Error::LockUnavailable {
            key: key.to_string(),
        })
    }
}
