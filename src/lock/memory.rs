//! In-process lock service.
//!
//! Leases live in a map guarded by a mutex, so this only excludes holders
//! within one process. Useful for tests and single-instance deployments.

use super::{LockService, LockToken};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Lock service backed by a process-local map
#[derive(Debug, Default)]
pub struct MemoryLockService {
    leases: Mutex<HashMap<String, LockToken>>,
}

impl MemoryLockService {
    /// Create an empty lock service
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` currently has an unexpired lease
    pub fn is_locked(&self, key: &str) -> bool {
        self.leases
            .lock()
            .map(|leases| leases.get(key).is_some_and(|t| t.expires_at > Utc::now()))
            .unwrap_or(false)
    }
}

#[async_trait]
impl LockService for MemoryLockService {
    async fn try_acquire(&self, key: &str, lease: Duration) -> Result<Option<LockToken>> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| Error::Lock("lease table mutex poisoned".to_string()))?;

        if let Some(held) = leases.get(key)
            && held.expires_at > Utc::now()
        {
            return Ok(None);
        }

        let token = LockToken::issue(key, lease);
        leases.insert(key.to_string(), token.clone());
        Ok(Some(token))
    }

    async fn release(&self, token: &LockToken) -> Result<bool> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| Error::Lock("lease table mutex poisoned".to_string()))?;

        match leases.get(&token.key) {
            Some(held) if held.owner == token.owner => {
                let still_valid = held.expires_at > Utc::now();
                leases.remove(&token.key);
                Ok(still_valid)
            }
            _ => Ok(false),
        }
    }

    async fn renew(&self, token: &LockToken, lease: Duration) -> Result<Option<LockToken>> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|_| Error::Lock("lease table mutex poisoned".to_string()))?;

        match leases.get_mut(&token.key) {
            Some(held) if held.owner == token.owner && held.expires_at > Utc::now() => {
                *held = token.extended(lease);
                Ok(Some(held.clone()))
            }
            _ => Ok(None),
        }
    }
}
