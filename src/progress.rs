//! Progress reporting for long-running operations

use async_trait::async_trait;

/// Receives human-readable status updates from sync and merge
#[async_trait]
pub trait ProgressCallback: Send + Sync {
    /// Called with a one-line status message
    async fn on_message(&self, message: &str);
}

/// Discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgress;

#[async_trait]
impl ProgressCallback for NoopProgress {
    async fn on_message(&self, _message: &str) {}
}
