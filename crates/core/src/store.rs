//! Job store contracts.

use std::sync::Arc;

use crate::error::StoreResult;
use crate::id::JobId;
use crate::job::{Job, TerminalResult};

/// Lifecycle operations the background orchestrator relies on.
///
/// # Contract
///
/// - `start` MUST allocate a fresh identifier and return a `Working` job.
/// - `complete` MUST attach the result and mark the job `Completed` in one
///   atomic step, and MUST be safe to call concurrently with `ping`.
/// - `ping` MUST be a no-op for a job that is already `Completed`. The
///   heartbeat supervisor is only stopped best-effort, so a tick may reach
///   the store after completion; this rule is what keeps completion the
///   last effective mutation.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Register a new job of the given kind.
    async fn start(&self, kind: &str) -> StoreResult<Job>;

    /// Record the terminal result of a job.
    async fn complete(&self, id: &JobId, result: TerminalResult) -> StoreResult<()>;

    /// Record a liveness heartbeat.
    async fn ping(&self, id: &JobId) -> StoreResult<()>;
}

/// Read access used by the status endpoints.
#[async_trait::async_trait]
pub trait JobQuery: Send + Sync {
    /// Fetch one job.
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// All jobs, ordered by ascending `created_at`.
    async fn list(&self) -> StoreResult<Vec<Job>>;
}

#[async_trait::async_trait]
impl<T: JobStore + ?Sized> JobStore for Arc<T> {
    async fn start(&self, kind: &str) -> StoreResult<Job> {
        (**self).start(kind).await
    }

    async fn complete(&self, id: &JobId, result: TerminalResult) -> StoreResult<()> {
        (**self).complete(id, result).await
    }

    async fn ping(&self, id: &JobId) -> StoreResult<()> {
        (**self).ping(id).await
    }
}

#[async_trait::async_trait]
impl<T: JobQuery + ?Sized> JobQuery for Arc<T> {
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        (**self).get(id).await
    }

    async fn list(&self) -> StoreResult<Vec<Job>> {
        (**self).list().await
    }
}
