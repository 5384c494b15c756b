//! In-memory job store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::debug;

use offload_core::{Job, JobId, JobQuery, JobStore, JobStoreError, StoreResult, TerminalResult};

/// In-memory job store for tests/dev.
///
/// Every operation is a read-modify-write under one exclusive lock, so a
/// `ping` and a `complete` for the same job can never interleave.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    inner: Mutex<Jobs>,
}

#[derive(Debug, Default)]
struct Jobs {
    by_id: HashMap<JobId, Job>,
    /// Registration order, used to break `created_at` ties when listing.
    seq: HashMap<JobId, u64>,
    next_seq: u64,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.lock()?.by_id.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Jobs>> {
        self.inner
            .lock()
            .map_err(|_| JobStoreError::unavailable("job map lock poisoned"))
    }
}

#[async_trait::async_trait]
impl JobStore for InMemoryJobStore {
    async fn start(&self, kind: &str) -> StoreResult<Job> {
        let mut jobs = self.lock()?;
        let job = Job::new(JobId::new(), kind, Utc::now());
        let seq = jobs.next_seq;
        jobs.next_seq += 1;
        jobs.seq.insert(job.id, seq);
        jobs.by_id.insert(job.id, job.clone());
        debug!(job_id = %job.id, kind = %job.kind, "job registered");
        Ok(job)
    }

    async fn complete(&self, id: &JobId, result: TerminalResult) -> StoreResult<()> {
        let mut jobs = self.lock()?;
        let job = jobs.by_id.get_mut(id).ok_or(JobStoreError::NotFound(*id))?;
        if !job.complete(result, Utc::now()) {
            return Err(JobStoreError::AlreadyCompleted(*id));
        }
        debug!(job_id = %id, "job completed");
        Ok(())
    }

    async fn ping(&self, id: &JobId) -> StoreResult<()> {
        let mut jobs = self.lock()?;
        let job = jobs.by_id.get_mut(id).ok_or(JobStoreError::NotFound(*id))?;
        if !job.touch(Utc::now()) {
            debug!(job_id = %id, "heartbeat after completion ignored");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl JobQuery for InMemoryJobStore {
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        Ok(self.lock()?.by_id.get(id).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Job>> {
        let jobs = self.lock()?;
        let mut result: Vec<_> = jobs
            .by_id
            .values()
            .map(|j| (jobs.seq.get(&j.id).copied().unwrap_or(u64::MAX), j))
            .collect();
        result.sort_by_key(|(seq, j)| (j.created_at, *seq));
        Ok(result.into_iter().map(|(_, j)| j.clone()).collect())
    }
}
