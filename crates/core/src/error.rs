//! Job store error model.

use thiserror::Error;

use crate::id::JobId;

/// Result type returned by job store operations.
pub type StoreResult<T> = Result<T, JobStoreError>;

/// Failure reported by a job store.
///
/// Lifecycle conflicts (`NotFound`, `AlreadyCompleted`) are deterministic;
/// `Unavailable` covers whatever the backing storage can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JobStoreError {
    /// No job is registered under this identifier.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The job already carries its terminal result.
    #[error("job already completed: {0}")]
    AlreadyCompleted(JobId),

    /// The backing storage could not serve the request.
    #[error("job store unavailable: {0}")]
    Unavailable(String),
}

impl JobStoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// A string could not be parsed as a [`JobId`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid job id: {0}")]
pub struct InvalidJobId(pub String);
