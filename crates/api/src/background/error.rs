use thiserror::Error;

use offload_core::{JobId, JobStoreError};

/// The request body could not be copied onto the detached request.
#[derive(Debug, Error)]
pub enum DetachError {
    #[error("failed to read request body: {0}")]
    Body(#[source] axum::Error),
}

/// The handler's response could not be turned into a terminal result.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read captured response body: {0}")]
    Body(#[source] axum::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Failure of a scheduled unit of work.
///
/// Never reaches the original caller; the execution strategy logs it.
#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("failed to record completion of job {job_id}: {source}")]
    Complete {
        job_id: JobId,
        #[source]
        source: JobStoreError,
    },
}
