//! Read-only view over tracked jobs.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use offload_core::{JobId, JobQuery};

use crate::app::errors;

/// GET /jobs
///
/// Every job, oldest first.
pub async fn list_jobs(Extension(query): Extension<Arc<dyn JobQuery>>) -> Response {
    match query.list().await {
        Ok(jobs) => Json(jobs).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "cannot list jobs");
            errors::store_error_to_response(e)
        }
    }
}

/// GET /jobs/:job_id
pub async fn get_job(
    Extension(query): Extension<Arc<dyn JobQuery>>,
    Path(job_id): Path<String>,
) -> Response {
    let job_id = match job_id.parse::<JobId>() {
        Ok(id) => id,
        Err(e) => return errors::invalid_job_id(e),
    };

    match query.get(&job_id).await {
        Ok(Some(job)) => Json(job).into_response(),
        Ok(None) => errors::json_error(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("job {job_id} not found"),
        ),
        Err(e) => errors::store_error_to_response(e),
    }
}
