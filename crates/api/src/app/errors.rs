use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use offload_core::{InvalidJobId, JobStoreError};

pub fn store_error_to_response(err: JobStoreError) -> axum::response::Response {
    match err {
        JobStoreError::NotFound(id) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("job {id} not found"))
        }
        JobStoreError::AlreadyCompleted(id) => json_error(
            StatusCode::CONFLICT,
            "already_completed",
            format!("job {id} is already completed"),
        ),
        JobStoreError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
    }
}

pub fn invalid_job_id(err: InvalidJobId) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "invalid_job_id", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_core::JobId;

    async fn body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn store_errors_map_to_statuses() {
        let id = JobId::new();

        let res = store_error_to_response(JobStoreError::NotFound(id));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(res).await["error"], "not_found");

        let res = store_error_to_response(JobStoreError::AlreadyCompleted(id));
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = store_error_to_response(JobStoreError::unavailable("poisoned"));
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body(res).await["message"], "poisoned");
    }
}
