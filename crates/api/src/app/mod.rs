//! HTTP application wiring (Axum router + background jobs).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Router};
use tower::ServiceBuilder;

use offload_core::{JobQuery, JobStore};

use crate::background::Background;
use crate::config::AppConfig;
use crate::middleware;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app<S>(config: &AppConfig, store: Arc<S>) -> Router
where
    S: JobStore + JobQuery + 'static,
{
    let query: Arc<dyn JobQuery> = store.clone();
    let background = Background::new(store).with_config(config.background.clone());

    let lifetime = middleware::LifetimeState {
        timeout: config.request_timeout,
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::jobs_router(query))
        .merge(routes::background_router(&background, config.slow_handler_delay))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            lifetime,
            middleware::request_lifetime_middleware,
        )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use offload_core::{Job, JobStatus};
    use offload_infra::InMemoryJobStore;
    use tower::ServiceExt;

    use crate::background::JobAccepted;

    fn test_config() -> AppConfig {
        AppConfig {
            slow_handler_delay: Duration::from_millis(10),
            ..AppConfig::default()
        }
    }

    async fn json_body<T: serde::de::DeserializeOwned>(res: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(&test_config(), InMemoryJobStore::arc());

        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn slow_is_accepted_and_tracked() {
        let store = InMemoryJobStore::arc();
        let app = build_app(&test_config(), store.clone());

        let res = app
            .clone()
            .oneshot(Request::post("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        let accepted: JobAccepted = json_body(res).await;

        let res = app
            .oneshot(
                Request::get(format!("/jobs/{}", accepted.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let job: Job = json_body(res).await;
        assert_eq!(job.id, accepted.id);
        assert_eq!(job.kind, "SLOW_HANDLER");

        for _ in 0..100 {
            if store.get(&accepted.id).await.unwrap().unwrap().status == JobStatus::Completed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let job = store.get(&accepted.id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.response.unwrap().body, "Completed");
    }

    #[tokio::test]
    async fn unknown_and_malformed_job_ids() {
        let app = build_app(&test_config(), InMemoryJobStore::arc());

        let res = app
            .clone()
            .oneshot(
                Request::get(format!("/jobs/{}", offload_core::JobId::new()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app
            .oneshot(Request::get("/jobs/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = json_body(res).await;
        assert_eq!(body["error"], "invalid_job_id");
    }

    #[tokio::test]
    async fn oversized_bodies_are_refused_and_recorded() {
        let store = InMemoryJobStore::arc();
        let mut config = test_config();
        config.background.max_body_bytes = 8;
        let app = build_app(&config, store.clone());

        let res = app
            .oneshot(
                Request::post("/echo")
                    .body(Body::from("this body is too large"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let jobs = store.list().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind, "ECHO");
        assert_eq!(jobs[0].status, JobStatus::Completed);
        assert_eq!(jobs[0].response.as_ref().unwrap().status_code, 500);
    }
}
