use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Extension, Router};

use offload_core::JobQuery;

use crate::background::Background;

pub mod demo;
pub mod jobs;
pub mod system;

/// Job inspection endpoints.
pub fn jobs_router(query: Arc<dyn JobQuery>) -> Router {
    Router::new()
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/:job_id", get(jobs::get_job))
        .layer(Extension(query))
}

/// Endpoints whose handlers run as background jobs.
pub fn background_router(background: &Background, slow_handler_delay: Duration) -> Router {
    Router::new()
        .route(
            "/slow",
            get(demo::slow)
                .post(demo::slow)
                .route_layer(background.layer(demo::SLOW_HANDLER_KIND)),
        )
        .route(
            "/echo",
            axum::routing::post(demo::echo).route_layer(background.layer(demo::ECHO_KIND)),
        )
        .layer(Extension(demo::SlowHandlerDelay(slow_handler_delay)))
}
