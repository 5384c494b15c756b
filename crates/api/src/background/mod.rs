//! Run request handlers as background jobs.
//!
//! A wrapped handler answers its caller immediately with `202 Accepted` and
//! `{"id": "<job id>"}`, then runs out-of-band:
//!
//! ```text
//!   start(kind) ──→ detach(req) ──→ executor ──→ 202 {"id"}
//!                                      │
//!                                      └─→ heartbeat ┐
//!                                          capture   ├─→ stop ──→ complete(id, result)
//! ```
//!
//! The heartbeat is stopped before `complete`, but not joined. A tick that
//! is already in flight may still reach the store afterwards; the store's
//! ping-after-complete rule keeps completion the last effective mutation.
//!
//! Once registered, a job whose work is dropped before it records a result
//! (for example the caller disconnecting mid-upload) is completed with a
//! `500` result instead of staying `Working`.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::Request;
use axum::handler::{Handler, HandlerService};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tower::{Layer, Service};
use tracing::{debug, error, info, warn};

use offload_core::{JobId, JobStore, TerminalResult};

use crate::app::errors;

pub mod capture;
pub mod detach;
pub mod error;
pub mod executor;
pub mod heartbeat;

pub use capture::capture;
pub use detach::detach;
pub use error::{BackgroundError, CaptureError, DetachError};
pub use executor::{Executor, Work};
pub use heartbeat::{Heartbeat, HeartbeatState};

/// Default interval between heartbeats.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(5);

/// Tuning for the orchestrator.
#[derive(Debug, Clone)]
pub struct BackgroundConfig {
    /// Interval between heartbeats while a job runs.
    pub ping_interval: Duration,
    /// Largest request body copied onto a detached request.
    pub max_body_bytes: usize,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL,
            max_body_bytes: usize::MAX,
        }
    }
}

/// Acknowledgement body sent to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAccepted {
    pub id: JobId,
}

/// Converts handlers into background handlers backed by a [`JobStore`].
#[derive(Clone)]
pub struct Background {
    store: Arc<dyn JobStore>,
    config: BackgroundConfig,
    executor: Executor,
}

impl Background {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            config: BackgroundConfig::default(),
            executor: Executor::default(),
        }
    }

    pub fn with_config(mut self, config: BackgroundConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    /// Wrap a service so each request becomes a background job of `kind`.
    pub fn wrap<S>(&self, handler: S, kind: impl Into<String>) -> BackgroundService<S> {
        BackgroundService {
            background: self.clone(),
            kind: Arc::from(kind.into()),
            inner: handler,
        }
    }

    /// Wrap a stateless axum handler.
    pub fn wrap_handler<H, T>(
        &self,
        handler: H,
        kind: impl Into<String>,
    ) -> BackgroundService<HandlerService<H, T, ()>>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.wrap(handler.with_state(()), kind)
    }

    /// Layer form of [`Background::wrap`], for `route_layer`.
    pub fn layer(&self, kind: impl Into<String>) -> BackgroundLayer {
        BackgroundLayer {
            background: self.clone(),
            kind: Arc::from(kind.into()),
        }
    }

    /// Register a job, schedule `handler` on a detached copy of `req`, and
    /// acknowledge.
    pub async fn run<S>(&self, handler: S, kind: &str, req: Request) -> Response
    where
        S: Service<Request, Response = Response, Error = Infallible> + Send + 'static,
        S::Future: Send + 'static,
    {
        let job = match self.store.start(kind).await {
            Ok(job) => job,
            Err(e) => {
                error!(kind = %kind, error = %e, "cannot start background job");
                return errors::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "job_start_failed",
                    "cannot start background job",
                );
            }
        };

        // From here on the job exists; whatever drops this future before
        // completion must not leave it `Working`.
        let guard = AbandonGuard::new(self.store.clone(), job.id);

        let detached = match detach(req, self.config.max_body_bytes).await {
            Ok(req) => req,
            Err(e) => {
                warn!(job_id = %job.id, kind = %kind, error = %e, "cannot detach request");
                guard.disarm();
                abandon(self.store.as_ref(), job.id, &e).await;
                return errors::json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "request_body_unreadable",
                    "failed to get request body",
                );
            }
        };

        debug!(job_id = %job.id, kind = %kind, "scheduling background job");
        let work = self.clone().serve(job.id, handler, detached, guard).boxed();
        self.executor.execute(work).await;

        accepted(job.id)
    }

    async fn serve<S>(
        self,
        job_id: JobId,
        handler: S,
        req: Request,
        guard: AbandonGuard,
    ) -> Result<(), BackgroundError>
    where
        S: Service<Request, Response = Response, Error = Infallible> + Send + 'static,
        S::Future: Send + 'static,
    {
        let heartbeat = Heartbeat::spawn(self.store.clone(), job_id, self.config.ping_interval);
        let captured = capture(handler, req, usize::MAX).await;
        heartbeat.stop();

        let result = match captured {
            Ok(result) => result,
            Err(CaptureError::Panicked(msg)) => {
                error!(job_id = %job_id, panic = %msg, "background handler panicked");
                TerminalResult::new(
                    StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                    format!("handler panicked: {msg}"),
                )
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "recording empty result");
                TerminalResult::default()
            }
        };

        guard.disarm();
        self.store
            .complete(&job_id, result)
            .await
            .map_err(|source| BackgroundError::Complete { job_id, source })?;

        info!(job_id = %job_id, "background job completed");
        Ok(())
    }
}

/// Close out a job that will never run its handler, so it does not stay
/// `Working` forever.
async fn abandon(store: &dyn JobStore, job_id: JobId, cause: impl std::fmt::Display) {
    let result = TerminalResult::new(
        StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        format!("background job abandoned: {cause}"),
    );
    if let Err(e) = store.complete(&job_id, result).await {
        error!(job_id = %job_id, error = %e, "cannot close abandoned job");
    }
}

/// Abandons its job when dropped while still armed.
///
/// Travels with the job from registration until the terminal result is
/// handed to the store. It is dropped early when the caller disconnects
/// mid-upload or when the scheduled work itself is dropped.
struct AbandonGuard {
    store: Option<Arc<dyn JobStore>>,
    job_id: JobId,
}

impl AbandonGuard {
    fn new(store: Arc<dyn JobStore>, job_id: JobId) -> Self {
        Self {
            store: Some(store),
            job_id,
        }
    }

    fn disarm(mut self) {
        self.store = None;
    }
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        let Some(store) = self.store.take() else {
            return;
        };
        let job_id = self.job_id;
        warn!(job_id = %job_id, "background job dropped before completion");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    abandon(store.as_ref(), job_id, "dropped before completion").await;
                });
            }
            Err(_) => error!(job_id = %job_id, "no runtime left to close abandoned job"),
        }
    }
}

impl std::fmt::Debug for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Background")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

fn accepted(id: JobId) -> Response {
    match serde_json::to_vec(&JobAccepted { id }) {
        Ok(body) => (
            StatusCode::ACCEPTED,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(job_id = %id, error = %e, "cannot encode job acknowledgement");
            StatusCode::ACCEPTED.into_response()
        }
    }
}

/// Service produced by [`Background::wrap`].
#[derive(Clone)]
pub struct BackgroundService<S> {
    background: Background,
    kind: Arc<str>,
    inner: S,
}

impl<S> BackgroundService<S> {
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

impl<S> Service<Request> for BackgroundService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // The inner service is driven with `oneshot` inside the job.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let background = self.background.clone();
        let kind = self.kind.clone();
        let handler = self.inner.clone();
        async move { Ok(background.run(handler, &kind, req).await) }.boxed()
    }
}

/// Layer produced by [`Background::layer`].
#[derive(Clone)]
pub struct BackgroundLayer {
    background: Background,
    kind: Arc<str>,
}

impl<S> Layer<S> for BackgroundLayer {
    type Service = BackgroundService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BackgroundService {
            background: self.background.clone(),
            kind: self.kind.clone(),
            inner,
        }
    }
}
