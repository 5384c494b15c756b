//! Execution strategies for background units of work.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::error;

use super::error::BackgroundError;

/// One scheduled unit of work: run the handler, then record completion.
pub type Work = BoxFuture<'static, Result<(), BackgroundError>>;

type ExecuteFn = dyn Fn(Work) -> BoxFuture<'static, ()> + Send + Sync;

/// Decides how a unit of work is scheduled.
///
/// The returned future is awaited before the caller is acknowledged. The
/// default strategy spawns the work and returns at once; [`Executor::inline`]
/// runs it to completion first, which makes tests deterministic.
#[derive(Clone)]
pub struct Executor(Arc<ExecuteFn>);

impl Executor {
    /// Spawn every unit of work as an independent tokio task.
    pub fn spawn() -> Self {
        Self::from_fn(|work| {
            tokio::spawn(run_logged(work));
            async {}.boxed()
        })
    }

    /// Run every unit of work before acknowledging the caller.
    pub fn inline() -> Self {
        Self::from_fn(|work| run_logged(work).boxed())
    }

    /// Custom strategy.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Work) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn execute(&self, work: Work) -> BoxFuture<'static, ()> {
        (self.0)(work)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::spawn()
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor").finish_non_exhaustive()
    }
}

/// Await `work`; its errors end here as log lines.
async fn run_logged(work: Work) {
    if let Err(e) = work.await {
        error!(error = %e, "background job failed");
    }
}
