use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Lifetime of the request a handler is serving.
///
/// Carried as a request extension. Handlers that want to stop early when the
/// caller goes away (client disconnect, request deadline) wait on
/// [`RequestLifetime::cancelled`].
///
/// A *detached* lifetime never fires and has no deadline; background jobs
/// run with one so they outlive the connection that triggered them.
#[derive(Debug, Clone)]
pub struct RequestLifetime {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl RequestLifetime {
    /// Lifetime bound to `token`.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token: Some(token),
            deadline: None,
        }
    }

    /// Lifetime that is never cancelled and never expires.
    pub fn detached() -> Self {
        Self {
            token: None,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_detached(&self) -> bool {
        self.token.is_none() && self.deadline.is_none()
    }

    /// Whether the request was cancelled or its deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        let cancelled = self.token.as_ref().is_some_and(|t| t.is_cancelled());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        cancelled || expired
    }

    /// Resolves when the request is cancelled or its deadline passes.
    ///
    /// Never resolves for a detached lifetime.
    pub async fn cancelled(&self) {
        let token = async {
            match &self.token {
                Some(token) => token.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = token => {}
            _ = deadline => {}
        }
    }
}

impl Default for RequestLifetime {
    fn default() -> Self {
        Self::detached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn follows_its_token() {
        let token = CancellationToken::new();
        let lifetime = RequestLifetime::new(token.clone());
        assert!(!lifetime.is_cancelled());

        token.cancel();

        assert!(lifetime.is_cancelled());
        lifetime.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn expires_at_deadline() {
        let lifetime =
            RequestLifetime::new(CancellationToken::new()).with_timeout(Duration::from_secs(1));
        assert!(!lifetime.is_cancelled());

        lifetime.cancelled().await;

        assert!(lifetime.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn detached_never_fires() {
        let lifetime = RequestLifetime::detached();
        assert!(lifetime.is_detached());
        assert!(lifetime.deadline().is_none());

        let fired = tokio::time::timeout(Duration::from_secs(3600), lifetime.cancelled()).await;

        assert!(fired.is_err());
        assert!(!lifetime.is_cancelled());
    }
}
