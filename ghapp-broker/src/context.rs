use crate::error::BrokerError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied bounds for the remote calls of a single operation.
///
/// Cancelling the token or reaching the deadline aborts the in-flight request
/// with [`BrokerError::Cancelled`]. Signing and cache access are not bounded.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context without deadline that is never cancelled unless asked to
    pub fn new() -> Self {
        Self::default()
    }

    /// A context that expires `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline(Instant::now() + timeout)
    }

    /// Set the absolute deadline
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Tie this context to an external cancellation token
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels this context
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Drive `fut` to completion unless cancelled or past the deadline first
    pub async fn run<F, T>(&self, fut: F) -> Result<T, BrokerError>
    where
        F: Future<Output = Result<T, BrokerError>>,
    {
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(BrokerError::Cancelled),
            _ = expired => Err(BrokerError::Cancelled),
            result = fut => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = RequestContext::new();
        let result = ctx.run(async { Ok::<_, BrokerError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let ctx = RequestContext::new();
        ctx.cancellation_token().cancel();
        assert!(ctx.is_cancelled());

        let result = ctx.run(async { Ok::<_, BrokerError>(7) }).await;
        assert!(matches!(result, Err(BrokerError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_slow_future() {
        let ctx = RequestContext::with_timeout(Duration::from_secs(1));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, BrokerError>(())
            })
            .await;

        assert!(matches!(result, Err(BrokerError::Cancelled)));
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_mid_flight() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new().cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, BrokerError>(())
            })
            .await;

        canceller.await.unwrap();
        assert!(matches!(result, Err(BrokerError::Cancelled)));
    }
}
