//! Per-request cancellation and deadline.

use std::future::{pending, Future};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::construction::error::{ConstructionError, ConstructionResult};

/// Carries an optional deadline and an optional cancellation flag.
///
/// Only stages that reach the node await through [`Context::guard`]; pure
/// stages ignore the context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl Context {
    /// No deadline, never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Tighten the deadline to at most `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Cancel once `rx` observes `true`.
    pub fn with_cancel(mut self, rx: watch::Receiver<bool>) -> Self {
        self.cancel = Some(rx);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fail immediately if the context is already done.
    pub fn check(&self) -> ConstructionResult<()> {
        if self.is_cancelled() {
            return Err(ConstructionError::Cancelled);
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(ConstructionError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Race `fut` against cancellation and the deadline. The losing future
    /// is dropped.
    pub async fn guard<T, F>(&self, fut: F) -> ConstructionResult<T>
    where
        F: Future<Output = ConstructionResult<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            result = fut => result,
            _ = cancelled(self.cancel.clone()) => Err(ConstructionError::Cancelled),
            _ = expired(self.deadline) => Err(ConstructionError::DeadlineExceeded),
        }
    }
}

async fn cancelled(rx: Option<watch::Receiver<bool>>) {
    if let Some(mut rx) = rx {
        let fired = rx.wait_for(|c| *c).await.is_ok();
        if fired {
            return;
        }
    }
    // No flag, or its sender is gone: never cancels.
    pending::<()>().await
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_passes_through() {
        let ctx = Context::background();
        let value = ctx.guard(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let ctx = Context::background().with_timeout(Duration::from_millis(20));
        let result: ConstructionResult<()> = ctx
            .guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ConstructionError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_cancel_interrupts() {
        let (tx, rx) = watch::channel(false);
        let ctx = Context::background().with_cancel(rx);
        let handle = tokio::spawn(async move {
            ctx.guard(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();
        let result = handle.await.unwrap();
        assert!(matches!(result, Err(ConstructionError::Cancelled)));
    }

    #[tokio::test]
    async fn test_already_cancelled() {
        let (_tx, rx) = watch::channel(true);
        let ctx = Context::background().with_cancel(rx);
        assert!(ctx.is_cancelled());
        assert!(matches!(ctx.check(), Err(ConstructionError::Cancelled)));
    }

    #[test]
    fn test_deadline_only_tightens() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(10));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_dropped_sender_never_cancels() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let ctx = Context::background().with_cancel(rx);
        assert_eq!(ctx.guard(async { Ok("done") }).await.unwrap(), "done");
    }
}
