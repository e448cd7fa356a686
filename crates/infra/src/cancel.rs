//! Cancellation plumbing.
//!
//! Cancellation is the only condition that aborts a sweep. Every await on a
//! collaborator is raced against the run's `CancellationToken`.

use std::future::Future;

use tokio_util::sync::CancellationToken;

/// The run was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// Fail fast if the token is already cancelled.
pub fn check(token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        Err(Cancelled)
    } else {
        Ok(())
    }
}

/// Race `fut` against `token`.
///
/// Returns `Err(Cancelled)` if the token fires first (or already fired).
pub async fn or_cancel<F>(fut: F, token: &CancellationToken) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    check(token)?;
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        res = fut => Ok(res),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn returns_output_when_future_wins() {
        let token = CancellationToken::new();
        assert_eq!(or_cancel(async { 7 }, &token).await, Ok(7));
    }

    #[tokio::test]
    async fn already_cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(or_cancel(async { 7 }, &token).await, Err(Cancelled));
        assert_eq!(check(&token), Err(Cancelled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_future() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        let res = or_cancel(std::future::pending::<()>(), &token).await;
        assert_eq!(res, Err(Cancelled));
    }
}
