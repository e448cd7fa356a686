//! Retry/cursor state persistence.
//!
//! ## Contract
//!
//! - `load` never fails the caller: a missing, unreadable or corrupt state
//!   degrades to an empty state (logged).
//! - `save` is best-effort: failures are logged and the sweep carries on.
//! - Cancellation is the only error either method returns.

pub mod file;
pub mod in_memory;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use lyricsweep_core::RetryState;

use crate::cancel::Cancelled;

pub use file::FileRetryStateStore;
pub use in_memory::InMemoryRetryStateStore;

#[async_trait]
pub trait RetryStateStore: Send + Sync {
    /// Load the persisted state, or an empty one.
    async fn load(&self, cancel: &CancellationToken) -> Result<RetryState, Cancelled>;

    /// Persist a snapshot of `state`.
    async fn save(&self, state: &RetryState, cancel: &CancellationToken) -> Result<(), Cancelled>;
}

#[async_trait]
impl<S> RetryStateStore for Arc<S>
where
    S: RetryStateStore + ?Sized,
{
    async fn load(&self, cancel: &CancellationToken) -> Result<RetryState, Cancelled> {
        (**self).load(cancel).await
    }

    async fn save(&self, state: &RetryState, cancel: &CancellationToken) -> Result<(), Cancelled> {
        (**self).save(state, cancel).await
    }
}
