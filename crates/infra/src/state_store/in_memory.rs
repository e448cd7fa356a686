use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use lyricsweep_core::RetryState;

use super::RetryStateStore;
use crate::cancel::{self, Cancelled};

/// Keeps the last saved snapshot in memory, counts saves and remembers the
/// cursor of every save.
#[derive(Debug, Default)]
pub struct InMemoryRetryStateStore {
    state: Mutex<Option<RetryState>>,
    cursors: Mutex<Vec<i64>>,
    saves: AtomicUsize,
}

impl InMemoryRetryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: RetryState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            cursors: Mutex::new(Vec::new()),
            saves: AtomicUsize::new(0),
        }
    }

    /// Last saved (or seeded) state.
    pub fn snapshot(&self) -> Option<RetryState> {
        self.state.lock().unwrap().clone()
    }

    /// Cursor of each save, oldest first.
    pub fn saved_cursors(&self) -> Vec<i64> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RetryStateStore for InMemoryRetryStateStore {
    async fn load(&self, cancel: &CancellationToken) -> Result<RetryState, Cancelled> {
        cancel::check(cancel)?;
        Ok(self.snapshot().unwrap_or_default())
    }

    async fn save(&self, state: &RetryState, cancel: &CancellationToken) -> Result<(), Cancelled> {
        cancel::check(cancel)?;
        *self.state.lock().unwrap() = Some(state.clone());
        self.cursors.lock().unwrap().push(state.cursor);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_returns_last_save() {
        let store = InMemoryRetryStateStore::new();
        let token = CancellationToken::new();
        assert_eq!(store.load(&token).await.unwrap(), RetryState::new());

        let mut state = RetryState::new();
        state.cursor = 7;
        store.save(&state, &token).await.unwrap();

        assert_eq!(store.load(&token).await.unwrap().cursor, 7);
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.saved_cursors(), vec![7]);
    }
}
