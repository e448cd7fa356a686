use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use lyricsweep_core::LibraryItem;

use super::{LibraryError, LibraryQuery, LibrarySource};

/// In-memory library for tests/dev.
///
/// The contents can be changed between calls to simulate a library that is
/// being edited while a sweep runs.
#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    items: RwLock<Vec<LibraryItem>>,
    page_calls: AtomicUsize,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = LibraryItem>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().collect()),
            page_calls: AtomicUsize::new(0),
        }
    }

    /// Keep only the first `len` items.
    pub fn truncate(&self, len: usize) {
        self.items.write().unwrap().truncate(len);
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `page` calls served so far.
    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LibrarySource for InMemoryLibrary {
    async fn count(&self, _query: &LibraryQuery) -> Result<usize, LibraryError> {
        Ok(self.len())
    }

    async fn page(
        &self,
        _query: &LibraryQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<LibraryItem>, LibraryError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let items = self.items.read().unwrap();
        Ok(items.iter().skip(offset).take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use lyricsweep_core::AudioTrack;

    use super::*;

    #[tokio::test]
    async fn pages_past_the_end_are_empty() {
        let lib = InMemoryLibrary::with_items((0..5).map(|i| AudioTrack::new(format!("t{i}")).into()));
        let q = LibraryQuery::audio_tracks();

        assert_eq!(lib.count(&q).await.unwrap(), 5);
        assert_eq!(lib.page(&q, 3, 10).await.unwrap().len(), 2);
        assert!(lib.page(&q, 5, 10).await.unwrap().is_empty());
        assert_eq!(lib.page_calls(), 2);
    }
}
