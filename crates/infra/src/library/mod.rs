//! Host library access.
//!
//! The sweep only needs two things from the host catalog: how many items a
//! query matches, and one page of them at an offset. Both may change between
//! calls; the pager copes with that.

pub mod in_memory;

use std::sync::Arc;

use async_trait::async_trait;

use lyricsweep_core::LibraryItem;

pub use in_memory::InMemoryLibrary;

/// Item kinds a library query can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Audio,
}

/// Query over the host catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryQuery {
    /// Descend into folders.
    pub recursive: bool,
    /// Include placeholder items with no backing file.
    pub include_virtual: bool,
    pub item_kinds: Vec<ItemKind>,
}

impl LibraryQuery {
    /// Every real audio track in the library.
    pub fn audio_tracks() -> Self {
        Self {
            recursive: true,
            include_virtual: false,
            item_kinds: vec![ItemKind::Audio],
        }
    }
}

impl Default for LibraryQuery {
    fn default() -> Self {
        Self::audio_tracks()
    }
}

/// Library access failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LibraryError {
    #[error("library query cancelled")]
    Cancelled,
    #[error("library query failed: {0}")]
    Query(String),
}

/// Paged read access to the host catalog.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// Number of items matching `query` right now.
    async fn count(&self, query: &LibraryQuery) -> Result<usize, LibraryError>;

    /// Up to `limit` items starting at `offset` in the host's ordering.
    ///
    /// Returns fewer (or zero) items when the collection shrank.
    async fn page(
        &self,
        query: &LibraryQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<LibraryItem>, LibraryError>;
}

#[async_trait]
impl<S> LibrarySource for Arc<S>
where
    S: LibrarySource + ?Sized,
{
    async fn count(&self, query: &LibraryQuery) -> Result<usize, LibraryError> {
        (**self).count(query).await
    }

    async fn page(
        &self,
        query: &LibraryQuery,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<LibraryItem>, LibraryError> {
        (**self).page(query, offset, limit).await
    }
}
