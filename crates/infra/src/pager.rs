//! Circular, page-at-a-time walk over the library.
//!
//! The pager visits `total` positions starting at the persisted cursor,
//! wrapping at the end of the collection. `total` is a snapshot taken before
//! the walk; the collection may shrink or reorder underneath, so a short page
//! realigns the cursor instead of failing.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use lyricsweep_core::LibraryItem;

use crate::cancel::{self, Cancelled, or_cancel};
use crate::library::{LibraryError, LibraryQuery, LibrarySource};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Consecutive realignments tolerated before the walk gives up.
const MAX_REALIGNMENTS: u32 = 3;

/// Lazy cursor walk over a [`LibrarySource`].
///
/// Advancing past an item happens on the following [`next`](Self::next)
/// call, so [`cursor`](Self::cursor) keeps pointing at the item last handed
/// out until the caller asks for another one.
pub struct CursorPager<'a, L: LibrarySource + ?Sized> {
    library: &'a L,
    query: &'a LibraryQuery,
    total: usize,
    page_size: usize,
    cursor: usize,
    visited: usize,
    page: Option<(usize, Vec<LibraryItem>)>,
    pending_advance: bool,
    realignments: u32,
    stopped_early: bool,
}

impl<'a, L: LibrarySource + ?Sized> CursorPager<'a, L> {
    pub fn new(library: &'a L, query: &'a LibraryQuery, total: usize, start: usize) -> Self {
        Self {
            library,
            query,
            total,
            page_size: DEFAULT_PAGE_SIZE,
            cursor: if total == 0 { 0 } else { start % total },
            visited: 0,
            page: None,
            pending_advance: false,
            realignments: 0,
            stopped_early: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Position of the item last handed out (or of the next one, before the
    /// first call).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Position the walk resumes from once the current item is done.
    pub fn next_cursor(&self) -> usize {
        if self.pending_advance {
            (self.cursor + 1) % self.total
        } else {
            self.cursor
        }
    }

    /// Positions consumed so far.
    pub fn visited(&self) -> usize {
        self.visited
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// The walk ended before a full cycle (empty page or library failure).
    pub fn stopped_early(&self) -> bool {
        self.stopped_early
    }

    /// Next item in cycle order, or `None` once the cycle is complete or the
    /// walk stopped early.
    pub async fn next(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<LibraryItem>, Cancelled> {
        if self.pending_advance {
            self.pending_advance = false;
            self.cursor = (self.cursor + 1) % self.total;
            self.visited += 1;
        }

        loop {
            if self.stopped_early || self.visited >= self.total {
                return Ok(None);
            }
            cancel::check(cancel)?;

            let page_start = self.cursor - self.cursor % self.page_size;
            if self.page.as_ref().map(|(start, _)| *start) != Some(page_start) {
                let fetched = or_cancel(
                    self.library.page(self.query, page_start, self.page_size),
                    cancel,
                )
                .await?;
                match fetched {
                    Ok(items) => self.page = Some((page_start, items)),
                    Err(LibraryError::Cancelled) => return Err(Cancelled),
                    Err(err) => {
                        warn!(offset = page_start, error = %err, "page fetch failed, stopping early");
                        return Ok(self.stop());
                    }
                }
            }

            let page_len = self.page.as_ref().map_or(0, |(_, items)| items.len());
            if page_len == 0 && self.visited == 0 && page_start != 0 {
                // The stored cursor points past the end of the library.
                warn!(offset = page_start, "first page empty, restarting walk at 0");
                self.cursor = 0;
                continue;
            }
            if page_len == 0 {
                warn!(
                    offset = page_start,
                    visited = self.visited,
                    total = self.total,
                    "empty page mid-cycle, stopping early"
                );
                return Ok(self.stop());
            }

            let offset = self.cursor - page_start;
            if offset >= page_len {
                self.realignments += 1;
                if self.realignments > MAX_REALIGNMENTS {
                    warn!(cursor = self.cursor, "cursor keeps drifting, stopping early");
                    return Ok(self.stop());
                }

                let mut realigned = (page_start + page_len) % self.total;
                if realigned - realigned % self.page_size == page_start {
                    realigned = 0;
                }
                debug!(from = self.cursor, to = realigned, page_len, "short page, realigning cursor");
                self.cursor = realigned;
                continue;
            }

            let item = self
                .page
                .as_ref()
                .and_then(|(_, items)| items.get(offset))
                .cloned();
            if let Some(item) = item {
                self.realignments = 0;
                self.pending_advance = true;
                return Ok(Some(item));
            }
        }
    }

    fn stop(&mut self) -> Option<LibraryItem> {
        self.stopped_early = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use proptest::prelude::*;

    use lyricsweep_core::AudioTrack;

    use super::*;
    use crate::library::InMemoryLibrary;

    fn library(n: usize) -> InMemoryLibrary {
        InMemoryLibrary::with_items((0..n).map(|i| AudioTrack::new(format!("t{i}")).into()))
    }

    async fn drain<L: LibrarySource + ?Sized>(pager: &mut CursorPager<'_, L>) -> Vec<String> {
        let token = CancellationToken::new();
        let mut ids = Vec::new();
        while let Some(item) = pager.next(&token).await.unwrap() {
            ids.push(item.id().to_string());
        }
        ids
    }

    #[tokio::test]
    async fn full_cycle_wraps_back_to_start() {
        let lib = library(7);
        let query = LibraryQuery::audio_tracks();
        let mut pager = CursorPager::new(&lib, &query, 7, 5).with_page_size(3);

        let ids = drain(&mut pager).await;

        assert_eq!(ids, ["t5", "t6", "t0", "t1", "t2", "t3", "t4"]);
        assert_eq!(pager.visited(), 7);
        assert_eq!(pager.cursor(), 5);
        assert!(!pager.stopped_early());
    }

    #[tokio::test]
    async fn fetches_each_page_once_per_cycle() {
        let lib = library(250);
        let query = LibraryQuery::audio_tracks();
        let mut pager = CursorPager::new(&lib, &query, 250, 0);

        assert_eq!(drain(&mut pager).await.len(), 250);
        assert_eq!(lib.page_calls(), 3);
    }

    #[tokio::test]
    async fn cursor_trails_until_next_item_is_requested() {
        let lib = library(4);
        let query = LibraryQuery::audio_tracks();
        let token = CancellationToken::new();
        let mut pager = CursorPager::new(&lib, &query, 4, 1);

        let first = pager.next(&token).await.unwrap().unwrap();
        assert_eq!(first.id().as_str(), "t1");
        assert_eq!(pager.cursor(), 1);
        assert_eq!(pager.next_cursor(), 2);
        assert_eq!(pager.visited(), 0);

        pager.next(&token).await.unwrap();
        assert_eq!(pager.cursor(), 2);
        assert_eq!(pager.visited(), 1);
    }

    #[tokio::test]
    async fn short_tail_page_wraps_to_zero() {
        // Snapshot said 250, the library now only holds 230.
        let lib = library(230);
        let query = LibraryQuery::audio_tracks();
        let mut pager = CursorPager::new(&lib, &query, 250, 240);

        let ids = drain(&mut pager).await;

        assert_eq!(ids.first().map(String::as_str), Some("t0"));
        assert_eq!(ids.len(), 250);
        assert!(!pager.stopped_early());
    }

    #[tokio::test]
    async fn shrinking_mid_cycle_stops_on_empty_page() {
        let lib = library(30);
        let query = LibraryQuery::audio_tracks();
        let token = CancellationToken::new();
        let mut pager = CursorPager::new(&lib, &query, 30, 0).with_page_size(10);

        for _ in 0..10 {
            pager.next(&token).await.unwrap().unwrap();
        }
        lib.truncate(5);

        assert_eq!(pager.next(&token).await.unwrap(), None);
        assert!(pager.stopped_early());
        assert_eq!(pager.visited(), 10);
        assert_eq!(pager.cursor(), 10);
    }

    #[tokio::test]
    async fn cursor_past_end_restarts_at_zero() {
        // Count keeps reporting 250 while only 150 items exist.
        let lib = library(150);
        let query = LibraryQuery::audio_tracks();
        let mut pager = CursorPager::new(&lib, &query, 250, 210);

        let ids = drain(&mut pager).await;

        assert_eq!(ids.first().map(String::as_str), Some("t0"));
        assert_eq!(ids.len(), 250);
        assert!(!pager.stopped_early());
    }

    #[tokio::test]
    async fn empty_library_page_zero_stops() {
        let lib = library(0);
        let query = LibraryQuery::audio_tracks();
        let mut pager = CursorPager::new(&lib, &query, 40, 30).with_page_size(10);

        assert!(drain(&mut pager).await.is_empty());
        assert!(pager.stopped_early());
        assert_eq!(lib.page_calls(), 2);
    }

    #[tokio::test]
    async fn empty_snapshot_yields_nothing() {
        let lib = library(3);
        let query = LibraryQuery::audio_tracks();
        let mut pager = CursorPager::new(&lib, &query, 0, 12);

        assert!(drain(&mut pager).await.is_empty());
        assert_eq!(lib.page_calls(), 0);
    }

    struct BrokenLibrary(LibraryError);

    #[async_trait]
    impl LibrarySource for BrokenLibrary {
        async fn count(&self, _query: &LibraryQuery) -> Result<usize, LibraryError> {
            Ok(10)
        }

        async fn page(
            &self,
            _query: &LibraryQuery,
            _offset: usize,
            _limit: usize,
        ) -> Result<Vec<LibraryItem>, LibraryError> {
            Err(self.0.clone())
        }
    }

    #[tokio::test]
    async fn page_failure_stops_early() {
        let lib = BrokenLibrary(LibraryError::Query("db locked".into()));
        let query = LibraryQuery::audio_tracks();
        let mut pager = CursorPager::new(&lib, &query, 10, 0);

        assert!(drain(&mut pager).await.is_empty());
        assert!(pager.stopped_early());
    }

    #[tokio::test]
    async fn library_cancellation_propagates() {
        let lib = BrokenLibrary(LibraryError::Cancelled);
        let query = LibraryQuery::audio_tracks();
        let mut pager = CursorPager::new(&lib, &query, 10, 0);

        let res = pager.next(&CancellationToken::new()).await;
        assert_eq!(res, Err(Cancelled));
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_fetch() {
        let lib = library(5);
        let query = LibraryQuery::audio_tracks();
        let token = CancellationToken::new();
        token.cancel();
        let mut pager = CursorPager::new(&lib, &query, 5, 0);

        assert_eq!(pager.next(&token).await, Err(Cancelled));
        assert_eq!(lib.page_calls(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]

        #[test]
        fn every_position_visited_once(total in 1usize..60, start in 0usize..200, page in 1usize..16) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let lib = library(total);
            let query = LibraryQuery::audio_tracks();
            let mut pager = CursorPager::new(&lib, &query, total, start).with_page_size(page);

            let mut ids = rt.block_on(drain(&mut pager));
            prop_assert_eq!(ids.len(), total);
            prop_assert_eq!(pager.cursor(), start % total);

            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
        }
    }
}
