//! The lyrics sweep: one resumable pass over the library.

use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use lyricsweep_core::{
    AudioTrack, GateDecision, LibraryItem, RetryBackoffPolicy, RetryState, RunId, RunSettings,
    SweepConfig, TrackOutcome, signature,
};

use super::observer::SweepObserver;
use super::summary::RunSummary;
use crate::cancel::{self, Cancelled, or_cancel};
use crate::library::{LibraryError, LibraryQuery, LibrarySource};
use crate::lyrics::{LyricsProvider, enrich_track};
use crate::pager::{CursorPager, DEFAULT_PAGE_SIZE};
use crate::state_store::RetryStateStore;

/// Accumulated state mutations that trigger an intermediate save.
pub const DEFAULT_FLUSH_THRESHOLD: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SweepError {
    #[error("lyrics sweep cancelled")]
    Cancelled,
    #[error("cannot count library items: {0}")]
    Library(LibraryError),
}

impl From<Cancelled> for SweepError {
    fn from(_: Cancelled) -> Self {
        SweepError::Cancelled
    }
}

/// Drives one sweep over the library.
///
/// Each run resumes at the persisted cursor, attempts at most `run_cap`
/// tracks, keeps per-track backoff state and persists the new cursor. Only
/// cancellation and a failing item count abort a run; everything else is
/// recorded in the [`RunSummary`].
pub struct LyricsSweep<L, P, S, O> {
    library: L,
    provider: P,
    store: S,
    observer: O,
    config: SweepConfig,
    query: LibraryQuery,
    page_size: usize,
    flush_threshold: usize,
}

impl<L, P, S, O> LyricsSweep<L, P, S, O>
where
    L: LibrarySource,
    P: LyricsProvider,
    S: RetryStateStore,
    O: SweepObserver,
{
    pub fn new(library: L, provider: P, store: S, observer: O, config: SweepConfig) -> Self {
        Self {
            library,
            provider,
            store,
            observer,
            config,
            query: LibraryQuery::audio_tracks(),
            page_size: DEFAULT_PAGE_SIZE,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
        }
    }

    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunSummary, SweepError> {
        self.run_at(Utc::now(), cancel).await
    }

    /// Run with a fixed clock; `now` is used for every decision in the run.
    pub async fn run_at(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, SweepError> {
        let started = Instant::now();
        let settings = self.config.sanitize();
        let policy = settings.backoff_policy();
        let mut summary = RunSummary::new(RunId::new(), now);

        info!(
            run_id = %summary.run_id,
            run_cap = ?settings.run_cap,
            adaptive_backoff = settings.adaptive_backoff,
            ttl_days = settings.ttl_days,
            "lyrics sweep started"
        );

        let mut state = self.store.load(cancel).await?;
        summary.pruned = state.prune_expired(now, settings.ttl_days);
        if summary.pruned > 0 {
            debug!(pruned = summary.pruned, "pruned expired retry entries");
        }

        let total = match or_cancel(self.library.count(&self.query), cancel).await? {
            Ok(total) => total,
            Err(LibraryError::Cancelled) => return Err(SweepError::Cancelled),
            Err(err) => {
                error!(run_id = %summary.run_id, error = %err, "library count failed");
                if summary.pruned > 0 {
                    self.store.save(&state, cancel).await?;
                }
                return Err(SweepError::Library(err));
            }
        };
        summary.total = total;

        if total == 0 {
            info!(run_id = %summary.run_id, "no audio tracks in library");
            summary.remaining_entries = state.entries.len();
            return Ok(self.finish(summary, started));
        }

        if state.is_pristine() && settings.legacy_cursor > 0 {
            debug!(cursor = settings.legacy_cursor, "seeding cursor from configuration");
            state.cursor = settings.legacy_cursor;
        }
        let start = state.normalized_cursor(total);
        summary.start_cursor = start;

        let mut pager = CursorPager::new(&self.library, &self.query, total, start)
            .with_page_size(self.page_size);
        let mut mutations = summary.pruned;

        while let Some(item) = pager.next(cancel).await? {
            let LibraryItem::Audio(track) = &item else {
                summary.non_audio_skipped += 1;
                self.report_progress(pager.visited() + 1, total);
                continue;
            };

            if settings.run_cap.is_some_and(|cap| summary.attempted >= cap) {
                info!(
                    run_id = %summary.run_id,
                    attempted = summary.attempted,
                    cursor = pager.cursor(),
                    "run cap reached"
                );
                summary.cap_reached = true;
                break;
            }

            mutations += self
                .process(track, &settings, &policy, &mut state, &mut summary, now, cancel)
                .await?;

            if mutations >= self.flush_threshold {
                state.cursor = cursor_value(pager.next_cursor());
                self.store.save(&state, cancel).await?;
                debug!(mutations, cursor = state.cursor, "flushed retry state");
                mutations = 0;
            }

            self.report_progress(pager.visited() + 1, total);
        }

        summary.visited = pager.visited();
        summary.stopped_early = pager.stopped_early();
        summary.end_cursor = pager.cursor();
        summary.remaining_entries = state.entries.len();

        state.cursor = cursor_value(summary.end_cursor);
        self.store.save(&state, cancel).await?;

        Ok(self.finish(summary, started))
    }

    /// Gate, enrich and record one track. Returns the number of state
    /// mutations.
    #[allow(clippy::too_many_arguments)]
    async fn process(
        &self,
        track: &AudioTrack,
        settings: &RunSettings,
        policy: &RetryBackoffPolicy,
        state: &mut RetryState,
        summary: &mut RunSummary,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<usize, SweepError> {
        cancel::check(cancel)?;
        let sig = signature(track);
        let mut mutations = 0;

        if settings.adaptive_backoff {
            match policy.gate(state, &track.id, &sig, now) {
                GateDecision::Skip { next_retry_utc } => {
                    debug!(
                        path = %track.display_path(),
                        next_retry_utc = %next_retry_utc,
                        "in backoff, skipping"
                    );
                    summary.backoff_skipped += 1;
                    return Ok(0);
                }
                GateDecision::Proceed { stale_dropped } => {
                    if stale_dropped {
                        debug!(path = %track.display_path(), "metadata changed, dropped retry entry");
                        summary.stale_dropped += 1;
                        mutations += 1;
                    }
                }
            }
        }

        summary.attempted += 1;
        let outcome = enrich_track(&self.provider, track, &settings.search, cancel).await?;
        match &outcome {
            TrackOutcome::Failed { reason } => {
                error!(path = %track.display_path(), error = %reason, "lyrics lookup failed");
            }
            other => debug!(path = %track.display_path(), outcome = ?other, "track processed"),
        }
        summary.record(&outcome);

        if settings.adaptive_backoff && policy.record(state, &track.id, &sig, &outcome, now) {
            mutations += 1;
        }
        Ok(mutations)
    }

    fn report_progress(&self, visited: usize, total: usize) {
        let percent = (100.0 * visited as f64 / total as f64).min(100.0);
        self.observer.progress(percent);
    }

    fn finish(&self, mut summary: RunSummary, started: Instant) -> RunSummary {
        summary.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.observer.progress(100.0);
        info!(
            run_id = %summary.run_id,
            attempted = summary.attempted,
            downloaded = summary.downloaded,
            upgraded = summary.upgraded,
            failed = summary.failed,
            cap_reached = summary.cap_reached,
            elapsed_ms = summary.elapsed_ms,
            "{summary}"
        );
        self.observer.completed(&summary);
        summary
    }
}

fn cursor_value(cursor: usize) -> i64 {
    i64::try_from(cursor).unwrap_or(i64::MAX)
}
