//! Adaptive per-track retry backoff.
//!
//! ## Rules
//!
//! - A track whose metadata changed (signature mismatch) loses its entry and
//!   is always eligible.
//! - A track inside its retry window is skipped.
//! - Successful outcomes remove the entry.
//! - "No result" outcomes walk the day schedule; the last step repeats once
//!   the schedule is exhausted.
//! - Errors retry after a fixed delay and leave the no-result count alone.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ItemId;
use crate::outcome::TrackOutcome;
use crate::retry_state::{RetryOutcome, RetryState};

/// Default no-result schedule, in days.
pub const DEFAULT_SCHEDULE_DAYS: [u32; 4] = [1, 3, 7, 30];

/// Delay before a track that errored is retried, in days.
pub const ERROR_RETRY_DELAY_DAYS: u32 = 1;

/// Ascending, deduplicated, strictly positive list of day counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<u32>", from = "Vec<i64>")]
pub struct BackoffSchedule(Vec<u32>);

impl BackoffSchedule {
    /// Build a schedule from raw configuration values.
    ///
    /// Non-positive values are dropped, the rest sorted and deduplicated; an
    /// empty result falls back to [`DEFAULT_SCHEDULE_DAYS`].
    pub fn sanitize(raw: &[i64]) -> Self {
        let mut days: Vec<u32> = raw
            .iter()
            .filter(|d| **d > 0)
            .map(|d| u32::try_from(*d).unwrap_or(u32::MAX))
            .collect();
        days.sort_unstable();
        days.dedup();

        if days.is_empty() {
            Self::default()
        } else {
            Self(days)
        }
    }

    pub fn days(&self) -> &[u32] {
        &self.0
    }

    /// Schedule index for the n-th consecutive no-result outcome (1-indexed).
    pub fn index_for(&self, consecutive_no_results: u32) -> usize {
        let n = consecutive_no_results.max(1) as usize;
        (n - 1).min(self.0.len() - 1)
    }

    /// Delay for the n-th consecutive no-result outcome (1-indexed).
    pub fn delay_for(&self, consecutive_no_results: u32) -> Duration {
        let days = i64::from(self.0[self.index_for(consecutive_no_results)]);
        Duration::try_days(days).unwrap_or(Duration::MAX)
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self(DEFAULT_SCHEDULE_DAYS.to_vec())
    }
}

impl From<Vec<i64>> for BackoffSchedule {
    fn from(raw: Vec<i64>) -> Self {
        Self::sanitize(&raw)
    }
}

impl From<BackoffSchedule> for Vec<u32> {
    fn from(schedule: BackoffSchedule) -> Self {
        schedule.0
    }
}

/// Result of the pre-attempt gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Attempt the track. `stale_dropped` is set when an entry with an
    /// outdated signature was removed on the way.
    Proceed { stale_dropped: bool },
    /// Still inside the retry window.
    Skip { next_retry_utc: DateTime<Utc> },
}

impl GateDecision {
    pub fn is_skip(&self) -> bool {
        matches!(self, GateDecision::Skip { .. })
    }
}

/// Per-track backoff policy over a [`RetryState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryBackoffPolicy {
    pub schedule: BackoffSchedule,
    pub error_delay: Duration,
}

impl Default for RetryBackoffPolicy {
    fn default() -> Self {
        Self::new(BackoffSchedule::default())
    }
}

impl RetryBackoffPolicy {
    pub fn new(schedule: BackoffSchedule) -> Self {
        Self {
            schedule,
            error_delay: Duration::days(i64::from(ERROR_RETRY_DELAY_DAYS)),
        }
    }

    /// Decide whether `id` may be attempted at `now`.
    ///
    /// Drops the entry first if its signature no longer matches.
    pub fn gate(
        &self,
        state: &mut RetryState,
        id: &ItemId,
        signature: &str,
        now: DateTime<Utc>,
    ) -> GateDecision {
        let Some(entry) = state.entry(id) else {
            return GateDecision::Proceed {
                stale_dropped: false,
            };
        };

        if entry.track_signature != signature {
            state.remove(id);
            return GateDecision::Proceed {
                stale_dropped: true,
            };
        }

        match entry.next_retry_utc {
            Some(next_retry_utc) if entry.is_waiting(now) => GateDecision::Skip { next_retry_utc },
            _ => GateDecision::Proceed {
                stale_dropped: false,
            },
        }
    }

    /// Apply the outcome of one attempt. Returns whether `state` changed.
    pub fn record(
        &self,
        state: &mut RetryState,
        id: &ItemId,
        signature: &str,
        outcome: &TrackOutcome,
        now: DateTime<Utc>,
    ) -> bool {
        if outcome.is_success() {
            self.record_success(state, id)
        } else if outcome.is_no_result() {
            self.record_no_result(state, id, signature, now)
        } else {
            self.record_error(state, id, signature, now)
        }
    }

    /// Forget the track. Removing a missing entry is not a mutation.
    pub fn record_success(&self, state: &mut RetryState, id: &ItemId) -> bool {
        state.remove(id)
    }

    pub fn record_no_result(
        &self,
        state: &mut RetryState,
        id: &ItemId,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let entry = state.upsert(id);
        entry.consecutive_no_result_count = entry.consecutive_no_result_count.saturating_add(1);
        entry.track_signature = signature.to_string();
        entry.last_attempt_utc = Some(now);
        entry.last_outcome = RetryOutcome::NoResult;
        entry.next_retry_utc = Some(saturating_add(
            now,
            self.schedule.delay_for(entry.consecutive_no_result_count),
        ));
        true
    }

    pub fn record_error(
        &self,
        state: &mut RetryState,
        id: &ItemId,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        let entry = state.upsert(id);
        entry.track_signature = signature.to_string();
        entry.last_attempt_utc = Some(now);
        entry.last_outcome = RetryOutcome::Error;
        entry.next_retry_utc = Some(saturating_add(now, self.error_delay));
        true
    }
}

fn saturating_add(at: DateTime<Utc>, delay: Duration) -> DateTime<Utc> {
    at.checked_add_signed(delay).unwrap_or(DateTime::<Utc>::MAX_UTC)
}
