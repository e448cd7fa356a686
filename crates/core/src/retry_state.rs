//! Persisted retry and cursor state of the sweep.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ItemId;

/// Last observed processing outcome of a track.
///
/// Informational; the policy only looks at the counters and timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetryOutcome {
    #[default]
    None,
    NoResult,
    Downloaded,
    Upgraded,
    Error,
}

/// Retry state for one track.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryEntry {
    /// Signature of the track metadata at the time of the last attempt.
    #[serde(alias = "TrackSignature")]
    pub track_signature: String,
    #[serde(alias = "ConsecutiveNoResultCount")]
    pub consecutive_no_result_count: u32,
    #[serde(
        alias = "NextRetryUtc",
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub next_retry_utc: Option<DateTime<Utc>>,
    #[serde(
        alias = "LastAttemptUtc",
        with = "crate::timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_attempt_utc: Option<DateTime<Utc>>,
    #[serde(alias = "LastOutcome")]
    pub last_outcome: RetryOutcome,
}

impl RetryEntry {
    /// Whether the track is still inside its retry window at `now`.
    pub fn is_waiting(&self, now: DateTime<Utc>) -> bool {
        self.next_retry_utc.is_some_and(|at| at > now)
    }

    /// Whether the entry outlived the retention window.
    ///
    /// Entries that were never attempted are never expired.
    pub fn is_expired(&self, cutoff: DateTime<Utc>) -> bool {
        self.last_attempt_utc.is_some_and(|at| at < cutoff)
    }
}

/// Retry entries plus the resume cursor.
///
/// The sweep owns this value for the whole run; stores only ever see a
/// borrowed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryState {
    /// Next start offset into the library ordering. May be stale or out of
    /// range; see [`RetryState::normalized_cursor`].
    #[serde(alias = "Cursor")]
    pub cursor: i64,
    #[serde(alias = "Entries")]
    pub entries: HashMap<String, RetryEntry>,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pristine state: nothing was ever recorded.
    pub fn is_pristine(&self) -> bool {
        self.cursor == 0 && self.entries.is_empty()
    }

    pub fn entry(&self, id: &ItemId) -> Option<&RetryEntry> {
        self.entries.get(id.as_str())
    }

    pub fn upsert(&mut self, id: &ItemId) -> &mut RetryEntry {
        self.entries.entry(id.as_str().to_string()).or_default()
    }

    /// Remove an entry. Returns whether anything was removed.
    pub fn remove(&mut self, id: &ItemId) -> bool {
        self.entries.remove(id.as_str()).is_some()
    }

    /// Drop entries whose last attempt is older than `now - ttl_days`.
    ///
    /// Returns the number of removed entries.
    pub fn prune_expired(&mut self, now: DateTime<Utc>, ttl_days: u32) -> usize {
        let cutoff = Duration::try_days(i64::from(ttl_days))
            .and_then(|ttl| now.checked_sub_signed(ttl));
        let Some(cutoff) = cutoff else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(cutoff));
        before - self.entries.len()
    }

    /// Cursor mapped into `[0, total)`. Negative cursors restart at 0.
    ///
    /// Returns 0 for an empty collection.
    pub fn normalized_cursor(&self, total: usize) -> usize {
        normalize_cursor(self.cursor, total)
    }
}

/// Map a stored cursor into `[0, total)`.
pub fn normalize_cursor(cursor: i64, total: usize) -> usize {
    if total == 0 || cursor < 0 {
        return 0;
    }
    let cursor = u64::try_from(cursor).unwrap_or(0);
    (cursor % total as u64) as usize
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use proptest::prelude::*;

    use super::*;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()
    }

    fn entry(last_attempt: Option<DateTime<Utc>>, next_retry: Option<DateTime<Utc>>) -> RetryEntry {
        RetryEntry {
            track_signature: "sig".to_string(),
            consecutive_no_result_count: 1,
            next_retry_utc: next_retry,
            last_attempt_utc: last_attempt,
            last_outcome: RetryOutcome::NoResult,
        }
    }

    #[test]
    fn prune_removes_old_entries_even_when_still_waiting() {
        let now = at(30);
        let mut state = RetryState::new();
        state
            .entries
            .insert("old".into(), entry(Some(at(1)), Some(now + Duration::days(10))));
        state.entries.insert("fresh".into(), entry(Some(at(29)), None));
        state.entries.insert("never".into(), entry(None, None));

        let removed = state.prune_expired(now, 7);

        assert_eq!(removed, 1);
        assert!(!state.entries.contains_key("old"));
        assert!(state.entries.contains_key("fresh"));
        assert!(state.entries.contains_key("never"));
    }

    #[test]
    fn prune_boundary_is_exclusive() {
        let now = at(10);
        let mut state = RetryState::new();
        state.entries.insert("edge".into(), entry(Some(at(3)), None));

        assert_eq!(state.prune_expired(now, 7), 0);
        assert_eq!(state.prune_expired(now + Duration::seconds(1), 7), 1);
    }

    #[test]
    fn remove_reports_mutation() {
        let mut state = RetryState::new();
        let id = ItemId::new("a");
        assert!(!state.remove(&id));
        state.upsert(&id);
        assert!(state.remove(&id));
    }

    #[test]
    fn cursor_normalization_edge_cases() {
        assert_eq!(normalize_cursor(5, 0), 0);
        assert_eq!(normalize_cursor(-3, 10), 0);
        assert_eq!(normalize_cursor(10, 10), 0);
        assert_eq!(normalize_cursor(23, 10), 3);
        assert_eq!(normalize_cursor(i64::MAX, 7), (i64::MAX as u64 % 7) as usize);
    }

    #[test]
    fn json_uses_wire_field_names() {
        let mut state = RetryState::new();
        state.cursor = 42;
        state.entries.insert(
            "item-1".into(),
            RetryEntry {
                track_signature: "abc".into(),
                consecutive_no_result_count: 2,
                next_retry_utc: Some(at(5)),
                last_attempt_utc: Some(at(2)),
                last_outcome: RetryOutcome::NoResult,
            },
        );

        let json: serde_json::Value = serde_json::to_value(&state).unwrap();
        let e = &json["entries"]["item-1"];
        assert_eq!(json["cursor"], 42);
        assert_eq!(e["trackSignature"], "abc");
        assert_eq!(e["consecutiveNoResultCount"], 2);
        assert_eq!(e["nextRetryUtc"], "2025-06-05T12:00:00.000Z");
        assert_eq!(e["lastAttemptUtc"], "2025-06-02T12:00:00.000Z");
        assert_eq!(e["lastOutcome"], "NoResult");
    }

    #[test]
    fn round_trip_preserves_state() {
        let mut state = RetryState::new();
        state.cursor = 7;
        state.entries.insert("a".into(), entry(Some(at(1)), Some(at(2))));
        state.entries.insert(
            "b".into(),
            RetryEntry {
                last_outcome: RetryOutcome::Error,
                ..entry(Some(at(3)), Some(at(4)))
            },
        );

        let json = serde_json::to_string(&state).unwrap();
        let back: RetryState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn reads_pascal_case_document() {
        let json = r#"{
            "Cursor": 12,
            "Entries": {
                "x": {
                    "TrackSignature": "s",
                    "ConsecutiveNoResultCount": 1,
                    "NextRetryUtc": "2025-06-02T00:00:00",
                    "LastAttemptUtc": "0001-01-01T00:00:00",
                    "LastOutcome": "NoResult"
                }
            }
        }"#;

        let state: RetryState = serde_json::from_str(json).unwrap();
        assert_eq!(state.cursor, 12);
        let e = &state.entries["x"];
        assert!(e.next_retry_utc.is_some());
        assert_eq!(e.last_attempt_utc, None);
    }

    proptest! {
        #[test]
        fn normalized_cursor_is_in_range(cursor in any::<i64>(), total in 1usize..5_000) {
            let start = normalize_cursor(cursor, total);
            prop_assert!(start < total);
            if cursor >= 0 {
                prop_assert_eq!(start as i64, cursor % total as i64);
            } else {
                prop_assert_eq!(start, 0);
            }
        }
    }
}
