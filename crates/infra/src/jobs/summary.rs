use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use lyricsweep_core::{RunId, TrackOutcome};

/// What one sweep did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    /// Collection size at the start of the run.
    pub total: usize,
    /// Positions consumed by the pager.
    pub visited: usize,
    /// Tracks handed to the lyrics provider.
    pub attempted: usize,
    pub downloaded: usize,
    pub upgraded: usize,
    pub already_synced: usize,
    pub not_found: usize,
    pub no_synced_upgrade: usize,
    pub failed: usize,
    pub backoff_skipped: usize,
    pub stale_dropped: usize,
    pub pruned: usize,
    pub non_audio_skipped: usize,
    pub cap_reached: bool,
    pub stopped_early: bool,
    pub start_cursor: usize,
    pub end_cursor: usize,
    /// Retry entries left in the state after the run.
    pub remaining_entries: usize,
    pub elapsed_ms: u64,
}

impl RunSummary {
    pub fn new(run_id: RunId, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            total: 0,
            visited: 0,
            attempted: 0,
            downloaded: 0,
            upgraded: 0,
            already_synced: 0,
            not_found: 0,
            no_synced_upgrade: 0,
            failed: 0,
            backoff_skipped: 0,
            stale_dropped: 0,
            pruned: 0,
            non_audio_skipped: 0,
            cap_reached: false,
            stopped_early: false,
            start_cursor: 0,
            end_cursor: 0,
            remaining_entries: 0,
            elapsed_ms: 0,
        }
    }

    pub(crate) fn record(&mut self, outcome: &TrackOutcome) {
        match outcome {
            TrackOutcome::Downloaded => self.downloaded += 1,
            TrackOutcome::Upgraded => self.upgraded += 1,
            TrackOutcome::AlreadySynced => self.already_synced += 1,
            TrackOutcome::NotFound => self.not_found += 1,
            TrackOutcome::NoSyncedUpgrade => self.no_synced_upgrade += 1,
            TrackOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lyrics sweep {}: {}/{} visited, {} attempted ({} downloaded, {} upgraded, \
             {} already synced, {} not found, {} plain without synced, {} failed), \
             {} in backoff, {} stale, {} pruned, cursor {} -> {}",
            self.run_id,
            self.visited,
            self.total,
            self.attempted,
            self.downloaded,
            self.upgraded,
            self.already_synced,
            self.not_found,
            self.no_synced_upgrade,
            self.failed,
            self.backoff_skipped,
            self.stale_dropped,
            self.pruned,
            self.start_cursor,
            self.end_cursor,
        )?;
        if self.cap_reached {
            f.write_str(", run cap reached")?;
        }
        if self.stopped_early {
            f.write_str(", stopped early")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn record_counts_each_outcome() {
        let mut summary = RunSummary::new(RunId::new(), Utc::now());
        for outcome in [
            TrackOutcome::Downloaded,
            TrackOutcome::Downloaded,
            TrackOutcome::Upgraded,
            TrackOutcome::NotFound,
            TrackOutcome::failed("timeout"),
        ] {
            summary.record(&outcome);
        }

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.upgraded, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.already_synced, 0);
    }

    #[test]
    fn display_mentions_flags() {
        let started = Utc.with_ymd_and_hms(2025, 3, 1, 4, 0, 0).unwrap();
        let mut summary = RunSummary::new(RunId::new(), started);
        summary.cap_reached = true;

        let text = summary.to_string();
        assert!(text.contains("run cap reached"));
        assert!(!text.contains("stopped early"));
    }

    #[test]
    fn serializes_camel_case() {
        let summary = RunSummary::new(RunId::new(), Utc::now());
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("alreadySynced").is_some());
        assert!(json.get("capReached").is_some());
    }
}
