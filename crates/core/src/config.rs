//! Sweep configuration and its sanitized run-time form.

use serde::{Deserialize, Serialize};

use crate::backoff::{BackoffSchedule, DEFAULT_SCHEDULE_DAYS, RetryBackoffPolicy};
use crate::error::ConfigError;

pub const DEFAULT_MAX_TRACKS_PER_RUN: i64 = 2000;
pub const MIN_MAX_TRACKS_PER_RUN: i64 = 100;
pub const DEFAULT_FAILURE_STATE_TTL_DAYS: i64 = 90;
pub const MIN_FAILURE_STATE_TTL_DAYS: i64 = 1;

/// User-facing configuration, as stored by the host.
///
/// Values are taken as-is; [`SweepConfig::sanitize`] turns them into safe
/// [`RunSettings`]. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SweepConfig {
    pub use_strict_search: bool,
    pub exclude_artist_name: bool,
    pub exclude_album_name: bool,
    pub enable_adaptive_retry_backoff: bool,
    pub enable_run_cap: bool,
    pub max_tracks_per_run: i64,
    pub failure_state_ttl_days: i64,
    pub backoff_schedule_days: Vec<i64>,
    /// Cursor kept in the configuration by older releases.
    pub state_cursor: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            use_strict_search: true,
            exclude_artist_name: false,
            exclude_album_name: false,
            enable_adaptive_retry_backoff: true,
            enable_run_cap: true,
            max_tracks_per_run: DEFAULT_MAX_TRACKS_PER_RUN,
            failure_state_ttl_days: DEFAULT_FAILURE_STATE_TTL_DAYS,
            backoff_schedule_days: DEFAULT_SCHEDULE_DAYS.iter().map(|d| i64::from(*d)).collect(),
            state_cursor: 0,
        }
    }
}

impl SweepConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Clamp every value into its valid range. Never fails.
    pub fn sanitize(&self) -> RunSettings {
        let run_cap = self.enable_run_cap.then(|| {
            let cap = if self.max_tracks_per_run <= 0 {
                DEFAULT_MAX_TRACKS_PER_RUN
            } else {
                self.max_tracks_per_run.max(MIN_MAX_TRACKS_PER_RUN)
            };
            usize::try_from(cap).unwrap_or(usize::MAX)
        });

        let ttl_days = if self.failure_state_ttl_days <= 0 {
            DEFAULT_FAILURE_STATE_TTL_DAYS
        } else {
            self.failure_state_ttl_days.max(MIN_FAILURE_STATE_TTL_DAYS)
        };

        RunSettings {
            search: SearchOptions {
                strict: self.use_strict_search,
                exclude_artist_name: self.exclude_artist_name,
                exclude_album_name: self.exclude_album_name,
            },
            adaptive_backoff: self.enable_adaptive_retry_backoff,
            run_cap,
            ttl_days: u32::try_from(ttl_days).unwrap_or(u32::MAX),
            schedule: BackoffSchedule::sanitize(&self.backoff_schedule_days),
            legacy_cursor: self.state_cursor,
        }
    }
}

/// Hints forwarded to the lyrics search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Ask the provider for precise matches only.
    pub strict: bool,
    pub exclude_artist_name: bool,
    pub exclude_album_name: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            strict: true,
            exclude_artist_name: false,
            exclude_album_name: false,
        }
    }
}

/// Sanitized settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub search: SearchOptions,
    pub adaptive_backoff: bool,
    /// Maximum number of attempted tracks; `None` when capping is disabled.
    pub run_cap: Option<usize>,
    pub ttl_days: u32,
    pub schedule: BackoffSchedule,
    pub legacy_cursor: i64,
}

impl RunSettings {
    pub fn backoff_policy(&self) -> RetryBackoffPolicy {
        RetryBackoffPolicy::new(self.schedule.clone())
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        SweepConfig::default().sanitize()
    }
}
