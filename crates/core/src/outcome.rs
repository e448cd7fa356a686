use serde::{Deserialize, Serialize};

/// Classified result of processing one track.
///
/// "Nothing found" is an ordinary outcome, not an error; `Failed` is reserved
/// for collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackOutcome {
    /// Track had no lyrics; the best candidate was downloaded.
    Downloaded,
    /// Track had plain lyrics; a synced candidate replaced them.
    Upgraded,
    /// Track already has synced lyrics.
    AlreadySynced,
    /// Track has no lyrics and the search came back empty.
    NotFound,
    /// Track has plain lyrics and no synced candidate exists.
    NoSyncedUpgrade,
    /// A collaborator call failed.
    Failed { reason: String },
}

impl TrackOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Terminal outcome: no further attempts needed while metadata is unchanged.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TrackOutcome::Downloaded | TrackOutcome::Upgraded | TrackOutcome::AlreadySynced
        )
    }

    pub fn is_no_result(&self) -> bool {
        matches!(self, TrackOutcome::NotFound | TrackOutcome::NoSyncedUpgrade)
    }
}
