//! Remote lyrics source.
//!
//! The provider speaks to the actual lyrics service; the sweep only drives the
//! three-step protocol in [`enrich`]: look at what the track has, search when
//! it is missing or upgradeable, fetch the chosen candidate.

pub mod enrich;
pub mod in_memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lyricsweep_core::{AudioTrack, SearchOptions};

pub use enrich::enrich_track;
pub use in_memory::InMemoryLyricsProvider;

/// Lyrics currently attached to a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingLyrics {
    /// Time-aligned (synced) lyrics, as opposed to plain text.
    pub is_synced: bool,
}

/// One search hit, as ranked by the provider (best first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricCandidate {
    pub id: String,
    pub is_synced: bool,
}

impl LyricCandidate {
    pub fn plain(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_synced: false,
        }
    }

    pub fn synced(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_synced: true,
        }
    }
}

/// Provider failure.
///
/// Anything but `Cancelled` is recorded against the track and the sweep moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("lyrics request cancelled")]
    Cancelled,
    #[error("remote lyrics lookup failed: {0}")]
    Remote(String),
    #[error("applying lyrics failed: {0}")]
    Apply(String),
}

#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Lyrics already stored for the track, if any.
    async fn get_existing(&self, track: &AudioTrack)
    -> Result<Option<ExistingLyrics>, ProviderError>;

    /// Ranked candidates for the track.
    async fn search(
        &self,
        track: &AudioTrack,
        options: &SearchOptions,
    ) -> Result<Vec<LyricCandidate>, ProviderError>;

    /// Download the candidate and attach it to the track.
    async fn fetch(&self, track: &AudioTrack, candidate_id: &str) -> Result<(), ProviderError>;
}

#[async_trait]
impl<P> LyricsProvider for Arc<P>
where
    P: LyricsProvider + ?Sized,
{
    async fn get_existing(
        &self,
        track: &AudioTrack,
    ) -> Result<Option<ExistingLyrics>, ProviderError> {
        (**self).get_existing(track).await
    }

    async fn search(
        &self,
        track: &AudioTrack,
        options: &SearchOptions,
    ) -> Result<Vec<LyricCandidate>, ProviderError> {
        (**self).search(track, options).await
    }

    async fn fetch(&self, track: &AudioTrack, candidate_id: &str) -> Result<(), ProviderError> {
        (**self).fetch(track, candidate_id).await
    }
}
