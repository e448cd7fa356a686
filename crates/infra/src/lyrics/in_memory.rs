use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use lyricsweep_core::{AudioTrack, SearchOptions};

use super::{ExistingLyrics, LyricCandidate, LyricsProvider, ProviderError};

#[derive(Debug, Default)]
struct Catalog {
    existing: HashMap<String, ExistingLyrics>,
    candidates: HashMap<String, Vec<LyricCandidate>>,
    failures: HashMap<String, ProviderError>,
    fetched: Vec<(String, String)>,
}

/// Scripted lyrics provider for tests/dev.
///
/// Fetching a candidate attaches it to the track, so a second sweep sees the
/// downloaded lyrics as existing.
#[derive(Debug, Default)]
pub struct InMemoryLyricsProvider {
    inner: Mutex<Catalog>,
    search_calls: AtomicUsize,
}

impl InMemoryLyricsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_existing(&self, track_id: &str, lyrics: ExistingLyrics) {
        self.inner
            .lock()
            .unwrap()
            .existing
            .insert(track_id.to_string(), lyrics);
    }

    pub fn set_candidates(&self, track_id: &str, candidates: Vec<LyricCandidate>) {
        self.inner
            .lock()
            .unwrap()
            .candidates
            .insert(track_id.to_string(), candidates);
    }

    /// Make every call for `track_id` fail with `error`.
    pub fn fail_with(&self, track_id: &str, error: ProviderError) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .insert(track_id.to_string(), error);
    }

    /// `(track id, candidate id)` pairs fetched so far, in call order.
    pub fn fetched(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().fetched.clone()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn failure(&self, track: &AudioTrack) -> Result<(), ProviderError> {
        match self.inner.lock().unwrap().failures.get(track.id.as_str()) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LyricsProvider for InMemoryLyricsProvider {
    async fn get_existing(
        &self,
        track: &AudioTrack,
    ) -> Result<Option<ExistingLyrics>, ProviderError> {
        self.failure(track)?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .existing
            .get(track.id.as_str())
            .cloned())
    }

    async fn search(
        &self,
        track: &AudioTrack,
        _options: &SearchOptions,
    ) -> Result<Vec<LyricCandidate>, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.failure(track)?;
        Ok(self
            .inner
            .lock()
            .unwrap()
            .candidates
            .get(track.id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch(&self, track: &AudioTrack, candidate_id: &str) -> Result<(), ProviderError> {
        self.failure(track)?;
        let mut catalog = self.inner.lock().unwrap();
        let is_synced = catalog
            .candidates
            .get(track.id.as_str())
            .and_then(|cs| cs.iter().find(|c| c.id == candidate_id))
            .map(|c| c.is_synced)
            .ok_or_else(|| ProviderError::Apply(format!("unknown candidate {candidate_id}")))?;

        catalog
            .existing
            .insert(track.id.to_string(), ExistingLyrics { is_synced });
        catalog
            .fetched
            .push((track.id.to_string(), candidate_id.to_string()));
        Ok(())
    }
}
