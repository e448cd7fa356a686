use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use lyricsweep_core::{AudioTrack, SearchOptions, TrackOutcome};

use super::{LyricCandidate, LyricsProvider, ProviderError};
use crate::cancel::{Cancelled, or_cancel};

/// Run the download/upgrade protocol for one track and classify the result.
///
/// - no lyrics: search, download the top-ranked candidate
/// - plain lyrics: search, download the first synced candidate
/// - synced lyrics: nothing to do
///
/// Provider failures become [`TrackOutcome::Failed`]; only cancellation is
/// returned as an error.
pub async fn enrich_track<P>(
    provider: &P,
    track: &AudioTrack,
    options: &SearchOptions,
    cancel: &CancellationToken,
) -> Result<TrackOutcome, Cancelled>
where
    P: LyricsProvider + ?Sized,
{
    match run_protocol(provider, track, options, cancel).await {
        Ok(outcome) => Ok(outcome),
        Err(ProviderError::Cancelled) => Err(Cancelled),
        Err(e) => Ok(TrackOutcome::failed(e.to_string())),
    }
}

async fn run_protocol<P>(
    provider: &P,
    track: &AudioTrack,
    options: &SearchOptions,
    cancel: &CancellationToken,
) -> Result<TrackOutcome, ProviderError>
where
    P: LyricsProvider + ?Sized,
{
    let path = track.display_path();
    let existing = call(provider.get_existing(track), cancel).await?;

    match existing {
        None => {
            debug!(path = %path, "searching for lyrics");
            let candidates = call(provider.search(track, options), cancel).await?;
            let Some(best) = candidates.first() else {
                return Ok(TrackOutcome::NotFound);
            };

            debug!(path = %path, candidate = %best.id, "saving lyrics");
            call(provider.fetch(track, &best.id), cancel).await?;
            Ok(TrackOutcome::Downloaded)
        }
        Some(lyrics) if lyrics.is_synced => Ok(TrackOutcome::AlreadySynced),
        Some(_) => {
            debug!(path = %path, "checking upgrade to synced lyrics");
            let candidates = call(provider.search(track, options), cancel).await?;
            let Some(synced) = best_synced(&candidates) else {
                return Ok(TrackOutcome::NoSyncedUpgrade);
            };

            debug!(path = %path, candidate = %synced.id, "upgrading to synced lyrics");
            call(provider.fetch(track, &synced.id), cancel).await?;
            Ok(TrackOutcome::Upgraded)
        }
    }
}

/// First synced candidate in provider ranking order.
fn best_synced(candidates: &[LyricCandidate]) -> Option<&LyricCandidate> {
    candidates.iter().find(|c| c.is_synced)
}

async fn call<T, F>(fut: F, cancel: &CancellationToken) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match or_cancel(fut, cancel).await {
        Ok(res) => res,
        Err(Cancelled) => Err(ProviderError::Cancelled),
    }
}
