//! Content signatures for tracks.
//!
//! A signature fingerprints the normalized descriptive fields of a track. Retry
//! history is only trusted while the stored signature matches the current one.

use sha2::{Digest, Sha256};

use crate::track::TrackMetadata;

/// Separates the fixed slots (name, path, duration, ...).
const SLOT_SEPARATOR: char = '\u{1f}';
/// Separates values inside a multi-valued slot (artists).
const VALUE_SEPARATOR: char = '\u{1e}';
/// Stands in for a missing duration.
const NO_DURATION: &str = "-";

/// Compute the signature of a track: lower-hex SHA-256 of its normalized fields.
pub fn signature<T: TrackMetadata + ?Sized>(track: &T) -> String {
    let canonical = canonical_form(track);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The normalized string that gets hashed.
pub fn canonical_form<T: TrackMetadata + ?Sized>(track: &T) -> String {
    let duration = track
        .duration()
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|| NO_DURATION.to_string());

    let slots = [
        normalize(track.name()),
        normalize(track.path()),
        duration,
        normalize(track.album()),
        normalize_many(track.artists()),
        normalize_many(track.album_artists()),
    ];

    let mut out = String::new();
    for (i, slot) in slots.iter().enumerate() {
        if i > 0 {
            out.push(SLOT_SEPARATOR);
        }
        out.push_str(slot);
    }
    out
}

fn normalize(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}

fn normalize_many(values: &[String]) -> String {
    let mut out = String::new();
    for value in values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
    {
        if !out.is_empty() {
            out.push(VALUE_SEPARATOR);
        }
        out.push_str(&value.to_lowercase());
    }
    out
}
